//! Property-based tests for balance aggregation.
//!
//! Reconciliation: after posting any sequence of balanced vouchers and
//! rolling every month forward, each account's closing balance for a month
//! equals the net of its posted entries up to that month, and the tenant's
//! closing balances net to zero.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use ledgerline_shared::types::{AccountId, Money, TenantId, UserId, VoucherId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::aggregator::{posting_deltas, rollover};
use super::balance::LedgerBalance;
use crate::clock::Stamp;
use crate::fiscal::YearMonth;
use crate::voucher::{CreateVoucherInput, EntryInput, Voucher, VoucherRules, VoucherType};

/// A voucher posting `amount` from one of four accounts to another in a month.
#[derive(Debug, Clone)]
struct Posting {
    month: u32,
    debit: usize,
    credit: usize,
    amount: Decimal,
}

fn posting() -> impl Strategy<Value = Posting> {
    (1u32..=4, 0usize..4, 0usize..4, 1i64..1_000_000i64).prop_map(|(month, debit, credit, cents)| {
        Posting {
            month,
            debit,
            credit,
            amount: Decimal::new(cents, 2),
        }
    })
}

fn to_voucher(tenant_id: TenantId, accounts: &[AccountId], p: &Posting) -> Voucher {
    let input = CreateVoucherInput::new(
        VoucherType::General,
        NaiveDate::from_ymd_opt(2026, p.month, 15).unwrap(),
    )
    .with_entry(EntryInput::debit(accounts[p.debit], Money::new(p.amount)))
    .with_entry(EntryInput::credit(accounts[p.credit], Money::new(p.amount)));
    Voucher::draft(
        VoucherId::new(),
        tenant_id,
        "GJ-2026-000001".into(),
        input,
        &VoucherRules::default(),
        Stamp::new(UserId::new(), Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
    )
    .unwrap()
}

type Rows = BTreeMap<(YearMonth, AccountId), LedgerBalance>;

fn row<'a>(rows: &'a mut Rows, tenant: TenantId, period: YearMonth, account: AccountId) -> &'a mut LedgerBalance {
    rows.entry((period, account))
        .or_insert_with(|| LedgerBalance::new(tenant, account, period))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_closing_balances_reconcile(postings in prop::collection::vec(posting(), 1..30)) {
        let tenant = TenantId::new();
        let accounts: Vec<AccountId> = (0..4).map(|_| AccountId::new()).collect();
        let vouchers: Vec<Voucher> = postings.iter().map(|p| to_voucher(tenant, &accounts, p)).collect();

        let mut rows = Rows::new();
        for voucher in &vouchers {
            for delta in posting_deltas(voucher).unwrap() {
                row(&mut rows, tenant, delta.period, delta.account_id).apply(&delta).unwrap();
            }
        }

        for month in 1..=4u32 {
            let period = YearMonth::new(2026, month).unwrap();
            let closing: Vec<LedgerBalance> = rows
                .iter()
                .filter(|((p, _), _)| *p == period)
                .map(|(_, r)| r.clone())
                .collect();

            let tenant_net: Money = closing.iter().map(LedgerBalance::net_balance).sum();
            prop_assert_eq!(tenant_net, Money::ZERO);

            for account in &accounts {
                let expected: Money = vouchers
                    .iter()
                    .filter(|v| v.fiscal_month <= month)
                    .flat_map(|v| v.entries.iter())
                    .filter(|e| e.account_id == *account)
                    .map(|e| e.net())
                    .sum();
                let actual = closing
                    .iter()
                    .find(|r| r.account_id == *account)
                    .map_or(Money::ZERO, LedgerBalance::net_balance);
                prop_assert_eq!(actual, expected);
            }

            let history: Vec<LedgerBalance> =
                rows.values().filter(|r| r.period <= period).cloned().collect();
            for seed in rollover(&history, period.next()).unwrap() {
                row(&mut rows, tenant, seed.period, seed.account_id).seed(&seed).unwrap();
            }
        }
    }
}
