//! Property-based tests for the voucher aggregate.
//!
//! - Balance: a voucher submits iff its entry columns are equal, and the
//!   stored totals always equal the entry sums.
//! - State machine: from posted or cancelled no transition succeeds.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use ledgerline_shared::types::{AccountId, FiscalPeriodId, Money, TenantId, UserId, VoucherId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::aggregate::{Voucher, VoucherRules};
use super::types::{CreateVoucherInput, EntryInput, VoucherStatus, VoucherType};
use crate::account::{Account, AccountType};
use crate::clock::Stamp;
use crate::error::LedgerError;
use crate::fiscal::FiscalPeriod;

fn stamp() -> Stamp {
    Stamp::new(UserId::new(), Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap())
}

fn account(tenant_id: TenantId, code: &str) -> Account {
    let now = stamp().at;
    Account {
        id: AccountId::new(),
        tenant_id,
        code: code.into(),
        name: code.into(),
        parent_id: None,
        level: 1,
        path: code.into(),
        account_type: AccountType::Asset,
        account_nature: AccountType::Asset.default_nature(),
        is_active: true,
        is_control_account: false,
        allow_direct_posting: true,
        created_by: UserId::new(),
        updated_by: UserId::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

struct Book {
    tenant_id: TenantId,
    debit_account: AccountId,
    credit_account: AccountId,
    accounts: BTreeMap<AccountId, Account>,
}

fn book() -> Book {
    let tenant_id = TenantId::new();
    let debit = account(tenant_id, "100");
    let credit = account(tenant_id, "200");
    Book {
        tenant_id,
        debit_account: debit.id,
        credit_account: credit.id,
        accounts: [debit, credit].into_iter().map(|a| (a.id, a)).collect(),
    }
}

fn voucher(book: &Book, debits: &[Decimal], credits: &[Decimal]) -> Voucher {
    let mut input = CreateVoucherInput::new(
        VoucherType::General,
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap(),
    );
    input.entries = debits
        .iter()
        .map(|d| EntryInput::debit(book.debit_account, Money::new(*d)))
        .chain(
            credits
                .iter()
                .map(|c| EntryInput::credit(book.credit_account, Money::new(*c))),
        )
        .collect();
    Voucher::draft(
        VoucherId::new(),
        book.tenant_id,
        "GJ-2026-000001".into(),
        input,
        &VoucherRules::default(),
        stamp(),
    )
    .unwrap()
}

/// Splits a total into `parts` positive amounts that sum back exactly.
fn split(total: Decimal, parts: usize) -> Vec<Decimal> {
    let mut amounts = Vec::with_capacity(parts);
    let mut remaining = total;
    for i in 0..parts {
        if i + 1 == parts || remaining <= Decimal::new(1, 2) {
            amounts.push(remaining);
            break;
        }
        let share = (remaining / Decimal::from(2)).round_dp(2).max(Decimal::new(1, 2));
        amounts.push(share);
        remaining -= share;
    }
    amounts
}

fn all_transitions_fail(v: &mut Voucher, book: &Book) -> bool {
    let rules = VoucherRules::default();
    let period = FiscalPeriod::for_month(FiscalPeriodId::new(), book.tenant_id, 2026, 5).unwrap();
    v.submit(&book.accounts, stamp()).is_err()
        && v.approve(stamp(), None).is_err()
        && v.reject(stamp(), Some("late".into()), &rules).is_err()
        && v.post(Some(&period), &book.accounts, stamp()).is_err()
        && v.cancel(stamp(), None).is_err()
        && v
            .add_entry(
                EntryInput::debit(book.debit_account, Money::from(1)),
                &rules,
                stamp().at,
            )
            .is_err()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced vouchers submit and keep totals equal to the entry sums.
    #[test]
    fn prop_balanced_voucher_submits(
        total in positive_amount(),
        debit_parts in 1usize..5,
        credit_parts in 1usize..5,
    ) {
        let book = book();
        let debits = split(total, debit_parts);
        let credits = split(total, credit_parts);
        let mut v = voucher(&book, &debits, &credits);

        prop_assert!(v.submit(&book.accounts, stamp()).is_ok());
        let entry_debit: Money = v.entries.iter().map(|e| e.debit_amount).sum();
        let entry_credit: Money = v.entries.iter().map(|e| e.credit_amount).sum();
        prop_assert_eq!(v.total_debit, entry_debit);
        prop_assert_eq!(v.total_credit, entry_credit);
        prop_assert_eq!(v.total_debit, v.total_credit);
        prop_assert_eq!(v.status, VoucherStatus::Pending);
    }

    /// Unbalanced vouchers are refused and stay exactly as they were.
    #[test]
    fn prop_unbalanced_voucher_refused(
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        prop_assume!(debit != credit);
        let book = book();
        let mut v = voucher(&book, &[debit], &[credit]);
        let before = v.clone();

        let result = v.submit(&book.accounts, stamp());
        prop_assert_eq!(
            result,
            Err(LedgerError::VoucherUnbalanced {
                debit: Money::new(debit),
                credit: Money::new(credit),
            })
        );
        prop_assert_eq!(v, before);
    }

    /// Posted and cancelled vouchers refuse every transition and edit.
    #[test]
    fn prop_terminal_states_are_final(amount in positive_amount(), cancel in any::<bool>()) {
        let book = book();
        let mut v = voucher(&book, &[amount], &[amount]);
        if cancel {
            v.cancel(stamp(), None).unwrap();
        } else {
            let period =
                FiscalPeriod::for_month(FiscalPeriodId::new(), book.tenant_id, 2026, 5).unwrap();
            v.submit(&book.accounts, stamp()).unwrap();
            v.approve(stamp(), None).unwrap();
            v.post(Some(&period), &book.accounts, stamp()).unwrap();
        }
        let before = v.clone();
        prop_assert!(all_transitions_fail(&mut v, &book));
        prop_assert_eq!(v, before);
    }
}
