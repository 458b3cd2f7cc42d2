//! Balance deltas for postings and opening seeds for period rollover.

use std::collections::BTreeMap;

use ledgerline_shared::types::{AccountId, Money};

use super::balance::{BalanceDelta, LedgerBalance, OpeningSeed, accumulate};
use crate::error::LedgerError;
use crate::fiscal::YearMonth;
use crate::voucher::Voucher;

/// Groups a voucher's entries by account into one delta per account.
///
/// Deltas are ordered by account id so concurrent posters touch balance rows
/// in the same order.
///
/// # Errors
///
/// Returns `AmountOverflow` if an account's sum leaves the decimal range.
pub fn posting_deltas(voucher: &Voucher) -> Result<Vec<BalanceDelta>, LedgerError> {
    let period = voucher.period();
    let mut grouped: BTreeMap<AccountId, (Money, Money)> = BTreeMap::new();
    for entry in &voucher.entries {
        let sums = grouped.entry(entry.account_id).or_default();
        accumulate(&mut sums.0, entry.debit_amount)?;
        accumulate(&mut sums.1, entry.credit_amount)?;
    }
    Ok(grouped
        .into_iter()
        .map(|(account_id, (debit, credit))| BalanceDelta {
            account_id,
            period,
            debit,
            credit,
        })
        .collect())
}

/// Opening seeds for `next`, one per account with any movement before it.
///
/// Each seed carries the account's cumulative debit and credit movements up
/// to `next`, so months without a balance row are still counted.
///
/// # Errors
///
/// Returns `AmountOverflow` if a cumulative column leaves the decimal range.
pub fn rollover(
    history: &[LedgerBalance],
    next: YearMonth,
) -> Result<Vec<OpeningSeed>, LedgerError> {
    Ok(movements_before(history, next)?
        .into_iter()
        .map(|(account_id, (opening_debit, opening_credit))| OpeningSeed {
            account_id,
            period: next,
            opening_debit,
            opening_credit,
        })
        .collect())
}

/// Sums the period columns of rows strictly before `before`, per account.
///
/// Used to derive an opening balance from recorded movements.
///
/// # Errors
///
/// Returns `AmountOverflow` if a sum leaves the decimal range.
pub fn movements_before(
    rows: &[LedgerBalance],
    before: YearMonth,
) -> Result<BTreeMap<AccountId, (Money, Money)>, LedgerError> {
    let mut sums: BTreeMap<AccountId, (Money, Money)> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.period < before) {
        let entry = sums.entry(row.account_id).or_default();
        accumulate(&mut entry.0, row.period_debit)?;
        accumulate(&mut entry.1, row.period_credit)?;
    }
    Ok(sums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Stamp;
    use crate::voucher::{CreateVoucherInput, EntryInput, VoucherRules, VoucherType};
    use chrono::{NaiveDate, TimeZone, Utc};
    use ledgerline_shared::types::{TenantId, UserId, VoucherId};
    use rust_decimal_macros::dec;

    #[test]
    fn test_deltas_group_by_account() {
        let (cash, revenue, tax) = (AccountId::new(), AccountId::new(), AccountId::new());
        let input = CreateVoucherInput::new(
            VoucherType::Sales,
            NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
        )
        .with_entry(EntryInput::debit(cash, Money::new(dec!(100))))
        .with_entry(EntryInput::debit(cash, Money::new(dec!(10))))
        .with_entry(EntryInput::credit(revenue, Money::new(dec!(100))))
        .with_entry(EntryInput::credit(tax, Money::new(dec!(10))));
        let voucher = Voucher::draft(
            VoucherId::new(),
            TenantId::new(),
            "SJ-2026-000001".into(),
            input,
            &VoucherRules::default(),
            Stamp::new(UserId::new(), Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap()),
        )
        .unwrap();

        let deltas = posting_deltas(&voucher).unwrap();
        assert_eq!(deltas.len(), 3);
        let cash_delta = deltas.iter().find(|d| d.account_id == cash).unwrap();
        assert_eq!(cash_delta.debit, Money::new(dec!(110)));
        assert_eq!(cash_delta.credit, Money::ZERO);
        assert_eq!(cash_delta.period, YearMonth::new(2026, 6).unwrap());
        let total_debit: Money = deltas.iter().map(|d| d.debit).sum();
        let total_credit: Money = deltas.iter().map(|d| d.credit).sum();
        assert_eq!(total_debit, total_credit);
    }

    #[test]
    fn test_rollover_carries_cumulative_movements() {
        let tenant = TenantId::new();
        let account = AccountId::new();
        let dec_2025 = YearMonth::new(2025, 12).unwrap();
        let jan = YearMonth::new(2026, 1).unwrap();
        let mut earlier = LedgerBalance::new(tenant, account, dec_2025);
        earlier.period_debit = Money::new(dec!(40));
        let mut row = LedgerBalance::new(tenant, account, jan);
        row.opening_debit = Money::new(dec!(40));
        row.period_debit = Money::new(dec!(60));
        row.period_credit = Money::new(dec!(25));

        let seeds = rollover(&[earlier, row.clone()], jan.next()).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].period, YearMonth::new(2026, 2).unwrap());
        assert_eq!(seeds[0].opening_debit, row.closing_debit());
        assert_eq!(seeds[0].opening_credit, row.closing_credit());
    }

    #[test]
    fn test_rollover_counts_months_without_rows() {
        let tenant = TenantId::new();
        let account = AccountId::new();
        let rows: Vec<LedgerBalance> = [1, 3]
            .into_iter()
            .map(|m| {
                let mut row = LedgerBalance::new(tenant, account, YearMonth::new(2026, m).unwrap());
                row.period_debit = Money::from(10);
                row
            })
            .collect();
        let seeds = rollover(&rows, YearMonth::new(2026, 4).unwrap()).unwrap();
        assert_eq!(seeds[0].opening_debit, Money::from(20));
        assert_eq!(seeds[0].opening_credit, Money::ZERO);
    }

    #[test]
    fn test_movements_before() {
        let tenant = TenantId::new();
        let account = AccountId::new();
        let rows: Vec<LedgerBalance> = (1..=3)
            .map(|m| {
                let mut row = LedgerBalance::new(tenant, account, YearMonth::new(2026, m).unwrap());
                row.period_debit = Money::from(i64::from(m));
                row
            })
            .collect();
        let sums = movements_before(&rows, YearMonth::new(2026, 3).unwrap()).unwrap();
        assert_eq!(sums[&account], (Money::from(3), Money::ZERO));
    }
}
