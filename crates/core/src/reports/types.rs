//! Report data types.

use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, Money, VoucherId};
use serde::{Deserialize, Serialize};

use crate::account::{AccountNature, AccountType};
use crate::error::LedgerError;
use crate::fiscal::PeriodRange;
use crate::voucher::VoucherType;

/// One account's row in the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceItem {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Account nature.
    pub account_nature: AccountNature,
    /// Debits before the range.
    pub opening_debit: Money,
    /// Credits before the range.
    pub opening_credit: Money,
    /// Debits within the range.
    pub period_debit: Money,
    /// Credits within the range.
    pub period_credit: Money,
    /// Opening plus period debits.
    pub closing_debit: Money,
    /// Opening plus period credits.
    pub closing_credit: Money,
    /// Closing balance on the account's natural side.
    pub balance: Money,
}

/// Column totals of a trial balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total opening debit.
    pub opening_debit: Money,
    /// Total opening credit.
    pub opening_credit: Money,
    /// Total period debit.
    pub period_debit: Money,
    /// Total period credit.
    pub period_credit: Money,
    /// Total closing debit.
    pub closing_debit: Money,
    /// Total closing credit.
    pub closing_credit: Money,
    /// Whether every debit column equals its credit column.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Months covered.
    pub range: PeriodRange,
    /// Account rows ordered by code.
    pub items: Vec<TrialBalanceItem>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodRange` if `from` is after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, LedgerError> {
        if from > to {
            return Err(LedgerError::InvalidPeriodRange);
        }
        Ok(Self { from, to })
    }

    /// Returns true if the date lies within the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// One posted entry in an account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedgerLine {
    /// Voucher ID.
    pub voucher_id: VoucherId,
    /// Voucher number.
    pub voucher_no: String,
    /// Voucher type.
    pub voucher_type: VoucherType,
    /// Voucher date.
    pub voucher_date: NaiveDate,
    /// Entry line number.
    pub line_no: u32,
    /// Entry memo, falling back to the voucher memo.
    pub description: Option<String>,
    /// Debit amount.
    pub debit: Money,
    /// Credit amount.
    pub credit: Money,
    /// Balance after this line on the account's natural side.
    pub running_balance: Money,
}

/// General or subsidiary ledger of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedger {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Account nature.
    pub account_nature: AccountNature,
    /// Dates covered.
    pub range: DateRange,
    /// Balance before the range on the natural side.
    pub opening_balance: Money,
    /// Posted lines ordered by date, voucher number and line.
    pub lines: Vec<AccountLedgerLine>,
    /// Total debits within the range.
    pub total_debit: Money,
    /// Total credits within the range.
    pub total_credit: Money,
    /// Balance after the range on the natural side.
    pub closing_balance: Money,
}
