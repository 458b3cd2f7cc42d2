//! Pre-aggregated account balances per fiscal month.

use ledgerline_shared::types::{AccountId, Money, TenantId};
use serde::{Deserialize, Serialize};

use crate::account::AccountNature;
use crate::error::LedgerError;
use crate::fiscal::YearMonth;

/// Adds `amount` to `total`, leaving `total` untouched on overflow.
pub(crate) fn accumulate(total: &mut Money, amount: Money) -> Result<(), LedgerError> {
    *total = total.checked_add(amount).ok_or(LedgerError::AmountOverflow)?;
    Ok(())
}

/// Opening and period movements of one account in one month.
///
/// Closing columns are derived (`closing = opening + period`) and never
/// stored. `apply` and `seed` refuse changes whose closing columns would
/// leave the decimal range, so the derived columns are always computable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Account.
    pub account_id: AccountId,
    /// Fiscal month.
    pub period: YearMonth,
    /// Debit carried in from the previous month.
    pub opening_debit: Money,
    /// Credit carried in from the previous month.
    pub opening_credit: Money,
    /// Debits posted in this month.
    pub period_debit: Money,
    /// Credits posted in this month.
    pub period_credit: Money,
}

impl LedgerBalance {
    /// An empty row.
    #[must_use]
    pub fn new(tenant_id: TenantId, account_id: AccountId, period: YearMonth) -> Self {
        Self {
            tenant_id,
            account_id,
            period,
            opening_debit: Money::ZERO,
            opening_credit: Money::ZERO,
            period_debit: Money::ZERO,
            period_credit: Money::ZERO,
        }
    }

    /// Opening debit plus period debit.
    #[must_use]
    pub fn closing_debit(&self) -> Money {
        self.opening_debit + self.period_debit
    }

    /// Opening credit plus period credit.
    #[must_use]
    pub fn closing_credit(&self) -> Money {
        self.opening_credit + self.period_credit
    }

    /// Closing balance, debit-positive.
    #[must_use]
    pub fn net_balance(&self) -> Money {
        self.closing_debit() - self.closing_credit()
    }

    /// This month's movement, debit-positive.
    #[must_use]
    pub fn period_net(&self) -> Money {
        self.period_debit - self.period_credit
    }

    /// Closing balance expressed on the account's natural side.
    #[must_use]
    pub fn signed_balance(&self, nature: AccountNature) -> Money {
        match nature {
            AccountNature::Debit => self.net_balance(),
            AccountNature::Credit => -self.net_balance(),
        }
    }

    /// Adds a posting delta to the period columns.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` and leaves the row unchanged when a period
    /// or closing column would leave the decimal range.
    pub fn apply(&mut self, delta: &BalanceDelta) -> Result<(), LedgerError> {
        let period_debit = self
            .period_debit
            .checked_add(delta.debit)
            .ok_or(LedgerError::AmountOverflow)?;
        let period_credit = self
            .period_credit
            .checked_add(delta.credit)
            .ok_or(LedgerError::AmountOverflow)?;
        self.set_columns(
            (self.opening_debit, self.opening_credit),
            (period_debit, period_credit),
        )
    }

    /// Overwrites the opening columns. Period columns are untouched.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` and leaves the row unchanged when a closing
    /// column would leave the decimal range.
    pub fn seed(&mut self, seed: &OpeningSeed) -> Result<(), LedgerError> {
        self.set_columns(
            (seed.opening_debit, seed.opening_credit),
            (self.period_debit, self.period_credit),
        )
    }

    fn set_columns(
        &mut self,
        (opening_debit, opening_credit): (Money, Money),
        (period_debit, period_credit): (Money, Money),
    ) -> Result<(), LedgerError> {
        if opening_debit.checked_add(period_debit).is_none()
            || opening_credit.checked_add(period_credit).is_none()
        {
            return Err(LedgerError::AmountOverflow);
        }
        self.opening_debit = opening_debit;
        self.opening_credit = opening_credit;
        self.period_debit = period_debit;
        self.period_credit = period_credit;
        Ok(())
    }
}

/// Amounts one posted voucher adds to one account's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Account.
    pub account_id: AccountId,
    /// Fiscal month of the voucher.
    pub period: YearMonth,
    /// Debit to add.
    pub debit: Money,
    /// Credit to add.
    pub credit: Money,
}

/// Opening columns for an account's next month, taken from a closing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSeed {
    /// Account.
    pub account_id: AccountId,
    /// Month receiving the opening balance.
    pub period: YearMonth,
    /// Opening debit.
    pub opening_debit: Money,
    /// Opening credit.
    pub opening_credit: Money,
}
