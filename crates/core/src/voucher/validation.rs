//! Entry validation.
//!
//! Amount rules:
//! - no side may be negative
//! - exactly one side is strictly positive, the other is zero
//!
//! Account rules: the account exists, belongs to the voucher's tenant and
//! passes [`Account::can_post`](crate::account::Account::can_post).

use ledgerline_shared::types::{Money, TenantId};

use super::types::VoucherEntry;
use crate::account::AccountLookup;
use crate::error::{AccountRejection, LedgerError};

/// Checks the debit/credit exclusivity rules for one line.
///
/// # Errors
///
/// Returns `EntryZeroAmount` if either side is negative or both are zero,
/// and `EntryInvalidAmount` if both are positive.
pub fn check_amounts(line_no: u32, debit: Money, credit: Money) -> Result<(), LedgerError> {
    if debit.is_negative() || credit.is_negative() {
        return Err(LedgerError::EntryZeroAmount { line_no });
    }
    match (debit.is_positive(), credit.is_positive()) {
        (true, true) => Err(LedgerError::EntryInvalidAmount { line_no }),
        (false, false) => Err(LedgerError::EntryZeroAmount { line_no }),
        _ => Ok(()),
    }
}

/// Validates entries against a tenant's accounts. Pure, no side effects.
pub struct EntryValidator<'a, L: AccountLookup + ?Sized> {
    tenant_id: TenantId,
    accounts: &'a L,
}

impl<'a, L: AccountLookup + ?Sized> EntryValidator<'a, L> {
    /// Creates a validator for one tenant.
    pub fn new(tenant_id: TenantId, accounts: &'a L) -> Self {
        Self {
            tenant_id,
            accounts,
        }
    }

    /// Validates a single entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryInvalidAmount`, `EntryZeroAmount` or
    /// `EntryAccountInvalid` with the reason the account was refused.
    pub fn validate(&self, entry: &VoucherEntry) -> Result<(), LedgerError> {
        check_amounts(entry.line_no, entry.debit_amount, entry.credit_amount)?;
        self.check_account(entry)
    }

    /// Validates every entry, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first entry error.
    pub fn validate_all(&self, entries: &[VoucherEntry]) -> Result<(), LedgerError> {
        entries.iter().try_for_each(|entry| self.validate(entry))
    }

    fn check_account(&self, entry: &VoucherEntry) -> Result<(), LedgerError> {
        let reject = |reason| LedgerError::EntryAccountInvalid {
            line_no: entry.line_no,
            account_id: entry.account_id,
            reason,
        };
        let account = self
            .accounts
            .account(entry.account_id)
            .ok_or_else(|| reject(AccountRejection::NotFound))?;

        if account.tenant_id != self.tenant_id {
            return Err(reject(AccountRejection::WrongTenant));
        }
        if !account.is_active {
            return Err(reject(AccountRejection::Inactive));
        }
        if account.is_control_account {
            return Err(reject(AccountRejection::ControlAccount));
        }
        if !account.allow_direct_posting {
            return Err(reject(AccountRejection::DirectPostingDisabled));
        }
        Ok(())
    }
}
