//! Tenant-scoped transactional store boundary.
//!
//! Every logical engine operation opens one [`StoreTransaction`] for its
//! tenant, performs its reads and writes through it and commits once.
//! Dropping a transaction without committing discards all of its writes.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerline_core::account::Account;
use ledgerline_core::fiscal::{FiscalPeriod, YearMonth};
use ledgerline_core::ledger::{BalanceDelta, LedgerBalance, OpeningSeed};
use ledgerline_core::voucher::{SequenceKey, Voucher, VoucherFilter};
use ledgerline_shared::types::{AccountId, TenantId, VoucherId};

use crate::error::StoreResult;

/// Opens units of work against a backing store.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Begins a transaction scoped to one tenant.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Timeout` if the tenant cannot be locked within
    /// the configured timeout, or a backend error.
    async fn begin(&self, tenant_id: TenantId) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// One all-or-nothing unit of work for a single tenant.
///
/// Reads observe the transaction's own earlier writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Tenant this transaction is scoped to.
    fn tenant_id(&self) -> TenantId;

    // ========== Accounts ==========

    /// Inserts an account. Fails with `Conflict` on a duplicate id or code.
    async fn insert_account(&mut self, account: &Account) -> StoreResult<()>;

    /// Replaces a stored account.
    async fn update_account(&mut self, account: &Account) -> StoreResult<()>;

    /// Removes an account.
    async fn delete_account(&mut self, id: AccountId) -> StoreResult<()>;

    /// Fetches an account by id.
    async fn get_account(&mut self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Lists every account of the tenant.
    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>>;

    /// Returns true if any posted movement references the account.
    async fn account_has_postings(&mut self, id: AccountId) -> StoreResult<bool>;

    /// Returns true if a voucher that is neither posted nor cancelled has an
    /// entry on the account.
    async fn account_has_open_vouchers(&mut self, id: AccountId) -> StoreResult<bool>;

    // ========== Sequences ==========

    /// Increments the counter for `key` and returns the new value.
    ///
    /// The counter is created at 1 when absent.
    async fn next_sequence(&mut self, key: &SequenceKey) -> StoreResult<u64>;

    // ========== Vouchers ==========

    /// Inserts a voucher. Fails with `Conflict` on a duplicate id or number.
    async fn insert_voucher(&mut self, voucher: &Voucher) -> StoreResult<()>;

    /// Replaces a stored voucher if its stored version equals
    /// `expected_version`, otherwise fails with `VersionConflict`.
    async fn update_voucher(&mut self, voucher: &Voucher, expected_version: u64)
    -> StoreResult<()>;

    /// Fetches a voucher by id.
    async fn get_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>>;

    /// Fetches a voucher by its number.
    async fn find_voucher_by_number(&mut self, voucher_no: &str) -> StoreResult<Option<Voucher>>;

    /// Lists matching vouchers ordered by date then number.
    async fn list_vouchers(&mut self, filter: &VoucherFilter) -> StoreResult<Vec<Voucher>>;

    // ========== Fiscal periods ==========

    /// Inserts a period. Fails with `Conflict` if the month already exists.
    async fn insert_period(&mut self, period: &FiscalPeriod) -> StoreResult<()>;

    /// Replaces a stored period.
    async fn update_period(&mut self, period: &FiscalPeriod) -> StoreResult<()>;

    /// Fetches the period of one month.
    async fn get_period(&mut self, month: YearMonth) -> StoreResult<Option<FiscalPeriod>>;

    /// Fetches the period whose date range covers `date`.
    async fn find_period_for_date(&mut self, date: NaiveDate)
    -> StoreResult<Option<FiscalPeriod>>;

    /// Lists every period ordered by month.
    async fn list_periods(&mut self) -> StoreResult<Vec<FiscalPeriod>>;

    // ========== Ledger balances ==========

    /// Adds a delta to the period columns, creating the row when absent.
    /// Fails with `Overflow` and leaves the row as it was when a column
    /// would leave the decimal range.
    async fn add_to_balance(&mut self, delta: &BalanceDelta) -> StoreResult<()>;

    /// Overwrites the opening columns, creating the row when absent. Fails
    /// like `add_to_balance` on overflow.
    async fn seed_opening(&mut self, seed: &OpeningSeed) -> StoreResult<()>;

    /// Lists balance rows up to and including `until`, optionally for one
    /// account, ordered by account then month.
    async fn list_balances(
        &mut self,
        account_id: Option<AccountId>,
        until: YearMonth,
    ) -> StoreResult<Vec<LedgerBalance>>;

    /// Makes every write of this transaction durable and visible.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
