//! In-memory store for development and tests.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ledgerline_core::LedgerError;
use ledgerline_core::account::Account;
use ledgerline_core::fiscal::{FiscalPeriod, YearMonth};
use ledgerline_core::ledger::{BalanceDelta, LedgerBalance, OpeningSeed};
use ledgerline_core::voucher::{SequenceKey, Voucher, VoucherFilter};
use ledgerline_shared::types::{AccountId, TenantId, VoucherId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LedgerStore, StoreTransaction};
use crate::error::{StoreError, StoreResult};

/// Default wait for a tenant's book before `begin` gives up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything stored for one tenant.
#[derive(Debug, Default)]
struct TenantBook {
    accounts: BTreeMap<AccountId, Account>,
    vouchers: HashMap<VoucherId, Voucher>,
    voucher_numbers: HashMap<String, VoucherId>,
    sequences: HashMap<SequenceKey, u64>,
    periods: BTreeMap<YearMonth, FiscalPeriod>,
    balances: BTreeMap<(AccountId, YearMonth), LedgerBalance>,
}

/// Prior contents of one slot of a [`TenantBook`].
///
/// `None` means the slot was empty before the write.
enum Undo {
    Account(AccountId, Option<Account>),
    Voucher(VoucherId, Option<Voucher>),
    VoucherNumber(String, Option<VoucherId>),
    Sequence(SequenceKey, Option<u64>),
    Period(YearMonth, Option<FiscalPeriod>),
    Balance((AccountId, YearMonth), Option<LedgerBalance>),
}

fn put_back<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => map.insert(key, value),
        None => map.remove(&key),
    };
}

fn put_back_hashed<K: Hash + Eq, V>(map: &mut HashMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => map.insert(key, value),
        None => map.remove(&key),
    };
}

impl Undo {
    fn revert(self, book: &mut TenantBook) {
        match self {
            Self::Account(id, previous) => put_back(&mut book.accounts, id, previous),
            Self::Voucher(id, previous) => put_back_hashed(&mut book.vouchers, id, previous),
            Self::VoucherNumber(no, previous) => {
                put_back_hashed(&mut book.voucher_numbers, no, previous);
            }
            Self::Sequence(key, previous) => put_back_hashed(&mut book.sequences, key, previous),
            Self::Period(month, previous) => put_back(&mut book.periods, month, previous),
            Self::Balance(key, previous) => put_back(&mut book.balances, key, previous),
        }
    }
}

/// Store that keeps each tenant's book behind its own async mutex.
///
/// A transaction holds the tenant's lock from `begin` until it is committed
/// or dropped, so writers within a tenant are serialized while tenants
/// proceed independently. Writes go straight into the book and every one
/// records the slot's prior contents; dropping the transaction without
/// committing replays that log backwards.
#[derive(Debug)]
pub struct InMemoryStore {
    books: DashMap<TenantId, Arc<Mutex<TenantBook>>>,
    lock_timeout: Duration,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            books: DashMap::new(),
            lock_timeout,
        }
    }

    fn book(&self, tenant_id: TenantId) -> Arc<Mutex<TenantBook>> {
        Arc::clone(self.books.entry(tenant_id).or_default().value())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn begin(&self, tenant_id: TenantId) -> StoreResult<Box<dyn StoreTransaction>> {
        let book = self.book(tenant_id);
        let book = tokio::time::timeout(self.lock_timeout, book.lock_owned())
            .await
            .map_err(|_| StoreError::Timeout)?;
        Ok(Box::new(InMemoryTransaction {
            tenant_id,
            book,
            undo: Vec::new(),
        }))
    }
}

struct InMemoryTransaction {
    tenant_id: TenantId,
    book: OwnedMutexGuard<TenantBook>,
    undo: Vec<Undo>,
}

impl InMemoryTransaction {
    /// Rewrites one balance row, creating it empty first when absent.
    fn upsert_balance(
        &mut self,
        key: (AccountId, YearMonth),
        update: impl FnOnce(&mut LedgerBalance) -> Result<(), LedgerError>,
    ) -> StoreResult<()> {
        let previous = self.book.balances.get(&key).cloned();
        let (account_id, period) = key;
        let mut row = previous
            .clone()
            .unwrap_or_else(|| LedgerBalance::new(self.tenant_id, account_id, period));
        update(&mut row)
            .map_err(|_| StoreError::Overflow(format!("balance of {account_id} in {period}")))?;
        self.book.balances.insert(key, row);
        self.undo.push(Undo::Balance(key, previous));
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        while let Some(undo) = self.undo.pop() {
            undo.revert(&mut self.book);
        }
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        if self.book.accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict(format!("account {}", account.id)));
        }
        if self.book.accounts.values().any(|a| a.code == account.code) {
            return Err(StoreError::Conflict(format!("account code {}", account.code)));
        }
        let previous = self.book.accounts.insert(account.id, account.clone());
        self.undo.push(Undo::Account(account.id, previous));
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<()> {
        let slot = self
            .book
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", account.id)))?;
        let previous = std::mem::replace(slot, account.clone());
        self.undo.push(Undo::Account(account.id, Some(previous)));
        Ok(())
    }

    async fn delete_account(&mut self, id: AccountId) -> StoreResult<()> {
        let previous = self
            .book
            .accounts
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
        self.undo.push(Undo::Account(id, Some(previous)));
        Ok(())
    }

    async fn get_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.book.accounts.get(&id).cloned())
    }

    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>> {
        Ok(self.book.accounts.values().cloned().collect())
    }

    async fn account_has_postings(&mut self, id: AccountId) -> StoreResult<bool> {
        Ok(self.book.balances.values().any(|row| {
            row.account_id == id && !(row.period_debit.is_zero() && row.period_credit.is_zero())
        }))
    }

    async fn account_has_open_vouchers(&mut self, id: AccountId) -> StoreResult<bool> {
        Ok(self.book.vouchers.values().any(|v| {
            !v.status.is_terminal() && v.entries.iter().any(|e| e.account_id == id)
        }))
    }

    async fn next_sequence(&mut self, key: &SequenceKey) -> StoreResult<u64> {
        let previous = self.book.sequences.get(key).copied();
        let next = previous
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend("voucher sequence exhausted".into()))?;
        self.book.sequences.insert(*key, next);
        self.undo.push(Undo::Sequence(*key, previous));
        Ok(next)
    }

    async fn insert_voucher(&mut self, voucher: &Voucher) -> StoreResult<()> {
        if self.book.vouchers.contains_key(&voucher.id) {
            return Err(StoreError::Conflict(format!("voucher {}", voucher.id)));
        }
        if self.book.voucher_numbers.contains_key(&voucher.voucher_no) {
            return Err(StoreError::Conflict(format!(
                "voucher number {}",
                voucher.voucher_no
            )));
        }
        let previous = self
            .book
            .voucher_numbers
            .insert(voucher.voucher_no.clone(), voucher.id);
        self.undo
            .push(Undo::VoucherNumber(voucher.voucher_no.clone(), previous));
        let previous = self.book.vouchers.insert(voucher.id, voucher.clone());
        self.undo.push(Undo::Voucher(voucher.id, previous));
        Ok(())
    }

    async fn update_voucher(
        &mut self,
        voucher: &Voucher,
        expected_version: u64,
    ) -> StoreResult<()> {
        let slot = self
            .book
            .vouchers
            .get_mut(&voucher.id)
            .ok_or_else(|| StoreError::NotFound(format!("voucher {}", voucher.id)))?;
        if slot.version != expected_version {
            return Err(StoreError::VersionConflict {
                entity: format!("voucher {}", voucher.voucher_no),
                expected: expected_version,
                found: slot.version,
            });
        }
        let previous = std::mem::replace(slot, voucher.clone());
        self.undo.push(Undo::Voucher(voucher.id, Some(previous)));
        Ok(())
    }

    async fn get_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>> {
        Ok(self.book.vouchers.get(&id).cloned())
    }

    async fn find_voucher_by_number(&mut self, voucher_no: &str) -> StoreResult<Option<Voucher>> {
        let book = &*self.book;
        Ok(book
            .voucher_numbers
            .get(voucher_no)
            .and_then(|id| book.vouchers.get(id))
            .cloned())
    }

    async fn list_vouchers(&mut self, filter: &VoucherFilter) -> StoreResult<Vec<Voucher>> {
        let mut vouchers: Vec<Voucher> = self
            .book
            .vouchers
            .values()
            .filter(|v| filter.matches(v.status, v.voucher_type, v.voucher_date))
            .cloned()
            .collect();
        vouchers.sort_by(|a, b| {
            (a.voucher_date, &a.voucher_no).cmp(&(b.voucher_date, &b.voucher_no))
        });
        Ok(vouchers)
    }

    async fn insert_period(&mut self, period: &FiscalPeriod) -> StoreResult<()> {
        let month = period.year_month();
        if self.book.periods.contains_key(&month) {
            return Err(StoreError::Conflict(format!("fiscal period {month}")));
        }
        let previous = self.book.periods.insert(month, period.clone());
        self.undo.push(Undo::Period(month, previous));
        Ok(())
    }

    async fn update_period(&mut self, period: &FiscalPeriod) -> StoreResult<()> {
        let month = period.year_month();
        let slot = self
            .book
            .periods
            .get_mut(&month)
            .ok_or_else(|| StoreError::NotFound(format!("fiscal period {month}")))?;
        let previous = std::mem::replace(slot, period.clone());
        self.undo.push(Undo::Period(month, Some(previous)));
        Ok(())
    }

    async fn get_period(&mut self, month: YearMonth) -> StoreResult<Option<FiscalPeriod>> {
        Ok(self.book.periods.get(&month).cloned())
    }

    async fn find_period_for_date(
        &mut self,
        date: NaiveDate,
    ) -> StoreResult<Option<FiscalPeriod>> {
        Ok(self
            .book
            .periods
            .values()
            .find(|p| p.contains_date(date))
            .cloned())
    }

    async fn list_periods(&mut self) -> StoreResult<Vec<FiscalPeriod>> {
        Ok(self.book.periods.values().cloned().collect())
    }

    async fn add_to_balance(&mut self, delta: &BalanceDelta) -> StoreResult<()> {
        self.upsert_balance((delta.account_id, delta.period), |row| row.apply(delta))
    }

    async fn seed_opening(&mut self, seed: &OpeningSeed) -> StoreResult<()> {
        self.upsert_balance((seed.account_id, seed.period), |row| row.seed(seed))
    }

    async fn list_balances(
        &mut self,
        account_id: Option<AccountId>,
        until: YearMonth,
    ) -> StoreResult<Vec<LedgerBalance>> {
        Ok(self
            .book
            .balances
            .values()
            .filter(|row| row.period <= until)
            .filter(|row| account_id.is_none_or(|id| row.account_id == id))
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut tx = self;
        tx.undo.clear();
        Ok(())
    }
}
