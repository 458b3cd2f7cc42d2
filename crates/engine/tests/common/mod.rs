//! Shared fixtures for engine integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use ledgerline_core::FixedClock;
use ledgerline_core::account::{Account, AccountType, CreateAccountInput};
use ledgerline_core::fiscal::{FiscalPeriod, YearMonth};
use ledgerline_core::ledger::{BalanceDelta, LedgerBalance, OpeningSeed};
use ledgerline_core::voucher::{
    CreateVoucherInput, EntryInput, SequenceKey, Voucher, VoucherFilter, VoucherType,
};
use ledgerline_engine::{
    EngineSettings, InMemoryStore, LedgerEngine, LedgerStore, StoreError, StoreResult,
    StoreTransaction,
};
use ledgerline_shared::types::{AccountId, TenantId, UserId, VoucherId};
use rust_decimal::Decimal;

pub const YEAR: i32 = 2026;

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(YEAR, month, day).unwrap()
}

pub fn month(month: u32) -> YearMonth {
    YearMonth::new(YEAR, month).unwrap()
}

/// Switches that make a [`FaultyStore`] fail specific writes.
#[derive(Debug, Default)]
pub struct Faults {
    pub balance_updates: AtomicBool,
    pub sequences: AtomicBool,
    pub voucher_updates: AtomicBool,
}

impl Faults {
    pub fn clear(&self) {
        self.balance_updates.store(false, Ordering::SeqCst);
        self.sequences.store(false, Ordering::SeqCst);
        self.voucher_updates.store(false, Ordering::SeqCst);
    }
}

/// In-memory store that fails chosen operations on demand.
pub struct FaultyStore {
    inner: InMemoryStore,
    pub faults: Arc<Faults>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::default(),
            faults: Arc::new(Faults::default()),
        }
    }
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn begin(&self, tenant_id: TenantId) -> StoreResult<Box<dyn StoreTransaction>> {
        let inner = self.inner.begin(tenant_id).await?;
        Ok(Box::new(FaultyTransaction {
            inner,
            faults: Arc::clone(&self.faults),
        }))
    }
}

struct FaultyTransaction {
    inner: Box<dyn StoreTransaction>,
    faults: Arc<Faults>,
}

fn injected(flag: &AtomicBool, what: &str) -> StoreResult<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(StoreError::Backend(format!("injected {what} failure")));
    }
    Ok(())
}

#[async_trait]
impl StoreTransaction for FaultyTransaction {
    fn tenant_id(&self) -> TenantId {
        self.inner.tenant_id()
    }

    async fn insert_account(&mut self, account: &Account) -> StoreResult<()> {
        self.inner.insert_account(account).await
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<()> {
        self.inner.update_account(account).await
    }

    async fn delete_account(&mut self, id: AccountId) -> StoreResult<()> {
        self.inner.delete_account(id).await
    }

    async fn get_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        self.inner.get_account(id).await
    }

    async fn list_accounts(&mut self) -> StoreResult<Vec<Account>> {
        self.inner.list_accounts().await
    }

    async fn account_has_postings(&mut self, id: AccountId) -> StoreResult<bool> {
        self.inner.account_has_postings(id).await
    }

    async fn account_has_open_vouchers(&mut self, id: AccountId) -> StoreResult<bool> {
        self.inner.account_has_open_vouchers(id).await
    }

    async fn next_sequence(&mut self, key: &SequenceKey) -> StoreResult<u64> {
        injected(&self.faults.sequences, "sequence")?;
        self.inner.next_sequence(key).await
    }

    async fn insert_voucher(&mut self, voucher: &Voucher) -> StoreResult<()> {
        self.inner.insert_voucher(voucher).await
    }

    async fn update_voucher(
        &mut self,
        voucher: &Voucher,
        expected_version: u64,
    ) -> StoreResult<()> {
        injected(&self.faults.voucher_updates, "voucher update")?;
        self.inner.update_voucher(voucher, expected_version).await
    }

    async fn get_voucher(&mut self, id: VoucherId) -> StoreResult<Option<Voucher>> {
        self.inner.get_voucher(id).await
    }

    async fn find_voucher_by_number(&mut self, voucher_no: &str) -> StoreResult<Option<Voucher>> {
        self.inner.find_voucher_by_number(voucher_no).await
    }

    async fn list_vouchers(&mut self, filter: &VoucherFilter) -> StoreResult<Vec<Voucher>> {
        self.inner.list_vouchers(filter).await
    }

    async fn insert_period(&mut self, period: &FiscalPeriod) -> StoreResult<()> {
        self.inner.insert_period(period).await
    }

    async fn update_period(&mut self, period: &FiscalPeriod) -> StoreResult<()> {
        self.inner.update_period(period).await
    }

    async fn get_period(&mut self, month: YearMonth) -> StoreResult<Option<FiscalPeriod>> {
        self.inner.get_period(month).await
    }

    async fn find_period_for_date(
        &mut self,
        date: NaiveDate,
    ) -> StoreResult<Option<FiscalPeriod>> {
        self.inner.find_period_for_date(date).await
    }

    async fn list_periods(&mut self) -> StoreResult<Vec<FiscalPeriod>> {
        self.inner.list_periods().await
    }

    async fn add_to_balance(&mut self, delta: &BalanceDelta) -> StoreResult<()> {
        injected(&self.faults.balance_updates, "balance update")?;
        self.inner.add_to_balance(delta).await
    }

    async fn seed_opening(&mut self, seed: &OpeningSeed) -> StoreResult<()> {
        self.inner.seed_opening(seed).await
    }

    async fn list_balances(
        &mut self,
        account_id: Option<AccountId>,
        until: YearMonth,
    ) -> StoreResult<Vec<LedgerBalance>> {
        self.inner.list_balances(account_id, until).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        this.inner.commit().await
    }
}

/// A tenant with a small chart of accounts and an open fiscal year.
pub struct Books {
    pub engine: LedgerEngine,
    pub tenant: TenantId,
    pub clerk: UserId,
    pub approver: UserId,
    pub cash: AccountId,
    pub bank: AccountId,
    pub receivables: AccountId,
    pub equity: AccountId,
    pub revenue: AccountId,
    pub expense: AccountId,
}

impl Books {
    pub async fn new() -> Self {
        Self::with_store(Arc::new(InMemoryStore::default())).await
    }

    pub async fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(YEAR, 6, 30, 12, 0, 0).unwrap());
        let engine = LedgerEngine::new(store, Arc::new(clock), EngineSettings::default());
        Self::seed(engine, TenantId::new()).await
    }

    pub async fn seed(engine: LedgerEngine, tenant: TenantId) -> Self {
        let clerk = UserId::new();
        let add = |input: CreateAccountInput| {
            let engine = engine.clone();
            async move {
                engine
                    .accounts
                    .create_account(tenant, clerk, input)
                    .await
                    .unwrap()
                    .id
            }
        };
        let cash = add(CreateAccountInput::new("101", "Cash", AccountType::Asset)).await;
        let bank = add(CreateAccountInput::new("102", "Bank", AccountType::Asset)).await;
        let receivables = add(
            CreateAccountInput::new("103", "Accounts Receivable", AccountType::Asset).control(),
        )
        .await;
        let equity = add(CreateAccountInput::new("301", "Share Capital", AccountType::Equity)).await;
        let revenue = add(CreateAccountInput::new("401", "Sales", AccountType::Revenue)).await;
        let expense = add(CreateAccountInput::new("501", "Rent", AccountType::Expense)).await;

        engine.fiscal.create_fiscal_year(tenant, YEAR).await.unwrap();

        Self {
            engine,
            tenant,
            clerk,
            approver: UserId::new(),
            cash,
            bank,
            receivables,
            equity,
            revenue,
            expense,
        }
    }

    pub fn input(
        &self,
        on: NaiveDate,
        debit: AccountId,
        credit: AccountId,
        amount: Decimal,
    ) -> CreateVoucherInput {
        CreateVoucherInput::new(VoucherType::General, on)
            .with_description("test voucher")
            .with_entry(EntryInput::debit(debit, amount))
            .with_entry(EntryInput::credit(credit, amount))
    }

    pub async fn draft(
        &self,
        on: NaiveDate,
        debit: AccountId,
        credit: AccountId,
        amount: Decimal,
    ) -> Voucher {
        self.engine
            .vouchers
            .create_voucher(self.tenant, self.clerk, self.input(on, debit, credit, amount))
            .await
            .unwrap()
    }

    pub async fn approved(
        &self,
        on: NaiveDate,
        debit: AccountId,
        credit: AccountId,
        amount: Decimal,
    ) -> Voucher {
        let voucher = self.draft(on, debit, credit, amount).await;
        let vouchers = &self.engine.vouchers;
        vouchers
            .submit(self.tenant, self.clerk, voucher.id)
            .await
            .unwrap();
        vouchers
            .approve(self.tenant, self.approver, voucher.id, None)
            .await
            .unwrap()
    }

    pub async fn posted(
        &self,
        on: NaiveDate,
        debit: AccountId,
        credit: AccountId,
        amount: Decimal,
    ) -> Voucher {
        let voucher = self.approved(on, debit, credit, amount).await;
        self.engine
            .vouchers
            .post(self.tenant, self.approver, voucher.id)
            .await
            .unwrap()
    }

    pub async fn balance(&self, account: AccountId, m: u32) -> Option<LedgerBalance> {
        let range = ledgerline_core::fiscal::PeriodRange::single(month(m));
        self.engine
            .reports
            .get_account_balances(self.tenant, account, range)
            .await
            .unwrap()
            .into_iter()
            .next()
    }
}
