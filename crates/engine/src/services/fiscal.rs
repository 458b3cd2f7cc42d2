//! Fiscal period administration and period-end rollover.

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerline_core::fiscal::{FiscalPeriod, YearMonth, can_post, ensure_closable};
use ledgerline_core::ledger::rollover;
use ledgerline_core::{Clock, LedgerError, Stamp};
use ledgerline_shared::types::{FiscalPeriodId, TenantId, UserId};
use tracing::{debug, info, instrument, warn};

use crate::store::{LedgerStore, StoreTransaction};

/// Service for fiscal periods.
#[derive(Clone)]
pub struct FiscalService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

async fn load_period(
    tx: &mut dyn StoreTransaction,
    month: YearMonth,
) -> Result<FiscalPeriod, LedgerError> {
    tx.get_period(month)
        .await?
        .ok_or(LedgerError::FiscalPeriodNotFound {
            year: month.year,
            month: month.month,
        })
}

impl FiscalService {
    /// Creates a new fiscal service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Opens the period of one calendar month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFiscalMonth` or `FiscalPeriodExists`.
    #[instrument(skip(self))]
    pub async fn create_period(
        &self,
        tenant_id: TenantId,
        year: i32,
        month: u32,
    ) -> Result<FiscalPeriod, LedgerError> {
        let period = FiscalPeriod::for_month(FiscalPeriodId::new(), tenant_id, year, month)?;
        let mut tx = self.store.begin(tenant_id).await?;
        if tx.get_period(period.year_month()).await?.is_some() {
            return Err(LedgerError::FiscalPeriodExists { year, month });
        }
        tx.insert_period(&period).await?;
        tx.commit().await?;

        info!(%tenant_id, period = %period.year_month(), "fiscal period created");
        Ok(period)
    }

    /// Opens the twelve monthly periods of a year, skipping months that
    /// already exist. Returns the periods created.
    ///
    /// # Errors
    ///
    /// Returns a storage error; no period is created in that case.
    #[instrument(skip(self))]
    pub async fn create_fiscal_year(
        &self,
        tenant_id: TenantId,
        year: i32,
    ) -> Result<Vec<FiscalPeriod>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let mut created = Vec::with_capacity(12);
        for month in 1..=12 {
            let period = FiscalPeriod::for_month(FiscalPeriodId::new(), tenant_id, year, month)?;
            if tx.get_period(period.year_month()).await?.is_some() {
                debug!(period = %period.year_month(), "fiscal period exists, skipped");
                continue;
            }
            tx.insert_period(&period).await?;
            created.push(period);
        }
        tx.commit().await?;

        info!(%tenant_id, year, created = created.len(), "fiscal year created");
        Ok(created)
    }

    /// Returns true if a voucher dated `date` could be posted now.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the periods cannot be read.
    pub async fn can_post(&self, tenant_id: TenantId, date: NaiveDate) -> Result<bool, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let period = tx.find_period_for_date(date).await?;
        Ok(can_post(period.as_ref(), date))
    }

    /// Closes an open period and carries each account's cumulative balance
    /// into the next month's opening columns.
    ///
    /// # Errors
    ///
    /// Returns `FiscalPeriodNotFound`, `PeriodNotOpen`,
    /// `EarlierPeriodsOpen` or `EarlierPeriodMissing`.
    #[instrument(skip(self))]
    pub async fn close_period(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        year: i32,
        month: u32,
    ) -> Result<FiscalPeriod, LedgerError> {
        let month = YearMonth::new(year, month)?;
        let mut tx = self.store.begin(tenant_id).await?;
        let mut period = load_period(tx.as_mut(), month).await?;
        let all = tx.list_periods().await?;
        ensure_closable(&period, &all)
            .inspect_err(|e| warn!(period = %month, error = %e, "period close refused"))?;

        let history = tx.list_balances(None, month).await?;
        let seeds = rollover(&history, month.next())?;
        for seed in &seeds {
            tx.seed_opening(seed).await?;
        }
        period.close(Stamp::now(actor, self.clock.as_ref()))?;
        tx.update_period(&period).await?;
        tx.commit().await?;

        info!(
            %tenant_id,
            period = %month,
            carried_forward = seeds.len(),
            "fiscal period closed"
        );
        Ok(period)
    }

    /// Locks a closed period.
    ///
    /// # Errors
    ///
    /// Returns `FiscalPeriodNotFound` or `InvalidPeriodTransition`.
    #[instrument(skip(self))]
    pub async fn lock_period(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        year: i32,
        month: u32,
    ) -> Result<FiscalPeriod, LedgerError> {
        let month = YearMonth::new(year, month)?;
        let mut tx = self.store.begin(tenant_id).await?;
        let mut period = load_period(tx.as_mut(), month).await?;
        period
            .lock(Stamp::now(actor, self.clock.as_ref()))
            .inspect_err(|e| warn!(period = %month, error = %e, "period lock refused"))?;
        tx.update_period(&period).await?;
        tx.commit().await?;

        info!(%tenant_id, period = %month, "fiscal period locked");
        Ok(period)
    }

    /// Gets the period of one month.
    ///
    /// # Errors
    ///
    /// Returns `FiscalPeriodNotFound` if the month has no period.
    pub async fn get_period(
        &self,
        tenant_id: TenantId,
        year: i32,
        month: u32,
    ) -> Result<FiscalPeriod, LedgerError> {
        let month = YearMonth::new(year, month)?;
        let mut tx = self.store.begin(tenant_id).await?;
        load_period(tx.as_mut(), month).await
    }

    /// Lists every period ordered by month.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the periods cannot be read.
    pub async fn list_periods(&self, tenant_id: TenantId) -> Result<Vec<FiscalPeriod>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        Ok(tx.list_periods().await?)
    }
}
