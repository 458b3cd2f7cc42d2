//! Read-only reports over ledger balances and posted vouchers.

use std::sync::Arc;

use ledgerline_core::LedgerError;
use ledgerline_core::fiscal::PeriodRange;
use ledgerline_core::ledger::LedgerBalance;
use ledgerline_core::reports::{AccountLedger, DateRange, ReportBuilder, TrialBalance};
use ledgerline_core::voucher::VoucherFilter;
use ledgerline_shared::types::{AccountId, TenantId};
use tracing::{debug, instrument};

use super::load_chart;
use crate::store::LedgerStore;

/// Service for financial reports.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn LedgerStore>,
}

impl ReportService {
    /// Creates a new report service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Trial balance of every account with activity up to the end of the
    /// range.
    ///
    /// # Errors
    ///
    /// Returns a storage error if balances or accounts cannot be read.
    #[instrument(skip(self))]
    pub async fn get_trial_balance(
        &self,
        tenant_id: TenantId,
        range: PeriodRange,
    ) -> Result<TrialBalance, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        let rows = tx.list_balances(None, range.to).await?;
        let report = ReportBuilder::trial_balance(range, &chart, &rows)?;
        debug!(
            items = report.items.len(),
            balanced = report.totals.is_balanced,
            "trial balance built"
        );
        Ok(report)
    }

    /// Monthly balance rows of one account within the range.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown.
    pub async fn get_account_balances(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
        range: PeriodRange,
    ) -> Result<Vec<LedgerBalance>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        if tx.get_account(account_id).await?.is_none() {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        let mut rows = tx.list_balances(Some(account_id), range.to).await?;
        rows.retain(|row| range.contains(row.period));
        rows.sort_by_key(|row| row.period);
        Ok(rows)
    }

    /// Posted lines of one account within a date range with a running
    /// balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown.
    #[instrument(skip(self))]
    pub async fn get_account_ledger(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<AccountLedger, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let account = tx
            .get_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        let filter = VoucherFilter {
            date_to: Some(range.to),
            ..VoucherFilter::posted()
        };
        let vouchers = tx.list_vouchers(&filter).await?;
        ReportBuilder::account_ledger(&account, range, &vouchers)
    }
}
