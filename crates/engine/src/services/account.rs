//! Chart of accounts administration.

use std::sync::Arc;

use ledgerline_core::account::{
    Account, AccountFilter, AccountType, AccountUsage, CreateAccountInput, UpdateAccountInput,
};
use ledgerline_core::{Clock, LedgerError};
use ledgerline_shared::types::{AccountId, TenantId, UserId};
use tracing::{info, instrument, warn};

use super::load_chart;
use crate::store::LedgerStore;

/// Service for the account registry.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Creates a new account service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Creates an account under an optional parent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountCode`, `AccountNameRequired`,
    /// `DuplicateAccountCode`, `ParentNotFound` or `AccountCycle`.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_account(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        input: CreateAccountInput,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        let account = chart
            .prepare_create(AccountId::new(), &input, actor, self.clock.now())
            .inspect_err(|e| warn!(error = %e, "account creation refused"))?;

        tx.insert_account(&account).await?;
        tx.commit().await?;

        info!(
            %tenant_id,
            account_id = %account.id,
            code = %account.code,
            path = %account.path,
            "account created"
        );
        Ok(account)
    }

    /// Renames, reflags or reparents an account.
    ///
    /// Reparenting rewrites `level` and `path` of the whole subtree in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountNameRequired`, `ParentNotFound`
    /// or `AccountCycle`.
    #[instrument(skip(self, input))]
    pub async fn update_account(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        account_id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        let changed = chart
            .prepare_update(account_id, &input, actor, self.clock.now())
            .inspect_err(|e| warn!(error = %e, "account update refused"))?;

        for account in &changed {
            tx.update_account(account).await?;
        }
        tx.commit().await?;

        let updated = changed
            .into_iter()
            .next()
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        info!(%tenant_id, %account_id, path = %updated.path, "account updated");
        Ok(updated)
    }

    /// Blocks future postings to an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub async fn deactivate_account(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        self.set_active(tenant_id, actor, account_id, false).await
    }

    /// Accepts postings to an account again.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub async fn reactivate_account(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        self.set_active(tenant_id, actor, account_id, true).await
    }

    #[instrument(skip(self))]
    async fn set_active(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        account_id: AccountId,
        active: bool,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        let account = chart.prepare_set_active(account_id, active, actor, self.clock.now())?;
        tx.update_account(&account).await?;
        tx.commit().await?;

        info!(%tenant_id, %account_id, is_active = active, "account activity changed");
        Ok(account)
    }

    /// Hard-deletes an account that has no children, no postings and no
    /// unposted vouchers referencing it.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountHasChildren`,
    /// `AccountHasPostings` or `AccountInUse`.
    #[instrument(skip(self))]
    pub async fn delete_account(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> Result<(), LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        let usage = AccountUsage {
            has_postings: tx.account_has_postings(account_id).await?,
            has_open_vouchers: tx.account_has_open_vouchers(account_id).await?,
        };
        chart
            .check_delete(account_id, usage)
            .inspect_err(|e| warn!(error = %e, "account deletion refused"))?;

        tx.delete_account(account_id).await?;
        tx.commit().await?;

        info!(%tenant_id, %account_id, "account deleted");
        Ok(())
    }

    /// Gets an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub async fn get_account(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        tx.get_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Gets an account by its code.
    ///
    /// # Errors
    ///
    /// Returns `AccountCodeNotFound` if no account has the code.
    pub async fn find_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        chart
            .find_by_code(code)
            .cloned()
            .ok_or_else(|| LedgerError::AccountCodeNotFound(code.to_string()))
    }

    /// Lists accounts matching a filter, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the chart cannot be read.
    pub async fn list_accounts(
        &self,
        tenant_id: TenantId,
        filter: &AccountFilter,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        Ok(chart.list(filter).into_iter().cloned().collect())
    }

    /// Lists accounts of one type, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the chart cannot be read.
    pub async fn accounts_by_type(
        &self,
        tenant_id: TenantId,
        account_type: AccountType,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        Ok(chart.by_type(account_type).into_iter().cloned().collect())
    }

    /// Ancestors of an account, root first.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub async fn ancestors(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        Ok(chart.ancestors(account_id)?.into_iter().cloned().collect())
    }

    /// Every account below an account, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub async fn descendants(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let chart = load_chart(tx.as_mut()).await?;
        Ok(chart.descendants(account_id)?.into_iter().cloned().collect())
    }

    /// Returns true if the account accepts direct postings.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub async fn can_post(
        &self,
        tenant_id: TenantId,
        account_id: AccountId,
    ) -> Result<bool, LedgerError> {
        Ok(self.get_account(tenant_id, account_id).await?.can_post())
    }
}
