//! Async services that run each ledger operation as one store transaction.

mod account;
mod fiscal;
mod reports;
mod voucher;

pub use account::AccountService;
pub use fiscal::FiscalService;
pub use reports::ReportService;
pub use voucher::VoucherService;

use ledgerline_core::LedgerError;
use ledgerline_core::account::ChartOfAccounts;

use crate::store::StoreTransaction;

/// Loads the tenant's whole chart of accounts.
async fn load_chart(tx: &mut dyn StoreTransaction) -> Result<ChartOfAccounts, LedgerError> {
    let tenant_id = tx.tenant_id();
    let accounts = tx.list_accounts().await?;
    Ok(ChartOfAccounts::from_accounts(tenant_id, accounts))
}
