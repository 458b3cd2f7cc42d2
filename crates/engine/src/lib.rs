//! Ledger engine: the transactional store boundary and async services.
//!
//! This crate provides:
//! - The tenant-scoped [`LedgerStore`] / [`StoreTransaction`] abstraction
//! - An in-memory store for development and tests
//! - Services that execute every ledger operation as one unit of work
//! - The [`LedgerEngine`] facade bundling the services

pub mod error;
pub mod services;
pub mod settings;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use services::{AccountService, FiscalService, ReportService, VoucherService};
pub use settings::EngineSettings;
pub use store::{InMemoryStore, LedgerStore, StoreTransaction};

use std::sync::Arc;

use ledgerline_core::{Clock, SystemClock};
use ledgerline_shared::AppConfig;

/// Entry point bundling every ledger service over one store and clock.
#[derive(Clone)]
pub struct LedgerEngine {
    /// Chart of accounts administration.
    pub accounts: AccountService,
    /// Voucher workflow.
    pub vouchers: VoucherService,
    /// Fiscal periods.
    pub fiscal: FiscalService,
    /// Read-only reports.
    pub reports: ReportService,
}

impl LedgerEngine {
    /// Creates an engine over the given store and clock.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            accounts: AccountService::new(Arc::clone(&store), Arc::clone(&clock)),
            vouchers: VoucherService::new(Arc::clone(&store), Arc::clone(&clock), settings.rules),
            fiscal: FiscalService::new(Arc::clone(&store), clock),
            reports: ReportService::new(store),
        }
    }

    /// Creates an engine over a fresh in-memory store and the system clock.
    #[must_use]
    pub fn in_memory(settings: EngineSettings) -> Self {
        let store = Arc::new(InMemoryStore::new(settings.lock_timeout));
        Self::new(store, Arc::new(SystemClock), settings)
    }

    /// Creates an in-memory engine configured from the application config.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::in_memory(EngineSettings::from(&config.engine))
    }
}
