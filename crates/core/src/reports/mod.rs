//! Read-only report projections.
//!
//! Trial balance over ledger balance rows and account ledgers over posted
//! vouchers.

pub mod service;
pub mod types;


pub use service::ReportBuilder;
pub use types::{
    AccountLedger, AccountLedgerLine, DateRange, TrialBalance, TrialBalanceItem,
    TrialBalanceTotals,
};
