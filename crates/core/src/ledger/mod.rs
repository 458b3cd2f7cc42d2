//! Ledger balance aggregation.
//!
//! This module implements:
//! - Per-account, per-month balance rows with derived closing columns
//! - Posting deltas grouped by account
//! - Opening seeds for period rollover

pub mod aggregator;
pub mod balance;

#[cfg(test)]
mod aggregator_props;

pub use aggregator::{movements_before, posting_deltas, rollover};
pub use balance::{BalanceDelta, LedgerBalance, OpeningSeed};
