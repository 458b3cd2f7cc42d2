//! Core business logic for Ledgerline.
//!
//! This crate contains pure business logic with ZERO storage or async dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `account` - Chart of accounts hierarchy and posting eligibility
//! - `voucher` - Vouchers, entry validation, the approval state machine
//! - `fiscal` - Fiscal periods and the posting gate
//! - `ledger` - Per-account, per-month balance aggregation
//! - `reports` - Trial balance and account ledger projections

pub mod account;
pub mod clock;
pub mod error;
pub mod fiscal;
pub mod ledger;
pub mod reports;
pub mod voucher;

pub use clock::{Clock, FixedClock, Stamp, SystemClock};
pub use error::{AccountRejection, ErrorKind, LedgerError};
