//! Fiscal period management.
//!
//! Monthly periods gate whether postings are accepted for a date. Periods
//! move open → closed → locked and close in calendar order.

pub mod gate;
pub mod period;

pub use gate::{can_post, check_posting, ensure_closable};
pub use period::{FiscalPeriod, FiscalPeriodStatus, PeriodRange, YearMonth};
