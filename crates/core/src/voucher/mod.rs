//! Vouchers: journal transactions and their approval workflow.
//!
//! This module implements:
//! - Voucher and entry types
//! - Entry validation against posting rules
//! - The voucher aggregate and its state machine
//! - Voucher number formatting
//! - Reversal construction

pub mod aggregate;
pub mod numbering;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod aggregate_props;
#[cfg(test)]
mod validation_props;

pub use aggregate::{Voucher, VoucherRules};
pub use numbering::{ParsedVoucherNo, SequenceKey, format_voucher_no, parse_voucher_no};
pub use reversal::build_reversal;
pub use types::{
    CreateVoucherInput, Dimensions, EntryInput, UpdateVoucherInput, VoucherEntry, VoucherFilter,
    VoucherStatus, VoucherTotals, VoucherType, voucher_prefix_for,
};
pub use validation::{EntryValidator, check_amounts};
