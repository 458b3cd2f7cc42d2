//! Voucher number format.
//!
//! Numbers look like `GJ-2026-000001`: type prefix, fiscal year, and a
//! per (tenant, fiscal year, type) sequence padded to six digits.

use ledgerline_shared::types::TenantId;
use serde::{Deserialize, Serialize};

use super::types::VoucherType;
use crate::error::LedgerError;

/// Minimum width of the sequence part.
pub const SEQUENCE_WIDTH: usize = 6;

/// Key of one voucher number counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceKey {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Fiscal year taken from the voucher date.
    pub fiscal_year: i32,
    /// Voucher type.
    pub voucher_type: VoucherType,
}

/// Formats a voucher number. Sequences past 999999 widen instead of wrapping.
#[must_use]
pub fn format_voucher_no(voucher_type: VoucherType, fiscal_year: i32, sequence: u64) -> String {
    format!(
        "{}-{fiscal_year:04}-{sequence:0width$}",
        voucher_type.prefix(),
        width = SEQUENCE_WIDTH
    )
}

/// The parts of a voucher number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVoucherNo {
    /// Two-letter prefix.
    pub prefix: String,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Sequence within the year and type.
    pub sequence: u64,
}

impl ParsedVoucherNo {
    /// The voucher type owning the prefix, if known.
    #[must_use]
    pub fn voucher_type(&self) -> Option<VoucherType> {
        VoucherType::from_prefix(&self.prefix)
    }
}

/// Splits a voucher number into its parts.
///
/// # Errors
///
/// Returns `InvalidVoucherNumber` unless the input is two uppercase letters,
/// a four-digit year and a positive sequence of at least six digits,
/// separated by `-`.
pub fn parse_voucher_no(voucher_no: &str) -> Result<ParsedVoucherNo, LedgerError> {
    let invalid = || LedgerError::InvalidVoucherNumber(voucher_no.to_string());
    let mut parts = voucher_no.split('-');
    let (Some(prefix), Some(year), Some(seq), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if prefix.len() != 2 || !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(invalid());
    }
    if year.len() != 4 || !digits(year) || seq.len() < SEQUENCE_WIDTH || !digits(seq) {
        return Err(invalid());
    }

    let fiscal_year = year.parse().map_err(|_| invalid())?;
    let sequence: u64 = seq.parse().map_err(|_| invalid())?;
    if sequence == 0 {
        return Err(invalid());
    }

    Ok(ParsedVoucherNo {
        prefix: prefix.to_string(),
        fiscal_year,
        sequence,
    })
}
