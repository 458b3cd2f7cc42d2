//! Voucher domain types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use ledgerline_shared::types::{AccountId, CostCenterId, DepartmentId, Money, PartnerId, ProjectId};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Voucher type. Each type has its own number sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherType {
    /// General journal.
    General,
    /// Sales journal.
    Sales,
    /// Purchase journal.
    Purchase,
    /// Cash or bank payment.
    Payment,
    /// Cash or bank receipt.
    Receipt,
    /// Period-end adjustment.
    Adjustment,
    /// Year-end closing entry.
    Closing,
}

/// Prefix used for voucher numbers of unrecognised types.
pub const UNKNOWN_VOUCHER_PREFIX: &str = "XX";

impl VoucherType {
    /// All voucher types.
    pub const ALL: [Self; 7] = [
        Self::General,
        Self::Sales,
        Self::Purchase,
        Self::Payment,
        Self::Receipt,
        Self::Adjustment,
        Self::Closing,
    ];

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Sales => "sales",
            Self::Purchase => "purchase",
            Self::Payment => "payment",
            Self::Receipt => "receipt",
            Self::Adjustment => "adjustment",
            Self::Closing => "closing",
        }
    }

    /// Two-letter prefix of the voucher number.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::General => "GJ",
            Self::Sales => "SJ",
            Self::Purchase => "PJ",
            Self::Payment => "PM",
            Self::Receipt => "RC",
            Self::Adjustment => "AJ",
            Self::Closing => "CL",
        }
    }

    /// Looks up the type owning a number prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.prefix() == prefix)
    }

    /// Parses a stored or user-supplied voucher type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidVoucherType` for unknown values.
    pub fn parse(value: &str) -> Result<Self, LedgerError> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| LedgerError::InvalidVoucherType(value.to_string()))
    }
}

/// Number prefix for a stored type string, `XX` when unrecognised.
#[must_use]
pub fn voucher_prefix_for(voucher_type: &str) -> &'static str {
    VoucherType::parse(voucher_type).map_or(UNKNOWN_VOUCHER_PREFIX, VoucherType::prefix)
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Voucher workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Being edited.
    Draft,
    /// Submitted, awaiting approval.
    Pending,
    /// Approved, ready to post.
    Approved,
    /// Sent back for correction.
    Rejected,
    /// Applied to the ledger. Immutable.
    Posted,
    /// Abandoned. Terminal.
    Cancelled,
}

impl VoucherStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Posted => "posted",
            Self::Cancelled => "cancelled",
        }
    }

    /// Entries and header may change only in draft or rejected.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }

    /// Posted and cancelled vouchers never change status again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Posted | Self::Cancelled)
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional analysis tags on an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Customer or supplier.
    pub partner_id: Option<PartnerId>,
    /// Department.
    pub department_id: Option<DepartmentId>,
    /// Project.
    pub project_id: Option<ProjectId>,
    /// Cost center.
    pub cost_center_id: Option<CostCenterId>,
}

/// One debit or credit line of a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherEntry {
    /// Line number, unique within the voucher.
    pub line_no: u32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount; zero on credit lines.
    pub debit_amount: Money,
    /// Credit amount; zero on debit lines.
    pub credit_amount: Money,
    /// Line memo.
    pub description: Option<String>,
    /// Analysis tags.
    #[serde(default)]
    pub dimensions: Dimensions,
}

impl VoucherEntry {
    /// Returns true for a debit line.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.debit_amount.is_positive()
    }

    /// Signed amount, debit-positive.
    #[must_use]
    pub fn net(&self) -> Money {
        self.debit_amount - self.credit_amount
    }
}

/// Input for one entry line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInput {
    /// Explicit line number; the next free number when absent.
    pub line_no: Option<u32>,
    /// Account to post to.
    pub account_id: AccountId,
    /// Debit amount.
    #[serde(default)]
    pub debit_amount: Money,
    /// Credit amount.
    #[serde(default)]
    pub credit_amount: Money,
    /// Line memo.
    pub description: Option<String>,
    /// Analysis tags.
    #[serde(default)]
    pub dimensions: Dimensions,
}

impl EntryInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: impl Into<Money>) -> Self {
        Self {
            line_no: None,
            account_id,
            debit_amount: amount.into(),
            credit_amount: Money::ZERO,
            description: None,
            dimensions: Dimensions::default(),
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: impl Into<Money>) -> Self {
        Self {
            line_no: None,
            account_id,
            debit_amount: Money::ZERO,
            credit_amount: amount.into(),
            description: None,
            dimensions: Dimensions::default(),
        }
    }

    /// Sets the line memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an explicit line number.
    #[must_use]
    pub fn with_line_no(mut self, line_no: u32) -> Self {
        self.line_no = Some(line_no);
        self
    }

    /// Sets the analysis tags.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }
}

/// Input for creating a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVoucherInput {
    /// Accounting date; determines the fiscal year and period.
    pub voucher_date: NaiveDate,
    /// Voucher type.
    pub voucher_type: VoucherType,
    /// Header memo.
    pub description: Option<String>,
    /// Reference to a source document (invoice number, receipt id).
    pub source_reference: Option<String>,
    /// Initial entries.
    #[serde(default)]
    pub entries: Vec<EntryInput>,
}

impl CreateVoucherInput {
    /// A voucher input without entries.
    #[must_use]
    pub fn new(voucher_type: VoucherType, voucher_date: NaiveDate) -> Self {
        Self {
            voucher_date,
            voucher_type,
            description: None,
            source_reference: None,
            entries: Vec::new(),
        }
    }

    /// Sets the header memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an entry.
    #[must_use]
    pub fn with_entry(mut self, entry: EntryInput) -> Self {
        self.entries.push(entry);
        self
    }
}

/// Header changes on an editable voucher. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVoucherInput {
    /// New date within the same fiscal year.
    pub voucher_date: Option<NaiveDate>,
    /// New header memo.
    pub description: Option<String>,
    /// New source reference.
    pub source_reference: Option<String>,
}

/// Debit and credit column totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherTotals {
    /// Sum of debit amounts.
    pub total_debit: Money,
    /// Sum of credit amounts.
    pub total_credit: Money,
}

impl VoucherTotals {
    /// Sums both columns independently.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` when a column leaves the decimal range.
    pub fn of(entries: &[VoucherEntry]) -> Result<Self, LedgerError> {
        let column = |side: fn(&VoucherEntry) -> Money| {
            Money::checked_sum(entries.iter().map(side)).ok_or(LedgerError::AmountOverflow)
        };
        Ok(Self {
            total_debit: column(|e| e.debit_amount)?,
            total_credit: column(|e| e.credit_amount)?,
        })
    }

    /// Exact decimal comparison of the two columns.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    /// Debit minus credit.
    #[must_use]
    pub fn difference(&self) -> Money {
        self.total_debit - self.total_credit
    }
}

/// Criteria for listing vouchers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherFilter {
    /// Only vouchers in this status.
    pub status: Option<VoucherStatus>,
    /// Only vouchers of this type.
    pub voucher_type: Option<VoucherType>,
    /// Only vouchers dated on or after.
    pub date_from: Option<NaiveDate>,
    /// Only vouchers dated on or before.
    pub date_to: Option<NaiveDate>,
}

impl VoucherFilter {
    /// Only posted vouchers.
    #[must_use]
    pub fn posted() -> Self {
        Self {
            status: Some(VoucherStatus::Posted),
            ..Self::default()
        }
    }

    /// Returns true if a voucher with these attributes passes the filter.
    #[must_use]
    pub fn matches(&self, status: VoucherStatus, voucher_type: VoucherType, date: NaiveDate) -> bool {
        self.status.is_none_or(|s| s == status)
            && self.voucher_type.is_none_or(|t| t == voucher_type)
            && self.date_from.is_none_or(|from| date >= from)
            && self.date_to.is_none_or(|to| date <= to)
    }
}
