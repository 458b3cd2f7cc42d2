//! The voucher aggregate and its approval state machine.
//!
//! ```text
//! draft ──submit──▶ pending ──approve──▶ approved ──post──▶ posted
//!   │                │  ▲                                     │
//!   │             reject submit                         (reversal voucher)
//!   │                ▼  │
//!   │              rejected
//!   └──cancel──▶ cancelled ◀──cancel── pending
//! ```
//!
//! Every transition either succeeds completely or leaves the voucher
//! untouched. Totals are recomputed from the entries at every mutation and
//! again inside `submit` and `post`. An edit whose totals would leave the
//! decimal range is refused before anything changes.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use ledgerline_shared::types::{Money, TenantId, VoucherId};
use serde::{Deserialize, Serialize};

use super::types::{
    CreateVoucherInput, EntryInput, UpdateVoucherInput, VoucherEntry, VoucherStatus,
    VoucherTotals, VoucherType,
};
use super::validation::{EntryValidator, check_amounts};
use crate::account::AccountLookup;
use crate::clock::Stamp;
use crate::error::LedgerError;
use crate::fiscal::{FiscalPeriod, YearMonth, check_posting};

/// Tunable limits for voucher edits and transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoucherRules {
    /// Upper bound on entry lines per voucher.
    pub max_entries: usize,
    /// Whether `reject` needs a non-blank reason.
    pub require_rejection_reason: bool,
}

impl Default for VoucherRules {
    fn default() -> Self {
        Self {
            max_entries: 500,
            require_rejection_reason: true,
        }
    }
}

/// One journal transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique identifier.
    pub id: VoucherId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Human-readable number, unique per tenant.
    pub voucher_no: String,
    /// Accounting date.
    pub voucher_date: NaiveDate,
    /// Fiscal year, the calendar year of `voucher_date`.
    pub fiscal_year: i32,
    /// Fiscal month of `voucher_date`.
    pub fiscal_month: u32,
    /// Voucher type.
    pub voucher_type: VoucherType,
    /// Workflow status.
    pub status: VoucherStatus,
    /// Sum of entry debits.
    pub total_debit: Money,
    /// Sum of entry credits.
    pub total_credit: Money,
    /// Header memo.
    pub description: Option<String>,
    /// Source document reference.
    pub source_reference: Option<String>,
    /// Entry lines ordered by line number.
    pub entries: Vec<VoucherEntry>,
    /// True if this voucher reverses another.
    pub is_reversal: bool,
    /// The voucher this one reverses.
    pub reversal_of_id: Option<VoucherId>,
    /// The voucher reversing this one.
    pub reversed_by_id: Option<VoucherId>,
    /// Creator and creation time.
    pub created: Stamp,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Last submission.
    pub submitted: Option<Stamp>,
    /// Approval.
    pub approved: Option<Stamp>,
    /// Approver's notes.
    pub approval_notes: Option<String>,
    /// Last rejection.
    pub rejected: Option<Stamp>,
    /// Reason given on the last rejection.
    pub rejection_reason: Option<String>,
    /// Posting.
    pub posted: Option<Stamp>,
    /// Cancellation.
    pub cancelled: Option<Stamp>,
    /// Reason given on cancellation.
    pub cancellation_reason: Option<String>,
    /// Incremented on every persisted change.
    pub version: u64,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Turns an input into a line, numbering it after `existing` when needed.
fn stage_entry(
    existing: &[VoucherEntry],
    input: EntryInput,
    rules: &VoucherRules,
) -> Result<VoucherEntry, LedgerError> {
    if existing.len() >= rules.max_entries {
        return Err(LedgerError::TooManyEntries {
            max: rules.max_entries,
        });
    }
    let line_no = match input.line_no {
        Some(line_no) => line_no,
        None => {
            let last = existing.iter().map(|e| e.line_no).max().unwrap_or(0);
            last.checked_add(1).ok_or(LedgerError::LineNumbersExhausted(last))?
        }
    };
    if line_no == 0 {
        return Err(LedgerError::InvalidLineNumber);
    }
    if existing.iter().any(|e| e.line_no == line_no) {
        return Err(LedgerError::DuplicateLineNumber(line_no));
    }
    check_amounts(line_no, input.debit_amount, input.credit_amount)?;
    Ok(VoucherEntry {
        line_no,
        account_id: input.account_id,
        debit_amount: input.debit_amount,
        credit_amount: input.credit_amount,
        description: blank_to_none(input.description),
        dimensions: input.dimensions,
    })
}

impl Voucher {
    /// A draft with no entries.
    pub(crate) fn blank(
        id: VoucherId,
        tenant_id: TenantId,
        voucher_no: String,
        voucher_type: VoucherType,
        voucher_date: NaiveDate,
        created: Stamp,
    ) -> Self {
        Self {
            id,
            tenant_id,
            voucher_no,
            voucher_date,
            fiscal_year: voucher_date.year(),
            fiscal_month: voucher_date.month(),
            voucher_type,
            status: VoucherStatus::Draft,
            total_debit: Money::ZERO,
            total_credit: Money::ZERO,
            description: None,
            source_reference: None,
            entries: Vec::new(),
            is_reversal: false,
            reversal_of_id: None,
            reversed_by_id: None,
            created,
            updated_at: created.at,
            submitted: None,
            approved: None,
            approval_notes: None,
            rejected: None,
            rejection_reason: None,
            posted: None,
            cancelled: None,
            cancellation_reason: None,
            version: 1,
        }
    }

    /// Creates a draft voucher with its initial entries.
    ///
    /// `voucher_no` must already be allocated for the voucher's type and
    /// fiscal year.
    ///
    /// # Errors
    ///
    /// Returns the first entry error (`EntryInvalidAmount`,
    /// `EntryZeroAmount`, `DuplicateLineNumber`, `TooManyEntries`,
    /// `LineNumbersExhausted`) or `AmountOverflow`.
    pub fn draft(
        id: VoucherId,
        tenant_id: TenantId,
        voucher_no: String,
        input: CreateVoucherInput,
        rules: &VoucherRules,
        created: Stamp,
    ) -> Result<Self, LedgerError> {
        let mut voucher = Self::blank(
            id,
            tenant_id,
            voucher_no,
            input.voucher_type,
            input.voucher_date,
            created,
        );
        voucher.description = blank_to_none(input.description);
        voucher.source_reference = blank_to_none(input.source_reference);
        let mut staged = Vec::with_capacity(input.entries.len());
        for entry in input.entries {
            let entry = stage_entry(&staged, entry, rules)?;
            staged.push(entry);
        }
        voucher.set_entries(staged)?;
        Ok(voucher)
    }

    /// Fiscal month the voucher posts into.
    #[must_use]
    pub const fn period(&self) -> YearMonth {
        YearMonth {
            year: self.fiscal_year,
            month: self.fiscal_month,
        }
    }

    /// Totals recomputed from the current entries.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` when a column leaves the decimal range.
    pub fn totals(&self) -> Result<VoucherTotals, LedgerError> {
        VoucherTotals::of(&self.entries)
    }

    /// Recomputes the stored totals from the entries.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` and leaves the stored totals as they were.
    pub fn calculate_totals(&mut self) -> Result<(), LedgerError> {
        let totals = self.totals()?;
        self.total_debit = totals.total_debit;
        self.total_credit = totals.total_credit;
        Ok(())
    }

    /// Sorts and installs `entries` with fresh totals, or changes nothing.
    pub(crate) fn set_entries(
        &mut self,
        mut entries: Vec<VoucherEntry>,
    ) -> Result<(), LedgerError> {
        entries.sort_by_key(|e| e.line_no);
        let totals = VoucherTotals::of(&entries)?;
        self.entries = entries;
        self.total_debit = totals.total_debit;
        self.total_credit = totals.total_credit;
        Ok(())
    }

    /// Exact comparison of the entry columns. Does not trust stored totals.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.totals().is_ok_and(|t| t.is_balanced())
    }

    /// True only in draft or rejected.
    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.status.is_editable()
    }

    fn ensure_editable(&self) -> Result<(), LedgerError> {
        if self.can_edit() {
            Ok(())
        } else {
            Err(LedgerError::VoucherCannotEdit {
                status: self.status,
            })
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.version += 1;
    }

    /// Looks up an entry by line number.
    #[must_use]
    pub fn entry(&self, line_no: u32) -> Option<&VoucherEntry> {
        self.entries.iter().find(|e| e.line_no == line_no)
    }

    /// Adds an entry line and returns its line number.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit` outside draft/rejected, or an entry error.
    pub fn add_entry(
        &mut self,
        input: EntryInput,
        rules: &VoucherRules,
        now: DateTime<Utc>,
    ) -> Result<u32, LedgerError> {
        self.ensure_editable()?;
        let entry = stage_entry(&self.entries, input, rules)?;
        let line_no = entry.line_no;
        let mut entries = self.entries.clone();
        entries.push(entry);
        self.set_entries(entries)?;
        self.touch(now);
        Ok(line_no)
    }

    /// Removes an entry line.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit` outside draft/rejected or `EntryNotFound`.
    pub fn remove_entry(
        &mut self,
        line_no: u32,
        now: DateTime<Utc>,
    ) -> Result<VoucherEntry, LedgerError> {
        self.ensure_editable()?;
        let index = self
            .entries
            .iter()
            .position(|e| e.line_no == line_no)
            .ok_or(LedgerError::EntryNotFound(line_no))?;
        let mut entries = self.entries.clone();
        let removed = entries.remove(index);
        self.set_entries(entries)?;
        self.touch(now);
        Ok(removed)
    }

    /// Replaces every entry line at once.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit` outside draft/rejected, the first entry
    /// error or `AmountOverflow`; the existing entries are kept on failure.
    pub fn replace_entries(
        &mut self,
        inputs: Vec<EntryInput>,
        rules: &VoucherRules,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_editable()?;
        let mut staged = Vec::with_capacity(inputs.len());
        for input in inputs {
            let entry = stage_entry(&staged, input, rules)?;
            staged.push(entry);
        }
        self.set_entries(staged)?;
        self.touch(now);
        Ok(())
    }

    /// Updates header fields.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit` outside draft/rejected, or
    /// `VoucherDateChangesFiscalYear` when the new date lies in another
    /// fiscal year than the one embedded in the voucher number.
    pub fn update_header(
        &mut self,
        input: UpdateVoucherInput,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_editable()?;
        if let Some(date) = input.voucher_date
            && date.year() != self.fiscal_year
        {
            return Err(LedgerError::VoucherDateChangesFiscalYear {
                from: self.fiscal_year,
                to: date.year(),
            });
        }

        if let Some(date) = input.voucher_date {
            self.voucher_date = date;
            self.fiscal_month = date.month();
        }
        if input.description.is_some() {
            self.description = blank_to_none(input.description);
        }
        if input.source_reference.is_some() {
            self.source_reference = blank_to_none(input.source_reference);
        }
        self.touch(now);
        Ok(())
    }

    /// Entries are present, each one valid, and the columns balance.
    fn ensure_postable_content<L: AccountLookup + ?Sized>(
        &self,
        accounts: &L,
    ) -> Result<VoucherTotals, LedgerError> {
        if self.entries.is_empty() {
            return Err(LedgerError::VoucherNoEntries);
        }
        EntryValidator::new(self.tenant_id, accounts).validate_all(&self.entries)?;
        let totals = self.totals()?;
        if !totals.is_balanced() {
            return Err(LedgerError::VoucherUnbalanced {
                debit: totals.total_debit,
                credit: totals.total_credit,
            });
        }
        Ok(totals)
    }

    /// Submits the voucher for approval.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotSubmit` unless draft or rejected,
    /// `VoucherNoEntries`, an entry error, or `VoucherUnbalanced`.
    pub fn submit<L: AccountLookup + ?Sized>(
        &mut self,
        accounts: &L,
        stamp: Stamp,
    ) -> Result<(), LedgerError> {
        if !matches!(self.status, VoucherStatus::Draft | VoucherStatus::Rejected) {
            return Err(LedgerError::VoucherCannotSubmit {
                status: self.status,
            });
        }
        let totals = self.ensure_postable_content(accounts)?;

        self.total_debit = totals.total_debit;
        self.total_credit = totals.total_credit;
        self.status = VoucherStatus::Pending;
        self.submitted = Some(stamp);
        self.approved = None;
        self.approval_notes = None;
        self.rejected = None;
        self.rejection_reason = None;
        self.touch(stamp.at);
        Ok(())
    }

    /// Approves a pending voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotApprove` unless pending.
    pub fn approve(&mut self, stamp: Stamp, notes: Option<String>) -> Result<(), LedgerError> {
        if self.status != VoucherStatus::Pending {
            return Err(LedgerError::VoucherCannotApprove {
                status: self.status,
            });
        }
        self.status = VoucherStatus::Approved;
        self.approved = Some(stamp);
        self.approval_notes = blank_to_none(notes);
        self.touch(stamp.at);
        Ok(())
    }

    /// Sends a pending voucher back for correction.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotReject` unless pending, or
    /// `RejectionReasonRequired` when the rules demand a reason.
    pub fn reject(
        &mut self,
        stamp: Stamp,
        reason: Option<String>,
        rules: &VoucherRules,
    ) -> Result<(), LedgerError> {
        if self.status != VoucherStatus::Pending {
            return Err(LedgerError::VoucherCannotReject {
                status: self.status,
            });
        }
        let reason = blank_to_none(reason);
        if rules.require_rejection_reason && reason.is_none() {
            return Err(LedgerError::RejectionReasonRequired);
        }
        self.status = VoucherStatus::Rejected;
        self.rejected = Some(stamp);
        self.rejection_reason = reason;
        self.touch(stamp.at);
        Ok(())
    }

    /// Posts an approved voucher.
    ///
    /// `period` is the tenant's fiscal period covering the voucher date.
    /// The caller applies the ledger balance deltas in the same unit of work.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotPost` unless approved, `NoFiscalPeriod` or
    /// `PeriodClosed` from the period gate, then any entry error or
    /// `VoucherUnbalanced` from re-validation.
    pub fn post<L: AccountLookup + ?Sized>(
        &mut self,
        period: Option<&FiscalPeriod>,
        accounts: &L,
        stamp: Stamp,
    ) -> Result<(), LedgerError> {
        if self.status != VoucherStatus::Approved {
            return Err(LedgerError::VoucherCannotPost {
                status: self.status,
            });
        }
        check_posting(period, self.voucher_date)?;
        let totals = self.ensure_postable_content(accounts)?;

        self.total_debit = totals.total_debit;
        self.total_credit = totals.total_credit;
        self.status = VoucherStatus::Posted;
        self.posted = Some(stamp);
        self.touch(stamp.at);
        Ok(())
    }

    /// Cancels a draft or pending voucher. Its number is never reused.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotCancel` unless draft or pending.
    pub fn cancel(&mut self, stamp: Stamp, reason: Option<String>) -> Result<(), LedgerError> {
        if !matches!(self.status, VoucherStatus::Draft | VoucherStatus::Pending) {
            return Err(LedgerError::VoucherCannotCancel {
                status: self.status,
            });
        }
        self.status = VoucherStatus::Cancelled;
        self.cancelled = Some(stamp);
        self.cancellation_reason = blank_to_none(reason);
        self.touch(stamp.at);
        Ok(())
    }

    /// Checks that a reversal may be created against this voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotReverse` unless posted, or
    /// `VoucherAlreadyReversed` if a reversal already exists.
    pub fn ensure_reversible(&self) -> Result<(), LedgerError> {
        if self.status != VoucherStatus::Posted {
            return Err(LedgerError::VoucherCannotReverse {
                status: self.status,
            });
        }
        if let Some(reversed_by) = self.reversed_by_id {
            return Err(LedgerError::VoucherAlreadyReversed { reversed_by });
        }
        Ok(())
    }

    /// Links this voucher to its reversal.
    ///
    /// # Errors
    ///
    /// Same as [`ensure_reversible`](Self::ensure_reversible).
    pub fn mark_reversed_by(
        &mut self,
        reversal_id: VoucherId,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_reversible()?;
        self.reversed_by_id = Some(reversal_id);
        self.touch(now);
        Ok(())
    }

    /// Drops the link to a reversal that was cancelled.
    pub fn clear_reversal_link(&mut self, now: DateTime<Utc>) {
        if self.reversed_by_id.take().is_some() {
            self.touch(now);
        }
    }
}
