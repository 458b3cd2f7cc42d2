//! Ledger error types.
//!
//! Every failure in the engine is a typed `LedgerError` returned to the
//! caller. `ErrorKind` groups variants so an API layer can decide how to
//! report them and whether a retry from a fresh read is safe.

use chrono::NaiveDate;
use ledgerline_shared::{AppError, ErrorCategory};
use ledgerline_shared::types::{AccountId, Money, VoucherId};
use thiserror::Error;

use crate::fiscal::FiscalPeriodStatus;
use crate::voucher::VoucherStatus;

/// Broad classification of ledger errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: bad enum values, missing fields, malformed entries.
    Validation,
    /// The requested transition is not allowed from the current status.
    StateGuard,
    /// A bookkeeping invariant would be violated.
    Invariant,
    /// A fiscal period gate refused the operation.
    Gate,
    /// Lost a race with a concurrent writer.
    Concurrency,
    /// The referenced entity does not exist for this tenant.
    NotFound,
    /// The backing store failed.
    Storage,
}

/// Why an account cannot receive a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRejection {
    /// No such account.
    NotFound,
    /// The account belongs to another tenant.
    WrongTenant,
    /// The account has been deactivated.
    Inactive,
    /// The account is a control account backed by a sub-ledger.
    ControlAccount,
    /// Direct posting is disabled on the account.
    DirectPostingDisabled,
}

impl std::fmt::Display for AccountRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotFound => "account not found",
            Self::WrongTenant => "account belongs to another tenant",
            Self::Inactive => "account is inactive",
            Self::ControlAccount => "account is a control account",
            Self::DirectPostingDisabled => "account does not allow direct posting",
        };
        f.write_str(text)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    // ========== Entry Errors ==========
    /// Both debit and credit are positive on one line.
    #[error("Entry line {line_no} has both a debit and a credit amount")]
    EntryInvalidAmount {
        /// Offending line number.
        line_no: u32,
    },

    /// Neither side is positive, or one side is negative.
    #[error("Entry line {line_no} must have exactly one positive amount and no negative amount")]
    EntryZeroAmount {
        /// Offending line number.
        line_no: u32,
    },

    /// The referenced account cannot receive this posting.
    #[error("Entry line {line_no} cannot post to account {account_id}: {reason}")]
    EntryAccountInvalid {
        /// Offending line number.
        line_no: u32,
        /// The referenced account.
        account_id: AccountId,
        /// Why the account was refused.
        reason: AccountRejection,
    },

    /// A line number is used twice within one voucher.
    #[error("Entry line number {0} is already used in this voucher")]
    DuplicateLineNumber(u32),

    /// Line number zero is not allowed.
    #[error("Entry line numbers start at 1")]
    InvalidLineNumber,

    /// No entry with this line number.
    #[error("Entry line {0} not found")]
    EntryNotFound(u32),

    /// No line number is left after the highest one in use.
    #[error("No line number is left after {0}; number the entry explicitly")]
    LineNumbersExhausted(u32),

    /// A sum of amounts would leave the supported decimal range.
    #[error("Amount total is too large to record")]
    AmountOverflow,

    /// The voucher would exceed the configured number of lines.
    #[error("A voucher may hold at most {max} entries")]
    TooManyEntries {
        /// Configured maximum.
        max: usize,
    },

    // ========== Voucher Invariants ==========
    /// Debits and credits differ.
    #[error("Voucher is not balanced. Debit: {debit}, Credit: {credit}")]
    VoucherUnbalanced {
        /// Total debit.
        debit: Money,
        /// Total credit.
        credit: Money,
    },

    /// A voucher needs at least one entry before it leaves draft.
    #[error("Voucher has no entries")]
    VoucherNoEntries,

    // ========== Voucher Validation ==========
    /// Moving the voucher date would change the fiscal year embedded in its number.
    #[error("Voucher date cannot move from fiscal year {from} to {to}")]
    VoucherDateChangesFiscalYear {
        /// Year embedded in the voucher number.
        from: i32,
        /// Year of the requested date.
        to: i32,
    },

    /// Rejection needs a reason.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Unknown voucher type string.
    #[error("Invalid voucher type: {0}")]
    InvalidVoucherType(String),

    /// Malformed voucher number.
    #[error("Invalid voucher number: {0}")]
    InvalidVoucherNumber(String),

    // ========== Voucher State Guards ==========
    /// Entries and header may only change in draft or rejected.
    #[error("Voucher cannot be edited while {status}")]
    VoucherCannotEdit {
        /// Current status.
        status: VoucherStatus,
    },

    /// Submit is only allowed from draft or rejected.
    #[error("Voucher cannot be submitted while {status}")]
    VoucherCannotSubmit {
        /// Current status.
        status: VoucherStatus,
    },

    /// Approve is only allowed from pending.
    #[error("Voucher cannot be approved while {status}")]
    VoucherCannotApprove {
        /// Current status.
        status: VoucherStatus,
    },

    /// Reject is only allowed from pending.
    #[error("Voucher cannot be rejected while {status}")]
    VoucherCannotReject {
        /// Current status.
        status: VoucherStatus,
    },

    /// Post is only allowed from approved.
    #[error("Voucher cannot be posted while {status}")]
    VoucherCannotPost {
        /// Current status.
        status: VoucherStatus,
    },

    /// Cancel is only allowed from draft or pending.
    #[error("Voucher cannot be cancelled while {status}")]
    VoucherCannotCancel {
        /// Current status.
        status: VoucherStatus,
    },

    /// Only posted vouchers can be reversed.
    #[error("Voucher cannot be reversed while {status}")]
    VoucherCannotReverse {
        /// Current status.
        status: VoucherStatus,
    },

    /// The voucher already has a reversal.
    #[error("Voucher has already been reversed by {reversed_by}")]
    VoucherAlreadyReversed {
        /// The existing reversal voucher.
        reversed_by: VoucherId,
    },

    // ========== Account Errors ==========
    /// Account code is empty, too long, or uses unsupported characters.
    #[error("Invalid account code: '{0}'")]
    InvalidAccountCode(String),

    /// Account name is blank.
    #[error("Account name is required")]
    AccountNameRequired,

    /// Unknown account type string.
    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    /// Unknown account nature string.
    #[error("Invalid account nature: {0}")]
    InvalidAccountNature(String),

    /// Account code already exists for the tenant.
    #[error("Account code '{0}' already exists")]
    DuplicateAccountCode(String),

    /// Declared parent does not exist.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    /// Declared parent belongs to another tenant.
    #[error("Parent account {0} belongs to a different tenant")]
    ParentWrongTenant(AccountId),

    /// The parent link would create a cycle.
    #[error("Making {parent_id} the parent of {account_id} would create a cycle")]
    AccountCycle {
        /// The account being (re)parented.
        account_id: AccountId,
        /// The requested parent.
        parent_id: AccountId,
    },

    /// The account still has children.
    #[error("Account {0} has child accounts")]
    AccountHasChildren(AccountId),

    /// The account has postings and may only be deactivated.
    #[error("Account {0} has postings and can only be deactivated")]
    AccountHasPostings(AccountId),

    /// Unposted vouchers still reference the account.
    #[error("Account {0} is used by vouchers that are not yet posted")]
    AccountInUse(AccountId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No account with this code.
    #[error("Account code not found: {0}")]
    AccountCodeNotFound(String),

    // ========== Fiscal Period Errors ==========
    /// Month outside 1..=12.
    #[error("Invalid fiscal month: {0}")]
    InvalidFiscalMonth(u32),

    /// A period range whose start is after its end.
    #[error("Invalid period range: start is after end")]
    InvalidPeriodRange,

    /// Period already exists.
    #[error("Fiscal period {year}-{month:02} already exists")]
    FiscalPeriodExists {
        /// Fiscal year.
        year: i32,
        /// Fiscal month.
        month: u32,
    },

    /// Period not found.
    #[error("Fiscal period {year}-{month:02} not found")]
    FiscalPeriodNotFound {
        /// Fiscal year.
        year: i32,
        /// Fiscal month.
        month: u32,
    },

    /// No period covers the voucher date.
    #[error("No fiscal period found for date {0}")]
    NoFiscalPeriod(NaiveDate),

    /// Posting into a closed or locked period.
    #[error("Fiscal period {year}-{month:02} is closed, no posting allowed")]
    PeriodClosed {
        /// Fiscal year.
        year: i32,
        /// Fiscal month.
        month: u32,
    },

    /// Only open periods can be closed.
    #[error("Fiscal period {year}-{month:02} is not open")]
    PeriodNotOpen {
        /// Fiscal year.
        year: i32,
        /// Fiscal month.
        month: u32,
    },

    /// The period status does not allow the requested period transition.
    #[error("Fiscal period cannot move from {from} to {to}")]
    InvalidPeriodTransition {
        /// Current status.
        from: FiscalPeriodStatus,
        /// Requested status.
        to: FiscalPeriodStatus,
    },

    /// An earlier period is still open.
    #[error("Cannot close fiscal period: earlier period {year}-{month:02} is still open")]
    EarlierPeriodsOpen {
        /// Year of the earliest open period.
        year: i32,
        /// Month of the earliest open period.
        month: u32,
    },

    /// An earlier month has no fiscal period, so its balances would never
    /// be carried forward.
    #[error("Cannot close fiscal period: earlier month {year}-{month:02} has no fiscal period")]
    EarlierPeriodMissing {
        /// Year of the missing month.
        year: i32,
        /// The missing month.
        month: u32,
    },

    // ========== Lookup Errors ==========
    /// Voucher not found.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(VoucherId),

    /// No voucher with this number.
    #[error("Voucher number not found: {0}")]
    VoucherNumberNotFound(String),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// The sequence counter could not be incremented.
    #[error("Voucher number allocation failed: {0}")]
    SequenceAllocationFailed(String),

    // ========== Storage Errors ==========
    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EntryInvalidAmount { .. }
            | Self::EntryZeroAmount { .. }
            | Self::EntryAccountInvalid { .. }
            | Self::DuplicateLineNumber(_)
            | Self::InvalidLineNumber
            | Self::LineNumbersExhausted(_)
            | Self::AmountOverflow
            | Self::TooManyEntries { .. }
            | Self::VoucherDateChangesFiscalYear { .. }
            | Self::RejectionReasonRequired
            | Self::InvalidVoucherType(_)
            | Self::InvalidVoucherNumber(_)
            | Self::InvalidAccountCode(_)
            | Self::AccountNameRequired
            | Self::InvalidAccountType(_)
            | Self::InvalidAccountNature(_)
            | Self::DuplicateAccountCode(_)
            | Self::ParentNotFound(_)
            | Self::ParentWrongTenant(_)
            | Self::InvalidFiscalMonth(_)
            | Self::InvalidPeriodRange
            | Self::FiscalPeriodExists { .. } => ErrorKind::Validation,

            Self::VoucherCannotEdit { .. }
            | Self::VoucherCannotSubmit { .. }
            | Self::VoucherCannotApprove { .. }
            | Self::VoucherCannotReject { .. }
            | Self::VoucherCannotPost { .. }
            | Self::VoucherCannotCancel { .. }
            | Self::VoucherCannotReverse { .. }
            | Self::VoucherAlreadyReversed { .. }
            | Self::PeriodNotOpen { .. }
            | Self::InvalidPeriodTransition { .. } => ErrorKind::StateGuard,

            Self::VoucherUnbalanced { .. }
            | Self::VoucherNoEntries
            | Self::AccountCycle { .. }
            | Self::AccountHasChildren(_)
            | Self::AccountHasPostings(_)
            | Self::AccountInUse(_) => ErrorKind::Invariant,

            Self::NoFiscalPeriod(_)
            | Self::PeriodClosed { .. }
            | Self::EarlierPeriodsOpen { .. }
            | Self::EarlierPeriodMissing { .. } => ErrorKind::Gate,

            Self::ConcurrentModification | Self::SequenceAllocationFailed(_) => {
                ErrorKind::Concurrency
            }

            Self::EntryNotFound(_)
            | Self::AccountNotFound(_)
            | Self::AccountCodeNotFound(_)
            | Self::FiscalPeriodNotFound { .. }
            | Self::VoucherNotFound(_)
            | Self::VoucherNumberNotFound(_) => ErrorKind::NotFound,

            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EntryInvalidAmount { .. } => "ENTRY_INVALID_AMOUNT",
            Self::EntryZeroAmount { .. } => "ENTRY_ZERO_AMOUNT",
            Self::EntryAccountInvalid { .. } => "ENTRY_ACCOUNT_INVALID",
            Self::DuplicateLineNumber(_) => "DUPLICATE_LINE_NUMBER",
            Self::InvalidLineNumber => "INVALID_LINE_NUMBER",
            Self::LineNumbersExhausted(_) => "LINE_NUMBERS_EXHAUSTED",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::TooManyEntries { .. } => "TOO_MANY_ENTRIES",
            Self::VoucherUnbalanced { .. } => "VOUCHER_UNBALANCED",
            Self::VoucherNoEntries => "VOUCHER_NO_ENTRIES",
            Self::VoucherDateChangesFiscalYear { .. } => "VOUCHER_DATE_CHANGES_FISCAL_YEAR",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::InvalidVoucherType(_) => "INVALID_VOUCHER_TYPE",
            Self::InvalidVoucherNumber(_) => "INVALID_VOUCHER_NUMBER",
            Self::VoucherCannotEdit { .. } => "VOUCHER_CANNOT_EDIT",
            Self::VoucherCannotSubmit { .. } => "VOUCHER_CANNOT_SUBMIT",
            Self::VoucherCannotApprove { .. } => "VOUCHER_CANNOT_APPROVE",
            Self::VoucherCannotReject { .. } => "VOUCHER_CANNOT_REJECT",
            Self::VoucherCannotPost { .. } => "VOUCHER_CANNOT_POST",
            Self::VoucherCannotCancel { .. } => "VOUCHER_CANNOT_CANCEL",
            Self::VoucherCannotReverse { .. } => "VOUCHER_CANNOT_REVERSE",
            Self::VoucherAlreadyReversed { .. } => "VOUCHER_ALREADY_REVERSED",
            Self::InvalidAccountCode(_) => "INVALID_ACCOUNT_CODE",
            Self::AccountNameRequired => "ACCOUNT_NAME_REQUIRED",
            Self::InvalidAccountType(_) => "INVALID_ACCOUNT_TYPE",
            Self::InvalidAccountNature(_) => "INVALID_ACCOUNT_NATURE",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::ParentWrongTenant(_) => "PARENT_WRONG_TENANT",
            Self::AccountCycle { .. } => "ACCOUNT_CYCLE",
            Self::AccountHasChildren(_) => "ACCOUNT_HAS_CHILDREN",
            Self::AccountHasPostings(_) => "ACCOUNT_HAS_POSTINGS",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountCodeNotFound(_) => "ACCOUNT_CODE_NOT_FOUND",
            Self::InvalidFiscalMonth(_) => "INVALID_FISCAL_MONTH",
            Self::InvalidPeriodRange => "INVALID_PERIOD_RANGE",
            Self::FiscalPeriodExists { .. } => "FISCAL_PERIOD_EXISTS",
            Self::FiscalPeriodNotFound { .. } => "FISCAL_PERIOD_NOT_FOUND",
            Self::NoFiscalPeriod(_) => "NO_FISCAL_PERIOD",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::PeriodNotOpen { .. } => "PERIOD_NOT_OPEN",
            Self::InvalidPeriodTransition { .. } => "INVALID_PERIOD_TRANSITION",
            Self::EarlierPeriodsOpen { .. } => "EARLIER_PERIODS_OPEN",
            Self::EarlierPeriodMissing { .. } => "EARLIER_PERIOD_MISSING",
            Self::VoucherNotFound(_) => "VOUCHER_NOT_FOUND",
            Self::VoucherNumberNotFound(_) => "VOUCHER_NUMBER_NOT_FOUND",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::SequenceAllocationFailed(_) => "SEQUENCE_ALLOCATION_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// How an API layer should report this error.
    ///
    /// Duplicates are conflicts that a retry cannot fix, unlike lost races.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateAccountCode(_) | Self::FiscalPeriodExists { .. } => {
                ErrorCategory::Conflict
            }
            _ => match self.kind() {
                ErrorKind::Validation => ErrorCategory::Invalid,
                ErrorKind::StateGuard | ErrorKind::Invariant | ErrorKind::Gate => {
                    ErrorCategory::Refused
                }
                ErrorKind::NotFound => ErrorCategory::NotFound,
                ErrorKind::Concurrency => ErrorCategory::Contended,
                ErrorKind::Storage => ErrorCategory::Unavailable,
            },
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.category().status_code()
    }

    /// Returns true if retrying the whole operation from a fresh read is safe.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Concurrency
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        Self::new(err.category(), err.error_code(), err.to_string())
    }
}
