//! Error shape handed to whatever API layer hosts the engine.
//!
//! Domain crates keep their own precise error enums and convert into
//! `AppError` at that boundary. The conversion keeps the domain's stable
//! error code and says whether a retry from a fresh read is safe.

use thiserror::Error;

/// How an API layer should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input.
    Invalid,
    /// A business rule, status guard or period gate refused the request.
    Refused,
    /// The referenced resource does not exist.
    NotFound,
    /// The request clashes with existing data. Retrying will not help.
    Conflict,
    /// Lost a race with a concurrent writer. Retry from a fresh read.
    Contended,
    /// The backing store failed.
    Unavailable,
}

impl ErrorCategory {
    /// HTTP status code for the category.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Invalid => 400,
            Self::Refused => 422,
            Self::NotFound => 404,
            Self::Conflict | Self::Contended => 409,
            Self::Unavailable => 500,
        }
    }

    /// Only lost races are worth retrying.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Contended)
    }
}

/// A failure as an API layer reports it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Broad treatment of the failure.
    pub category: ErrorCategory,
    /// Stable SCREAMING_SNAKE code from the domain error.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl AppError {
    /// Creates an error.
    #[must_use]
    pub fn new(category: ErrorCategory, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.category.status_code()
    }

    /// Returns true if the caller may retry the whole operation.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}
