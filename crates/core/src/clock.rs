//! Time source and actor stamps for workflow transitions.
//!
//! The engine never reads wall-clock time directly; callers inject a `Clock`.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerline_shared::types::UserId;
use serde::{Deserialize, Serialize};

/// A source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Returns today's date in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Used by tests and deterministic replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Creates a clock pinned to `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Who performed an action and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    /// Acting user.
    pub by: UserId,
    /// Time of the action.
    pub at: DateTime<Utc>,
}

impl Stamp {
    /// Creates a stamp.
    #[must_use]
    pub const fn new(by: UserId, at: DateTime<Utc>) -> Self {
        Self { by, at }
    }

    /// Stamps `by` at the clock's current instant.
    #[must_use]
    pub fn now(by: UserId, clock: &dyn Clock) -> Self {
        Self::new(by, clock.now())
    }
}
