//! Fiscal period types.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use ledgerline_shared::types::{FiscalPeriodId, TenantId};
use serde::{Deserialize, Serialize};

use crate::clock::Stamp;
use crate::error::LedgerError;

/// A calendar month used as the fiscal period key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    /// Fiscal year.
    pub year: i32,
    /// Fiscal month, 1-12.
    pub month: u32,
}

impl YearMonth {
    /// Creates a year-month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFiscalMonth` if `month` is outside 1-12.
    pub fn new(year: i32, month: u32) -> Result<Self, LedgerError> {
        if (1..=12).contains(&month) {
            Ok(Self { year, month })
        } else {
            Err(LedgerError::InvalidFiscalMonth(month))
        }
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following month.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    #[must_use]
    pub const fn prev(self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// First day of the month, if representable.
    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Last day of the month, if representable.
    #[must_use]
    pub fn last_day(self) -> Option<NaiveDate> {
        self.next().first_day()?.pred_opt()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Status of a fiscal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalPeriodStatus {
    /// Period is open for postings.
    Open,
    /// Period is closed, no new postings allowed.
    Closed,
    /// Period is locked, no changes allowed.
    Locked,
}

impl FiscalPeriodStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Locked => "locked",
        }
    }
}

impl fmt::Display for FiscalPeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monthly fiscal period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Unique identifier.
    pub id: FiscalPeriodId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Fiscal month, 1-12.
    pub fiscal_month: u32,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// Current status.
    pub status: FiscalPeriodStatus,
    /// Who closed the period and when.
    pub closed: Option<Stamp>,
    /// Who locked the period and when.
    pub locked: Option<Stamp>,
}

impl FiscalPeriod {
    /// Creates an open period covering one calendar month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFiscalMonth` if the month is outside 1-12 or the
    /// dates cannot be represented.
    pub fn for_month(
        id: FiscalPeriodId,
        tenant_id: TenantId,
        year: i32,
        month: u32,
    ) -> Result<Self, LedgerError> {
        let ym = YearMonth::new(year, month)?;
        let (Some(start_date), Some(end_date)) = (ym.first_day(), ym.last_day()) else {
            return Err(LedgerError::InvalidFiscalMonth(month));
        };
        Ok(Self {
            id,
            tenant_id,
            fiscal_year: year,
            fiscal_month: month,
            start_date,
            end_date,
            status: FiscalPeriodStatus::Open,
            closed: None,
            locked: None,
        })
    }

    /// The period's year and month.
    #[must_use]
    pub const fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.fiscal_year,
            month: self.fiscal_month,
        }
    }

    /// Returns true if postings are accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == FiscalPeriodStatus::Open
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Moves the period from open to closed.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotOpen` unless the period is open.
    pub fn close(&mut self, stamp: Stamp) -> Result<(), LedgerError> {
        if !self.is_open() {
            return Err(LedgerError::PeriodNotOpen {
                year: self.fiscal_year,
                month: self.fiscal_month,
            });
        }
        self.status = FiscalPeriodStatus::Closed;
        self.closed = Some(stamp);
        Ok(())
    }

    /// Moves the period from closed to locked.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodTransition` unless the period is closed.
    pub fn lock(&mut self, stamp: Stamp) -> Result<(), LedgerError> {
        if self.status != FiscalPeriodStatus::Closed {
            return Err(LedgerError::InvalidPeriodTransition {
                from: self.status,
                to: FiscalPeriodStatus::Locked,
            });
        }
        self.status = FiscalPeriodStatus::Locked;
        self.locked = Some(stamp);
        Ok(())
    }
}

/// An inclusive range of fiscal months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    /// First month in the range.
    pub from: YearMonth,
    /// Last month in the range.
    pub to: YearMonth,
}

impl PeriodRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodRange` if `from` is after `to`.
    pub fn new(from: YearMonth, to: YearMonth) -> Result<Self, LedgerError> {
        if from > to {
            return Err(LedgerError::InvalidPeriodRange);
        }
        Ok(Self { from, to })
    }

    /// A range covering one month.
    #[must_use]
    pub const fn single(month: YearMonth) -> Self {
        Self {
            from: month,
            to: month,
        }
    }

    /// A range covering a whole calendar year.
    #[must_use]
    pub const fn year(year: i32) -> Self {
        Self {
            from: YearMonth { year, month: 1 },
            to: YearMonth { year, month: 12 },
        }
    }

    /// Returns true if the month lies within the range.
    #[must_use]
    pub fn contains(&self, month: YearMonth) -> bool {
        month >= self.from && month <= self.to
    }
}
