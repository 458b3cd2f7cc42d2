//! Posting gate over fiscal periods.
//!
//! The gate is independent of voucher status: it only answers whether the
//! month a date falls into accepts postings.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::period::{FiscalPeriod, FiscalPeriodStatus, YearMonth};
use crate::error::LedgerError;

/// Returns true if `period` covers `date` and is open.
#[must_use]
pub fn can_post(period: Option<&FiscalPeriod>, date: NaiveDate) -> bool {
    check_posting(period, date).is_ok()
}

/// Checks that a posting dated `date` is allowed.
///
/// `period` is the tenant's period covering the date, if one exists.
///
/// # Errors
///
/// Returns `NoFiscalPeriod` when no period covers the date and
/// `PeriodClosed` when the covering period is closed or locked.
pub fn check_posting(period: Option<&FiscalPeriod>, date: NaiveDate) -> Result<(), LedgerError> {
    match period {
        Some(p) if p.contains_date(date) => {
            if p.is_open() {
                Ok(())
            } else {
                Err(LedgerError::PeriodClosed {
                    year: p.fiscal_year,
                    month: p.fiscal_month,
                })
            }
        }
        _ => Err(LedgerError::NoFiscalPeriod(date)),
    }
}

/// Checks that `period` may be closed given the tenant's other periods.
///
/// # Errors
///
/// Returns `PeriodNotOpen` if the period is not open,
/// `EarlierPeriodsOpen` naming the earliest earlier period still open, and
/// `EarlierPeriodMissing` naming the first month without a period between
/// the tenant's first period and this one.
pub fn ensure_closable(period: &FiscalPeriod, all: &[FiscalPeriod]) -> Result<(), LedgerError> {
    if !period.is_open() {
        return Err(LedgerError::PeriodNotOpen {
            year: period.fiscal_year,
            month: period.fiscal_month,
        });
    }
    let target = period.year_month();
    let earliest_open = all
        .iter()
        .filter(|p| p.year_month() < target && p.status == FiscalPeriodStatus::Open)
        .map(FiscalPeriod::year_month)
        .min();
    if let Some(open) = earliest_open {
        return Err(LedgerError::EarlierPeriodsOpen {
            year: open.year,
            month: open.month,
        });
    }

    let earlier: BTreeSet<YearMonth> = all
        .iter()
        .map(FiscalPeriod::year_month)
        .filter(|m| *m < target)
        .collect();
    let Some(&first) = earlier.first() else {
        return Ok(());
    };
    let mut month = first;
    while month < target {
        if !earlier.contains(&month) {
            return Err(LedgerError::EarlierPeriodMissing {
                year: month.year,
                month: month.month,
            });
        }
        month = month.next();
    }
    Ok(())
}
