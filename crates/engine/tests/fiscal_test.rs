//! Integration tests for fiscal periods, rollover and reporting.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::NaiveDate;
use common::{Books, YEAR, date, month};
use ledgerline_core::LedgerError;
use ledgerline_core::fiscal::{FiscalPeriodStatus, PeriodRange, YearMonth};
use ledgerline_core::reports::DateRange;
use ledgerline_core::voucher::{VoucherFilter, VoucherStatus};
use ledgerline_shared::types::{Money, PageRequest};
use rstest::rstest;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_fiscal_year_creation_skips_existing_months() {
    let books = Books::new().await;
    let fiscal = &books.engine.fiscal;

    let periods = fiscal.list_periods(books.tenant).await.unwrap();
    assert_eq!(periods.len(), 12);
    assert_eq!(periods[1].start_date, date(2, 1));
    assert_eq!(periods[1].end_date, date(2, 28));

    let created = fiscal.create_fiscal_year(books.tenant, YEAR).await.unwrap();
    assert!(created.is_empty());

    let err = fiscal.create_period(books.tenant, YEAR, 3).await.unwrap_err();
    assert_eq!(err, LedgerError::FiscalPeriodExists { year: YEAR, month: 3 });
    assert_eq!(err.http_status_code(), 409);

    let next = fiscal.create_period(books.tenant, YEAR + 1, 1).await.unwrap();
    assert_eq!(next.status, FiscalPeriodStatus::Open);
}

#[rstest]
#[case(0)]
#[case(13)]
#[tokio::test]
async fn test_invalid_month_is_refused(#[case] m: u32) {
    let books = Books::new().await;
    let err = books
        .engine
        .fiscal
        .create_period(books.tenant, YEAR + 1, m)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::InvalidFiscalMonth(m));
}

#[tokio::test]
async fn test_periods_close_in_order() {
    let books = Books::new().await;
    let fiscal = &books.engine.fiscal;

    let err = fiscal
        .close_period(books.tenant, books.approver, YEAR, 3)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::EarlierPeriodsOpen { year: YEAR, month: 1 });

    let jan = fiscal
        .close_period(books.tenant, books.approver, YEAR, 1)
        .await
        .unwrap();
    assert_eq!(jan.status, FiscalPeriodStatus::Closed);
    assert_eq!(jan.closed.unwrap().by, books.approver);

    let err = fiscal
        .close_period(books.tenant, books.approver, YEAR, 1)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::PeriodNotOpen { year: YEAR, month: 1 });

    assert!(!fiscal.can_post(books.tenant, date(1, 31)).await.unwrap());
    assert!(fiscal.can_post(books.tenant, date(2, 1)).await.unwrap());
}

#[tokio::test]
async fn test_lock_requires_closed_period() {
    let books = Books::new().await;
    let fiscal = &books.engine.fiscal;

    let err = fiscal
        .lock_period(books.tenant, books.approver, YEAR, 1)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidPeriodTransition {
            from: FiscalPeriodStatus::Open,
            to: FiscalPeriodStatus::Locked,
        }
    );

    fiscal
        .close_period(books.tenant, books.approver, YEAR, 1)
        .await
        .unwrap();
    let locked = fiscal
        .lock_period(books.tenant, books.approver, YEAR, 1)
        .await
        .unwrap();
    assert_eq!(locked.status, FiscalPeriodStatus::Locked);

    // A locked period still counts as done for later closes.
    fiscal
        .close_period(books.tenant, books.approver, YEAR, 2)
        .await
        .unwrap();

    let err = fiscal
        .get_period(books.tenant, YEAR + 5, 1)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::FiscalPeriodNotFound {
            year: YEAR + 5,
            month: 1
        }
    );
}

#[tokio::test]
async fn test_close_rolls_closing_balances_forward() {
    let books = Books::new().await;
    books
        .posted(date(1, 5), books.bank, books.equity, dec!(10000))
        .await;
    books
        .posted(date(1, 20), books.expense, books.bank, dec!(1200))
        .await;

    books
        .engine
        .fiscal
        .close_period(books.tenant, books.approver, YEAR, 1)
        .await
        .unwrap();

    let feb = books.balance(books.bank, 2).await.unwrap();
    assert_eq!(feb.opening_debit, Money::new(dec!(10000)));
    assert_eq!(feb.opening_credit, Money::new(dec!(1200)));
    assert!(feb.period_debit.is_zero());

    // A February posting adds to the carried row.
    books
        .posted(date(2, 2), books.bank, books.revenue, dec!(300))
        .await;
    let feb = books.balance(books.bank, 2).await.unwrap();
    assert_eq!(feb.closing_debit(), Money::new(dec!(10300)));
    assert_eq!(feb.net_balance(), Money::new(dec!(9100)));

    // Closing February carries both months into March.
    books
        .engine
        .fiscal
        .close_period(books.tenant, books.approver, YEAR, 2)
        .await
        .unwrap();
    let mar = books.balance(books.bank, 3).await.unwrap();
    assert_eq!(mar.opening_debit - mar.opening_credit, Money::new(dec!(9100)));
}

#[tokio::test]
async fn test_close_waits_for_missing_months_and_carries_cumulative_balance() {
    let books = Books::new().await;
    let fiscal = &books.engine.fiscal;
    let next_year = |m: u32, d: u32| NaiveDate::from_ymd_opt(YEAR + 1, m, d).unwrap();

    books
        .posted(date(6, 1), books.bank, books.equity, dec!(10000))
        .await;
    for m in 1..=12 {
        fiscal
            .close_period(books.tenant, books.approver, YEAR, m)
            .await
            .unwrap();
    }
    fiscal.create_period(books.tenant, YEAR + 1, 1).await.unwrap();
    fiscal.create_period(books.tenant, YEAR + 1, 3).await.unwrap();
    books
        .posted(next_year(1, 10), books.expense, books.bank, dec!(1200))
        .await;
    books
        .posted(next_year(3, 10), books.bank, books.revenue, dec!(300))
        .await;

    fiscal
        .close_period(books.tenant, books.approver, YEAR + 1, 1)
        .await
        .unwrap();
    let err = fiscal
        .close_period(books.tenant, books.approver, YEAR + 1, 3)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::EarlierPeriodMissing { year: YEAR + 1, month: 2 });
    assert_eq!(err.http_status_code(), 422);

    fiscal.create_period(books.tenant, YEAR + 1, 2).await.unwrap();
    for m in 2..=3 {
        fiscal
            .close_period(books.tenant, books.approver, YEAR + 1, m)
            .await
            .unwrap();
    }

    let april = YearMonth::new(YEAR + 1, 4).unwrap();
    let rows = books
        .engine
        .reports
        .get_account_balances(books.tenant, books.bank, PeriodRange::single(april))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].opening_debit, Money::new(dec!(10300)));
    assert_eq!(rows[0].opening_credit, Money::new(dec!(1200)));
}

#[tokio::test]
async fn test_closed_periods_reconcile_with_posted_entries() {
    let books = Books::new().await;
    let postings = [
        (date(1, 3), books.bank, books.equity, dec!(50000)),
        (date(1, 9), books.cash, books.revenue, dec!(1234.56)),
        (date(1, 28), books.expense, books.bank, dec!(2000)),
        (date(2, 14), books.cash, books.revenue, dec!(99.99)),
        (date(2, 15), books.expense, books.cash, dec!(45.10)),
    ];
    for (on, debit, credit, amount) in postings {
        books.posted(on, debit, credit, amount).await;
    }
    for m in 1..=2 {
        books
            .engine
            .fiscal
            .close_period(books.tenant, books.approver, YEAR, m)
            .await
            .unwrap();
    }

    let range = PeriodRange::new(month(1), month(2)).unwrap();
    let tb = books
        .engine
        .reports
        .get_trial_balance(books.tenant, range)
        .await
        .unwrap();
    assert!(tb.totals.is_balanced);

    let ledger_net: Money = tb
        .items
        .iter()
        .map(|i| i.closing_debit - i.closing_credit)
        .sum();
    let posted = books
        .engine
        .vouchers
        .list_vouchers(books.tenant, &VoucherFilter::posted(), PageRequest::new(1, 100))
        .await
        .unwrap();
    let entries_net: Money = posted
        .data
        .iter()
        .flat_map(|v| v.entries.iter())
        .map(|e| e.debit_amount - e.credit_amount)
        .sum();
    assert_eq!(ledger_net, entries_net);
    assert!(ledger_net.is_zero());

    for voucher in &posted.data {
        assert_eq!(voucher.status, VoucherStatus::Posted);
        assert_eq!(voucher.total_debit, voucher.total_credit);
    }

    // Rolled-over openings match the movements before March.
    let march = PeriodRange::single(month(3));
    let tb_march = books
        .engine
        .reports
        .get_trial_balance(books.tenant, march)
        .await
        .unwrap();
    for item in &tb_march.items {
        let carried = books.balance(item.account_id, 3).await.unwrap();
        assert_eq!(carried.opening_debit, item.opening_debit);
        assert_eq!(carried.opening_credit, item.opening_credit);
    }
}

#[tokio::test]
async fn test_account_ledger_report() {
    let books = Books::new().await;
    books
        .posted(date(1, 5), books.cash, books.revenue, dec!(1000))
        .await;
    books
        .posted(date(2, 10), books.expense, books.cash, dec!(300))
        .await;
    books
        .draft(date(2, 11), books.cash, books.revenue, dec!(999))
        .await;

    let range = DateRange::new(date(2, 1), date(2, 28)).unwrap();
    let ledger = books
        .engine
        .reports
        .get_account_ledger(books.tenant, books.cash, range)
        .await
        .unwrap();
    assert_eq!(ledger.account_code, "101");
    assert_eq!(ledger.opening_balance, Money::new(dec!(1000)));
    assert_eq!(ledger.lines.len(), 1);
    assert_eq!(ledger.lines[0].credit, Money::new(dec!(300)));
    assert_eq!(ledger.closing_balance, Money::new(dec!(700)));

    let rows = books
        .engine
        .reports
        .get_account_balances(
            books.tenant,
            books.cash,
            PeriodRange::new(month(1), month(12)).unwrap(),
        )
        .await
        .unwrap();
    let months: Vec<u32> = rows.iter().map(|r| r.period.month).collect();
    assert_eq!(months, vec![1, 2]);
}
