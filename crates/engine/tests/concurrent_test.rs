//! Concurrency tests for number allocation, transitions and posting.
//!
//! Many tasks hit the same tenant at once; the store's per-tenant unit of
//! work must keep numbers unique, transitions single-winner and balance
//! increments free of lost updates.

#![allow(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{Books, date};
use futures::future::join_all;
use ledgerline_core::LedgerError;
use ledgerline_core::voucher::{VoucherStatus, parse_voucher_no};
use ledgerline_engine::{EngineSettings, LedgerEngine};
use ledgerline_shared::types::{Money, TenantId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

// ============================================================================
// Two callers ask for a number at the same time
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_concurrent_creations_get_distinct_numbers() {
    let books = Arc::new(Books::new().await);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let books = Arc::clone(&books);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                books
                    .engine
                    .vouchers
                    .create_voucher(
                        books.tenant,
                        books.clerk,
                        books.input(date(1, 5), books.cash, books.revenue, dec!(1)),
                    )
                    .await
            })
        })
        .collect();

    let mut numbers: Vec<String> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().voucher_no)
        .collect();
    numbers.sort();
    assert_eq!(numbers, vec!["GJ-2026-000001", "GJ-2026-000002"]);
}

// ============================================================================
// Allocator uniqueness under load
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_allocations_are_contiguous() {
    const CALLERS: usize = 50;
    let books = Arc::new(Books::new().await);
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let books = Arc::clone(&books);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                let amount = Decimal::from(i as u64 + 1);
                books
                    .engine
                    .vouchers
                    .create_voucher(
                        books.tenant,
                        books.clerk,
                        books.input(date(2, 1), books.bank, books.equity, amount),
                    )
                    .await
            })
        })
        .collect();

    let mut sequences: Vec<u64> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| {
            let voucher = joined.unwrap().unwrap();
            parse_voucher_no(&voucher.voucher_no).unwrap().sequence
        })
        .collect();
    sequences.sort_unstable();

    let unique: HashSet<u64> = sequences.iter().copied().collect();
    assert_eq!(unique.len(), CALLERS, "duplicate voucher numbers issued");
    let expected: Vec<u64> = (1..=CALLERS as u64).collect();
    assert_eq!(sequences, expected, "sequence has gaps");
}

// ============================================================================
// Only one of two concurrent approvals wins
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_approvals_single_winner() {
    let books = Arc::new(Books::new().await);
    let voucher = books
        .draft(date(3, 3), books.cash, books.revenue, dec!(10))
        .await;
    books
        .engine
        .vouchers
        .submit(books.tenant, books.clerk, voucher.id)
        .await
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let books = Arc::clone(&books);
            let barrier = Arc::clone(&barrier);
            let id = voucher.id;
            tokio::spawn(async move {
                barrier.wait().await;
                books
                    .engine
                    .vouchers
                    .approve(books.tenant, books.approver, id, None)
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    let loser = results.into_iter().find_map(Result::err).unwrap();
    assert_eq!(
        loser,
        LedgerError::VoucherCannotApprove {
            status: VoucherStatus::Approved
        }
    );
}

// ============================================================================
// Concurrent postings to the same account never lose an increment
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_postings_accumulate() {
    const VOUCHERS: usize = 20;
    let books = Arc::new(Books::new().await);

    let mut ids = Vec::with_capacity(VOUCHERS);
    for _ in 0..VOUCHERS {
        let voucher = books
            .approved(date(4, 10), books.cash, books.revenue, dec!(12.34))
            .await;
        ids.push(voucher.id);
    }

    let barrier = Arc::new(Barrier::new(VOUCHERS));
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let books = Arc::clone(&books);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                books
                    .engine
                    .vouchers
                    .post(books.tenant, books.approver, id)
                    .await
            })
        })
        .collect();

    for joined in join_all(handles).await {
        assert_eq!(joined.unwrap().unwrap().status, VoucherStatus::Posted);
    }

    let cash = books.balance(books.cash, 4).await.unwrap();
    assert_eq!(cash.period_debit, Money::new(dec!(246.80)));
    let revenue = books.balance(books.revenue, 4).await.unwrap();
    assert_eq!(revenue.period_credit, Money::new(dec!(246.80)));
}

// ============================================================================
// Tenants keep independent sequences
// ============================================================================
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tenants_have_independent_sequences() {
    let engine = LedgerEngine::in_memory(EngineSettings::default());
    let (first, second) = tokio::join!(
        Books::seed(engine.clone(), TenantId::new()),
        Books::seed(engine.clone(), TenantId::new()),
    );

    let (a, b) = tokio::join!(
        first.draft(date(5, 1), first.cash, first.revenue, dec!(1)),
        second.draft(date(5, 1), second.cash, second.revenue, dec!(1)),
    );
    assert_eq!(a.voucher_no, "GJ-2026-000001");
    assert_eq!(b.voucher_no, "GJ-2026-000001");

    let err = engine
        .vouchers
        .get_voucher(second.tenant, a.id)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::VoucherNotFound(a.id));
}
