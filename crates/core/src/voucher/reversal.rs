//! Reversal voucher construction.

use chrono::NaiveDate;
use ledgerline_shared::types::VoucherId;

use super::aggregate::Voucher;
use super::types::VoucherEntry;
use crate::clock::Stamp;
use crate::error::LedgerError;

/// Builds the draft reversal of a posted voucher.
///
/// Every entry keeps its line, account, memo and dimensions with the debit
/// and credit sides swapped. The caller links the original with
/// [`Voucher::mark_reversed_by`] in the same unit of work.
///
/// # Errors
///
/// Returns `VoucherCannotReverse` unless the original is posted, or
/// `VoucherAlreadyReversed` if it already has a reversal.
pub fn build_reversal(
    original: &Voucher,
    id: VoucherId,
    voucher_no: String,
    voucher_date: NaiveDate,
    created: Stamp,
) -> Result<Voucher, LedgerError> {
    original.ensure_reversible()?;

    let mut reversal = Voucher::blank(
        id,
        original.tenant_id,
        voucher_no,
        original.voucher_type,
        voucher_date,
        created,
    );
    reversal.description = Some(format!("Reversal of {}", original.voucher_no));
    reversal.source_reference = Some(original.voucher_no.clone());
    reversal.is_reversal = true;
    reversal.reversal_of_id = Some(original.id);
    reversal.set_entries(
        original
            .entries
            .iter()
            .map(|entry| VoucherEntry {
                debit_amount: entry.credit_amount,
                credit_amount: entry.debit_amount,
                ..entry.clone()
            })
            .collect(),
    )?;
    Ok(reversal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voucher::{CreateVoucherInput, EntryInput, VoucherRules, VoucherStatus, VoucherType};
    use chrono::{TimeZone, Utc};
    use ledgerline_shared::types::{AccountId, Money, TenantId, UserId};
    use rust_decimal_macros::dec;

    fn stamp() -> Stamp {
        Stamp::new(UserId::new(), Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap())
    }

    fn posted_voucher() -> Voucher {
        let (cash, sales) = (AccountId::new(), AccountId::new());
        let input = CreateVoucherInput::new(
            VoucherType::Sales,
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        )
        .with_entry(EntryInput::debit(cash, Money::new(dec!(250.75))).with_description("cash"))
        .with_entry(EntryInput::credit(sales, Money::new(dec!(250.75))));
        let mut voucher = Voucher::draft(
            VoucherId::new(),
            TenantId::new(),
            "SJ-2026-000007".into(),
            input,
            &VoucherRules::default(),
            stamp(),
        )
        .unwrap();
        voucher.status = VoucherStatus::Posted;
        voucher
    }

    #[test]
    fn test_reversal_swaps_sides() {
        let original = posted_voucher();
        let reversal = build_reversal(
            &original,
            VoucherId::new(),
            "SJ-2026-000008".into(),
            original.voucher_date,
            stamp(),
        )
        .unwrap();

        assert_eq!(reversal.status, VoucherStatus::Draft);
        assert!(reversal.is_reversal);
        assert_eq!(reversal.reversal_of_id, Some(original.id));
        assert_eq!(reversal.voucher_type, VoucherType::Sales);
        assert_eq!(reversal.description.as_deref(), Some("Reversal of SJ-2026-000007"));
        for (orig, rev) in original.entries.iter().zip(&reversal.entries) {
            assert_eq!(orig.line_no, rev.line_no);
            assert_eq!(orig.account_id, rev.account_id);
            assert_eq!(orig.debit_amount, rev.credit_amount);
            assert_eq!(orig.credit_amount, rev.debit_amount);
            assert_eq!(orig.description, rev.description);
        }
        assert_eq!(reversal.total_debit, original.total_credit);
        assert!(reversal.is_balanced());
    }

    #[test]
    fn test_reversal_into_later_month() {
        let original = posted_voucher();
        let april = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let reversal =
            build_reversal(&original, VoucherId::new(), "SJ-2026-000008".into(), april, stamp())
                .unwrap();
        assert_eq!(reversal.fiscal_month, 4);
    }

    #[test]
    fn test_reversal_requires_posted() {
        let mut original = posted_voucher();
        original.status = VoucherStatus::Approved;
        assert_eq!(
            build_reversal(
                &original,
                VoucherId::new(),
                "SJ-2026-000008".into(),
                original.voucher_date,
                stamp()
            ),
            Err(LedgerError::VoucherCannotReverse {
                status: VoucherStatus::Approved
            })
        );
    }
}
