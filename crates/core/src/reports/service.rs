//! Report generation over ledger balances and posted vouchers.

use std::collections::BTreeMap;

use ledgerline_shared::types::{AccountId, Money};

use super::types::{
    AccountLedger, AccountLedgerLine, DateRange, TrialBalance, TrialBalanceItem,
    TrialBalanceTotals,
};
use crate::account::{Account, AccountLookup, AccountNature};
use crate::error::LedgerError;
use crate::fiscal::PeriodRange;
use crate::ledger::LedgerBalance;
use crate::ledger::balance::accumulate;
use crate::voucher::{Voucher, VoucherStatus};

/// Builds financial reports from balance rows and vouchers.
pub struct ReportBuilder;

#[derive(Default)]
struct Columns {
    opening_debit: Money,
    opening_credit: Money,
    period_debit: Money,
    period_credit: Money,
}

fn natural(nature: AccountNature, debit: Money, credit: Money) -> Money {
    match nature {
        AccountNature::Debit => debit - credit,
        AccountNature::Credit => credit - debit,
    }
}

impl ReportBuilder {
    /// Builds a trial balance from balance rows.
    ///
    /// Opening columns sum every movement before `range.from`; period columns
    /// sum the movements within the range. Rows after the range are ignored.
    /// Accounts with no movement up to the end of the range are left out.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if a column or total leaves the decimal range.
    pub fn trial_balance<L: AccountLookup + ?Sized>(
        range: PeriodRange,
        accounts: &L,
        rows: &[LedgerBalance],
    ) -> Result<TrialBalance, LedgerError> {
        let mut columns: BTreeMap<AccountId, Columns> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.period <= range.to) {
            let c = columns.entry(row.account_id).or_default();
            if row.period < range.from {
                accumulate(&mut c.opening_debit, row.period_debit)?;
                accumulate(&mut c.opening_credit, row.period_credit)?;
            } else {
                accumulate(&mut c.period_debit, row.period_debit)?;
                accumulate(&mut c.period_credit, row.period_credit)?;
            }
        }

        let mut items: Vec<TrialBalanceItem> = Vec::with_capacity(columns.len());
        for (id, c) in columns {
            let idle = c.opening_debit.is_zero()
                && c.opening_credit.is_zero()
                && c.period_debit.is_zero()
                && c.period_credit.is_zero();
            if let Some(account) = accounts.account(id)
                && !idle
            {
                items.push(Self::item(account, &c)?);
            }
        }
        items.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        let mut totals = TrialBalanceTotals::default();
        for item in &items {
            accumulate(&mut totals.opening_debit, item.opening_debit)?;
            accumulate(&mut totals.opening_credit, item.opening_credit)?;
            accumulate(&mut totals.period_debit, item.period_debit)?;
            accumulate(&mut totals.period_credit, item.period_credit)?;
            accumulate(&mut totals.closing_debit, item.closing_debit)?;
            accumulate(&mut totals.closing_credit, item.closing_credit)?;
        }
        totals.is_balanced = totals.opening_debit == totals.opening_credit
            && totals.period_debit == totals.period_credit
            && totals.closing_debit == totals.closing_credit;

        Ok(TrialBalance {
            range,
            items,
            totals,
        })
    }

    fn item(account: &Account, c: &Columns) -> Result<TrialBalanceItem, LedgerError> {
        let mut closing_debit = c.opening_debit;
        accumulate(&mut closing_debit, c.period_debit)?;
        let mut closing_credit = c.opening_credit;
        accumulate(&mut closing_credit, c.period_credit)?;
        Ok(TrialBalanceItem {
            account_id: account.id,
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            account_type: account.account_type,
            account_nature: account.account_nature,
            opening_debit: c.opening_debit,
            opening_credit: c.opening_credit,
            period_debit: c.period_debit,
            period_credit: c.period_credit,
            closing_debit,
            closing_credit,
            balance: natural(account.account_nature, closing_debit, closing_credit),
        })
    }

    /// Builds the ledger of one account from posted vouchers.
    ///
    /// Vouchers that are not posted are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if a running balance or total leaves the
    /// decimal range.
    pub fn account_ledger(
        account: &Account,
        range: DateRange,
        vouchers: &[Voucher],
    ) -> Result<AccountLedger, LedgerError> {
        let nature = account.account_nature;
        let mut opening = Money::ZERO;
        let mut lines: Vec<AccountLedgerLine> = Vec::new();

        for voucher in vouchers
            .iter()
            .filter(|v| v.status == VoucherStatus::Posted && v.voucher_date <= range.to)
        {
            for entry in voucher.entries.iter().filter(|e| e.account_id == account.id) {
                if voucher.voucher_date < range.from {
                    accumulate(
                        &mut opening,
                        natural(nature, entry.debit_amount, entry.credit_amount),
                    )?;
                    continue;
                }
                lines.push(AccountLedgerLine {
                    voucher_id: voucher.id,
                    voucher_no: voucher.voucher_no.clone(),
                    voucher_type: voucher.voucher_type,
                    voucher_date: voucher.voucher_date,
                    line_no: entry.line_no,
                    description: entry
                        .description
                        .clone()
                        .or_else(|| voucher.description.clone()),
                    debit: entry.debit_amount,
                    credit: entry.credit_amount,
                    running_balance: Money::ZERO,
                });
            }
        }

        lines.sort_by(|a, b| {
            (a.voucher_date, &a.voucher_no, a.line_no).cmp(&(b.voucher_date, &b.voucher_no, b.line_no))
        });

        let mut running = opening;
        let mut total_debit = Money::ZERO;
        let mut total_credit = Money::ZERO;
        for line in &mut lines {
            accumulate(&mut running, natural(nature, line.debit, line.credit))?;
            accumulate(&mut total_debit, line.debit)?;
            accumulate(&mut total_credit, line.credit)?;
            line.running_balance = running;
        }

        Ok(AccountLedger {
            account_id: account.id,
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            account_nature: nature,
            range,
            opening_balance: opening,
            lines,
            total_debit,
            total_credit,
            closing_balance: running,
        })
    }
}
