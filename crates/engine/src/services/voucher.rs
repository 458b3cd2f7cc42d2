//! Voucher lifecycle: drafting, approval workflow, posting and reversal.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use ledgerline_core::account::Account;
use ledgerline_core::ledger::posting_deltas;
use ledgerline_core::voucher::{
    CreateVoucherInput, EntryInput, SequenceKey, UpdateVoucherInput, Voucher, VoucherFilter,
    VoucherRules, VoucherType, build_reversal, format_voucher_no,
};
use ledgerline_core::{Clock, LedgerError, Stamp};
use ledgerline_shared::types::{
    AccountId, PageRequest, PageResponse, TenantId, UserId, VoucherId,
};
use tracing::{debug, info, instrument, warn};

use crate::store::{LedgerStore, StoreTransaction};

/// Service for vouchers and their approval workflow.
#[derive(Clone)]
pub struct VoucherService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    rules: VoucherRules,
}

async fn load_voucher(
    tx: &mut dyn StoreTransaction,
    voucher_id: VoucherId,
) -> Result<Voucher, LedgerError> {
    tx.get_voucher(voucher_id)
        .await?
        .ok_or(LedgerError::VoucherNotFound(voucher_id))
}

/// Accounts referenced by the voucher's entries. Missing ones are left out
/// so that validation reports them as not found.
async fn load_entry_accounts(
    tx: &mut dyn StoreTransaction,
    voucher: &Voucher,
) -> Result<BTreeMap<AccountId, Account>, LedgerError> {
    let mut accounts = BTreeMap::new();
    for entry in &voucher.entries {
        if accounts.contains_key(&entry.account_id) {
            continue;
        }
        if let Some(account) = tx.get_account(entry.account_id).await? {
            accounts.insert(account.id, account);
        }
    }
    Ok(accounts)
}

/// Allocates the next number for a voucher type and fiscal year.
async fn allocate_number(
    tx: &mut dyn StoreTransaction,
    voucher_type: VoucherType,
    voucher_date: NaiveDate,
) -> Result<String, LedgerError> {
    let key = SequenceKey {
        tenant_id: tx.tenant_id(),
        fiscal_year: voucher_date.year(),
        voucher_type,
    };
    let sequence = tx
        .next_sequence(&key)
        .await
        .map_err(|e| LedgerError::SequenceAllocationFailed(e.to_string()))?;
    let voucher_no = format_voucher_no(voucher_type, key.fiscal_year, sequence);
    debug!(%voucher_no, sequence, "voucher number allocated");
    Ok(voucher_no)
}

/// Writes a voucher back, refusing if someone else changed it first.
async fn save(
    tx: &mut dyn StoreTransaction,
    voucher: &Voucher,
    expected_version: u64,
) -> Result<(), LedgerError> {
    tx.update_voucher(voucher, expected_version)
        .await
        .inspect_err(|e| warn!(voucher_no = %voucher.voucher_no, error = %e, "voucher update conflict"))?;
    Ok(())
}

fn refused(op: &'static str, voucher: &Voucher, err: &LedgerError) {
    warn!(
        voucher_no = %voucher.voucher_no,
        status = %voucher.status,
        code = err.error_code(),
        "{op} refused: {err}"
    );
}

impl VoucherService {
    /// Creates a new voucher service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, rules: VoucherRules) -> Self {
        Self {
            store,
            clock,
            rules,
        }
    }

    fn stamp(&self, actor: UserId) -> Stamp {
        Stamp::now(actor, self.clock.as_ref())
    }

    /// Loads a voucher, applies `change` and saves it in one transaction.
    async fn edit<T, F>(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
        op: &'static str,
        change: F,
    ) -> Result<(Voucher, T), LedgerError>
    where
        F: FnOnce(&mut Voucher) -> Result<T, LedgerError> + Send,
        T: Send,
    {
        let mut tx = self.store.begin(tenant_id).await?;
        let mut voucher = load_voucher(tx.as_mut(), voucher_id).await?;
        let expected = voucher.version;
        let out = change(&mut voucher).inspect_err(|e| refused(op, &voucher, e))?;
        save(tx.as_mut(), &voucher, expected).await?;
        tx.commit().await?;
        Ok((voucher, out))
    }

    /// Creates a draft voucher and allocates its number.
    ///
    /// The number comes from the counter for the voucher's type and the
    /// year of its date. A creation that fails does not consume a number.
    ///
    /// # Errors
    ///
    /// Returns an entry error, `TooManyEntries`, or
    /// `SequenceAllocationFailed` if no number could be allocated.
    #[instrument(skip(self, input), fields(voucher_type = %input.voucher_type))]
    pub async fn create_voucher(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        input: CreateVoucherInput,
    ) -> Result<Voucher, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let voucher_no =
            allocate_number(tx.as_mut(), input.voucher_type, input.voucher_date).await?;
        let voucher = Voucher::draft(
            VoucherId::new(),
            tenant_id,
            voucher_no,
            input,
            &self.rules,
            self.stamp(actor),
        )
        .inspect_err(|e| warn!(error = %e, "voucher creation refused"))?;

        tx.insert_voucher(&voucher).await?;
        tx.commit().await?;

        info!(
            %tenant_id,
            voucher_no = %voucher.voucher_no,
            status = %voucher.status,
            entries = voucher.entries.len(),
            "voucher created"
        );
        Ok(voucher)
    }

    /// Appends an entry to an editable voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit`, an entry error, `DuplicateLineNumber`
    /// or `TooManyEntries`.
    #[instrument(skip(self, input))]
    pub async fn add_entry(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
        input: EntryInput,
    ) -> Result<Voucher, LedgerError> {
        let now = self.clock.now();
        let rules = self.rules;
        let (voucher, line_no) = self
            .edit(tenant_id, voucher_id, "add entry", |v| {
                v.add_entry(input, &rules, now)
            })
            .await?;
        debug!(voucher_no = %voucher.voucher_no, line_no, "entry added");
        Ok(voucher)
    }

    /// Removes an entry from an editable voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit` or `EntryNotFound`.
    #[instrument(skip(self))]
    pub async fn remove_entry(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
        line_no: u32,
    ) -> Result<Voucher, LedgerError> {
        let now = self.clock.now();
        let (voucher, _) = self
            .edit(tenant_id, voucher_id, "remove entry", |v| {
                v.remove_entry(line_no, now)
            })
            .await?;
        debug!(voucher_no = %voucher.voucher_no, line_no, "entry removed");
        Ok(voucher)
    }

    /// Replaces every entry of an editable voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit` or the first entry error; the stored
    /// entries are untouched on failure.
    #[instrument(skip(self, inputs))]
    pub async fn replace_entries(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
        inputs: Vec<EntryInput>,
    ) -> Result<Voucher, LedgerError> {
        let now = self.clock.now();
        let rules = self.rules;
        let (voucher, ()) = self
            .edit(tenant_id, voucher_id, "replace entries", |v| {
                v.replace_entries(inputs, &rules, now)
            })
            .await?;
        Ok(voucher)
    }

    /// Changes the date, memo or source reference of an editable voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotEdit` or `VoucherDateChangesFiscalYear`.
    #[instrument(skip(self, input))]
    pub async fn update_voucher(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
        input: UpdateVoucherInput,
    ) -> Result<Voucher, LedgerError> {
        let now = self.clock.now();
        let (voucher, ()) = self
            .edit(tenant_id, voucher_id, "update", |v| v.update_header(input, now))
            .await?;
        Ok(voucher)
    }

    /// Submits a draft or rejected voucher for approval.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotSubmit`, `VoucherNoEntries`,
    /// `EntryAccountInvalid` or `VoucherUnbalanced`.
    #[instrument(skip(self))]
    pub async fn submit(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        voucher_id: VoucherId,
    ) -> Result<Voucher, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let mut voucher = load_voucher(tx.as_mut(), voucher_id).await?;
        let expected = voucher.version;
        let accounts = load_entry_accounts(tx.as_mut(), &voucher).await?;
        voucher
            .submit(&accounts, self.stamp(actor))
            .inspect_err(|e| refused("submit", &voucher, e))?;

        save(tx.as_mut(), &voucher, expected).await?;
        tx.commit().await?;

        info!(%tenant_id, voucher_no = %voucher.voucher_no, status = %voucher.status, "voucher submitted");
        Ok(voucher)
    }

    /// Approves a pending voucher.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotApprove` unless the voucher is pending.
    #[instrument(skip(self, notes))]
    pub async fn approve(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        voucher_id: VoucherId,
        notes: Option<String>,
    ) -> Result<Voucher, LedgerError> {
        let stamp = self.stamp(actor);
        let (voucher, ()) = self
            .edit(tenant_id, voucher_id, "approve", |v| v.approve(stamp, notes))
            .await?;
        info!(%tenant_id, voucher_no = %voucher.voucher_no, status = %voucher.status, "voucher approved");
        Ok(voucher)
    }

    /// Sends a pending voucher back to its author.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotReject` or `RejectionReasonRequired`.
    #[instrument(skip(self, reason))]
    pub async fn reject(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        voucher_id: VoucherId,
        reason: Option<String>,
    ) -> Result<Voucher, LedgerError> {
        let stamp = self.stamp(actor);
        let rules = self.rules;
        let (voucher, ()) = self
            .edit(tenant_id, voucher_id, "reject", |v| {
                v.reject(stamp, reason, &rules)
            })
            .await?;
        info!(
            %tenant_id,
            voucher_no = %voucher.voucher_no,
            status = %voucher.status,
            reason = voucher.rejection_reason.as_deref().unwrap_or_default(),
            "voucher rejected"
        );
        Ok(voucher)
    }

    /// Posts an approved voucher to the ledger.
    ///
    /// The status change and the balance increments of every touched
    /// account commit together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotPost`, `NoFiscalPeriod`, `PeriodClosed`, or an
    /// entry error if an account stopped accepting postings after approval.
    #[instrument(skip(self))]
    pub async fn post(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        voucher_id: VoucherId,
    ) -> Result<Voucher, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let mut voucher = load_voucher(tx.as_mut(), voucher_id).await?;
        let expected = voucher.version;
        let period = tx.find_period_for_date(voucher.voucher_date).await?;
        let accounts = load_entry_accounts(tx.as_mut(), &voucher).await?;
        voucher
            .post(period.as_ref(), &accounts, self.stamp(actor))
            .inspect_err(|e| refused("post", &voucher, e))?;

        for delta in posting_deltas(&voucher)? {
            tx.add_to_balance(&delta).await?;
            debug!(
                account_id = %delta.account_id,
                period = %delta.period,
                debit = %delta.debit,
                credit = %delta.credit,
                "balance updated"
            );
        }
        save(tx.as_mut(), &voucher, expected).await?;
        tx.commit().await?;

        info!(
            %tenant_id,
            voucher_no = %voucher.voucher_no,
            status = %voucher.status,
            total = %voucher.total_debit,
            "voucher posted"
        );
        Ok(voucher)
    }

    /// Cancels a draft or pending voucher.
    ///
    /// Cancelling a reversal frees its original to be reversed again.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotCancel` unless draft or pending.
    #[instrument(skip(self, reason))]
    pub async fn cancel(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        voucher_id: VoucherId,
        reason: Option<String>,
    ) -> Result<Voucher, LedgerError> {
        let stamp = self.stamp(actor);
        let mut tx = self.store.begin(tenant_id).await?;
        let mut voucher = load_voucher(tx.as_mut(), voucher_id).await?;
        let expected = voucher.version;
        voucher
            .cancel(stamp, reason)
            .inspect_err(|e| refused("cancel", &voucher, e))?;
        save(tx.as_mut(), &voucher, expected).await?;

        if let Some(original_id) = voucher.reversal_of_id {
            let mut original = load_voucher(tx.as_mut(), original_id).await?;
            if original.reversed_by_id == Some(voucher.id) {
                let original_version = original.version;
                original.clear_reversal_link(stamp.at);
                save(tx.as_mut(), &original, original_version).await?;
                debug!(original_no = %original.voucher_no, "reversal link cleared");
            }
        }
        tx.commit().await?;

        info!(%tenant_id, voucher_no = %voucher.voucher_no, status = %voucher.status, "voucher cancelled");
        Ok(voucher)
    }

    /// Creates the draft reversal of a posted voucher.
    ///
    /// The reversal is dated `voucher_date`, or the original's date when
    /// none is given, and numbered from that date's fiscal year.
    ///
    /// # Errors
    ///
    /// Returns `VoucherCannotReverse` unless the original is posted,
    /// `VoucherAlreadyReversed`, or `SequenceAllocationFailed`.
    #[instrument(skip(self))]
    pub async fn reverse(
        &self,
        tenant_id: TenantId,
        actor: UserId,
        voucher_id: VoucherId,
        voucher_date: Option<NaiveDate>,
    ) -> Result<Voucher, LedgerError> {
        let stamp = self.stamp(actor);
        let mut tx = self.store.begin(tenant_id).await?;
        let mut original = load_voucher(tx.as_mut(), voucher_id).await?;
        let expected = original.version;
        original
            .ensure_reversible()
            .inspect_err(|e| refused("reverse", &original, e))?;

        let date = voucher_date.unwrap_or(original.voucher_date);
        let voucher_no = allocate_number(tx.as_mut(), original.voucher_type, date).await?;
        let reversal = build_reversal(&original, VoucherId::new(), voucher_no, date, stamp)?;
        original.mark_reversed_by(reversal.id, stamp.at)?;

        tx.insert_voucher(&reversal).await?;
        save(tx.as_mut(), &original, expected).await?;
        tx.commit().await?;

        info!(
            %tenant_id,
            voucher_no = %reversal.voucher_no,
            original_no = %original.voucher_no,
            status = %reversal.status,
            "reversal created"
        );
        Ok(reversal)
    }

    /// Gets a voucher by id.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotFound` if the id is unknown.
    pub async fn get_voucher(
        &self,
        tenant_id: TenantId,
        voucher_id: VoucherId,
    ) -> Result<Voucher, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        load_voucher(tx.as_mut(), voucher_id).await
    }

    /// Gets a voucher by its number.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNumberNotFound` if no voucher has the number.
    pub async fn find_by_number(
        &self,
        tenant_id: TenantId,
        voucher_no: &str,
    ) -> Result<Voucher, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        tx.find_voucher_by_number(voucher_no)
            .await?
            .ok_or_else(|| LedgerError::VoucherNumberNotFound(voucher_no.to_string()))
    }

    /// Lists vouchers ordered by date then number, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the vouchers cannot be read.
    pub async fn list_vouchers(
        &self,
        tenant_id: TenantId,
        filter: &VoucherFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Voucher>, LedgerError> {
        let mut tx = self.store.begin(tenant_id).await?;
        let vouchers = tx.list_vouchers(filter).await?;
        Ok(PageResponse::from_items(vouchers, page))
    }
}
