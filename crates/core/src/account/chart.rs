//! Chart of accounts arena and hierarchy rules.
//!
//! Accounts are stored by id; `level` and `path` are derived from the parent
//! chain. Parent links are checked for cycles before anything is written, so
//! queries never have to guard against loops.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, TenantId, UserId};

use super::types::{Account, AccountFilter, AccountType, CreateAccountInput, UpdateAccountInput};
use crate::error::LedgerError;

/// What references an account outside the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountUsage {
    /// Posted movement exists in the balances.
    pub has_postings: bool,
    /// A voucher that is neither posted nor cancelled has an entry on it.
    pub has_open_vouchers: bool,
}

/// Maximum length of an account code.
pub const MAX_ACCOUNT_CODE_LEN: usize = 20;

/// Separator between codes in a materialized path.
pub const PATH_SEPARATOR: char = '/';

/// Read access to accounts by id.
///
/// Implemented by the chart itself and by plain maps of the accounts a
/// voucher references.
pub trait AccountLookup {
    /// Returns the account, if known.
    fn account(&self, id: AccountId) -> Option<&Account>;
}

impl AccountLookup for BTreeMap<AccountId, Account> {
    fn account(&self, id: AccountId) -> Option<&Account> {
        self.get(&id)
    }
}

/// Trims and validates an account code.
///
/// # Errors
///
/// Returns `InvalidAccountCode` if the code is empty, longer than
/// [`MAX_ACCOUNT_CODE_LEN`], or contains anything but ASCII letters, digits,
/// `.` and `-`.
pub fn normalize_code(code: &str) -> Result<String, LedgerError> {
    let trimmed = code.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_ACCOUNT_CODE_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(LedgerError::InvalidAccountCode(code.to_string()))
    }
}

fn level_of(path: &str) -> u32 {
    u32::try_from(path.split(PATH_SEPARATOR).count()).unwrap_or(u32::MAX)
}

/// One tenant's chart of accounts.
#[derive(Debug, Clone)]
pub struct ChartOfAccounts {
    tenant_id: TenantId,
    accounts: BTreeMap<AccountId, Account>,
}

impl AccountLookup for ChartOfAccounts {
    fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }
}

impl ChartOfAccounts {
    /// Creates an empty chart.
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            accounts: BTreeMap::new(),
        }
    }

    /// Builds a chart from stored accounts.
    #[must_use]
    pub fn from_accounts(tenant_id: TenantId, accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut chart = Self::new(tenant_id);
        for account in accounts {
            chart.insert(account);
        }
        chart
    }

    /// Owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Inserts or replaces an account.
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    /// Removes an account.
    pub fn remove(&mut self, id: AccountId) -> Option<Account> {
        self.accounts.remove(&id)
    }

    /// Returns the account with this id.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Returns the account with this id or `AccountNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub fn require(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.get(id).ok_or(LedgerError::AccountNotFound(id))
    }

    /// Finds an account of this tenant by code.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Account> {
        let code = code.trim();
        self.accounts
            .values()
            .find(|a| a.tenant_id == self.tenant_id && a.code == code)
    }

    /// Iterates over all accounts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Lists accounts matching the filter, ordered by code.
    #[must_use]
    pub fn list(&self, filter: &AccountFilter) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self
            .accounts
            .values()
            .filter(|a| a.tenant_id == self.tenant_id && filter.matches(a))
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }

    /// Accounts of one type, ordered by code.
    #[must_use]
    pub fn by_type(&self, account_type: AccountType) -> Vec<&Account> {
        self.list(&AccountFilter {
            account_type: Some(account_type),
            ..AccountFilter::default()
        })
    }

    /// Direct children of an account, ordered by code.
    #[must_use]
    pub fn children(&self, id: AccountId) -> Vec<&Account> {
        self.list(&AccountFilter {
            parent_id: Some(id),
            ..AccountFilter::default()
        })
    }

    /// Ancestors of an account, root first, resolved from its path.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub fn ancestors(&self, id: AccountId) -> Result<Vec<&Account>, LedgerError> {
        let account = self.require(id)?;
        let segments: Vec<&str> = account.path.split(PATH_SEPARATOR).collect();
        let ancestor_codes = &segments[..segments.len().saturating_sub(1)];
        Ok(ancestor_codes
            .iter()
            .filter_map(|code| self.find_by_code(code))
            .collect())
    }

    /// Every account below this one, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub fn descendants(&self, id: AccountId) -> Result<Vec<&Account>, LedgerError> {
        let account = self.require(id)?;
        let prefix = format!("{}{PATH_SEPARATOR}", account.path);
        let mut found: Vec<&Account> = self
            .accounts
            .values()
            .filter(|a| a.tenant_id == self.tenant_id && a.path.starts_with(&prefix))
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }

    /// Resolves a parent reference, rejecting missing and foreign parents.
    fn parent_placement(&self, parent_id: AccountId) -> Result<&Account, LedgerError> {
        let parent = self
            .get(parent_id)
            .ok_or(LedgerError::ParentNotFound(parent_id))?;
        if parent.tenant_id != self.tenant_id {
            return Err(LedgerError::ParentWrongTenant(parent_id));
        }
        Ok(parent)
    }

    /// Walks up from `parent_id` and fails if `account_id` is among the ancestors.
    ///
    /// # Errors
    ///
    /// Returns `AccountCycle` if linking would close a loop, or
    /// `ParentNotFound` if the chain references a missing account.
    pub fn ensure_acyclic(
        &self,
        account_id: AccountId,
        parent_id: AccountId,
    ) -> Result<(), LedgerError> {
        let cycle = LedgerError::AccountCycle {
            account_id,
            parent_id,
        };
        let mut current = Some(parent_id);
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == account_id || steps > self.accounts.len() {
                return Err(cycle);
            }
            let node = self.get(id).ok_or(LedgerError::ParentNotFound(id))?;
            current = node.parent_id;
            steps += 1;
        }
        Ok(())
    }

    /// Validates a create request and builds the new account.
    ///
    /// The chart is not modified; call [`insert`](Self::insert) once the
    /// account has been stored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountCode`, `AccountNameRequired`,
    /// `DuplicateAccountCode`, `ParentNotFound`, `ParentWrongTenant` or
    /// `AccountCycle`.
    pub fn prepare_create(
        &self,
        id: AccountId,
        input: &CreateAccountInput,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let code = normalize_code(&input.code)?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(LedgerError::AccountNameRequired);
        }
        if self.find_by_code(&code).is_some() {
            return Err(LedgerError::DuplicateAccountCode(code));
        }

        let path = match input.parent_id {
            Some(parent_id) => {
                let parent = self.parent_placement(parent_id)?;
                self.ensure_acyclic(id, parent_id)?;
                format!("{}{PATH_SEPARATOR}{code}", parent.path)
            }
            None => code.clone(),
        };

        Ok(Account {
            id,
            tenant_id: self.tenant_id,
            code,
            name: name.to_string(),
            parent_id: input.parent_id,
            level: level_of(&path),
            path,
            account_type: input.account_type,
            account_nature: input.resolved_nature(),
            is_active: true,
            is_control_account: input.is_control_account,
            allow_direct_posting: input.allow_direct_posting,
            created_by: actor,
            updated_by: actor,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates an update and returns every account that changes.
    ///
    /// The first element is the updated account itself. When the parent
    /// changes, its whole subtree follows with rebased `level` and `path`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountNameRequired`, `ParentNotFound`,
    /// `ParentWrongTenant` or `AccountCycle`.
    pub fn prepare_update(
        &self,
        id: AccountId,
        input: &UpdateAccountInput,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Account>, LedgerError> {
        let current = self.require(id)?;
        let mut updated = current.clone();

        if let Some(name) = &input.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(LedgerError::AccountNameRequired);
            }
            updated.name = name.to_string();
        }
        if let Some(flag) = input.is_control_account {
            updated.is_control_account = flag;
        }
        if let Some(flag) = input.allow_direct_posting {
            updated.allow_direct_posting = flag;
        }
        updated.updated_by = actor;
        updated.updated_at = now;

        let Some(new_parent) = input.parent_id else {
            return Ok(vec![updated]);
        };
        if new_parent == current.parent_id {
            return Ok(vec![updated]);
        }

        updated.path = match new_parent {
            Some(parent_id) => {
                let parent = self.parent_placement(parent_id)?;
                self.ensure_acyclic(id, parent_id)?;
                format!("{}{PATH_SEPARATOR}{}", parent.path, current.code)
            }
            None => current.code.clone(),
        };
        updated.parent_id = new_parent;
        updated.level = level_of(&updated.path);

        let old_prefix = current.path.as_str();
        let mut changed = vec![updated.clone()];
        for descendant in self.descendants(id)? {
            let mut moved = descendant.clone();
            moved.path = format!("{}{}", updated.path, &descendant.path[old_prefix.len()..]);
            moved.level = level_of(&moved.path);
            moved.updated_by = actor;
            moved.updated_at = now;
            changed.push(moved);
        }
        Ok(changed)
    }

    /// Returns the account with `is_active` set, stamped by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the id is unknown.
    pub fn prepare_set_active(
        &self,
        id: AccountId,
        active: bool,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let mut account = self.require(id)?.clone();
        account.is_active = active;
        account.updated_by = actor;
        account.updated_at = now;
        Ok(account)
    }

    /// Checks that an account may be hard-deleted.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountHasChildren`, `AccountHasPostings`
    /// when the account has postings, or `AccountInUse` when unposted
    /// vouchers still reference it.
    pub fn check_delete(&self, id: AccountId, usage: AccountUsage) -> Result<(), LedgerError> {
        self.require(id)?;
        if !self.children(id).is_empty() {
            return Err(LedgerError::AccountHasChildren(id));
        }
        if usage.has_postings {
            return Err(LedgerError::AccountHasPostings(id));
        }
        if usage.has_open_vouchers {
            return Err(LedgerError::AccountInUse(id));
        }
        Ok(())
    }
}
