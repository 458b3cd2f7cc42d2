//! Chart of accounts domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Asset account (cash, receivables, inventory).
    Asset,
    /// Liability account (payables, loans).
    Liability,
    /// Equity account (capital, retained earnings).
    Equity,
    /// Revenue account (sales, service income).
    Revenue,
    /// Expense account (cost of goods, salaries).
    Expense,
}

impl AccountType {
    /// All account types in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parses a stored or user-supplied account type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountType` for anything outside the five types.
    pub fn parse(value: &str) -> Result<Self, LedgerError> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| LedgerError::InvalidAccountType(value.to_string()))
    }

    /// The side on which increases normally post.
    ///
    /// Asset and expense accounts are debit-natured; liability, equity and
    /// revenue accounts are credit-natured.
    #[must_use]
    pub const fn default_nature(self) -> AccountNature {
        match self {
            Self::Asset | Self::Expense => AccountNature::Debit,
            Self::Liability | Self::Equity | Self::Revenue => AccountNature::Credit,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The side (debit or credit) that represents an increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountNature {
    /// Increases post on the debit side.
    Debit,
    /// Increases post on the credit side.
    Credit,
}

impl AccountNature {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parses a stored or user-supplied account nature.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountNature` for anything but debit or credit.
    pub fn parse(value: &str) -> Result<Self, LedgerError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(LedgerError::InvalidAccountNature(value.to_string())),
        }
    }

    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

impl fmt::Display for AccountNature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountNature {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A node in a tenant's chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Short code, unique per tenant. Immutable once created.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Parent account, if any.
    pub parent_id: Option<AccountId>,
    /// Depth in the hierarchy, 1 for roots. Derived from `path`.
    pub level: u32,
    /// Codes from the root down to this account joined by `/`.
    pub path: String,
    /// Classification.
    pub account_type: AccountType,
    /// Side on which increases post.
    pub account_nature: AccountNature,
    /// Inactive accounts keep their history but accept no new postings.
    pub is_active: bool,
    /// Control accounts are backed by a sub-ledger.
    pub is_control_account: bool,
    /// Whether vouchers may post to this account directly.
    pub allow_direct_posting: bool,
    /// Creator.
    pub created_by: UserId,
    /// Last modifier.
    pub updated_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if a voucher entry may post directly to this account.
    #[must_use]
    pub fn can_post(&self) -> bool {
        self.is_active && self.allow_direct_posting && !self.is_control_account
    }

    /// Returns true if the nature overrides the type's default (contra account).
    #[must_use]
    pub fn is_contra(&self) -> bool {
        self.account_nature != self.account_type.default_nature()
    }

    /// Returns true if the account has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountInput {
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional parent.
    pub parent_id: Option<AccountId>,
    /// Classification.
    pub account_type: AccountType,
    /// Explicit nature; defaults to the type's natural side.
    pub account_nature: Option<AccountNature>,
    /// Marks the account as a sub-ledger control account.
    #[serde(default)]
    pub is_control_account: bool,
    /// Whether direct postings are allowed.
    #[serde(default = "default_allow_direct_posting")]
    pub allow_direct_posting: bool,
}

fn default_allow_direct_posting() -> bool {
    true
}

impl CreateAccountInput {
    /// Creates a postable root account input with the type's default nature.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            parent_id: None,
            account_type,
            account_nature: None,
            is_control_account: false,
            allow_direct_posting: true,
        }
    }

    /// Sets the parent account.
    #[must_use]
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Overrides the nature (contra account).
    #[must_use]
    pub fn with_nature(mut self, nature: AccountNature) -> Self {
        self.account_nature = Some(nature);
        self
    }

    /// Marks the account as a control account.
    #[must_use]
    pub fn control(mut self) -> Self {
        self.is_control_account = true;
        self
    }

    /// Marks the account as a header that only aggregates its children.
    #[must_use]
    pub fn header(mut self) -> Self {
        self.allow_direct_posting = false;
        self
    }

    /// Nature the account will be created with.
    #[must_use]
    pub fn resolved_nature(&self) -> AccountNature {
        self.account_nature
            .unwrap_or_else(|| self.account_type.default_nature())
    }
}

/// Input for updating an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// New parent; `Some(None)` moves the account to the root.
    pub parent_id: Option<Option<AccountId>>,
    /// New control-account flag.
    pub is_control_account: Option<bool>,
    /// New direct-posting flag.
    pub allow_direct_posting: Option<bool>,
}

/// Filter for listing accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFilter {
    /// Only accounts of this type.
    pub account_type: Option<AccountType>,
    /// Only active or only inactive accounts.
    pub is_active: Option<bool>,
    /// Only direct children of this account.
    pub parent_id: Option<AccountId>,
}

impl AccountFilter {
    /// Returns true if the account passes every set criterion.
    #[must_use]
    pub fn matches(&self, account: &Account) -> bool {
        self.account_type.is_none_or(|t| account.account_type == t)
            && self.is_active.is_none_or(|a| account.is_active == a)
            && self
                .parent_id
                .is_none_or(|p| account.parent_id == Some(p))
    }
}
