//! Chart of accounts.
//!
//! Account classification, posting eligibility and the acyclic account
//! hierarchy with its materialized paths.

pub mod chart;
pub mod types;

pub use chart::{
    AccountLookup, AccountUsage, ChartOfAccounts, MAX_ACCOUNT_CODE_LEN, normalize_code,
};
pub use types::{
    Account, AccountFilter, AccountNature, AccountType, CreateAccountInput, UpdateAccountInput,
};
