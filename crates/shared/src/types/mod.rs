//! Common types used across the workspace.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{Money, MoneyParseError};
pub use pagination::{PageMeta, PageRequest, PageResponse};
