//! Transaction list filtering.

mod filter;

pub use filter::{FilterError, TransactionFilter, TransactionKind};
