//! Domain services.
//!
//! Services own a pool handle and compose repository calls, running every
//! multi-row sequence inside a [`crate::UnitOfWork`].

pub mod access;
pub mod account;
pub mod auth;
pub mod member;
pub mod transaction;

pub use access::{AccessControl, AccessError};
pub use account::{AccountError, AccountService};
pub use auth::{AuthError, AuthService};
pub use member::{MemberError, MemberService};
pub use transaction::{CreatedTransaction, NewTransaction, TransactionError, TransactionService};
