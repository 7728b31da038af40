//! Repository abstractions for data access.
//!
//! Repositories are stateless: each method takes the connection to run on,
//! either the pool or a [`crate::UnitOfWork`] transaction.

pub mod account;
pub mod member;
pub mod refresh_token;
pub mod transaction;
pub mod user;

pub use account::{AccountRepository, AccountWithRole, CreateAccountInput};
pub use member::{MemberRepository, MemberWithUser};
pub use refresh_token::RefreshTokenRepository;
pub use transaction::{CreateTransactionInput, TransactionRepository, UpdateTransactionInput};
pub use user::UserRepository;

use sea_orm::{DbErr, SqlErr};

/// Returns true if `err` is a unique or primary-key violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
