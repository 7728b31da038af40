//! Unit of work over a single database transaction.
//!
//! # Usage
//!
//! ```ignore
//! use tally_db::UnitOfWork;
//!
//! let uow = UnitOfWork::begin(&db).await?;
//!
//! // Pass uow.conn() to every repository call in the sequence
//! AccountRepository::create(uow.conn(), &input).await?;
//! MemberRepository::add(uow.conn(), account.id, owner_id, Role::Owner).await?;
//!
//! // Persist everything, or drop `uow` to discard it
//! uow.commit().await?;
//! ```

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

/// A sequence of repository calls that succeeds or fails as a whole.
///
/// Dropping the unit of work without calling [`UnitOfWork::commit`] rolls
/// back every write made through it. This covers early returns via `?`,
/// panics and cancelled request futures alike.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    /// Begins a new transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be acquired or the transaction
    /// cannot be started.
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        Ok(Self { txn })
    }

    /// Returns the connection to hand to repository calls.
    #[must_use]
    pub const fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, persisting all changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}
