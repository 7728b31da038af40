//! Transaction writes and listings, including periodic series.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr};
use tally_core::access::Action;
use tally_core::periodic::{DEFAULT_SERIES_LENGTH, ExpandError, Period, expand};
use tally_core::transaction::{FilterError, TransactionFilter};
use tally_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::UnitOfWork;
use crate::entities::transactions;
use crate::repositories::{
    CreateTransactionInput, TransactionRepository, UpdateTransactionInput,
};
use crate::services::access::{AccessControl, AccessError};

/// Errors from transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// No transaction with the given ID.
    #[error("Transaction not found")]
    NotFound,

    /// Missing account or insufficient role.
    #[error("Access denied")]
    Forbidden,

    /// Invalid input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccessError> for TransactionError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied { .. } => Self::Forbidden,
            AccessError::Database(e) => Self::Database(e),
        }
    }
}

impl From<FilterError> for TransactionError {
    fn from(err: FilterError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ExpandError> for TransactionError {
    fn from(err: ExpandError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound => Self::NotFound("transaction not found".to_string()),
            TransactionError::Forbidden => Self::Forbidden("access denied".to_string()),
            TransactionError::Validation(msg) => Self::Validation(msg),
            TransactionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// A transaction as submitted by a member.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Signed amount; positive is income.
    pub amount: Decimal,
    /// Title, required.
    pub title: String,
    /// Optional category.
    pub category: Option<String>,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Set to create a periodic series.
    pub period: Option<Period>,
}

/// Result of a create call.
#[derive(Debug, Clone)]
pub struct CreatedTransaction {
    /// The first (or only) row.
    pub first: transactions::Model,
    /// Number of rows written, 1 for a one-off transaction.
    pub count: u64,
}

/// Creates, lists, edits and deletes account transactions.
#[derive(Debug, Clone)]
pub struct TransactionService {
    db: DatabaseConnection,
    series_length: usize,
}

impl TransactionService {
    /// Creates a service that writes series of the default length.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self::with_series_length(db, DEFAULT_SERIES_LENGTH)
    }

    /// Creates a service that writes periodic series of `series_length` rows.
    #[must_use]
    pub const fn with_series_length(db: DatabaseConnection, series_length: usize) -> Self {
        Self { db, series_length }
    }

    /// Records a transaction, or a whole series when a period is given.
    ///
    /// The permission check runs once; all rows of a series are written in
    /// one unit of work.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::Forbidden` for viewers and non-members and
    /// `TransactionError::Validation` for a blank title.
    pub async fn create(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
        new: NewTransaction,
    ) -> Result<CreatedTransaction, TransactionError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(TransactionError::Validation("title must not be empty".to_string()));
        }

        let template = CreateTransactionInput {
            account_id,
            user_id: actor_id,
            amount: new.amount,
            title: title.to_string(),
            category: new.category.filter(|c| !c.trim().is_empty()),
            occurred_at: new.occurred_at.unwrap_or_else(Utc::now),
            period: new.period,
        };

        let dates = match template.period {
            Some(period) => expand(template.occurred_at, period, self.series_length)?,
            None => vec![template.occurred_at],
        };

        let uow = UnitOfWork::begin(&self.db).await?;
        AccessControl::require(
            uow.conn(),
            account_id,
            actor_id,
            Action::CreateTransaction,
            None,
        )
        .await?;

        let first = TransactionRepository::create(uow.conn(), &template).await?;
        let rest = TransactionRepository::create_series(uow.conn(), &template, &dates[1..]).await?;
        uow.commit().await?;

        let count = rest + 1;
        tracing::info!(
            account_id = %account_id,
            user_id = %actor_id,
            transaction_id = %first.id,
            period = template.period.map(|p| p.as_str()),
            count,
            "Transaction created"
        );

        Ok(CreatedTransaction { first, count })
    }

    /// Lists an account's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::Validation` for an inconsistent filter and
    /// `TransactionError::Forbidden` for non-members.
    pub async fn list(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<transactions::Model>, TransactionError> {
        filter.validate()?;

        AccessControl::require(
            &self.db,
            account_id,
            actor_id,
            Action::ListTransactions,
            None,
        )
        .await?;

        Ok(TransactionRepository::list(&self.db, account_id, filter).await?)
    }

    /// Edits the title, amount or date of one transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::NotFound` for an unknown ID,
    /// `TransactionError::Forbidden` if the actor may not edit it and
    /// `TransactionError::Validation` when nothing would change.
    pub async fn update(
        &self,
        actor_id: Uuid,
        transaction_id: Uuid,
        mut changes: UpdateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        if let Some(title) = changes.title.as_mut() {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(TransactionError::Validation(
                    "title must not be empty".to_string(),
                ));
            }
            *title = trimmed.to_string();
        }
        if changes.title.is_none() && changes.amount.is_none() && changes.occurred_at.is_none() {
            return Err(TransactionError::Validation(
                "at least one of title, amount or occurred_at is required".to_string(),
            ));
        }

        let uow = UnitOfWork::begin(&self.db).await?;
        let existing = TransactionRepository::find_by_id(uow.conn(), transaction_id)
            .await?
            .ok_or(TransactionError::NotFound)?;

        AccessControl::require(
            uow.conn(),
            existing.account_id,
            actor_id,
            Action::UpdateTransaction,
            Some(existing.user_id),
        )
        .await?;

        let updated = TransactionRepository::update(uow.conn(), transaction_id, changes)
            .await?
            .ok_or(TransactionError::NotFound)?;
        uow.commit().await?;

        tracing::info!(transaction_id = %transaction_id, actor_id = %actor_id, "Transaction updated");
        Ok(updated)
    }

    /// Deletes one transaction. Other rows of its series are untouched.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::NotFound` for an unknown ID and
    /// `TransactionError::Forbidden` if the actor may not delete it.
    pub async fn delete(&self, actor_id: Uuid, transaction_id: Uuid) -> Result<(), TransactionError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        let existing = TransactionRepository::find_by_id(uow.conn(), transaction_id)
            .await?
            .ok_or(TransactionError::NotFound)?;

        AccessControl::require(
            uow.conn(),
            existing.account_id,
            actor_id,
            Action::DeleteTransaction,
            Some(existing.user_id),
        )
        .await?;

        if !TransactionRepository::delete(uow.conn(), transaction_id).await? {
            return Err(TransactionError::NotFound);
        }
        uow.commit().await?;

        tracing::info!(transaction_id = %transaction_id, actor_id = %actor_id, "Transaction deleted");
        Ok(())
    }
}
