//! Transaction repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, sea_query::Condition,
};
use tally_core::periodic::Period;
use tally_core::transaction::{TransactionFilter, TransactionKind};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::TransactionPeriod, transactions};

/// Rows per multi-row INSERT when materializing a series.
const INSERT_CHUNK_SIZE: usize = 100;

/// Input for creating one transaction, or the template of a series.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Owning account.
    pub account_id: Uuid,
    /// Creating user.
    pub user_id: Uuid,
    /// Signed amount; positive is income.
    pub amount: Decimal,
    /// Title.
    pub title: String,
    /// Optional category.
    pub category: Option<String>,
    /// When the (first) transaction occurred.
    pub occurred_at: DateTime<Utc>,
    /// Recurrence period, if periodic.
    pub period: Option<Period>,
}

/// Editable fields of a transaction. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New title.
    pub title: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New occurrence time.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Transaction queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionRepository;

impl TransactionRepository {
    /// Inserts a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        input: &CreateTransactionInput,
    ) -> Result<transactions::Model, DbErr> {
        Self::active_model(input, input.occurred_at)
            .insert(conn)
            .await
    }

    /// Inserts one row per date in `dates`, copying everything else from
    /// `template`. Returns the number of rows written.
    ///
    /// Rows are written in chunks of multi-row INSERTs. Atomicity comes from
    /// the caller's [`crate::UnitOfWork`].
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub async fn create_series<C: ConnectionTrait>(
        conn: &C,
        template: &CreateTransactionInput,
        dates: &[DateTime<Utc>],
    ) -> Result<u64, DbErr> {
        let mut written = 0;

        for chunk in dates.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk
                .iter()
                .map(|occurred_at| Self::active_model(template, *occurred_at));

            written += transactions::Entity::insert_many(models)
                .exec_without_returning(conn)
                .await?;
        }

        Ok(written)
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id).one(conn).await
    }

    /// Lists an account's transactions matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(Self::condition(account_id, filter))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_asc(transactions::Column::Id)
            .all(conn)
            .await
    }

    /// Counts an account's transactions matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<u64, DbErr> {
        transactions::Entity::find()
            .filter(Self::condition(account_id, filter))
            .count(conn)
            .await
    }

    /// Applies `changes` to a transaction. The period is never touched.
    ///
    /// Returns `None` if the transaction does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        changes: UpdateTransactionInput,
    ) -> Result<Option<transactions::Model>, DbErr> {
        let Some(existing) = Self::find_by_id(conn, id).await? else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        if let Some(title) = changes.title {
            model.title = Set(title);
        }
        if let Some(amount) = changes.amount {
            model.amount = Set(amount);
        }
        if let Some(occurred_at) = changes.occurred_at {
            model.occurred_at = Set(occurred_at.into());
        }
        model.updated_at = Set(Utc::now().into());

        model.update(conn).await.map(Some)
    }

    /// Deletes a transaction. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
        let result = transactions::Entity::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected == 1)
    }

    fn active_model(
        input: &CreateTransactionInput,
        occurred_at: DateTime<Utc>,
    ) -> transactions::ActiveModel {
        let now = Utc::now().into();

        transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(input.account_id),
            user_id: Set(input.user_id),
            amount: Set(input.amount),
            title: Set(input.title.clone()),
            category: Set(input.category.clone()),
            occurred_at: Set(occurred_at.into()),
            period: Set(input.period.map(TransactionPeriod::from)),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    /// Builds the WHERE clause, adding only the predicates that are set.
    fn condition(account_id: Uuid, filter: &TransactionFilter) -> Condition {
        let mut condition = Condition::all().add(transactions::Column::AccountId.eq(account_id));

        if let Some(from) = filter.date_from {
            condition = condition.add(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.date_to {
            condition = condition.add(transactions::Column::OccurredAt.lte(to));
        }
        if let Some(kind) = filter.kind {
            condition = condition.add(match kind {
                TransactionKind::Income => transactions::Column::Amount.gt(Decimal::ZERO),
                TransactionKind::Expense => transactions::Column::Amount.lt(Decimal::ZERO),
            });
        }
        if !filter.categories.is_empty() {
            condition = condition.add(
                transactions::Column::Category.is_in(filter.categories.iter().cloned()),
            );
        }
        if let Some(is_periodic) = filter.is_periodic {
            condition = condition.add(if is_periodic {
                transactions::Column::Period.is_not_null()
            } else {
                transactions::Column::Period.is_null()
            });
        }
        if let Some(user_id) = filter.user_id {
            condition = condition.add(transactions::Column::UserId.eq(user_id));
        }

        condition
    }
}
