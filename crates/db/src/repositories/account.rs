//! Account repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use tally_core::access::Role;
use uuid::Uuid;

use crate::entities::{account_members, accounts, transactions};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Account name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Creating user, who becomes the owner.
    pub owner_id: Uuid,
}

/// An account together with the caller's role in it.
#[derive(Debug, Clone)]
pub struct AccountWithRole {
    /// Account row.
    pub account: accounts::Model,
    /// Caller's role.
    pub role: Role,
}

/// Account queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountRepository;

impl AccountRepository {
    /// Inserts an account row. Membership rows are written separately.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        input: &CreateAccountInput,
    ) -> Result<accounts::Model, DbErr> {
        let now = Utc::now().into();

        accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            owner_id: Set(input.owner_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find_by_id(id).one(conn).await
    }

    /// Lists the accounts a user belongs to, oldest membership first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Vec<AccountWithRole>, DbErr> {
        let rows = account_members::Entity::find()
            .filter(account_members::Column::UserId.eq(user_id))
            .order_by_asc(account_members::Column::CreatedAt)
            .find_also_related(accounts::Entity)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(member, account)| {
                account.map(|account| AccountWithRole {
                    account,
                    role: member.role.into(),
                })
            })
            .collect())
    }

    /// Deletes an account with all of its memberships and transactions.
    ///
    /// Dependent rows are removed explicitly so the result does not rely on
    /// the backend enforcing foreign-key cascades. Run it inside a
    /// [`crate::UnitOfWork`]. Returns false if the account did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any delete fails.
    pub async fn delete_cascade<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
        transactions::Entity::delete_many()
            .filter(transactions::Column::AccountId.eq(id))
            .exec(conn)
            .await?;

        account_members::Entity::delete_many()
            .filter(account_members::Column::AccountId.eq(id))
            .exec(conn)
            .await?;

        let result = accounts::Entity::delete_by_id(id).exec(conn).await?;

        Ok(result.rows_affected == 1)
    }
}
