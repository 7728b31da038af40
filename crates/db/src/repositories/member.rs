//! Account membership repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use tally_core::access::{Membership, Role};
use uuid::Uuid;

use crate::entities::{account_members, sea_orm_active_enums::MemberRole, users};

/// A member row joined with the member's user.
#[derive(Debug, Clone)]
pub struct MemberWithUser {
    /// User ID.
    pub user_id: Uuid,
    /// User email.
    pub email: String,
    /// Role in the account.
    pub role: Role,
    /// When the user joined the account.
    pub joined_at: chrono::DateTime<chrono::FixedOffset>,
}

/// Membership queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberRepository;

impl MemberRepository {
    /// Resolves a user's standing in an account.
    ///
    /// A missing row, including one for a missing account, is
    /// `Membership::NotAMember` rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn membership<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, DbErr> {
        let row = account_members::Entity::find_by_id((account_id, user_id))
            .one(conn)
            .await?;

        Ok(row.map(|m| Role::from(m.role)).into())
    }

    /// Adds a user to an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a primary-key violation
    /// when the user is already a member.
    pub async fn add<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<account_members::Model, DbErr> {
        let now = Utc::now().into();

        account_members::ActiveModel {
            account_id: Set(account_id),
            user_id: Set(user_id),
            role: Set(MemberRole::from(role)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
    }

    /// Changes a member's role. Returns false if there is no such member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_role<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<bool, DbErr> {
        let result = account_members::Entity::update_many()
            .col_expr(
                account_members::Column::Role,
                Expr::value(MemberRole::from(role)),
            )
            .col_expr(account_members::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(account_members::Column::AccountId.eq(account_id))
            .filter(account_members::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Removes a member. Returns false if there was no such member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn remove<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, DbErr> {
        let result = account_members::Entity::delete_by_id((account_id, user_id))
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Lists an account's members in the order they joined.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, DbErr> {
        let rows = account_members::Entity::find()
            .filter(account_members::Column::AccountId.eq(account_id))
            .order_by_asc(account_members::Column::CreatedAt)
            .find_also_related(users::Entity)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(member, user)| {
                user.map(|user| MemberWithUser {
                    user_id: user.id,
                    email: user.email,
                    role: member.role.into(),
                    joined_at: member.created_at,
                })
            })
            .collect())
    }

    /// Counts members holding `role` in an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_with_role<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        role: Role,
    ) -> Result<u64, DbErr> {
        account_members::Entity::find()
            .filter(account_members::Column::AccountId.eq(account_id))
            .filter(account_members::Column::Role.eq(MemberRole::from(role)))
            .count(conn)
            .await
    }
}
