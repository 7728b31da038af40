//! Refresh token repository for database operations.
//!
//! Only the SHA-256 hash of a refresh token is stored. The plaintext is handed
//! to the client once and never persisted.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, sea_query::Expr,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::refresh_tokens;

/// Refresh token queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshTokenRepository;

impl RefreshTokenRepository {
    /// Hashes a refresh token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Generates a new refresh token: 32 random bytes, base64url encoded.
    #[must_use]
    pub fn generate_token() -> String {
        let bytes: [u8; 32] = rand::random();
        base64_url::encode(&bytes)
    }

    /// Stores a token hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<refresh_tokens::Model, DbErr> {
        refresh_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(token_hash.to_string()),
            is_refreshed: Set(false),
            expires_at: Set(expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
    }

    /// Finds a token by its hash, whatever its state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_hash<C: ConnectionTrait>(
        conn: &C,
        token_hash: &str,
    ) -> Result<Option<refresh_tokens::Model>, DbErr> {
        refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
            .one(conn)
            .await
    }

    /// Marks a token consumed if, and only if, it is still unconsumed and
    /// unrevoked.
    ///
    /// Returns true when this call performed the transition. Of several
    /// concurrent callers at most one sees true.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_refreshed<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(refresh_tokens::Column::IsRefreshed, Expr::value(true))
            .filter(refresh_tokens::Column::Id.eq(id))
            .filter(refresh_tokens::Column::IsRefreshed.eq(false))
            .filter(refresh_tokens::Column::RevokedAt.is_null())
            .exec(conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Revokes a user's token by hash. Already-revoked and unknown tokens are
    /// left alone. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<u64, DbErr> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(refresh_tokens::Column::RevokedAt, Expr::value(Utc::now()))
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
            .filter(refresh_tokens::Column::RevokedAt.is_null())
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Counts all stored tokens of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<u64, DbErr> {
        refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .count(conn)
            .await
    }
}
