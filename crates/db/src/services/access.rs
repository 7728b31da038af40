//! Membership lookup and permission checks against the store.

use sea_orm::{ConnectionTrait, DbErr};
use tally_core::access::{Action, Decision, Membership, Role, authorize};
use thiserror::Error;
use uuid::Uuid;

use crate::repositories::MemberRepository;

/// Failure of a permission check.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The actor may not perform the action.
    #[error("{action:?} denied")]
    Denied {
        /// The denied action.
        action: Action,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Resolves memberships and applies the decision table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControl;

impl AccessControl {
    /// Returns the user's standing in the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn role_of<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, DbErr> {
        MemberRepository::membership(conn, account_id, user_id).await
    }

    /// Checks that `actor_id` may perform `action` on the account and returns
    /// the actor's role.
    ///
    /// Run it on the same connection as the mutation it guards so the check
    /// and the write see the same membership.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Denied` for non-members and insufficient roles,
    /// and `AccessError::Database` if the lookup fails.
    pub async fn require<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        actor_id: Uuid,
        action: Action,
        resource_owner: Option<Uuid>,
    ) -> Result<Role, AccessError> {
        let membership = Self::role_of(conn, account_id, actor_id).await?;

        match (
            authorize(membership, actor_id, action, resource_owner),
            membership.role(),
        ) {
            (Decision::Allow, Some(role)) => Ok(role),
            _ => {
                tracing::warn!(
                    account_id = %account_id,
                    actor_id = %actor_id,
                    ?action,
                    ?membership,
                    "Action denied"
                );
                Err(AccessError::Denied { action })
            }
        }
    }
}
