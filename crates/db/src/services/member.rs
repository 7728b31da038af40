//! Account membership management.

use sea_orm::{DatabaseConnection, DbErr};
use tally_core::access::{
    Action, Decision, Membership, Role, RoleParseError, may_modify_membership,
};
use tally_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::UnitOfWork;
use crate::repositories::{MemberRepository, MemberWithUser, UserRepository, is_unique_violation};
use crate::services::access::{AccessControl, AccessError};

/// Errors from member operations.
#[derive(Debug, Error)]
pub enum MemberError {
    /// Missing account or insufficient role.
    #[error("Access to account denied")]
    Forbidden,

    /// The owner's membership cannot be changed or removed.
    #[error("The owner's membership cannot be modified")]
    OwnerImmutable,

    /// Role is unknown or not assignable.
    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleParseError),

    /// No user with the given email.
    #[error("User not found")]
    UserNotFound,

    /// The target user is not a member of the account.
    #[error("Member not found")]
    MemberNotFound,

    /// The user already belongs to the account.
    #[error("User is already a member of this account")]
    AlreadyMember,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccessError> for MemberError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied { .. } => Self::Forbidden,
            AccessError::Database(e) => Self::Database(e),
        }
    }
}

impl From<MemberError> for AppError {
    fn from(err: MemberError) -> Self {
        match err {
            MemberError::Forbidden => Self::Forbidden("access to account denied".to_string()),
            MemberError::OwnerImmutable => {
                Self::Forbidden("the owner's membership cannot be modified".to_string())
            }
            MemberError::InvalidRole(e) => Self::Validation(e.to_string()),
            MemberError::UserNotFound => Self::NotFound("user not found".to_string()),
            MemberError::MemberNotFound => Self::NotFound("member not found".to_string()),
            MemberError::AlreadyMember => {
                Self::Conflict("user is already a member of this account".to_string())
            }
            MemberError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Invites, re-roles and removes account members.
#[derive(Debug, Clone)]
pub struct MemberService {
    db: DatabaseConnection,
}

impl MemberService {
    /// Creates a new member service.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the members of an account.
    ///
    /// # Errors
    ///
    /// Returns `MemberError::Forbidden` for non-members.
    pub async fn list(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, MemberError> {
        AccessControl::require(&self.db, account_id, actor_id, Action::ListMembers, None).await?;
        Ok(MemberRepository::list(&self.db, account_id).await?)
    }

    /// Adds the user registered under `email` with role `role`.
    ///
    /// # Errors
    ///
    /// Returns `MemberError::InvalidRole` for `owner` or unknown roles,
    /// `MemberError::UserNotFound` for an unknown email and
    /// `MemberError::AlreadyMember` if the user already belongs to the account.
    pub async fn invite(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
        email: &str,
        role: &str,
    ) -> Result<MemberWithUser, MemberError> {
        let role = Role::parse_assignable(role)?;
        let email = email.trim().to_lowercase();

        let uow = UnitOfWork::begin(&self.db).await?;
        AccessControl::require(uow.conn(), account_id, actor_id, Action::InviteMember, None)
            .await?;

        let user = UserRepository::find_by_email(uow.conn(), &email)
            .await?
            .ok_or(MemberError::UserNotFound)?;

        if MemberRepository::membership(uow.conn(), account_id, user.id).await?
            != Membership::NotAMember
        {
            return Err(MemberError::AlreadyMember);
        }

        let member = MemberRepository::add(uow.conn(), account_id, user.id, role)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    MemberError::AlreadyMember
                } else {
                    MemberError::Database(e)
                }
            })?;
        uow.commit().await?;

        tracing::info!(
            account_id = %account_id,
            user_id = %user.id,
            role = %role,
            "Member invited"
        );

        Ok(MemberWithUser {
            user_id: user.id,
            email: user.email,
            role,
            joined_at: member.created_at,
        })
    }

    /// Changes a member's role.
    ///
    /// # Errors
    ///
    /// Returns `MemberError::OwnerImmutable` when targeting the owner and
    /// `MemberError::MemberNotFound` when the target is not a member.
    pub async fn change_role(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
        target_user_id: Uuid,
        role: &str,
    ) -> Result<(), MemberError> {
        let role = Role::parse_assignable(role)?;

        let uow = UnitOfWork::begin(&self.db).await?;
        AccessControl::require(uow.conn(), account_id, actor_id, Action::ChangeRole, None).await?;
        Self::ensure_modifiable(uow.conn(), account_id, target_user_id).await?;

        Self::write_role(uow.conn(), account_id, target_user_id, role).await?;
        uow.commit().await?;

        tracing::info!(
            account_id = %account_id,
            user_id = %target_user_id,
            role = %role,
            "Member role changed"
        );
        Ok(())
    }

    /// Removes a member from an account.
    ///
    /// # Errors
    ///
    /// Returns `MemberError::OwnerImmutable` when targeting the owner and
    /// `MemberError::MemberNotFound` when the target is not a member.
    pub async fn remove(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<(), MemberError> {
        let uow = UnitOfWork::begin(&self.db).await?;
        AccessControl::require(uow.conn(), account_id, actor_id, Action::RemoveMember, None)
            .await?;
        Self::ensure_modifiable(uow.conn(), account_id, target_user_id).await?;

        Self::delete_membership(uow.conn(), account_id, target_user_id).await?;
        uow.commit().await?;

        tracing::info!(account_id = %account_id, user_id = %target_user_id, "Member removed");
        Ok(())
    }

    // The row can disappear between `ensure_modifiable` and the write.
    async fn write_role<C: sea_orm::ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        target_user_id: Uuid,
        role: Role,
    ) -> Result<(), MemberError> {
        if MemberRepository::update_role(conn, account_id, target_user_id, role).await? {
            Ok(())
        } else {
            Err(MemberError::MemberNotFound)
        }
    }

    async fn delete_membership<C: sea_orm::ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<(), MemberError> {
        if MemberRepository::remove(conn, account_id, target_user_id).await? {
            Ok(())
        } else {
            Err(MemberError::MemberNotFound)
        }
    }

    async fn ensure_modifiable<C: sea_orm::ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        target_user_id: Uuid,
    ) -> Result<(), MemberError> {
        let Membership::Member(target_role) =
            MemberRepository::membership(conn, account_id, target_user_id).await?
        else {
            return Err(MemberError::MemberNotFound);
        };

        match may_modify_membership(target_role) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                tracing::warn!(
                    account_id = %account_id,
                    user_id = %target_user_id,
                    "Attempt to modify owner membership"
                );
                Err(MemberError::OwnerImmutable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::migration::Migrator;
    use crate::repositories::{AccountRepository, CreateAccountInput};

    async fn setup() -> (DatabaseConnection, Uuid, Uuid) {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let owner = UserRepository::create(&db, "owner@example.com", "hash")
            .await
            .unwrap();
        let member = UserRepository::create(&db, "member@example.com", "hash")
            .await
            .unwrap();
        let account = AccountRepository::create(
            &db,
            &CreateAccountInput {
                name: "Household".to_string(),
                description: None,
                owner_id: owner.id,
            },
        )
        .await
        .unwrap();
        MemberRepository::add(&db, account.id, member.id, Role::Viewer)
            .await
            .unwrap();

        (db, account.id, member.id)
    }

    #[tokio::test]
    async fn test_write_role_updates_existing_member() {
        let (db, account_id, user_id) = setup().await;

        MemberService::write_role(&db, account_id, user_id, Role::Admin)
            .await
            .unwrap();

        assert_eq!(
            MemberRepository::membership(&db, account_id, user_id)
                .await
                .unwrap(),
            Membership::Member(Role::Admin)
        );
    }

    #[tokio::test]
    async fn test_writes_fail_when_member_vanished() {
        let (db, account_id, user_id) = setup().await;
        // Removed by another request after the membership check.
        assert!(
            MemberRepository::remove(&db, account_id, user_id)
                .await
                .unwrap()
        );

        let role = MemberService::write_role(&db, account_id, user_id, Role::Admin).await;
        let removal = MemberService::delete_membership(&db, account_id, user_id).await;

        assert!(matches!(role, Err(MemberError::MemberNotFound)));
        assert!(matches!(removal, Err(MemberError::MemberNotFound)));
    }
}
