//! Shared account lifecycle.

use sea_orm::{DatabaseConnection, DbErr};
use tally_core::access::{Action, Role};
use tally_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::UnitOfWork;
use crate::entities::accounts;
use crate::repositories::{
    AccountRepository, AccountWithRole, CreateAccountInput, MemberRepository,
};
use crate::services::access::{AccessControl, AccessError};

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Missing account or insufficient role. The two are not distinguished.
    #[error("Access to account denied")]
    Forbidden,

    /// Invalid input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccessError> for AccountError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied { .. } => Self::Forbidden,
            AccessError::Database(e) => Self::Database(e),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Forbidden => Self::Forbidden("access to account denied".to_string()),
            AccountError::Validation(msg) => Self::Validation(msg),
            AccountError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Creates, reads and deletes shared accounts.
#[derive(Debug, Clone)]
pub struct AccountService {
    db: DatabaseConnection,
}

impl AccountService {
    /// Creates a new account service.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account and makes `owner_id` its owner.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for a blank name.
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> Result<accounts::Model, AccountError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::Validation("name must not be empty".to_string()));
        }

        let input = CreateAccountInput {
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            owner_id,
        };

        let uow = UnitOfWork::begin(&self.db).await?;
        let account = AccountRepository::create(uow.conn(), &input).await?;
        MemberRepository::add(uow.conn(), account.id, owner_id, Role::Owner).await?;
        uow.commit().await?;

        tracing::info!(account_id = %account.id, owner_id = %owner_id, "Account created");
        Ok(account)
    }

    /// Lists the accounts the user belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<AccountWithRole>, AccountError> {
        Ok(AccountRepository::list_for_user(&self.db, user_id).await?)
    }

    /// Returns an account the actor may view, with the actor's role.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Forbidden` for non-members and missing accounts.
    pub async fn get(
        &self,
        actor_id: Uuid,
        account_id: Uuid,
    ) -> Result<AccountWithRole, AccountError> {
        let role =
            AccessControl::require(&self.db, account_id, actor_id, Action::ViewAccount, None)
                .await?;

        let account = AccountRepository::find_by_id(&self.db, account_id)
            .await?
            .ok_or(AccountError::Forbidden)?;

        Ok(AccountWithRole { account, role })
    }

    /// Deletes an account with all its memberships and transactions.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Forbidden` unless the actor is the owner.
    pub async fn delete(&self, actor_id: Uuid, account_id: Uuid) -> Result<(), AccountError> {
        let uow = UnitOfWork::begin(&self.db).await?;

        AccessControl::require(uow.conn(), account_id, actor_id, Action::DeleteAccount, None)
            .await?;

        if !AccountRepository::delete_cascade(uow.conn(), account_id).await? {
            return Err(AccountError::Forbidden);
        }
        uow.commit().await?;

        tracing::info!(account_id = %account_id, actor_id = %actor_id, "Account deleted");
        Ok(())
    }
}
