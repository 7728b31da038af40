//! Registration, login and the refresh-token lifecycle.

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tally_core::auth::{PasswordError, hash_password, verify_dummy, verify_password};
use tally_core::token::{RefreshRejection, evaluate};
use tally_shared::{AppError, JwtError, JwtService, TokenPair};
use thiserror::Error;
use uuid::Uuid;

use crate::UnitOfWork;
use crate::entities::{refresh_tokens, users};
use crate::repositories::{RefreshTokenRepository, UserRepository, is_unique_violation};

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Email already registered.
    #[error("Email already registered")]
    EmailTaken,

    /// Refresh token unknown, revoked or expired.
    #[error("Refresh token is invalid")]
    InvalidRefreshToken,

    /// Refresh token was already exchanged.
    #[error("Refresh token already used")]
    TokenAlreadyUsed,

    /// Access token past its expiry.
    #[error("Access token expired")]
    AccessTokenExpired,

    /// Access token with a bad signature or format.
    #[error("Invalid access token")]
    InvalidAccessToken,

    /// User does not exist.
    #[error("User not found")]
    UserNotFound,

    /// Password hashing failed.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// Token signing failed.
    #[error("Token error: {0}")]
    Jwt(#[from] JwtError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::EmailTaken => Self::Conflict("email already registered".to_string()),
            AuthError::InvalidRefreshToken => {
                Self::InvalidToken("refresh token is invalid or expired".to_string())
            }
            AuthError::TokenAlreadyUsed => Self::TokenAlreadyUsed,
            AuthError::AccessTokenExpired => Self::Unauthorized("access token expired".to_string()),
            AuthError::InvalidAccessToken => Self::Unauthorized("invalid access token".to_string()),
            AuthError::UserNotFound => Self::NotFound("user not found".to_string()),
            AuthError::Password(e) => Self::Internal(e.to_string()),
            AuthError::Jwt(e) => Self::Internal(e.to_string()),
            AuthError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Issues and rotates token pairs.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: DatabaseConnection,
    jwt: JwtService,
}

impl AuthService {
    /// Creates a new auth service.
    #[must_use]
    pub const fn new(db: DatabaseConnection, jwt: JwtService) -> Self {
        Self { db, jwt }
    }

    /// Creates a user and issues the first token pair in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the email is registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(users::Model, TokenPair), AuthError> {
        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let uow = UnitOfWork::begin(&self.db).await?;

        if UserRepository::find_by_email(uow.conn(), &email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        let user = UserRepository::create(uow.conn(), &email, &password_hash)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::EmailTaken
                } else {
                    AuthError::Database(e)
                }
            })?;

        let pair = self.issue_pair(uow.conn(), user.id).await?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok((user, pair))
    }

    /// Verifies credentials and issues a token pair.
    ///
    /// Nothing is written when the credentials are wrong.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a wrong
    /// password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(users::Model, TokenPair), AuthError> {
        let email = normalize_email(email);

        let Some(user) = UserRepository::find_by_email(&self.db, &email).await? else {
            verify_dummy(password);
            tracing::info!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_pair(&self.db, user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, pair))
    }

    /// Exchanges a refresh token for a new pair.
    ///
    /// The presented token is consumed and the new pair is stored in the same
    /// transaction. Of several concurrent exchanges of one token exactly one
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenAlreadyUsed` for a replayed token and
    /// `AuthError::InvalidRefreshToken` for unknown, revoked or expired ones.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let token_hash = RefreshTokenRepository::hash_token(presented);

        let uow = UnitOfWork::begin(&self.db).await?;

        let Some(token) = RefreshTokenRepository::find_by_hash(uow.conn(), &token_hash).await?
        else {
            return Err(AuthError::InvalidRefreshToken);
        };

        let pair = self.rotate(uow.conn(), &token).await?;
        uow.commit().await?;

        tracing::debug!(user_id = %token.user_id, "Token pair rotated");
        Ok(pair)
    }

    /// Revokes one of the user's refresh tokens.
    ///
    /// Unknown, consumed and already-revoked tokens are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, user_id: Uuid, presented: &str) -> Result<(), AuthError> {
        let token_hash = RefreshTokenRepository::hash_token(presented);
        let revoked = RefreshTokenRepository::revoke(&self.db, user_id, &token_hash).await?;

        tracing::info!(user_id = %user_id, revoked, "Refresh token revoked");
        Ok(())
    }

    /// Rehashes and stores a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user does not exist.
    pub async fn change_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AuthError> {
        let password_hash = hash_password(new_password)?;

        if !UserRepository::update_password(&self.db, user_id, &password_hash).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Loads the user behind an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user does not exist.
    pub async fn profile(&self, user_id: Uuid) -> Result<users::Model, AuthError> {
        UserRepository::find_by_id(&self.db, user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Validates an access token and returns its subject.
    ///
    /// Checks signature and expiry only; no database round-trip.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccessTokenExpired` or
    /// `AuthError::InvalidAccessToken`.
    pub fn parse_access(&self, token: &str) -> Result<Uuid, AuthError> {
        self.jwt
            .validate_token(token)
            .map(|claims| claims.user_id())
            .map_err(|e| match e {
                JwtError::Expired => AuthError::AccessTokenExpired,
                _ => AuthError::InvalidAccessToken,
            })
    }

    /// Consumes `token` as loaded and issues its successor on `conn`.
    ///
    /// `token` may be stale: the conditional update decides the winner when
    /// another exchange consumed the row after it was read.
    async fn rotate<C: ConnectionTrait>(
        &self,
        conn: &C,
        token: &refresh_tokens::Model,
    ) -> Result<TokenPair, AuthError> {
        let state = evaluate(
            token.is_refreshed,
            token.revoked_at.map(|t| t.with_timezone(&Utc)),
            token.expires_at.with_timezone(&Utc),
            Utc::now(),
        );

        match state.ensure_exchangeable() {
            Ok(()) => {}
            Err(RefreshRejection::AlreadyUsed) => {
                tracing::warn!(
                    user_id = %token.user_id,
                    token_id = %token.id,
                    "Refresh token replay detected"
                );
                return Err(AuthError::TokenAlreadyUsed);
            }
            Err(RefreshRejection::Invalid) => return Err(AuthError::InvalidRefreshToken),
        }

        if !RefreshTokenRepository::mark_refreshed(conn, token.id).await? {
            tracing::warn!(
                user_id = %token.user_id,
                token_id = %token.id,
                "Refresh token consumed concurrently"
            );
            return Err(AuthError::TokenAlreadyUsed);
        }

        self.issue_pair(conn, token.user_id).await
    }

    /// Signs an access token and stores a fresh refresh token on `conn`.
    async fn issue_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<TokenPair, AuthError> {
        let access_token = self.jwt.generate_access_token(user_id)?;
        let refresh_token = RefreshTokenRepository::generate_token();
        let expires_at = Utc::now() + self.jwt.refresh_token_ttl();

        RefreshTokenRepository::create(
            conn,
            user_id,
            &RefreshTokenRepository::hash_token(&refresh_token),
            expires_at,
        )
        .await?;

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.jwt.access_token_expires_in(),
        ))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;
    use tally_shared::JwtConfig;

    use super::*;
    use crate::migration::Migrator;

    async fn service() -> AuthService {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let jwt = JwtService::new(JwtConfig {
            secret: "auth-service-unit-test-secret-key!!".to_string(),
            ..JwtConfig::default()
        });
        AuthService::new(db, jwt)
    }

    async fn stored(service: &AuthService, presented: &str) -> refresh_tokens::Model {
        RefreshTokenRepository::find_by_hash(
            &service.db,
            &RefreshTokenRepository::hash_token(presented),
        )
        .await
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn test_rotate_loses_when_consumed_after_lookup() {
        let service = service().await;
        let (user, pair) = service.register("race@example.com", "password123").await.unwrap();

        // Read by the loser before the winner's update lands.
        let stale = stored(&service, &pair.refresh_token).await;
        assert!(
            RefreshTokenRepository::mark_refreshed(&service.db, stale.id)
                .await
                .unwrap()
        );

        let err = service.rotate(&service.db, &stale).await.unwrap_err();

        assert!(matches!(err, AuthError::TokenAlreadyUsed));
        assert_eq!(
            RefreshTokenRepository::count_for_user(&service.db, user.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_rotate_loses_when_revoked_after_lookup() {
        let service = service().await;
        let (user, pair) = service.register("revoke@example.com", "password123").await.unwrap();

        let stale = stored(&service, &pair.refresh_token).await;
        service.revoke(user.id, &pair.refresh_token).await.unwrap();

        let result = service.rotate(&service.db, &stale).await;

        assert!(result.is_err());
        assert_eq!(
            RefreshTokenRepository::count_for_user(&service.db, user.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_rotate_fresh_token_issues_successor() {
        let service = service().await;
        let (user, pair) = service.register("fresh@example.com", "password123").await.unwrap();
        let token = stored(&service, &pair.refresh_token).await;

        let next = service.rotate(&service.db, &token).await.unwrap();

        assert_ne!(next.refresh_token, pair.refresh_token);
        assert!(stored(&service, &pair.refresh_token).await.is_refreshed);
        assert_eq!(
            RefreshTokenRepository::count_for_user(&service.db, user.id)
                .await
                .unwrap(),
            2
        );
    }
}
