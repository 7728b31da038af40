//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed or expired access token, or bad credentials.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Unknown email or wrong password at login.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Bearer header and `access_token` cookie carry different tokens.
    #[error("Authorization header and cookie tokens differ")]
    TokenMismatch,

    /// Refresh token is unknown, revoked or expired.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Refresh token was already exchanged once.
    #[error("Token already used")]
    TokenAlreadyUsed,

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_)
            | Self::InvalidCredentials
            | Self::TokenMismatch
            | Self::InvalidToken(_)
            | Self::TokenAlreadyUsed => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::TokenMismatch => "token_mismatch",
            Self::InvalidToken(_) => "invalid_token",
            Self::TokenAlreadyUsed => "token_already_used",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Returns true for failures the caller cannot fix by changing the request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}
