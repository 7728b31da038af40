//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_db::services::{AccountError, AuthError, MemberError, TransactionError};
use tally_shared::AppError;
use tracing::error;

/// An [`AppError`] rendered as `{"error": code, "message": msg}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

macro_rules! impl_from_domain_error {
    ($($err:ty),+ $(,)?) => {
        $(
            impl From<$err> for ApiError {
                fn from(err: $err) -> Self {
                    Self(err.into())
                }
            }
        )+
    };
}

impl_from_domain_error!(
    AppError,
    AuthError,
    AccountError,
    MemberError,
    TransactionError,
);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_internal() {
            error!(error = %self.0, "Request failed");
            "An internal error occurred".to_string()
        } else {
            message_of(&self.0)
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

fn message_of(err: &AppError) -> String {
    match err {
        AppError::Unauthorized(msg)
        | AppError::InvalidToken(msg)
        | AppError::Forbidden(msg)
        | AppError::NotFound(msg)
        | AppError::Validation(msg)
        | AppError::Conflict(msg) => msg.clone(),
        other => other.to_string(),
    }
}
