//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tally_shared::AppError;
use uuid::Uuid;

use crate::{ApiError, AppState};

/// Name of the cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Picks the access token from the `Authorization` header and the
/// `access_token` cookie.
///
/// Either source may be used alone; when both are present they must carry the
/// same token.
fn presented_token(header: Option<&str>, cookie: Option<&str>) -> Result<String, AppError> {
    let header = match header {
        Some(value) => Some(extract_bearer_token(value).ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
        })?),
        None => None,
    };

    match (header, cookie) {
        (Some(h), Some(c)) if h != c => Err(AppError::TokenMismatch),
        (Some(token), _) | (None, Some(token)) => Ok(token.to_string()),
        (None, None) => Err(AppError::Unauthorized(
            "Bearer token or access_token cookie is required".to_string(),
        )),
    }
}

/// Authentication middleware that validates access tokens.
///
/// On success the caller's ID is stored in request extensions as
/// [`AuthUser`]. No database lookup is made.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let cookie = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value());

    let token = match presented_token(header, cookie) {
        Ok(token) => token,
        Err(e) => return ApiError(e).into_response(),
    };

    match state.auth.parse_access(&token) {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthUser(user_id));
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// The authenticated caller.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl AuthUser {
    /// Returns the caller's user ID.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| ApiError(AppError::Unauthorized("Authentication required".to_string())))
    }
}
