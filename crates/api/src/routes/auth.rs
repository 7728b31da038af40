//! Authentication routes: register, login, token refresh and logout.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;
use tally_shared::auth::{
    ChangePasswordRequest, LoginRequest, LogoutRequest, ProfileResponse, RefreshRequest,
    RegisterRequest,
};
use tally_shared::{AppError, TokenPair};

use crate::middleware::{ACCESS_TOKEN_COOKIE, AuthUser};
use crate::{ApiError, AppState, CookieSettings, extractors::ValidatedJson};

/// Name of the cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Creates the public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Creates the auth routes that require an access token.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/change-password", post(change_password))
        .route("/auth/profile", get(profile))
}

/// POST /auth/register - Create a user and sign them in.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, pair) = state.auth.register(&payload.email, &payload.password).await?;

    Ok((
        StatusCode::CREATED,
        with_token_cookies(jar, &pair, state.cookies),
        Json(pair),
    ))
}

/// POST /auth/login - Authenticate and issue a token pair.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, pair) = state.auth.login(&payload.email, &payload.password).await?;

    Ok((with_token_cookies(jar, &pair, state.cookies), Json(pair)))
}

/// POST /auth/refresh - Exchange a refresh token for a new pair.
///
/// The token is read from the JSON body, falling back to the
/// `refresh_token` cookie.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: RefreshRequest = optional_json(&body)?;
    let presented = payload
        .refresh_token
        .or_else(|| jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| ApiError(AppError::Unauthorized("refresh token is required".to_string())))?;

    let pair = state.auth.refresh(&presented).await?;

    Ok((with_token_cookies(jar, &pair, state.cookies), Json(pair)))
}

/// POST /auth/logout - Revoke the presented refresh token and clear cookies.
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: LogoutRequest = optional_json(&body)?;
    let presented = payload
        .refresh_token
        .or_else(|| jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()));

    if let Some(token) = presented {
        state.auth.revoke(auth.user_id(), &token).await?;
    }

    Ok((
        without_token_cookies(jar, state.cookies),
        Json(json!({ "message": "Logged out" })),
    ))
}

/// POST /auth/change-password - Replace the caller's password.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .change_password(auth.user_id(), &payload.new_password)
        .await?;

    Ok(Json(json!({ "message": "Password changed" })))
}

/// GET /auth/profile - The caller's ID and email.
async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.auth.profile(auth.user_id()).await?;

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email,
        created_at: user.created_at.with_timezone(&Utc),
    }))
}

/// Parses a JSON body that may be empty.
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| ApiError(AppError::Validation(e.to_string())))
}

fn token_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    settings: CookieSettings,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .build()
}

fn with_token_cookies(jar: CookieJar, pair: &TokenPair, settings: CookieSettings) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        "/",
        settings,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        "/auth",
        settings,
    ))
}

/// An empty, already-expired cookie that makes the browser drop `name`.
fn expired_cookie(
    name: &'static str,
    path: &'static str,
    settings: CookieSettings,
) -> Cookie<'static> {
    let mut cookie = token_cookie(name, String::new(), path, settings);
    cookie.make_removal();
    cookie
}

// `CookieJar::remove` only clears cookies the request carried.
fn without_token_cookies(jar: CookieJar, settings: CookieSettings) -> CookieJar {
    jar.add(expired_cookie(ACCESS_TOKEN_COOKIE, "/", settings))
        .add(expired_cookie(REFRESH_TOKEN_COOKIE, "/auth", settings))
}
