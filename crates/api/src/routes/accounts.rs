//! Shared account routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::access::Role;
use tally_db::entities::accounts;
use tally_db::repositories::AccountWithRole;
use uuid::Uuid;
use validator::Validate;

use crate::{ApiError, AppState, extractors::ValidatedJson, middleware::AuthUser};

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{account_id}",
            get(get_account).delete(delete_account),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Account name.
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// An account as seen by one of its members.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Account name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Owner's user ID.
    pub owner_id: Uuid,
    /// Caller's role.
    pub role: Role,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl AccountResponse {
    fn new(account: accounts::Model, role: Role) -> Self {
        Self {
            id: account.id,
            name: account.name,
            description: account.description,
            owner_id: account.owner_id,
            role,
            created_at: account.created_at.with_timezone(&Utc),
        }
    }
}

impl From<AccountWithRole> for AccountResponse {
    fn from(value: AccountWithRole) -> Self {
        Self::new(value.account, value.role)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /accounts - Accounts the caller belongs to.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state.accounts.list_for_user(auth.user_id()).await?;

    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// POST /accounts - Create an account owned by the caller.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts
        .create(auth.user_id(), &payload.name, payload.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse::new(account, Role::Owner)),
    ))
}

/// GET `/accounts/{account_id}` - Account details.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.accounts.get(auth.user_id(), account_id).await?;

    Ok(Json(account.into()))
}

/// DELETE `/accounts/{account_id}` - Delete an account with all its data.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.accounts.delete(auth.user_id(), account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
