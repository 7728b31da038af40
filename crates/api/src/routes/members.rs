//! Account membership routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::access::Role;
use tally_db::repositories::MemberWithUser;
use uuid::Uuid;
use validator::Validate;

use crate::{ApiError, AppState, extractors::ValidatedJson, middleware::AuthUser};

/// Creates the member routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/{account_id}/members",
            get(list_members).post(invite_member),
        )
        .route(
            "/accounts/{account_id}/members/{user_id}",
            patch(change_role).delete(remove_member),
        )
}

/// Request body for inviting a member.
#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    /// Email of a registered user.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// `viewer`, `editor` or `admin`.
    pub role: String,
}

/// Request body for changing a member's role.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeRoleRequest {
    /// `viewer`, `editor` or `admin`.
    pub role: String,
}

/// A member of an account.
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    /// User ID.
    pub user_id: Uuid,
    /// User email.
    pub email: String,
    /// Role in the account.
    pub role: Role,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

impl From<MemberWithUser> for MemberResponse {
    fn from(member: MemberWithUser) -> Self {
        Self {
            user_id: member.user_id,
            email: member.email,
            role: member.role,
            joined_at: member.joined_at.with_timezone(&Utc),
        }
    }
}

/// GET `/accounts/{account_id}/members`
async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state.members.list(auth.user_id(), account_id).await?;

    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

/// POST `/accounts/{account_id}/members` - Invite a registered user by email.
async fn invite_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<InviteMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state
        .members
        .invite(auth.user_id(), account_id, &payload.email, &payload.role)
        .await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// PATCH `/accounts/{account_id}/members/{user_id}`
async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((account_id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(payload): ValidatedJson<ChangeRoleRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .members
        .change_role(auth.user_id(), account_id, user_id, &payload.role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE `/accounts/{account_id}/members/{user_id}`
async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((account_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .members
        .remove(auth.user_id(), account_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
