//! Transaction routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::periodic::Period;
use tally_core::transaction::{TransactionFilter, TransactionKind};
use tally_db::entities::transactions;
use tally_db::repositories::UpdateTransactionInput;
use tally_db::services::NewTransaction;
use tally_shared::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    ApiError, AppState,
    extractors::{QueryParams, ValidatedJson},
    middleware::AuthUser,
};

/// Creates the transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/{account_id}/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transactions/{transaction_id}",
            patch(update_transaction).delete(delete_transaction),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Inclusive lower bound (RFC 3339).
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound (RFC 3339).
    pub date_to: Option<DateTime<Utc>>,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Categories; repeat the key for several.
    #[serde(default)]
    pub category: Vec<String>,
    /// Only periodic (`true`) or one-off (`false`) transactions.
    pub is_periodic: Option<bool>,
    /// Only transactions created by this user.
    pub user_id: Option<Uuid>,
}

impl TryFrom<ListTransactionsQuery> for TransactionFilter {
    type Error = AppError;

    fn try_from(query: ListTransactionsQuery) -> Result<Self, Self::Error> {
        let kind = query
            .kind
            .as_deref()
            .map(str::parse::<TransactionKind>)
            .transpose()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(Self {
            date_from: query.date_from,
            date_to: query.date_to,
            kind,
            categories: query.category,
            is_periodic: query.is_periodic,
            user_id: query.user_id,
        })
    }
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    /// Title.
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub title: String,
    /// Signed amount, e.g. `"-1500.50"`; positive is income.
    pub amount: Decimal,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Optional category.
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub category: Option<String>,
    /// `day`, `week`, `month` or `year` to create a recurring series.
    pub period: Option<Period>,
}

/// Request body for updating a transaction. The period cannot be changed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTransactionRequest {
    /// New title.
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub title: Option<String>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New occurrence time.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Creating user.
    pub user_id: Uuid,
    /// Title.
    pub title: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Occurrence time.
    pub occurred_at: DateTime<Utc>,
    /// Category.
    pub category: Option<String>,
    /// Recurrence period.
    pub period: Option<Period>,
    /// Whether the row belongs to a periodic series.
    pub is_periodic: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(model: transactions::Model) -> Self {
        let period = model.period.map(Period::from);

        Self {
            id: model.id,
            account_id: model.account_id,
            user_id: model.user_id,
            title: model.title,
            amount: model.amount,
            occurred_at: model.occurred_at.with_timezone(&Utc),
            category: model.category,
            period,
            is_periodic: period.is_some(),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Response for a create call.
#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    /// ID of the first (or only) row.
    pub id: Uuid,
    /// Number of rows written.
    pub count: u64,
    /// The first row.
    pub transaction: TransactionResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/accounts/{account_id}/transactions` - Filtered listing, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
    QueryParams(query): QueryParams<ListTransactionsQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let filter = TransactionFilter::try_from(query)?;

    let rows = state
        .transactions
        .list(auth.user_id(), account_id, &filter)
        .await?;

    Ok(Json(rows.into_iter().map(TransactionResponse::from).collect()))
}

/// POST `/accounts/{account_id}/transactions` - Record a transaction or a
/// periodic series.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .transactions
        .create(
            auth.user_id(),
            account_id,
            NewTransaction {
                amount: payload.amount,
                title: payload.title,
                category: payload.category,
                occurred_at: payload.occurred_at,
                period: payload.period,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTransactionResponse {
            id: created.first.id,
            count: created.count,
            transaction: created.first.into(),
        }),
    ))
}

/// PATCH `/transactions/{transaction_id}` - Edit title, amount or date.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let updated = state
        .transactions
        .update(
            auth.user_id(),
            transaction_id,
            UpdateTransactionInput {
                title: payload.title,
                amount: payload.amount,
                occurred_at: payload.occurred_at,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// DELETE `/transactions/{transaction_id}` - Delete one row.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .transactions
        .delete(auth.user_id(), transaction_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
