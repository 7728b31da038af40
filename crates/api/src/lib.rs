//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tally_db::{AccountService, AuthService, MemberService, TransactionService};
use tally_shared::{AppConfig, JwtConfig, JwtService};

pub use error::ApiError;

/// Attributes of the auth cookies.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    /// Send cookies over HTTPS only.
    pub secure: bool,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and token rotation.
    pub auth: Arc<AuthService>,
    /// Account lifecycle.
    pub accounts: Arc<AccountService>,
    /// Membership management.
    pub members: Arc<MemberService>,
    /// Transactions and periodic series.
    pub transactions: Arc<TransactionService>,
    /// Auth cookie attributes.
    pub cookies: CookieSettings,
}

impl AppState {
    /// Wires the services over one connection pool.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_config: JwtConfig,
        cookie_secure: bool,
        series_length: usize,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(db.clone(), JwtService::new(jwt_config))),
            accounts: Arc::new(AccountService::new(db.clone())),
            members: Arc::new(MemberService::new(db.clone())),
            transactions: Arc::new(TransactionService::with_series_length(db, series_length)),
            cookies: CookieSettings {
                secure: cookie_secure,
            },
        }
    }

    /// Builds the state from loaded configuration.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &AppConfig) -> Self {
        Self::new(
            db,
            JwtConfig::from(&config.jwt),
            config.cookies.secure,
            config.transactions.periodic_series_length,
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
