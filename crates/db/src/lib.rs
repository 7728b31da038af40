//! Database layer with `SeaORM` entities, repositories and domain services.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Stateless repositories for data access
//! - The [`UnitOfWork`] transaction scope
//! - Domain services that enforce access rules around the repositories
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod services;
pub mod unit_of_work;

pub use repositories::{
    AccountRepository, MemberRepository, RefreshTokenRepository, TransactionRepository,
    UserRepository,
};
pub use services::{AccountService, AuthService, MemberService, TransactionService};
pub use unit_of_work::UnitOfWork;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::config::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .sqlx_logging(false);

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );

    Database::connect(options).await
}
