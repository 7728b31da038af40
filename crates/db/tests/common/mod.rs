//! Shared setup for database integration tests.

#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tally_db::{AccountService, AuthService, migration::Migrator};
use tally_shared::{JwtConfig, JwtService, TokenPair};
use uuid::Uuid;

/// Opens a migrated in-memory SQLite database.
///
/// The pool is pinned to one connection; every connection to `:memory:`
/// would otherwise see its own empty database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// JWT service with test settings.
pub fn jwt_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "integration-test-secret-key-32-bytes!".to_string(),
        ..JwtConfig::default()
    })
}

/// Auth service over `db`.
pub fn auth_service(db: &DatabaseConnection) -> AuthService {
    AuthService::new(db.clone(), jwt_service())
}

/// Registers a user and returns its ID and first token pair.
pub async fn register(db: &DatabaseConnection, email: &str) -> (Uuid, TokenPair) {
    let (user, pair) = auth_service(db)
        .register(email, "password123")
        .await
        .expect("Failed to register user");
    (user.id, pair)
}

/// Creates an account owned by `owner_id`.
pub async fn create_account(db: &DatabaseConnection, owner_id: Uuid, name: &str) -> Uuid {
    AccountService::new(db.clone())
        .create(owner_id, name, None)
        .await
        .expect("Failed to create account")
        .id
}
