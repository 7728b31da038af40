//! Schema migration tests on SQLite.

mod common;

use common::setup_db;
use sea_orm_migration::{MigratorTrait, SchemaManager};
use tally_db::migration::Migrator;

const TABLES: [&str; 5] = [
    "users",
    "accounts",
    "account_members",
    "transactions",
    "refresh_tokens",
];

#[tokio::test]
async fn test_migration_creates_schema_on_sqlite() {
    let db = setup_db().await;
    let manager = SchemaManager::new(&db);

    for table in TABLES {
        assert!(
            manager.has_table(table).await.unwrap(),
            "missing table {table}"
        );
    }
    assert!(
        manager
            .has_column("transactions", "amount")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_migration_down_then_up() {
    let db = setup_db().await;

    Migrator::down(&db, None).await.unwrap();
    let manager = SchemaManager::new(&db);
    for table in TABLES {
        assert!(!manager.has_table(table).await.unwrap());
    }

    Migrator::up(&db, None).await.unwrap();
    for table in TABLES {
        assert!(manager.has_table(table).await.unwrap());
    }
}
