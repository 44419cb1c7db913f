use sea_orm::{ConnectOptions, Database};
use vigil_common::VigilConfigStore;
use vigil_core::Services;
use vigil_db_migrations::migrate_database;

/// Wire the full service stack over a fresh in-memory SQLite database.
/// A single pooled connection keeps every query on the same database.
pub async fn test_services() -> Services {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    migrate_database(&db).await.expect("run migrations");

    Services::from_connection(db, &VigilConfigStore::default())
        .await
        .expect("wire services")
}
