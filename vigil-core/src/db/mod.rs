use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, TransactionTrait};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::*;
use vigil_common::helpers::fs::secure_file;
use vigil_common::VigilConfig;
use vigil_db_entities::{LoginAttempt, SecurityEvent};
use vigil_db_migrations::migrate_database;

pub async fn connect_to_db(config: &VigilConfig) -> Result<DatabaseConnection> {
    let mut url = url::Url::parse(&config.store.database_url.expose_secret()[..])?;
    if url.scheme() == "sqlite" && !url.path().contains(":memory:") {
        let path = url.path().trim_start_matches('/').to_owned();
        let mut abs_path = config.paths_relative_to.clone();
        abs_path.push(path);

        if let Some(parent) = abs_path.parent() {
            std::fs::create_dir_all(parent)?
        }

        url.set_path(
            abs_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Failed to convert database path to string"))?,
        );

        url.set_query(Some("mode=rwc"));

        let db = Database::connect(ConnectOptions::new(url.to_string())).await?;
        db.begin().await?.commit().await?;
        drop(db);

        secure_file(&abs_path)?;
    }

    let mut opt = ConnectOptions::new(url.to_string());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let connection = Database::connect(opt).await?;

    migrate_database(&connection).await?;
    Ok(connection)
}

/// Statistics from a retention cleanup pass
#[derive(Clone, Debug)]
pub struct RetentionStats {
    pub attempts_removed: u64,
    pub events_removed: u64,
}

/// Delete login attempts and security events older than the retention
/// period. Blocks, sessions and alerts are kept as state machines and are
/// never removed here.
pub async fn cleanup_db(db: &DatabaseConnection, retention: &Duration) -> Result<RetentionStats> {
    let cutoff = chrono::Utc::now() - chrono::Duration::from_std(*retention)?;

    let attempts = LoginAttempt::Entity::delete_many()
        .filter(LoginAttempt::Column::Timestamp.lt(cutoff))
        .exec(db)
        .await?;

    let events = SecurityEvent::Entity::delete_many()
        .filter(SecurityEvent::Column::Timestamp.lt(cutoff))
        .exec(db)
        .await?;

    let stats = RetentionStats {
        attempts_removed: attempts.rows_affected,
        events_removed: events.rows_affected,
    };

    if stats.attempts_removed > 0 || stats.events_removed > 0 {
        info!(
            attempts = stats.attempts_removed,
            events = stats.events_removed,
            "Retention cleanup completed"
        );
    }

    Ok(stats)
}
