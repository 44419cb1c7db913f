use anyhow::Result;
use tracing::info;
use vigil_core::db::cleanup_db;
use vigil_core::Services;

use crate::config::load_config;
use crate::Cli;

pub async fn command(cli: &Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let services = Services::new(&config).await?;

    let expired_blocks = services.ip_blocks.sweep_expired().await?;
    let expired_sessions = services.sessions.sweep_expired().await?;
    let retention = {
        let db = services.db.lock().await;
        cleanup_db(&*db, &config.store.retention).await?
    };

    info!(
        expired_blocks,
        expired_sessions,
        attempts_removed = retention.attempts_removed,
        events_removed = retention.events_removed,
        "Cleanup finished"
    );
    Ok(())
}
