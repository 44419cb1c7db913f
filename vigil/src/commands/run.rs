use anyhow::Result;
use tracing::info;
use vigil_core::Services;

use crate::config::load_config;
use crate::Cli;

pub async fn command(cli: &Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let services = Services::new(&config).await?;
    services.spawn_sweeps(&config.store);

    info!(
        sweep_interval = ?config.store.sweep_interval,
        retention = ?config.store.retention,
        "Maintenance daemon running"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
