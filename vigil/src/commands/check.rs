use anyhow::Result;
use tracing::info;

use crate::config::load_config;
use crate::Cli;

pub async fn command(cli: &Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    info!(
        database_url = ?config.store.database_url,
        block_cache_ttl = ?config.store.block_cache_ttl,
        "No problems found"
    );
    Ok(())
}
