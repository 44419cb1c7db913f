use std::net::IpAddr;

use anyhow::Result;
use tracing::info;
use vigil_core::Services;

use crate::config::load_config;
use crate::Cli;

pub async fn command(cli: &Cli, ip: &str) -> Result<()> {
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| anyhow::anyhow!("{ip} is not a valid IP address"))?;

    let config = load_config(&cli.config)?;
    let services = Services::new(&config).await?;

    if services.ip_blocks.unblock(&ip, None).await? {
        info!(%ip, "Block lifted");
    } else {
        info!(%ip, "No active block for this address");
    }
    Ok(())
}
