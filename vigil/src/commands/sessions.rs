use anyhow::Result;
use tracing::info;
use uuid::Uuid;
use vigil_core::Services;

use crate::config::load_config;
use crate::Cli;

pub async fn command(cli: &Cli, user_id: &str, revoke_all: bool) -> Result<()> {
    let user_id: Uuid = user_id
        .parse()
        .map_err(|_| anyhow::anyhow!("{user_id} is not a valid user id"))?;

    let config = load_config(&cli.config)?;
    let services = Services::new(&config).await?;

    if revoke_all {
        let revoked = services.sessions.revoke_all(user_id).await?;
        info!(%user_id, revoked, "Sessions revoked");
        return Ok(());
    }

    let sessions = services.sessions.list_active(user_id).await?;
    if sessions.is_empty() {
        info!(%user_id, "No active sessions");
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {}  {}/{}/{}  last active {}  expires {}",
            session.id,
            session.remote_ip,
            session.device,
            session.browser,
            session.os,
            session.last_activity,
            session.expires_at
        );
    }
    Ok(())
}
