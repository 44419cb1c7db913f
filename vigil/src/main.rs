mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Path to the config file
    #[clap(long, short, default_value = "vigil.yaml")]
    config: PathBuf,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the maintenance daemon
    Run,
    /// Validate the config file
    Check,
    /// Run the expiry sweeps and retention cleanup once
    Cleanup,
    /// Lift a block on an IP address
    UnblockIp { ip: String },
    /// List or revoke a user's sessions
    Sessions {
        user_id: String,
        #[clap(long)]
        revoke_all: bool,
    },
}

fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "vigil=info")
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run => commands::run::command(&cli).await,
        Commands::Check => commands::check::command(&cli).await,
        Commands::Cleanup => commands::cleanup::command(&cli).await,
        Commands::UnblockIp { ip } => commands::unblock_ip::command(&cli, ip).await,
        Commands::Sessions {
            user_id,
            revoke_all,
        } => commands::sessions::command(&cli, user_id, *revoke_all).await,
    }
}
