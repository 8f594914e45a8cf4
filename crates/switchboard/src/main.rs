use clap::Parser;
use eyre::Result;

use switchboard::cli::{Cli, Commands};
use switchboard::commands::{Command, replay::ReplayCommand, sessions::SessionsCommand};
use switchboard_client::ClientConfig;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Level configured via RUST_LOG
    switchboard::utils::tracing::init_tracing()?;

    match cli.command {
        Commands::Replay {
            events,
            snapshot,
            session,
            pretty,
        } => {
            let config = ClientConfig::load().unwrap_or_else(|e| {
                warn!(target: "switchboard.cli", "Failed to load client config: {e}");
                ClientConfig::default()
            });
            let command = ReplayCommand {
                events,
                snapshot,
                session,
                pretty,
                config,
            };
            command.execute().await
        }
        Commands::Sessions { snapshot } => SessionsCommand { snapshot }.execute().await,
    }
}
