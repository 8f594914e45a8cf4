use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Replay and inspect Switchboard event streams", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Feed a newline-delimited event log through the session controller
    Replay {
        /// File with one raw server event per line
        events: PathBuf,
        /// JSON directory snapshot providing sessions, history and slash commands
        #[arg(long, env = "SWITCHBOARD_SNAPSHOT")]
        snapshot: Option<PathBuf>,
        /// Session to focus before replaying; defaults to a new chat
        #[arg(long)]
        session: Option<String>,
        /// Pretty-print the resulting state
        #[arg(long)]
        pretty: bool,
    },
    /// List the sessions recorded in a directory snapshot
    Sessions {
        snapshot: PathBuf,
    },
}
