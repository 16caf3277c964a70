pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "replica-proxy")]
#[command(author, version, about = "Forwarding proxy CLI - relays /api/* to a personal chat backend")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/replica-proxy/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Start {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show resolved configuration and reachability of proxy and backend
    Status,

    /// Fetch the assistant's greeting from the backend
    Greet,

    /// Send a chat query to the backend and print the answer
    Ask {
        /// The question to send
        query: String,

        /// User id the query is attributed to
        #[arg(long, default_value = "cli")]
        user: String,

        /// Session id (random per invocation when omitted)
        #[arg(long)]
        session: Option<String>,
    },
}
