pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feedticker")]
#[command(about = "Relays new RSS/Atom items to IRC channels", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/feedticker/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll feeds and relay new items (default)
    Run,
    /// Validate the configuration and print a summary
    Check,
    /// Fetch feeds once and print every item as it would be relayed
    Preview {
        /// Feeds to preview (default: the configured ones)
        urls: Vec<String>,
        /// Message pattern to use instead of the configured formatter
        #[arg(short, long)]
        pattern: Option<String>,
    },
    /// Write a commented default configuration file
    Init,
}
