pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "snoosync")]
#[command(about = "Offline-first subreddit subscription sync", long_about = None)]
pub struct Cli {
    /// Database file (default: <data dir>/snoosync/snoosync.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List subscriptions, fetching them first if none are cached
    List {
        /// Only show subreddits whose name contains this text
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Include hidden subreddits
        #[arg(long)]
        hidden: bool,
    },
    /// Print the listing again whenever it changes
    Watch {
        #[arg(short, long, default_value = "")]
        filter: String,

        #[arg(long)]
        hidden: bool,
    },
    /// Fetch subscriptions from Reddit and merge them into the cache
    Refresh,
    /// Subscribe to a subreddit
    Subscribe {
        name: String,
    },
    /// Unsubscribe from a subreddit
    Unsubscribe {
        name: String,
    },
    /// Hide a subreddit from the default listing
    Hide {
        name: String,
    },
    /// Show a previously hidden subreddit
    Unhide {
        name: String,
    },
    /// Retry subscribes and unsubscribes that failed earlier
    Sync,
    /// Remove every cached subscription
    Clear,
    /// Show or change the default subreddit
    Default {
        #[command(subcommand)]
        action: Option<DefaultAction>,
    },
    /// Periodically retry pending changes and refresh, in the foreground
    Daemon {
        /// Cycle interval (e.g., "30m", "1h"); defaults to the configured one
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the sync cycle on start
        #[arg(long)]
        no_initial_sync: bool,
    },
}

#[derive(Subcommand)]
pub enum DefaultAction {
    /// Print the default subreddit
    Get,
    /// Make a subscribed subreddit the default
    Set { name: String },
    /// Go back to the frontpage
    Reset,
}
