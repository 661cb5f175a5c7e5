use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vibenotes")]
#[command(about = "Offline-first notes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: String,
        /// Note body
        #[arg(short, long, default_value = "")]
        content: String,
        /// Tag to attach (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Pin the note to the top of listings
        #[arg(long)]
        pin: bool,
    },
    /// List notes, pinned first then most recently updated
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Include archived notes
        #[arg(long)]
        archived: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit fields of an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body
        #[arg(long)]
        content: Option<String>,
        /// Replace tags (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Option<Vec<String>>,
        /// Pin or unpin the note
        #[arg(long, value_name = "BOOL")]
        pin: Option<bool>,
        /// Archive or unarchive the note
        #[arg(long, value_name = "BOOL")]
        archive: Option<bool>,
    },
    /// Delete an existing note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Sync with the remote note service
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show sync status: last sync time, queue depth, outstanding errors
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recently recorded version conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List dead-lettered queue entries awaiting manual resolution
    DeadLetters {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Return a dead-lettered entry to the pending queue
    Retry {
        /// Queue entry ID
        entry_id: i64,
    },
    /// Drop a dead-lettered entry permanently
    Discard {
        /// Queue entry ID
        entry_id: i64,
    },
}
