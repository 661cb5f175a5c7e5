//! VibeNotes CLI - offline-first notes from the command line
//!
//! Notes always commit locally first; `vibenotes sync` drains the pending
//! mutation queue against the remote service and pulls its notes back down.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::config::resolve_db_path;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vibenotes_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Add {
            title,
            content,
            tags,
            pin,
        } => commands::add::run_add(&title, &content, &tags, pin, &db_path)?,
        Commands::List {
            limit,
            archived,
            json,
        } => commands::list::run_list(limit, archived, json, &db_path)?,
        Commands::Edit {
            id,
            title,
            content,
            tags,
            pin,
            archive,
        } => commands::edit::run_edit(&id, title, content, tags, pin, archive, &db_path)?,
        Commands::Delete { id } => commands::delete::run_delete(&id, &db_path)?,
        Commands::Sync { command } => match command {
            None => commands::sync::run_sync(&db_path).await?,
            Some(SyncCommands::Status { json }) => commands::sync::run_sync_status(json, &db_path)?,
            Some(SyncCommands::Conflicts { limit, json }) => {
                commands::sync::run_sync_conflicts(limit, json, &db_path)?;
            }
            Some(SyncCommands::DeadLetters { json }) => {
                commands::sync::run_dead_letters(json, &db_path)?;
            }
            Some(SyncCommands::Retry { entry_id }) => {
                commands::sync::run_retry(entry_id, &db_path)?;
            }
            Some(SyncCommands::Discard { entry_id }) => {
                commands::sync::run_discard(entry_id, &db_path)?;
            }
        },
    }

    Ok(())
}
