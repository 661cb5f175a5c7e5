use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use vibenotes_core::db::{
    NoteStore, SqliteNoteStore, SqliteSettingsStore, SqliteSyncQueue, SyncQueueStore,
};
use vibenotes_core::models::{QueueEntry, VersionConflict};
use vibenotes_core::remote::HttpNoteClient;
use vibenotes_core::sync::{ConnectivityMonitor, SyncEngine};

use crate::commands::common::{format_relative_time, open_database};
use crate::config::credentials_from_env;
use crate::error::CliError;

pub async fn run_sync(db_path: &Path) -> Result<(), CliError> {
    let credentials = credentials_from_env()?;
    let client = HttpNoteClient::new(credentials)?;
    let db = open_database(db_path)?;

    // One-shot process: assume connectivity and let failing requests surface
    // in the report instead of short-circuiting
    let monitor = ConnectivityMonitor::new(true);
    let engine = SyncEngine::new(db, client, monitor);

    let report = engine.full_sync().await?;
    if report.success {
        println!(
            "Sync completed: pushed {}, pulled {}, deferred {}",
            report.pushed, report.pulled, report.deferred
        );
    } else {
        println!("Sync finished with {} error(s):", report.errors.len());
        for error in &report.errors {
            println!("  {error}");
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SyncStatusItem {
    last_sync_at: Option<i64>,
    pending_entries: usize,
    dead_entries: usize,
}

pub fn run_sync_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let queue = SqliteSyncQueue::new(db.clone());
    let settings = SqliteSettingsStore::new(db);

    let status = SyncStatusItem {
        last_sync_at: settings.last_sync_at()?,
        pending_entries: queue.peek_all_ordered()?.len(),
        dead_entries: queue.dead_letters()?.len(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let now_ms = Utc::now().timestamp_millis();
    match status.last_sync_at {
        Some(timestamp) => {
            println!("Last sync: {}", format_relative_time(timestamp, now_ms));
        }
        None => println!("Last sync: never"),
    }
    println!("Pending queue entries: {}", status.pending_entries);
    println!("Dead-lettered entries: {}", status.dead_entries);
    Ok(())
}

pub fn run_sync_conflicts(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = SqliteNoteStore::new(db);
    let conflicts = store.list_conflicts(limit)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&conflicts)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No version conflicts recorded.");
        return Ok(());
    }

    let now_ms = Utc::now().timestamp_millis();
    for line in format_conflict_lines(&conflicts, now_ms) {
        println!("{line}");
    }
    Ok(())
}

pub fn run_dead_letters(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let queue = SqliteSyncQueue::new(db);
    let dead = queue.dead_letters()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&dead)?);
        return Ok(());
    }

    if dead.is_empty() {
        println!("No dead-lettered entries.");
        return Ok(());
    }

    for line in format_dead_letter_lines(&dead) {
        println!("{line}");
    }
    Ok(())
}

pub fn run_retry(entry_id: i64, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let queue = SqliteSyncQueue::new(db);

    if !queue.requeue(entry_id)? {
        return Err(CliError::UnknownDeadLetter(entry_id));
    }
    println!("Entry {entry_id} returned to the pending queue");
    Ok(())
}

pub fn run_discard(entry_id: i64, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let queue = SqliteSyncQueue::new(db);

    let is_dead = queue
        .dead_letters()?
        .iter()
        .any(|entry| entry.id == entry_id);
    if !is_dead {
        return Err(CliError::UnknownDeadLetter(entry_id));
    }

    queue.remove(entry_id)?;
    println!("Entry {entry_id} discarded");
    Ok(())
}

fn format_conflict_lines(conflicts: &[VersionConflict], now_ms: i64) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let note_short: String = conflict.note_id.chars().take(13).collect();
            format!(
                "{note_short:<13}  kept local v{} over remote v{}  ({}, {})",
                conflict.local_version,
                conflict.remote_version,
                conflict.strategy,
                format_relative_time(conflict.detected_at, now_ms),
            )
        })
        .collect()
}

fn format_dead_letter_lines(entries: &[QueueEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let note_short: String = entry.note_id.as_str().chars().take(13).collect();
            format!(
                "{:<6} {:<7} {note_short:<13}  retries={}",
                entry.id,
                entry.action.as_str(),
                entry.retry_count,
            )
        })
        .collect()
}
