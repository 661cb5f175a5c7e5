//! Shared command helpers: database opening, note resolution, rendering

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use vibenotes_core::db::{Database, NoteStore, SqliteNoteStore};
use vibenotes_core::models::Note;
use vibenotes_core::NoteId;

use crate::error::CliError;

pub fn open_database(path: &Path) -> Result<Arc<Database>, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!(path = %path.display(), "opening database");
    Ok(Arc::new(Database::open(path)?))
}

/// Resolve a note by exact ID or unique ID prefix
pub fn resolve_note(store: &SqliteNoteStore, query: &str) -> Result<Note, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::EmptyNoteId);
    }

    if let Ok(id) = query.parse::<NoteId>() {
        if let Some(note) = store.get(&id)? {
            return Ok(note);
        }
    }

    let mut matching: Vec<Note> = store
        .get_all()?
        .into_iter()
        .filter(|note| note.id.as_str().starts_with(query))
        .collect();

    match matching.len() {
        0 => Err(CliError::NoteNotFound(query.to_string())),
        1 => Ok(matching.remove(0)),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|note| short_id(&note.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub archived: bool,
    pub version: i64,
    pub updated_at: i64,
    pub relative_time: String,
    pub synced: bool,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        tags: note.tags.clone(),
        pinned: note.pinned,
        archived: note.archived,
        version: note.version,
        updated_at: note.updated_at,
        relative_time: format_relative_time(note.updated_at, now_ms),
        synced: note.synced_at.is_some(),
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(&note.id);
            let title = truncate(&note.title, 32);
            let relative_time = format_relative_time(note.updated_at, now_ms);
            let tags = render_tags(note);
            let marker = if note.pinned { "*" } else { " " };

            if tags.is_empty() {
                format!("{short_id:<13} {marker} {title:<32}  {relative_time}")
            } else {
                format!("{short_id:<13} {marker} {title:<32}  {relative_time:<10}  {tags}")
            }
        })
        .collect()
}

pub fn short_id(id: &NoteId) -> String {
    id.as_str().chars().take(13).collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn render_tags(note: &Note) -> String {
    note.tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
