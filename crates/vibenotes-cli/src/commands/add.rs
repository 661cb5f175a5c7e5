use std::path::Path;

use vibenotes_core::db::{NoteStore, SqliteNoteStore};
use vibenotes_core::models::NoteDraft;

use crate::commands::common::open_database;
use crate::error::CliError;

pub fn run_add(
    title: &str,
    content: &str,
    tags: &[String],
    pin: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CliError::EmptyTitle);
    }

    let db = open_database(db_path)?;
    let store = SqliteNoteStore::new(db);
    let note = store.create(NoteDraft {
        title: title.to_string(),
        content: content.to_string(),
        tags: tags.to_vec(),
        pinned: pin,
        archived: false,
    })?;

    println!("{}", note.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vibenotes_core::db::{SqliteSyncQueue, SyncQueueStore};

    #[test]
    fn add_rejects_blank_title() {
        let dir = tempdir().unwrap();
        let result = run_add("   ", "", &[], false, &dir.path().join("notes.db"));
        assert!(matches!(result, Err(CliError::EmptyTitle)));
    }

    #[test]
    fn add_persists_note_and_queues_create() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("notes.db");

        run_add(
            "Buy milk",
            "2%",
            &["errands".to_string()],
            true,
            &db_path,
        )
        .unwrap();

        let db = open_database(&db_path).unwrap();
        let store = SqliteNoteStore::new(db.clone());
        let queue = SqliteSyncQueue::new(db);

        let notes = store.get_all().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Buy milk");
        assert!(notes[0].pinned);
        assert_eq!(queue.peek_all_ordered().unwrap().len(), 1);
    }
}
