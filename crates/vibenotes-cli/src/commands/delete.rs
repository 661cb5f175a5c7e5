use std::path::Path;

use vibenotes_core::db::{NoteStore, SqliteNoteStore};

use crate::commands::common::{open_database, resolve_note};
use crate::error::CliError;

pub fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = SqliteNoteStore::new(db);
    let note = resolve_note(&store, id)?;

    store.delete(&note.id)?;
    println!("{}", note.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vibenotes_core::db::{SqliteSyncQueue, SyncQueueStore};
    use vibenotes_core::models::{NoteDraft, SyncAction};

    #[test]
    fn delete_removes_note_and_queues_delete() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("notes.db");

        let db = open_database(&db_path).unwrap();
        let store = SqliteNoteStore::new(db);
        let note = store
            .create(NoteDraft {
                title: "Doomed".to_string(),
                ..NoteDraft::default()
            })
            .unwrap();

        run_delete(&note.id.as_str(), &db_path).unwrap();

        let db = open_database(&db_path).unwrap();
        let store = SqliteNoteStore::new(db.clone());
        let queue = SqliteSyncQueue::new(db);
        assert!(store.get(&note.id).unwrap().is_none());

        let entries = queue.peek_all_ordered().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action, SyncAction::Delete);
    }

    #[test]
    fn delete_unknown_id_fails_resolution() {
        let dir = tempdir().unwrap();
        let result = run_delete("missing", &dir.path().join("notes.db"));
        assert!(matches!(result, Err(CliError::NoteNotFound(_))));
    }
}
