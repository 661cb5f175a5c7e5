use std::path::Path;

use vibenotes_core::db::{NoteStore, SqliteNoteStore};
use vibenotes_core::models::NotePatch;

use crate::commands::common::{open_database, resolve_note};
use crate::error::CliError;

pub fn run_edit(
    id: &str,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    pin: Option<bool>,
    archive: Option<bool>,
    db_path: &Path,
) -> Result<(), CliError> {
    let patch = NotePatch {
        title,
        content,
        tags,
        pinned: pin,
        archived: archive,
    };
    if patch.is_empty() {
        return Err(CliError::EmptyPatch);
    }

    let db = open_database(db_path)?;
    let store = SqliteNoteStore::new(db);
    let note = resolve_note(&store, id)?;
    let updated = store.update(&note.id, &patch)?;

    println!("{}", updated.id);
    Ok(())
}
