use std::path::Path;

use vibenotes_core::db::{NoteStore, SqliteNoteStore};
use vibenotes_core::models::Note;

use crate::commands::common::{format_note_lines, note_to_list_item, open_database, NoteListItem};
use crate::error::CliError;

pub fn run_list(
    limit: usize,
    include_archived: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = SqliteNoteStore::new(db);

    let notes: Vec<Note> = store
        .get_all()?
        .into_iter()
        .filter(|note| include_archived || !note.archived)
        .take(limit)
        .collect();

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
