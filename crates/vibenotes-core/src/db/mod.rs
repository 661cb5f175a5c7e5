//! Database layer for VibeNotes

mod connection;
mod migrations;
mod note_store;
pub(crate) mod queue_store;
mod settings_store;

pub use connection::Database;
pub use note_store::{NoteStore, ReconcileOutcome, SqliteNoteStore};
pub use queue_store::{backoff_ms, SqliteSyncQueue, SyncQueueStore, MAX_SYNC_ATTEMPTS};
pub use settings_store::SqliteSettingsStore;
