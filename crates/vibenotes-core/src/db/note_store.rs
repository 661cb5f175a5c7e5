//! Note store implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Note, NoteDraft, NoteId, NotePatch, SyncAction, VersionConflict};
use crate::remote::RemoteNote;
use crate::util::now_ms;

use super::queue_store;

/// Outcome of reconciling one remote note into local storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No local copy existed; the remote copy was inserted verbatim
    Inserted,
    /// The remote version was ahead; the local copy was overwritten
    Updated,
    /// The local copy was kept (version tie or local ahead)
    KeptLocal,
}

/// Trait for local note storage operations
///
/// Mutating operations append the matching sync queue entry in the same
/// transaction as the note write, so a crash can never record one without
/// the other.
pub trait NoteStore {
    /// Create a new note and enqueue its Create mutation
    fn create(&self, draft: NoteDraft) -> Result<Note>;

    /// Get a note by ID; missing notes are expected, not an error
    fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// All notes, pinned first then most recently updated
    fn get_all(&self) -> Result<Vec<Note>>;

    /// Merge a patch into a note and enqueue its Update mutation
    fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<Note>;

    /// Remove a note and enqueue its Delete mutation
    ///
    /// Deleting a nonexistent note is a no-op.
    fn delete(&self, id: &NoteId) -> Result<()>;

    /// Merge a remote note under the version-comparison rule
    ///
    /// Called only by the sync engine's download phase. Higher version
    /// wins; ties favor the existing local copy.
    fn reconcile(&self, remote: &RemoteNote) -> Result<ReconcileOutcome>;

    /// Record that a note's queued mutations have all been acknowledged
    fn mark_synced(&self, id: &NoteId) -> Result<()>;

    /// Recently recorded version conflicts, newest first
    fn list_conflicts(&self, limit: usize) -> Result<Vec<VersionConflict>>;
}

/// `SQLite` implementation of `NoteStore`
#[derive(Clone)]
pub struct SqliteNoteStore {
    db: Arc<Database>,
}

impl SqliteNoteStore {
    /// Create a new store over the shared database
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let id: String = row.get(0)?;
        let tags_json: String = row.get(3)?;
        Ok(Note {
            id: id.parse().unwrap_or_default(),
            title: row.get(1)?,
            content: row.get(2)?,
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            pinned: row.get::<_, i32>(4)? != 0,
            archived: row.get::<_, i32>(5)? != 0,
            version: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            synced_at: row.get(9)?,
        })
    }
}

impl NoteStore for SqliteNoteStore {
    fn create(&self, draft: NoteDraft) -> Result<Note> {
        let note = Note::new(draft);
        let snapshot = serde_json::to_string(&note)?;
        let tags = serde_json::to_string(&note.tags)?;

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO notes (id, title, content, tags, pinned, archived, version, created_at, updated_at, synced_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                note.id.as_str(),
                note.title,
                note.content,
                tags,
                i32::from(note.pinned),
                i32::from(note.archived),
                note.version,
                note.created_at,
                note.updated_at,
                note.synced_at,
            ],
        )?;
        queue_store::append_in_tx(
            &tx,
            SyncAction::Create,
            &note.id,
            Some(&snapshot),
            note.created_at,
        )?;
        tx.commit()?;

        tracing::debug!(note_id = %note.id, "created note");
        Ok(note)
    }

    fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let conn = self.db.lock();
        Ok(get_note(&conn, id)?)
    }

    fn get_all(&self) -> Result<Vec<Note>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, content, tags, pinned, archived, version, created_at, updated_at, synced_at
             FROM notes
             ORDER BY pinned DESC, updated_at DESC",
        )?;

        let notes = stmt
            .query_map([], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(notes)
    }

    fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<Note> {
        let payload = serde_json::to_string(patch)?;
        let now = now_ms();

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let Some(mut note) = get_note(&tx, id)? else {
            return Err(Error::NotFound(id.to_string()));
        };

        note.apply(patch);
        note.version += 1;
        note.updated_at = now;
        note.synced_at = None;

        let tags = serde_json::to_string(&note.tags)?;
        tx.execute(
            "UPDATE notes SET title = ?, content = ?, tags = ?, pinned = ?, archived = ?,
                              version = ?, updated_at = ?, synced_at = NULL
             WHERE id = ?",
            params![
                note.title,
                note.content,
                tags,
                i32::from(note.pinned),
                i32::from(note.archived),
                note.version,
                note.updated_at,
                id.as_str(),
            ],
        )?;
        queue_store::append_in_tx(&tx, SyncAction::Update, id, Some(&payload), now)?;
        tx.commit()?;

        tracing::debug!(note_id = %id, version = note.version, "updated note");
        Ok(note)
    }

    fn delete(&self, id: &NoteId) -> Result<()> {
        let now = now_ms();

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM notes WHERE id = ?", params![id.as_str()])?;
        if removed > 0 {
            queue_store::append_in_tx(&tx, SyncAction::Delete, id, None, now)?;
        }
        tx.commit()?;

        if removed > 0 {
            tracing::debug!(note_id = %id, "deleted note");
        }
        Ok(())
    }

    fn reconcile(&self, remote: &RemoteNote) -> Result<ReconcileOutcome> {
        let now = now_ms();

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;

        let outcome = match get_note(&tx, &remote.id)? {
            None => {
                put_remote(&tx, remote, now)?;
                ReconcileOutcome::Inserted
            }
            Some(local) if remote.version > local.version => {
                put_remote(&tx, remote, now)?;
                ReconcileOutcome::Updated
            }
            Some(local) => {
                // A tie while local mutations are still pending means another
                // client's write reached the server first; keep local, but
                // leave a trace the user can inspect.
                if remote.version == local.version
                    && queue_store::pending_count_in_tx(&tx, &remote.id)? > 0
                {
                    tx.execute(
                        "INSERT INTO sync_conflicts (note_id, local_version, remote_version, detected_at, strategy)
                         VALUES (?, ?, ?, ?, ?)",
                        params![
                            remote.id.as_str(),
                            local.version,
                            remote.version,
                            now,
                            "local-wins",
                        ],
                    )?;
                    tracing::warn!(
                        note_id = %remote.id,
                        version = local.version,
                        "version tie with pending local edits, keeping local copy"
                    );
                }
                ReconcileOutcome::KeptLocal
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn mark_synced(&self, id: &NoteId) -> Result<()> {
        let conn = self.db.lock();
        // The note may have been deleted locally since the entry was queued
        conn.execute(
            "UPDATE notes SET synced_at = ? WHERE id = ?",
            params![now_ms(), id.as_str()],
        )?;
        Ok(())
    }

    fn list_conflicts(&self, limit: usize) -> Result<Vec<VersionConflict>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT id, note_id, local_version, remote_version, detected_at, strategy
             FROM sync_conflicts
             ORDER BY detected_at DESC, id DESC
             LIMIT ?",
        )?;

        let conflicts = stmt
            .query_map(params![limit as i64], |row| {
                Ok(VersionConflict {
                    id: row.get(0)?,
                    note_id: row.get(1)?,
                    local_version: row.get(2)?,
                    remote_version: row.get(3)?,
                    detected_at: row.get(4)?,
                    strategy: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(conflicts)
    }
}

/// Fetch one note inside a caller-managed transaction (or plain connection)
fn get_note(conn: &Connection, id: &NoteId) -> rusqlite::Result<Option<Note>> {
    conn.query_row(
        "SELECT id, title, content, tags, pinned, archived, version, created_at, updated_at, synced_at
         FROM notes WHERE id = ?",
        params![id.as_str()],
        SqliteNoteStore::parse_note,
    )
    .optional()
}

/// Insert or overwrite a local row with the remote copy, marking it synced
fn put_remote(conn: &Connection, remote: &RemoteNote, synced_at: i64) -> rusqlite::Result<()> {
    let tags = serde_json::to_string(&remote.tags).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT OR REPLACE INTO notes (id, title, content, tags, pinned, archived, version, created_at, updated_at, synced_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            remote.id.as_str(),
            remote.title,
            remote.content,
            tags,
            i32::from(remote.pinned),
            i32::from(remote.archived),
            remote.version,
            remote.created_at,
            remote.updated_at,
            synced_at,
        ],
    )?;
    Ok(())
}
