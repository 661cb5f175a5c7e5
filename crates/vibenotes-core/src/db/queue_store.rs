//! Sync queue repository implementation

use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::Database;
use crate::error::Result;
use crate::models::{NoteId, QueueEntry, QueueEntryState, SyncAction};
use crate::util::now_ms;

/// Maximum dispatch attempts before an entry is dead-lettered
pub const MAX_SYNC_ATTEMPTS: i64 = 5;

/// Exponential backoff delay in milliseconds with a capped exponent
#[must_use]
pub fn backoff_ms(retry_count: i64) -> i64 {
    const MAX_EXPONENT: i64 = 8;
    const BASE_DELAY_MS: i64 = 5_000;

    let capped = retry_count.clamp(0, MAX_EXPONENT);
    2_i64.pow(capped as u32) * BASE_DELAY_MS
}

/// Trait for sync queue storage operations
///
/// The queue is an ordered durable log of local mutations not yet confirmed
/// by the remote service. Entries for the same note must drain in enqueue
/// order; the queue as a whole drains oldest-first.
pub trait SyncQueueStore {
    /// Append a pending mutation; local-only, no network dependency
    fn append(&self, action: SyncAction, note_id: &NoteId, payload: Option<&str>) -> Result<()>;

    /// Pending entries oldest-first; does not remove anything
    fn peek_all_ordered(&self) -> Result<Vec<QueueEntry>>;

    /// Remove one entry after confirmed remote acknowledgement (or manual
    /// discard of a dead letter)
    fn remove(&self, entry_id: i64) -> Result<()>;

    /// Bump retry bookkeeping and advance the backoff gate; transitions the
    /// entry to dead once the retry cap is reached
    fn increment_retry(&self, entry_id: i64) -> Result<()>;

    /// Number of pending entries referencing one note
    fn pending_for(&self, note_id: &NoteId) -> Result<i64>;

    /// Dead-lettered entries awaiting manual resolution, oldest first
    fn dead_letters(&self) -> Result<Vec<QueueEntry>>;

    /// Notes that have at least one dead-lettered entry
    fn notes_with_dead_entries(&self) -> Result<Vec<NoteId>>;

    /// Return a dead-lettered entry to the pending queue
    ///
    /// Returns false when no dead entry with that ID exists.
    fn requeue(&self, entry_id: i64) -> Result<bool>;
}

/// `SQLite` implementation of `SyncQueueStore`
#[derive(Clone)]
pub struct SqliteSyncQueue {
    db: Arc<Database>,
}

impl SqliteSyncQueue {
    /// Create a new queue over the shared database
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Parse a queue entry from a database row
    fn parse_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueEntry> {
        let action: String = row.get(1)?;
        let note_id: String = row.get(2)?;
        let state: String = row.get(7)?;
        Ok(QueueEntry {
            id: row.get(0)?,
            action: action.parse::<SyncAction>().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    error.into(),
                )
            })?,
            note_id: note_id.parse().unwrap_or_default(),
            payload: row.get(3)?,
            enqueued_at: row.get(4)?,
            retry_count: row.get(5)?,
            next_attempt_at: row.get(6)?,
            state: state.parse::<QueueEntryState>().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    error.into(),
                )
            })?,
        })
    }

    fn select_by_state(&self, state: QueueEntryState) -> Result<Vec<QueueEntry>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT id, action, note_id, payload, enqueued_at, retry_count, next_attempt_at, state
             FROM sync_queue
             WHERE state = ?
             ORDER BY enqueued_at ASC, id ASC",
        )?;

        let entries = stmt
            .query_map(params![state.as_str()], Self::parse_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }
}

impl SyncQueueStore for SqliteSyncQueue {
    fn append(&self, action: SyncAction, note_id: &NoteId, payload: Option<&str>) -> Result<()> {
        let conn = self.db.lock();
        append_in_tx(&conn, action, note_id, payload, now_ms())?;
        Ok(())
    }

    fn peek_all_ordered(&self) -> Result<Vec<QueueEntry>> {
        self.select_by_state(QueueEntryState::Pending)
    }

    fn remove(&self, entry_id: i64) -> Result<()> {
        let conn = self.db.lock();
        conn.execute("DELETE FROM sync_queue WHERE id = ?", params![entry_id])?;
        Ok(())
    }

    fn increment_retry(&self, entry_id: i64) -> Result<()> {
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;

        let retries: Option<i64> = tx
            .query_row(
                "SELECT retry_count FROM sync_queue WHERE id = ?",
                params![entry_id],
                |row| row.get(0),
            )
            .optional()?;

        // Entry may have been removed concurrently; nothing to bump then
        let Some(retries) = retries else {
            return Ok(());
        };

        let retries = retries + 1;
        let next_attempt_at = now_ms() + backoff_ms(retries);

        if retries >= MAX_SYNC_ATTEMPTS {
            tx.execute(
                "UPDATE sync_queue SET retry_count = ?, next_attempt_at = ?, state = 'dead' WHERE id = ?",
                params![retries, next_attempt_at, entry_id],
            )?;
            tracing::warn!(entry_id, retries, "queue entry reached retry cap, dead-lettered");
        } else {
            tx.execute(
                "UPDATE sync_queue SET retry_count = ?, next_attempt_at = ? WHERE id = ?",
                params![retries, next_attempt_at, entry_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn pending_for(&self, note_id: &NoteId) -> Result<i64> {
        let conn = self.db.lock();
        Ok(pending_count_in_tx(&conn, note_id)?)
    }

    fn dead_letters(&self) -> Result<Vec<QueueEntry>> {
        self.select_by_state(QueueEntryState::Dead)
    }

    fn notes_with_dead_entries(&self) -> Result<Vec<NoteId>> {
        let conn = self.db.lock();
        let mut stmt =
            conn.prepare("SELECT DISTINCT note_id FROM sync_queue WHERE state = 'dead'")?;

        let ids = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                Ok(id.parse().unwrap_or_default())
            })?
            .collect::<rusqlite::Result<Vec<NoteId>>>()?;

        Ok(ids)
    }

    fn requeue(&self, entry_id: i64) -> Result<bool> {
        let conn = self.db.lock();
        let updated = conn.execute(
            "UPDATE sync_queue SET state = 'pending', retry_count = 0, next_attempt_at = 0
             WHERE id = ? AND state = 'dead'",
            params![entry_id],
        )?;
        Ok(updated > 0)
    }
}

/// Append a queue entry inside a caller-managed transaction
///
/// Used by the note store so a local mutation and its queue entry commit as
/// one unit.
pub(crate) fn append_in_tx(
    conn: &Connection,
    action: SyncAction,
    note_id: &NoteId,
    payload: Option<&str>,
    now_ms: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO sync_queue (action, note_id, payload, enqueued_at, retry_count, next_attempt_at, state)
         VALUES (?, ?, ?, ?, 0, 0, 'pending')",
        params![action.as_str(), note_id.as_str(), payload, now_ms],
    )?;
    Ok(())
}

/// Count pending entries for one note inside a caller-managed transaction
pub(crate) fn pending_count_in_tx(conn: &Connection, note_id: &NoteId) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM sync_queue WHERE note_id = ? AND state = 'pending'",
        params![note_id.as_str()],
        |row| row.get(0),
    )
}
