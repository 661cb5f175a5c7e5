//! Sync queue entry model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::NoteId;

/// Kind of pending local mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

impl SyncAction {
    /// Stable string form used for the TEXT column and error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unknown sync action: {other}")),
        }
    }
}

/// Queue entry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEntryState {
    /// Awaiting (re)dispatch to the remote service
    Pending,
    /// Exceeded the retry cap; held for manual resolution
    Dead,
}

impl QueueEntryState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dead => "dead",
        }
    }
}

impl FromStr for QueueEntryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "dead" => Ok(Self::Dead),
            other => Err(format!("unknown queue entry state: {other}")),
        }
    }
}

/// One pending local mutation awaiting remote confirmation
///
/// Entries are appended in the same transaction as the local mutation they
/// describe and removed only after the remote service acknowledges them (or
/// answers with a terminal response). Entries for the same note must drain
/// in enqueue order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    /// Auto-increment row identifier
    pub id: i64,
    /// Mutation kind
    pub action: SyncAction,
    /// Target note
    pub note_id: NoteId,
    /// JSON payload: full snapshot for Create, field diff for Update, none
    /// for Delete
    pub payload: Option<String>,
    /// Enqueue timestamp (Unix ms)
    pub enqueued_at: i64,
    /// Failed dispatch attempts so far
    pub retry_count: i64,
    /// Backoff gate (Unix ms); 0 means immediately due
    pub next_attempt_at: i64,
    /// Lifecycle state
    pub state: QueueEntryState,
}

impl QueueEntry {
    /// Check whether the backoff gate has passed
    #[must_use]
    pub const fn is_due(&self, now_ms: i64) -> bool {
        self.next_attempt_at <= now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_string_round_trip() {
        for action in [SyncAction::Create, SyncAction::Update, SyncAction::Delete] {
            let parsed: SyncAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, action);
        }
    }

    #[test]
    fn test_action_rejects_unknown() {
        assert!("UPSERT".parse::<SyncAction>().is_err());
    }

    #[test]
    fn test_state_string_round_trip() {
        for state in [QueueEntryState::Pending, QueueEntryState::Dead] {
            let parsed: QueueEntryState = state.as_str().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_is_due_respects_backoff_gate() {
        let entry = QueueEntry {
            id: 1,
            action: SyncAction::Update,
            note_id: NoteId::new(),
            payload: None,
            enqueued_at: 1_000,
            retry_count: 1,
            next_attempt_at: 6_000,
            state: QueueEntryState::Pending,
        };
        assert!(!entry.is_due(5_999));
        assert!(entry.is_due(6_000));
    }
}
