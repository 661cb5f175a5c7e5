//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::now_ms;

/// A unique identifier for a note, using UUID v7 (time-sortable)
///
/// IDs are assigned client-side at creation so notes can be created while
/// offline without a server round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note in the system
///
/// `version` starts at 1 and is bumped by exactly 1 on every accepted local
/// update; the server performs the authoritative increment on its copy.
/// `synced_at` is set only while the local copy is known to match the remote
/// copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Short display title
    pub title: String,
    /// Plain text body
    pub content: String,
    /// Tags in display order
    pub tags: Vec<String>,
    /// Pinned to the top of listings
    pub pinned: bool,
    /// Hidden from default listings
    pub archived: bool,
    /// Monotonic version counter (starts at 1)
    pub version: i64,
    /// Creation timestamp (Unix ms), immutable
    pub created_at: i64,
    /// Last local mutation timestamp (Unix ms)
    pub updated_at: i64,
    /// Last confirmed-in-sync timestamp (Unix ms), if any
    pub synced_at: Option<i64>,
}

impl Note {
    /// Create a new local note from a draft
    #[must_use]
    pub fn new(draft: NoteDraft) -> Self {
        let now = now_ms();
        Self {
            id: NoteId::new(),
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            pinned: draft.pinned,
            archived: draft.archived,
            version: 1,
            created_at: now,
            updated_at: now,
            synced_at: None,
        }
    }

    /// Merge the set fields of a patch into this note
    ///
    /// Does not touch version or timestamps; the store bumps those as part
    /// of the update transaction.
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
    }
}

/// Input for creating a note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub archived: bool,
}

/// Partial note update; only set fields are serialized
///
/// Serialized field names follow the remote service schema so the same JSON
/// doubles as the UPDATE queue payload and the PUT request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        rename = "isPinned",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pinned: Option<bool>,
    #[serde(
        rename = "isArchived",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub archived: Option<bool>,
}

impl NotePatch {
    /// Check if the patch sets no fields at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.pinned.is_none()
            && self.archived.is_none()
    }
}
