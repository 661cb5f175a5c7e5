//! Version conflict model

use serde::{Deserialize, Serialize};

/// Recorded divergence kept for user review after a local-wins resolution
///
/// Written by the download pass when it keeps a local copy whose version
/// ties the remote's while local mutations for the note are still pending —
/// the signature of two clients editing the same note concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConflict {
    /// Conflict row identifier
    pub id: i64,
    /// Note involved in the conflict
    pub note_id: String,
    /// Version of the local copy that was kept
    pub local_version: i64,
    /// Version of the remote copy that was rejected
    pub remote_version: i64,
    /// Detection timestamp (Unix ms)
    pub detected_at: i64,
    /// Resolution strategy name
    pub strategy: String,
}
