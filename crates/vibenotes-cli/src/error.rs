use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] vibenotes_core::Error),
    #[error(transparent)]
    Api(#[from] vibenotes_core::remote::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Note title cannot be empty")]
    EmptyTitle,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("No fields to update; pass at least one of --title/--content/--tag/--pin/--archive")]
    EmptyPatch,
    #[error("Queue entry {0} is not dead-lettered")]
    UnknownDeadLetter(i64),
    #[error(
        "Sync is not configured. Set VIBENOTES_API_URL and VIBENOTES_API_TOKEN to enable `vibenotes sync`."
    )]
    SyncNotConfigured,
}
