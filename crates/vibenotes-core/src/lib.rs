//! vibenotes-core - Core library for VibeNotes
//!
//! Offline-first note storage and synchronization: notes commit to a local
//! SQLite database together with a durable queue of pending mutations, and
//! the sync engine opportunistically drains that queue against the remote
//! note service and reconciles the authoritative remote set back into local
//! storage.

pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod sync;
mod util;

pub use error::{Error, Result};
pub use models::{Note, NoteId};
