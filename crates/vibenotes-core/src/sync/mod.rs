//! Offline-first synchronization: engine, reports, and connectivity

mod connectivity;
mod engine;

pub use connectivity::{spawn_auto_sync, ConnectivityMonitor};
pub use engine::{SyncEngine, SyncReport, SyncStatus, OFFLINE_ERROR};
