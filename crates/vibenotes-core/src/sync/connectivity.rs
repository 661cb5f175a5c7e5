//! Connectivity monitoring and the auto-sync trigger

use std::sync::Arc;

use tokio::sync::watch;

use crate::remote::RemoteNoteService;
use crate::sync::engine::{SyncEngine, SyncReport};

/// Tracks whether the device currently has network connectivity
///
/// The boolean is fed by the embedding transport's signal through
/// [`set_online`](Self::set_online); there is no polling. Clones share the
/// same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial state
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            state: Arc::new(watch::Sender::new(online)),
        }
    }

    /// Current connectivity state
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Record a connectivity change reported by the transport
    pub fn set_online(&self, online: bool) {
        let was_online = self.state.send_replace(online);
        if was_online != online {
            tracing::debug!(online, "connectivity changed");
        }
    }

    /// Subscribe to connectivity transitions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Run one full sync per offline→online transition
///
/// The spawned task watches the monitor and hands each triggered sync's
/// report to `on_complete`. Manual syncs can still run at any time; the
/// engine serializes overlapping invocations internally.
pub fn spawn_auto_sync<R, F>(
    engine: Arc<SyncEngine<R>>,
    monitor: &ConnectivityMonitor,
    mut on_complete: F,
) -> tokio::task::JoinHandle<()>
where
    R: RemoteNoteService + 'static,
    F: FnMut(SyncReport) + Send + 'static,
{
    let mut receiver = monitor.subscribe();
    tokio::spawn(async move {
        let mut was_online = *receiver.borrow();
        while receiver.changed().await.is_ok() {
            let online = *receiver.borrow_and_update();
            if online && !was_online {
                tracing::info!("connectivity restored, starting full sync");
                match engine.full_sync().await {
                    Ok(report) => on_complete(report),
                    Err(error) => {
                        tracing::warn!("auto sync aborted on local storage fault: {error}");
                    }
                }
            }
            was_online = online;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_reports_state_changes() {
        let monitor = ConnectivityMonitor::new(false);
        assert!(!monitor.is_online());

        monitor.set_online(true);
        assert!(monitor.is_online());

        // Clones observe the same state
        let clone = monitor.clone();
        monitor.set_online(false);
        assert!(!clone.is_online());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_subscribers_see_transitions() {
        let monitor = ConnectivityMonitor::new(false);
        let mut receiver = monitor.subscribe();

        monitor.set_online(true);
        receiver.changed().await.unwrap();
        assert!(*receiver.borrow_and_update());
    }
}
