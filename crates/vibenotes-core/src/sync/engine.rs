//! Sync engine: queue drain (upload) and remote reconciliation (download)

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::db::{
    Database, NoteStore, ReconcileOutcome, SqliteNoteStore, SqliteSettingsStore, SqliteSyncQueue,
    SyncQueueStore,
};
use crate::error::Result;
use crate::models::{Note, NoteId, NotePatch, QueueEntry, SyncAction};
use crate::remote::{ApiError, RemoteNote, RemoteNoteService};
use crate::sync::ConnectivityMonitor;
use crate::util::now_ms;

/// Error reported when a sync pass is attempted without connectivity
pub const OFFLINE_ERROR: &str = "device is offline";

/// Result of one sync pass, or of a merged full sync
///
/// Remote failures are data here, never propagated errors; the caller (and
/// the UI behind it) stays usable through partial failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// True when the pass recorded no errors
    pub success: bool,
    /// Human-readable failure descriptions, one per failed step
    pub errors: Vec<String>,
    /// Queue entries acknowledged by the remote service
    pub pushed: usize,
    /// Remote notes inserted or overwritten locally
    pub pulled: usize,
    /// Queue entries held back (backoff window or a blocked note)
    pub deferred: usize,
}

impl SyncReport {
    fn clean() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            pushed: 0,
            pulled: 0,
            deferred: 0,
        }
    }

    fn offline() -> Self {
        Self {
            success: false,
            errors: vec![OFFLINE_ERROR.to_string()],
            pushed: 0,
            pulled: 0,
            deferred: 0,
        }
    }

    /// Combine two pass reports into one full-sync report
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        self.errors.extend(other.errors);
        self.success = self.errors.is_empty();
        self.pushed += other.pushed;
        self.pulled += other.pulled;
        self.deferred += other.deferred;
        self
    }
}

/// Point-in-time sync state for status rendering
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub online: bool,
    /// Timestamp of the last completed sync attempt (Unix ms)
    pub last_sync_at: Option<i64>,
    /// Errors from the last full sync
    pub last_errors: Vec<String>,
    /// Queue entries awaiting dispatch
    pub pending_entries: usize,
    /// Queue entries held for manual resolution
    pub dead_entries: usize,
}

/// How a single queue entry dispatch ended
enum DispatchFailure {
    /// Remote reported not-found for an Update/Delete: the note is already
    /// gone server-side, which is success-equivalent
    Terminal,
    /// Anything else; the entry stays queued for retry
    Failed(String),
}

impl DispatchFailure {
    fn from_api(error: ApiError, not_found_is_terminal: bool) -> Self {
        if not_found_is_terminal && error.is_not_found() {
            Self::Terminal
        } else {
            Self::Failed(error.to_string())
        }
    }
}

/// Orchestrates upload of queued mutations and download of remote notes
///
/// Both passes are independent; [`full_sync`](Self::full_sync) runs upload
/// strictly before download so local changes reach the server before remote
/// state can overwrite local rows.
pub struct SyncEngine<R> {
    store: SqliteNoteStore,
    queue: SqliteSyncQueue,
    settings: SqliteSettingsStore,
    remote: R,
    monitor: ConnectivityMonitor,
    /// Serializes concurrent full-sync invocations (manual + auto-trigger)
    pass_lock: tokio::sync::Mutex<()>,
    last_errors: Mutex<Vec<String>>,
}

impl<R: RemoteNoteService> SyncEngine<R> {
    /// Create an engine over the shared database and a remote client
    pub fn new(db: Arc<Database>, remote: R, monitor: ConnectivityMonitor) -> Self {
        Self {
            store: SqliteNoteStore::new(db.clone()),
            queue: SqliteSyncQueue::new(db.clone()),
            settings: SqliteSettingsStore::new(db),
            remote,
            monitor,
            pass_lock: tokio::sync::Mutex::new(()),
            last_errors: Mutex::new(Vec::new()),
        }
    }

    /// Upload pass: drain the pending queue against the remote service
    ///
    /// Only local storage faults propagate as `Err`; every remote failure is
    /// recorded in the returned report and the affected entry stays queued.
    pub async fn sync_to_server(&self) -> Result<SyncReport> {
        if !self.monitor.is_online() {
            return Ok(SyncReport::offline());
        }

        let entries = self.queue.peek_all_ordered()?;
        let mut report = SyncReport::clean();
        // Entries for a note stay in enqueue order: once one fails, is
        // deferred, or sits dead-lettered, its followers must wait too.
        let mut blocked: HashSet<NoteId> =
            self.queue.notes_with_dead_entries()?.into_iter().collect();
        let now = now_ms();

        for entry in entries {
            if blocked.contains(&entry.note_id) || !entry.is_due(now) {
                blocked.insert(entry.note_id);
                report.deferred += 1;
                continue;
            }

            match self.dispatch(&entry).await {
                Ok(()) => {
                    self.queue.remove(entry.id)?;
                    if entry.action != SyncAction::Delete
                        && self.queue.pending_for(&entry.note_id)? == 0
                    {
                        self.store.mark_synced(&entry.note_id)?;
                    }
                    report.pushed += 1;
                }
                Err(DispatchFailure::Terminal) => {
                    tracing::debug!(
                        note_id = %entry.note_id,
                        action = %entry.action,
                        "remote reported not found, dropping queue entry"
                    );
                    self.queue.remove(entry.id)?;
                }
                Err(DispatchFailure::Failed(reason)) => {
                    report.errors.push(format!(
                        "failed to sync {} for note {}: {reason}",
                        entry.action, entry.note_id
                    ));
                    self.queue.increment_retry(entry.id)?;
                    blocked.insert(entry.note_id);
                }
            }
        }

        report.success = report.errors.is_empty();
        Ok(report)
    }

    /// Download pass: pull the authoritative remote set and reconcile it
    pub async fn sync_from_server(&self) -> Result<SyncReport> {
        if !self.monitor.is_online() {
            return Ok(SyncReport::offline());
        }

        let mut report = SyncReport::clean();
        let remote_notes = match self.remote.list_notes().await {
            Ok(notes) => notes,
            Err(error) => {
                report.success = false;
                report
                    .errors
                    .push(format!("failed to sync from server: {error}"));
                return Ok(report);
            }
        };

        for remote in &remote_notes {
            match self.store.reconcile(remote)? {
                ReconcileOutcome::Inserted | ReconcileOutcome::Updated => report.pulled += 1,
                ReconcileOutcome::KeptLocal => {}
            }
        }

        Ok(report)
    }

    /// Full bidirectional sync: upload, then download
    pub async fn full_sync(&self) -> Result<SyncReport> {
        // A second caller (manual button racing the auto-trigger) waits here
        // and then runs its own pass rather than interleaving with this one
        let _guard = self.pass_lock.lock().await;

        let upload = self.sync_to_server().await?;
        let download = self.sync_from_server().await?;
        let report = upload.merged(download);

        self.settings.set_last_sync_at(now_ms())?;
        *self.last_errors_mut() = report.errors.clone();

        tracing::info!(
            pushed = report.pushed,
            pulled = report.pulled,
            deferred = report.deferred,
            errors = report.errors.len(),
            "full sync finished"
        );
        Ok(report)
    }

    /// Snapshot of sync state for status rendering
    pub fn status(&self) -> Result<SyncStatus> {
        Ok(SyncStatus {
            online: self.monitor.is_online(),
            last_sync_at: self.settings.last_sync_at()?,
            last_errors: self.last_errors_mut().clone(),
            pending_entries: self.queue.peek_all_ordered()?.len(),
            dead_entries: self.queue.dead_letters()?.len(),
        })
    }

    async fn dispatch(&self, entry: &QueueEntry) -> std::result::Result<(), DispatchFailure> {
        match entry.action {
            SyncAction::Create => {
                let note: Note = parse_payload(entry)?;
                self.remote
                    .create_note(&RemoteNote::from(&note))
                    .await
                    .map_err(|error| DispatchFailure::from_api(error, false))?;
            }
            SyncAction::Update => {
                let patch: NotePatch = parse_payload(entry)?;
                self.remote
                    .update_note(&entry.note_id, &patch)
                    .await
                    .map_err(|error| DispatchFailure::from_api(error, true))?;
            }
            SyncAction::Delete => {
                self.remote
                    .delete_note(&entry.note_id)
                    .await
                    .map_err(|error| DispatchFailure::from_api(error, true))?;
            }
        }
        Ok(())
    }

    fn last_errors_mut(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.last_errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deserialize an entry's JSON payload; malformed payloads are per-entry
/// validation failures, not pass-level errors
fn parse_payload<T: serde::de::DeserializeOwned>(
    entry: &QueueEntry,
) -> std::result::Result<T, DispatchFailure> {
    let payload = entry
        .payload
        .as_deref()
        .ok_or_else(|| DispatchFailure::Failed("missing payload".to_string()))?;
    serde_json::from_str(payload)
        .map_err(|error| DispatchFailure::Failed(format!("invalid payload: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteDraft;
    use crate::sync::spawn_auto_sync;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct FakeRemote {
        inner: Arc<FakeRemoteInner>,
    }

    #[derive(Default)]
    struct FakeRemoteInner {
        notes: Mutex<HashMap<String, RemoteNote>>,
        calls: Mutex<Vec<String>>,
        failing: AtomicBool,
        fail_notes: Mutex<HashSet<String>>,
    }

    impl FakeRemote {
        fn seed(&self, note: RemoteNote) {
            self.inner
                .notes
                .lock()
                .unwrap()
                .insert(note.id.as_str(), note);
        }

        fn note(&self, id: &NoteId) -> Option<RemoteNote> {
            self.inner.notes.lock().unwrap().get(&id.as_str()).cloned()
        }

        fn calls(&self) -> Vec<String> {
            self.inner.calls.lock().unwrap().clone()
        }

        fn set_failing(&self, failing: bool) {
            self.inner.failing.store(failing, Ordering::SeqCst);
        }

        fn fail_note(&self, id: &NoteId) {
            self.inner.fail_notes.lock().unwrap().insert(id.as_str());
        }

        fn check_available(&self, id: Option<&NoteId>) -> ApiResultUnit {
            if self.inner.failing.load(Ordering::SeqCst) {
                return Err(ApiError::Api("service unavailable (503)".to_string()));
            }
            if let Some(id) = id {
                if self.inner.fail_notes.lock().unwrap().contains(&id.as_str()) {
                    return Err(ApiError::Api("service unavailable (503)".to_string()));
                }
            }
            Ok(())
        }
    }

    type ApiResultUnit = std::result::Result<(), ApiError>;

    #[async_trait]
    impl RemoteNoteService for FakeRemote {
        async fn create_note(
            &self,
            note: &RemoteNote,
        ) -> std::result::Result<RemoteNote, ApiError> {
            self.inner
                .calls
                .lock()
                .unwrap()
                .push(format!("create {}", note.id));
            self.check_available(Some(&note.id))?;

            let mut stored = note.clone();
            stored.version = 1;
            self.inner
                .notes
                .lock()
                .unwrap()
                .insert(stored.id.as_str(), stored.clone());
            Ok(stored)
        }

        async fn update_note(
            &self,
            id: &NoteId,
            patch: &NotePatch,
        ) -> std::result::Result<RemoteNote, ApiError> {
            self.inner.calls.lock().unwrap().push(format!("update {id}"));
            self.check_available(Some(id))?;

            let mut notes = self.inner.notes.lock().unwrap();
            let Some(existing) = notes.get_mut(&id.as_str()) else {
                return Err(ApiError::NotFound);
            };
            if let Some(title) = &patch.title {
                existing.title = title.clone();
            }
            if let Some(content) = &patch.content {
                existing.content = content.clone();
            }
            if let Some(tags) = &patch.tags {
                existing.tags = tags.clone();
            }
            if let Some(pinned) = patch.pinned {
                existing.pinned = pinned;
            }
            if let Some(archived) = patch.archived {
                existing.archived = archived;
            }
            existing.version += 1;
            Ok(existing.clone())
        }

        async fn delete_note(&self, id: &NoteId) -> ApiResultUnit {
            self.inner.calls.lock().unwrap().push(format!("delete {id}"));
            self.check_available(Some(id))?;

            if self.inner.notes.lock().unwrap().remove(&id.as_str()).is_none() {
                return Err(ApiError::NotFound);
            }
            Ok(())
        }

        async fn list_notes(&self) -> std::result::Result<Vec<RemoteNote>, ApiError> {
            self.inner.calls.lock().unwrap().push("list".to_string());
            self.check_available(None)?;

            Ok(self.inner.notes.lock().unwrap().values().cloned().collect())
        }
    }

    struct Harness {
        store: SqliteNoteStore,
        queue: SqliteSyncQueue,
        engine: SyncEngine<FakeRemote>,
        remote: FakeRemote,
        monitor: ConnectivityMonitor,
    }

    impl Harness {
        fn clear_fail(&self, id: &NoteId) {
            self.remote
                .inner
                .fail_notes
                .lock()
                .unwrap()
                .remove(&id.as_str());
        }
    }

    fn setup(online: bool) -> Harness {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let remote = FakeRemote::default();
        let monitor = ConnectivityMonitor::new(online);
        Harness {
            store: SqliteNoteStore::new(db.clone()),
            queue: SqliteSyncQueue::new(db.clone()),
            engine: SyncEngine::new(db, remote.clone(), monitor.clone()),
            remote,
            monitor,
        }
    }

    fn draft(title: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: format!("{title} body"),
            tags: vec!["sync".to_string()],
            ..NoteDraft::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_queue_drain_is_clean() {
        let h = setup(true);

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(report.success);
        assert!(report.errors.is_empty());
        assert_eq!(report.pushed, 0);
        assert!(h.remote.calls().is_empty());
        assert!(h.store.get_all().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_upload_short_circuits() {
        let h = setup(false);
        let note = h.store.create(draft("Offline note")).unwrap();

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(!report.success);
        assert_eq!(report.errors, vec![OFFLINE_ERROR.to_string()]);
        assert!(h.remote.calls().is_empty());

        // Zero queue mutations
        let entries = h.queue.peek_all_ordered().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].note_id, note.id);
        assert_eq!(entries[0].retry_count, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_download_short_circuits() {
        let h = setup(false);

        let report = h.engine.sync_from_server().await.unwrap();

        assert!(!report.success);
        assert_eq!(report.errors, vec![OFFLINE_ERROR.to_string()]);
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_dispatches_same_note_in_enqueue_order() {
        let h = setup(true);

        let note = h.store.create(draft("Ordered")).unwrap();
        h.store
            .update(
                &note.id,
                &NotePatch {
                    title: Some("A".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        h.store.delete(&note.id).unwrap();

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(report.success);
        assert_eq!(report.pushed, 3);
        assert_eq!(
            h.remote.calls(),
            vec![
                format!("create {}", note.id),
                format!("update {}", note.id),
                format!("delete {}", note.id),
            ]
        );
        assert!(h.queue.peek_all_ordered().unwrap().is_empty());
        assert!(h.remote.note(&note.id).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_applies_last_write_by_queue_order() {
        let h = setup(true);

        let note = h.store.create(draft("Versioned")).unwrap();
        for title in ["A", "B"] {
            h.store
                .update(
                    &note.id,
                    &NotePatch {
                        title: Some(title.to_string()),
                        ..NotePatch::default()
                    },
                )
                .unwrap();
        }

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(report.success);
        assert_eq!(h.remote.note(&note.id).unwrap().title, "B");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn terminal_not_found_absorbs_entry() {
        let h = setup(true);
        let ghost = NoteId::new();

        // An update whose target another client already deleted server-side
        let patch = NotePatch {
            title: Some("too late".to_string()),
            ..NotePatch::default()
        };
        h.queue
            .append(
                SyncAction::Update,
                &ghost,
                Some(&serde_json::to_string(&patch).unwrap()),
            )
            .unwrap();

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(report.success);
        assert!(report.errors.is_empty());
        assert!(h.queue.peek_all_ordered().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_retains_entry_and_defers_followers_of_that_note_only() {
        let h = setup(true);

        let flaky = h.store.create(draft("Flaky")).unwrap();
        h.store
            .update(
                &flaky.id,
                &NotePatch {
                    title: Some("never sent first".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();
        let healthy = h.store.create(draft("Healthy")).unwrap();
        h.remote.fail_note(&flaky.id);

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0]
            .starts_with(&format!("failed to sync CREATE for note {}", flaky.id)));
        assert_eq!(report.pushed, 1);
        assert_eq!(report.deferred, 1);

        // The flaky note's create was retried-bookkept; its update never ran
        let entries = h.queue.peek_all_ordered().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, SyncAction::Create);
        assert_eq!(entries[0].retry_count, 1);
        assert_eq!(entries[1].action, SyncAction::Update);
        assert_eq!(entries[1].retry_count, 0);

        // The healthy note made it out
        assert!(h.remote.note(&healthy.id).is_some());
        assert!(h
            .remote
            .calls()
            .iter()
            .all(|call| !call.contains(&flaky.id.as_str()) || call.starts_with("create")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backoff_window_defers_without_error() {
        let h = setup(true);

        let note = h.store.create(draft("Backing off")).unwrap();
        h.remote.fail_note(&note.id);
        let first = h.engine.sync_to_server().await.unwrap();
        assert_eq!(first.errors.len(), 1);

        // Entry is now gated several seconds out; a retry right away defers
        h.clear_fail(&note.id);
        let second = h.engine.sync_to_server().await.unwrap();

        assert!(second.success);
        assert_eq!(second.pushed, 0);
        assert_eq!(second.deferred, 1);
        assert_eq!(h.queue.peek_all_ordered().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_payload_is_a_validation_failure() {
        let h = setup(true);
        let note = NoteId::new();

        h.queue
            .append(SyncAction::Create, &note, Some("not json"))
            .unwrap();

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("invalid payload"));
        assert_eq!(h.queue.peek_all_ordered().unwrap().len(), 1);
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dead_lettered_note_blocks_its_followers() {
        let h = setup(true);
        let note = h.store.create(draft("Doomed")).unwrap();

        let entry_id = h.queue.peek_all_ordered().unwrap()[0].id;
        for _ in 0..crate::db::MAX_SYNC_ATTEMPTS {
            h.queue.increment_retry(entry_id).unwrap();
        }
        h.store
            .update(
                &note.id,
                &NotePatch {
                    title: Some("queued behind a dead letter".to_string()),
                    ..NotePatch::default()
                },
            )
            .unwrap();

        let report = h.engine.sync_to_server().await.unwrap();

        assert!(report.success);
        assert_eq!(report.deferred, 1);
        assert!(h.remote.calls().is_empty());
        assert_eq!(h.queue.dead_letters().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn full_sync_round_trip_marks_note_synced() {
        let h = setup(true);

        let note = h.store.create(draft("Round trip")).unwrap();
        let report = h.engine.full_sync().await.unwrap();

        assert!(report.success);
        assert_eq!(report.pushed, 1);

        let local = h.store.get(&note.id).unwrap().unwrap();
        assert!(local.synced_at.is_some());

        let remote = h.remote.note(&note.id).unwrap();
        assert_eq!(remote.title, note.title);
        assert_eq!(remote.content, note.content);
        assert_eq!(remote.tags, note.tags);

        assert!(h.queue.peek_all_ordered().unwrap().is_empty());

        let status = h.engine.status().unwrap();
        assert!(status.online);
        assert!(status.last_sync_at.is_some());
        assert!(status.last_errors.is_empty());
        assert_eq!(status.pending_entries, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn download_tie_keeps_unsynced_local_note() {
        let h = setup(true);

        let note = h.store.create(draft("Mine")).unwrap();
        let mut remote = RemoteNote::from(&note);
        remote.title = "Theirs".to_string();
        h.remote.seed(remote);

        let report = h.engine.sync_from_server().await.unwrap();

        assert!(report.success);
        assert_eq!(report.pulled, 0);
        let local = h.store.get(&note.id).unwrap().unwrap();
        assert_eq!(local.title, "Mine");
        assert!(local.synced_at.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn download_overwrites_when_remote_is_ahead() {
        let h = setup(true);

        let note = h.store.create(draft("Mine")).unwrap();
        let mut remote = RemoteNote::from(&note);
        remote.title = "Newer".to_string();
        remote.version = 4;
        h.remote.seed(remote);

        let report = h.engine.sync_from_server().await.unwrap();

        assert!(report.success);
        assert_eq!(report.pulled, 1);
        let local = h.store.get(&note.id).unwrap().unwrap();
        assert_eq!(local.title, "Newer");
        assert_eq!(local.version, 4);
        assert!(local.synced_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn download_fetch_failure_reports_one_error() {
        let h = setup(true);
        h.remote.set_failing(true);

        let report = h.engine.sync_from_server().await.unwrap();

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("failed to sync from server"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn full_sync_merges_pass_errors() {
        let h = setup(true);

        h.store.create(draft("Unlucky")).unwrap();
        h.remote.set_failing(true);

        let report = h.engine.full_sync().await.unwrap();

        assert!(!report.success);
        // One upload failure plus the failed fetch
        assert_eq!(report.errors.len(), 2);

        let status = h.engine.status().unwrap();
        assert_eq!(status.last_errors.len(), 2);
        assert_eq!(status.pending_entries, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn auto_sync_runs_once_per_offline_online_transition() {
        let h = setup(false);
        let engine = Arc::new(SyncEngine::new(
            Arc::new(Database::open_in_memory().unwrap()),
            h.remote.clone(),
            h.monitor.clone(),
        ));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = spawn_auto_sync(engine, &h.monitor, move |report| {
            tx.send(report).ok();
        });

        h.monitor.set_online(true);
        let report = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(report.success);
        assert_eq!(h.remote.calls(), vec!["list".to_string()]);

        // Re-asserting online is not a transition
        h.monitor.set_online(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.remote.calls().len(), 1);

        // A real drop and recovery triggers again; pause so the watcher
        // observes the offline state before it flips back
        h.monitor.set_online(false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.monitor.set_online(true);
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(h.remote.calls(), vec!["list".to_string(); 2]);

        handle.abort();
    }
}
