//! Editor sessions and the manager that provisions them
//!
//! Each open editor owns one [`EditorSession`]: a graph store and a
//! sequencer behind a single lock, so every mutation and every fired
//! notification is applied whole. Sessions are handed out as `Arc`s by the
//! [`SessionManager`]; there is no global store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock};

use crate::error::{Result, StudioError};
use crate::events::EventSink;
use crate::sequencer::{ExecutionSequencer, RunId, SequencerOptions};
use crate::store::{GraphStore, StoreOptions};

/// Options applied to every session a manager creates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub store: StoreOptions,
    pub sequencer: SequencerOptions,
}

/// The state guarded by a session's lock
///
/// The sequencer clock is pinned to a tokio instant: a reading of `t`
/// milliseconds means `origin + t`.
pub struct SessionState {
    pub store: GraphStore,
    pub sequencer: ExecutionSequencer,
    origin: tokio::time::Instant,
}

impl SessionState {
    pub fn new(store: GraphStore, sequencer: ExecutionSequencer) -> Self {
        let now = tokio::time::Instant::now();
        let origin = now
            .checked_sub(Duration::from_millis(sequencer.now()))
            .unwrap_or(now);
        Self {
            store,
            sequencer,
            origin,
        }
    }

    /// The instant the sequencer clock counts from
    pub fn origin(&self) -> tokio::time::Instant {
        self.origin
    }

    /// Milliseconds of real time since `origin`
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Start a simulated run of the current graph
    ///
    /// The sequencer is first brought up to real time so the run's delays
    /// count from now.
    pub fn run(&mut self) -> RunId {
        self.sync_clock();
        self.sequencer.run(&mut self.store)
    }

    /// Start a single-node test
    pub fn test_node(&mut self, node_id: &str) -> bool {
        self.sync_clock();
        self.sequencer.test_node(&self.store, node_id)
    }

    fn sync_clock(&mut self) {
        let now = self.elapsed_ms();
        self.sequencer.advance_to(now, &mut self.store);
    }

    /// Fire every notification due at or before `now`
    pub fn advance_to(&mut self, now: u64) -> usize {
        self.sequencer.advance_to(now, &mut self.store)
    }
}

/// One editor session
pub struct EditorSession {
    id: String,
    state: Mutex<SessionState>,
    created_at: Instant,
    last_accessed: Mutex<Instant>,
    closed: AtomicBool,
    /// Wakes the driver when the schedule changes
    rescheduled: Notify,
}

impl EditorSession {
    pub fn new(id: impl Into<String>, options: SessionOptions, sink: Arc<dyn EventSink>) -> Self {
        let state = SessionState::new(
            GraphStore::with_options(options.store, sink),
            ExecutionSequencer::new(options.sequencer),
        );
        Self::from_state(id, state)
    }

    /// Wrap an already-built store and sequencer
    pub fn from_state(id: impl Into<String>, state: SessionState) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            state: Mutex::new(state),
            created_at: now,
            last_accessed: Mutex::new(now),
            closed: AtomicBool::new(false),
            rescheduled: Notify::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Lock the session state
    ///
    /// Callers hold the guard for one logical operation and drop it before
    /// awaiting.
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.touch();
        self.state.lock()
    }

    /// Start a run and wake the driver
    pub fn run(&self) -> RunId {
        let run_id = self.lock().run();
        self.rescheduled.notify_one();
        run_id
    }

    /// Start a single-node test and wake the driver
    pub fn test_node(&self, node_id: &str) -> bool {
        let started = self.lock().test_node(node_id);
        if started {
            self.rescheduled.notify_one();
        }
        started
    }

    /// Resolves the next time a run or test is scheduled
    pub(crate) async fn wait_rescheduled(&self) {
        self.rescheduled.notified().await
    }

    /// Run `f` against the store under the session lock
    pub fn with_store<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut GraphStore) -> R,
    {
        f(&mut self.lock().store)
    }

    /// Update the last accessed time
    pub fn touch(&self) {
        *self.last_accessed.lock() = Instant::now();
    }

    /// Check if this session hasn't been accessed recently
    pub fn is_stale(&self, timeout: Duration) -> bool {
        self.last_accessed.lock().elapsed() > timeout
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.rescheduled.notify_one();
    }
}

/// Manager for all open editor sessions
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<EditorSession>>>,
    options: SessionOptions,
    stale_timeout: Duration,
}

impl SessionManager {
    /// Create a manager with a five minute stale timeout
    pub fn new(options: SessionOptions) -> Self {
        Self::with_timeout(options, Duration::from_secs(5 * 60))
    }

    pub fn with_timeout(options: SessionOptions, timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            options,
            stale_timeout: timeout,
        }
    }

    /// Provision a session holding a fresh seed graph and return its ID
    pub async fn create_session(&self, sink: Arc<dyn EventSink>) -> String {
        let session_id = format!("session-{}", uuid::Uuid::new_v4());
        let session = Arc::new(EditorSession::new(&session_id, self.options.clone(), sink));

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.clone(), session);
        log::info!("Created editor session {}", session_id);

        session_id
    }

    /// Get a provisioned session
    ///
    /// Fails with `SessionNotProvisioned` when the ID was never created or
    /// the session has been closed.
    pub async fn session(&self, session_id: &str) -> Result<Arc<EditorSession>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| StudioError::SessionNotProvisioned(session_id.to_string()))?;
        session.touch();
        Ok(session)
    }

    /// Close a session; outstanding runs stop at their next notification
    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .remove(session_id)
            .ok_or_else(|| StudioError::SessionNotProvisioned(session_id.to_string()))?;
        session.close();
        log::info!("Closed editor session {}", session_id);
        Ok(())
    }

    /// Close sessions that have not been accessed within the stale timeout
    pub async fn cleanup_stale(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let stale_ids: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.is_stale(self.stale_timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale_ids {
            if let Some(session) = sessions.remove(id) {
                session.close();
            }
            log::debug!("Cleaned up stale session: {}", id);
        }

        stale_ids.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn has_session(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullEventSink;
    use crate::types::Position;

    #[tokio::test]
    async fn test_unknown_session_is_not_provisioned() {
        let manager = SessionManager::default();
        let result = manager.session("session-missing").await;
        assert!(matches!(result, Err(StudioError::SessionNotProvisioned(_))));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let manager = SessionManager::default();
        let first = manager.create_session(Arc::new(NullEventSink)).await;
        let second = manager.create_session(Arc::new(NullEventSink)).await;
        assert_ne!(first, second);
        assert_eq!(manager.session_count().await, 2);

        let session = manager.session(&first).await.unwrap();
        session.with_store(|store| {
            store.add_node("riskAssessment", Position::default());
        });

        let other = manager.session(&second).await.unwrap();
        assert_eq!(session.with_store(|s| s.nodes().len()), 3);
        assert_eq!(other.with_store(|s| s.nodes().len()), 2);
    }

    #[tokio::test]
    async fn test_closed_session_is_rejected() {
        let manager = SessionManager::default();
        let id = manager.create_session(Arc::new(NullEventSink)).await;
        let handle = manager.session(&id).await.unwrap();

        manager.close_session(&id).await.unwrap();
        assert!(handle.is_closed());
        assert!(manager.session(&id).await.is_err());
        assert!(manager.close_session(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_cleanup_stale_sessions() {
        let manager = SessionManager::with_timeout(SessionOptions::default(), Duration::ZERO);
        manager.create_session(Arc::new(NullEventSink)).await;
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(manager.cleanup_stale().await, 1);
        assert_eq!(manager.session_count().await, 0);
    }
}
