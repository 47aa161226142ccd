//! Real-time driver for the sequencer
//!
//! The sequencer keeps virtual time, pinned to the session's origin
//! instant. [`drive`] sleeps until the next deadline, fires what is due
//! under the session lock, and repeats until nothing is pending. A run or
//! test started while it sleeps wakes it to pick up the new schedule. The
//! lock is never held across an await.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep_until;

use crate::error::{Result, StudioError};
use crate::sequencer::RunId;
use crate::session::EditorSession;

/// Fire pending notifications in real time until the sequencer is idle
///
/// Returns `SessionNotProvisioned` if the session is closed before the
/// schedule drains; remaining notifications are then abandoned.
pub async fn drive(session: Arc<EditorSession>) -> Result<()> {
    loop {
        if session.is_closed() {
            log::warn!("Session {} closed with notifications pending", session.id());
            return Err(StudioError::SessionNotProvisioned(session.id().to_string()));
        }

        let (origin, next) = {
            let state = session.lock();
            (state.origin(), state.sequencer.next_deadline())
        };
        let Some(deadline) = next else {
            return Ok(());
        };

        tokio::select! {
            _ = sleep_until(origin + Duration::from_millis(deadline)) => {
                if session.is_closed() {
                    continue;
                }
                let fired = session.lock().advance_to(deadline);
                log::trace!("Fired {} notifications at {}ms", fired, deadline);
            }
            _ = session.wait_rescheduled() => {
                log::trace!("Schedule changed, recomputing next deadline");
            }
        }
    }
}

/// Start a run and drive it to completion in real time
pub async fn run_workflow(session: Arc<EditorSession>) -> Result<RunId> {
    let run_id = session.run();
    drive(session).await?;
    Ok(run_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{StudioEvent, VecEventSink};
    use crate::sequencer::delay::ScriptedDelay;
    use crate::sequencer::{ExecutionSequencer, RunPhase, SequencerOptions};
    use crate::session::SessionState;
    use crate::store::GraphStore;
    use tokio::time::Instant;

    fn session(delays: Vec<u64>) -> (Arc<EditorSession>, Arc<VecEventSink>) {
        let sink = Arc::new(VecEventSink::new());
        let state = SessionState::new(
            GraphStore::new(sink.clone()),
            ExecutionSequencer::with_delays(
                SequencerOptions::default(),
                Box::new(ScriptedDelay::new(delays)),
            ),
        );
        (Arc::new(EditorSession::from_state("session-test", state)), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_completes_in_real_time() {
        let (session, sink) = session(vec![800, 1600]);
        let started = Instant::now();

        let run_id = run_workflow(session.clone()).await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(2600));
        let state = session.lock();
        assert!(!state.store.is_running());
        assert_eq!(state.sequencer.phase(&run_id), RunPhase::Completed);
        drop(state);

        let events = sink.events();
        assert!(matches!(events.first(), Some(StudioEvent::WorkflowRunning { .. })));
        assert!(matches!(events.last(), Some(StudioEvent::WorkflowComplete { at_ms: 2600, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_session_stops_driver() {
        let (session, sink) = session(vec![1000, 1000]);
        session.run();

        let closer = session.clone();
        let handle = tokio::spawn(drive(session.clone()));
        tokio::time::sleep(Duration::from_millis(500)).await;
        closer.close();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(StudioError::SessionNotProvisioned(_))));
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, StudioEvent::NodeProcessing { .. })));
    }

    fn processing_times(events: &[StudioEvent], run: &str) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                StudioEvent::NodeProcessing { run_id, at_ms, .. } if run_id == run => Some(*at_ms),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_started_mid_drive_counts_delays_from_its_start() {
        let (session, sink) = session(vec![1000, 1000, 600, 600]);
        let started = Instant::now();
        session.run();
        let driver = tokio::spawn(drive(session.clone()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let second = session.run();

        driver.await.unwrap().unwrap();
        let events = sink.events();

        assert!(events.iter().any(|e| matches!(
            e,
            StudioEvent::WorkflowRunning { run_id, at_ms: 1500, .. } if *run_id == second
        )));
        assert_eq!(processing_times(&events, &second), vec![2100, 2100]);
        assert_eq!(started.elapsed(), Duration::from_millis(3100));
        assert_eq!(session.lock().sequencer.phase(&second), RunPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_wakes_sleeping_driver() {
        let (session, sink) = session(vec![2000, 2000]);
        session.run();
        let driver = tokio::spawn(drive(session.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let node_id = session.lock().store.nodes()[0].id.clone();
        assert!(session.test_node(&node_id));

        driver.await.unwrap().unwrap();
        assert!(sink.events().iter().any(|e| matches!(
            e,
            StudioEvent::NodeTestComplete { at_ms: 1600, .. }
        )));
    }
}
