//! Studio events and the sinks that receive them
//!
//! The store and sequencer report user-visible happenings through an
//! [`EventSink`]. Delivery is fire-and-forget: a failed send is logged and
//! otherwise ignored. Each event renders to a toast-style [`Notification`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::sequencer::scheduler::Millis;

/// Trait for sending studio events
///
/// This abstracts over the transport mechanism (channel, log, test buffer)
/// so the store can be embedded in different front ends.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g. channel closed)
    fn send(&self, event: StudioEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// A toast notification: a title plus a one-line description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

/// Events emitted by the graph store and the execution sequencer
///
/// Timestamps (`at_ms`) are sequencer clock readings in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StudioEvent {
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: String, label: String },

    #[serde(rename_all = "camelCase")]
    WorkflowRunning {
        run_id: String,
        participants: usize,
        at_ms: Millis,
    },

    #[serde(rename_all = "camelCase")]
    NodeProcessing {
        run_id: String,
        node_id: String,
        label: String,
        at_ms: Millis,
    },

    #[serde(rename_all = "camelCase")]
    WorkflowComplete { run_id: String, at_ms: Millis },

    #[serde(rename_all = "camelCase")]
    WorkflowSaved {
        name: String,
        node_count: usize,
        edge_count: usize,
    },

    #[serde(rename_all = "camelCase")]
    NodeTestStarted {
        node_id: String,
        label: String,
        at_ms: Millis,
    },

    #[serde(rename_all = "camelCase")]
    NodeTestComplete {
        node_id: String,
        label: String,
        at_ms: Millis,
    },
}

impl StudioEvent {
    /// Render this event as a toast
    pub fn notification(&self) -> Notification {
        let (title, description) = match self {
            StudioEvent::NodeAdded { label, .. } => {
                ("Node Added".to_string(), format!("Node Added: {}", label))
            }
            StudioEvent::WorkflowRunning { participants, .. } => (
                "Workflow Running".to_string(),
                format!("Executing {} connected nodes", participants),
            ),
            StudioEvent::NodeProcessing { label, .. } => {
                (format!("Processing {}", label), "Simulated node execution".to_string())
            }
            StudioEvent::WorkflowComplete { .. } => (
                "Workflow Complete".to_string(),
                "All nodes executed successfully".to_string(),
            ),
            StudioEvent::WorkflowSaved { name, node_count, edge_count } => (
                "Workflow Saved".to_string(),
                format!("{} ({} nodes, {} edges)", name, node_count, edge_count),
            ),
            StudioEvent::NodeTestStarted { label, .. } => {
                (format!("Testing {}", label), "Running node with sample input".to_string())
            }
            StudioEvent::NodeTestComplete { label, .. } => {
                ("Test Complete".to_string(), format!("Test Complete: {}", label))
            }
        };
        Notification { title, description }
    }
}

/// Send an event, logging instead of failing when delivery breaks
pub(crate) fn emit(sink: &dyn EventSink, event: StudioEvent) {
    if let Err(e) = sink.send(event) {
        log::debug!("Dropped studio event: {}", e);
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: StudioEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for tests and for replaying a session's notifications.
pub struct VecEventSink {
    events: Mutex<Vec<StudioEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<StudioEvent> {
        self.events.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: StudioEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// An event sink that forwards to an unbounded channel
///
/// Event volume is one per node per run, so an unbounded channel never
/// makes the store wait on a slow consumer.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<StudioEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver that drains it
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StudioEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn send(&self, event: StudioEvent) -> Result<(), EventError> {
        self.sender
            .send(event)
            .map_err(|_| EventError::channel_closed())
    }
}
