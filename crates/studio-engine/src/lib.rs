//! Studio Engine - workflow graph editing and simulated execution
//!
//! This crate holds the model behind the Agent Studio editor, a canvas for
//! building AI investment-research workflows. It supports:
//!
//! - A catalog of 24 node types with per-type default configuration
//! - A graph store that applies visual change batches, connections and
//!   data patches as atomic mutations
//! - A timer-driven execution sequencer that walks a run's participants
//!   with randomized delays and reports progress as events
//! - Compressed snapshot-based undo/redo
//! - Per-editor sessions instead of a global store
//!
//! # Architecture
//!
//! - `GraphStore`: single source of truth for one editor's graph
//! - `ExecutionSequencer`: virtual-time scheduler for runs and node tests
//! - `EventSink`: notification streaming, not tied to any UI
//! - `runtime::drive`: maps the virtual clock onto tokio's clock
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use studio_engine::{ExecutionSequencer, GraphStore, NullEventSink, Position, SequencerOptions};
//!
//! let mut store = GraphStore::new(Arc::new(NullEventSink));
//! store.add_node("marketData", Position::new(100.0, 350.0));
//!
//! let mut sequencer = ExecutionSequencer::new(SequencerOptions::default());
//! sequencer.run(&mut store);
//! sequencer.run_until_idle(&mut store);
//! assert!(!store.is_running());
//! ```

pub mod catalog;
pub mod changes;
pub mod error;
pub mod events;
pub mod history;
pub mod ids;
pub mod model;
pub mod runtime;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;

// Re-export key types
pub use catalog::{CatalogEntry, NodeCategory, NodeConfig};
pub use changes::{EdgeChange, NodeChange};
pub use error::{Result, StudioError};
pub use events::{
    ChannelEventSink, EventError, EventSink, Notification, NullEventSink, StudioEvent,
    VecEventSink,
};
pub use sequencer::{ExecutionSequencer, RunId, RunPhase, SequencerOptions};
pub use session::{EditorSession, SessionManager, SessionOptions};
pub use store::{GraphStore, StoreOptions};
pub use types::{
    Connection, DataPatch, DataValue, GraphEdge, GraphNode, NodeData, NodeKind, NodeType,
    Position, WorkflowGraph,
};
pub use validation::{validate_workflow, ValidationIssue};
