//! The graph store: single source of truth for an editor session
//!
//! Every mutation of the current graph goes through [`GraphStore`]. All
//! operations are synchronous and total; malformed input is logged and
//! dropped rather than returned as an error.
//!
//! The store is plain data behind `&mut self`. Sharing it between threads
//! goes through [`crate::session::EditorSession`], which serializes writers
//! with a lock so no reader sees a half-applied batch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::changes::{self, EdgeChange, NodeChange};
use crate::error::Result;
use crate::events::{emit, EventSink, StudioEvent};
use crate::history::GraphHistory;
use crate::ids::IdGenerator;
use crate::model::{self, ConnectionPolicy};
use crate::types::{
    Connection, DataPatch, EdgeId, GraphEdge, GraphNode, NodeId, NodeKind, Position, WorkflowGraph,
};
use crate::validation::{validate_workflow, ValidationIssue};

/// Name given to a freshly mounted graph
pub const DEFAULT_GRAPH_NAME: &str = "Untitled Workflow";

/// Behaviour switches for a store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Accept edges from a node to itself
    pub allow_self_loops: bool,
    /// Remove a node's edges when the node is removed
    pub cascade_edge_removal: bool,
    /// Number of undo snapshots kept
    pub undo_depth: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            allow_self_loops: false,
            cascade_edge_removal: false,
            undo_depth: 100,
        }
    }
}

impl StoreOptions {
    fn connection_policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            allow_self_loops: self.allow_self_loops,
        }
    }
}

pub struct GraphStore {
    graph: WorkflowGraph,
    running: bool,
    selected: Option<NodeId>,
    ids: IdGenerator,
    history: GraphHistory,
    options: StoreOptions,
    sink: Arc<dyn EventSink>,
}

impl GraphStore {
    /// Create a store holding the seed graph, with default options
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_options(StoreOptions::default(), sink)
    }

    /// Create a store holding the seed graph
    ///
    /// The seed is one trigger node feeding one orchestrator node.
    pub fn with_options(options: StoreOptions, sink: Arc<dyn EventSink>) -> Self {
        let mut store = Self {
            graph: WorkflowGraph::new(DEFAULT_GRAPH_NAME),
            running: false,
            selected: None,
            ids: IdGenerator::new(),
            history: GraphHistory::new(options.undo_depth),
            options,
            sink,
        };
        store.seed();
        store
    }

    fn seed(&mut self) {
        let trigger = model::create_node(
            &mut self.ids,
            NodeKind::Trigger.as_str(),
            Position::new(250.0, 50.0),
        );
        let orchestrator = model::create_node(
            &mut self.ids,
            NodeKind::Orchestrator.as_str(),
            Position::new(250.0, 200.0),
        );
        let connection = Connection::new(trigger.id.clone(), orchestrator.id.clone());
        self.graph.nodes.push(trigger);
        self.graph.nodes.push(orchestrator);
        match model::create_edge(&mut self.ids, &connection, self.options.connection_policy()) {
            Ok(edge) => self.graph.edges.push(edge),
            Err(e) => log::error!("Failed to seed graph edge: {}", e),
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.graph.edges
    }

    pub fn name(&self) -> &str {
        &self.graph.name
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// The node currently open for inspection
    pub fn selected_node(&self) -> Option<&GraphNode> {
        self.selected.as_deref().and_then(|id| self.graph.find_node(id))
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate_workflow(&self.graph)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Apply a batch of node changes from the editor surface
    pub fn apply_node_changes(&mut self, changes: Vec<NodeChange>) {
        let count = changes.len();
        let removed = changes::apply_node_changes(&mut self.graph.nodes, changes, &mut self.ids);

        if !removed.is_empty() {
            if self.selected.as_ref().is_some_and(|id| removed.contains(id)) {
                self.selected = None;
            }
            if self.options.cascade_edge_removal {
                let before = self.graph.edges.len();
                self.graph
                    .edges
                    .retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
                log::debug!("Cascade removed {} edges", before - self.graph.edges.len());
            }
        }
        log::debug!("Applied {} node changes ({} removals)", count, removed.len());
    }

    /// Apply a batch of edge changes from the editor surface
    pub fn apply_edge_changes(&mut self, changes: Vec<EdgeChange>) {
        let count = changes.len();
        changes::apply_edge_changes(&mut self.graph.edges, changes, &mut self.ids);
        log::debug!("Applied {} edge changes", count);
    }

    /// Connect two nodes, returning the new edge's ID
    ///
    /// Connections with a missing endpoint, and self-loops unless allowed,
    /// are dropped. Parallel duplicates are accepted.
    pub fn connect(&mut self, connection: Connection) -> Option<EdgeId> {
        match model::create_edge(&mut self.ids, &connection, self.options.connection_policy()) {
            Ok(edge) => {
                let id = edge.id.clone();
                log::debug!("Connected {} -> {} as '{}'", edge.source, edge.target, id);
                self.graph.edges.push(edge);
                Some(id)
            }
            Err(e) => {
                log::warn!("Dropping connection: {}", e);
                None
            }
        }
    }

    /// Create a node of `node_type` at `position` and append it
    pub fn add_node(&mut self, node_type: &str, position: Position) -> GraphNode {
        let node = model::create_node(&mut self.ids, node_type, position);
        log::debug!("Added node '{}' of type '{}'", node.id, node.node_type());
        self.graph.nodes.push(node.clone());
        self.notify(StudioEvent::NodeAdded {
            node_id: node.id.clone(),
            label: node.data.label.clone(),
        });
        node
    }

    /// Merge `patch` into a node's data; unknown IDs are ignored
    pub fn update_node_data(&mut self, node_id: &str, patch: DataPatch) {
        match self.graph.find_node_mut(node_id) {
            Some(node) => {
                node.data.merge(patch);
                log::debug!("Updated data of node '{}'", node_id);
            }
            None => log::debug!("Ignoring data update for unknown node '{}'", node_id),
        }
    }

    /// Choose the node open for inspection; `None` clears the selection
    pub fn set_selected_node(&mut self, node_id: Option<&str>) {
        match node_id {
            Some(id) if self.graph.find_node(id).is_none() => {
                log::debug!("Ignoring selection of unknown node '{}'", id);
            }
            Some(id) => self.selected = Some(id.to_string()),
            None => self.selected = None,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.graph.name = name.into();
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub(crate) fn notify(&self, event: StudioEvent) {
        emit(self.sink.as_ref(), event);
    }

    // =========================================================================
    // Undo / redo
    // =========================================================================

    /// Record the current graph as an undo point
    pub fn checkpoint(&mut self) -> Result<()> {
        self.history.record(&self.graph)?;
        log::debug!(
            "Checkpointed '{}' ({} bytes of history)",
            self.graph.name,
            self.history.compressed_size()
        );
        Ok(())
    }

    /// Restore the previous checkpoint; returns false when there is none
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.step_back() {
            Some(graph) => {
                self.restore(graph?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Restore the next checkpoint; returns false when there is none
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.step_forward() {
            Some(graph) => {
                self.restore(graph?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, graph: WorkflowGraph) {
        self.graph = graph;
        if self.selected_node().is_none() {
            self.selected = None;
        }
        log::debug!(
            "Restored graph '{}' ({} nodes, {} edges)",
            self.graph.name,
            self.graph.nodes.len(),
            self.graph.edges.len()
        );
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Serialize the graph for the rendering surface and log it
    ///
    /// Nothing is written anywhere; the caller owns persistence.
    pub fn save_workflow(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.graph)?;
        log::info!("Saving workflow '{}':\n{}", self.graph.name, json);
        self.notify(StudioEvent::WorkflowSaved {
            name: self.graph.name.clone(),
            node_count: self.graph.nodes.len(),
            edge_count: self.graph.edges.len(),
        });
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VecEventSink;
    use crate::types::{DataValue, NodeType};
    use std::collections::HashSet;

    fn store() -> (GraphStore, Arc<VecEventSink>) {
        let sink = Arc::new(VecEventSink::new());
        (GraphStore::new(sink.clone()), sink)
    }

    fn patch(key: &str, value: impl Into<DataValue>) -> DataPatch {
        let mut patch = DataPatch::new();
        patch.insert(key.to_string(), value.into());
        patch
    }

    #[test]
    fn test_seed_graph() {
        let (store, sink) = store();
        assert_eq!(store.nodes().len(), 2);
        assert_eq!(store.edges().len(), 1);
        assert_eq!(store.nodes()[0].node_type(), &NodeType::Known(NodeKind::Trigger));
        assert_eq!(store.nodes()[1].node_type(), &NodeType::Known(NodeKind::Orchestrator));
        assert_eq!(store.edges()[0].source, store.nodes()[0].id);
        assert_eq!(store.edges()[0].target, store.nodes()[1].id);
        assert!(!store.is_running());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_ids_unique_across_rapid_adds() {
        let (mut store, _) = store();
        for _ in 0..50 {
            store.add_node("marketData", Position::default());
            store.add_node("marketData", Position::default());
        }
        let ids: Vec<String> = store.nodes().iter().map(|n| n.id.clone()).collect();
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        let first = ids[2].clone();
        for target in &ids[3..10] {
            store.connect(Connection::new(first.clone(), target.clone()));
            store.connect(Connection::new(first.clone(), target.clone()));
        }
        let edge_ids: HashSet<&str> = store.edges().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(edge_ids.len(), store.edges().len());
        assert_eq!(store.edges().len(), 15);
    }

    #[test]
    fn test_add_node_notifies() {
        let (mut store, sink) = store();
        let node = store.add_node("valuationModeling", Position::new(10.0, 10.0));
        assert_eq!(store.nodes().last(), Some(&node));
        assert_eq!(
            sink.events(),
            vec![StudioEvent::NodeAdded {
                node_id: node.id.clone(),
                label: "Valuation Modeling".to_string(),
            }]
        );
    }

    #[test]
    fn test_update_node_data_is_idempotent() {
        let (mut store, _) = store();
        let id = store.nodes()[0].id.clone();

        store.update_node_data(&id, patch("a", 1.0));
        let once = store.graph().clone();
        store.update_node_data(&id, patch("a", 1.0));
        assert_eq!(store.graph(), &once);
        assert_eq!(store.nodes()[0].data.get("a"), Some(&DataValue::Number(1.0)));
        assert!(store.nodes()[0].data.get("schedule").is_some());
    }

    #[test]
    fn test_empty_label_patch_keeps_label() {
        let (mut store, _) = store();
        let id = store.nodes()[0].id.clone();
        let before = store.nodes()[0].label().to_string();

        store.update_node_data(&id, patch("label", ""));
        assert_eq!(store.nodes()[0].label(), before);
        assert!(!store.nodes()[0].label().is_empty());

        store.update_node_data(&id, patch("label", "Morning Open"));
        assert_eq!(store.nodes()[0].label(), "Morning Open");
    }

    #[test]
    fn test_no_op_mutations_leave_graph_unchanged() {
        let (mut store, _) = store();
        let before = store.graph().clone();

        store.update_node_data("does-not-exist", patch("a", 1.0));
        store.apply_edge_changes(vec![EdgeChange::Remove { id: "ghost".to_string() }]);
        store.apply_node_changes(vec![NodeChange::Remove { id: "ghost".to_string() }]);

        assert_eq!(store.graph(), &before);
    }

    #[test]
    fn test_connect_drops_self_loops_and_half_connections() {
        let (mut store, _) = store();
        let id = store.nodes()[0].id.clone();

        assert!(store.connect(Connection::new(id.clone(), id)).is_none());
        assert!(store.connect(Connection::default()).is_none());
        assert_eq!(store.edges().len(), 1);
    }

    #[test]
    fn test_removing_node_leaves_dangling_edge_by_default() {
        let (mut store, _) = store();
        let trigger = store.nodes()[0].id.clone();
        store.set_selected_node(Some(trigger.as_str()));

        store.apply_node_changes(vec![NodeChange::Remove { id: trigger }]);

        assert_eq!(store.nodes().len(), 1);
        assert_eq!(store.edges().len(), 1);
        assert_eq!(store.graph().dangling_edges().len(), 1);
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_cascade_edge_removal_option() {
        let options = StoreOptions {
            cascade_edge_removal: true,
            ..StoreOptions::default()
        };
        let mut store = GraphStore::with_options(options, Arc::new(VecEventSink::new()));
        let trigger = store.nodes()[0].id.clone();

        store.apply_node_changes(vec![NodeChange::Remove { id: trigger }]);
        assert!(store.edges().is_empty());
    }

    #[test]
    fn test_removed_id_is_never_reused() {
        let (mut store, _) = store();
        let node = store.add_node("alert", Position::default());
        store.apply_node_changes(vec![NodeChange::Remove { id: node.id.clone() }]);
        store.apply_node_changes(vec![NodeChange::Add { item: node.clone() }]);
        assert!(store.graph().find_node(&node.id).is_none());

        let next = store.add_node("alert", Position::default());
        assert_ne!(next.id, node.id);
    }

    #[test]
    fn test_selection_tracks_single_node() {
        let (mut store, _) = store();
        let first = store.nodes()[0].id.clone();
        let second = store.nodes()[1].id.clone();

        store.set_selected_node(Some(first.as_str()));
        store.set_selected_node(Some(second.as_str()));
        assert_eq!(store.selected_node().map(|n| n.id.as_str()), Some(second.as_str()));

        store.set_selected_node(Some("ghost"));
        assert_eq!(store.selected_node().map(|n| n.id.as_str()), Some(second.as_str()));

        store.set_selected_node(None);
        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_undo_redo_restores_graph() {
        let (mut store, _) = store();
        store.checkpoint().unwrap();
        store.add_node("newsFeed", Position::default());
        store.rename("Earnings Watch");
        store.checkpoint().unwrap();

        assert!(store.undo().unwrap());
        assert_eq!(store.nodes().len(), 2);
        assert_eq!(store.name(), DEFAULT_GRAPH_NAME);

        assert!(store.redo().unwrap());
        assert_eq!(store.nodes().len(), 3);
        assert_eq!(store.name(), "Earnings Watch");
        assert!(!store.redo().unwrap());
    }

    #[test]
    fn test_save_workflow_returns_wire_json() {
        let (mut store, sink) = store();
        store.rename("Deal Flow");
        let json = store.save_workflow().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Deal Flow");
        assert_eq!(value["nodes"][0]["type"], "trigger");
        assert_eq!(value["edges"][0]["animated"], true);
        assert!(matches!(
            sink.events().last(),
            Some(StudioEvent::WorkflowSaved { node_count: 2, edge_count: 1, .. })
        ));
    }
}
