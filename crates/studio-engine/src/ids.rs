//! Identifier allocation for nodes and edges
//!
//! IDs combine a readable prefix with a monotonically increasing counter, so
//! two nodes of the same type created in the same tick still differ. Every ID
//! the generator hands out or is told about stays reserved for the lifetime
//! of the store, which keeps removed IDs from ever being reissued.

use std::collections::HashSet;

use crate::types::{EdgeId, NodeId, NodeType};

#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    counter: u64,
    node_ids: HashSet<NodeId>,
    edge_ids: HashSet<EdgeId>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh node ID such as `marketData-7`
    pub fn node_id(&mut self, node_type: &NodeType) -> NodeId {
        loop {
            self.counter += 1;
            let id = format!("{}-{}", node_type, self.counter);
            if self.node_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Allocate a fresh edge ID such as `edge-trigger-1-orchestrator-2-3`
    pub fn edge_id(&mut self, source: &str, target: &str) -> EdgeId {
        loop {
            self.counter += 1;
            let id = format!("edge-{}-{}-{}", source, target, self.counter);
            if self.edge_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Reserve a node ID supplied from outside (e.g. an `add` change)
    ///
    /// Returns false if the ID was already issued or reserved.
    pub fn reserve_node_id(&mut self, id: &str) -> bool {
        self.node_ids.insert(id.to_string())
    }

    /// Reserve an edge ID supplied from outside
    pub fn reserve_edge_id(&mut self, id: &str) -> bool {
        self.edge_ids.insert(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    #[test]
    fn test_same_type_ids_differ() {
        let mut ids = IdGenerator::new();
        let node_type = NodeType::Known(NodeKind::MarketData);
        let first = ids.node_id(&node_type);
        let second = ids.node_id(&node_type);
        assert_ne!(first, second);
        assert!(first.starts_with("marketData-"));
    }

    #[test]
    fn test_generated_ids_skip_reserved() {
        let mut ids = IdGenerator::new();
        assert!(ids.reserve_node_id("alert-1"));
        assert!(!ids.reserve_node_id("alert-1"));

        let id = ids.node_id(&NodeType::Known(NodeKind::Alert));
        assert_eq!(id, "alert-2");
    }

    #[test]
    fn test_edge_ids_are_unique_for_parallel_edges() {
        let mut ids = IdGenerator::new();
        let a = ids.edge_id("x", "y");
        let b = ids.edge_id("x", "y");
        assert_ne!(a, b);
    }
}
