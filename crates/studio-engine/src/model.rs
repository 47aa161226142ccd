//! Construction rules for nodes and edges
//!
//! The model holds no state of its own. It turns a requested type or
//! connection into a fully formed value with a fresh ID; the store decides
//! what to do with it.

use crate::catalog;
use crate::error::{Result, StudioError};
use crate::ids::IdGenerator;
use crate::types::{Connection, EdgeKind, GraphEdge, GraphNode, NodeType, Position};

/// Rules applied when turning a connection into an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionPolicy {
    /// Accept edges whose source and target are the same node
    pub allow_self_loops: bool,
}

/// Build a node of `node_type` at `position` with catalog defaults
pub fn create_node(ids: &mut IdGenerator, node_type: &str, position: Position) -> GraphNode {
    let node_type = NodeType::from(node_type);
    let data = catalog::resolve_defaults(&node_type);
    let id = ids.node_id(&node_type);
    GraphNode::new(id, node_type, position, data)
}

/// Build an animated edge from a connection
///
/// Fails when an endpoint is missing, or when the connection is a
/// self-loop and the policy forbids those.
pub fn create_edge(
    ids: &mut IdGenerator,
    connection: &Connection,
    policy: ConnectionPolicy,
) -> Result<GraphEdge> {
    let (Some(source), Some(target)) = (&connection.source, &connection.target) else {
        return Err(StudioError::invalid_connection("connection is missing an endpoint"));
    };

    if source == target && !policy.allow_self_loops {
        return Err(StudioError::invalid_connection(format!(
            "node '{}' cannot connect to itself",
            source
        )));
    }

    Ok(GraphEdge {
        id: ids.edge_id(source, target),
        source: source.clone(),
        target: target.clone(),
        source_handle: connection.source_handle.clone(),
        target_handle: connection.target_handle.clone(),
        kind: EdgeKind::SmoothStep,
        animated: true,
        selected: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    #[test]
    fn test_create_node_uses_catalog_defaults() {
        let mut ids = IdGenerator::new();
        let node = create_node(&mut ids, "valuationModeling", Position::new(1.0, 2.0));
        assert_eq!(node.node_type(), &NodeType::Known(NodeKind::ValuationModeling));
        assert_eq!(node.data.text("discountRate"), Some("10%"));
        assert_eq!(node.position, Position::new(1.0, 2.0));
    }

    #[test]
    fn test_create_node_for_every_kind_and_fallback() {
        let mut ids = IdGenerator::new();
        let names = NodeKind::ALL
            .iter()
            .map(|k| k.as_str())
            .chain(["notARealNodeType"]);
        for name in names {
            let node = create_node(&mut ids, name, Position::default());
            assert!(!node.label().is_empty(), "{} produced an empty label", name);
        }
    }

    #[test]
    fn test_create_edge_is_animated_smoothstep() {
        let mut ids = IdGenerator::new();
        let edge = create_edge(
            &mut ids,
            &Connection::new("a", "b").with_handles("out", "in"),
            ConnectionPolicy::default(),
        )
        .unwrap();
        assert_eq!(edge.kind, EdgeKind::SmoothStep);
        assert!(edge.animated);
        assert_eq!(edge.source_handle.as_deref(), Some("out"));
    }

    #[test]
    fn test_create_edge_rejects_self_loop_by_default() {
        let mut ids = IdGenerator::new();
        let result = create_edge(&mut ids, &Connection::new("a", "a"), ConnectionPolicy::default());
        assert!(matches!(result, Err(StudioError::InvalidConnection(_))));

        let allowed = ConnectionPolicy { allow_self_loops: true };
        assert!(create_edge(&mut ids, &Connection::new("a", "a"), allowed).is_ok());
    }

    #[test]
    fn test_create_edge_rejects_missing_endpoint() {
        let mut ids = IdGenerator::new();
        let half = Connection {
            source: Some("a".to_string()),
            ..Connection::default()
        };
        assert!(create_edge(&mut ids, &half, ConnectionPolicy::default()).is_err());
    }
}
