//! Change batches produced by the editor surface
//!
//! The graph-drawing surface translates gestures (drag, delete, click,
//! resize) into batches of change descriptors. The store applies each batch
//! in one step. Changes naming an unknown ID are ignored.

use serde::{Deserialize, Serialize};

use crate::ids::IdGenerator;
use crate::types::{Dimensions, EdgeId, GraphEdge, GraphNode, NodeId, Position};

/// A single change to the node collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    /// Node moved; `position` is absent when the surface only reports drag state
    #[serde(rename_all = "camelCase")]
    Position {
        id: NodeId,
        #[serde(default)]
        position: Option<Position>,
        #[serde(default)]
        dragging: bool,
    },
    /// Node measured by the renderer
    Dimensions {
        id: NodeId,
        dimensions: Dimensions,
    },
    Select {
        id: NodeId,
        selected: bool,
    },
    Remove {
        id: NodeId,
    },
    Add {
        item: GraphNode,
    },
    /// Swap a node wholesale; the node type cannot change
    Replace {
        id: NodeId,
        item: GraphNode,
    },
}

/// A single change to the edge collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select {
        id: EdgeId,
        selected: bool,
    },
    Remove {
        id: EdgeId,
    },
    Add {
        item: GraphEdge,
    },
    Replace {
        id: EdgeId,
        item: GraphEdge,
    },
}

/// Apply a node batch in place, returning the IDs of removed nodes
pub(crate) fn apply_node_changes(
    nodes: &mut Vec<GraphNode>,
    changes: Vec<NodeChange>,
    ids: &mut IdGenerator,
) -> Vec<NodeId> {
    let mut removed = Vec::new();

    for change in changes {
        match change {
            NodeChange::Position { id, position, .. } => {
                if let (Some(node), Some(position)) = (find_node(nodes, &id), position) {
                    node.position = position;
                }
            }
            NodeChange::Dimensions { id, dimensions } => {
                if let Some(node) = find_node(nodes, &id) {
                    node.measured = Some(dimensions);
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = find_node(nodes, &id) {
                    node.selected = selected;
                }
            }
            NodeChange::Remove { id } => {
                if let Some(index) = nodes.iter().position(|n| n.id == id) {
                    nodes.remove(index);
                    removed.push(id);
                }
            }
            NodeChange::Add { item } => {
                if nodes.iter().any(|n| n.id == item.id) || !ids.reserve_node_id(&item.id) {
                    log::warn!("Ignoring add of node with duplicate id '{}'", item.id);
                    continue;
                }
                nodes.push(item);
            }
            NodeChange::Replace { id, item } => {
                let Some(node) = find_node(nodes, &id) else {
                    continue;
                };
                if item.id != id || item.node_type() != node.node_type() {
                    log::warn!("Ignoring replace of node '{}' that changes its id or type", id);
                    continue;
                }
                *node = item;
            }
        }
    }

    removed
}

/// Apply an edge batch in place
pub(crate) fn apply_edge_changes(
    edges: &mut Vec<GraphEdge>,
    changes: Vec<EdgeChange>,
    ids: &mut IdGenerator,
) {
    for change in changes {
        match change {
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = edges.iter_mut().find(|e| e.id == id) {
                    edge.selected = selected;
                }
            }
            EdgeChange::Remove { id } => {
                edges.retain(|e| e.id != id);
            }
            EdgeChange::Add { item } => {
                if edges.iter().any(|e| e.id == item.id) || !ids.reserve_edge_id(&item.id) {
                    log::warn!("Ignoring add of edge with duplicate id '{}'", item.id);
                    continue;
                }
                edges.push(item);
            }
            EdgeChange::Replace { id, item } => {
                if item.id != id {
                    log::warn!("Ignoring replace of edge '{}' that changes its id", id);
                    continue;
                }
                if let Some(edge) = edges.iter_mut().find(|e| e.id == id) {
                    *edge = item;
                }
            }
        }
    }
}

fn find_node<'a>(nodes: &'a mut [GraphNode], id: &str) -> Option<&'a mut GraphNode> {
    nodes.iter_mut().find(|n| n.id == id)
}
