//! Advisory graph validation
//!
//! Reports structural oddities the editor tolerates but a user may want to
//! know about. Nothing here blocks a run or a save.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::WorkflowGraph;

/// A structural issue with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// An edge references a node that no longer exists
    DanglingEdge { edge_id: String, node_id: String },
    /// An edge connects a node to itself
    SelfLoop { edge_id: String, node_id: String },
    /// An edge repeats the endpoints and handles of an earlier edge
    DuplicateEdge { edge_id: String, duplicate_of: String },
    /// A node has no edges and will be skipped by workflow runs
    IdleNode { node_id: String },
    /// The graph contains a cycle
    CycleDetected,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingEdge { edge_id, node_id } => {
                write!(f, "Edge '{}' references missing node '{}'", edge_id, node_id)
            }
            Self::SelfLoop { edge_id, node_id } => {
                write!(f, "Edge '{}' connects node '{}' to itself", edge_id, node_id)
            }
            Self::DuplicateEdge { edge_id, duplicate_of } => {
                write!(f, "Edge '{}' duplicates edge '{}'", edge_id, duplicate_of)
            }
            Self::IdleNode { node_id } => {
                write!(f, "Node '{}' has no connections and will not run", node_id)
            }
            Self::CycleDetected => write!(f, "Cycle detected in graph"),
        }
    }
}

/// Validate a workflow graph
///
/// Returns all issues found (not just the first).
pub fn validate_workflow(graph: &WorkflowGraph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_edge_references(graph, &mut issues);
    check_self_loops_and_duplicates(graph, &mut issues);
    check_idle_nodes(graph, &mut issues);
    detect_cycles(graph, &mut issues);

    issues
}

fn check_edge_references(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &graph.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                issues.push(ValidationIssue::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }
}

fn check_self_loops_and_duplicates(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    for (index, edge) in graph.edges.iter().enumerate() {
        if edge.source == edge.target {
            issues.push(ValidationIssue::SelfLoop {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }
        if let Some(original) = graph.edges[..index].iter().find(|e| e.parallels(edge)) {
            issues.push(ValidationIssue::DuplicateEdge {
                edge_id: edge.id.clone(),
                duplicate_of: original.id.clone(),
            });
        }
    }
}

fn check_idle_nodes(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    for node in graph.idle_nodes() {
        issues.push(ValidationIssue::IdleNode {
            node_id: node.id.clone(),
        });
    }
}

/// Detect cycles using Kahn's algorithm (topological sort)
///
/// Dangling edges are skipped; they take no part in execution order.
fn detect_cycles(graph: &WorkflowGraph, issues: &mut Vec<ValidationIssue>) {
    let mut in_degree: HashMap<&str, usize> =
        graph.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let live_edges: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| in_degree.contains_key(e.source.as_str()) && in_degree.contains_key(e.target.as_str()))
        .collect();

    for edge in &live_edges {
        if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
            *deg += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for edge in graph.outgoing_edges(node_id) {
            if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(edge.target.as_str());
                }
            }
        }
    }

    if visited < graph.nodes.len() {
        issues.push(ValidationIssue::CycleDetected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdGenerator;
    use crate::model::{create_edge, create_node, ConnectionPolicy};
    use crate::types::{Connection, Position};

    fn linked_graph() -> (WorkflowGraph, IdGenerator) {
        let mut ids = IdGenerator::new();
        let mut graph = WorkflowGraph::new("test");
        let a = create_node(&mut ids, "trigger", Position::default());
        let b = create_node(&mut ids, "marketData", Position::default());
        let edge = create_edge(
            &mut ids,
            &Connection::new(a.id.clone(), b.id.clone()),
            ConnectionPolicy::default(),
        )
        .unwrap();
        graph.nodes.push(a);
        graph.nodes.push(b);
        graph.edges.push(edge);
        (graph, ids)
    }

    #[test]
    fn test_clean_graph_has_no_issues() {
        let (graph, _) = linked_graph();
        assert!(validate_workflow(&graph).is_empty());
    }

    #[test]
    fn test_reports_dangling_duplicate_and_idle() {
        let (mut graph, mut ids) = linked_graph();
        let source = graph.nodes[0].id.clone();
        let target = graph.nodes[1].id.clone();
        let duplicate = create_edge(
            &mut ids,
            &Connection::new(source.clone(), target),
            ConnectionPolicy::default(),
        )
        .unwrap();
        let dangling = create_edge(
            &mut ids,
            &Connection::new(source, "ghost"),
            ConnectionPolicy::default(),
        )
        .unwrap();
        graph.edges.push(duplicate);
        graph.edges.push(dangling);
        graph.nodes.push(create_node(&mut ids, "alert", Position::default()));

        let issues = validate_workflow(&graph);
        assert!(issues.iter().any(|i| matches!(i, ValidationIssue::DuplicateEdge { .. })));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DanglingEdge { node_id, .. } if node_id == "ghost")));
        assert!(issues.iter().any(|i| matches!(i, ValidationIssue::IdleNode { .. })));
        assert!(!issues.contains(&ValidationIssue::CycleDetected));
    }

    #[test]
    fn test_detects_cycle_and_self_loop() {
        let (mut graph, mut ids) = linked_graph();
        let a = graph.nodes[0].id.clone();
        let b = graph.nodes[1].id.clone();
        let back = create_edge(&mut ids, &Connection::new(b, a.clone()), ConnectionPolicy::default())
            .unwrap();
        let looped = create_edge(
            &mut ids,
            &Connection::new(a.clone(), a),
            ConnectionPolicy { allow_self_loops: true },
        )
        .unwrap();
        graph.edges.push(back);
        graph.edges.push(looped);

        let issues = validate_workflow(&graph);
        assert!(issues.contains(&ValidationIssue::CycleDetected));
        assert!(issues.iter().any(|i| matches!(i, ValidationIssue::SelfLoop { .. })));
    }
}
