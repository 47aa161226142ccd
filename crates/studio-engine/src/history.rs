//! Undo/redo history using compressed snapshots
//!
//! Each checkpoint stores the whole graph as zstd-compressed JSON. Graphs
//! in the editor are small, so a snapshot costs a few hundred bytes and no
//! mutation needs an inverse operation.

use std::collections::VecDeque;

use crate::error::{Result, StudioError};
use crate::types::WorkflowGraph;

const COMPRESSION_LEVEL: i32 = 3;

/// One compressed graph state
#[derive(Debug, Clone)]
struct Snapshot(Vec<u8>);

impl Snapshot {
    fn capture(graph: &WorkflowGraph) -> Result<Self> {
        let json = serde_json::to_vec(graph)?;
        zstd::encode_all(&json[..], COMPRESSION_LEVEL)
            .map(Snapshot)
            .map_err(|e| StudioError::Compression(e.to_string()))
    }

    fn restore(&self) -> Result<WorkflowGraph> {
        let json = zstd::decode_all(&self.0[..])
            .map_err(|e| StudioError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Bounded linear history of graph states with a cursor
#[derive(Debug)]
pub struct GraphHistory {
    snapshots: VecDeque<Snapshot>,
    /// Index of the state the graph currently matches
    cursor: usize,
    depth: usize,
}

impl GraphHistory {
    /// Create a history that keeps at most `depth` states
    pub fn new(depth: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            cursor: 0,
            depth: depth.max(1),
        }
    }

    /// Record `graph` as the newest state, discarding any redo branch
    pub fn record(&mut self, graph: &WorkflowGraph) -> Result<()> {
        let snapshot = Snapshot::capture(graph)?;

        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push_back(snapshot);

        if self.snapshots.len() > self.depth {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
        Ok(())
    }

    /// Step back one state
    pub fn step_back(&mut self) -> Option<Result<WorkflowGraph>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.snapshots[self.cursor].restore())
    }

    /// Step forward one state
    pub fn step_forward(&mut self) -> Option<Result<WorkflowGraph>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.snapshots[self.cursor].restore())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Total compressed size of all snapshots in bytes
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(|s| s.0.len()).sum()
    }
}

impl Default for GraphHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(name: &str) -> WorkflowGraph {
        WorkflowGraph::new(name)
    }

    #[test]
    fn test_step_back_and_forward() {
        let mut history = GraphHistory::new(10);
        history.record(&graph("first")).unwrap();
        history.record(&graph("second")).unwrap();
        history.record(&graph("third")).unwrap();

        assert_eq!(history.step_back().unwrap().unwrap().name, "second");
        assert_eq!(history.step_back().unwrap().unwrap().name, "first");
        assert!(history.step_back().is_none());

        assert_eq!(history.step_forward().unwrap().unwrap().name, "second");
    }

    #[test]
    fn test_record_discards_redo_branch() {
        let mut history = GraphHistory::new(10);
        history.record(&graph("first")).unwrap();
        history.record(&graph("second")).unwrap();
        history.step_back();

        history.record(&graph("third")).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.snapshots.len(), 2);
        assert_eq!(history.step_back().unwrap().unwrap().name, "first");
    }

    #[test]
    fn test_depth_limit_drops_oldest() {
        let mut history = GraphHistory::new(3);
        for i in 0..5 {
            history.record(&graph(&format!("graph_{}", i))).unwrap();
        }
        assert_eq!(history.snapshots.len(), 3);
        history.step_back();
        assert_eq!(history.step_back().unwrap().unwrap().name, "graph_2");
        assert!(!history.can_undo());
        assert!(history.compressed_size() > 0);
    }
}
