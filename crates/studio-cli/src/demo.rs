//! Scripted editor session
//!
//! Builds a small research pipeline on top of the seed graph, runs it in
//! real time, tests one node, and saves the result. Notifications are
//! printed to stderr as they arrive; the saved JSON goes to stdout.

use std::sync::Arc;

use anyhow::{Context, Result};

use studio_engine::runtime;
use studio_engine::{
    ChannelEventSink, Connection, GraphStore, NodeKind, Position, SessionManager, StudioEvent,
};

use crate::config::StudioConfig;

/// Node types of the demo pipeline, fed by the seed orchestrator
const SOURCES: [NodeKind; 2] = [NodeKind::MarketData, NodeKind::NewsFeed];
const ANALYSES: [NodeKind; 2] = [NodeKind::SentimentAnalysis, NodeKind::RiskAssessment];

pub async fn run(config: &StudioConfig, seed: Option<u64>, extra_nodes: usize) -> Result<()> {
    let mut options = config.session_options();
    if seed.is_some() {
        options.sequencer.seed = seed;
    }
    let manager = SessionManager::with_timeout(options, config.stale_timeout());

    let (sink, mut events) = ChannelEventSink::new();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    let session_id = manager.create_session(Arc::new(sink)).await;
    let session = manager.session(&session_id).await?;

    session.with_store(|store| build_pipeline(store, extra_nodes));
    for issue in session.with_store(|store| store.validate()) {
        log::warn!("{}", issue);
    }

    let run_id = runtime::run_workflow(session.clone())
        .await
        .context("workflow run did not finish")?;
    log::info!("{} finished", run_id);

    let report = session.with_store(|store| store.nodes().last().map(|n| n.id.clone()));
    if let Some(node_id) = report {
        session.test_node(&node_id);
        runtime::drive(session.clone())
            .await
            .context("node test did not finish")?;
    }

    let json = session
        .with_store(|store| store.save_workflow())
        .context("failed to serialize workflow")?;

    manager.close_session(&session_id).await?;
    drop(session);
    drop(manager);
    printer.await?;

    println!("{}", json);
    Ok(())
}

/// Lay out the demo pipeline and return the number of edges created
///
/// `extra_nodes` unconnected nodes are appended below the pipeline; they
/// stay out of every run.
pub fn build_pipeline(store: &mut GraphStore, extra_nodes: usize) -> usize {
    store.rename("Equity Research Pipeline");

    let Some(orchestrator) = store
        .nodes()
        .iter()
        .find(|n| n.node_type().kind() == Some(NodeKind::Orchestrator))
        .map(|n| n.id.clone())
    else {
        log::warn!("Seed graph has no orchestrator; skipping pipeline");
        return 0;
    };

    let before = store.edges().len();
    let sources: Vec<String> = SOURCES
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let x = 100.0 + 300.0 * i as f64;
            store.add_node(kind.as_str(), Position::new(x, 350.0)).id
        })
        .collect();
    let analyses: Vec<String> = ANALYSES
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let x = 100.0 + 300.0 * i as f64;
            store.add_node(kind.as_str(), Position::new(x, 500.0)).id
        })
        .collect();
    let report = store
        .add_node(NodeKind::Report.as_str(), Position::new(250.0, 650.0))
        .id;

    for source in &sources {
        store.connect(Connection::new(orchestrator.as_str(), source.as_str()));
    }
    for (source, analysis) in sources.iter().zip(&analyses) {
        store.connect(Connection::new(source.as_str(), analysis.as_str()));
        store.connect(Connection::new(analysis.as_str(), report.as_str()));
    }
    let edges = store.edges().len() - before;

    for i in 0..extra_nodes {
        let kind = NodeKind::ALL[i % NodeKind::ALL.len()];
        let position = Position::new(600.0 + 50.0 * i as f64, 800.0);
        store.add_node(kind.as_str(), position);
    }

    edges
}

fn print_event(event: &StudioEvent) {
    let notification = event.notification();
    match event {
        StudioEvent::NodeProcessing { at_ms, .. }
        | StudioEvent::WorkflowRunning { at_ms, .. }
        | StudioEvent::WorkflowComplete { at_ms, .. }
        | StudioEvent::NodeTestStarted { at_ms, .. }
        | StudioEvent::NodeTestComplete { at_ms, .. } => {
            eprintln!("[{:>6}ms] {}: {}", at_ms, notification.title, notification.description);
        }
        StudioEvent::NodeAdded { .. } | StudioEvent::WorkflowSaved { .. } => {
            eprintln!("          {}: {}", notification.title, notification.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_engine::{ExecutionSequencer, NullEventSink, SequencerOptions};

    #[test]
    fn test_pipeline_connects_every_new_node() {
        let mut store = GraphStore::new(Arc::new(NullEventSink));
        let edges = build_pipeline(&mut store, 0);

        assert_eq!(edges, 6);
        assert_eq!(store.nodes().len(), 7);
        assert_eq!(store.edges().len(), 7);
        assert_eq!(store.graph().participants().len(), 7);
        assert!(store.validate().is_empty());
    }

    #[test]
    fn test_extra_nodes_stay_idle() {
        let mut store = GraphStore::new(Arc::new(NullEventSink));
        build_pipeline(&mut store, 3);

        assert_eq!(store.nodes().len(), 10);
        assert_eq!(store.graph().participants().len(), 7);
        assert_eq!(store.graph().idle_nodes().len(), 3);
    }

    #[test]
    fn test_pipeline_run_completes() {
        let mut store = GraphStore::new(Arc::new(NullEventSink));
        build_pipeline(&mut store, 2);

        let options = SequencerOptions {
            seed: Some(42),
            ..SequencerOptions::default()
        };
        let mut sequencer = ExecutionSequencer::new(options);
        sequencer.run(&mut store);
        assert!(store.is_running());

        let finished = sequencer.run_until_idle(&mut store);
        assert!(!store.is_running());
        assert!(finished >= 500 + 1000);
        assert!(finished <= 2000 + 1000);
    }
}
