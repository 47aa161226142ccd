//! Simulated workflow execution
//!
//! "Running" a workflow performs no computation. The sequencer picks the
//! nodes that take part in at least one edge, schedules one processing
//! notification per node after an independent random delay, and once all
//! of them have fired, waits a fixed trailing delay before reporting
//! completion and clearing the store's running flag.
//!
//! Processing notifications carry no ordering guarantee relative to each
//! other; delays ignore topology. Completion always comes after every
//! processing notification of its run.
//!
//! Each run moves through `Idle -> Running -> Completed` ([`RunPhase`]).
//! Runs are not mutually exclusive: starting a run while another is active
//! overlaps them, and whichever completes first clears the running flag.
//!
//! Time is virtual. Callers advance the clock with [`ExecutionSequencer::advance_to`]
//! (tests) or let [`crate::runtime`] advance it from tokio's clock.

pub mod delay;
pub mod scheduler;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::events::StudioEvent;
use crate::store::GraphStore;
use crate::types::NodeId;

use delay::{DelaySource, UniformDelay};
use scheduler::{Millis, VirtualScheduler};

/// Identifier of one workflow run
pub type RunId = String;

/// Timing parameters of the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerOptions {
    /// Lower bound of the per-node processing delay
    pub min_delay_ms: Millis,
    /// Upper bound of the per-node processing delay
    pub max_delay_ms: Millis,
    /// Pause between the last processing notification and completion
    pub completion_delay_ms: Millis,
    /// Time a single-node test takes to report back
    pub test_delay_ms: Millis,
    /// Seed for reproducible delays
    pub seed: Option<u64>,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 2000,
            completion_delay_ms: 1000,
            test_delay_ms: 1500,
            seed: None,
        }
    }
}

/// Lifecycle of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    /// Waiting on processing notifications for `pending`
    Running { pending: BTreeSet<NodeId> },
    Completed,
}

struct RunProgress {
    phase: RunPhase,
    fired: usize,
    total: usize,
}

enum Timer {
    Process {
        run_id: RunId,
        node_id: NodeId,
        label: String,
    },
    Complete {
        run_id: RunId,
    },
    TestComplete {
        node_id: NodeId,
        label: String,
    },
}

pub struct ExecutionSequencer {
    options: SequencerOptions,
    delays: Box<dyn DelaySource>,
    scheduler: VirtualScheduler<Timer>,
    runs: HashMap<RunId, RunProgress>,
    run_counter: u64,
}

impl ExecutionSequencer {
    /// Create a sequencer drawing uniform random delays
    pub fn new(options: SequencerOptions) -> Self {
        let delays: Box<dyn DelaySource> = match options.seed {
            Some(seed) => Box::new(UniformDelay::seeded(
                options.min_delay_ms,
                options.max_delay_ms,
                seed,
            )),
            None => Box::new(UniformDelay::new(options.min_delay_ms, options.max_delay_ms)),
        };
        Self::with_delays(options, delays)
    }

    /// Create a sequencer with an explicit delay source
    pub fn with_delays(options: SequencerOptions, delays: Box<dyn DelaySource>) -> Self {
        Self {
            options,
            delays,
            scheduler: VirtualScheduler::new(),
            runs: HashMap::new(),
            run_counter: 0,
        }
    }

    pub fn options(&self) -> &SequencerOptions {
        &self.options
    }

    /// Current reading of the sequencer clock
    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    /// Deadline of the next pending notification
    pub fn next_deadline(&self) -> Option<Millis> {
        self.scheduler.next_deadline()
    }

    /// True when no notification is pending for any run or test
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Phase of a run; unknown run IDs are `Idle`
    ///
    /// Progress is dropped once a run completes, so any ID this sequencer
    /// issued that is no longer tracked has completed.
    pub fn phase(&self, run_id: &str) -> RunPhase {
        if let Some(progress) = self.runs.get(run_id) {
            return progress.phase.clone();
        }
        match run_id.strip_prefix("run-").and_then(|n| n.parse::<u64>().ok()) {
            Some(n) if (1..=self.run_counter).contains(&n) => RunPhase::Completed,
            _ => RunPhase::Idle,
        }
    }

    /// Start a simulated run of the store's current graph
    pub fn run(&mut self, store: &mut GraphStore) -> RunId {
        if store.is_running() {
            log::warn!("Starting a workflow run while another run is still active");
        }

        self.run_counter += 1;
        let run_id = format!("run-{}", self.run_counter);

        let participants: Vec<(NodeId, String)> = store
            .graph()
            .participants()
            .into_iter()
            .map(|node| (node.id.clone(), node.data.label.clone()))
            .collect();

        store.set_running(true);
        store.notify(StudioEvent::WorkflowRunning {
            run_id: run_id.clone(),
            participants: participants.len(),
            at_ms: self.now(),
        });
        log::info!(
            "Workflow '{}' running as {} with {} participating nodes",
            store.name(),
            run_id,
            participants.len()
        );

        if participants.is_empty() {
            self.scheduler.schedule_after(
                self.options.completion_delay_ms,
                Timer::Complete {
                    run_id: run_id.clone(),
                },
            );
        } else {
            for (node_id, label) in &participants {
                let delay = self.delays.next_delay();
                self.scheduler.schedule_after(
                    delay,
                    Timer::Process {
                        run_id: run_id.clone(),
                        node_id: node_id.clone(),
                        label: label.clone(),
                    },
                );
            }
        }

        let pending: BTreeSet<NodeId> = participants.into_iter().map(|(id, _)| id).collect();
        let total = pending.len();
        self.runs.insert(
            run_id.clone(),
            RunProgress {
                phase: RunPhase::Running { pending },
                fired: 0,
                total,
            },
        );

        run_id
    }

    /// Simulate a single node with sample input
    ///
    /// Emits the start notification immediately and the result after the
    /// configured test delay. Returns false for an unknown node.
    pub fn test_node(&mut self, store: &GraphStore, node_id: &str) -> bool {
        let Some(node) = store.graph().find_node(node_id) else {
            log::debug!("Ignoring test of unknown node '{}'", node_id);
            return false;
        };
        let label = node.data.label.clone();

        store.notify(StudioEvent::NodeTestStarted {
            node_id: node_id.to_string(),
            label: label.clone(),
            at_ms: self.now(),
        });
        self.scheduler.schedule_after(
            self.options.test_delay_ms,
            Timer::TestComplete {
                node_id: node_id.to_string(),
                label,
            },
        );
        true
    }

    /// Fire every notification due at or before `now`
    ///
    /// Returns the number of notifications fired.
    pub fn advance_to(&mut self, now: Millis, store: &mut GraphStore) -> usize {
        let mut fired = 0;
        while let Some((at, timer)) = self.scheduler.pop_due(now) {
            self.fire(at, timer, store);
            fired += 1;
        }
        self.scheduler.advance_clock(now);
        fired
    }

    /// Advance the clock by `delta` milliseconds
    pub fn advance_by(&mut self, delta: Millis, store: &mut GraphStore) -> usize {
        let target = self.now().saturating_add(delta);
        self.advance_to(target, store)
    }

    /// Fire everything that is pending, returning the final clock reading
    pub fn run_until_idle(&mut self, store: &mut GraphStore) -> Millis {
        while let Some(deadline) = self.next_deadline() {
            self.advance_to(deadline, store);
        }
        self.now()
    }

    fn fire(&mut self, at: Millis, timer: Timer, store: &mut GraphStore) {
        match timer {
            Timer::Process { run_id, node_id, label } => {
                store.notify(StudioEvent::NodeProcessing {
                    run_id: run_id.clone(),
                    node_id: node_id.clone(),
                    label,
                    at_ms: at,
                });

                let Some(progress) = self.runs.get_mut(&run_id) else {
                    return;
                };
                progress.fired += 1;
                if let RunPhase::Running { pending } = &mut progress.phase {
                    pending.remove(&node_id);
                }
                if progress.fired == progress.total {
                    self.scheduler.schedule_after(
                        self.options.completion_delay_ms,
                        Timer::Complete { run_id },
                    );
                }
            }
            Timer::Complete { run_id } => {
                self.runs.remove(&run_id);
                store.set_running(false);
                store.notify(StudioEvent::WorkflowComplete {
                    run_id: run_id.clone(),
                    at_ms: at,
                });
                log::info!("Workflow run {} complete at {}ms", run_id, at);
            }
            Timer::TestComplete { node_id, label } => {
                store.notify(StudioEvent::NodeTestComplete {
                    node_id,
                    label,
                    at_ms: at,
                });
            }
        }
    }
}

impl Default for ExecutionSequencer {
    fn default() -> Self {
        Self::new(SequencerOptions::default())
    }
}
