//! Coordinator module
//!
//! Orchestrates workers and aggregates results. A `Coordinator` performs a
//! single run through a fixed sequence of states:
//!
//! 1. **load**: obtain the input sequence from a `SequenceSource`
//! 2. **partition**: split it into `min(k, N)` contiguous ranges
//! 3. **dispatch**: reset the result channel and launch one worker thread per range
//! 4. **await_barrier**: block until every launched worker has terminated
//! 5. **aggregate**: drain the channel, verify one result per worker, and sum
//!
//! `run()` performs all five. Each step is also public so callers can observe
//! the intermediate states. A step called out of order fails with
//! `InvalidState` and leaves the state untouched; any other error moves the
//! coordinator to `Failed` for good.
//!
//! # Example
//!
//! ```
//! use parsum::channel::MemoryChannel;
//! use parsum::coordinator::{Coordinator, CoordinatorState};
//! use parsum::input::MemorySource;
//!
//! let mut coordinator = Coordinator::new(2, Box::new(MemoryChannel::new()));
//! let report = coordinator.run(&MemorySource::new(vec![5, 10, 15, 20]))?;
//!
//! assert_eq!(report.total, 50);
//! assert_eq!(coordinator.state(), CoordinatorState::Done);
//! # Ok::<(), parsum::error::ReduceError>(())
//! ```

pub mod report;
pub mod state;

pub use report::RunReport;
pub use state::CoordinatorState;

use crate::barrier::{BarrierReport, CompletionBarrier};
use crate::channel::{self, PartialResult, ResultChannel};
use crate::config::Config;
use crate::error::{ReduceError, ReduceResult};
use crate::input::{InputSequence, SequenceSource};
use crate::partition::{self, PartitionPlan};
use crate::util::resource::ResourceSnapshot;
use crate::worker::Worker;
use log::{debug, error, info, warn};
use std::thread::JoinHandle;
use std::time::Duration;

/// Workers that have been launched but not yet collected
struct InFlight {
    barrier: CompletionBarrier,
    handles: Vec<JoinHandle<()>>,
}

/// Drives one partition / dispatch / barrier / aggregate run
pub struct Coordinator {
    state: CoordinatorState,
    requested_workers: usize,
    barrier_timeout: Option<Duration>,
    channel: Box<dyn ResultChannel>,

    source: Option<String>,
    sequence: Option<InputSequence>,
    plan: Option<PartitionPlan>,
    in_flight: Option<InFlight>,
    barrier_report: Option<BarrierReport>,
    started: Option<ResourceSnapshot>,

    report: Option<RunReport>,
    error: Option<ReduceError>,
}

impl Coordinator {
    /// Create a coordinator for `requested_workers` workers delivering over `channel`
    pub fn new(requested_workers: usize, channel: Box<dyn ResultChannel>) -> Self {
        Self {
            state: CoordinatorState::Idle,
            requested_workers,
            barrier_timeout: None,
            channel,
            source: None,
            sequence: None,
            plan: None,
            in_flight: None,
            barrier_report: None,
            started: None,
            report: None,
            error: None,
        }
    }

    /// Create a coordinator from the worker, transport and runtime sections
    pub fn from_config(config: &Config) -> ReduceResult<Self> {
        let channel = channel::create_channel(&config.transport)?;
        Ok(Self::new(config.workers.count, channel)
            .with_barrier_timeout(config.runtime.barrier_timeout()))
    }

    /// Bound the barrier wait; `None` waits indefinitely
    pub fn with_barrier_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.barrier_timeout = timeout;
        self
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn requested_workers(&self) -> usize {
        self.requested_workers
    }

    /// Partition plan, once partitioned
    pub fn plan(&self) -> Option<&PartitionPlan> {
        self.plan.as_ref()
    }

    /// Per-worker outcomes, once the barrier has been passed
    pub fn barrier_report(&self) -> Option<&BarrierReport> {
        self.barrier_report.as_ref()
    }

    /// Final report, once done
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    /// The error that moved the coordinator to `Failed`
    pub fn error(&self) -> Option<&ReduceError> {
        self.error.as_ref()
    }

    /// Perform every step in order
    pub fn run(&mut self, source: &dyn SequenceSource) -> ReduceResult<RunReport> {
        self.load(source)?;
        self.partition()?;
        self.dispatch()?;
        self.await_barrier()?;
        self.aggregate()
    }

    /// `Idle → Loaded`
    pub fn load(&mut self, source: &dyn SequenceSource) -> ReduceResult<()> {
        self.expect_state(CoordinatorState::Idle, "load input")?;

        let name = source.describe();
        let loaded = source.load().and_then(|sequence| {
            if sequence.is_empty() && self.requested_workers > 0 {
                Err(ReduceError::Load(format!("{} contains no elements", name)))
            } else {
                Ok(sequence)
            }
        });
        let sequence = self.track(loaded)?;

        info!("Loaded {} values from {}", sequence.len(), name);
        self.source = Some(name);
        self.sequence = Some(sequence);
        self.state = CoordinatorState::Loaded;
        Ok(())
    }

    /// `Loaded → Partitioned`
    pub fn partition(&mut self) -> ReduceResult<()> {
        self.expect_state(CoordinatorState::Loaded, "partition")?;

        let elements = self.sequence.as_ref().map_or(0, InputSequence::len);
        let plan = self.track(partition::partition(elements, self.requested_workers))?;

        if plan.clamped() {
            warn!(
                "Requested {} workers for {} elements; using {}",
                plan.requested_workers(),
                elements,
                plan.effective_workers()
            );
        }
        for (i, range) in plan.partitions().iter().enumerate() {
            debug!("Worker {} will sum {}", i, range);
        }

        self.plan = Some(plan);
        self.state = CoordinatorState::Partitioned;
        Ok(())
    }

    /// `Partitioned → Dispatched`
    ///
    /// Launches exactly one worker per partition. A worker whose sink or
    /// thread cannot be created counts as failed at the barrier; it is never
    /// silently skipped.
    pub fn dispatch(&mut self) -> ReduceResult<()> {
        self.expect_state(CoordinatorState::Partitioned, "dispatch workers")?;

        let reset = self.channel.reset();
        self.track(reset)?;

        let prepared = match (&self.sequence, &self.plan) {
            (Some(sequence), Some(plan)) => Some((sequence.shared(), plan.partitions().to_vec())),
            _ => None,
        };
        let (data, partitions) = match prepared {
            Some(prepared) => prepared,
            None => {
                let err = ReduceError::InvalidState {
                    state: self.state.to_string(),
                    action: "dispatch workers without a partition plan",
                };
                return self.track(Err(err));
            }
        };

        let started = ResourceSnapshot::take();
        let (barrier, tokens) = CompletionBarrier::new(partitions.len());
        let mut handles = Vec::with_capacity(partitions.len());

        for (token, range) in tokens.into_iter().zip(partitions) {
            let index = token.index();
            let sink = match self.channel.sink(index) {
                Ok(sink) => sink,
                Err(e) => {
                    error!("Worker {}: could not open result sink: {}", index, e);
                    token.fail(e.to_string());
                    continue;
                }
            };

            // On spawn failure the closure is dropped, which drops the token
            // and signals the failure to the barrier.
            match Worker::new(index, range, data.clone()).spawn(sink, token) {
                Ok(handle) => handles.push(handle),
                Err(e) => error!("Worker {}: failed to spawn thread: {}", index, e),
            }
        }

        info!("Dispatched {} workers over {} transport", barrier.expected(), self.channel.kind());
        self.started = Some(started);
        self.in_flight = Some(InFlight { barrier, handles });
        self.state = CoordinatorState::Dispatched;
        Ok(())
    }

    /// `Dispatched → AwaitingBarrier`
    ///
    /// Blocks until every launched worker has terminated. Fails with
    /// `WorkerFailed` for the lowest-indexed worker that produced no result,
    /// or with `BarrierTimeout` if a timeout is configured and expires; in the
    /// timeout case the stragglers keep running detached.
    pub fn await_barrier(&mut self) -> ReduceResult<()> {
        self.expect_state(CoordinatorState::Dispatched, "wait for workers")?;
        self.state = CoordinatorState::AwaitingBarrier;

        let in_flight = match self.in_flight.take() {
            Some(in_flight) => in_flight,
            None => {
                let err = ReduceError::InvalidState {
                    state: self.state.to_string(),
                    action: "wait for workers that were never dispatched",
                };
                return self.track(Err(err));
            }
        };

        let waited = in_flight.barrier.wait(self.barrier_timeout);
        let report = self.track(waited)?;

        // Every worker has signalled; joining only reaps the threads
        for handle in in_flight.handles {
            if handle.join().is_err() {
                debug!("Reaped a panicked worker thread");
            }
        }
        info!("All {} workers have terminated", report.outcomes().len());

        let first_failure = report.failures().first().map(|(index, reason)| {
            error!("Worker {} produced no result: {}", index, reason);
            *index
        });
        self.barrier_report = Some(report);

        if let Some(index) = first_failure {
            return self.track(Err(ReduceError::WorkerFailed { index }));
        }
        Ok(())
    }

    /// `AwaitingBarrier → Aggregating → Done`
    pub fn aggregate(&mut self) -> ReduceResult<RunReport> {
        self.expect_state(CoordinatorState::AwaitingBarrier, "aggregate")?;
        if self.barrier_report.is_none() {
            return Err(ReduceError::InvalidState {
                state: self.state.to_string(),
                action: "aggregate before the barrier is satisfied",
            });
        }
        self.state = CoordinatorState::Aggregating;

        let drained = self.channel.drain();
        let drained = self.track(drained)?;

        let expected = self.plan.as_ref().map_or(0, PartitionPlan::effective_workers);
        let collected = collect_partials(drained, expected);
        let partials = self.track(collected)?;

        let total = sum_partials(&partials);
        let total = self.track(total)?;
        let finished = ResourceSnapshot::take();
        let timing = match self.started {
            Some(ref started) => finished.since(started),
            None => finished.since(&finished),
        };

        let plan = self.plan.take();
        let report = RunReport {
            source: self.source.clone().unwrap_or_default(),
            elements: plan.as_ref().map_or(0, PartitionPlan::total_elements),
            total,
            requested_workers: self.requested_workers,
            effective_workers: expected,
            transport: self.channel.kind(),
            partitions: plan.map(PartitionPlan::into_partitions).unwrap_or_default(),
            partials,
            timing,
        };

        info!("Aggregated {} partial results: total {}", expected, total);
        self.report = Some(report.clone());
        self.state = CoordinatorState::Done;
        Ok(report)
    }

    fn expect_state(&self, expected: CoordinatorState, action: &'static str) -> ReduceResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ReduceError::InvalidState {
                state: self.state.to_string(),
                action,
            })
        }
    }

    /// Record an error as the run's failure
    fn track<T>(&mut self, result: ReduceResult<T>) -> ReduceResult<T> {
        if let Err(ref e) = result {
            self.state = CoordinatorState::Failed;
            self.error = Some(e.clone());
        }
        result
    }
}

/// Check that `drained` holds exactly one result per worker `0..expected`
/// and return them ordered by worker index
fn collect_partials(drained: Vec<PartialResult>, expected: usize) -> ReduceResult<Vec<PartialResult>> {
    let mut slots: Vec<Option<PartialResult>> = vec![None; expected];

    for result in drained {
        match slots.get_mut(result.worker_index) {
            Some(slot) if slot.is_none() => *slot = Some(result),
            _ => {
                return Err(ReduceError::UnexpectedResult {
                    index: result.worker_index,
                })
            }
        }
    }

    let missing: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_none())
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(ReduceError::IncompleteAggregation {
            expected,
            received: expected - missing.len(),
            missing,
        });
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Add up partial sums, rejecting a total that does not fit in `i64`
fn sum_partials(partials: &[PartialResult]) -> ReduceResult<i64> {
    partials.iter().try_fold(0i64, |total, partial| {
        total.checked_add(partial.sum).ok_or_else(|| {
            ReduceError::Transport(format!(
                "partial sum {} from worker {} overflows the total",
                partial.sum, partial.worker_index
            ))
        })
    })
}
