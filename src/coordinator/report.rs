//! Result of a completed run

use crate::channel::PartialResult;
use crate::config::TransportKind;
use crate::partition::Partition;
use crate::util::resource::RunTiming;
use serde::Serialize;

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Where the input came from
    pub source: String,
    /// Number of input elements
    pub elements: usize,
    /// Sum of every partial result
    pub total: i64,
    pub requested_workers: usize,
    /// Workers actually launched, `min(requested, elements)`
    pub effective_workers: usize,
    pub transport: TransportKind,
    pub partitions: Vec<Partition>,
    /// One entry per worker, ordered by worker index
    pub partials: Vec<PartialResult>,
    /// Measured from dispatch through aggregation
    pub timing: RunTiming,
}

impl RunReport {
    /// Whether the worker count was reduced to the element count
    pub fn clamped(&self) -> bool {
        self.effective_workers < self.requested_workers
    }
}
