//! Static partitioning of the input index range
//!
//! Splits `[0, N)` into `k` contiguous, non-overlapping, near-equal ranges.
//! The remainder `N mod k` is front-loaded: the first `N mod k` partitions
//! are one element longer than the rest. If more workers are requested than
//! there are elements, the worker count is clamped to `N` so that no worker
//! receives an empty range, and the clamping is visible on the returned plan.
//!
//! # Example
//!
//! ```
//! use parsum::partition::{partition, Partition};
//!
//! let plan = partition(10, 3).unwrap();
//! assert_eq!(plan.effective_workers(), 3);
//! assert_eq!(
//!     plan.partitions(),
//!     &[Partition::new(0, 4), Partition::new(4, 7), Partition::new(7, 10)]
//! );
//! ```

use crate::error::{ReduceError, ReduceResult};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Half-open index range `[start, end)` over the input sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of elements in the range
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Outcome of partitioning: the ranges plus the requested and effective
/// worker counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    partitions: Vec<Partition>,
    requested_workers: usize,
    total_elements: usize,
}

impl PartitionPlan {
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn into_partitions(self) -> Vec<Partition> {
        self.partitions
    }

    pub fn requested_workers(&self) -> usize {
        self.requested_workers
    }

    /// Worker count actually used, `min(requested, N)`
    pub fn effective_workers(&self) -> usize {
        self.partitions.len()
    }

    /// Whether the requested worker count was reduced to the element count
    pub fn clamped(&self) -> bool {
        self.effective_workers() < self.requested_workers
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }
}

/// Partition `[0, total_elements)` across `requested_workers` workers
///
/// # Errors
///
/// Returns `InvalidArgument` when there is nothing to assign
/// (`total_elements == 0`) or nobody to assign it to (`requested_workers == 0`).
pub fn partition(total_elements: usize, requested_workers: usize) -> ReduceResult<PartitionPlan> {
    if requested_workers == 0 {
        return Err(ReduceError::InvalidArgument(
            "worker count must be at least 1".to_string(),
        ));
    }
    if total_elements == 0 {
        return Err(ReduceError::InvalidArgument(format!(
            "no elements to distribute across {} worker(s)",
            requested_workers
        )));
    }

    let workers = requested_workers.min(total_elements);
    let chunk = total_elements / workers;
    let remainder = total_elements % workers;

    let mut partitions = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let extra = if i < remainder { 1 } else { 0 };
        let end = start + chunk + extra;
        partitions.push(Partition::new(start, end));
        start = end;
    }
    debug_assert_eq!(start, total_elements);

    Ok(PartitionPlan {
        partitions,
        requested_workers,
        total_elements,
    })
}
