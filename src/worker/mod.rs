//! Worker thread implementation
//!
//! A Worker sums one partition of the input sequence and hands the result to
//! the coordinator through its `ResultSink`. Each worker runs on its own named
//! OS thread and owns nothing mutable that another worker can see: the input
//! is a shared read-only `Arc<[i32]>`, and the only output is the single
//! submission on its sink.
//!
//! # Lifecycle
//!
//! 1. **Creation**: `Worker::new()` binds a worker index, partition and data view
//! 2. **Execution**: `run()` computes the partial sum with a 64-bit accumulator
//! 3. **Completion**: `spawn()` submits the result and signals the barrier
//!
//! # Example
//!
//! ```
//! use parsum::partition::Partition;
//! use parsum::worker::Worker;
//! use std::sync::Arc;
//!
//! let data: Arc<[i32]> = vec![5, 10, 15, 20].into();
//! let worker = Worker::new(1, Partition::new(2, 4), data);
//! let result = worker.run()?;
//! assert_eq!(result.sum, 35);
//! # Ok::<(), parsum::error::ReduceError>(())
//! ```

use crate::barrier::CompletionToken;
use crate::channel::{PartialResult, ResultSink};
use crate::error::{ReduceError, ReduceResult};
use crate::partition::Partition;
use log::{debug, error};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Sums one partition of the shared input
#[derive(Debug, Clone)]
pub struct Worker {
    index: usize,
    partition: Partition,
    data: Arc<[i32]>,
}

impl Worker {
    pub fn new(index: usize, partition: Partition, data: Arc<[i32]>) -> Self {
        Self {
            index,
            partition,
            data,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Compute this worker's partial sum
    ///
    /// Fails with `InvalidArgument` if the partition does not lie inside the
    /// data, which the partitioner never produces.
    pub fn run(&self) -> ReduceResult<PartialResult> {
        let slice = self.data.get(self.partition.range()).ok_or_else(|| {
            ReduceError::InvalidArgument(format!(
                "partition {} out of bounds for {} elements",
                self.partition,
                self.data.len()
            ))
        })?;

        Ok(PartialResult {
            worker_index: self.index,
            sum: sum_slice(slice),
        })
    }

    /// Compute, then transmit the result exactly once
    pub fn run_and_submit(&self, sink: Box<dyn ResultSink>) -> ReduceResult<PartialResult> {
        let result = self.run()?;
        sink.submit(result)?;
        Ok(result)
    }

    /// Run on a dedicated thread, signalling `token` when done
    ///
    /// The token is consumed with `succeed()` only after the result is on the
    /// channel. A failed computation or transmission calls `fail()`; a panic
    /// drops the token during unwinding, which the barrier also counts as a
    /// failure.
    pub fn spawn(self, sink: Box<dyn ResultSink>, token: CompletionToken) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("parsum-worker-{}", self.index))
            .spawn(move || match self.run_and_submit(sink) {
                Ok(result) => {
                    debug!(
                        "Worker {}: partial sum {} over {}",
                        self.index, result.sum, self.partition
                    );
                    token.succeed();
                }
                Err(e) => {
                    error!("Worker {} failed: {}", self.index, e);
                    token.fail(e.to_string());
                }
            })
    }
}

/// Sum with every element widened to `i64` before it is added
pub fn sum_slice(values: &[i32]) -> i64 {
    values.iter().map(|&v| i64::from(v)).sum()
}
