//! Error types for the reduction core
//!
//! Every failure of a run maps to exactly one `ReduceError` variant. None of
//! them are retried inside the crate; a failed run ends the coordinator in the
//! `Failed` state and hands the error back to the caller.

use thiserror::Error;

/// Result alias for core reduction operations
pub type ReduceResult<T> = std::result::Result<T, ReduceError>;

/// Failures of the partition / dispatch / barrier / aggregate pipeline
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReduceError {
    /// Input sequence could not be opened, parsed, or was empty when workers
    /// were requested
    #[error("load error: {0}")]
    Load(String),

    /// Arguments that leave no work to assign (zero elements, zero workers)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A launched worker terminated without emitting its partial result
    #[error("worker {index} failed without reporting a partial result")]
    WorkerFailed { index: usize },

    /// Fewer partial results were drained than workers were launched
    #[error("incomplete aggregation: expected {expected} partial results, received {received} (missing workers {missing:?})")]
    IncompleteAggregation {
        expected: usize,
        received: usize,
        missing: Vec<usize>,
    },

    /// The result channel was drained while producers were still alive
    #[error("result channel drained before barrier: {outstanding} producer(s) still active")]
    NotReady { outstanding: usize },

    /// Bounded barrier wait expired before every worker terminated
    #[error("barrier timed out after {waited_ms}ms waiting for workers {pending:?}")]
    BarrierTimeout { waited_ms: u64, pending: Vec<usize> },

    /// A drained record names a worker that was never launched, or one that
    /// already reported
    #[error("unexpected partial result from worker {index}")]
    UnexpectedResult { index: usize },

    /// The result transport failed to write, read, or decode a record
    #[error("transport error: {0}")]
    Transport(String),

    /// A coordinator step was invoked from the wrong state
    #[error("cannot {action} while coordinator is {state}")]
    InvalidState { state: String, action: &'static str },
}

impl ReduceError {
    /// Short machine-readable name of the variant, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            ReduceError::Load(_) => "LoadError",
            ReduceError::InvalidArgument(_) => "InvalidArgument",
            ReduceError::WorkerFailed { .. } => "WorkerFailed",
            ReduceError::IncompleteAggregation { .. } => "IncompleteAggregation",
            ReduceError::NotReady { .. } => "NotReady",
            ReduceError::BarrierTimeout { .. } => "BarrierTimeout",
            ReduceError::UnexpectedResult { .. } => "UnexpectedResult",
            ReduceError::Transport(_) => "Transport",
            ReduceError::InvalidState { .. } => "InvalidState",
        }
    }
}

impl From<std::io::Error> for ReduceError {
    fn from(err: std::io::Error) -> Self {
        ReduceError::Transport(err.to_string())
    }
}
