//! parsum - parallel partitioned summation
//!
//! Loads a sequence of integers, splits it into contiguous ranges, sums each
//! range on an isolated worker thread and combines the partial sums once a
//! completion barrier confirms every worker has reported.
//!
//! # Architecture
//!
//! - **Input**: whitespace-separated integer files, or in-memory sequences
//! - **Partitioning**: contiguous ranges, remainder front-loaded, workers clamped to the element count
//! - **Transports**: in-process channel or append-only results file
//! - **Barrier**: counts worker completions, with optional deadline
//! - **Coordinator**: single-use state machine from load through aggregation

pub mod barrier;
pub mod channel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod input;
pub mod output;
pub mod partition;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{Coordinator, RunReport};
pub use error::{ReduceError, ReduceResult};

/// Result type used at the binary and configuration layers
pub type Result<T> = anyhow::Result<T>;
