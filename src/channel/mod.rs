//! Result channel between workers and the coordinator
//!
//! Workers hand their partial results to the coordinator through a
//! `ResultChannel`. The channel hands out one `ResultSink` per worker; a sink
//! is consumed by its single `submit`, so a worker cannot emit twice. The
//! coordinator drains the channel once, after the barrier.
//!
//! # Transports
//!
//! - **memory**: lock-free crossbeam MPSC queue (default)
//! - **file**: append-only results file, one `"<worker> <sum>\n"` record per
//!   worker written with a single `O_APPEND` write
//!
//! Draining while any sink is still alive fails with `NotReady`: a live sink
//! means some worker may still be about to write.

pub mod file;
pub mod memory;

use crate::config::{TransportConfig, TransportKind};
use crate::error::{ReduceError, ReduceResult};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub use file::FileChannel;
pub use memory::MemoryChannel;

/// One worker's contribution to the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartialResult {
    pub worker_index: usize,
    pub sum: i64,
}

/// Producer side handed to exactly one worker
pub trait ResultSink: Send {
    /// Transmit the worker's partial result; consumes the sink
    fn submit(self: Box<Self>, result: PartialResult) -> ReduceResult<()>;
}

/// Multi-producer, single-drain transport for partial results
pub trait ResultChannel: Send {
    /// Which transport this is
    fn kind(&self) -> TransportKind;

    /// Discard anything left over from a previous run
    fn reset(&mut self) -> ReduceResult<()>;

    /// Create the producer handle for one worker
    fn sink(&mut self, worker_index: usize) -> ReduceResult<Box<dyn ResultSink>>;

    /// Take every record submitted since the last reset
    ///
    /// Records come back in no particular order. A second drain without an
    /// intervening run returns nothing.
    fn drain(&mut self) -> ReduceResult<Vec<PartialResult>>;
}

/// Create the channel selected by the transport configuration
pub fn create_channel(config: &TransportConfig) -> ReduceResult<Box<dyn ResultChannel>> {
    let channel: Box<dyn ResultChannel> = match config.kind {
        TransportKind::Memory => Box::new(MemoryChannel::new()),
        TransportKind::File => Box::new(FileChannel::new(config.results_file.clone())),
    };
    Ok(channel)
}

/// Counts sinks that have been handed out and not yet dropped
#[derive(Debug, Clone, Default)]
pub(crate) struct ProducerTracker {
    live: Arc<AtomicUsize>,
}

impl ProducerTracker {
    pub(crate) fn register(&self) -> ProducerGuard {
        self.live.fetch_add(1, Ordering::AcqRel);
        ProducerGuard {
            live: Arc::clone(&self.live),
        }
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// `NotReady` unless every sink has been dropped
    pub(crate) fn ensure_idle(&self) -> ReduceResult<()> {
        match self.outstanding() {
            0 => Ok(()),
            outstanding => Err(ReduceError::NotReady { outstanding }),
        }
    }
}

/// Held by a sink; releases its producer slot on drop, including on unwind
#[derive(Debug)]
pub(crate) struct ProducerGuard {
    live: Arc<AtomicUsize>,
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_tracker_counts_guards() {
        let tracker = ProducerTracker::default();
        assert!(tracker.ensure_idle().is_ok());

        let a = tracker.register();
        let b = tracker.register();
        assert_eq!(tracker.outstanding(), 2);
        assert_eq!(tracker.ensure_idle(), Err(ReduceError::NotReady { outstanding: 2 }));

        drop(a);
        drop(b);
        assert!(tracker.ensure_idle().is_ok());
    }

    #[test]
    fn test_create_memory_channel() {
        let config = TransportConfig::default();
        let channel = create_channel(&config).unwrap();
        assert_eq!(channel.kind(), TransportKind::Memory);
    }

    #[test]
    fn test_create_file_channel() {
        let config = TransportConfig {
            kind: TransportKind::File,
            results_file: PathBuf::from("/tmp/parsum-out.txt"),
        };
        let channel = create_channel(&config).unwrap();
        assert_eq!(channel.kind(), TransportKind::File);
    }
}
