//! In-memory transport backed by a crossbeam channel

use super::{PartialResult, ProducerGuard, ProducerTracker, ResultChannel, ResultSink};
use crate::config::TransportKind;
use crate::error::{ReduceError, ReduceResult};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::debug;

/// Unbounded lock-free MPSC queue of partial results
pub struct MemoryChannel {
    sender: Sender<PartialResult>,
    receiver: Receiver<PartialResult>,
    producers: ProducerTracker,
}

impl MemoryChannel {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            producers: ProducerTracker::default(),
        }
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultChannel for MemoryChannel {
    fn kind(&self) -> TransportKind {
        TransportKind::Memory
    }

    fn reset(&mut self) -> ReduceResult<()> {
        self.producers.ensure_idle()?;
        let stale = self.receiver.try_iter().count();
        if stale > 0 {
            debug!("Discarded {} stale partial result(s)", stale);
        }
        Ok(())
    }

    fn sink(&mut self, worker_index: usize) -> ReduceResult<Box<dyn ResultSink>> {
        Ok(Box::new(MemorySink {
            worker_index,
            sender: self.sender.clone(),
            _guard: self.producers.register(),
        }))
    }

    fn drain(&mut self) -> ReduceResult<Vec<PartialResult>> {
        self.producers.ensure_idle()?;
        Ok(self.receiver.try_iter().collect())
    }
}

struct MemorySink {
    worker_index: usize,
    sender: Sender<PartialResult>,
    _guard: ProducerGuard,
}

impl ResultSink for MemorySink {
    fn submit(self: Box<Self>, result: PartialResult) -> ReduceResult<()> {
        self.sender.send(result).map_err(|_| {
            ReduceError::Transport(format!(
                "worker {}: result channel disconnected",
                self.worker_index
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_submit_and_drain() {
        let mut channel = MemoryChannel::new();
        let sink = channel.sink(0).unwrap();
        sink.submit(PartialResult { worker_index: 0, sum: 15 }).unwrap();

        let drained = channel.drain().unwrap();
        assert_eq!(drained, vec![PartialResult { worker_index: 0, sum: 15 }]);
    }

    #[test]
    fn test_drain_is_read_once() {
        let mut channel = MemoryChannel::new();
        channel.sink(0).unwrap().submit(PartialResult { worker_index: 0, sum: 1 }).unwrap();

        assert_eq!(channel.drain().unwrap().len(), 1);
        assert!(channel.drain().unwrap().is_empty());
    }

    #[test]
    fn test_drain_with_live_sink_is_not_ready() {
        let mut channel = MemoryChannel::new();
        let _held = channel.sink(0).unwrap();
        assert_eq!(channel.drain(), Err(ReduceError::NotReady { outstanding: 1 }));
    }

    #[test]
    fn test_reset_discards_stale_results() {
        let mut channel = MemoryChannel::new();
        channel.sink(0).unwrap().submit(PartialResult { worker_index: 0, sum: 99 }).unwrap();

        channel.reset().unwrap();
        assert!(channel.drain().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let mut channel = MemoryChannel::new();
        let workers = 32;

        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let sink = channel.sink(i).unwrap();
                thread::spawn(move || {
                    sink.submit(PartialResult { worker_index: i, sum: i as i64 * 10 }).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut drained = channel.drain().unwrap();
        drained.sort_by_key(|r| r.worker_index);
        assert_eq!(drained.len(), workers);
        for (i, result) in drained.iter().enumerate() {
            assert_eq!(result.worker_index, i);
            assert_eq!(result.sum, i as i64 * 10);
        }
    }
}
