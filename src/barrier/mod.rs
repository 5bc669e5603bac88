//! Counting completion barrier
//!
//! The coordinator creates one `CompletionToken` per worker. A worker consumes
//! its token with `succeed()` once its result is transmitted, or `fail()` if
//! transmission went wrong. A token dropped without either (the worker thread
//! panicked and unwound) signals a failure on its own, so every launched
//! worker is accounted for exactly once however it terminates.
//!
//! `CompletionBarrier::wait` returns only after all `k` signals have arrived,
//! in whatever order, or after the optional deadline expires.

use crate::error::{ReduceError, ReduceResult};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// How a worker terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Partial result handed to the result channel
    Reported,
    /// Terminated without handing over a result
    Failed(String),
}

#[derive(Debug)]
struct Completion {
    index: usize,
    outcome: WorkerOutcome,
}

/// Per-worker completion signal
#[derive(Debug)]
pub struct CompletionToken {
    index: usize,
    sender: Sender<Completion>,
    outcome: Option<WorkerOutcome>,
}

impl CompletionToken {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Signal that the worker delivered its partial result
    pub fn succeed(mut self) {
        self.outcome = Some(WorkerOutcome::Reported);
    }

    /// Signal that the worker terminated without a result
    pub fn fail(mut self, reason: impl Into<String>) {
        self.outcome = Some(WorkerOutcome::Failed(reason.into()));
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| {
            WorkerOutcome::Failed("worker terminated without signalling completion".to_string())
        });
        // Receiver gone means the coordinator stopped waiting (timeout)
        let _ = self.sender.send(Completion {
            index: self.index,
            outcome,
        });
    }
}

/// Outcome of every worker, indexed by worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierReport {
    outcomes: Vec<WorkerOutcome>,
}

impl BarrierReport {
    pub fn outcomes(&self) -> &[WorkerOutcome] {
        &self.outcomes
    }

    /// Workers that terminated without a result, with their reasons
    pub fn failures(&self) -> Vec<(usize, &str)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, outcome)| match outcome {
                WorkerOutcome::Failed(reason) => Some((i, reason.as_str())),
                WorkerOutcome::Reported => None,
            })
            .collect()
    }

    pub fn all_reported(&self) -> bool {
        self.outcomes.iter().all(|o| *o == WorkerOutcome::Reported)
    }
}

/// Waits for exactly `expected` worker completions
#[derive(Debug)]
pub struct CompletionBarrier {
    expected: usize,
    receiver: Receiver<Completion>,
}

impl CompletionBarrier {
    /// Create a barrier and one token per worker, token `i` for worker `i`
    pub fn new(expected: usize) -> (Self, Vec<CompletionToken>) {
        let (sender, receiver) = unbounded();
        let tokens = (0..expected)
            .map(|index| CompletionToken {
                index,
                sender: sender.clone(),
                outcome: None,
            })
            .collect();
        (Self { expected, receiver }, tokens)
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Block until every worker has signalled
    ///
    /// With `timeout`, gives up once it expires and reports the workers still
    /// pending as `BarrierTimeout`.
    pub fn wait(self, timeout: Option<Duration>) -> ReduceResult<BarrierReport> {
        let started = Instant::now();
        let deadline = timeout.map(|t| started + t);
        let mut outcomes: Vec<Option<WorkerOutcome>> = vec![None; self.expected];
        let mut remaining = self.expected;

        while remaining > 0 {
            let received = match deadline {
                Some(deadline) => self.receiver.recv_deadline(deadline),
                None => self.receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            let completion = match received {
                Ok(completion) => completion,
                Err(RecvTimeoutError::Timeout) => {
                    let pending = pending_indices(&outcomes);
                    warn!("Barrier timed out with {} worker(s) pending", pending.len());
                    return Err(ReduceError::BarrierTimeout {
                        waited_ms: started.elapsed().as_millis() as u64,
                        pending,
                    });
                }
                // Every token is gone; whatever has not signalled never will
                Err(RecvTimeoutError::Disconnected) => break,
            };

            match outcomes.get_mut(completion.index) {
                Some(slot) if slot.is_none() => {
                    debug!("Worker {} completed: {:?}", completion.index, completion.outcome);
                    *slot = Some(completion.outcome);
                    remaining -= 1;
                }
                Some(_) => warn!("Ignoring duplicate completion from worker {}", completion.index),
                None => warn!("Ignoring completion from unknown worker {}", completion.index),
            }
        }

        let outcomes = outcomes
            .into_iter()
            .map(|o| o.unwrap_or_else(|| WorkerOutcome::Failed("completion signal lost".to_string())))
            .collect();
        Ok(BarrierReport { outcomes })
    }
}

fn pending_indices(outcomes: &[Option<WorkerOutcome>]) -> Vec<usize> {
    outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| o.is_none())
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_all_succeed_any_order() {
        let (barrier, tokens) = CompletionBarrier::new(4);
        let handles: Vec<_> = tokens
            .into_iter()
            .rev()
            .map(|token| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(token.index() as u64 * 3));
                    token.succeed();
                })
            })
            .collect();

        let report = barrier.wait(None).unwrap();
        assert!(report.all_reported());
        assert_eq!(report.outcomes().len(), 4);
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_explicit_failure_is_reported() {
        let (barrier, mut tokens) = CompletionBarrier::new(2);
        let second = tokens.pop().unwrap();
        let first = tokens.pop().unwrap();
        first.succeed();
        second.fail("disk full");

        let report = barrier.wait(None).unwrap();
        assert_eq!(report.failures(), vec![(1, "disk full")]);
        assert!(!report.all_reported());
    }

    #[test]
    fn test_panicking_worker_still_signals() {
        let (barrier, tokens) = CompletionBarrier::new(2);
        let handles: Vec<_> = tokens
            .into_iter()
            .map(|token| {
                thread::spawn(move || {
                    if token.index() == 0 {
                        panic!("worker exploded");
                    }
                    token.succeed();
                })
            })
            .collect();

        let report = barrier.wait(Some(Duration::from_secs(5))).unwrap();
        let failed: Vec<usize> = report.failures().iter().map(|(i, _)| *i).collect();
        assert_eq!(failed, vec![0]);

        let joined: Vec<bool> = handles.into_iter().map(|h| h.join().is_ok()).collect();
        assert_eq!(joined, vec![false, true]);
    }

    #[test]
    fn test_timeout_lists_pending_workers() {
        let (barrier, mut tokens) = CompletionBarrier::new(3);
        let stuck = tokens.pop().unwrap();
        for token in tokens {
            token.succeed();
        }

        let err = barrier.wait(Some(Duration::from_millis(20))).unwrap_err();
        match err {
            ReduceError::BarrierTimeout { pending, waited_ms } => {
                assert_eq!(pending, vec![2]);
                assert!(waited_ms >= 20);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        drop(stuck);
    }

    #[test]
    fn test_zero_workers_passes_immediately() {
        let (barrier, tokens) = CompletionBarrier::new(0);
        assert!(tokens.is_empty());
        assert!(barrier.wait(None).unwrap().outcomes().is_empty());
    }
}
