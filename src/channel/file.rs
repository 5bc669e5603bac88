//! Append-only results file transport
//!
//! Each worker opens the results file in append mode and writes its record as
//! one `write` call. With `O_APPEND` the kernel positions every write at the
//! end of the file, so concurrent workers never interleave or overwrite each
//! other and need no lock between them.

use super::{PartialResult, ProducerGuard, ProducerTracker, ResultChannel, ResultSink};
use crate::config::TransportKind;
use crate::error::{ReduceError, ReduceResult};
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Results file shared by all workers of a run
pub struct FileChannel {
    path: PathBuf,
    producers: ProducerTracker,
    /// Byte offset up to which records have already been drained
    consumed: usize,
}

impl FileChannel {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            producers: ProducerTracker::default(),
            consumed: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultChannel for FileChannel {
    fn kind(&self) -> TransportKind {
        TransportKind::File
    }

    fn reset(&mut self) -> ReduceResult<()> {
        self.producers.ensure_idle()?;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed stale results file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ReduceError::Transport(format!(
                    "failed to clear {}: {}",
                    self.path.display(),
                    e
                )))
            }
        }
        self.consumed = 0;
        Ok(())
    }

    fn sink(&mut self, worker_index: usize) -> ReduceResult<Box<dyn ResultSink>> {
        Ok(Box::new(FileSink {
            worker_index,
            path: self.path.clone(),
            _guard: self.producers.register(),
        }))
    }

    fn drain(&mut self) -> ReduceResult<Vec<PartialResult>> {
        self.producers.ensure_idle()?;

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            // No worker managed to write anything
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ReduceError::Transport(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let unread = contents.get(self.consumed..).unwrap_or("");
        let results = unread
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| parse_record(line).ok_or_else(|| {
                ReduceError::Transport(format!(
                    "{}: malformed record '{}' at line {}",
                    self.path.display(),
                    line,
                    n + 1
                ))
            }))
            .collect::<ReduceResult<Vec<_>>>()?;

        self.consumed = contents.len();
        Ok(results)
    }
}

/// Parse `"<worker_index> <sum>"`
fn parse_record(line: &str) -> Option<PartialResult> {
    let mut fields = line.split_whitespace();
    let worker_index = fields.next()?.parse().ok()?;
    let sum = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(PartialResult { worker_index, sum })
}

struct FileSink {
    worker_index: usize,
    path: PathBuf,
    _guard: ProducerGuard,
}

impl ResultSink for FileSink {
    fn submit(self: Box<Self>, result: PartialResult) -> ReduceResult<()> {
        let record = format!("{} {}\n", result.worker_index, result.sum);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ReduceError::Transport(format!(
                    "worker {}: failed to open {}: {}",
                    self.worker_index,
                    self.path.display(),
                    e
                ))
            })?;
        file.write_all(record.as_bytes()).map_err(|e| {
            ReduceError::Transport(format!(
                "worker {}: failed to append to {}: {}",
                self.worker_index,
                self.path.display(),
                e
            ))
        })
    }
}
