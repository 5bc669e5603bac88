//! Input sequence loading
//!
//! The input format is a whitespace-delimited text stream: an element count
//! followed by that many signed 32-bit integers. Line breaks are just
//! whitespace, so both `4 5 10 15 20` and one-value-per-line files parse the
//! same way. Tokens after the declared count are ignored.

use crate::error::{ReduceError, ReduceResult};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable, shareable sequence of input values
///
/// Cloning is cheap: clones share the same backing allocation, and there is
/// no way to obtain a mutable view once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSequence {
    values: Arc<[i32]>,
}

impl InputSequence {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    /// Read-only handle to the backing storage, for handing to workers
    pub fn shared(&self) -> Arc<[i32]> {
        Arc::clone(&self.values)
    }

    /// Single-threaded reference sum with a 64-bit accumulator
    pub fn sequential_sum(&self) -> i64 {
        self.values.iter().map(|&v| i64::from(v)).sum()
    }
}

impl From<Vec<i32>> for InputSequence {
    fn from(values: Vec<i32>) -> Self {
        Self::new(values)
    }
}

/// Something that can produce an input sequence
pub trait SequenceSource {
    /// Human-readable identifier used in logs and reports
    fn describe(&self) -> String;

    /// Produce the sequence, or `ReduceError::Load` if it cannot be produced
    fn load(&self) -> ReduceResult<InputSequence>;
}

/// Text file in the `count v1 v2 ...` format
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequenceSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> ReduceResult<InputSequence> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ReduceError::Load(format!("failed to open {}: {}", self.path.display(), e))
        })?;
        let sequence = parse_sequence(&contents)
            .map_err(|e| match e {
                ReduceError::Load(msg) => ReduceError::Load(format!("{}: {}", self.path.display(), msg)),
                other => other,
            })?;
        debug!("Loaded {} values from {}", sequence.len(), self.path.display());
        Ok(sequence)
    }
}

/// Sequence that is already in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    sequence: InputSequence,
}

impl MemorySource {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            sequence: InputSequence::new(values),
        }
    }
}

impl SequenceSource for MemorySource {
    fn describe(&self) -> String {
        format!("<memory: {} values>", self.sequence.len())
    }

    fn load(&self) -> ReduceResult<InputSequence> {
        Ok(self.sequence.clone())
    }
}

/// Parse the `count v1 v2 ...` text format
pub fn parse_sequence(contents: &str) -> ReduceResult<InputSequence> {
    let mut tokens = contents.split_whitespace();

    let count_token = tokens
        .next()
        .ok_or_else(|| ReduceError::Load("missing element count".to_string()))?;
    let count: i64 = count_token
        .parse()
        .map_err(|_| ReduceError::Load(format!("element count '{}' is not an integer", count_token)))?;
    if count < 0 {
        return Err(ReduceError::Load(format!("element count {} is negative", count)));
    }
    let count = usize::try_from(count)
        .map_err(|_| ReduceError::Load(format!("element count {} is too large", count)))?;

    let mut values = Vec::with_capacity(count.min(1 << 20));
    for position in 0..count {
        let token = tokens.next().ok_or_else(|| {
            ReduceError::Load(format!("expected {} values, found {}", count, position))
        })?;
        let value: i32 = token.parse().map_err(|_| {
            ReduceError::Load(format!(
                "value #{} ('{}') is not a 32-bit signed integer",
                position + 1,
                token
            ))
        })?;
        values.push(value);
    }

    let trailing = tokens.count();
    if trailing > 0 {
        warn!("Ignoring {} token(s) after the declared {} values", trailing, count);
    }

    Ok(InputSequence::new(values))
}
