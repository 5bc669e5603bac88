//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! Every section defaults sensibly, so an empty TOML file (or no file at all)
//! yields a runnable configuration: two workers over `input.txt`, results
//! delivered over the in-memory channel.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Worker count used when none (or a non-positive one) is requested
pub const DEFAULT_WORKERS: usize = 2;

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the input sequence comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Text file: element count followed by that many integers
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

fn default_input_path() -> PathBuf {
    PathBuf::from("input.txt")
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Requested worker count (clamped to the element count at run time)
    #[serde(default = "default_worker_count")]
    pub count: usize,
}

fn default_worker_count() -> usize {
    DEFAULT_WORKERS
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

/// Partial-result transport selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
    /// Results file for the file transport; cleared before every run
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,
}

fn default_results_file() -> PathBuf {
    PathBuf::from("out.txt")
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            results_file: default_results_file(),
        }
    }
}

/// Transport type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Lock-free in-process channel
    #[default]
    Memory,
    /// Append-only results file
    File,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Memory => write!(f, "memory"),
            TransportKind::File => write!(f, "file"),
        }
    }
}

/// Runtime behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Bounded barrier wait in milliseconds; unbounded when absent
    #[serde(default)]
    pub barrier_timeout_ms: Option<u64>,
    /// Validate and print configuration without running
    #[serde(default)]
    pub dry_run: bool,
}

impl RuntimeConfig {
    pub fn barrier_timeout(&self) -> Option<Duration> {
        self.barrier_timeout_ms.map(Duration::from_millis)
    }
}

/// Report output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write a JSON report to this path
    #[serde(default)]
    pub json_output: Option<PathBuf>,
    /// Pretty-print the JSON report
    #[serde(default)]
    pub json_pretty: bool,
    /// Print only the final total
    #[serde(default)]
    pub quiet: bool,
    /// Print the per-worker table in the text report
    #[serde(default = "default_per_worker")]
    pub per_worker: bool,
}

fn default_per_worker() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_output: None,
            json_pretty: false,
            quiet: false,
            per_worker: default_per_worker(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input:      {}", self.input.path.display())?;
        writeln!(f, "Workers:    {}", self.workers.count)?;
        match self.transport.kind {
            TransportKind::Memory => writeln!(f, "Transport:  memory")?,
            TransportKind::File => writeln!(
                f,
                "Transport:  file ({})",
                self.transport.results_file.display()
            )?,
        }
        match self.runtime.barrier_timeout_ms {
            Some(ms) => write!(f, "Barrier:    {}ms timeout", ms),
            None => write!(f, "Barrier:    unbounded"),
        }
    }
}
