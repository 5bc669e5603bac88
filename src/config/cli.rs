//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Transport selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    /// In-process lock-free channel
    Memory,
    /// Append-only results file (see --results-file)
    File,
}

/// parsum - parallel sum-reduction over an integer file
#[derive(Parser, Debug)]
#[command(name = "parsum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of workers; missing or non-positive falls back to the configured default
    #[arg(value_name = "WORKERS", allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Input file: element count followed by that many integers
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// TOML configuration file (CLI options take precedence)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// How workers deliver partial results
    #[arg(long, value_enum)]
    pub transport: Option<TransportArg>,

    /// Results file used by the file transport
    #[arg(long)]
    pub results_file: Option<PathBuf>,

    /// Give up waiting for workers after this long (e.g., 500ms, 5s, 1m)
    #[arg(long)]
    pub barrier_timeout: Option<String>,

    /// Write a JSON report to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub json_pretty: bool,

    /// Print only the final total
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Omit the per-worker table from the text report
    #[arg(long)]
    pub no_per_worker: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, env = "PARSUM_DEBUG", value_parser = clap::builder::BoolishValueParser::new())]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.results_file.is_some() && self.transport == Some(TransportArg::Memory) {
            anyhow::bail!("--results-file only applies to --transport file");
        }

        if self.json_pretty && self.json_output.is_none() {
            anyhow::bail!("--json-pretty requires --json-output");
        }

        if let Some(ref timeout) = self.barrier_timeout {
            if timeout.trim().is_empty() {
                anyhow::bail!("--barrier-timeout must not be empty");
            }
        }

        Ok(())
    }
}
