//! JSON output formatting
//!
//! Serializes a finished run (or a failed one) into a single JSON document:
//! run metadata, per-worker partial sums, the total, and timing of the
//! parallel section in microseconds.

use crate::config::Config;
use crate::coordinator::RunReport;
use crate::error::ReduceError;
use crate::util::resource::{ResourceSnapshot, RunTiming};
use crate::util::time::format_duration;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: d.as_micros() as u64,
            human: format_duration(d),
        }
    }
}

/// Timing of the dispatch-through-aggregation section
#[derive(Debug, Clone, Serialize)]
pub struct JsonTiming {
    pub wall: JsonDuration,
    pub cpu_user: JsonDuration,
    pub cpu_system: JsonDuration,
    pub cpu_percent: f64,
    pub system_cpus: usize,
}

impl From<&RunTiming> for JsonTiming {
    fn from(timing: &RunTiming) -> Self {
        Self {
            wall: JsonDuration::from_duration(timing.wall),
            cpu_user: JsonDuration::from_duration(timing.cpu_user),
            cpu_system: JsonDuration::from_duration(timing.cpu_system),
            cpu_percent: timing.cpu_percent(),
            system_cpus: ResourceSnapshot::num_cpus(),
        }
    }
}

/// One worker's range and contribution
#[derive(Debug, Clone, Serialize)]
pub struct JsonWorker {
    pub worker_index: usize,
    pub start: usize,
    pub end: usize,
    pub sum: i64,
}

/// Failure description for runs that did not finish
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    pub kind: &'static str,
    pub message: String,
}

/// Top-level JSON document
#[derive(Debug, Clone, Serialize)]
pub struct JsonRunOutput {
    pub version: &'static str,
    pub generated_at: String,
    pub status: &'static str,
    pub config: Config,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_workers: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workers: Vec<JsonWorker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<JsonTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

impl JsonRunOutput {
    fn empty(config: &Config, status: &'static str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            generated_at: chrono::Utc::now().to_rfc3339(),
            status,
            config: config.clone(),
            source: None,
            elements: None,
            total: None,
            requested_workers: None,
            effective_workers: None,
            workers: Vec::new(),
            timing: None,
            error: None,
        }
    }
}

/// Build the JSON document for a successful run
pub fn build_run_output(report: &RunReport, config: &Config) -> JsonRunOutput {
    let workers = report
        .partials
        .iter()
        .zip(&report.partitions)
        .map(|(partial, range)| JsonWorker {
            worker_index: partial.worker_index,
            start: range.start,
            end: range.end,
            sum: partial.sum,
        })
        .collect();

    JsonRunOutput {
        source: Some(report.source.clone()),
        elements: Some(report.elements),
        total: Some(report.total),
        requested_workers: Some(report.requested_workers),
        effective_workers: Some(report.effective_workers),
        workers,
        timing: Some(JsonTiming::from(&report.timing)),
        ..JsonRunOutput::empty(config, "ok")
    }
}

/// Build the JSON document for a failed run
pub fn build_failure_output(err: &ReduceError, config: &Config) -> JsonRunOutput {
    JsonRunOutput {
        requested_workers: Some(config.workers.count),
        error: Some(JsonError {
            kind: err.kind(),
            message: err.to_string(),
        }),
        ..JsonRunOutput::empty(config, "failed")
    }
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, output: &JsonRunOutput, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;

    if pretty {
        serde_json::to_writer_pretty(file, output)?;
    } else {
        serde_json::to_writer(file, output)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::PartialResult;
    use crate::config::TransportKind;
    use crate::partition::Partition;

    fn sample_report() -> RunReport {
        RunReport {
            source: "input.txt".to_string(),
            elements: 4,
            total: 50,
            requested_workers: 2,
            effective_workers: 2,
            transport: TransportKind::Memory,
            partitions: vec![Partition::new(0, 2), Partition::new(2, 4)],
            partials: vec![
                PartialResult { worker_index: 0, sum: 15 },
                PartialResult { worker_index: 1, sum: 35 },
            ],
            timing: RunTiming {
                wall: Duration::from_micros(1500),
                cpu_user: Duration::from_micros(1000),
                cpu_system: Duration::ZERO,
            },
        }
    }

    #[test]
    fn test_build_run_output() {
        let output = build_run_output(&sample_report(), &Config::default());
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["status"], "ok");
        assert_eq!(value["total"], 50);
        assert_eq!(value["workers"][1]["start"], 2);
        assert_eq!(value["workers"][1]["sum"], 35);
        assert_eq!(value["timing"]["wall"]["micros"], 1500);
        assert_eq!(value["config"]["transport"]["kind"], "memory");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_build_failure_output() {
        let err = ReduceError::WorkerFailed { index: 1 };
        let output = build_failure_output(&err, &Config::default());
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"]["kind"], "WorkerFailed");
        assert!(value.get("total").is_none());
        assert!(value.get("workers").is_none());
    }

    #[test]
    fn test_write_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let output = build_run_output(&sample_report(), &Config::default());

        write_json_output(&path, &output, true).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["total"], 50);
        assert!(contents.contains('\n'));
    }
}
