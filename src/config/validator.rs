//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_input(&config.input)?;
    validate_workers(&config.workers)?;
    validate_transport(&config.transport, &config.input)?;
    validate_runtime(&config.runtime)?;
    validate_output(&config.output, &config.transport)?;

    Ok(())
}

/// Validate input configuration
pub fn validate_input(input: &InputConfig) -> Result<()> {
    if input.path.as_os_str().is_empty() {
        anyhow::bail!("input path must not be empty");
    }
    Ok(())
}

/// Validate worker configuration
///
/// Only zero is rejected. Requests beyond the element count are clamped
/// once the input is loaded.
pub fn validate_workers(workers: &WorkerConfig) -> Result<()> {
    if workers.count == 0 {
        anyhow::bail!("worker count must be at least 1");
    }
    Ok(())
}

/// Validate transport configuration
pub fn validate_transport(transport: &TransportConfig, input: &InputConfig) -> Result<()> {
    if transport.kind != TransportKind::File {
        return Ok(());
    }

    if transport.results_file.as_os_str().is_empty() {
        anyhow::bail!("results_file must not be empty for the file transport");
    }

    // The results file is deleted before each run
    if transport.results_file == input.path {
        anyhow::bail!(
            "results_file ({}) must differ from the input path",
            transport.results_file.display()
        );
    }

    if transport.results_file.is_dir() {
        anyhow::bail!(
            "results_file ({}) is a directory",
            transport.results_file.display()
        );
    }

    Ok(())
}

/// Validate runtime configuration
pub fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if runtime.barrier_timeout_ms == Some(0) {
        anyhow::bail!("barrier_timeout_ms must be greater than 0 (omit it for an unbounded wait)");
    }
    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig, transport: &TransportConfig) -> Result<()> {
    if let Some(ref json_path) = output.json_output {
        if transport.kind == TransportKind::File && *json_path == transport.results_file {
            anyhow::bail!("json_output must differ from results_file");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::Cli;
    use crate::config::toml::build_config;
    use crate::coordinator::Coordinator;
    use crate::input::MemorySource;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_workers() {
        assert!(validate_workers(&WorkerConfig { count: 1 }).is_ok());
        assert!(validate_workers(&WorkerConfig { count: 100_000 }).is_ok());
        assert!(validate_workers(&WorkerConfig { count: 0 }).is_err());
    }

    #[test]
    fn test_large_worker_request_is_clamped_not_rejected() {
        let cli = Cli::try_parse_from(["parsum", "5000"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.workers.count, 5000);
        assert!(validate_config(&config).is_ok());

        let mut coordinator = Coordinator::from_config(&config).unwrap();
        let report = coordinator.run(&MemorySource::new(vec![7])).unwrap();
        assert_eq!(report.effective_workers, 1);
        assert_eq!(report.total, 7);
    }

    #[test]
    fn test_results_file_must_not_be_input() {
        let input = InputConfig {
            path: PathBuf::from("data.txt"),
        };
        let transport = TransportConfig {
            kind: TransportKind::File,
            results_file: PathBuf::from("data.txt"),
        };
        assert!(validate_transport(&transport, &input).is_err());

        // Irrelevant for the memory transport
        let memory = TransportConfig {
            kind: TransportKind::Memory,
            ..transport
        };
        assert!(validate_transport(&memory, &input).is_ok());
    }

    #[test]
    fn test_results_file_must_not_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let transport = TransportConfig {
            kind: TransportKind::File,
            results_file: dir.path().to_path_buf(),
        };
        assert!(validate_transport(&transport, &InputConfig::default()).is_err());
    }

    #[test]
    fn test_zero_barrier_timeout_rejected() {
        let runtime = RuntimeConfig {
            barrier_timeout_ms: Some(0),
            dry_run: false,
        };
        assert!(validate_runtime(&runtime).is_err());
        assert!(validate_runtime(&RuntimeConfig::default()).is_ok());
    }

    #[test]
    fn test_json_output_must_not_clobber_results() {
        let transport = TransportConfig {
            kind: TransportKind::File,
            results_file: PathBuf::from("out.txt"),
        };
        let output = OutputConfig {
            json_output: Some(PathBuf::from("out.txt")),
            ..OutputConfig::default()
        };
        assert!(validate_output(&output, &transport).is_err());
    }
}
