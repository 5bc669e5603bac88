//! TOML configuration file parsing
//!
//! ```toml
//! [input]
//! path = "numbers.txt"
//!
//! [workers]
//! count = 8
//!
//! [transport]
//! kind = "file"
//! results_file = "/tmp/partials.txt"
//!
//! [runtime]
//! barrier_timeout_ms = 5000
//! ```

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(requested) = cli.workers {
        config.workers.count = cli_convert::normalize_worker_count(requested);
    }

    if let Some(ref input) = cli.input {
        config.input.path = input.clone();
    }

    if let Some(transport) = cli.transport {
        config.transport.kind = cli_convert::convert_transport(transport);
    }
    if let Some(ref results_file) = cli.results_file {
        config.transport.results_file = results_file.clone();
        // Naming a results file implies the file transport
        if cli.transport.is_none() {
            config.transport.kind = TransportKind::File;
        }
    }

    if let Some(ref timeout) = cli.barrier_timeout {
        let ms = cli_convert::parse_duration_ms(timeout)
            .context("Invalid barrier timeout")?;
        config.runtime.barrier_timeout_ms = Some(ms);
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }

    if let Some(ref json_output) = cli.json_output {
        config.output.json_output = Some(json_output.clone());
    }
    if cli.json_pretty {
        config.output.json_pretty = true;
    }
    if cli.quiet {
        config.output.quiet = true;
    }
    if cli.no_per_worker {
        config.output.per_worker = false;
    }

    Ok(config)
}

/// Build the effective configuration: TOML file if given, then CLI overrides
pub fn build_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [input]
            path = "numbers.txt"

            [workers]
            count = 8

            [transport]
            kind = "file"
            results_file = "/tmp/partials.txt"

            [runtime]
            barrier_timeout_ms = 5000

            [output]
            quiet = true
        "#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.input.path, PathBuf::from("numbers.txt"));
        assert_eq!(config.workers.count, 8);
        assert_eq!(config.transport.kind, TransportKind::File);
        assert_eq!(config.transport.results_file, PathBuf::from("/tmp/partials.txt"));
        assert_eq!(config.runtime.barrier_timeout_ms, Some(5000));
        assert!(config.output.quiet);
        assert!(config.output.per_worker);
    }

    #[test]
    fn test_parse_rejects_unknown_transport() {
        assert!(parse_toml_string("[transport]\nkind = \"pigeon\"\n").is_err());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let config = parse_toml_string("[workers]\ncount = 8\n[input]\npath = \"a.txt\"\n").unwrap();
        let cli = Cli::try_parse_from(["parsum", "3", "--input", "b.txt", "--barrier-timeout", "2s"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert_eq!(merged.workers.count, 3);
        assert_eq!(merged.input.path, PathBuf::from("b.txt"));
        assert_eq!(merged.runtime.barrier_timeout_ms, Some(2000));
    }

    #[test]
    fn test_non_positive_cli_workers_use_default() {
        let config = parse_toml_string("[workers]\ncount = 8\n").unwrap();
        let cli = Cli::try_parse_from(["parsum", "0"]).unwrap();

        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert_eq!(merged.workers.count, DEFAULT_WORKERS);
    }

    #[test]
    fn test_results_file_implies_file_transport() {
        let cli = Cli::try_parse_from(["parsum", "--results-file", "partials.txt"]).unwrap();
        let merged = merge_cli_with_config(&cli, Config::default()).unwrap();
        assert_eq!(merged.transport.kind, TransportKind::File);
        assert_eq!(merged.transport.results_file, PathBuf::from("partials.txt"));
    }

    #[test]
    fn test_invalid_barrier_timeout() {
        let cli = Cli::try_parse_from(["parsum", "--barrier-timeout", "whenever"]).unwrap();
        assert!(merge_cli_with_config(&cli, Config::default()).is_err());
    }

    #[test]
    fn test_build_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[workers]").unwrap();
        writeln!(file, "count = 5").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["parsum", "--config", path.as_str()]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.workers.count, 5);
    }
}
