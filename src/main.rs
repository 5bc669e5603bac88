//! parsum CLI entry point

use anyhow::{Context, Result};
use log::{debug, info};
use parsum::config::{cli::Cli, toml::build_config, validator, Config};
use parsum::input::FileSource;
use parsum::output::{json, text};
use parsum::{Coordinator, ReduceError};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    init_logging(cli.debug);

    let config = build_config(&cli).context("Failed to build configuration")?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    if !config.output.quiet {
        println!("parsum v{}", env!("CARGO_PKG_VERSION"));
        println!();
        print_configuration(&config);
    }

    if config.runtime.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    run(&config)
}

/// Default to info unless RUST_LOG says otherwise; --debug always wins
fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn run(config: &Config) -> Result<()> {
    let mut coordinator =
        Coordinator::from_config(config).context("Failed to set up result transport")?;
    let source = FileSource::new(&config.input.path);

    debug!(
        "Running with {} requested workers over {} transport",
        config.workers.count, config.transport.kind
    );

    let outcome = coordinator.run(&source);

    if let Some(ref path) = config.output.json_output {
        let document = match &outcome {
            Ok(report) => json::build_run_output(report, config),
            Err(e) => json::build_failure_output(e, config),
        };
        json::write_json_output(path, &document, config.output.json_pretty)?;
        info!("JSON report written to {}", path.display());
    }

    let report = outcome.with_context(|| {
        let kind = coordinator.error().map_or("unknown error", ReduceError::kind);
        format!("Reduction failed: {}", kind)
    })?;

    if !config.output.quiet {
        println!();
    }
    text::print_results(&report, &config.output);

    Ok(())
}

fn print_configuration(config: &Config) {
    println!("Configuration:");
    for line in config.to_string().lines() {
        println!("  {}", line);
    }
    if let Some(ref path) = config.output.json_output {
        println!("  JSON:       {}{}", path.display(), if config.output.json_pretty { " (pretty)" } else { "" });
    }
}
