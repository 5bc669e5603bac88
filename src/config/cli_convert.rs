//! CLI to Config conversion utilities

use crate::config::{cli, TransportKind, DEFAULT_WORKERS};
use anyhow::{Context, Result};

/// Parse a duration string (e.g., "250ms", "5s", "2m") to milliseconds
///
/// A bare number is taken as milliseconds.
pub fn parse_duration_ms(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1u64)
    } else if let Some(n) = s.strip_suffix("sec").or_else(|| s.strip_suffix('s')) {
        (n, 1000)
    } else if let Some(n) = s.strip_suffix("min").or_else(|| s.strip_suffix('m')) {
        (n, 60_000)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Duration too large: {}", s))
}

/// Resolve the positional worker argument
///
/// Non-positive values fall back to `DEFAULT_WORKERS`, matching the classic
/// behaviour of treating `0` or a negative count as "use the default".
pub fn normalize_worker_count(requested: i64) -> usize {
    if requested <= 0 {
        DEFAULT_WORKERS
    } else {
        usize::try_from(requested).unwrap_or(usize::MAX)
    }
}

/// Convert CLI TransportArg to config TransportKind
pub fn convert_transport(arg: cli::TransportArg) -> TransportKind {
    match arg {
        cli::TransportArg::Memory => TransportKind::Memory,
        cli::TransportArg::File => TransportKind::File,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_ms() {
        assert_eq!(parse_duration_ms("250ms").unwrap(), 250);
        assert_eq!(parse_duration_ms("5s").unwrap(), 5_000);
        assert_eq!(parse_duration_ms("5sec").unwrap(), 5_000);
        assert_eq!(parse_duration_ms("2m").unwrap(), 120_000);
        assert_eq!(parse_duration_ms("2min").unwrap(), 120_000);
        assert_eq!(parse_duration_ms("  40 ").unwrap(), 40);
        assert!(parse_duration_ms("soon").is_err());
        assert!(parse_duration_ms("-5s").is_err());
    }

    #[test]
    fn test_normalize_worker_count() {
        assert_eq!(normalize_worker_count(4), 4);
        assert_eq!(normalize_worker_count(1), 1);
        assert_eq!(normalize_worker_count(0), DEFAULT_WORKERS);
        assert_eq!(normalize_worker_count(-7), DEFAULT_WORKERS);
    }

    #[test]
    fn test_convert_transport() {
        assert_eq!(convert_transport(cli::TransportArg::Memory), TransportKind::Memory);
        assert_eq!(convert_transport(cli::TransportArg::File), TransportKind::File);
    }
}
