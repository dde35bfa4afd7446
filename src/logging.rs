// src/logging.rs

//! Logging setup for `cielo` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `-d` (debug) or `-q` (errors only)
//! 3. `CIELO_LOG` environment variable, any `EnvFilter` directive
//!    (e.g. "debug" or "cielo::build=trace,info")
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that `--env-only` output on stdout stays clean.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when no level flag is given.
pub const LOG_ENV_VAR: &str = "CIELO_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());
    let verbose = matches!(cli_level, Some(LogLevel::Debug | LogLevel::Trace));

    fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return EnvFilter::new(directive(lvl));
    }
    env_value
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_beats_environment() {
        let filter = build_filter(Some(LogLevel::Error), Some("trace"));
        assert_eq!(filter.to_string(), "error");
    }

    #[test]
    fn environment_directive_is_used_when_valid() {
        assert_eq!(build_filter(None, Some(" debug ")).to_string(), "debug");
        assert_eq!(build_filter(None, Some("cielo=loud")).to_string(), "info");
        assert_eq!(build_filter(None, None).to_string(), "info");
    }
}
