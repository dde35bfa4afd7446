// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cielo`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "cielo",
    version,
    about = "Rebuild cielo, coffee, starbucks and taml files as they change.",
    long_about = None
)]
pub struct CliArgs {
    /// A single directory to process, or one or more files.
    ///
    /// The directory defaults to `DIR_ROOT` from the environment, then to the
    /// current working directory. Files are only brewed if they are `.cielo`.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Process files, don't watch for changes.
    #[arg(short = 'n', long)]
    pub no_watch: bool,

    /// Just display the resolved DIR_* variables, then exit.
    #[arg(short = 'e', long)]
    pub env_only: bool,

    /// Turn on debugging (a lot of output!).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Dump input and output of every starbucks conversion.
    #[arg(short = 'D', long)]
    pub dump: bool,

    /// Quiet output (only errors).
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// Overrides `-d` / `-q`. If omitted, `CIELO_LOG` or a default level will
    /// be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Project settings file (TOML).
    ///
    /// Default: `cielo.toml` in the root directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// Level implied by the flags, before falling back to `CIELO_LOG`.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.log_level.is_some() {
            return self.log_level;
        }
        if self.debug {
            Some(LogLevel::Debug)
        } else if self.quiet {
            Some(LogLevel::Error)
        } else {
            None
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_flags_parse() {
        let args = CliArgs::try_parse_from(["cielo", "-n", "-d", "-D", "src"]).unwrap();
        assert!(args.no_watch);
        assert!(args.debug);
        assert!(args.dump);
        assert_eq!(args.paths, vec![PathBuf::from("src")]);
        assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));
    }

    #[test]
    fn explicit_log_level_wins_over_quiet() {
        let args =
            CliArgs::try_parse_from(["cielo", "-q", "--log-level", "warn"]).unwrap();
        assert_eq!(args.effective_log_level(), Some(LogLevel::Warn));
    }
}
