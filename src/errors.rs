// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CieloError {
    /// Fatal: bad command line or project settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A converter rejected its input. Recovered by the coordinator.
    #[error("Rebuild failed for {path:?}: {reason}")]
    RebuildFailed { path: PathBuf, reason: String },

    /// Reading, writing or removing a file failed. Recovered by the coordinator.
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CieloError {
    pub fn io(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        CieloError::Io {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn rebuild_failed(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        CieloError::RebuildFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Only configuration problems are allowed to stop the process.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CieloError::ConfigError(_) | CieloError::TomlError(_) | CieloError::GlobError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CieloError>;
