// src/engine/mod.rs

//! Orchestration engine for cielo.
//!
//! This module ties together:
//! - the initial scan and live watch events (produced by `watch`)
//! - the per-file pipelines and deletion handling (in `build`)
//! - the store registry
//!
//! The synchronous state machine lives in [`core`]; the async shell that
//! pulls events off a channel and feeds them in is [`runtime`].

use std::fmt;
use std::path::PathBuf;

/// What happened to a path, as reported by the live watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// Events flowing into the runtime from the scanner, the watcher, etc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file found by the initial scan (or listed on the command line).
    Scanned(PathBuf),
    /// A live filesystem change.
    Changed { kind: ChangeKind, path: PathBuf },
    /// The initial scan has emitted every file.
    ScanComplete,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Coordinator state. The only transition is `Scanning` → `Steady`, fired by
/// [`WatchEvent::ScanComplete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Scanning,
    Steady,
}

/// Running counters, reported when the scan completes and on exit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Files routed to a pipeline.
    pub processed: usize,
    pub written: usize,
    pub up_to_date: usize,
    /// Taml files outside the stores directory, non-cielo files in file mode.
    pub not_applicable: usize,
    pub failed: usize,
    pub removed: usize,
    pub registry_rebuilds: usize,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} written, {} up to date, {} failed, {} removed",
            self.processed, self.written, self.up_to_date, self.failed, self.removed
        )
    }
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreStep, Coordinator, Observation};
pub use self::runtime::Runtime;
