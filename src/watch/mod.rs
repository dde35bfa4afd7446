// src/watch/mod.rs

//! Event sources and path filtering.
//!
//! This module is responsible for:
//! - Walking the root once at startup (`scanner`).
//! - Wiring up a cross-platform filesystem watcher (`notify`) and
//!   translating its events (`watcher`).
//! - Deciding which relative paths are worth looking at (`patterns`).
//!
//! It does **not** know about source kinds or pipelines; it only produces
//! [`WatchEvent`](crate::engine::WatchEvent)s.

pub mod path_utils;
pub mod patterns;
pub mod scanner;
pub mod watcher;

pub use patterns::{PathFilter, DEPENDENCY_CACHE_DIR};
pub use scanner::{scan_files, spawn_file_list, spawn_scan};
pub use watcher::{spawn_watcher, WatcherHandle};
