// src/watch/scanner.rs

//! The initial directory walk.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::engine::WatchEvent;
use crate::watch::patterns::DEPENDENCY_CACHE_DIR;

/// Hidden and dependency-cache directories are not descended into at all.
fn is_pruned_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == DEPENDENCY_CACHE_DIR)
}

/// Every file below `root` in sorted depth-first order.
///
/// Unreadable entries are logged and skipped.
pub fn scan_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_pruned_dir(e))
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => warn!("skipping unreadable entry during scan: {err}"),
        }
    }
    files
}

/// Walk `root` on a blocking thread and send one `Scanned` per file, then
/// `ScanComplete`.
pub fn spawn_scan(root: PathBuf, runtime_tx: mpsc::Sender<WatchEvent>) {
    tokio::spawn(async move {
        let walk_root = root.clone();
        let files = match tokio::task::spawn_blocking(move || scan_files(&walk_root)).await {
            Ok(files) => files,
            Err(err) => {
                warn!("initial scan of {:?} failed: {err}", root);
                Vec::new()
            }
        };
        debug!(count = files.len(), "initial scan found files");
        send_all(files, runtime_tx).await;
    });
}

/// Send an explicit file list as if it had been scanned.
pub fn spawn_file_list(files: Vec<PathBuf>, runtime_tx: mpsc::Sender<WatchEvent>) {
    tokio::spawn(send_all(files, runtime_tx));
}

async fn send_all(files: Vec<PathBuf>, runtime_tx: mpsc::Sender<WatchEvent>) {
    for path in files {
        if runtime_tx.send(WatchEvent::Scanned(path)).await.is_err() {
            return;
        }
    }
    let _ = runtime_tx.send(WatchEvent::ScanComplete).await;
}
