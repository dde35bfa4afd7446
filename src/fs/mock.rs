// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub struct MockFile {
    pub content: Vec<u8>,
    /// Seconds since the epoch.
    pub mtime: u64,
}

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, MockFile>,
    /// Logical clock; every write stamps the file with the next tick.
    clock: u64,
    writes: Vec<PathBuf>,
    removals: Vec<PathBuf>,
    failing_writes: Vec<PathBuf>,
}

/// In-memory filesystem with a logical clock for modification times.
///
/// Directories exist implicitly whenever some file lives below them.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a test already panicked.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Add (or replace) a file, stamping it with the next clock tick.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.clock += 1;
        let mtime = state.clock;
        state.files.insert(
            path.as_ref().to_path_buf(),
            MockFile {
                content: content.into(),
                mtime,
            },
        );
    }

    /// Force a file's modification time.
    pub fn set_mtime(&self, path: impl AsRef<Path>, mtime: u64) {
        let mut state = self.lock();
        if let Some(file) = state.files.get_mut(path.as_ref()) {
            file.mtime = mtime;
        }
        state.clock = state.clock.max(mtime);
    }

    /// Advance a file's mtime past everything written so far.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        state.clock += 1;
        let now = state.clock;
        if let Some(file) = state.files.get_mut(path.as_ref()) {
            file.mtime = now;
        }
    }

    pub fn mtime_of(&self, path: impl AsRef<Path>) -> Option<u64> {
        self.lock().files.get(path.as_ref()).map(|f| f.mtime)
    }

    pub fn content_of(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock()
            .files
            .get(path.as_ref())
            .map(|f| String::from_utf8_lossy(&f.content).into_owned())
    }

    /// Paths written through the `FileSystem` trait, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.lock().writes.clone()
    }

    /// Paths actually removed through the `FileSystem` trait, in order.
    pub fn removals(&self) -> Vec<PathBuf> {
        self.lock().removals.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.lock();
        state.writes.clear();
        state.removals.clear();
    }

    /// Make every subsequent write to `path` fail.
    pub fn fail_writes_to(&self, path: impl AsRef<Path>) {
        self.lock().failing_writes.push(path.as_ref().to_path_buf());
    }

    fn record_write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.failing_writes.iter().any(|p| p == path) {
            return Err(anyhow!("permission denied: {:?}", path));
        }
        state.clock += 1;
        let mtime = state.clock;
        state.files.insert(
            path.to_path_buf(),
            MockFile {
                content: contents.to_vec(),
                mtime,
            },
        );
        state.writes.push(path.to_path_buf());
        Ok(())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.lock();
        match state.files.get(path) {
            Some(file) => String::from_utf8(file.content.clone())
                .map_err(|e| anyhow!("Invalid UTF-8: {}", e)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.record_write(path, contents)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.record_write(path, contents)
    }

    fn remove_file(&self, path: &Path) -> Result<bool> {
        let mut state = self.lock();
        if state.files.remove(path).is_some() {
            state.removals.push(path.to_path_buf());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.lock()
            .files
            .get(path)
            .map(|f| SystemTime::UNIX_EPOCH + Duration::from_secs(f.mtime))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock()
            .files
            .keys()
            .any(|p| p != path && p.starts_with(path))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // In mock, we just return the path as is, assuming absolute paths are used in tests
        Ok(path.to_path_buf())
    }

    fn walk_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        Ok(state
            .files
            .keys()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect())
    }
}
