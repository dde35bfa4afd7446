#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use cielo::config::{DirEnv, RawSettings, RootConfig, Settings, DIR_ROOT, DIR_STORES};
use cielo::types::{RunMode, SourceKind};
use filetime::FileTime;
use tempfile::TempDir;

/// Builder for `RootConfig` to simplify test setup.
pub struct RootConfigBuilder {
    root: PathBuf,
    mode: RunMode,
    stores: Option<PathBuf>,
    raw: RawSettings,
    dump: bool,
}

impl RootConfigBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: RunMode::Once,
            stores: None,
            raw: RawSettings::default(),
            dump: false,
        }
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set `DIR_STORES`, relative to the root.
    pub fn stores_dir(mut self, rel: &str) -> Self {
        self.stores = Some(self.root.join(rel));
        self
    }

    /// Configure an external converter command for `kind`.
    pub fn converter(mut self, kind: SourceKind, cmd: &str) -> Self {
        let slot = match kind {
            SourceKind::Cielo => &mut self.raw.converters.cielo,
            SourceKind::Coffee => &mut self.raw.converters.coffee,
            SourceKind::Starbucks => &mut self.raw.converters.starbucks,
            SourceKind::Taml => panic!("taml is packaged in-process"),
        };
        *slot = Some(cmd.to_string());
        self
    }

    pub fn ignore(mut self, glob: &str) -> Self {
        self.raw.watch.ignore.push(glob.to_string());
        self
    }

    pub fn registry_file(mut self, name: &str) -> Self {
        self.raw.stores.registry = name.to_string();
        self
    }

    pub fn dump_conversions(mut self, val: bool) -> Self {
        self.dump = val;
        self
    }

    pub fn build(self) -> RootConfig {
        let settings =
            Settings::try_from(self.raw).expect("Failed to build valid settings from builder");
        let mut cfg = RootConfig::new(self.root.clone(), self.mode);
        let root = self.root.to_string_lossy().into_owned();
        cfg.env = match self.stores {
            Some(stores) => DirEnv::from_pairs([
                (DIR_ROOT, root),
                (DIR_STORES, stores.to_string_lossy().into_owned()),
            ]),
            None => DirEnv::from_pairs([(DIR_ROOT, root)]),
        };
        cfg.settings = settings;
        cfg.dump_conversions = self.dump;
        cfg
    }
}

/// A throwaway project directory on the real filesystem.
///
/// Every file written through it gets an explicit mtime from a logical clock
/// that starts a day in the past, so anything the code under test writes is
/// newer and freshness comparisons never depend on timestamp resolution.
pub struct ProjectDir {
    dir: TempDir,
    clock: SystemTime,
}

impl ProjectDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            clock: SystemTime::now() - Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Canonical root path (symlink-free, so it matches watcher paths).
    pub fn root(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `rel` and give it a new, strictly later mtime.
    pub fn write(&mut self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write file");
        self.touch(rel);
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("Failed to create dir");
        path
    }

    /// Advance the clock and stamp `rel` with it.
    pub fn touch(&mut self, rel: &str) {
        self.clock += Duration::from_secs(10);
        set_mtime(&self.path(rel), self.clock);
    }

    /// Stamp `rel` an hour into the future, newer than anything written since.
    pub fn bump(&self, rel: &str) {
        set_mtime(&self.path(rel), SystemTime::now() + Duration::from_secs(60 * 60));
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.path(rel)).ok()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn mtime(&self, rel: &str) -> Option<SystemTime> {
        fs::metadata(self.path(rel)).and_then(|m| m.modified()).ok()
    }
}

impl Default for ProjectDir {
    fn default() -> Self {
        Self::new()
    }
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    filetime::set_file_mtime(path, FileTime::from_system_time(time))
        .expect("Failed to set mtime");
}
