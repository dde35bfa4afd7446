// src/build/pipeline.rs

//! Conversion pipelines, one per [`SourceKind`].
//!
//! Every pipeline follows the same steps:
//! 1. compute the derived path,
//! 2. skip if the derived file is fresh,
//! 3. read the source,
//! 4. convert,
//! 5. write the derived file.
//!
//! The taml pipeline additionally requires its source to live directly in
//! `DIR_STORES`; anywhere else it is a no-op. A taml whose output would land
//! on the store registry file is refused as well.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::build::convert::ConverterSet;
use crate::build::freshness;
use crate::build::naming::derived_path;
use crate::config::{RootConfig, DIR_STORES};
use crate::errors::{CieloError, Result};
use crate::fs::FileSystem;
use crate::types::SourceKind;

const SEP_EQ: &str = "==========================================================";

/// What a single pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The derived file was (re)written.
    Wrote { dest: PathBuf },
    /// The derived file was already up to date.
    UpToDate { dest: PathBuf },
    /// The pipeline's precondition didn't hold; nothing was read or written.
    NotApplicable { reason: String },
}

impl RunOutcome {
    pub fn wrote(&self) -> bool {
        matches!(self, RunOutcome::Wrote { .. })
    }
}

/// Runs the conversion pipelines against a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct Brewer {
    cfg: Arc<RootConfig>,
    fs: Arc<dyn FileSystem>,
    converters: ConverterSet,
}

impl Brewer {
    pub fn new(cfg: Arc<RootConfig>, fs: Arc<dyn FileSystem>, converters: ConverterSet) -> Self {
        Self { cfg, fs, converters }
    }

    pub fn config(&self) -> &RootConfig {
        &self.cfg
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Run the `kind` pipeline for `source`.
    ///
    /// `force` bypasses the freshness check.
    pub async fn run(&self, kind: SourceKind, source: &Path, force: bool) -> Result<RunOutcome> {
        let dest = derived_path(source, kind);

        if kind == SourceKind::Taml {
            if let Err(reason) = self.check_stores_dir(source) {
                if self.cfg.stores_dir().is_none() {
                    warn!(file = ?source, "{DIR_STORES} is not set; taml file ignored");
                } else {
                    debug!(file = ?source, %reason, "taml file ignored");
                }
                return Ok(RunOutcome::NotApplicable { reason });
            }
            if self.is_registry(&dest) {
                warn!(
                    file = ?source,
                    dest = ?dest,
                    "taml output would overwrite the store registry; file ignored"
                );
                return Ok(RunOutcome::NotApplicable {
                    reason: format!("{} is the store registry", dest.display()),
                });
            }
        }

        if freshness::is_fresh(self.fs(), source, &dest, force) {
            debug!(file = ?source, dest = ?dest, "dest is up to date");
            return Ok(RunOutcome::UpToDate { dest });
        }

        let content = self
            .fs
            .read_to_string(source)
            .map_err(|e| CieloError::io(source, e))?;

        let dump = self.cfg.dump_conversions && kind == SourceKind::Starbucks;
        if dump {
            info!("{SEP_EQ}\n{content}\n{SEP_EQ}");
        }

        let code = self
            .converters
            .get(kind)
            .convert(&content, source)
            .await
            .map_err(|e| CieloError::rebuild_failed(source, format!("{e:#}")))?;

        if dump {
            info!("{code}\n{SEP_EQ}");
        }

        self.fs
            .write(&dest, code.as_bytes())
            .map_err(|e| CieloError::io(&dest, e))?;

        info!("   {} => {}", self.short(source), self.short(&dest));
        Ok(RunOutcome::Wrote { dest })
    }

    /// `Ok(())` if `source` sits directly in `DIR_STORES`, otherwise the
    /// reason it doesn't.
    pub fn check_stores_dir(&self, source: &Path) -> std::result::Result<(), String> {
        let Some(stores) = self.cfg.stores_dir() else {
            return Err(format!("{DIR_STORES} is not set"));
        };
        let src_dir = source.parent().unwrap_or(Path::new(""));
        if src_dir == stores {
            return Ok(());
        }
        let same = match (self.fs.canonicalize(src_dir), self.fs.canonicalize(&stores)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if same {
            Ok(())
        } else {
            Err(format!("{} is not {}", src_dir.display(), stores.display()))
        }
    }

    /// Whether `path` is the store registry file.
    pub fn is_registry(&self, path: &Path) -> bool {
        self.cfg.registry_path().as_deref() == Some(path)
    }

    /// Path relative to the root for log lines, or the full path if outside.
    pub fn short(&self, path: &Path) -> String {
        match path.strip_prefix(&self.cfg.root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => path.display().to_string(),
        }
    }
}
