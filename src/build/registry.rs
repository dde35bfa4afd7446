// src/build/registry.rs

//! The store registry: one generated module re-exporting every data store
//! found in `DIR_STORES`.
//!
//! It is always regenerated from a full directory traversal, never patched,
//! so it cannot drift from what is on disk. Only `.js` files produced from a
//! sibling `.taml` count as stores.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::build::naming::{derived_path, stub_of};
use crate::errors::{CieloError, Result};
use crate::fs::FileSystem;
use crate::types::SourceKind;
use crate::watch::patterns::DEPENDENCY_CACHE_DIR;

const HEADER: &str = "// generated by cielo from the data stores in this directory; do not edit\n";

/// One re-exported store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRegistryEntry {
    pub stub: String,
    /// Path of the generated store, relative to the stores directory, with
    /// forward slashes.
    pub rel_path: String,
}

impl StoreRegistryEntry {
    fn render(&self) -> String {
        format!("export {{{}}} from './{}';\n", self.stub, self.rel_path)
    }

    fn depth(&self) -> usize {
        self.rel_path.matches('/').count()
    }
}

/// Result of one rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryReport {
    pub path: PathBuf,
    pub entries: Vec<StoreRegistryEntry>,
    /// False when the file already had exactly this content.
    pub written: bool,
}

/// Rebuilds `<stores_dir>/<registry_file>`.
#[derive(Debug, Clone)]
pub struct StoreRegistry {
    stores_dir: PathBuf,
    registry_file: String,
}

impl StoreRegistry {
    pub fn new(stores_dir: impl Into<PathBuf>, registry_file: impl Into<String>) -> Self {
        Self {
            stores_dir: stores_dir.into(),
            registry_file: registry_file.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.stores_dir.join(&self.registry_file)
    }

    /// Collect entries in sorted traversal order.
    ///
    /// A `.js` file is a store only if a `.taml` next to it derives to it.
    /// The registry itself, hidden paths and dependency caches are skipped.
    /// When two stores share a stub the one closest to the stores directory
    /// is kept and the other is skipped with a warning, since two exports of
    /// the same name would not load.
    pub fn scan(&self, fs: &dyn FileSystem) -> Result<Vec<StoreRegistryEntry>> {
        let files = fs
            .walk_files(&self.stores_dir)
            .map_err(|e| CieloError::io(&self.stores_dir, e))?;

        let produced: HashSet<PathBuf> = files
            .iter()
            .filter(|f| has_ext(f, SourceKind::Taml.source_ext()))
            .map(|f| derived_path(f, SourceKind::Taml))
            .collect();

        let registry_path = self.path();
        let mut candidates = Vec::new();

        for file in &files {
            if *file == registry_path || !has_ext(file, "js") || !produced.contains(file) {
                continue;
            }
            let Ok(rel) = file.strip_prefix(&self.stores_dir) else {
                continue;
            };
            let rel_path = rel.to_string_lossy().replace('\\', "/");
            if rel_path
                .split('/')
                .any(|seg| seg.starts_with('.') || seg == DEPENDENCY_CACHE_DIR)
            {
                continue;
            }
            candidates.push(StoreRegistryEntry {
                stub: stub_of(file),
                rel_path,
            });
        }

        // stub -> index of the candidate that keeps it
        let mut winners: HashMap<&str, usize> = HashMap::new();
        for (idx, entry) in candidates.iter().enumerate() {
            match winners.entry(entry.stub.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
                Entry::Occupied(mut slot) => {
                    let kept = &candidates[*slot.get()];
                    let dropped = if entry.depth() < kept.depth() {
                        let dropped = kept;
                        slot.insert(idx);
                        dropped
                    } else {
                        entry
                    };
                    warn!(
                        store = %dropped.rel_path,
                        stub = %dropped.stub,
                        "duplicate store name; left out of registry"
                    );
                }
            }
        }

        let keep: HashSet<usize> = winners.into_values().collect();
        let entries = candidates
            .iter()
            .enumerate()
            .filter(|(idx, _)| keep.contains(idx))
            .map(|(_, entry)| entry.clone())
            .collect();
        Ok(entries)
    }

    /// Render the registry file contents for `entries`.
    pub fn render(entries: &[StoreRegistryEntry]) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');
        for entry in entries {
            out.push_str(&entry.render());
        }
        out
    }

    /// Regenerate the registry from what is on disk and write it atomically.
    pub fn rebuild(&self, fs: &dyn FileSystem) -> Result<RegistryReport> {
        let entries = self.scan(fs)?;
        let content = Self::render(&entries);
        let path = self.path();

        let unchanged = fs
            .read_to_string(&path)
            .map(|existing| existing == content)
            .unwrap_or(false);

        if unchanged {
            debug!(file = ?path, "store registry unchanged");
        } else {
            fs.write_atomic(&path, content.as_bytes())
                .map_err(|e| CieloError::io(&path, e))?;
            info!(file = ?path, stores = entries.len(), "store registry rebuilt");
        }

        Ok(RegistryReport {
            path,
            entries,
            written: !unchanged,
        })
    }
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}
