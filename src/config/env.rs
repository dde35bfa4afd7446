// src/config/env.rs

//! Directory-scoped environment: named `DIR_*` path variables loaded from
//! `.env` files in the root directory and its ancestors.
//!
//! The result is a read-only key/value object handed to whoever needs it,
//! rather than a mutation of the process environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::path_utils::absolutize;

/// Name of the per-directory environment file.
pub const ENV_FILE: &str = ".env";

/// Always set to the resolved root directory.
pub const DIR_ROOT: &str = "DIR_ROOT";

/// Directory whose `.taml` files become data stores.
pub const DIR_STORES: &str = "DIR_STORES";

static ENV_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*$")
        .expect("static regex is valid")
});

/// Resolved named variables for one root directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEnv {
    vars: BTreeMap<String, String>,
}

impl DirEnv {
    /// An environment holding only `DIR_ROOT`.
    pub fn for_root(root: &Path) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(DIR_ROOT.to_string(), root.to_string_lossy().into_owned());
        Self { vars }
    }

    /// Build from explicit pairs (mostly for tests); `DIR_ROOT` is not implied.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load `.env` files from `root` and each ancestor. The nearest file
    /// wins for duplicate keys. Relative `DIR_*` values are resolved against
    /// the directory of the file that defines them, and `DIR_*` entries that
    /// don't name an existing directory are dropped with a warning.
    pub fn load(fs: &dyn FileSystem, root: &Path) -> Result<Self> {
        let mut env = Self::for_root(root);

        for dir in root.ancestors() {
            let path = dir.join(ENV_FILE);
            if !fs.is_file(&path) {
                continue;
            }
            debug!(file = ?path, "loading directory environment");
            let contents = fs.read_to_string(&path)?;
            for (key, value) in parse_env_file(&contents) {
                if env.vars.contains_key(&key) {
                    continue;
                }
                let value = if key.starts_with("DIR_") {
                    absolutize(dir, Path::new(&value))
                        .to_string_lossy()
                        .into_owned()
                } else {
                    value
                };
                env.vars.insert(key, value);
            }
        }

        env.drop_missing_dirs(fs);
        Ok(env)
    }

    fn drop_missing_dirs(&mut self, fs: &dyn FileSystem) {
        let missing: Vec<String> = self
            .vars
            .iter()
            .filter(|(k, v)| k.starts_with("DIR_") && !fs.is_dir(Path::new(v.as_str())))
            .map(|(k, _)| k.clone())
            .collect();

        for key in missing {
            if let Some(dir) = self.vars.remove(&key) {
                warn!("directory {key} '{dir}' does not exist - removing");
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn dir(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn stores_dir(&self) -> Option<PathBuf> {
        self.dir(DIR_STORES)
    }

    /// All `DIR_*` variables, sorted by name.
    pub fn dirs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .filter(|(k, _)| k.starts_with("DIR_"))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// optional `export ` prefix is accepted and one layer of matching quotes
/// is removed.
pub fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            !t.is_empty() && !t.starts_with('#')
        })
        .filter_map(|line| ENV_LINE.captures(line))
        .map(|caps| (caps[1].to_string(), unquote(&caps[2]).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
