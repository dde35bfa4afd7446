// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::config::env::DirEnv;
use crate::types::{RunMode, SourceKind};

/// File name looked up in the root directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "cielo.toml";

/// Default name of the aggregation file written into the stores directory.
pub const DEFAULT_REGISTRY_FILE: &str = "stores.js";

/// Project settings as read from `cielo.toml`, before validation.
///
/// ```toml
/// [converters]
/// cielo = "cielo2coffee"
/// coffee = "coffee --compile --stdio --bare"
/// starbucks = "starbucks-cli"
///
/// [watch]
/// ignore = ["dist/**"]
///
/// [stores]
/// registry = "stores.js"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSettings {
    #[serde(default)]
    pub converters: ConvertersSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub stores: StoresSection,
}

/// `[converters]` section: one shell command per external converter.
///
/// Each command reads the source text on stdin and writes the converted
/// text to stdout. The taml kind is packaged in-process and has no entry.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConvertersSection {
    #[serde(default)]
    pub cielo: Option<String>,

    #[serde(default)]
    pub coffee: Option<String>,

    #[serde(default)]
    pub starbucks: Option<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Extra globs (relative to the root) that are never processed.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// `[stores]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoresSection {
    /// File name of the aggregation file inside `DIR_STORES`.
    #[serde(default = "default_registry")]
    pub registry: String,
}

fn default_registry() -> String {
    DEFAULT_REGISTRY_FILE.to_string()
}

impl Default for StoresSection {
    fn default() -> Self {
        Self {
            registry: default_registry(),
        }
    }
}

/// Validated project settings.
///
/// Only constructible through `TryFrom<RawSettings>` (see `validate.rs`) or
/// `Settings::default()`.
#[derive(Debug, Clone)]
pub struct Settings {
    converters: ConvertersSection,
    ignore: Vec<String>,
    registry_file: String,
}

impl Settings {
    pub(crate) fn new_unchecked(raw: RawSettings) -> Self {
        Self {
            converters: raw.converters,
            ignore: raw.watch.ignore,
            registry_file: raw.stores.registry,
        }
    }

    /// Shell command configured for an external converter, if any.
    pub fn converter_command(&self, kind: SourceKind) -> Option<&str> {
        match kind {
            SourceKind::Cielo => self.converters.cielo.as_deref(),
            SourceKind::Coffee => self.converters.coffee.as_deref(),
            SourceKind::Starbucks => self.converters.starbucks.as_deref(),
            SourceKind::Taml => None,
        }
    }

    pub fn ignore_globs(&self) -> &[String] {
        &self.ignore
    }

    pub fn registry_file(&self) -> &str {
        &self.registry_file
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new_unchecked(RawSettings::default())
    }
}

/// Everything resolved once at startup, immutable afterwards.
///
/// Shared by reference with every component instead of global flags.
#[derive(Debug, Clone)]
pub struct RootConfig {
    /// Absolute root directory being processed.
    pub root: PathBuf,
    /// Named directory variables loaded from the root.
    pub env: DirEnv,
    pub settings: Settings,
    pub mode: RunMode,
    /// Log raw and converted content of starbucks conversions.
    pub dump_conversions: bool,
}

impl RootConfig {
    /// A config for `root` with an empty environment and default settings.
    pub fn new(root: impl Into<PathBuf>, mode: RunMode) -> Self {
        let root = root.into();
        Self {
            env: DirEnv::for_root(&root),
            root,
            settings: Settings::default(),
            mode,
            dump_conversions: false,
        }
    }

    pub fn watch_enabled(&self) -> bool {
        self.mode.is_watching()
    }

    /// `DIR_STORES`, if configured.
    pub fn stores_dir(&self) -> Option<PathBuf> {
        self.env.stores_dir()
    }

    /// Absolute path of the store registry file, if `DIR_STORES` is set.
    pub fn registry_path(&self) -> Option<PathBuf> {
        self.stores_dir()
            .map(|dir| dir.join(self.settings.registry_file()))
    }
}
