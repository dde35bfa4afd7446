// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::env::DirEnv;
use crate::config::model::{RawSettings, RootConfig, Settings, DEFAULT_SETTINGS_FILE};
use crate::errors::{CieloError, Result};
use crate::fs::FileSystem;
use crate::types::RunMode;
use crate::watch::path_utils::absolutize;

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for the
/// checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| CieloError::io(path, e))?;

    let settings: RawSettings = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(&path)?;
    Settings::try_from(raw)
}

/// What the positional arguments turned out to be.
#[derive(Debug, Default, PartialEq, Eq)]
struct ClassifiedPaths {
    dir: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn classify_paths(fs: &dyn FileSystem, cwd: &Path, paths: &[PathBuf]) -> Result<ClassifiedPaths> {
    let mut out = ClassifiedPaths::default();

    for raw in paths {
        let path = absolutize(cwd, raw);
        if fs.is_dir(&path) {
            if out.dir.is_some() {
                return Err(CieloError::ConfigError(
                    "Only one directory path allowed".to_string(),
                ));
            }
            out.dir = Some(path);
        } else if fs.is_file(&path) {
            out.files.push(path);
        } else {
            return Err(CieloError::ConfigError(format!(
                "Invalid path '{}' on command line",
                path.display()
            )));
        }
    }

    if out.dir.is_some() && !out.files.is_empty() {
        return Err(CieloError::ConfigError(
            "a directory and individual files cannot be combined".to_string(),
        ));
    }

    Ok(out)
}

/// Build the immutable [`RootConfig`] for this run.
///
/// - `cwd` is the process working directory.
/// - `dir_root_var` is the process `DIR_ROOT` variable, if set; it is only
///   used when no directory is given on the command line.
pub fn resolve_root_config(
    args: &CliArgs,
    cwd: &Path,
    dir_root_var: Option<&str>,
    fs: &dyn FileSystem,
) -> Result<RootConfig> {
    let classified = classify_paths(fs, cwd, &args.paths)?;

    let root = match (&classified.dir, dir_root_var) {
        (Some(dir), _) => {
            info!("DIR_ROOT: {} (from cmd line)", dir.display());
            dir.clone()
        }
        (None, Some(var)) if classified.files.is_empty() && !var.trim().is_empty() => {
            let dir = absolutize(cwd, Path::new(var));
            if !fs.is_dir(&dir) {
                return Err(CieloError::ConfigError(format!(
                    "DIR_ROOT '{}' is not a directory",
                    dir.display()
                )));
            }
            info!("DIR_ROOT: {} (from environment)", dir.display());
            dir
        }
        _ => {
            info!("DIR_ROOT: {} (from cwd)", cwd.display());
            cwd.to_path_buf()
        }
    };

    // Watcher events carry resolved paths; keep the root comparable to them.
    let root = fs.canonicalize(&root).unwrap_or(root);

    let env = DirEnv::load(fs, &root).map_err(|e| CieloError::io(&root, e))?;
    let settings = load_settings(args, &root, fs)?;

    let mode = if !classified.files.is_empty() {
        RunMode::Files(classified.files)
    } else if args.no_watch {
        RunMode::Once
    } else {
        RunMode::Watch
    };

    let cfg = RootConfig {
        root,
        env,
        settings,
        mode,
        dump_conversions: args.dump,
    };
    debug!(?cfg, "resolved root configuration");
    Ok(cfg)
}

/// Settings from `--config`, or `<root>/cielo.toml` when present, or defaults.
fn load_settings(args: &CliArgs, root: &Path, fs: &dyn FileSystem) -> Result<Settings> {
    let path = match &args.config {
        Some(explicit) => {
            let path = absolutize(root, explicit);
            if !fs.is_file(&path) {
                return Err(CieloError::ConfigError(format!(
                    "settings file '{}' not found",
                    path.display()
                )));
            }
            path
        }
        None => {
            let path = root.join(DEFAULT_SETTINGS_FILE);
            if !fs.is_file(&path) {
                return Ok(Settings::default());
            }
            path
        }
    };

    debug!(file = ?path, "loading settings");
    let contents = fs
        .read_to_string(&path)
        .map_err(|e| CieloError::io(&path, e))?;
    let raw: RawSettings = toml::from_str(&contents)?;
    Settings::try_from(raw)
}
