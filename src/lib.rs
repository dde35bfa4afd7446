// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::build::convert::ConverterSet;
use crate::cli::CliArgs;
use crate::config::{resolve_root_config, RootConfig, DIR_ROOT};
use crate::engine::{BuildStats, Coordinator, Runtime, WatchEvent};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::RunMode;

/// Capacity of the event channel feeding the runtime.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - root and settings resolution
/// - converters and the coordinator
/// - the initial scan (or explicit file list)
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cwd = std::env::current_dir()?;
    let dir_root_var = std::env::var(DIR_ROOT).ok();

    let cfg = resolve_root_config(&args, &cwd, dir_root_var.as_deref(), fs.as_ref())?;

    if args.env_only {
        print_env(&cfg);
        return Ok(());
    }

    for (key, value) in cfg.env.dirs() {
        debug!("{key} = {value}");
    }

    run_with(Arc::new(cfg), fs).await?;
    Ok(())
}

/// Run the coordinator for an already-resolved configuration, returning the
/// final statistics.
pub async fn run_with(cfg: Arc<RootConfig>, fs: Arc<dyn FileSystem>) -> Result<BuildStats> {
    let converters = ConverterSet::from_settings(&cfg.settings);
    let coordinator = Coordinator::new(Arc::clone(&cfg), fs, converters)?;

    let (tx, rx) = mpsc::channel::<WatchEvent>(EVENT_CHANNEL_CAPACITY);

    // Started before the scan so changes made while scanning are not lost;
    // they queue up behind the scan events.
    let _watcher_handle = match &cfg.mode {
        RunMode::Files(files) => {
            info!(count = files.len(), "processing files given on the command line");
            crate::watch::spawn_file_list(files.clone(), tx.clone());
            None
        }
        RunMode::Once => {
            crate::watch::spawn_scan(cfg.root.clone(), tx.clone());
            None
        }
        RunMode::Watch => {
            let handle = crate::watch::spawn_watcher(cfg.root.clone(), tx.clone())?;
            crate::watch::spawn_scan(cfg.root.clone(), tx.clone());
            Some(handle)
        }
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(WatchEvent::ShutdownRequested).await;
        });
    }
    drop(tx);

    let runtime = Runtime::new(coordinator, rx);
    Ok(runtime.run().await?)
}

fn print_env(cfg: &RootConfig) {
    for (key, value) in cfg.env.dirs() {
        println!("{key} = {value}");
    }
}

