// src/engine/core.rs

//! Coordinator state machine.
//!
//! Consumes [`WatchEvent`]s one at a time, in delivery order, and runs each
//! to completion before the next:
//!
//! - `Scanning`: every routed file goes through its pipeline. Store registry
//!   rebuilds are held back until the scan completes so N discovered taml
//!   files cost one rebuild, not N.
//! - `Steady`: live events. Creates and modifications run the pipeline,
//!   removals run the deletion handler, and any taml event rebuilds the
//!   registry.
//!
//! Freshness is checked in both states. Explicit file-list mode
//! ([`RunMode::Files`]) forces every rebuild and only handles `.cielo` files.
//! The earlier tool rebuilt every scanned file unconditionally until its
//! watcher reported ready; here a rescan of an unchanged tree writes nothing.
//!
//! All filesystem access goes through the [`Brewer`]'s `FileSystem`, so the
//! coordinator runs unchanged against the in-memory mock in tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, trace};

use crate::build::convert::ConverterSet;
use crate::build::deletion::handle_deletion;
use crate::build::pipeline::{Brewer, RunOutcome};
use crate::build::registry::StoreRegistry;
use crate::build::router::{route, Route};
use crate::config::RootConfig;
use crate::engine::{BuildStats, ChangeKind, CoordinatorState, WatchEvent};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::{RunMode, SourceKind};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::PathFilter;

/// Something the coordinator did while handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Wrote { source: PathBuf, dest: PathBuf },
    UpToDate { source: PathBuf, dest: PathBuf },
    NotApplicable { source: PathBuf, reason: String },
    Failed { source: PathBuf, error: String },
    Removed { path: PathBuf },
    RegistryRebuilt { path: PathBuf, entries: usize, written: bool },
    RegistryFailed { error: String },
    ScanFinished { stats: BuildStats },
}

/// Result of handling a single event.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    pub observations: Vec<Observation>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// The watch/scan coordinator.
#[derive(Debug)]
pub struct Coordinator {
    brewer: Brewer,
    filter: PathFilter,
    registry: Option<StoreRegistry>,
    state: CoordinatorState,
    stats: BuildStats,
}

impl Coordinator {
    pub fn new(
        cfg: Arc<RootConfig>,
        fs: Arc<dyn FileSystem>,
        converters: ConverterSet,
    ) -> Result<Self> {
        let filter = PathFilter::with_ignore_globs(cfg.settings.ignore_globs())?;
        let registry = cfg
            .stores_dir()
            .map(|dir| StoreRegistry::new(dir, cfg.settings.registry_file()));
        Ok(Self {
            brewer: Brewer::new(cfg, fs, converters),
            filter,
            registry,
            state: CoordinatorState::Scanning,
            stats: BuildStats::default(),
        })
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    fn cfg(&self) -> &RootConfig {
        self.brewer.config()
    }

    fn file_mode(&self) -> bool {
        matches!(self.cfg().mode, RunMode::Files(_))
    }

    /// Handle a single event, returning what happened.
    pub async fn step(&mut self, event: WatchEvent) -> CoreStep {
        let mut obs = Vec::new();

        let keep_running = match event {
            WatchEvent::Scanned(path) => {
                self.on_upsert(&path, &mut obs).await;
                true
            }
            WatchEvent::Changed { kind, path } => {
                match kind {
                    ChangeKind::Created | ChangeKind::Modified => {
                        self.on_upsert(&path, &mut obs).await
                    }
                    ChangeKind::Removed => self.on_removed(&path, &mut obs),
                }
                true
            }
            WatchEvent::ScanComplete => self.on_scan_complete(&mut obs),
            WatchEvent::ShutdownRequested => false,
        };

        CoreStep {
            observations: obs,
            keep_running,
        }
    }

    /// Route `path`, or `None` if it is filtered or not a source file.
    fn accept(&self, path: &Path) -> Option<SourceKind> {
        if !self.file_mode() {
            let Some(rel) = relative_str(&self.cfg().root, path) else {
                debug!(?path, "path outside root; ignored");
                return None;
            };
            if !self.filter.allows(&rel) {
                trace!(rel = %rel, "filtered path");
                return None;
            }
        }
        match route(path) {
            Route::Pipeline(kind) => Some(kind),
            Route::Rejected => {
                trace!(?path, "unrecognized extension");
                None
            }
        }
    }

    async fn on_upsert(&mut self, path: &Path, obs: &mut Vec<Observation>) {
        let Some(kind) = self.accept(path) else {
            return;
        };

        if self.file_mode() && kind != SourceKind::Cielo {
            debug!(?path, %kind, "only .cielo files are brewed in file mode");
            self.stats.not_applicable += 1;
            return;
        }

        debug!(state = ?self.state, %kind, file = %self.brewer.short(path), "processing");
        self.run_pipeline(kind, path, obs).await;

        if kind == SourceKind::Taml && self.state == CoordinatorState::Steady {
            self.rebuild_registry(obs);
        }
    }

    async fn run_pipeline(&mut self, kind: SourceKind, path: &Path, obs: &mut Vec<Observation>) {
        let force = self.file_mode();
        let mut stage = Some((kind, path.to_path_buf()));

        while let Some((kind, source)) = stage.take() {
            self.stats.processed += 1;

            match self.brewer.run(kind, &source, force).await {
                Ok(RunOutcome::Wrote { dest }) => {
                    self.stats.written += 1;
                    // A fresh intermediate goes straight on to the next stage
                    // so the final artifact never depends on scan order or on
                    // the watcher noticing our own write.
                    if !self.file_mode() {
                        stage = kind.next_stage().map(|next| (next, dest.clone()));
                    }
                    obs.push(Observation::Wrote { source, dest });
                }
                Ok(RunOutcome::UpToDate { dest }) => {
                    self.stats.up_to_date += 1;
                    obs.push(Observation::UpToDate { source, dest });
                }
                Ok(RunOutcome::NotApplicable { reason }) => {
                    self.stats.not_applicable += 1;
                    obs.push(Observation::NotApplicable { source, reason });
                }
                Err(err) => {
                    self.stats.failed += 1;
                    error!("{err}");
                    obs.push(Observation::Failed {
                        source,
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    fn on_removed(&mut self, path: &Path, obs: &mut Vec<Observation>) {
        if self.file_mode() {
            return;
        }
        let Some(kind) = self.accept(path) else {
            return;
        };

        info!("unlink {}", self.brewer.short(path));
        let report = handle_deletion(&self.brewer, path, kind);
        self.stats.removed += report.removed.len();
        self.stats.failed += report.failed.len();
        obs.extend(
            report
                .removed
                .into_iter()
                .map(|path| Observation::Removed { path }),
        );
        obs.extend(report.failed.into_iter().map(|(source, error)| {
            Observation::Failed { source, error }
        }));

        if kind == SourceKind::Taml && self.state == CoordinatorState::Steady {
            self.rebuild_registry(obs);
        }
    }

    fn on_scan_complete(&mut self, obs: &mut Vec<Observation>) -> bool {
        if self.state == CoordinatorState::Scanning {
            self.state = CoordinatorState::Steady;
            if !self.file_mode() {
                self.rebuild_registry(obs);
            }
            info!("scan complete: {}", self.stats);
            obs.push(Observation::ScanFinished { stats: self.stats });
        }

        let watching = self.cfg().watch_enabled();
        if watching {
            info!("...watching for further file changes");
        } else {
            info!("...not watching for further file changes");
        }
        watching
    }

    fn rebuild_registry(&mut self, obs: &mut Vec<Observation>) {
        let Some(registry) = &self.registry else {
            return;
        };
        match registry.rebuild(self.brewer.fs()) {
            Ok(report) => {
                self.stats.registry_rebuilds += 1;
                obs.push(Observation::RegistryRebuilt {
                    path: report.path,
                    entries: report.entries.len(),
                    written: report.written,
                });
            }
            Err(err) => {
                self.stats.failed += 1;
                error!("{err}");
                obs.push(Observation::RegistryFailed {
                    error: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::convert::{ConvertFuture, Converter};
    use crate::config::DirEnv;
    use crate::fs::mock::MockFileSystem;

    struct Echo(&'static str);

    impl Converter for Echo {
        fn convert<'a>(&'a self, source: &'a str, _filename: &'a Path) -> ConvertFuture<'a> {
            Box::pin(async move { Ok(format!("{}{}", self.0, source)) })
        }
    }

    fn coordinator(fs: &MockFileSystem, mode: RunMode) -> Coordinator {
        let mut cfg = RootConfig::new("/p", mode);
        cfg.env = DirEnv::from_pairs([("DIR_ROOT", "/p"), ("DIR_STORES", "/p/stores")]);
        let converters = ConverterSet::builtin()
            .with(SourceKind::Cielo, Arc::new(Echo("# coffee\n")))
            .with(SourceKind::Coffee, Arc::new(Echo("// js\n")))
            .with(SourceKind::Starbucks, Arc::new(Echo("<!-- svelte -->\n")));
        Coordinator::new(Arc::new(cfg), Arc::new(fs.clone()), converters).unwrap()
    }

    fn scanned(p: &str) -> WatchEvent {
        WatchEvent::Scanned(PathBuf::from(p))
    }

    fn changed(kind: ChangeKind, p: &str) -> WatchEvent {
        WatchEvent::Changed {
            kind,
            path: PathBuf::from(p),
        }
    }

    #[tokio::test]
    async fn scan_complete_is_a_one_way_transition() {
        let fs = MockFileSystem::new();
        let mut c = coordinator(&fs, RunMode::Watch);
        assert_eq!(c.state(), CoordinatorState::Scanning);
        assert!(c.step(WatchEvent::ScanComplete).await.keep_running);
        assert_eq!(c.state(), CoordinatorState::Steady);
        c.step(WatchEvent::ScanComplete).await;
        assert_eq!(c.state(), CoordinatorState::Steady);
    }

    #[tokio::test]
    async fn once_mode_stops_after_scan() {
        let fs = MockFileSystem::new();
        let mut c = coordinator(&fs, RunMode::Once);
        assert!(c.step(scanned("/p/a.txt")).await.keep_running);
        assert!(!c.step(WatchEvent::ScanComplete).await.keep_running);
    }

    #[tokio::test]
    async fn cielo_chains_through_coffee_to_js() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/my_widget.cielo", "w");
        let mut c = coordinator(&fs, RunMode::Once);

        c.step(scanned("/p/my_widget.cielo")).await;
        assert_eq!(fs.content_of("/p/my_widget.coffee").as_deref(), Some("# coffee\nw"));
        assert_eq!(fs.content_of("/p/mywidget.js").as_deref(), Some("// js\n# coffee\nw"));

        // scanning the generated coffee afterwards finds it fresh
        let step = c.step(scanned("/p/my_widget.coffee")).await;
        assert!(matches!(step.observations[..], [Observation::UpToDate { .. }]));
    }

    #[tokio::test]
    async fn filtered_paths_are_dropped_before_routing() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/node_modules/x/a.coffee", "a");
        fs.add_file("/p/.git/b.cielo", "b");
        let mut c = coordinator(&fs, RunMode::Watch);

        assert!(c.step(scanned("/p/node_modules/x/a.coffee")).await.observations.is_empty());
        assert!(c.step(scanned("/p/.git/b.cielo")).await.observations.is_empty());
        assert!(fs.writes().is_empty());
    }

    #[tokio::test]
    async fn registry_waits_for_scan_then_follows_each_taml_event() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/stores/colors.taml", "- red");
        fs.add_file("/p/stores/shapes.taml", "- box");
        let mut c = coordinator(&fs, RunMode::Watch);

        c.step(scanned("/p/stores/colors.taml")).await;
        c.step(scanned("/p/stores/shapes.taml")).await;
        assert!(fs.content_of("/p/stores/stores.js").is_none());

        let step = c.step(WatchEvent::ScanComplete).await;
        assert!(step.observations.iter().any(|o| matches!(
            o,
            Observation::RegistryRebuilt { entries: 2, written: true, .. }
        )));

        fs.add_file("/p/stores/sizes.taml", "- xl");
        c.step(changed(ChangeKind::Created, "/p/stores/sizes.taml")).await;
        let registry = fs.content_of("/p/stores/stores.js").unwrap();
        assert!(registry.contains("export {sizes} from './sizes.js';"));

        c.step(changed(ChangeKind::Removed, "/p/stores/colors.taml")).await;
        let registry = fs.content_of("/p/stores/stores.js").unwrap();
        assert!(!registry.contains("colors"));
        assert_eq!(c.stats().registry_rebuilds, 3);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        struct Broken;
        impl Converter for Broken {
            fn convert<'a>(&'a self, _s: &'a str, _f: &'a Path) -> ConvertFuture<'a> {
                Box::pin(async { anyhow::bail!("syntax error") })
            }
        }

        let fs = MockFileSystem::new();
        fs.add_file("/p/bad.starbucks", "<");
        fs.add_file("/p/good.cielo", "g");
        let mut c = coordinator(&fs, RunMode::Watch);
        c.brewer = Brewer::new(
            Arc::new(c.cfg().clone()),
            Arc::new(fs.clone()),
            ConverterSet::builtin()
                .with(SourceKind::Starbucks, Arc::new(Broken))
                .with(SourceKind::Cielo, Arc::new(Echo(""))),
        );

        let step = c.step(scanned("/p/bad.starbucks")).await;
        assert!(step.keep_running);
        assert!(matches!(step.observations[..], [Observation::Failed { .. }]));

        c.step(scanned("/p/good.cielo")).await;
        assert!(fs.content_of("/p/good.coffee").is_some());
        assert_eq!(c.stats().failed, 2); // bad.starbucks and good.coffee (no converter)
    }

    #[tokio::test]
    async fn file_mode_forces_cielo_only() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/w.cielo", "w");
        fs.add_file("/p/w.coffee", "already newer");
        fs.add_file("/p/x.coffee", "x");
        let mut c = coordinator(
            &fs,
            RunMode::Files(vec![PathBuf::from("/p/w.cielo"), PathBuf::from("/p/x.coffee")]),
        );

        c.step(scanned("/p/w.cielo")).await;
        c.step(scanned("/p/x.coffee")).await;
        let step = c.step(WatchEvent::ScanComplete).await;

        assert!(!step.keep_running);
        assert_eq!(fs.content_of("/p/w.coffee").as_deref(), Some("# coffee\nw"));
        assert!(fs.content_of("/p/w.js").is_none());
        assert!(fs.content_of("/p/x.js").is_none());
        assert!(fs.content_of("/p/stores/stores.js").is_none());
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let fs = MockFileSystem::new();
        let mut c = coordinator(&fs, RunMode::Watch);
        assert!(!c.step(WatchEvent::ShutdownRequested).await.keep_running);
    }

    #[tokio::test]
    async fn taml_named_like_the_registry_cannot_clobber_it() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/stores/colors.taml", "- red");
        fs.add_file("/p/stores/stores.taml", "- oops");
        let mut c = coordinator(&fs, RunMode::Watch);

        c.step(scanned("/p/stores/colors.taml")).await;
        let step = c.step(scanned("/p/stores/stores.taml")).await;
        assert!(matches!(step.observations[..], [Observation::NotApplicable { .. }]));
        c.step(WatchEvent::ScanComplete).await;

        let registry = fs.content_of("/p/stores/stores.js").unwrap();
        assert!(registry.contains("export {colors} from './colors.js';"));
        assert!(!registry.contains("TAMLDataStore"));
    }
}
