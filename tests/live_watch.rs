// tests/live_watch.rs
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use cielo::build::ConverterSet;
use cielo::engine::{Coordinator, Runtime, WatchEvent};
use cielo::fs::RealFileSystem;
use cielo::types::{RunMode, SourceKind};
use cielo::watch::{spawn_scan, spawn_watcher};
use cielo_test_utils::builders::{ProjectDir, RootConfigBuilder};
use cielo_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const POLL: Duration = Duration::from_millis(50);

async fn wait_until(mut cond: impl FnMut() -> bool) {
    while !cond() {
        tokio::time::sleep(POLL).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_builds_and_cleans_up_a_cielo_file() -> TestResult {
    with_timeout(async {
        init_tracing();

        let project = ProjectDir::new();
        project.mkdir("src");
        let cfg = Arc::new(
            RootConfigBuilder::new(project.root())
                .mode(RunMode::Watch)
                .converter(SourceKind::Cielo, "cat")
                .converter(SourceKind::Coffee, "cat")
                .build(),
        );
        let converters = ConverterSet::from_settings(&cfg.settings);
        let coordinator = Coordinator::new(Arc::clone(&cfg), Arc::new(RealFileSystem), converters)?;

        let (tx, rx) = mpsc::channel::<WatchEvent>(256);
        let _watcher = spawn_watcher(project.root(), tx.clone())?;
        spawn_scan(project.root(), tx.clone());
        let runtime = tokio::spawn(Runtime::new(coordinator, rx).run());

        std::fs::write(project.path("src/my_widget.cielo"), "widget = 1\n")?;
        wait_until(|| project.exists("src/my_widget.coffee") && project.exists("src/mywidget.js"))
            .await;

        std::fs::remove_file(project.path("src/my_widget.cielo"))?;
        wait_until(|| !project.exists("src/my_widget.coffee") && !project.exists("src/mywidget.js"))
            .await;

        tx.send(WatchEvent::ShutdownRequested).await?;
        let stats = runtime.await??;
        assert!(stats.written >= 2);
        assert!(stats.removed >= 2);
        Ok(())
    })
    .await
}
