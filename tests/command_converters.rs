// tests/command_converters.rs
#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;

use cielo::fs::RealFileSystem;
use cielo::run_with;
use cielo::types::{RunMode, SourceKind};
use cielo_test_utils::builders::{ProjectDir, RootConfigBuilder};
use cielo_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn file_mode_forces_cielo_through_a_shell_command() -> TestResult {
    init_tracing();
    let mut project = ProjectDir::new();
    let widget = project.write("my_widget.cielo", "hello");
    project.write("my_widget.coffee", "newer than the source");
    let other = project.write("other.coffee", "x");

    let cfg = RootConfigBuilder::new(project.root())
        .mode(RunMode::Files(vec![widget, other]))
        .converter(SourceKind::Cielo, "tr a-z A-Z")
        .converter(SourceKind::Coffee, "cat")
        .build();

    let stats = with_timeout(run_with(Arc::new(cfg), Arc::new(RealFileSystem))).await?;

    // forced even though the coffee file was newer; no chaining to js
    assert_eq!(project.read("my_widget.coffee").as_deref(), Some("HELLO"));
    assert!(!project.exists("mywidget.js"));
    assert!(!project.exists("other.js"));
    assert_eq!(stats.written, 1);
    assert_eq!(stats.not_applicable, 1);
    Ok(())
}

#[tokio::test]
async fn failing_command_is_reported_not_fatal() -> TestResult {
    init_tracing();
    let mut project = ProjectDir::new();
    project.write("a.starbucks", "<a/>");
    project.write("b.cielo", "b");

    let cfg = RootConfigBuilder::new(project.root())
        .converter(SourceKind::Starbucks, "echo 'unexpected token' >&2; exit 3")
        .converter(SourceKind::Cielo, "cat")
        .build();

    let stats = with_timeout(run_with(Arc::new(cfg), Arc::new(RealFileSystem))).await?;

    assert!(!project.exists("a.svelte"));
    assert_eq!(project.read("b.coffee").as_deref(), Some("b"));
    // a.starbucks, plus b.coffee which has no coffee converter configured
    assert_eq!(stats.failed, 2);
    Ok(())
}
