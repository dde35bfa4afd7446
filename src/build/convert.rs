// src/build/convert.rs

//! Converters: `(source text, source path) -> derived text`.
//!
//! The pipelines only see the [`Converter`] trait. Production converters
//! for cielo, coffee and starbucks are shell commands from `[converters]`;
//! taml is packaged in-process by [`TamlPackager`].

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::build::naming::{derived_path, stub_of};
use crate::config::Settings;
use crate::types::SourceKind;

/// Environment variable through which command converters learn the source
/// file name.
pub const FILENAME_VAR: &str = "CIELO_FILENAME";

/// Future returned by [`Converter::convert`].
pub type ConvertFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// A source-to-target conversion that may fail.
///
/// Production code spawns external commands; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait Converter: Send + Sync {
    fn convert<'a>(&'a self, source: &'a str, filename: &'a Path) -> ConvertFuture<'a>;
}

/// Runs a shell command with the source on stdin and takes its stdout.
///
/// A non-zero exit status is a conversion failure; stderr becomes the error
/// message.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    command: String,
}

impl CommandConverter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    // Build a shell command appropriate for the platform.
    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.command);
            c
        }
    }

    async fn run(&self, source: &str, filename: &Path) -> Result<String> {
        debug!(cmd = %self.command, file = ?filename, "running converter");

        let mut cmd = self.shell();
        cmd.env(FILENAME_VAR, filename)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning converter '{}'", self.command))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("converter stdin unavailable"))?;

        // Stdin is fed while stdout/stderr are drained, so neither side can
        // stall on a full pipe. Dropping stdin signals EOF.
        let feed = async move {
            let res = stdin.write_all(source.as_bytes()).await;
            drop(stdin);
            res
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.context("waiting for converter")?;

        // A converter that exits without reading all input is judged by its
        // exit status alone.
        if let Err(err) = written {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(anyhow::Error::from(err).context("writing converter stdin"));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("converter output is not valid UTF-8")
    }
}

impl Converter for CommandConverter {
    fn convert<'a>(&'a self, source: &'a str, filename: &'a Path) -> ConvertFuture<'a> {
        Box::pin(self.run(source, filename))
    }
}

/// Stand-in for a kind with no command configured; always fails.
#[derive(Debug, Clone, Copy)]
pub struct MissingConverter(pub SourceKind);

impl Converter for MissingConverter {
    fn convert<'a>(&'a self, _source: &'a str, _filename: &'a Path) -> ConvertFuture<'a> {
        let kind = self.0;
        Box::pin(async move {
            bail!(
                "no converter configured for .{kind} files (set [converters].{kind} in cielo.toml)"
            )
        })
    }
}

/// Packages raw taml into a data-store module named after the derived file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TamlPackager;

impl TamlPackager {
    pub fn package(stub: &str, taml: &str) -> String {
        let escaped = taml.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${");
        format!(
            "import {{TAMLDataStore}} from '@jdeighan/starbucks/stores';\n\nexport let {stub} = new TAMLDataStore(`{escaped}`);\n"
        )
    }
}

impl TamlPackager {
    fn package_file(source: &str, filename: &Path) -> Result<String> {
        let stub = stub_of(&derived_path(filename, SourceKind::Taml));
        if stub.is_empty() {
            bail!("cannot derive a store name from {:?}", filename);
        }
        Ok(Self::package(&stub, source))
    }
}

impl Converter for TamlPackager {
    fn convert<'a>(&'a self, source: &'a str, filename: &'a Path) -> ConvertFuture<'a> {
        Box::pin(std::future::ready(Self::package_file(source, filename)))
    }
}

/// One converter per [`SourceKind`], indexed by kind.
#[derive(Clone)]
pub struct ConverterSet {
    converters: [Arc<dyn Converter>; 4],
}

impl fmt::Debug for ConverterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSet").finish_non_exhaustive()
    }
}

impl ConverterSet {
    /// Only the built-in taml packager; every other kind fails until set.
    pub fn builtin() -> Self {
        Self {
            converters: SourceKind::ALL.map(|kind| -> Arc<dyn Converter> {
                match kind {
                    SourceKind::Taml => Arc::new(TamlPackager),
                    SourceKind::Cielo | SourceKind::Coffee | SourceKind::Starbucks => {
                        Arc::new(MissingConverter(kind))
                    }
                }
            }),
        }
    }

    /// Built-ins plus the commands from `[converters]`.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut set = Self::builtin();
        for kind in SourceKind::ALL {
            if let Some(cmd) = settings.converter_command(kind) {
                set = set.with(kind, Arc::new(CommandConverter::new(cmd)));
            }
        }
        set
    }

    /// Replace the converter for one kind.
    pub fn with(mut self, kind: SourceKind, converter: Arc<dyn Converter>) -> Self {
        self.converters[kind as usize] = converter;
        self
    }

    pub fn get(&self, kind: SourceKind) -> &dyn Converter {
        self.converters[kind as usize].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn taml_is_wrapped_with_published_stub() {
        let out = TamlPackager
            .convert("- red\n- green\n", Path::new("/p/stores/my_colors.taml"))
            .await
            .unwrap();
        assert!(out.starts_with("import {TAMLDataStore} from '@jdeighan/starbucks/stores';"));
        assert!(out.contains("export let mycolors = new TAMLDataStore(`- red\n- green\n`);"));
    }

    #[test]
    fn taml_template_literal_is_escaped() {
        let out = TamlPackager::package("x", "a `b` ${c}");
        assert!(out.contains("`a \\`b\\` \\${c}`"));
    }

    #[tokio::test]
    async fn unconfigured_kind_fails_with_hint() {
        let set = ConverterSet::builtin();
        let err = set
            .get(SourceKind::Coffee)
            .convert("x = 1", Path::new("a.coffee"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("[converters].coffee"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_converter_pipes_stdin_to_stdout() {
        let conv = CommandConverter::new("tr a-z A-Z");
        let out = conv.convert("hello", Path::new("w.cielo")).await.unwrap();
        assert_eq!(out, "HELLO");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_converter_reports_stderr_on_failure() {
        let conv = CommandConverter::new("echo broken >&2; exit 3");
        let err = conv.convert("x", Path::new("w.cielo")).await.unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_converter_sees_filename() {
        let conv = CommandConverter::new("cat >/dev/null; printf %s \"$CIELO_FILENAME\"");
        let out = conv.convert("x", Path::new("/p/w.starbucks")).await.unwrap();
        assert_eq!(out, "/p/w.starbucks");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_converter_ignoring_stdin_still_succeeds() {
        // Large input the command never reads must not deadlock or fail.
        let conv = CommandConverter::new("printf done");
        let big = "x".repeat(1 << 20);
        let out = conv.convert(&big, Path::new("w.cielo")).await.unwrap();
        assert_eq!(out, "done");
    }
}
