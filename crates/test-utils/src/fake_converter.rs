use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cielo::build::convert::{ConvertFuture, Converter, ConverterSet};
use cielo::types::SourceKind;

/// A fake converter that:
/// - records which files it was asked to convert
/// - prefixes the source text with a fixed marker, or fails when told to.
#[derive(Clone)]
pub struct RecordingConverter {
    marker: String,
    calls: Arc<Mutex<Vec<PathBuf>>>,
    fail_on: Arc<Mutex<Vec<String>>>,
}

impl RecordingConverter {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every conversion whose source text contains `needle`.
    pub fn fail_when_source_contains(&self, needle: &str) {
        self.fail_on.lock().unwrap().push(needle.to_string());
    }

    /// Files converted so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl RecordingConverter {
    fn record(&self, source: &str, filename: &Path) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(filename.to_path_buf());
        if self
            .fail_on
            .lock()
            .unwrap()
            .iter()
            .any(|needle| source.contains(needle.as_str()))
        {
            anyhow::bail!("fake syntax error in {}", filename.display());
        }
        Ok(format!("{}{}", self.marker, source))
    }
}

impl Converter for RecordingConverter {
    fn convert<'a>(&'a self, source: &'a str, filename: &'a Path) -> ConvertFuture<'a> {
        Box::pin(std::future::ready(self.record(source, filename)))
    }
}

/// Recording fakes for every external converter, plus the built-in taml
/// packager.
#[derive(Clone)]
pub struct FakeConverters {
    pub cielo: RecordingConverter,
    pub coffee: RecordingConverter,
    pub starbucks: RecordingConverter,
}

impl FakeConverters {
    pub fn new() -> Self {
        Self {
            cielo: RecordingConverter::new("# coffee\n"),
            coffee: RecordingConverter::new("// js\n"),
            starbucks: RecordingConverter::new("<!-- svelte -->\n"),
        }
    }

    pub fn set(&self) -> ConverterSet {
        ConverterSet::builtin()
            .with(SourceKind::Cielo, Arc::new(self.cielo.clone()))
            .with(SourceKind::Coffee, Arc::new(self.coffee.clone()))
            .with(SourceKind::Starbucks, Arc::new(self.starbucks.clone()))
    }

    pub fn total_calls(&self) -> usize {
        self.cielo.call_count() + self.coffee.call_count() + self.starbucks.call_count()
    }
}

impl Default for FakeConverters {
    fn default() -> Self {
        Self::new()
    }
}
