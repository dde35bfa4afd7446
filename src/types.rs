use std::fmt;
use std::path::PathBuf;

/// The fixed set of source kinds cielo knows how to convert.
///
/// - `Cielo`: transpile input, converted to an intermediate `.coffee` file.
/// - `Coffee`: intermediate language, converted to `.js`.
/// - `Starbucks`: template/markup, converted to a `.svelte` component.
/// - `Taml`: declarative data, packaged into a `.js` data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Cielo,
    Coffee,
    Starbucks,
    Taml,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Cielo,
        SourceKind::Coffee,
        SourceKind::Starbucks,
        SourceKind::Taml,
    ];

    /// Extension (without the dot) of source files of this kind.
    pub fn source_ext(self) -> &'static str {
        match self {
            SourceKind::Cielo => "cielo",
            SourceKind::Coffee => "coffee",
            SourceKind::Starbucks => "starbucks",
            SourceKind::Taml => "taml",
        }
    }

    /// Extension (without the dot) of the derived artifact.
    pub fn derived_ext(self) -> &'static str {
        match self {
            SourceKind::Cielo => "coffee",
            SourceKind::Coffee => "js",
            SourceKind::Starbucks => "svelte",
            SourceKind::Taml => "js",
        }
    }

    /// Whether the derived file name goes through the publish transform
    /// (first `_` stripped from the file name).
    pub fn publishes(self) -> bool {
        match self {
            SourceKind::Cielo => false,
            SourceKind::Coffee | SourceKind::Starbucks | SourceKind::Taml => true,
        }
    }

    /// The kind whose source is this kind's derived artifact, if any.
    ///
    /// `.cielo` produces `.coffee`, which is itself a source for the
    /// coffee stage.
    pub fn next_stage(self) -> Option<SourceKind> {
        match self {
            SourceKind::Cielo => Some(SourceKind::Coffee),
            SourceKind::Coffee | SourceKind::Starbucks | SourceKind::Taml => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_ext())
    }
}

/// Outcome of a freshness query.
///
/// `Unknown` means the caller forced a rebuild, so the derived file's state
/// was never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessDecision {
    Stale,
    Fresh,
    Unknown,
}

/// How a single invocation of cielo processes its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Scan the root, then keep watching for changes.
    Watch,
    /// Scan the root once and exit.
    Once,
    /// Process only these files (cielo kind only), then exit.
    Files(Vec<PathBuf>),
}

impl RunMode {
    pub fn is_watching(&self) -> bool {
        matches!(self, RunMode::Watch)
    }
}
