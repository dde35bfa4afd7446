// src/build/naming.rs

//! Pure naming rules from a source path to its derived artifact.
//!
//! Both the forward pipelines and the deletion handler go through
//! [`derived_path`]; nothing else in the crate builds derived names.

use std::path::{Path, PathBuf};

use crate::types::SourceKind;

/// The publish transform: drop the first `_` from a file stem.
///
/// `foo_bar` becomes `foobar`. A stem that would become empty is kept as is.
pub fn publish_stem(stem: &str) -> String {
    let published = stem.replacen('_', "", 1);
    if published.is_empty() {
        stem.to_string()
    } else {
        published
    }
}

/// Path of the artifact generated from `source` by the `kind` pipeline.
///
/// Only the file name changes; directory components are never touched.
pub fn derived_path(source: &Path, kind: SourceKind) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = if kind.publishes() {
        publish_stem(&stem)
    } else {
        stem
    };
    let file_name = format!("{stem}.{}", kind.derived_ext());
    match source.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// File name without its extension, e.g. `colors` for `stores/colors.js`.
pub fn stub_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
