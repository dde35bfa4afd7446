// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Directory name whose contents are never processed.
pub const DEPENDENCY_CACHE_DIR: &str = "node_modules";

/// Decides which paths (relative to the root) the coordinator may look at.
///
/// A path is dropped when:
/// - any segment is `node_modules`,
/// - any segment begins with `.` (hidden files and tooling dirs like `.git`),
/// - it matches one of the user's `[watch] ignore` globs.
///
/// Relative paths use forward slashes, e.g. `"src/lib/widget.cielo"`.
#[derive(Clone, Default)]
pub struct PathFilter {
    ignore_set: Option<GlobSet>,
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFilter")
            .field("ignore_globs", &self.ignore_set.as_ref().map(|s| s.len()))
            .finish()
    }
}

impl PathFilter {
    /// Filter with only the built-in rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with the built-in rules plus user ignore globs.
    pub fn with_ignore_globs(patterns: &[String]) -> Result<Self> {
        let ignore_set = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(patterns).context("building ignore globset")?)
        };
        Ok(Self { ignore_set })
    }

    /// Returns true if the coordinator should consider `rel_path` at all.
    pub fn allows(&self, rel_path: &str) -> bool {
        if rel_path.is_empty() {
            return false;
        }
        let hidden_or_cached = rel_path
            .split('/')
            .any(|seg| seg == DEPENDENCY_CACHE_DIR || seg.starts_with('.'));
        if hidden_or_cached {
            return false;
        }
        match &self.ignore_set {
            Some(set) => !set.is_match(rel_path),
            None => true,
        }
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_dependency_cache_and_hidden_segments() {
        let filter = PathFilter::new();
        assert!(filter.allows("src/widget.cielo"));
        assert!(!filter.allows("node_modules/pkg/index.coffee"));
        assert!(!filter.allows("web/node_modules/pkg/a.taml"));
        assert!(!filter.allows(".git/hooks/x.coffee"));
        assert!(!filter.allows("src/.cache/widget.cielo"));
        assert!(!filter.allows(".hidden.cielo"));
    }

    #[test]
    fn user_globs_are_applied_after_builtins() {
        let filter = PathFilter::with_ignore_globs(&["dist/**".to_string()]).unwrap();
        assert!(!filter.allows("dist/app.coffee"));
        assert!(filter.allows("src/app.coffee"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        assert!(PathFilter::with_ignore_globs(&["src/[".to_string()]).is_err());
    }
}
