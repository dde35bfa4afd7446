// src/build/freshness.rs

//! Decides whether a derived artifact is already up to date.
//!
//! A derived file is fresh when it exists and its mtime is greater than or
//! equal to the source's. Equal mtimes count as fresh: on filesystems with
//! coarse timestamps (1s or 2s) a rebuild in the same tick as the source edit
//! would otherwise look stale forever and rebuild on every event.
//!
//! No caching: every call stats both files again.

use std::path::Path;

use crate::fs::FileSystem;
use crate::types::FreshnessDecision;

/// Full three-way decision. `force` short-circuits to `Unknown`.
pub fn decide(
    fs: &dyn FileSystem,
    source: &Path,
    derived: &Path,
    force: bool,
) -> FreshnessDecision {
    if force {
        return FreshnessDecision::Unknown;
    }
    let Some(derived_mtime) = fs.modified(derived) else {
        return FreshnessDecision::Stale;
    };
    let Some(source_mtime) = fs.modified(source) else {
        return FreshnessDecision::Stale;
    };
    if derived_mtime >= source_mtime {
        FreshnessDecision::Fresh
    } else {
        FreshnessDecision::Stale
    }
}

/// True only if the rebuild of `derived` can be skipped.
pub fn is_fresh(fs: &dyn FileSystem, source: &Path, derived: &Path, force: bool) -> bool {
    decide(fs, source, derived, force) == FreshnessDecision::Fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    const SRC: &str = "/p/w.cielo";
    const DST: &str = "/p/w.coffee";

    #[test]
    fn missing_derived_is_stale() {
        let fs = MockFileSystem::new();
        fs.add_file(SRC, "x");
        assert_eq!(decide(&fs, Path::new(SRC), Path::new(DST), false), FreshnessDecision::Stale);
    }

    #[test]
    fn newer_or_equal_derived_is_fresh() {
        let fs = MockFileSystem::new();
        fs.add_file(SRC, "x");
        fs.add_file(DST, "y");
        assert!(is_fresh(&fs, Path::new(SRC), Path::new(DST), false));

        fs.set_mtime(SRC, 50);
        fs.set_mtime(DST, 50);
        assert!(is_fresh(&fs, Path::new(SRC), Path::new(DST), false));
    }

    #[test]
    fn advancing_source_flips_to_stale_and_back() {
        let fs = MockFileSystem::new();
        fs.add_file(SRC, "x");
        fs.add_file(DST, "y");
        fs.set_mtime(SRC, 10);
        fs.set_mtime(DST, 20);
        assert!(is_fresh(&fs, Path::new(SRC), Path::new(DST), false));

        fs.set_mtime(SRC, 21);
        assert_eq!(decide(&fs, Path::new(SRC), Path::new(DST), false), FreshnessDecision::Stale);

        fs.set_mtime(SRC, 10);
        assert!(is_fresh(&fs, Path::new(SRC), Path::new(DST), false));
    }

    #[test]
    fn force_is_never_fresh() {
        let fs = MockFileSystem::new();
        fs.add_file(SRC, "x");
        fs.add_file(DST, "y");
        assert_eq!(decide(&fs, Path::new(SRC), Path::new(DST), true), FreshnessDecision::Unknown);
        assert!(!is_fresh(&fs, Path::new(SRC), Path::new(DST), true));
    }
}
