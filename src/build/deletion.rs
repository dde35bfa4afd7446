// src/build/deletion.rs

//! Removing derived artifacts when their source disappears.
//!
//! Targets come from the same [`derived_path`] the forward pipelines use, so
//! a deletion always hits exactly the file the pipeline would have written.
//! Deleting a `.cielo` source cascades through both stages: the `.coffee`
//! it produced and the `.js` that the coffee stage produced from that.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::build::naming::derived_path;
use crate::build::pipeline::Brewer;
use crate::types::SourceKind;

/// Every derived path that exists because of `source`, nearest stage first.
pub fn deletion_targets(source: &Path, kind: SourceKind) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    let mut current = source.to_path_buf();
    let mut stage = Some(kind);
    while let Some(k) = stage {
        let dest = derived_path(&current, k);
        targets.push(dest.clone());
        current = dest;
        stage = k.next_stage();
    }
    targets
}

/// What a deletion actually did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    /// Files that existed and were removed.
    pub removed: Vec<PathBuf>,
    /// Targets that were already gone.
    pub absent: Vec<PathBuf>,
    /// Targets whose removal failed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

/// Remove the artifacts derived from a deleted `source`.
///
/// Never fails: a missing target is fine and other errors are logged and
/// reported. A taml source outside `DIR_STORES` never produced anything, so
/// nothing is removed for it (a `.js` next to it may belong to a coffee file).
/// The store registry is never a deletion target.
pub fn handle_deletion(brewer: &Brewer, source: &Path, kind: SourceKind) -> DeletionReport {
    let mut report = DeletionReport::default();

    if kind == SourceKind::Taml && brewer.check_stores_dir(source).is_err() {
        return report;
    }

    for target in deletion_targets(source, kind) {
        if brewer.is_registry(&target) {
            continue;
        }
        match brewer.fs().remove_file(&target) {
            Ok(true) => {
                info!("   unlink {}", brewer.short(&target));
                report.removed.push(target);
            }
            Ok(false) => report.absent.push(target),
            Err(err) => {
                warn!(file = ?target, error = %format!("{err:#}"), "failed to remove derived file");
                report.failed.push((target, format!("{err:#}")));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::build::convert::ConverterSet;
    use crate::config::{DirEnv, RootConfig};
    use crate::fs::mock::MockFileSystem;
    use crate::types::RunMode;

    fn brewer(fs: &MockFileSystem) -> Brewer {
        let mut cfg = RootConfig::new("/p", RunMode::Watch);
        cfg.env = DirEnv::from_pairs([("DIR_STORES", "/p/stores")]);
        Brewer::new(Arc::new(cfg), Arc::new(fs.clone()), ConverterSet::builtin())
    }

    #[test]
    fn targets_match_forward_naming() {
        for kind in SourceKind::ALL {
            let src = PathBuf::from(format!("/p/a_b.{}", kind.source_ext()));
            assert_eq!(deletion_targets(&src, kind)[0], derived_path(&src, kind));
        }
    }

    #[test]
    fn cielo_cascades_through_coffee() {
        assert_eq!(
            deletion_targets(Path::new("/p/my_widget.cielo"), SourceKind::Cielo),
            vec![PathBuf::from("/p/my_widget.coffee"), PathBuf::from("/p/mywidget.js")]
        );
    }

    #[test]
    fn starbucks_removes_published_svelte_only() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/thingextra.svelte", "");
        fs.add_file("/p/other.svelte", "");

        let report = handle_deletion(&brewer(&fs), Path::new("/p/thing_extra.starbucks"), SourceKind::Starbucks);
        assert_eq!(report.removed, vec![PathBuf::from("/p/thingextra.svelte")]);
        assert!(fs.content_of("/p/other.svelte").is_some());
    }

    #[test]
    fn already_absent_is_fine() {
        let fs = MockFileSystem::new();
        let report = handle_deletion(&brewer(&fs), Path::new("/p/gone.coffee"), SourceKind::Coffee);
        assert!(report.removed.is_empty());
        assert_eq!(report.absent, vec![PathBuf::from("/p/gone.js")]);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn taml_outside_stores_leaves_coffee_output_alone() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/lib/util.js", "");
        let report = handle_deletion(&brewer(&fs), Path::new("/p/lib/util.taml"), SourceKind::Taml);
        assert_eq!(report, DeletionReport::default());
        assert!(fs.content_of("/p/lib/util.js").is_some());
    }

    #[test]
    fn deleting_a_taml_named_like_the_registry_keeps_the_registry() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/stores/stores.js", "// registry");
        let report = handle_deletion(&brewer(&fs), Path::new("/p/stores/stores.taml"), SourceKind::Taml);
        assert!(report.removed.is_empty());
        assert!(fs.content_of("/p/stores/stores.js").is_some());
    }
}
