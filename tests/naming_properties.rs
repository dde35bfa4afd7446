use std::path::{Path, PathBuf};

use proptest::prelude::*;

use cielo::build::{deletion_targets, derived_path, route, Route};
use cielo::types::SourceKind;

fn kind_strategy() -> impl Strategy<Value = SourceKind> {
    prop_oneof![
        Just(SourceKind::Cielo),
        Just(SourceKind::Coffee),
        Just(SourceKind::Starbucks),
        Just(SourceKind::Taml),
    ]
}

// Stems and directory names drawn from the characters that actually show up
// in project trees, underscores included so the publish transform is hit.
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,12}"
}

proptest! {
    #[test]
    fn derived_path_is_pure_and_stays_in_the_source_dir(
        dirs in proptest::collection::vec(name_strategy(), 0..4),
        stem in name_strategy(),
        kind in kind_strategy(),
    ) {
        let mut source = PathBuf::from("/proj");
        for d in &dirs {
            source.push(d);
        }
        source.push(format!("{stem}.{}", kind.source_ext()));

        let first = derived_path(&source, kind);
        let second = derived_path(&source, kind);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.parent(), source.parent());
        prop_assert_eq!(
            first.extension().and_then(|e| e.to_str()),
            Some(kind.derived_ext())
        );
        prop_assert_eq!(route(&source), Route::Pipeline(kind));
    }

    #[test]
    fn deletion_removes_exactly_what_the_pipeline_writes(
        stem in name_strategy(),
        kind in kind_strategy(),
    ) {
        let source = PathBuf::from(format!("/proj/src/{stem}.{}", kind.source_ext()));
        let targets = deletion_targets(&source, kind);

        prop_assert_eq!(targets.first(), Some(&derived_path(&source, kind)));
        if let Some(next) = kind.next_stage() {
            let intermediate = derived_path(&source, kind);
            prop_assert_eq!(targets.get(1), Some(&derived_path(&intermediate, next)));
            prop_assert_eq!(targets.len(), 2);
        } else {
            prop_assert_eq!(targets.len(), 1);
        }
    }

    #[test]
    fn router_never_accepts_case_variants(stem in name_strategy(), kind in kind_strategy()) {
        let upper = format!("{stem}.{}", kind.source_ext().to_uppercase());
        prop_assert_eq!(route(Path::new(&upper)), Route::Rejected);
    }
}
