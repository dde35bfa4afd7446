// src/build/router.rs

use std::path::Path;

use crate::types::SourceKind;

/// Where a path goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Pipeline(SourceKind),
    /// Not a recognized source file. Expected and frequent, never an error.
    Rejected,
}

/// Map a path to its pipeline by exact, case-sensitive extension.
///
/// Never touches the filesystem.
pub fn route(path: &Path) -> Route {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Route::Rejected;
    };
    SourceKind::ALL
        .into_iter()
        .find(|kind| kind.source_ext() == ext)
        .map_or(Route::Rejected, Route::Pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_known_extensions() {
        assert_eq!(route(Path::new("a/w.cielo")), Route::Pipeline(SourceKind::Cielo));
        assert_eq!(route(Path::new("w.coffee")), Route::Pipeline(SourceKind::Coffee));
        assert_eq!(route(Path::new("w.starbucks")), Route::Pipeline(SourceKind::Starbucks));
        assert_eq!(route(Path::new("stores/c.taml")), Route::Pipeline(SourceKind::Taml));
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(route(Path::new("w.Cielo")), Route::Rejected);
        assert_eq!(route(Path::new("w.js")), Route::Rejected);
        assert_eq!(route(Path::new("Makefile")), Route::Rejected);
        assert_eq!(route(Path::new("w.cielo.bak")), Route::Rejected);
    }
}
