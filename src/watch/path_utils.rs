// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`. For a
/// freshly deleted file canonicalization fails, so only the fast path can
/// succeed; the watcher canonicalizes `root` up front for that reason.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        let s = rel.to_string_lossy().replace('\\', "/");
        return Some(s);
    }

    // Helps on platforms (notably macOS) where different absolute prefixes
    // may be used for the same directory (/private/var/...).
    if let (Ok(root_canon), Ok(path_canon)) =
        (root.canonicalize(), path.canonicalize())
    {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            let s = rel.to_string_lossy().replace('\\', "/");
            return Some(s);
        }
    }

    None
}

/// Make `path` absolute against `base` and drop `.` / `..` components
/// lexically, without touching the filesystem.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_str_uses_forward_slashes() {
        let rel = relative_str(Path::new("/proj"), Path::new("/proj/src/a.cielo"));
        assert_eq!(rel.as_deref(), Some("src/a.cielo"));
    }

    #[test]
    fn unrelated_path_is_none() {
        assert_eq!(relative_str(Path::new("/proj/a"), Path::new("/elsewhere/b")), None);
    }

    #[test]
    fn absolutize_normalizes_dots() {
        assert_eq!(
            absolutize(Path::new("/proj/src"), Path::new("../lib/./x.cielo")),
            PathBuf::from("/proj/lib/x.cielo")
        );
        assert_eq!(
            absolutize(Path::new("/proj"), Path::new("/abs/y.cielo")),
            PathBuf::from("/abs/y.cielo")
        );
    }
}
