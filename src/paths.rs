// Workspace Gate - Path Confinement
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Single source of truth for sandbox path resolution.
// Root is canonicalized once at startup and passed by handle, never global.
//
// SECURITY NOTE: only the basename of caller input survives. Resolution
// canonicalizes symlinks; anything that lands outside the root is denied.

use crate::error::{GateError, GateResult};
use std::path::{Path, PathBuf};

/// The one directory all effects are confined to. Immutable after startup.
#[derive(Debug, Clone)]
pub struct SandboxRoot {
    canonical: PathBuf,
}

/// A path proven to live directly inside the sandbox root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedPath {
    path: PathBuf,
    name: String,
}

impl ConfinedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Basename as it lives in the root
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl SandboxRoot {
    /// Create the root directory if absent and canonicalize it.
    pub fn open(root: &Path) -> GateResult<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            GateError::SystemError(format!("cannot create sandbox root {:?}: {}", root, e))
        })?;
        let canonical = std::fs::canonicalize(root).map_err(|e| {
            GateError::SystemError(format!("cannot resolve sandbox root {:?}: {}", root, e))
        })?;
        if !canonical.is_dir() {
            return Err(GateError::SystemError(format!(
                "sandbox root {:?} is not a directory",
                canonical
            )));
        }
        log::info!("Sandbox root: {:?}", canonical);
        Ok(Self { canonical })
    }

    pub fn path(&self) -> &Path {
        &self.canonical
    }

    /// Resolve caller input to a confined path.
    ///
    /// Resolution order:
    ///   1. Strip every directory component (basename-only)
    ///   2. Leaf exists: canonicalize it, following symlinks
    ///   3. Leaf absent: canonical root + basename (parent is the root)
    ///   4. Dangling symlink or anything outside the root: AccessDenied
    pub fn resolve(&self, filename: &str) -> GateResult<ConfinedPath> {
        let denied = || GateError::AccessDenied(filename.to_string());

        let base = basename(filename).ok_or_else(denied)?;
        let joined = self.canonical.join(base);

        let resolved = match std::fs::canonicalize(&joined) {
            Ok(p) => p,
            Err(_) => {
                // Present but unresolvable means a broken symlink
                if std::fs::symlink_metadata(&joined).is_ok() {
                    log::warn!("Denied dangling symlink: {}", filename);
                    return Err(denied());
                }
                joined
            }
        };

        if resolved == self.canonical || !resolved.starts_with(&self.canonical) {
            log::warn!("Denied path outside sandbox: {} -> {:?}", filename, resolved);
            return Err(denied());
        }

        Ok(ConfinedPath { path: resolved, name: base.to_string() })
    }
}

/// Final path component of caller input; `None` for empty, `.` and `..`.
/// Both separators are stripped so `..\..\x` cannot survive on any platform.
fn basename(filename: &str) -> Option<&str> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");
    match base {
        "" | "." | ".." => None,
        b if b.contains('\0') => None,
        b => Some(b),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn sandbox() -> (tempfile::TempDir, SandboxRoot) {
        let dir = tempdir().unwrap();
        let root = SandboxRoot::open(&dir.path().join("workspace")).unwrap();
        (dir, root)
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("notes.txt"), Some("notes.txt"));
        assert_eq!(basename("../../etc/passwd"), Some("passwd"));
        assert_eq!(basename("/etc/passwd"), Some("passwd"));
        assert_eq!(basename("a/b/../../c"), Some("c"));
        assert_eq!(basename("..\\..\\win.ini"), Some("win.ini"));
        assert_eq!(basename(""), None);
        assert_eq!(basename(".."), None);
        assert_eq!(basename("a/.."), None);
        assert_eq!(basename("dir/"), None);
    }

    #[test]
    fn open_creates_missing_root() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/workspace");
        assert!(!target.exists());
        let root = SandboxRoot::open(&target).unwrap();
        assert!(target.is_dir());
        assert!(root.path().is_absolute());
    }

    #[test]
    fn traversal_inputs_stay_inside_root() {
        let (_dir, root) = sandbox();
        for input in ["../../etc/passwd", "/etc/passwd", "a/b/../../c", "./x.txt"] {
            let confined = root.resolve(input).unwrap();
            assert!(confined.as_path().starts_with(root.path()), "{} escaped", input);
            assert_eq!(confined.as_path().parent(), Some(root.path()));
        }
    }

    #[test]
    fn nonexistent_leaf_resolves_via_root() {
        let (_dir, root) = sandbox();
        let confined = root.resolve("new_file.txt").unwrap();
        assert_eq!(confined.as_path(), root.path().join("new_file.txt"));
        assert_eq!(confined.name(), "new_file.txt");
        assert!(!confined.exists());
    }

    #[test]
    fn dot_inputs_are_denied() {
        let (_dir, root) = sandbox();
        for input in ["", ".", "..", "../", "/"] {
            let err = root.resolve(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AccessDenied, "input {:?}", input);
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_denied() {
        let (dir, root) = sandbox();
        let outside = dir.path().join("secret.txt");
        std::fs::write(&outside, "top secret").unwrap();
        std::os::unix::fs::symlink(&outside, root.path().join("link.txt")).unwrap();

        let err = root.resolve("link.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert!(err.to_string().contains("link.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_denied() {
        let (dir, root) = sandbox();
        std::os::unix::fs::symlink(dir.path().join("missing"), root.path().join("ghost.txt"))
            .unwrap();
        let err = root.resolve("ghost.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_within_root_is_allowed() {
        let (_dir, root) = sandbox();
        std::fs::write(root.path().join("real.txt"), "data").unwrap();
        std::os::unix::fs::symlink(root.path().join("real.txt"), root.path().join("alias.txt"))
            .unwrap();
        let confined = root.resolve("alias.txt").unwrap();
        assert_eq!(confined.as_path(), root.path().join("real.txt"));
    }
}
