//! Reconciling the destination tree against a target manifest
//!
//! Three strictly ordered phases, each durable on its own: prune files
//! the manifest does not keep, apply the manifest's moves, prune
//! directories left empty. There is no rollback; a failure aborts the
//! remaining phases and leaves the completed ones on disk.

use crate::error::UnboxError;
use crate::recipe::manifest::TargetManifest;
use anyhow::{Context, Result};
use std::path::Path;
use walkdir::WalkDir;

/// What a reconciliation run actually did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub pruned_files: usize,
    pub applied_moves: usize,
    pub removed_dirs: usize,
}

/// Bring `dest` in line with `manifest`
///
/// Moves run after pruning so a move's source is never deleted out from
/// under it, and before empty-directory cleanup so directories vacated by
/// either phase are removed last. Running twice against the same manifest
/// is idempotent: the second pass prunes nothing and moves nothing.
pub fn reconcile(dest: &Path, manifest: &TargetManifest) -> Result<ReconcileSummary> {
    let pruned_files = prune_extras(dest, manifest)?;
    let applied_moves = apply_moves(dest, manifest)?;
    let removed_dirs = remove_empty_dirs(dest)?;
    Ok(ReconcileSummary {
        pruned_files,
        applied_moves,
        removed_dirs,
    })
}

/// Delete every file under `dest` the manifest does not keep
///
/// Only files are evaluated; directories are handled by
/// [`remove_empty_dirs`] once the files are settled.
fn prune_extras(dest: &Path, manifest: &TargetManifest) -> Result<usize> {
    let mut pruned = 0;

    for entry in WalkDir::new(dest) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dest.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dest)
            .with_context(|| format!("Failed to relativize {}", entry.path().display()))?;
        if manifest.keeps(&unix_path(relative)) {
            continue;
        }

        std::fs::remove_file(entry.path())
            .with_context(|| format!("Failed to prune {}", entry.path().display()))?;
        pruned += 1;
    }

    Ok(pruned)
}

/// Apply the manifest's renames, creating target parents as needed
///
/// A move whose source is gone but whose target is present has already
/// been applied and is skipped; a move with neither side on disk is a
/// malformed recipe and fails the run.
fn apply_moves(dest: &Path, manifest: &TargetManifest) -> Result<usize> {
    let mut applied = 0;

    for mv in &manifest.moves {
        let from = dest.join(&mv.from);
        let to = dest.join(&mv.to);

        if !from.exists() {
            if to.exists() {
                continue;
            }
            return Err(UnboxError::mismatch(&mv.from, "move source missing from destination").into());
        }

        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::rename(&from, &to).with_context(|| {
            format!("Failed to move {} to {}", from.display(), to.display())
        })?;
        applied += 1;
    }

    Ok(applied)
}

/// Remove directories left empty, children before parents
///
/// The root itself is never removed; a non-directory root is a no-op.
pub fn remove_empty_dirs(root: &Path) -> Result<usize> {
    if !root.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    visit_dir(root, true, &mut removed)?;
    Ok(removed)
}

/// Returns true when `dir` was removed
fn visit_dir(dir: &Path, is_root: bool, removed: &mut usize) -> Result<bool> {
    let mut occupied = false;

    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;

        if file_type.is_dir() {
            if !visit_dir(&entry.path(), false, removed)? {
                occupied = true;
            }
        } else {
            occupied = true;
        }
    }

    if is_root || occupied {
        return Ok(false);
    }

    std::fs::remove_dir(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    *removed += 1;
    Ok(true)
}

/// Relative path with `/` separators, as manifest paths are written
fn unix_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::manifest::{build_manifest, MoveSpec};
    use crate::boxes::config::FileSpec;
    use std::path::PathBuf;

    fn write(path: PathBuf, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn path(p: &str) -> FileSpec {
        FileSpec::Path(p.to_string())
    }

    fn mv(from: &str, to: &str) -> FileSpec {
        FileSpec::Move {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    fn files_under(root: &Path) -> Vec<String> {
        let mut found: Vec<String> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| unix_path(e.path().strip_prefix(root).unwrap()))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_prunes_files_not_in_manifest() {
        let dest = tempfile::tempdir().unwrap();
        write(dest.path().join("keep.txt"), "k");
        write(dest.path().join("drop.txt"), "d");
        write(dest.path().join("nested/drop.md"), "d");

        let manifest = build_manifest(&[path("keep.txt")], &[]);
        let summary = reconcile(dest.path(), &manifest).unwrap();

        assert_eq!(summary.pruned_files, 2);
        assert_eq!(files_under(dest.path()), vec!["keep.txt"]);
    }

    #[test]
    fn test_applies_moves_with_parent_creation() {
        let dest = tempfile::tempdir().unwrap();
        write(dest.path().join("tpl.txt"), "template");

        let manifest = build_manifest(&[mv("tpl.txt", "deep/nested/tpl.txt")], &[]);
        let summary = reconcile(dest.path(), &manifest).unwrap();

        assert_eq!(summary.applied_moves, 1);
        assert_eq!(
            std::fs::read_to_string(dest.path().join("deep/nested/tpl.txt")).unwrap(),
            "template"
        );
        assert!(!dest.path().join("tpl.txt").exists());
    }

    #[test]
    fn test_missing_move_source_is_config_mismatch() {
        let dest = tempfile::tempdir().unwrap();

        let manifest = build_manifest(&[mv("absent.txt", "elsewhere.txt")], &[]);
        let err = reconcile(dest.path(), &manifest).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<UnboxError>(),
            Some(UnboxError::ConfigMismatch { .. })
        ));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let dest = tempfile::tempdir().unwrap();
        write(dest.path().join("keep.txt"), "k");
        write(dest.path().join("drop.txt"), "d");
        write(dest.path().join("tpl.txt"), "t");

        let manifest = build_manifest(&[path("keep.txt"), mv("tpl.txt", "src/tpl.txt")], &[]);

        let first = reconcile(dest.path(), &manifest).unwrap();
        assert_eq!(first.pruned_files, 1);
        assert_eq!(first.applied_moves, 1);

        let before = files_under(dest.path());
        let second = reconcile(dest.path(), &manifest).unwrap();

        assert_eq!(second, ReconcileSummary::default());
        assert_eq!(files_under(dest.path()), before);
    }

    #[test]
    fn test_prune_completeness() {
        let dest = tempfile::tempdir().unwrap();
        for name in ["a", "b/c", "b/d", "e/f/g"] {
            write(dest.path().join(name), "x");
        }

        let manifest = build_manifest(&[path("b/c")], &[]);
        reconcile(dest.path(), &manifest).unwrap();

        for file in files_under(dest.path()) {
            assert!(manifest.keeps(&file), "{} survived outside manifest", file);
        }
    }

    #[test]
    fn test_empty_dirs_removed_bottom_up() {
        let dest = tempfile::tempdir().unwrap();
        write(dest.path().join("keep.txt"), "k");
        write(dest.path().join("a/b/c/drop.txt"), "d");

        let manifest = build_manifest(&[path("keep.txt")], &[]);
        let summary = reconcile(dest.path(), &manifest).unwrap();

        // a/b/c, a/b, and a all end up empty once the file is pruned
        assert_eq!(summary.removed_dirs, 3);
        assert!(!dest.path().join("a").exists());
        assert!(dest.path().exists(), "root is never deleted");
    }

    #[test]
    fn test_remove_empty_dirs_preserves_root_and_occupied() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("empty/inner")).unwrap();
        write(root.path().join("full/file.txt"), "x");

        let removed = remove_empty_dirs(root.path()).unwrap();

        assert_eq!(removed, 2);
        assert!(root.path().exists());
        assert!(!root.path().join("empty").exists());
        assert!(root.path().join("full/file.txt").is_file());
    }

    #[test]
    fn test_remove_empty_dirs_on_empty_root() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(remove_empty_dirs(root.path()).unwrap(), 0);
        assert!(root.path().exists());
    }

    #[test]
    fn test_remove_empty_dirs_non_directory_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        write(file.clone(), "x");

        assert_eq!(remove_empty_dirs(&file).unwrap(), 0);
        assert!(file.is_file());
    }

    #[test]
    fn test_move_target_not_pruned_on_rerun() {
        let dest = tempfile::tempdir().unwrap();
        write(dest.path().join("tpl.txt"), "t");

        let manifest = TargetManifest {
            paths: ["tpl.txt".to_string()].into(),
            moves: vec![MoveSpec {
                from: "tpl.txt".to_string(),
                to: "src/tpl.txt".to_string(),
            }],
        };

        reconcile(dest.path(), &manifest).unwrap();
        reconcile(dest.path(), &manifest).unwrap();

        assert!(dest.path().join("src/tpl.txt").is_file());
    }
}
