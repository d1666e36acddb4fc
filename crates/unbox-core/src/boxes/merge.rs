//! Merging an extracted box into the destination directory
//!
//! The merge runs before any recipe logic: entries new to the destination
//! are copied unconditionally, name collisions are resolved per entry by
//! the caller-supplied confirmation (or force-overwritten wholesale).

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;

/// Answers "overwrite this colliding entry?" for one top-level entry name
pub type ConfirmFn<'a> = dyn FnMut(&str) -> Result<bool> + 'a;

/// Merge the staged box at `staging` into `dest`
///
/// Collisions are decided per top-level entry, in sorted order:
/// - `force` copies every colliding entry, overwriting in place
///   (directories merge recursively, files are replaced)
/// - otherwise `confirm` is asked per entry; yes deletes the existing
///   entry and copies the incoming one, no keeps the destination entry
///   untouched and discards the incoming one
pub fn merge(staging: &Path, dest: &Path, force: bool, confirm: &mut ConfirmFn<'_>) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create destination: {}", dest.display()))?;

    let mut names: Vec<OsString> = std::fs::read_dir(staging)
        .with_context(|| format!("Failed to read {}", staging.display()))?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("Failed to list {}", staging.display()))?;
    names.sort();

    for name in names {
        let incoming = staging.join(&name);
        let existing = dest.join(&name);

        if !existing.exists() {
            copy_entry(&incoming, &existing)?;
            continue;
        }

        if force {
            copy_entry(&incoming, &existing)?;
            continue;
        }

        if confirm(&name.to_string_lossy())? {
            remove_entry(&existing)?;
            copy_entry(&incoming, &existing)?;
        }
    }

    Ok(())
}

/// Copy a file or directory tree; directories merge-overwrite into an
/// existing target, files replace it
fn copy_entry(source: &Path, target: &Path) -> Result<()> {
    if source.is_dir() {
        std::fs::create_dir_all(target)
            .with_context(|| format!("Failed to create directory: {}", target.display()))?;
        for entry in std::fs::read_dir(source)
            .with_context(|| format!("Failed to read {}", source.display()))?
        {
            let entry =
                entry.with_context(|| format!("Failed to read entry in {}", source.display()))?;
            copy_entry(&entry.path(), &target.join(entry.file_name()))?;
        }
    } else {
        // A file may be replacing a directory of the same name
        if target.is_dir() {
            std::fs::remove_dir_all(target)
                .with_context(|| format!("Failed to remove {}", target.display()))?;
        }
        std::fs::copy(source, target).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                target.display()
            )
        })?;
    }
    Ok(())
}

fn remove_entry(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove {}", path.display()))
    } else {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))
    }
}
