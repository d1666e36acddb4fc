//! Deriving the target manifest for a resolved variant

use crate::boxes::config::FileSpec;
use std::collections::BTreeSet;

/// A rename applied during reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSpec {
    pub from: String,
    pub to: String,
}

/// The exact file set the destination must hold for one variant
///
/// `paths` is the union of every plain entry and every move's `from`;
/// `moves` preserves recipe order. Moves are independent of each other:
/// a move may rely on its target's parent directories being created, but
/// never on another move having run first.
#[derive(Debug, Clone, Default)]
pub struct TargetManifest {
    pub paths: BTreeSet<String>,
    pub moves: Vec<MoveSpec>,
}

impl TargetManifest {
    /// True when a file at `relative` belongs in the reconciled tree,
    /// either directly or as the landing spot of a move
    pub fn keeps(&self, relative: &str) -> bool {
        self.paths.contains(relative) || self.moves.iter().any(|m| m.to == relative)
    }
}

/// Flatten a resolved leaf plus the shared common list into a manifest
pub fn build_manifest(leaf: &[FileSpec], common: &[FileSpec]) -> TargetManifest {
    let mut manifest = TargetManifest::default();

    for spec in leaf.iter().chain(common.iter()) {
        match spec {
            FileSpec::Path(path) => {
                manifest.paths.insert(path.clone());
            }
            FileSpec::Move { from, to } => {
                manifest.paths.insert(from.clone());
                manifest.moves.push(MoveSpec {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }
    }

    manifest
}
