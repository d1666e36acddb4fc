//! Recipe resolution and destination reconciliation
//!
//! This module provides:
//! - The decision-tree walk from scope to leaf (`navigator`)
//! - The target manifest derived from a leaf plus common files (`manifest`)
//! - The three-phase filesystem reconciliation (`reconcile`)

pub mod manifest;
pub mod navigator;
pub mod reconcile;

pub use manifest::{build_manifest, MoveSpec, TargetManifest};
pub use navigator::{resolve, ChoiceProvider};
pub use reconcile::{reconcile, remove_empty_dirs, ReconcileSummary};
