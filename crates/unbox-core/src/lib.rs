//! Unbox Core - Library for unpacking project template boxes
//!
//! This library provides the core functionality for unpacking a template
//! ("box") into a working directory and customizing the result through a
//! declarative recipe. It is designed to be used by the `unbox` CLI binary,
//! but every stage is usable on its own.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Box Operations** - Fetching a box into a staging directory
//!   and merging it into the destination (`boxes`)
//! - **Layer 2: Recipe Resolution** - Walking the recipe decision tree,
//!   deriving the target manifest, reconciling the destination (`recipe`)
//! - **Layer 3: CLI/TUI Interface** - cliclack-based prompts driving the
//!   whole pipeline (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based interactive pipeline
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use unbox_core::boxes::{BoxFetcher, BoxSource};
//! use unbox_core::recipe;
//!
//! let fetcher = BoxFetcher::new(BoxSource::parse("./my-box"));
//! fetcher.fetch(staging.path()).await?;
//! unbox_core::boxes::merge(staging.path(), dest, false, &mut confirm)?;
//! ```

pub mod boxes;
pub mod error;
pub mod recipe;
pub mod version;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use boxes::{BoxConfig, BoxFetcher, BoxSource, FileSpec, RecipeScope, Recipes};
pub use error::UnboxError;
pub use recipe::{build_manifest, reconcile, ChoiceProvider, TargetManifest};

#[cfg(feature = "tui")]
pub use tui::{run, UnboxArgs};

/// CLI version - used for box compatibility checking
/// The binary should pass its own version, but this provides a fallback
pub const DEFAULT_CLI_VERSION: &str = "0.2.0";
