//! Box fetching, configuration, and destination merging
//!
//! This module provides:
//! - Box configuration types (`BoxConfig`, `Recipes`, `RecipeScope`)
//! - Box fetching from remote zip URLs or local directories
//! - Merging a staged box into the destination with collision handling

pub mod config;
pub mod fetcher;
pub mod merge;

pub use config::{load, BoxConfig, FileSpec, Prompt, RecipeScope, Recipes, BOX_CONFIG_FILE};
pub use fetcher::{BoxFetcher, BoxSource, BOX_IGNORE_FILE};
pub use merge::merge;
