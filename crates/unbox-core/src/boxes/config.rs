//! Box configuration types and parsing
//!
//! A box carries its customization metadata in a `box.yaml` at its root.
//! The file is consumed, never produced: a box without one is simply a
//! plain template with no recipe stage.

use crate::error::UnboxError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// Name of the box metadata file at the box root
pub const BOX_CONFIG_FILE: &str = "box.yaml";

/// Top-level box configuration (`box.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxConfig {
    /// Display name of the box
    #[serde(default)]
    pub name: Option<String>,

    /// Description of what the box provides
    #[serde(default)]
    pub description: Option<String>,

    /// Minimum CLI version this box expects (semver)
    #[serde(default)]
    pub version: Option<String>,

    /// Branching customization recipe (optional)
    #[serde(default)]
    pub recipes: Option<Recipes>,

    /// Literal relative paths removed from the extracted box before any
    /// merge or recipe logic runs, in addition to the metadata files
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// The recipe section: a decision tree plus files shared by every variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipes {
    /// Nested decision tree of named variants
    pub specs: RecipeScope,

    /// Files appended to whichever leaf is reached
    #[serde(default)]
    pub common: Vec<FileSpec>,

    /// Prompt messages, one per tree depth
    #[serde(default)]
    pub prompts: Vec<Prompt>,
}

/// Prompt metadata for one depth of the decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub message: String,
}

/// A node of the recipe decision tree
///
/// A mapping is a branch (choice label to sub-scope), a sequence is a leaf
/// (the file list of one fully-resolved variant). Modeled as an explicit
/// variant so malformed recipes fail at parse time, not mid-walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipeScope {
    Branch(BTreeMap<String, RecipeScope>),
    Leaf(Vec<FileSpec>),
}

impl RecipeScope {
    /// True when the scope defines nothing to resolve; the recipe stage
    /// is skipped entirely for an empty scope
    pub fn is_empty(&self) -> bool {
        match self {
            RecipeScope::Branch(children) => children.is_empty(),
            RecipeScope::Leaf(files) => files.is_empty(),
        }
    }
}

/// One entry of a variant's file list: keep a path, or move it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileSpec {
    Move { from: String, to: String },
    Path(String),
}

/// Load `box.yaml` from an extracted box directory
///
/// An absent file is `Ok(None)`; a present but malformed or invalid file
/// is an error.
pub fn load(dir: &Path) -> Result<Option<BoxConfig>> {
    let path = dir.join(BOX_CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let config: BoxConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.validate()?;
    Ok(Some(config))
}

impl BoxConfig {
    /// Validate every path the configuration mentions
    ///
    /// All paths must stay inside the destination root: relative, and
    /// without `..` components.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.ignore {
            ensure_inside_destination(entry)?;
        }
        if let Some(recipes) = &self.recipes {
            validate_scope(&recipes.specs)?;
            for spec in &recipes.common {
                validate_spec(spec)?;
            }
        }
        Ok(())
    }
}

fn validate_scope(scope: &RecipeScope) -> Result<()> {
    match scope {
        RecipeScope::Branch(children) => {
            for child in children.values() {
                validate_scope(child)?;
            }
        }
        RecipeScope::Leaf(files) => {
            for spec in files {
                validate_spec(spec)?;
            }
        }
    }
    Ok(())
}

fn validate_spec(spec: &FileSpec) -> Result<()> {
    match spec {
        FileSpec::Path(path) => ensure_inside_destination(path),
        FileSpec::Move { from, to } => {
            ensure_inside_destination(from)?;
            ensure_inside_destination(to)
        }
    }
}

/// Reject paths that could leave the destination root
fn ensure_inside_destination(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(UnboxError::mismatch(path, "empty path").into());
    }
    for component in Path::new(path).components() {
        match component {
            Component::RootDir | Component::Prefix(_) => {
                return Err(UnboxError::mismatch(path, "absolute paths are not allowed").into());
            }
            Component::ParentDir => {
                return Err(UnboxError::mismatch(path, "path escapes the destination").into());
            }
            Component::Normal(_) | Component::CurDir => {}
        }
    }
    Ok(())
}
