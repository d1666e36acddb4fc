//! Walking the recipe decision tree to a leaf
//!
//! Choices come from preset tokens (the CLI's comma-separated option
//! string, pre-split) while they keep matching; the first miss switches
//! the walk to interactive prompting for every remaining depth.

use crate::boxes::config::{FileSpec, Prompt, RecipeScope};
use crate::error::UnboxError;
use anyhow::Result;

/// Resolves a single decision, either by prompting or scripted
///
/// `choose` must return a member of `options`.
pub trait ChoiceProvider {
    fn choose(&mut self, message: &str, options: &[String]) -> Result<String>;
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Message used when the recipe supplies no prompt for a depth
const FALLBACK_MESSAGE: &str = "Select a variant";

/// Walk `scope` to a leaf, consuming `presets` depth by depth
///
/// A preset token is used only while every earlier depth was satisfied by
/// one; after the first invalid or missing token all remaining depths
/// prompt, and later valid-looking tokens are never reused out of order.
/// Extra tokens beyond the tree depth are ignored.
pub fn resolve<'a>(
    scope: &'a RecipeScope,
    prompts: &[Prompt],
    presets: &[String],
    choices: &mut dyn ChoiceProvider,
) -> Result<&'a [FileSpec]> {
    let mut current = scope;
    let mut depth = 0usize;
    let mut using_presets = true;

    loop {
        let children = match current {
            RecipeScope::Leaf(files) => return Ok(files),
            RecipeScope::Branch(children) => children,
        };
        if children.is_empty() {
            return Err(UnboxError::mismatch(
                format!("depth {}", depth),
                "branch has no variants to choose from",
            )
            .into());
        }

        let preset = presets.get(depth).filter(|_| using_presets);
        let selected = match preset {
            Some(token) if children.contains_key(token.as_str()) => token.clone(),
            _ => {
                using_presets = false;
                let message = prompts
                    .get(depth)
                    .map(|p| p.message.as_str())
                    .unwrap_or(FALLBACK_MESSAGE);
                let options: Vec<String> = children.keys().cloned().collect();
                choices.choose(message, &options)?
            }
        };

        current = children.get(selected.as_str()).ok_or_else(|| {
            UnboxError::mismatch(&selected, "choice is not one of the offered variants")
        })?;
        depth += 1;
    }
}
