//! Charm-style CLI pipeline using cliclack
//!
//! Drives the whole unbox run: fetch into a staging directory, merge into
//! the destination, then resolve and apply the recipe. A cancelled prompt
//! aborts the run; completed phases stay on disk as-is.

use crate::boxes::{self, config, BoxFetcher, BoxSource, Recipes};
use crate::recipe::{build_manifest, navigator, reconcile, ChoiceProvider};
use crate::version;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// CLI arguments for an unbox run
#[derive(Debug, Clone)]
pub struct UnboxArgs {
    /// Box source: local directory or http(s) zip URL
    pub source: String,

    /// Destination directory to unpack into
    pub directory: Option<PathBuf>,

    /// Comma-separated recipe option tokens
    pub options: Option<String>,

    /// Overwrite colliding entries without asking
    pub force: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the CLI with interactive prompts
pub async fn run(args: UnboxArgs, cli_version: &str) -> Result<()> {
    cliclack::intro("unbox")?;

    // Step 1: Resolve the destination
    let dest = select_directory(&args)?;

    // Step 2: Fetch the box into a staging directory
    let source = BoxSource::parse(&args.source);
    let staging = tempfile::tempdir().context("Failed to create staging directory")?;
    fetch_box(&source, staging.path()).await?;

    // Step 3: Load box metadata, if any
    let box_config = config::load(staging.path())?;

    if let Some(cfg) = &box_config {
        if let Some(min_version) = &cfg.version {
            if let Some(warning) = version::check_compatibility(cli_version, min_version) {
                cliclack::log::warning(format!(
                    "Version warning: {}",
                    warning.lines().next().unwrap_or(&warning)
                ))?;
            }
        }
        if let Some(name) = &cfg.name {
            let description = cfg.description.as_deref().unwrap_or("");
            cliclack::log::info(format!("Box: {} {}", name, description))?;
        }

        // Step 4: Strip metadata and ignored files before the merge
        strip_metadata(staging.path(), cfg)?;
    }

    // Step 5: Merge the staged box into the destination
    merge_into_destination(staging.path(), &dest, &args)?;

    // Step 6: Resolve and apply the recipe, if the box carries one
    if let Some(recipes) = box_config.as_ref().and_then(|c| c.recipes.as_ref()) {
        apply_recipes(recipes, &dest, &args)?;
    }

    // Step 7: Show next steps
    print_next_steps(&dest)?;

    Ok(())
}

fn select_directory(args: &UnboxArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let path = if let Some(dir) = &args.directory {
        let p = if dir.is_absolute() {
            dir.clone()
        } else {
            current_dir.join(dir)
        };
        cliclack::log::info(format!("Unpacking into {}", p.display()))?;
        p
    } else if args.yes {
        current_dir
    } else {
        let input: String = cliclack::input("Destination directory")
            .placeholder(".")
            .default_input(".")
            .interact()?;

        if input.is_empty() || input == "." {
            current_dir
        } else {
            let p = PathBuf::from(&input);
            if p.is_absolute() {
                p
            } else {
                current_dir.join(p)
            }
        }
    };

    // Validate parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() && parent != Path::new("") {
            anyhow::bail!("Parent directory does not exist: {}", parent.display());
        }
    }

    Ok(path)
}

async fn fetch_box(source: &BoxSource, staging: &Path) -> Result<()> {
    let spinner = cliclack::spinner();
    spinner.start(format!("Fetching {}...", source));

    match BoxFetcher::new(source.clone()).fetch(staging).await {
        Ok(()) => {
            spinner.stop("Box fetched");
            Ok(())
        }
        Err(e) => {
            spinner.stop("Fetch failed");
            Err(e)
        }
    }
}

/// Remove `box.yaml` and every `ignore`-listed path from the staged tree
fn strip_metadata(staging: &Path, cfg: &boxes::BoxConfig) -> Result<()> {
    let metadata = staging.join(config::BOX_CONFIG_FILE);
    std::fs::remove_file(&metadata)
        .with_context(|| format!("Failed to remove {}", metadata.display()))?;

    for entry in &cfg.ignore {
        let path = staging.join(entry);
        if path.is_dir() {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        } else if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }

    Ok(())
}

fn merge_into_destination(staging: &Path, dest: &Path, args: &UnboxArgs) -> Result<()> {
    let mut choices = CliChoices { assume_yes: args.yes };
    let mut confirm = |name: &str| -> Result<bool> {
        choices.confirm(&format!("'{}' already exists. Overwrite?", name))
    };

    boxes::merge(staging, dest, args.force, &mut confirm)
}

fn apply_recipes(recipes: &Recipes, dest: &Path, args: &UnboxArgs) -> Result<()> {
    if recipes.specs.is_empty() {
        return Ok(());
    }

    let presets = args
        .options
        .as_deref()
        .map(split_options)
        .unwrap_or_default();

    let mut choices = CliChoices { assume_yes: args.yes };
    let leaf = navigator::resolve(&recipes.specs, &recipes.prompts, &presets, &mut choices)?;
    let manifest = build_manifest(leaf, &recipes.common);
    let summary = reconcile(dest, &manifest)?;

    cliclack::log::success(format!(
        "Variant applied: {} file(s) pruned, {} move(s), {} empty dir(s) removed",
        summary.pruned_files, summary.applied_moves, summary.removed_dirs
    ))?;

    Ok(())
}

/// Split the CLI's comma-separated option string into preset tokens
pub fn split_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// [`ChoiceProvider`] backed by cliclack prompts
///
/// `assume_yes` answers every yes/no question affirmatively; variant
/// choices have no default and always prompt.
struct CliChoices {
    assume_yes: bool,
}

impl ChoiceProvider for CliChoices {
    fn choose(&mut self, message: &str, options: &[String]) -> Result<String> {
        let mut select = cliclack::select(message);
        for option in options {
            select = select.item(option.clone(), option, "");
        }
        Ok(select.interact()?)
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        Ok(cliclack::confirm(message).initial_value(false).interact()?)
    }
}

fn print_next_steps(dest: &Path) -> Result<()> {
    let current = std::env::current_dir().ok();

    println!();
    println!("  Next steps");
    println!();

    let mut step = 1;
    if current.as_deref() != Some(dest) {
        println!("  {}.  cd {}", step, dest.display());
        step += 1;
    }
    println!("  {}.  Open README.md to get started", step);

    cliclack::outro("Box unpacked!")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_options() {
        assert_eq!(split_options("ts,esm"), vec!["ts", "esm"]);
        assert_eq!(split_options(" ts , esm "), vec!["ts", "esm"]);
        assert_eq!(split_options("ts,,esm,"), vec!["ts", "esm"]);
        assert!(split_options("").is_empty());
    }

    #[test]
    fn test_strip_metadata_removes_config_and_ignored() {
        let staging = tempfile::tempdir().unwrap();
        std::fs::write(
            staging.path().join(config::BOX_CONFIG_FILE),
            "ignore:\n  - scripts\n  - notes.md\n",
        )
        .unwrap();
        std::fs::create_dir(staging.path().join("scripts")).unwrap();
        std::fs::write(staging.path().join("scripts/dev.sh"), "#!/bin/sh").unwrap();
        std::fs::write(staging.path().join("notes.md"), "notes").unwrap();
        std::fs::write(staging.path().join("keep.txt"), "keep").unwrap();

        let cfg = config::load(staging.path()).unwrap().unwrap();
        strip_metadata(staging.path(), &cfg).unwrap();

        assert!(!staging.path().join(config::BOX_CONFIG_FILE).exists());
        assert!(!staging.path().join("scripts").exists());
        assert!(!staging.path().join("notes.md").exists());
        assert!(staging.path().join("keep.txt").is_file());
    }

    #[test]
    fn test_strip_metadata_tolerates_missing_ignore_entries() {
        let staging = tempfile::tempdir().unwrap();
        std::fs::write(
            staging.path().join(config::BOX_CONFIG_FILE),
            "ignore:\n  - never-created.txt\n",
        )
        .unwrap();

        let cfg = config::load(staging.path()).unwrap().unwrap();
        strip_metadata(staging.path(), &cfg).unwrap();
    }
}
