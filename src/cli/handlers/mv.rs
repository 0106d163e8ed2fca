//! Move/rename and delete command handlers.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::Path;

use super::{open_store, require_note};
use crate::cli::config::Config;
use crate::cli::output::{Output, OutputFormat};
use crate::cli::{MvArgs, RmArgs};
use crate::domain::NoteName;

/// Result of a move operation for JSON output.
#[derive(Debug, Serialize)]
pub struct MvResult {
    pub old: String,
    pub new: String,
}

/// Validates the mv command arguments.
///
/// Returns an error if:
/// - No change is specified (no --name, --group, or --ungroup)
/// - Both --group and --ungroup are specified
pub fn validate_mv_args(args: &MvArgs) -> Result<()> {
    if args.name.is_none() && args.group.is_none() && !args.ungroup {
        bail!("at least one of --name, --group, or --ungroup must be specified");
    }
    if args.ungroup && args.group.is_some() {
        bail!("--group and --ungroup are mutually exclusive");
    }
    Ok(())
}

pub fn handle_mv(args: &MvArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    validate_mv_args(args)?;

    let mut store = open_store(notes_dir, config)?;
    let old_key = require_note(&store, &args.note)?;
    let mut key = old_key.clone();

    if let Some(new_name) = &args.name {
        let name = NoteName::new(new_name)
            .with_context(|| format!("invalid note name: '{}'", new_name))?;
        key = store
            .rename_note(&key, name)
            .with_context(|| format!("failed to rename '{}'", key))?;
    }

    if args.ungroup {
        let not_grouped = store.tree().not_grouped();
        key = store
            .move_note(&key, not_grouped)
            .with_context(|| format!("failed to ungroup '{}'", key))?;
    } else if let Some(path) = &args.group {
        let group = store
            .tree_mut()
            .ensure_group_path(path)
            .with_context(|| format!("invalid group: '{}'", path))?;
        key = store
            .move_note(&key, group)
            .with_context(|| format!("failed to move '{}'", key))?;
    }

    match args.format {
        OutputFormat::Human => {
            if key == old_key {
                println!("No changes for {}", key);
            } else {
                println!("{} -> {}", old_key, key);
            }
        }
        OutputFormat::Json => {
            let result = MvResult {
                old: old_key,
                new: key,
            };
            println!("{}", serde_json::to_string_pretty(&Output::new(result))?);
        }
        OutputFormat::Paths => println!("{}", notes_dir.join(&key).display()),
    }
    Ok(())
}

pub fn handle_rm(args: &RmArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir, config)?;
    let key = require_note(&store, &args.note)?;

    store
        .delete_note(&key)
        .with_context(|| format!("failed to delete '{}'", key))?;

    println!("Deleted {}", key);
    Ok(())
}
