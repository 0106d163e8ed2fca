//! Group listing and management command handlers.

use anyhow::{Context, Result};
use std::path::Path;

use super::{open_store, require_group};
use crate::cli::config::Config;
use crate::cli::output::{GroupListing, Output, OutputFormat};
use crate::cli::{GroupCommand, GroupsArgs};
use crate::domain::TagName;
use crate::index::engine;
use crate::index::GroupRenameOutcome;

pub fn handle_groups(args: &GroupsArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let store = open_store(notes_dir, config)?;

    let mut listings: Vec<GroupListing> = store
        .tree()
        .groups()
        .into_iter()
        .map(|(id, path)| GroupListing {
            count: store.tree().node(id).map(|n| n.note_count()).unwrap_or(0),
            path,
        })
        .collect();
    listings.push(GroupListing {
        path: crate::domain::tag_name::NOT_GROUPED.to_string(),
        count: store
            .tree()
            .node(store.tree().not_grouped())
            .map(|n| n.note_count())
            .unwrap_or(0),
    });

    match args.format {
        OutputFormat::Human => {
            for listing in &listings {
                println!("{:5}  {}", listing.count, listing.path);
            }
        }
        OutputFormat::Json | OutputFormat::Paths => {
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?)
        }
    }
    Ok(())
}

pub fn handle_group(command: &GroupCommand, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir, config)?;

    match command {
        GroupCommand::New(args) => {
            store
                .tree_mut()
                .ensure_group_path(&args.path)
                .with_context(|| format!("invalid group: '{}'", args.path))?;
            println!("Created group {}", args.path);
        }
        GroupCommand::Rename(args) => {
            let group = require_group(&store, &args.group)?;
            let new_name = TagName::new(&args.new_name)
                .with_context(|| format!("invalid group name: '{}'", args.new_name))?;

            let outcome = engine::rename_tag(&mut store, group, new_name)
                .with_context(|| format!("failed to rename group '{}'", args.group))?;

            match outcome {
                GroupRenameOutcome::Renamed { files } => {
                    println!(
                        "Renamed {} to {} ({} file{} moved)",
                        args.group,
                        args.new_name,
                        files,
                        if files == 1 { "" } else { "s" }
                    );
                }
                GroupRenameOutcome::Merged { files, .. } => {
                    println!(
                        "Merged {} into {} ({} file{} moved)",
                        args.group,
                        args.new_name,
                        files,
                        if files == 1 { "" } else { "s" }
                    );
                }
            }
        }
        GroupCommand::Rm(args) => {
            let group = require_group(&store, &args.group)?;
            engine::delete_tag(&mut store, group)
                .with_context(|| format!("failed to delete group '{}'", args.group))?;
            println!("Deleted group {} (notes kept)", args.group);
        }
    }
    Ok(())
}
