//! Tag listing and tagging command handlers.

use anyhow::{Context, Result};
use std::path::Path;

use super::{open_store, require_note};
use crate::cli::config::Config;
use crate::cli::output::{Output, OutputFormat, TagListing};
use crate::cli::{TagArgs, TagsArgs, UntagArgs};
use crate::domain::TagName;

pub fn handle_tags(args: &TagsArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let store = open_store(notes_dir, config)?;

    let listings: Vec<TagListing> = store
        .tree()
        .labels()
        .into_iter()
        .filter_map(|id| {
            let node = store.tree().node(id)?;
            Some(TagListing {
                name: node.name().as_str().to_string(),
                count: node.note_count(),
            })
        })
        .collect();

    match args.format {
        OutputFormat::Human => {
            for listing in &listings {
                println!("{:5}  {}", listing.count, listing.name);
            }
            if listings.is_empty() {
                println!("No tags");
            }
        }
        OutputFormat::Json | OutputFormat::Paths => {
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?)
        }
    }
    Ok(())
}

pub fn handle_tag(args: &TagArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir, config)?;
    let key = require_note(&store, &args.note)?;
    let tag = TagName::new(&args.tag).with_context(|| format!("invalid tag: '{}'", args.tag))?;

    store
        .tag_note(&key, tag)
        .with_context(|| format!("failed to tag '{}'", key))?;
    println!("Tagged {} with {}", key, args.tag);
    Ok(())
}

pub fn handle_untag(args: &UntagArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir, config)?;
    let key = require_note(&store, &args.note)?;
    let tag = TagName::new(&args.tag).with_context(|| format!("invalid tag: '{}'", args.tag))?;

    store
        .untag_note(&key, &tag)
        .with_context(|| format!("failed to untag '{}'", key))?;
    println!("Removed {} from {}", args.tag, key);
    Ok(())
}
