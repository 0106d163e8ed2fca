//! List command handler.

use anyhow::{Context, Result};
use std::path::Path;

use super::{open_store, require_group};
use crate::cli::ListArgs;
use crate::cli::config::Config;
use crate::cli::output::{NoteListing, Output, OutputFormat};
use crate::domain::{TagMatch, TagName};
use crate::index::NoteStore;

pub fn handle_list(args: &ListArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let store = open_store(notes_dir, config)?;

    let group_filter = match args.group.as_deref() {
        Some("-") => Some(store.tree().not_grouped()),
        Some(path) => Some(require_group(&store, path)?),
        None => None,
    };

    let mut keys: Vec<String> = store
        .notes()
        .filter(|(_, note)| match group_filter {
            Some(filter) => store.tree().matches_filter(
                note.group(),
                filter,
                TagMatch::Identity,
                !args.exact,
            ),
            None => true,
        })
        .filter(|(_, note)| {
            // Archived notes are hidden unless asked for, or unless the
            // filter itself points into the archive.
            args.include_archived
                || group_filter.is_some_and(|f| store.tree().is_archived(f))
                || !store.tree().is_archived(note.group())
        })
        .map(|(key, _)| key.to_string())
        .collect();

    for tag_str in &args.tags {
        let tag = TagName::new(tag_str).with_context(|| format!("invalid tag: {}", tag_str))?;
        let label = store.tree().child_named(store.tree().root(), &tag);
        keys.retain(|key| {
            label.is_some_and(|id| {
                store
                    .tree()
                    .node(id)
                    .is_some_and(|node| node.has_note(key))
            })
        });
    }

    print_listing(&store, &keys, args.format)
}

fn print_listing(store: &NoteStore, keys: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for key in keys {
                let note = store.get(key).expect("listed key exists");
                match store.tree().group_path(note.group()) {
                    Some(group) => println!("{}  [{}]", note.name(), group),
                    None => println!("{}", note.name()),
                }
            }
            if keys.is_empty() {
                println!("No notes found");
            }
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = keys
                .iter()
                .map(|key| {
                    let note = store.get(key).expect("listed key exists");
                    NoteListing {
                        filename: key.clone(),
                        name: note.name().as_str().to_string(),
                        group: store.tree().group_path(note.group()),
                        modified: note.modified().to_rfc3339(),
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?);
        }
        OutputFormat::Paths => {
            for key in keys {
                println!("{}", key);
            }
        }
    }
    Ok(())
}
