//! Search command handler.

use anyhow::Result;
use std::path::Path;

use super::open_store;
use crate::cli::SearchArgs;
use crate::cli::config::Config;
use crate::cli::output::{Output, OutputFormat};

pub fn handle_search(args: &SearchArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir, config)?;
    let hits = store.notes_with_text(&args.text);

    match args.format {
        OutputFormat::Human => {
            for key in &hits {
                if let Some(note) = store.get(key) {
                    match store.tree().group_path(note.group()) {
                        Some(group) => println!("{}  [{}]", note.name(), group),
                        None => println!("{}", note.name()),
                    }
                }
            }
            if hits.is_empty() {
                println!("No notes matched '{}'", args.text);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&Output::new(&hits))?)
        }
        OutputFormat::Paths => {
            for key in &hits {
                println!("{}", key);
            }
        }
    }
    Ok(())
}
