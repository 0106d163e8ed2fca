//! New note command handler.

use anyhow::{Context, Result};
use std::path::Path;

use super::open_store;
use crate::cli::NewArgs;
use crate::cli::config::Config;
use crate::cli::output::{Output, OutputFormat};
use crate::domain::NoteName;

pub fn handle_new(args: &NewArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir, config)?;

    let name = NoteName::new(&args.name)
        .with_context(|| format!("invalid note name: '{}'", args.name))?;

    let group = match args.group.as_deref() {
        Some(path) => store
            .tree_mut()
            .ensure_group_path(path)
            .with_context(|| format!("invalid group: '{}'", path))?,
        None => store.tree().not_grouped(),
    };

    let key = store
        .create_note(group, name)
        .with_context(|| "failed to create note")?;

    match args.format {
        OutputFormat::Human => println!("Created {}", key),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&Output::new(&key))?)
        }
        OutputFormat::Paths => println!("{}", notes_dir.join(&key).display()),
    }
    Ok(())
}
