//! Show and edit command handlers.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

use super::{open_store, require_note};
use crate::cli::config::Config;
use crate::cli::{EditArgs, ShowArgs};

pub fn handle_show(args: &ShowArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(notes_dir, config)?;
    let key = require_note(&store, &args.note)?;

    let body = store
        .read_note(&key)
        .with_context(|| format!("failed to read '{}'", key))?;
    println!("{}", body);
    Ok(())
}

pub fn handle_edit(args: &EditArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    let store = open_store(notes_dir, config)?;
    let key = require_note(&store, &args.note)?;
    let path = notes_dir.join(&key);

    let editor = config.editor();
    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("failed to launch editor: {}", editor))?;

    if !status.success() {
        bail!("editor exited with {}", status);
    }
    Ok(())
}
