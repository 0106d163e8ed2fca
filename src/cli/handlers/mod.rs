//! Command handlers.

mod groups;
mod list;
mod mv;
mod new;
mod search;
mod show_edit;
mod tags;
mod watch;

pub use groups::{handle_group, handle_groups};
pub use list::handle_list;
pub use mv::{handle_mv, handle_rm};
pub use new::handle_new;
pub use search::handle_search;
pub use show_edit::{handle_edit, handle_show};
pub use tags::{handle_tag, handle_tags, handle_untag};
pub use watch::handle_watch;

use anyhow::{Context, Result, bail};
use std::path::Path;

use crate::cli::config::Config;
use crate::domain::TagId;
use crate::index::NoteStore;

/// Opens and scans the store for a command invocation.
pub(crate) fn open_store(notes_dir: &Path, config: &Config) -> Result<NoteStore> {
    let mut store = NoteStore::new(notes_dir);
    store.set_author(config.author());
    let report = store.scan().with_context(|| {
        format!(
            "failed to scan notes directory: {}",
            notes_dir.display()
        )
    })?;
    for issue in &report.issues {
        eprintln!("warning: skipped {}: {}", issue.filename, issue.message);
    }
    Ok(store)
}

/// Result of resolving a user-supplied note identifier.
pub(crate) enum ResolveResult {
    Unique(String),
    Ambiguous(Vec<String>),
    NotFound,
}

/// Resolves an identifier that may be a full filename or a bare note name.
pub(crate) fn resolve_note(store: &NoteStore, ident: &str) -> ResolveResult {
    if store.get(ident).is_some() {
        return ResolveResult::Unique(ident.to_string());
    }
    let mut matches = store.find_by_name(ident);
    match matches.len() {
        0 => ResolveResult::NotFound,
        1 => ResolveResult::Unique(matches.remove(0)),
        _ => ResolveResult::Ambiguous(matches),
    }
}

/// Resolves to a unique note key or fails with a helpful message.
pub(crate) fn require_note(store: &NoteStore, ident: &str) -> Result<String> {
    match resolve_note(store, ident) {
        ResolveResult::Unique(key) => Ok(key),
        ResolveResult::Ambiguous(keys) => {
            eprintln!("'{}' matches more than one note:", ident);
            for key in keys {
                eprintln!("  {}", key);
            }
            bail!("ambiguous note identifier; use the full filename");
        }
        ResolveResult::NotFound => bail!("note not found: '{}'", ident),
    }
}

/// Resolves a group path argument to a tag id.
pub(crate) fn require_group(store: &NoteStore, path: &str) -> Result<TagId> {
    store
        .tree()
        .group_at_path(path)
        .ok_or_else(|| anyhow::anyhow!("group not found: '{}'", path))
}
