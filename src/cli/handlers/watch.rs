//! Watch command handler: tail filesystem events for the notes directory.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;

use super::open_store;
use crate::cli::WatchArgs;
use crate::cli::config::Config;
use crate::infra::{
    DirectoryWatcher, FileChangeSubscriber, FileEvent, FileEventKind, Propagation,
};

/// Forwards watcher events to the printing loop on the main thread.
struct ChannelSubscriber {
    tx: mpsc::Sender<FileEvent>,
}

impl FileChangeSubscriber for ChannelSubscriber {
    fn on_file_event(&self, event: &FileEvent) -> Propagation {
        let _ = self.tx.send(event.clone());
        Propagation::Continue
    }
}

pub fn handle_watch(args: &WatchArgs, notes_dir: &Path, config: &Config) -> Result<()> {
    // The scan populates the index before the watcher is armed; incremental
    // events never race the initial population.
    let _store = open_store(notes_dir, config)?;

    let watcher = Arc::new(DirectoryWatcher::new());
    let (tx, rx) = mpsc::channel();
    watcher.subscribe(Arc::new(ChannelSubscriber { tx }));
    watcher
        .set_directory(notes_dir)
        .with_context(|| format!("failed to watch {}", notes_dir.display()))?;

    eprintln!("Watching {} (Ctrl-C to stop)", notes_dir.display());

    let mut seen = 0usize;
    for event in rx {
        let kind = match event.kind {
            FileEventKind::Created => "created",
            FileEventKind::Modified => "modified",
            FileEventKind::Deleted => "deleted",
        };
        let name = event
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| event.path.display().to_string());
        println!("{:9}  {}", kind, name);

        seen += 1;
        if let Some(count) = args.count
            && seen >= count
        {
            break;
        }
    }

    watcher.stop();
    Ok(())
}
