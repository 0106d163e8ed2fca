//! File I/O, the note document format, content hashing, and the watcher.

mod content_hash;
mod document;
mod fs;
mod watcher;

pub use content_hash::ContentHash;
pub use document::{parse, serialize, DocumentError, ParsedDocument};
pub use fs::{
    modified_at, read_to_string, scan_notes_directory, write_atomic, FsError,
};
pub use watcher::{
    DirectoryWatcher, FileChangeSubscriber, FileEvent, FileEventKind, Propagation, SuppressGuard,
    WatchError,
};
