//! Isolated test environment with a temporary notes directory.

use std::fs;
use std::path::{Path, PathBuf};

use nook::domain::NoteMeta;
use nook::index::NoteStore;
use tempfile::TempDir;

/// A temporary notes directory that cleans itself up on drop.
pub struct TestEnv {
    _temp_dir: TempDir,
    notes_dir: PathBuf,
}

impl TestEnv {
    /// Creates a fresh empty notes directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let notes_dir = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            notes_dir,
        }
    }

    /// Returns the path to the notes directory.
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Writes a note file with the standard metadata block and given body.
    pub fn add_note(&self, filename: &str, body: &str) -> PathBuf {
        let path = self.notes_dir.join(filename);
        fs::write(&path, nook::infra::serialize(&NoteMeta::default(), body))
            .expect("failed to write test note");
        path
    }

    /// Opens a scanned store over the directory.
    pub fn open(&self) -> NoteStore {
        let mut store = NoteStore::new(&self.notes_dir);
        store.scan().expect("scan failed");
        store
    }

    /// Returns the sorted `.htm` filenames currently on disk.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = fs::read_dir(&self.notes_dir)
            .expect("failed to list notes directory")
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.ends_with(".htm"))
            .collect();
        files.sort();
        files
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
