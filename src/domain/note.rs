//! Note entity and its content state machine.

use chrono::{DateTime, Utc};

use crate::domain::{NoteMeta, NoteName, TagId};
use crate::infra::ContentHash;

/// Body content of a note, tracked as an explicit state machine.
///
/// Reading from disk is the only transition out of `Unloaded`; editing
/// produces `Dirty`; a successful save produces `Saved`. `Loaded` and
/// `Saved` both mean "clean", but callers can tell a freshly-read note from
/// one written this session.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteContent {
    /// Never read; the file on disk is the only copy.
    Unloaded,
    /// Read from disk and unchanged since.
    Loaded(String),
    /// Edited in memory; diverges from the file until saved.
    Dirty(String),
    /// Written to disk this session and unchanged since.
    Saved(String),
}

impl NoteContent {
    /// Returns the in-memory text, if any has been loaded.
    pub fn text(&self) -> Option<&str> {
        match self {
            NoteContent::Unloaded => None,
            NoteContent::Loaded(s) | NoteContent::Dirty(s) | NoteContent::Saved(s) => Some(s),
        }
    }

    /// Returns whether the in-memory text diverges from the file.
    pub fn is_dirty(&self) -> bool {
        matches!(self, NoteContent::Dirty(_))
    }

    /// Returns whether the content has been loaded at all.
    pub fn is_loaded(&self) -> bool {
        !matches!(self, NoteContent::Unloaded)
    }
}

/// A single note backed by one `.htm` file.
///
/// Identity is the `(group, name)` pair the filename encodes; two notes are
/// equal exactly when they resolve to the same filename. Everything else
/// (timestamps, content state, metadata) is mutable payload.
#[derive(Debug, Clone)]
pub struct Note {
    name: NoteName,
    group: TagId,
    modified: DateTime<Utc>,
    content: NoteContent,
    meta: NoteMeta,
    hash: Option<ContentHash>,
}

impl Note {
    /// Creates a note record with unloaded content and default metadata.
    pub fn new(name: NoteName, group: TagId, modified: DateTime<Utc>) -> Self {
        Self {
            name,
            group,
            modified,
            content: NoteContent::Unloaded,
            meta: NoteMeta::default(),
            hash: None,
        }
    }

    /// Returns the note's name.
    pub fn name(&self) -> &NoteName {
        &self.name
    }

    /// Returns the id of the note's owning group.
    pub fn group(&self) -> TagId {
        self.group
    }

    /// Returns when the backing file was last modified.
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// Returns the content state.
    pub fn content(&self) -> &NoteContent {
        &self.content
    }

    /// Returns the parsed metadata.
    pub fn meta(&self) -> &NoteMeta {
        &self.meta
    }

    /// Returns the hash of the file bytes at last read or save, if known.
    pub fn hash(&self) -> Option<&ContentHash> {
        self.hash.as_ref()
    }

    /// Returns whether the note has edits not yet written to disk.
    pub fn has_unsaved_changes(&self) -> bool {
        self.content.is_dirty()
    }

    /// Replaces the in-memory text, moving to `Dirty`.
    ///
    /// Only legal once content has been loaded; editing an `Unloaded` note
    /// would silently discard whatever is on disk.
    pub fn edit(&mut self, text: String) -> Result<(), NotLoaded> {
        if !self.content.is_loaded() {
            return Err(NotLoaded);
        }
        self.content = NoteContent::Dirty(text);
        Ok(())
    }

    pub(crate) fn set_name(&mut self, name: NoteName) {
        self.name = name;
    }

    pub(crate) fn set_group(&mut self, group: TagId) {
        self.group = group;
    }

    pub(crate) fn set_modified(&mut self, modified: DateTime<Utc>) {
        self.modified = modified;
    }

    pub(crate) fn set_meta(&mut self, meta: NoteMeta) {
        self.meta = meta;
    }

    pub(crate) fn meta_mut(&mut self) -> &mut NoteMeta {
        &mut self.meta
    }

    pub(crate) fn set_hash(&mut self, hash: Option<ContentHash>) {
        self.hash = hash;
    }

    pub(crate) fn mark_loaded(&mut self, text: String, hash: ContentHash) {
        self.content = NoteContent::Loaded(text);
        self.hash = Some(hash);
    }

    pub(crate) fn mark_saved(&mut self, text: String, hash: ContentHash) {
        self.content = NoteContent::Saved(text);
        self.hash = Some(hash);
    }
}

/// Error returned when editing a note whose content was never read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotLoaded;

impl std::fmt::Display for NotLoaded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "note content has not been read yet")
    }
}

impl std::error::Error for NotLoaded {}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group && self.name == other.name
    }
}

impl Eq for Note {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TagName, TagTree};
    use pretty_assertions::assert_eq;

    fn test_datetime() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn test_note(name: &str) -> Note {
        let tree = TagTree::new();
        Note::new(
            NoteName::new(name).unwrap(),
            tree.not_grouped(),
            test_datetime(),
        )
    }

    // ===========================================
    // Phase 1: Content state machine
    // ===========================================

    #[test]
    fn new_note_starts_unloaded() {
        let note = test_note("a");
        assert_eq!(*note.content(), NoteContent::Unloaded);
        assert!(!note.has_unsaved_changes());
        assert!(note.content().text().is_none());
    }

    #[test]
    fn mark_loaded_transitions_to_loaded() {
        let mut note = test_note("a");
        note.mark_loaded("body".to_string(), ContentHash::compute(b"body"));

        assert!(note.content().is_loaded());
        assert!(!note.content().is_dirty());
        assert_eq!(note.content().text(), Some("body"));
        assert!(note.hash().is_some());
    }

    #[test]
    fn edit_unloaded_note_is_rejected() {
        let mut note = test_note("a");
        assert_eq!(note.edit("text".to_string()), Err(NotLoaded));
        assert_eq!(*note.content(), NoteContent::Unloaded);
    }

    #[test]
    fn edit_loaded_note_becomes_dirty() {
        let mut note = test_note("a");
        note.mark_loaded("old".to_string(), ContentHash::compute(b"old"));
        note.edit("new".to_string()).unwrap();

        assert!(note.has_unsaved_changes());
        assert_eq!(note.content().text(), Some("new"));
    }

    #[test]
    fn save_clears_dirty_flag() {
        let mut note = test_note("a");
        note.mark_loaded("old".to_string(), ContentHash::compute(b"old"));
        note.edit("new".to_string()).unwrap();
        note.mark_saved("new".to_string(), ContentHash::compute(b"new"));

        assert!(!note.has_unsaved_changes());
        assert_eq!(*note.content(), NoteContent::Saved("new".to_string()));
    }

    #[test]
    fn edit_after_save_is_legal() {
        let mut note = test_note("a");
        note.mark_saved("v1".to_string(), ContentHash::compute(b"v1"));
        note.edit("v2".to_string()).unwrap();
        assert!(note.has_unsaved_changes());
    }

    // ===========================================
    // Phase 2: Identity
    // ===========================================

    #[test]
    fn equality_compares_group_and_name_only() {
        let mut a = test_note("same");
        let b = test_note("same");
        a.mark_loaded("different payload".to_string(), ContentHash::compute(b"x"));

        assert_eq!(a, b);
    }

    #[test]
    fn equality_fails_on_different_name() {
        assert_ne!(test_note("a"), test_note("b"));
    }

    #[test]
    fn equality_fails_on_different_group() {
        let mut tree = TagTree::new();
        let work = tree
            .create(
                tree.root(),
                TagName::new("work").unwrap(),
                crate::domain::TagKind::Group,
            )
            .unwrap();

        let a = Note::new(NoteName::new("x").unwrap(), work, test_datetime());
        let b = Note::new(NoteName::new("x").unwrap(), tree.not_grouped(), test_datetime());
        assert_ne!(a, b);
    }
}
