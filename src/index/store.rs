//! The file-backed note index.
//!
//! `NoteStore` is the sole authority for translating between in-memory
//! `(group, name)` note identities and on-disk filenames, and for every
//! filesystem mutation under the notes directory. It keeps three things in
//! agreement: the flat directory of `.htm` files, the filename-keyed note
//! map, and the tag tree's linked-note sets.
//!
//! All mutating calls must come from one control thread. Each one brackets
//! its filesystem writes with a watcher suppression guard so subscribers
//! never see the echo of the index's own changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use regex::RegexBuilder;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{Note, NoteMeta, NoteName, TagId, TagKind, TagName, TagTree, TreeError};
use crate::index::filename::{self, rebase_group_path};
use crate::infra::{self, ContentHash, DirectoryWatcher, FsError};

/// Errors from index operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A create would overwrite an existing file.
    #[error("note file already exists: {filename}")]
    AlreadyExists { filename: String },

    /// A rename or move destination is already taken.
    #[error("destination filename already exists: {filename}")]
    NameCollision { filename: String },

    /// The operation referenced a note or group the index doesn't know.
    #[error("not in the index: {what}")]
    NotFound { what: String },

    /// The underlying filesystem operation failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tag tree constraint blocked the operation.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result type for index operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    fn from_fs(err: FsError) -> Self {
        match err {
            FsError::Io { path, source } | FsError::AtomicWrite { path, source } => {
                StoreError::Io { path, source }
            }
            other => {
                let kind = match &other {
                    FsError::NotFound { .. } => std::io::ErrorKind::NotFound,
                    FsError::PermissionDenied { .. } => std::io::ErrorKind::PermissionDenied,
                    _ => std::io::ErrorKind::Other,
                };
                let path = other.path().to_path_buf();
                StoreError::Io {
                    path,
                    source: std::io::Error::new(kind, other.to_string()),
                }
            }
        }
    }
}

/// One file the directory scan could not index.
#[derive(Debug, Clone)]
pub struct ScanIssue {
    pub filename: String,
    pub message: String,
}

/// Result of a full directory scan.
#[derive(Debug)]
pub struct ScanReport {
    /// Number of notes successfully indexed.
    pub indexed: usize,
    /// Files that were skipped, with the reason.
    pub issues: Vec<ScanIssue>,
}

/// How a group rename resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRenameOutcome {
    /// The group kept its node and got a new name.
    Renamed { files: usize },
    /// The destination name already existed; that group absorbed this one.
    Merged { into: TagId, files: usize },
}

/// The file-backed index for one notes directory.
///
/// Constructed empty; [`scan`](NoteStore::scan) populates it. One instance
/// per active directory — switching directories means building a new store
/// (and re-pointing the watcher) rather than mutating this one in place.
pub struct NoteStore {
    notes_dir: PathBuf,
    /// Keys in scan/insertion order.
    order: Vec<String>,
    notes: HashMap<String, Note>,
    tree: TagTree,
    watcher: Option<Arc<DirectoryWatcher>>,
    author: Option<String>,
}

impl NoteStore {
    /// Creates an empty store bound to a notes directory.
    pub fn new(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            order: Vec::new(),
            notes: HashMap::new(),
            tree: TagTree::new(),
            watcher: None,
            author: None,
        }
    }

    /// Returns the notes directory.
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Sets the author recorded in version history on save.
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = Some(author.into());
    }

    /// Attaches the watcher whose delivery the store suppresses while it
    /// performs its own writes. The caller arms the watcher (after the
    /// initial scan) and owns the subscription list.
    pub fn attach_watcher(&mut self, watcher: Arc<DirectoryWatcher>) {
        self.watcher = Some(watcher);
    }

    /// Returns the attached watcher, if any.
    pub fn watcher(&self) -> Option<&Arc<DirectoryWatcher>> {
        self.watcher.as_ref()
    }

    /// Returns the tag tree.
    pub fn tree(&self) -> &TagTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut TagTree {
        &mut self.tree
    }

    /// Returns the note for a filename key.
    pub fn get(&self, key: &str) -> Option<&Note> {
        self.notes.get(key)
    }

    /// Returns `(key, note)` pairs in scan order.
    pub fn notes(&self) -> impl Iterator<Item = (&str, &Note)> {
        self.order
            .iter()
            .filter_map(|k| self.notes.get(k).map(|n| (k.as_str(), n)))
    }

    /// Returns the number of indexed notes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the keys of every note whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Vec<String> {
        self.notes()
            .filter(|(_, n)| n.name().as_str() == name)
            .map(|(k, _)| k.to_string())
            .collect()
    }

    /// Returns the keys of notes eligible as cross-note link targets:
    /// everything outside the archive subtree.
    pub fn linkable_notes(&self) -> Vec<String> {
        self.notes()
            .filter(|(_, n)| !self.tree.is_archived(n.group()))
            .map(|(k, _)| k.to_string())
            .collect()
    }

    fn encoded(&self, group: TagId, name: &NoteName) -> String {
        filename::encode(self.tree.group_path(group).as_deref(), name)
    }

    /// Checks that `group` can own notes: a real group node or the
    /// ungrouped bucket.
    fn require_note_target(&self, group: TagId) -> StoreResult<()> {
        if group == self.tree.not_grouped() || self.tree.group_path(group).is_some() {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                what: "group".to_string(),
            })
        }
    }

    // ===========================================
    // Scan
    // ===========================================

    /// Rebuilds the index from the directory.
    ///
    /// Existing note entries and every tag's linked-note set are discarded
    /// and rebuilt; user-created tags survive as empty nodes. Must complete
    /// before the watcher is armed for this directory so incremental events
    /// never race the initial population.
    ///
    /// Files that cannot be decoded or read are logged, reported in the
    /// [`ScanReport`], and skipped — one bad file never aborts the scan.
    pub fn scan(&mut self) -> StoreResult<ScanReport> {
        let filenames: Vec<String> = infra::scan_notes_directory(&self.notes_dir)
            .map_err(StoreError::from_fs)?
            .collect();

        self.order.clear();
        self.notes.clear();
        self.tree.clear_note_links();

        let mut indexed = 0;
        let mut issues = Vec::new();

        for fname in filenames {
            match self.index_file(&fname) {
                Ok(()) => indexed += 1,
                Err(message) => {
                    warn!(file = %fname, %message, "skipping file during scan");
                    issues.push(ScanIssue {
                        filename: fname,
                        message,
                    });
                }
            }
        }

        info!(
            dir = %self.notes_dir.display(),
            indexed,
            skipped = issues.len(),
            "directory scan complete"
        );
        Ok(ScanReport { indexed, issues })
    }

    fn index_file(&mut self, fname: &str) -> Result<(), String> {
        let decoded = filename::decode(fname);
        let name = NoteName::new(&decoded.name).map_err(|e| e.to_string())?;

        let group = match &decoded.group_path {
            Some(path) => self
                .tree
                .ensure_group_path(path)
                .map_err(|e| e.to_string())?,
            None => self.tree.not_grouped(),
        };

        let path = self.notes_dir.join(fname);
        let modified = infra::modified_at(&path).map_err(|e| e.to_string())?;
        let (content, bytes) = infra::read_to_string(&path).map_err(|e| e.to_string())?;
        let parsed = infra::parse(&content).map_err(|e| e.to_string())?;

        let mut note = Note::new(name, group, modified);
        note.set_hash(Some(ContentHash::compute(&bytes)));

        self.tree.link_note(group, fname);
        let all = self.tree.all();
        self.tree.link_note(all, fname);
        for tag in &parsed.meta.tags {
            match self.tree.find_or_create_label(tag) {
                Ok(id) => self.tree.link_note(id, fname),
                // A tag colliding with a group name is dropped, not fatal.
                Err(e) => debug!(file = %fname, tag = %tag, error = %e, "tag not linked"),
            }
        }
        note.set_meta(parsed.meta);

        self.order.push(fname.to_string());
        self.notes.insert(fname.to_string(), note);
        Ok(())
    }

    // ===========================================
    // Single-note operations
    // ===========================================

    /// Creates an empty note file and indexes it.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the encoded filename is taken on disk or
    /// in the index.
    pub fn create_note(&mut self, group: TagId, name: NoteName) -> StoreResult<String> {
        self.require_note_target(group)?;
        let key = self.encoded(group, &name);
        let path = self.notes_dir.join(&key);

        if path.exists() || self.notes.contains_key(&key) {
            return Err(StoreError::AlreadyExists { filename: key });
        }

        let watcher = self.watcher.clone();
        let _gate = watcher.as_deref().map(DirectoryWatcher::suppress);

        let meta = NoteMeta::default();
        let serialized = infra::serialize(&meta, "");
        infra::write_atomic(&path, &serialized).map_err(StoreError::from_fs)?;
        let modified = infra::modified_at(&path).map_err(StoreError::from_fs)?;

        let mut note = Note::new(name, group, modified);
        note.set_meta(meta);
        note.mark_saved(String::new(), ContentHash::compute(serialized.as_bytes()));

        self.order.push(key.clone());
        self.notes.insert(key.clone(), note);
        self.tree.link_note(group, &key);
        let all = self.tree.all();
        self.tree.link_note(all, &key);

        debug!(file = %key, "note created");
        Ok(key)
    }

    /// Returns a note's body, reading it from disk on first access.
    ///
    /// Reading is the only transition out of the unloaded content state;
    /// afterwards the cached text is returned until the note is edited or
    /// reloaded.
    pub fn read_note(&mut self, key: &str) -> StoreResult<&str> {
        if !self.notes.contains_key(key) {
            return Err(StoreError::NotFound {
                what: key.to_string(),
            });
        }

        let needs_load = !self.notes[key].content().is_loaded();
        if needs_load {
            let path = self.notes_dir.join(key);
            let (content, bytes) = infra::read_to_string(&path).map_err(StoreError::from_fs)?;
            let parsed = infra::parse(&content).map_err(|e| StoreError::Io {
                path,
                source: std::io::Error::other(e.to_string()),
            })?;
            let note = self.notes.get_mut(key).expect("checked above");
            note.set_meta(parsed.meta);
            note.mark_loaded(parsed.body, ContentHash::compute(&bytes));
        }

        Ok(self
            .notes
            .get(key)
            .expect("checked above")
            .content()
            .text()
            .expect("content loaded above"))
    }

    /// Replaces a note's in-memory body, loading it first if needed. The
    /// note stays dirty until [`save_note`](NoteStore::save_note).
    pub fn edit_note(&mut self, key: &str, text: String) -> StoreResult<()> {
        self.read_note(key)?;
        let note = self.notes.get_mut(key).expect("read_note verified the key");
        note.edit(text).expect("content loaded by read_note");
        Ok(())
    }

    /// Writes a note's metadata block and body to disk atomically.
    ///
    /// Appends a version-history entry, then on success refreshes the
    /// modification timestamp from the filesystem (not wall-clock time) and
    /// clears the unsaved flag.
    pub fn save_note(&mut self, key: &str, content: &str) -> StoreResult<()> {
        let note = self.notes.get(key).ok_or_else(|| StoreError::NotFound {
            what: key.to_string(),
        })?;

        let mut meta = note.meta().clone();
        let author = self.author.clone().unwrap_or_else(|| "unknown".to_string());
        meta.record_save(&author, Utc::now());
        let serialized = infra::serialize(&meta, content);

        let watcher = self.watcher.clone();
        let _gate = watcher.as_deref().map(DirectoryWatcher::suppress);

        let path = self.notes_dir.join(key);
        infra::write_atomic(&path, &serialized).map_err(StoreError::from_fs)?;
        let modified = infra::modified_at(&path).map_err(StoreError::from_fs)?;

        let note = self.notes.get_mut(key).expect("checked above");
        note.set_meta(meta);
        note.set_modified(modified);
        note.mark_saved(content.to_string(), ContentHash::compute(serialized.as_bytes()));

        debug!(file = %key, "note saved");
        Ok(())
    }

    /// Renames a note within its group.
    ///
    /// Old and new filenames differing only in ASCII case skip the
    /// destination-existence check: on a case-insensitive filesystem the
    /// source itself would be reported as existing, and that is not a
    /// collision.
    ///
    /// # Errors
    ///
    /// Returns `NameCollision` when the destination filename is taken.
    pub fn rename_note(&mut self, key: &str, new_name: NoteName) -> StoreResult<String> {
        let note = self.notes.get(key).ok_or_else(|| StoreError::NotFound {
            what: key.to_string(),
        })?;
        let new_key = self.encoded(note.group(), &new_name);
        if new_key == key {
            return Ok(new_key);
        }

        let case_only = new_key.eq_ignore_ascii_case(key);
        let old_path = self.notes_dir.join(key);
        let new_path = self.notes_dir.join(&new_key);
        // The on-disk pre-existence check is skipped for case-only renames
        // (a case-insensitive filesystem reports the source itself), but the
        // index check always runs: a different note holding exactly the
        // destination key is a real collision.
        if self.notes.contains_key(&new_key) || (!case_only && new_path.exists()) {
            return Err(StoreError::NameCollision { filename: new_key });
        }

        let watcher = self.watcher.clone();
        let _gate = watcher.as_deref().map(DirectoryWatcher::suppress);

        std::fs::rename(&old_path, &new_path).map_err(|e| StoreError::Io {
            path: old_path,
            source: e,
        })?;

        self.rekey(key, &new_key);
        self.notes
            .get_mut(&new_key)
            .expect("rekeyed above")
            .set_name(new_name);

        debug!(old = %key, new = %new_key, "note renamed");
        Ok(new_key)
    }

    /// Moves a note to another group.
    ///
    /// The destination check is not case-folded: moving between groups is
    /// never a case-only rename of the same file.
    pub fn move_note(&mut self, key: &str, new_group: TagId) -> StoreResult<String> {
        self.require_note_target(new_group)?;
        let note = self.notes.get(key).ok_or_else(|| StoreError::NotFound {
            what: key.to_string(),
        })?;
        let old_group = note.group();
        let new_key = self.encoded(new_group, note.name());
        if new_key == key {
            return Ok(new_key);
        }

        let old_path = self.notes_dir.join(key);
        let new_path = self.notes_dir.join(&new_key);
        if new_path.exists() || self.notes.contains_key(&new_key) {
            return Err(StoreError::NameCollision { filename: new_key });
        }

        let watcher = self.watcher.clone();
        let _gate = watcher.as_deref().map(DirectoryWatcher::suppress);

        std::fs::rename(&old_path, &new_path).map_err(|e| StoreError::Io {
            path: old_path,
            source: e,
        })?;

        self.rekey(key, &new_key);
        self.tree.unlink_note(old_group, &new_key);
        self.tree.link_note(new_group, &new_key);
        self.notes
            .get_mut(&new_key)
            .expect("rekeyed above")
            .set_group(new_group);

        debug!(old = %key, new = %new_key, "note moved");
        Ok(new_key)
    }

    /// Deletes a note's backing file and drops it from the index.
    ///
    /// If the filesystem delete fails, the in-memory entry is left exactly
    /// as it was — the index never claims a note is gone while its file
    /// still exists.
    pub fn delete_note(&mut self, key: &str) -> StoreResult<()> {
        if !self.notes.contains_key(key) {
            return Err(StoreError::NotFound {
                what: key.to_string(),
            });
        }

        let watcher = self.watcher.clone();
        let _gate = watcher.as_deref().map(DirectoryWatcher::suppress);

        let path = self.notes_dir.join(key);
        std::fs::remove_file(&path).map_err(|e| StoreError::Io { path, source: e })?;

        self.order.retain(|k| k != key);
        self.notes.remove(key);
        self.tree.remove_note_links(key);

        debug!(file = %key, "note deleted");
        Ok(())
    }

    /// Linear content scan for notes containing `text` (case-insensitive).
    ///
    /// Uses cached content where a note is already loaded; otherwise reads
    /// the file. Unreadable files are logged and skipped.
    pub fn notes_with_text(&mut self, text: &str) -> Vec<String> {
        let pattern = RegexBuilder::new(&regex::escape(text))
            .case_insensitive(true)
            .build()
            .expect("escaped pattern is always valid");

        let keys: Vec<String> = self.order.clone();
        let mut hits = Vec::new();
        for key in keys {
            if pattern.is_match(self.notes[&key].name().as_str()) {
                hits.push(key);
                continue;
            }
            match self.read_note(&key) {
                Ok(body) => {
                    if pattern.is_match(body) {
                        hits.push(key);
                    }
                }
                Err(e) => warn!(file = %key, error = %e, "unreadable during search"),
            }
        }
        hits
    }

    /// Adds a label tag to a note's metadata and persists it.
    ///
    /// The label node is created if it doesn't exist yet. The note's body
    /// is loaded first so the save writes it back unchanged.
    pub fn tag_note(&mut self, key: &str, tag: TagName) -> StoreResult<()> {
        let label = self.tree.find_or_create_label(&tag)?;
        let body = self.read_note(key)?.to_string();

        let note = self.notes.get_mut(key).expect("read_note verified the key");
        if !note.meta_mut().add_tag(tag) {
            return Ok(());
        }
        self.save_note(key, &body)?;
        self.tree.link_note(label, key);
        Ok(())
    }

    /// Removes a label tag from a note's metadata and persists it.
    pub fn untag_note(&mut self, key: &str, tag: &TagName) -> StoreResult<()> {
        let body = self.read_note(key)?.to_string();

        let note = self.notes.get_mut(key).expect("read_note verified the key");
        if !note.meta_mut().remove_tag(tag) {
            return Ok(());
        }
        self.save_note(key, &body)?;
        if let Some(label) = self.tree.child_named(self.tree.root(), tag) {
            self.tree.unlink_note(label, key);
        }
        Ok(())
    }

    /// Drops every note's in-memory reference to a label tag. No file I/O:
    /// the on-disk metadata keeps the stale name until each note's next
    /// save.
    pub(crate) fn detach_label(&mut self, tag: TagId) {
        let Some(name) = self.tree.name(tag).cloned() else {
            return;
        };
        let keys: Vec<String> = self
            .tree
            .node(tag)
            .map(|n| n.notes().map(str::to_string).collect())
            .unwrap_or_default();
        for key in keys {
            if let Some(note) = self.notes.get_mut(&key) {
                note.meta_mut().remove_tag(&name);
            }
        }
    }

    // ===========================================
    // Group operations
    // ===========================================

    /// Renames a group, cascading to every note file in its subtree.
    ///
    /// Protocol: stage a `(old, new)` filename pair per member file, run a
    /// pre-flight existence check over all of them, and only then commit.
    /// A collision in the pre-flight aborts the whole operation with the
    /// filesystem untouched. A failure in the commit phase stops there:
    /// files renamed so far are not rolled back, but each is already
    /// re-keyed so the index agrees with disk, and the failure is logged
    /// with both names and the phase for manual recovery.
    ///
    /// Renaming onto an existing sibling group is a merge: the destination
    /// absorbs this group's notes and same-named child groups, through the
    /// very same staged cascade.
    pub fn rename_group(
        &mut self,
        group: TagId,
        new_name: &TagName,
    ) -> StoreResult<GroupRenameOutcome> {
        if self.tree.is_fixed(group) {
            let name = self
                .tree
                .name(group)
                .map(|n| n.as_str().to_string())
                .unwrap_or_default();
            return Err(TreeError::FixedTag { name }.into());
        }
        let old_path = self
            .tree
            .group_path(group)
            .ok_or_else(|| StoreError::NotFound {
                what: "group".to_string(),
            })?;

        if self.tree.name(group) == Some(new_name) {
            return Ok(GroupRenameOutcome::Renamed { files: 0 });
        }

        let parent = self
            .tree
            .node(group)
            .and_then(|n| n.parent())
            .ok_or_else(|| StoreError::NotFound {
                what: "group".to_string(),
            })?;

        // Resolve the destination before touching anything: an existing
        // sibling group means merge; a sibling label blocks the rename.
        let dest = match self.tree.child_named(parent, new_name) {
            Some(id) if id == group => None,
            Some(id) if self.tree.node(id).is_some_and(|n| n.kind() == TagKind::Group) => Some(id),
            Some(_) => {
                return Err(TreeError::DuplicateName {
                    name: new_name.as_str().to_string(),
                }
                .into());
            }
            None => {
                if parent == self.tree.root() && new_name.is_reserved() {
                    return Err(TreeError::ReservedName {
                        name: new_name.as_str().to_string(),
                    }
                    .into());
                }
                None
            }
        };

        let new_path = match old_path.rfind('/') {
            Some(pos) => format!("{}/{}", &old_path[..pos], new_name),
            None => new_name.as_str().to_string(),
        };

        // Validate the tree-side restructure before any file moves, so a
        // merge that cannot complete never leaves renamed files behind.
        if let Some(dest) = dest {
            self.tree.can_merge_into(group, dest)?;
        }

        let staged = self.stage_subtree_moves(&old_path, Some(&new_path));
        self.preflight_moves(&staged)?;

        let watcher = self.watcher.clone();
        let _gate = watcher.as_deref().map(DirectoryWatcher::suppress);
        let files = self.commit_moves(&staged)?;

        match dest {
            Some(dest) => {
                self.tree.merge_into(group, dest)?;
                self.relink_after_restructure(&staged);
                info!(old = %old_path, new = %new_path, files, "group merged");
                Ok(GroupRenameOutcome::Merged { into: dest, files })
            }
            None => {
                self.tree.rename(group, new_name.clone())?;
                self.relink_after_restructure(&staged);
                info!(old = %old_path, new = %new_path, files, "group renamed");
                Ok(GroupRenameOutcome::Renamed { files })
            }
        }
    }

    /// Deletes a group without deleting any note.
    ///
    /// Member notes move to the parent group's prefix — or lose their
    /// prefix entirely for a top-level group, landing in `Not Grouped`.
    /// Child groups are reparented (merging with same-named siblings), and
    /// their files renamed to the shortened path. Returns the number of
    /// files renamed.
    pub fn delete_group(&mut self, group: TagId) -> StoreResult<usize> {
        if self.tree.is_fixed(group) {
            let name = self
                .tree
                .name(group)
                .map(|n| n.as_str().to_string())
                .unwrap_or_default();
            return Err(TreeError::FixedTag { name }.into());
        }
        let old_path = self
            .tree
            .group_path(group)
            .ok_or_else(|| StoreError::NotFound {
                what: "group".to_string(),
            })?;

        let parent = self
            .tree
            .node(group)
            .and_then(|n| n.parent())
            .ok_or_else(|| StoreError::NotFound {
                what: "group".to_string(),
            })?;
        let parent_path = self.tree.group_path(parent);

        self.tree.can_merge_into(group, parent)?;

        let staged = self.stage_subtree_moves(&old_path, parent_path.as_deref());
        self.preflight_moves(&staged)?;

        let watcher = self.watcher.clone();
        let _gate = watcher.as_deref().map(DirectoryWatcher::suppress);
        let files = self.commit_moves(&staged)?;

        self.tree.merge_into(group, parent)?;
        self.relink_after_restructure(&staged);

        info!(group = %old_path, files, "group deleted, notes kept");
        Ok(files)
    }

    /// Stages `(old, new)` filename pairs for every note whose group path
    /// is `old_path` or sits below it. `new_path` of `None` strips the
    /// prefix (the notes become ungrouped).
    fn stage_subtree_moves(
        &self,
        old_path: &str,
        new_path: Option<&str>,
    ) -> Vec<(String, String)> {
        self.order
            .iter()
            .filter_map(|key| {
                let decoded = filename::decode(key);
                let group_path = decoded.group_path?;
                let rebased = rebase_group_path(&group_path, old_path, new_path)?;
                let rebased = if rebased.is_empty() {
                    None
                } else {
                    Some(rebased)
                };
                Some((
                    key.clone(),
                    filename::encode_raw(rebased.as_deref(), &decoded.name),
                ))
            })
            .collect()
    }

    /// Verifies no staged destination is already taken. Pairs differing
    /// only by ASCII case skip the on-disk existence check (the source
    /// itself answers on a case-insensitive filesystem), but a different
    /// indexed note holding the exact destination key always collides.
    fn preflight_moves(&self, staged: &[(String, String)]) -> StoreResult<()> {
        for (old_key, new_key) in staged {
            let case_only = old_key.eq_ignore_ascii_case(new_key);
            if self.notes.contains_key(new_key.as_str())
                || (!case_only && self.notes_dir.join(new_key).exists())
            {
                warn!(
                    old = %old_key,
                    new = %new_key,
                    phase = "preflight",
                    "group operation aborted: destination exists"
                );
                return Err(StoreError::NameCollision {
                    filename: new_key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Renames every staged pair, re-keying the index as each file moves so
    /// memory matches disk for everything actually touched. Stops at the
    /// first failure; completed renames stay committed.
    fn commit_moves(&mut self, staged: &[(String, String)]) -> StoreResult<usize> {
        let mut files = 0;
        for (old_key, new_key) in staged {
            if old_key == new_key {
                continue;
            }
            let from = self.notes_dir.join(old_key);
            let to = self.notes_dir.join(new_key);
            if let Err(e) = std::fs::rename(&from, &to) {
                error!(
                    old = %old_key,
                    new = %new_key,
                    phase = "commit",
                    error = %e,
                    "group operation failed mid-commit; earlier renames are not rolled back"
                );
                return Err(StoreError::Io {
                    path: from,
                    source: e,
                });
            }
            self.rekey(old_key, new_key);
            files += 1;
        }
        Ok(files)
    }

    /// Re-resolves group membership for every staged note after the tree
    /// was restructured: the new key's decoded path names the group the
    /// note now belongs to.
    fn relink_after_restructure(&mut self, staged: &[(String, String)]) {
        let not_grouped = self.tree.not_grouped();
        for (_, new_key) in staged {
            let decoded = filename::decode(new_key);
            let group = decoded
                .group_path
                .as_deref()
                .and_then(|p| self.tree.group_at_path(p))
                .unwrap_or(not_grouped);
            self.tree.link_note(group, new_key);
            if let Some(note) = self.notes.get_mut(new_key) {
                note.set_group(group);
            }
        }
    }

    fn rekey(&mut self, old: &str, new: &str) {
        if let Some(slot) = self.order.iter_mut().find(|k| k.as_str() == old) {
            *slot = new.to_string();
        }
        if let Some(note) = self.notes.remove(old) {
            self.notes.insert(new.to_string(), note);
        }
        self.tree.rekey_note(old, new);
    }
}
