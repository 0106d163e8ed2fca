//! Orchestration of tag and group mutations.
//!
//! Translates a single caller intent — rename this tag, delete those tags —
//! into the right ordered sequence of tree and index calls, and decides the
//! user-visible outcome for the edge cases (merge on rename collision,
//! reserved-name protection, independent failures in bulk deletes).

use thiserror::Error;
use tracing::warn;

use crate::domain::{TagId, TagKind, TagName, TreeError};
use crate::index::store::{GroupRenameOutcome, NoteStore, StoreError};

/// Errors from tag/group mutations: either a tree constraint or an index
/// operation failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Creates a tag under `parent`.
///
/// Group-style tags become filename prefixes as soon as a note is filed
/// under them; label tags exist only in the tree and note metadata.
pub fn create_tag(
    store: &mut NoteStore,
    parent: TagId,
    name: TagName,
    kind: TagKind,
) -> EngineResult<TagId> {
    Ok(store.tree_mut().create(parent, name, kind)?)
}

/// Renames a tag.
///
/// Reserved names and fixed tags are rejected before any filesystem call.
/// For group-style tags the filename cascade runs first and the tree rename
/// commits only if the cascade succeeds; renaming onto an existing sibling
/// group merges into it. For labels this is a pure tree rename.
pub fn rename_tag(
    store: &mut NoteStore,
    tag: TagId,
    new_name: TagName,
) -> EngineResult<GroupRenameOutcome> {
    if store.tree().is_fixed(tag) {
        let name = store
            .tree()
            .name(tag)
            .map(|n| n.as_str().to_string())
            .unwrap_or_default();
        return Err(TreeError::FixedTag { name }.into());
    }

    let is_group = store.tree().group_path(tag).is_some();
    if is_group {
        Ok(store.rename_group(tag, &new_name)?)
    } else {
        store.tree_mut().rename(tag, new_name)?;
        Ok(GroupRenameOutcome::Renamed { files: 0 })
    }
}

/// Deletes a tag. Never deletes a note.
///
/// Group-style tags delegate to the index's group delete: member files are
/// renamed out of the group, children are reparented. Label tags detach
/// every note's reference in memory (no file I/O) and drop the node.
pub fn delete_tag(store: &mut NoteStore, tag: TagId) -> EngineResult<()> {
    if store.tree().is_fixed(tag) {
        let name = store
            .tree()
            .name(tag)
            .map(|n| n.as_str().to_string())
            .unwrap_or_default();
        return Err(TreeError::FixedTag { name }.into());
    }

    let is_group = store.tree().group_path(tag).is_some();
    if is_group {
        store.delete_group(tag)?;
    } else {
        store.detach_label(tag);
        store.tree_mut().remove(tag)?;
    }
    Ok(())
}

/// Deletes a set of tags, attempting every one even when some fail.
///
/// Returns the per-tag outcomes in input order; failures are also logged.
pub fn delete_tags(
    store: &mut NoteStore,
    tags: &[TagId],
) -> Vec<(TagId, EngineResult<()>)> {
    tags.iter()
        .map(|&tag| {
            let result = delete_tag(store, tag);
            if let Err(e) = &result {
                let name = store
                    .tree()
                    .name(tag)
                    .map(|n| n.as_str().to_string())
                    .unwrap_or_else(|| "<gone>".to_string());
                warn!(tag = %name, error = %e, "bulk delete: tag skipped");
            }
            (tag, result)
        })
        .collect()
}
