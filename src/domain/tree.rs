//! Hierarchical tag tree with groups as a reserved subset of tags.
//!
//! Nodes live in a flat arena keyed by stable ids; parent/child
//! relationships are id references. Back-reference consistency is checked by
//! [`TagTree::validate`] as a pure function over the arena rather than
//! repaired by mutation callbacks.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::domain::tag_name::{ALL, ARCHIVE, NOT_GROUPED};
use crate::domain::TagName;

/// Stable identifier of a tag node. Ids are never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(u32);

/// Whether a tag participates in the filename-encoding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Encoded as a bracketed filename prefix; may nest.
    Group,
    /// A plain label carried in note metadata; no filesystem presence.
    Label,
}

/// How [`TagTree::matches_filter`] compares tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// Same node.
    Identity,
    /// Same name, anywhere in the tree.
    ByName,
}

/// Errors from tag tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("tag not found")]
    NotFound,

    #[error("a sibling tag named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("'{name}' is a fixed tag and cannot be renamed or deleted")]
    FixedTag { name: String },

    #[error("'{name}' is a reserved name")]
    ReservedName { name: String },

    #[error("'{name}' is not a valid tag name")]
    InvalidName { name: String },
}

/// One node in the tag tree.
#[derive(Debug, Clone)]
pub struct TagNode {
    name: TagName,
    kind: TagKind,
    color: Option<String>,
    icon: Option<String>,
    parent: Option<TagId>,
    children: Vec<TagId>,
    notes: BTreeSet<String>,
}

impl TagNode {
    fn new(name: TagName, kind: TagKind, parent: Option<TagId>) -> Self {
        Self {
            name,
            kind,
            color: None,
            icon: None,
            parent,
            children: Vec::new(),
            notes: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &TagName {
        &self.name
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn parent(&self) -> Option<TagId> {
        self.parent
    }

    pub fn children(&self) -> &[TagId] {
        &self.children
    }

    /// Filename keys of the notes linked to this tag, in key order.
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().map(String::as_str)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn has_note(&self, key: &str) -> bool {
        self.notes.contains(key)
    }
}

/// The tag/group hierarchy for one notes directory.
///
/// Construction seeds the fixed nodes: a structural root, `All`,
/// `Not Grouped`, and `Archive`. The fixed nodes cannot be renamed or
/// deleted; user tags hang off the root (labels) or nest under groups.
#[derive(Debug)]
pub struct TagTree {
    nodes: HashMap<TagId, TagNode>,
    next: u32,
    root: TagId,
    all: TagId,
    not_grouped: TagId,
    archive: TagId,
}

impl TagTree {
    /// Creates a tree containing only the fixed nodes.
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            next: 0,
            root: TagId(0),
            all: TagId(0),
            not_grouped: TagId(0),
            archive: TagId(0),
        };

        let root = tree.insert(TagName::new("Notes").expect("fixed name"), TagKind::Group, None);
        tree.root = root;
        tree.all = tree.insert_child(root, TagName::new(ALL).expect("fixed name"), TagKind::Label);
        tree.not_grouped = tree.insert_child(
            root,
            TagName::new(NOT_GROUPED).expect("fixed name"),
            TagKind::Group,
        );
        tree.archive = tree.insert_child(
            root,
            TagName::new(ARCHIVE).expect("fixed name"),
            TagKind::Group,
        );
        tree
    }

    fn insert(&mut self, name: TagName, kind: TagKind, parent: Option<TagId>) -> TagId {
        let id = TagId(self.next);
        self.next += 1;
        self.nodes.insert(id, TagNode::new(name, kind, parent));
        id
    }

    fn insert_child(&mut self, parent: TagId, name: TagName, kind: TagKind) -> TagId {
        let id = self.insert(name, kind, Some(parent));
        self.nodes
            .get_mut(&parent)
            .expect("parent exists")
            .children
            .push(id);
        id
    }

    /// Returns the structural root node id.
    pub fn root(&self) -> TagId {
        self.root
    }

    /// Returns the `All` aggregate tag id.
    pub fn all(&self) -> TagId {
        self.all
    }

    /// Returns the `Not Grouped` bucket id.
    pub fn not_grouped(&self) -> TagId {
        self.not_grouped
    }

    /// Returns the `Archive` group id.
    pub fn archive(&self) -> TagId {
        self.archive
    }

    /// Returns the node for an id, if it exists.
    pub fn node(&self, id: TagId) -> Option<&TagNode> {
        self.nodes.get(&id)
    }

    /// Returns the name of a node, if it exists.
    pub fn name(&self, id: TagId) -> Option<&TagName> {
        self.nodes.get(&id).map(|n| &n.name)
    }

    /// Returns whether the id is one of the fixed nodes.
    pub fn is_fixed(&self, id: TagId) -> bool {
        id == self.root || id == self.all || id == self.not_grouped || id == self.archive
    }

    /// Returns the child of `parent` with the given name, if any.
    pub fn child_named(&self, parent: TagId, name: &TagName) -> Option<TagId> {
        let node = self.nodes.get(&parent)?;
        node.children
            .iter()
            .copied()
            .find(|c| self.nodes.get(c).is_some_and(|n| &n.name == name))
    }

    /// Creates a tag under `parent`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `parent` doesn't exist, `ReservedName` when a
    /// reserved name would land beside the fixed nodes, and `DuplicateName`
    /// on a sibling collision.
    pub fn create(&mut self, parent: TagId, name: TagName, kind: TagKind) -> Result<TagId, TreeError> {
        if !self.nodes.contains_key(&parent) {
            return Err(TreeError::NotFound);
        }
        if parent == self.root && name.is_reserved() {
            return Err(TreeError::ReservedName {
                name: name.as_str().to_string(),
            });
        }
        if self.child_named(parent, &name).is_some() {
            return Err(TreeError::DuplicateName {
                name: name.as_str().to_string(),
            });
        }
        Ok(self.insert_child(parent, name, kind))
    }

    /// Renames a tag node. Tree-level only: for group-style tags the caller
    /// must first cascade the filename renames through the index.
    ///
    /// # Errors
    ///
    /// Returns `FixedTag` for the fixed nodes, `ReservedName` when renaming
    /// a root child to a reserved name, and `DuplicateName` on a sibling
    /// collision (a case-only rename of the same node is not a collision).
    pub fn rename(&mut self, id: TagId, new_name: TagName) -> Result<(), TreeError> {
        let node = self.nodes.get(&id).ok_or(TreeError::NotFound)?;
        if self.is_fixed(id) {
            return Err(TreeError::FixedTag {
                name: node.name.as_str().to_string(),
            });
        }
        let parent = node.parent.ok_or(TreeError::NotFound)?;
        if parent == self.root && new_name.is_reserved() {
            return Err(TreeError::ReservedName {
                name: new_name.as_str().to_string(),
            });
        }
        if let Some(existing) = self.child_named(parent, &new_name)
            && existing != id
        {
            return Err(TreeError::DuplicateName {
                name: new_name.as_str().to_string(),
            });
        }
        self.nodes.get_mut(&id).expect("checked above").name = new_name;
        Ok(())
    }

    /// Removes a tag node, reparenting its children to the removed node's
    /// parent. The node's note links are discarded; the caller is
    /// responsible for relinking notes first.
    ///
    /// # Errors
    ///
    /// Returns `FixedTag` for the fixed nodes and `DuplicateName` when a
    /// reparented child would collide with an existing sibling (nothing is
    /// changed in that case).
    pub fn remove(&mut self, id: TagId) -> Result<(), TreeError> {
        let node = self.nodes.get(&id).ok_or(TreeError::NotFound)?;
        if self.is_fixed(id) {
            return Err(TreeError::FixedTag {
                name: node.name.as_str().to_string(),
            });
        }
        let parent = node.parent.ok_or(TreeError::NotFound)?;

        // Check reparenting collisions before touching anything.
        for child in node.children.clone() {
            let child_name = self.nodes.get(&child).ok_or(TreeError::NotFound)?.name.clone();
            if let Some(existing) = self.child_named(parent, &child_name)
                && existing != id
            {
                return Err(TreeError::DuplicateName {
                    name: child_name.as_str().to_string(),
                });
            }
        }

        let node = self.nodes.remove(&id).expect("checked above");
        for child in &node.children {
            if let Some(c) = self.nodes.get_mut(child) {
                c.parent = Some(parent);
            }
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
            p.children.extend(node.children.iter().copied());
        }
        Ok(())
    }

    /// Dry-run of [`merge_into`](TagTree::merge_into): checks that every
    /// child of `src` can land under `dest`, recursing through same-named
    /// group pairs, without changing anything.
    pub(crate) fn can_merge_into(&self, src: TagId, dest: TagId) -> Result<(), TreeError> {
        let src_node = self.nodes.get(&src).ok_or(TreeError::NotFound)?;
        if !self.nodes.contains_key(&dest) {
            return Err(TreeError::NotFound);
        }
        for child in &src_node.children {
            let c = self.nodes.get(child).ok_or(TreeError::NotFound)?;
            match self.child_named(dest, &c.name) {
                Some(existing)
                    if c.kind == TagKind::Group && self.nodes[&existing].kind == TagKind::Group =>
                {
                    self.can_merge_into(*child, existing)?;
                }
                Some(_) => {
                    return Err(TreeError::DuplicateName {
                        name: c.name.as_str().to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Moves all children of `src` under `dest` and removes `src`.
    ///
    /// Children whose names collide with an existing child of `dest` of the
    /// same group kind are merged recursively; other collisions are
    /// rejected. Note links of `src` are moved into `dest` — except when
    /// `dest` is the structural root, which never links notes.
    pub(crate) fn merge_into(&mut self, src: TagId, dest: TagId) -> Result<(), TreeError> {
        if self.is_fixed(src) {
            let name = self.name(src).map(|n| n.as_str().to_string()).unwrap_or_default();
            return Err(TreeError::FixedTag { name });
        }
        if !self.nodes.contains_key(&dest) {
            return Err(TreeError::NotFound);
        }

        let src_node = self.nodes.get(&src).ok_or(TreeError::NotFound)?;
        let src_children = src_node.children.clone();
        let src_notes: Vec<String> = src_node.notes.iter().cloned().collect();

        for child in src_children {
            let (child_name, child_kind) = {
                let c = self.nodes.get(&child).ok_or(TreeError::NotFound)?;
                (c.name.clone(), c.kind)
            };
            match self.child_named(dest, &child_name) {
                Some(existing)
                    if child_kind == TagKind::Group
                        && self.nodes[&existing].kind == TagKind::Group =>
                {
                    self.merge_into(child, existing)?;
                }
                Some(_) => {
                    return Err(TreeError::DuplicateName {
                        name: child_name.as_str().to_string(),
                    });
                }
                None => {
                    if let Some(c) = self.nodes.get_mut(&child) {
                        c.parent = Some(dest);
                    }
                    self.nodes
                        .get_mut(&dest)
                        .expect("checked above")
                        .children
                        .push(child);
                }
            }
        }

        if dest != self.root {
            for key in src_notes {
                self.nodes
                    .get_mut(&dest)
                    .expect("checked above")
                    .notes
                    .insert(key);
            }
        }

        let parent = self.nodes.get(&src).and_then(|n| n.parent);
        self.nodes.remove(&src);
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != src);
        }
        Ok(())
    }

    // ===========================================
    // Group paths
    // ===========================================

    /// Returns the slash-joined path of a group node, or `None` for the
    /// root, `All`, `Not Grouped`, and label tags.
    ///
    /// The path is what the filename codec embeds between brackets.
    pub fn group_path(&self, id: TagId) -> Option<String> {
        if id == self.root || id == self.all || id == self.not_grouped {
            return None;
        }
        let node = self.nodes.get(&id)?;
        if node.kind != TagKind::Group {
            return None;
        }

        let mut segments = vec![node.name.as_str().to_string()];
        let mut cur = node.parent;
        while let Some(pid) = cur {
            if pid == self.root {
                break;
            }
            let p = self.nodes.get(&pid)?;
            segments.push(p.name.as_str().to_string());
            cur = p.parent;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Resolves a slash-joined group path to a node id.
    pub fn group_at_path(&self, path: &str) -> Option<TagId> {
        let mut cur = self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let name = TagName::new(segment).ok()?;
            let child = self.child_named(cur, &name)?;
            if self.nodes.get(&child)?.kind != TagKind::Group {
                return None;
            }
            cur = child;
        }
        if cur == self.root { None } else { Some(cur) }
    }

    /// Resolves a group path, creating missing segments as group nodes.
    ///
    /// Used during directory scans when a filename carries a
    /// previously-unseen bracketed group path.
    ///
    /// # Errors
    ///
    /// Returns `ReservedName` if the path starts with `All` or
    /// `Not Grouped` — those cannot be addressed as filename prefixes.
    pub fn ensure_group_path(&mut self, path: &str) -> Result<TagId, TreeError> {
        let mut cur = self.root;
        for (i, segment) in path.split('/').filter(|s| !s.is_empty()).enumerate() {
            let name = TagName::new(segment).map_err(|_| TreeError::InvalidName {
                name: segment.to_string(),
            })?;
            if i == 0 && (name.as_str() == ALL || name.as_str() == NOT_GROUPED) {
                return Err(TreeError::ReservedName {
                    name: segment.to_string(),
                });
            }
            cur = match self.child_named(cur, &name) {
                Some(existing) if self.nodes[&existing].kind == TagKind::Group => existing,
                Some(_) => {
                    return Err(TreeError::DuplicateName {
                        name: segment.to_string(),
                    });
                }
                None => self.insert_child(cur, name, TagKind::Group),
            };
        }
        if cur == self.root {
            return Err(TreeError::NotFound);
        }
        Ok(cur)
    }

    /// Returns every group node paired with its path, in depth-first order.
    /// `Not Grouped` is excluded (it has no path).
    pub fn groups(&self) -> Vec<(TagId, String)> {
        let mut out = Vec::new();
        let mut stack: Vec<TagId> = self
            .nodes
            .get(&self.root)
            .map(|r| r.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if let Some(path) = self.group_path(id) {
                out.push((id, path));
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Returns every label tag under the root, excluding `All`.
    pub fn labels(&self) -> Vec<TagId> {
        self.nodes
            .get(&self.root)
            .map(|r| {
                r.children
                    .iter()
                    .copied()
                    .filter(|id| {
                        *id != self.all
                            && self.nodes.get(id).is_some_and(|n| n.kind == TagKind::Label)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finds a root-level label by name, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a group node already holds the name at the
    /// root, and `ReservedName` for the reserved names.
    pub fn find_or_create_label(&mut self, name: &TagName) -> Result<TagId, TreeError> {
        if name.is_reserved() {
            return Err(TreeError::ReservedName {
                name: name.as_str().to_string(),
            });
        }
        match self.child_named(self.root, name) {
            Some(existing) if self.nodes[&existing].kind == TagKind::Label => Ok(existing),
            Some(_) => Err(TreeError::DuplicateName {
                name: name.as_str().to_string(),
            }),
            None => Ok(self.insert_child(self.root, name.clone(), TagKind::Label)),
        }
    }

    // ===========================================
    // Hierarchy queries
    // ===========================================

    /// Returns whether `candidate` sits strictly below `ancestor`.
    pub fn is_descendant_of(&self, candidate: TagId, ancestor: TagId) -> bool {
        let mut cur = self.nodes.get(&candidate).and_then(|n| n.parent);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Decides whether a note filed under `candidate` should show up under a
    /// `filter` tag.
    ///
    /// `Identity` compares nodes; `ByName` compares names (flat views that
    /// ignore hierarchy ask by name). With `include_descendants`, a
    /// sub-group matches its ancestors' filter.
    pub fn matches_filter(
        &self,
        candidate: TagId,
        filter: TagId,
        mode: TagMatch,
        include_descendants: bool,
    ) -> bool {
        match mode {
            TagMatch::Identity => {
                candidate == filter
                    || (include_descendants && self.is_descendant_of(candidate, filter))
            }
            TagMatch::ByName => {
                let (Some(cname), Some(fname)) = (self.name(candidate), self.name(filter)) else {
                    return false;
                };
                if cname == fname {
                    return true;
                }
                if !include_descendants {
                    return false;
                }
                let fname = fname.clone();
                let mut cur = self.nodes.get(&candidate).and_then(|n| n.parent);
                while let Some(id) = cur {
                    if id != self.root && self.name(id) == Some(&fname) {
                        return true;
                    }
                    cur = self.nodes.get(&id).and_then(|n| n.parent);
                }
                false
            }
        }
    }

    /// Returns whether a tag is the archive or sits inside it.
    pub fn is_archived(&self, id: TagId) -> bool {
        id == self.archive || self.is_descendant_of(id, self.archive)
    }

    // ===========================================
    // Note links
    // ===========================================

    /// Links a note key to a tag.
    pub fn link_note(&mut self, id: TagId, key: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.notes.insert(key.to_string());
        }
    }

    /// Unlinks a note key from a tag.
    pub fn unlink_note(&mut self, id: TagId, key: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.notes.remove(key);
        }
    }

    /// Renames a note key in every tag that links it.
    pub fn rekey_note(&mut self, old: &str, new: &str) {
        for node in self.nodes.values_mut() {
            if node.notes.remove(old) {
                node.notes.insert(new.to_string());
            }
        }
    }

    /// Removes a note key from every tag.
    pub fn remove_note_links(&mut self, key: &str) {
        for node in self.nodes.values_mut() {
            node.notes.remove(key);
        }
    }

    /// Clears every tag's note links; a directory scan rebuilds them.
    pub fn clear_note_links(&mut self) {
        for node in self.nodes.values_mut() {
            node.notes.clear();
        }
    }

    // ===========================================
    // Annotations
    // ===========================================

    /// Sets a tag's color annotation.
    pub fn set_color(&mut self, id: TagId, color: Option<String>) -> Result<(), TreeError> {
        self.nodes
            .get_mut(&id)
            .map(|n| n.color = color)
            .ok_or(TreeError::NotFound)
    }

    /// Sets a tag's icon annotation.
    pub fn set_icon(&mut self, id: TagId, icon: Option<String>) -> Result<(), TreeError> {
        self.nodes
            .get_mut(&id)
            .map(|n| n.icon = icon)
            .ok_or(TreeError::NotFound)
    }

    // ===========================================
    // Invariant validation
    // ===========================================

    /// Checks parent/child link agreement across the whole arena.
    ///
    /// Returns a description of every violation found; an empty vector means
    /// the tree is consistent.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (id, node) in &self.nodes {
            for child in &node.children {
                match self.nodes.get(child) {
                    None => issues.push(format!(
                        "'{}' lists a child id that does not exist",
                        node.name
                    )),
                    Some(c) if c.parent != Some(*id) => issues.push(format!(
                        "'{}' is a child of '{}' but points at a different parent",
                        c.name, node.name
                    )),
                    Some(_) => {}
                }
            }

            match node.parent {
                None => {
                    if *id != self.root {
                        issues.push(format!("'{}' has no parent but is not the root", node.name));
                    }
                }
                Some(pid) => match self.nodes.get(&pid) {
                    None => issues.push(format!("'{}' points at a missing parent", node.name)),
                    Some(p) if !p.children.contains(id) => issues.push(format!(
                        "'{}' points at parent '{}' which does not list it",
                        node.name, p.name
                    )),
                    Some(_) => {}
                },
            }
        }

        issues
    }
}

impl Default for TagTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> TagName {
        TagName::new(s).unwrap()
    }

    fn tree_with_group(path: &str) -> (TagTree, TagId) {
        let mut tree = TagTree::new();
        let id = tree.ensure_group_path(path).unwrap();
        (tree, id)
    }

    // ===========================================
    // Phase 1: Fixed nodes
    // ===========================================

    #[test]
    fn new_tree_has_fixed_nodes() {
        let tree = TagTree::new();
        assert_eq!(tree.name(tree.all()).unwrap().as_str(), "All");
        assert_eq!(tree.name(tree.not_grouped()).unwrap().as_str(), "Not Grouped");
        assert_eq!(tree.name(tree.archive()).unwrap().as_str(), "Archive");
    }

    #[test]
    fn fixed_nodes_cannot_be_renamed() {
        let mut tree = TagTree::new();
        for id in [tree.all(), tree.not_grouped(), tree.archive(), tree.root()] {
            let result = tree.rename(id, name("anything"));
            assert!(matches!(result, Err(TreeError::FixedTag { .. })));
        }
        assert!(tree.validate().is_empty());
    }

    #[test]
    fn fixed_nodes_cannot_be_removed() {
        let mut tree = TagTree::new();
        for id in [tree.all(), tree.not_grouped(), tree.archive(), tree.root()] {
            let result = tree.remove(id);
            assert!(matches!(result, Err(TreeError::FixedTag { .. })));
        }
        assert!(tree.validate().is_empty());
    }

    #[test]
    fn creating_reserved_sibling_is_rejected() {
        let mut tree = TagTree::new();
        let root = tree.root();
        let result = tree.create(root, name("All"), TagKind::Group);
        assert!(matches!(result, Err(TreeError::ReservedName { .. })));
    }

    #[test]
    fn renaming_onto_reserved_name_is_rejected() {
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        let result = tree.rename(work, name("All"));
        assert!(matches!(result, Err(TreeError::ReservedName { .. })));
    }

    #[test]
    fn nested_tag_may_reuse_reserved_name() {
        // Only siblings of the fixed nodes are constrained.
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        let nested = tree.create(work, name("Archive"), TagKind::Group);
        assert!(nested.is_ok());
    }

    // ===========================================
    // Phase 2: Create / rename / remove
    // ===========================================

    #[test]
    fn create_rejects_sibling_duplicate() {
        let mut tree = TagTree::new();
        tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        let result = tree.create(tree.root(), name("work"), TagKind::Label);
        assert!(matches!(result, Err(TreeError::DuplicateName { .. })));
    }

    #[test]
    fn same_leaf_name_allowed_at_different_levels() {
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        let home = tree.create(tree.root(), name("home"), TagKind::Group).unwrap();
        assert!(tree.create(work, name("plans"), TagKind::Group).is_ok());
        assert!(tree.create(home, name("plans"), TagKind::Group).is_ok());
        assert!(tree.validate().is_empty());
    }

    #[test]
    fn rename_updates_name() {
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        tree.rename(work, name("office")).unwrap();
        assert_eq!(tree.name(work).unwrap().as_str(), "office");
    }

    #[test]
    fn rename_to_own_name_with_case_change_is_allowed() {
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        tree.rename(work, name("Work")).unwrap();
        assert_eq!(tree.name(work).unwrap().as_str(), "Work");
    }

    #[test]
    fn rename_rejects_sibling_duplicate() {
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        tree.create(tree.root(), name("home"), TagKind::Group).unwrap();
        let result = tree.rename(work, name("home"));
        assert!(matches!(result, Err(TreeError::DuplicateName { .. })));
    }

    #[test]
    fn remove_reparents_children() {
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        let plans = tree.create(work, name("plans"), TagKind::Group).unwrap();

        tree.remove(work).unwrap();

        assert!(tree.node(work).is_none());
        assert_eq!(tree.node(plans).unwrap().parent(), Some(tree.root()));
        assert!(tree.node(tree.root()).unwrap().children().contains(&plans));
        assert!(tree.validate().is_empty());
    }

    #[test]
    fn remove_rejects_reparent_collision() {
        let mut tree = TagTree::new();
        let work = tree.create(tree.root(), name("work"), TagKind::Group).unwrap();
        tree.create(work, name("plans"), TagKind::Group).unwrap();
        tree.create(tree.root(), name("plans"), TagKind::Group).unwrap();

        let result = tree.remove(work);
        assert!(matches!(result, Err(TreeError::DuplicateName { .. })));
        // Nothing changed.
        assert!(tree.node(work).is_some());
        assert!(tree.validate().is_empty());
    }

    // ===========================================
    // Phase 3: Group paths
    // ===========================================

    #[test]
    fn group_path_for_top_level_group() {
        let (tree, id) = tree_with_group("work");
        assert_eq!(tree.group_path(id).unwrap(), "work");
    }

    #[test]
    fn group_path_for_nested_group() {
        let (tree, id) = tree_with_group("work/projects/alpha");
        assert_eq!(tree.group_path(id).unwrap(), "work/projects/alpha");
    }

    #[test]
    fn group_path_none_for_fixed_buckets() {
        let tree = TagTree::new();
        assert!(tree.group_path(tree.root()).is_none());
        assert!(tree.group_path(tree.all()).is_none());
        assert!(tree.group_path(tree.not_grouped()).is_none());
        // Archive does have a path: it is a real filename prefix.
        assert_eq!(tree.group_path(tree.archive()).unwrap(), "Archive");
    }

    #[test]
    fn ensure_group_path_reuses_existing_nodes() {
        let mut tree = TagTree::new();
        let a = tree.ensure_group_path("work/projects").unwrap();
        let b = tree.ensure_group_path("work/projects").unwrap();
        assert_eq!(a, b);

        let siblings = tree
            .node(tree.root())
            .unwrap()
            .children()
            .iter()
            .filter(|id| tree.name(**id).unwrap().as_str() == "work")
            .count();
        assert_eq!(siblings, 1);
    }

    #[test]
    fn ensure_group_path_reuses_archive() {
        let mut tree = TagTree::new();
        let id = tree.ensure_group_path("Archive").unwrap();
        assert_eq!(id, tree.archive());
    }

    #[test]
    fn ensure_group_path_rejects_all_and_not_grouped() {
        let mut tree = TagTree::new();
        assert!(matches!(
            tree.ensure_group_path("All"),
            Err(TreeError::ReservedName { .. })
        ));
        assert!(matches!(
            tree.ensure_group_path("Not Grouped"),
            Err(TreeError::ReservedName { .. })
        ));
    }

    #[test]
    fn group_at_path_resolves_nested() {
        let (tree, id) = tree_with_group("work/projects");
        assert_eq!(tree.group_at_path("work/projects"), Some(id));
        assert_eq!(tree.group_at_path("work/unknown"), None);
        assert_eq!(tree.group_at_path(""), None);
    }

    // ===========================================
    // Phase 4: Hierarchy queries
    // ===========================================

    #[test]
    fn descendant_query() {
        let mut tree = TagTree::new();
        let work = tree.ensure_group_path("work").unwrap();
        let alpha = tree.ensure_group_path("work/projects/alpha").unwrap();

        assert!(tree.is_descendant_of(alpha, work));
        assert!(!tree.is_descendant_of(work, alpha));
        assert!(!tree.is_descendant_of(work, work));
    }

    #[test]
    fn matches_filter_identity() {
        let mut tree = TagTree::new();
        let work = tree.ensure_group_path("work").unwrap();
        let alpha = tree.ensure_group_path("work/alpha").unwrap();

        assert!(tree.matches_filter(work, work, TagMatch::Identity, false));
        assert!(!tree.matches_filter(alpha, work, TagMatch::Identity, false));
        assert!(tree.matches_filter(alpha, work, TagMatch::Identity, true));
    }

    #[test]
    fn matches_filter_by_name_crosses_subtrees() {
        let mut tree = TagTree::new();
        let work_plans = tree.ensure_group_path("work/plans").unwrap();
        let home_plans = tree.ensure_group_path("home/plans").unwrap();

        // Flat views compare names, so the two "plans" groups match.
        assert!(tree.matches_filter(work_plans, home_plans, TagMatch::ByName, false));
        assert!(!tree.matches_filter(work_plans, home_plans, TagMatch::Identity, false));
    }

    #[test]
    fn matches_filter_by_name_with_descendants() {
        let mut tree = TagTree::new();
        let work = tree.ensure_group_path("work").unwrap();
        let alpha = tree.ensure_group_path("work/alpha").unwrap();

        assert!(tree.matches_filter(alpha, work, TagMatch::ByName, true));
        assert!(!tree.matches_filter(alpha, work, TagMatch::ByName, false));
    }

    #[test]
    fn archive_subtree_is_archived() {
        let mut tree = TagTree::new();
        let old = tree.ensure_group_path("Archive/old").unwrap();
        let work = tree.ensure_group_path("work").unwrap();

        assert!(tree.is_archived(tree.archive()));
        assert!(tree.is_archived(old));
        assert!(!tree.is_archived(work));
    }

    // ===========================================
    // Phase 5: Note links
    // ===========================================

    #[test]
    fn link_and_unlink_note() {
        let (mut tree, work) = tree_with_group("work");
        tree.link_note(work, "[work] a.htm");
        assert_eq!(tree.node(work).unwrap().note_count(), 1);

        tree.unlink_note(work, "[work] a.htm");
        assert_eq!(tree.node(work).unwrap().note_count(), 0);
    }

    #[test]
    fn rekey_note_updates_every_tag() {
        let (mut tree, work) = tree_with_group("work");
        let all = tree.all();
        tree.link_note(work, "[work] a.htm");
        tree.link_note(all, "[work] a.htm");

        tree.rekey_note("[work] a.htm", "[work] b.htm");

        assert!(tree.node(work).unwrap().has_note("[work] b.htm"));
        assert!(tree.node(all).unwrap().has_note("[work] b.htm"));
        assert!(!tree.node(work).unwrap().has_note("[work] a.htm"));
    }

    #[test]
    fn clear_note_links_empties_all_tags() {
        let (mut tree, work) = tree_with_group("work");
        let all = tree.all();
        tree.link_note(work, "x.htm");
        tree.link_note(all, "x.htm");

        tree.clear_note_links();

        assert_eq!(tree.node(work).unwrap().note_count(), 0);
        assert_eq!(tree.node(all).unwrap().note_count(), 0);
    }

    // ===========================================
    // Phase 6: Merge
    // ===========================================

    #[test]
    fn merge_moves_notes_and_removes_source() {
        let mut tree = TagTree::new();
        let a = tree.ensure_group_path("a").unwrap();
        let b = tree.ensure_group_path("b").unwrap();
        tree.link_note(a, "[a] one.htm");
        tree.link_note(b, "[b] two.htm");

        tree.merge_into(a, b).unwrap();

        assert!(tree.node(a).is_none());
        assert_eq!(tree.node(b).unwrap().note_count(), 2);
        assert!(tree.validate().is_empty());
    }

    #[test]
    fn merge_recursively_combines_same_named_children() {
        let mut tree = TagTree::new();
        let a = tree.ensure_group_path("a").unwrap();
        let a_sub = tree.ensure_group_path("a/sub").unwrap();
        let b = tree.ensure_group_path("b").unwrap();
        let b_sub = tree.ensure_group_path("b/sub").unwrap();
        tree.link_note(a_sub, "[a/sub] one.htm");

        tree.merge_into(a, b).unwrap();

        assert!(tree.node(a).is_none());
        assert!(tree.node(a_sub).is_none());
        assert!(tree.node(b_sub).unwrap().has_note("[a/sub] one.htm"));
        assert!(tree.validate().is_empty());
    }

    #[test]
    fn merge_reparents_unique_children() {
        let mut tree = TagTree::new();
        let a = tree.ensure_group_path("a").unwrap();
        let a_only = tree.ensure_group_path("a/only").unwrap();
        let b = tree.ensure_group_path("b").unwrap();

        tree.merge_into(a, b).unwrap();

        assert_eq!(tree.node(a_only).unwrap().parent(), Some(b));
        assert!(tree.validate().is_empty());
    }

    // ===========================================
    // Phase 7: Labels and listings
    // ===========================================

    #[test]
    fn find_or_create_label_is_idempotent() {
        let mut tree = TagTree::new();
        let a = tree.find_or_create_label(&name("draft")).unwrap();
        let b = tree.find_or_create_label(&name("draft")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn find_or_create_label_rejects_group_name() {
        let mut tree = TagTree::new();
        tree.ensure_group_path("work").unwrap();
        let result = tree.find_or_create_label(&name("work"));
        assert!(matches!(result, Err(TreeError::DuplicateName { .. })));
    }

    #[test]
    fn find_or_create_label_rejects_reserved() {
        let mut tree = TagTree::new();
        let result = tree.find_or_create_label(&name("All"));
        assert!(matches!(result, Err(TreeError::ReservedName { .. })));
    }

    #[test]
    fn groups_listing_is_depth_first_and_skips_not_grouped() {
        let mut tree = TagTree::new();
        tree.ensure_group_path("work/alpha").unwrap();
        tree.ensure_group_path("home").unwrap();

        let paths: Vec<String> = tree.groups().into_iter().map(|(_, p)| p).collect();
        assert!(paths.contains(&"Archive".to_string()));
        assert!(paths.contains(&"work".to_string()));
        assert!(paths.contains(&"work/alpha".to_string()));
        assert!(paths.contains(&"home".to_string()));
        assert!(!paths.iter().any(|p| p.contains("Not Grouped")));

        let work_pos = paths.iter().position(|p| p == "work").unwrap();
        let alpha_pos = paths.iter().position(|p| p == "work/alpha").unwrap();
        assert!(work_pos < alpha_pos);
    }

    #[test]
    fn labels_listing_excludes_all() {
        let mut tree = TagTree::new();
        tree.find_or_create_label(&name("draft")).unwrap();

        let labels = tree.labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(tree.name(labels[0]).unwrap().as_str(), "draft");
    }

    // ===========================================
    // Phase 8: Validation
    // ===========================================

    #[test]
    fn fresh_tree_validates_clean() {
        assert!(TagTree::new().validate().is_empty());
    }

    #[test]
    fn mutated_tree_validates_clean() {
        let mut tree = TagTree::new();
        let work = tree.ensure_group_path("work/projects/alpha").unwrap();
        tree.create(tree.root(), name("home"), TagKind::Group).unwrap();
        tree.find_or_create_label(&name("draft")).unwrap();
        tree.rename(work, name("beta")).unwrap();

        assert!(tree.validate().is_empty());
    }
}
