//! Note metadata stored in the leading comment block of each file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::TagName;

fn default_charset() -> String {
    "utf-8".to_string()
}

/// One entry in a note's version history, appended on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub author: String,
    pub saved: DateTime<Utc>,
}

/// Machine-generated metadata carried at the top of every note file.
///
/// Serialized as YAML inside the leading HTML comment; every field is
/// optional on read so externally-created files parse with defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMeta {
    /// Everyone who has saved this note, in first-save order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    /// Tag names this note carries, in addition to its single group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagName>,

    /// Save history, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<VersionEntry>,

    /// Relative paths of attachment files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,

    /// Character set marker written into the HTML skeleton.
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl Default for NoteMeta {
    fn default() -> Self {
        Self {
            authors: Vec::new(),
            tags: Vec::new(),
            versions: Vec::new(),
            attachments: Vec::new(),
            charset: default_charset(),
        }
    }
}

impl NoteMeta {
    /// Records a save: appends a version entry and registers the author.
    pub fn record_save(&mut self, author: &str, at: DateTime<Utc>) {
        if !self.authors.iter().any(|a| a == author) {
            self.authors.push(author.to_string());
        }
        self.versions.push(VersionEntry {
            author: author.to_string(),
            saved: at,
        });
    }

    /// Adds a tag name if not already present. Returns whether it was added.
    pub fn add_tag(&mut self, tag: TagName) -> bool {
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Removes a tag name. Returns whether it was present.
    pub fn remove_tag(&mut self, tag: &TagName) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }
}
