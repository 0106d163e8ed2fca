//! The filename codec: `(group, name)` pairs to bracketed filenames.
//!
//! Grouped notes encode as `[group/path] Name.htm`, ungrouped notes as
//! `Name.htm`. Every filename this system writes round-trips exactly
//! through decode-then-encode.

use crate::domain::NoteName;

/// Extension of every note file.
pub const NOTE_EXTENSION: &str = "htm";

/// A filename split back into its group path and note name.
///
/// Both parts are raw strings: scan-side tolerance means decode never
/// rejects, and validation happens when the parts are turned into domain
/// types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFilename {
    /// Slash-joined group path, or `None` for ungrouped notes.
    pub group_path: Option<String>,
    /// Note name (the stem, without the extension).
    pub name: String,
}

/// Encodes a group path and note name into a filename.
pub fn encode(group_path: Option<&str>, name: &NoteName) -> String {
    encode_raw(group_path, name.as_str())
}

/// Encodes raw parts into a filename. Used when staging renames where the
/// parts are already known-valid.
pub fn encode_raw(group_path: Option<&str>, name: &str) -> String {
    match group_path {
        Some(path) => format!("[{}] {}.{}", path, name, NOTE_EXTENSION),
        None => format!("{}.{}", name, NOTE_EXTENSION),
    }
}

/// Decodes a filename into group path and note name.
///
/// The group path is the substring between the first `[` and the first `]`
/// when the filename starts with `[` and the separator `"] "` is present;
/// otherwise the note is ungrouped. The name runs to the final `.`. Group
/// paths may contain any character except the brackets themselves.
pub fn decode(filename: &str) -> DecodedFilename {
    if let Some(rest) = filename.strip_prefix('[')
        && let Some(close) = rest.find(']')
        && let Some(name_ext) = rest[close + 1..].strip_prefix(' ')
    {
        let group = &rest[..close];
        let name = strip_extension(name_ext);
        if !group.is_empty() && !name.is_empty() {
            return DecodedFilename {
                group_path: Some(group.to_string()),
                name: name.to_string(),
            };
        }
    }

    DecodedFilename {
        group_path: None,
        name: strip_extension(filename).to_string(),
    }
}

/// Returns the stem before the final `.`, or the whole string when there is
/// no extension.
fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    }
}

/// Rewrites a group path when the group at `old` becomes `new`.
///
/// Returns `None` when `path` is neither `old` itself nor inside it. The
/// match is at segment boundaries: `work` covers `work/plans` but not
/// `workshop`.
pub fn rebase_group_path(path: &str, old: &str, new: Option<&str>) -> Option<String> {
    if path == old {
        return Some(new.map(str::to_string).unwrap_or_default());
    }
    let suffix = path.strip_prefix(old)?.strip_prefix('/')?;
    Some(match new {
        Some(new) => format!("{}/{}", new, suffix),
        None => suffix.to_string(),
    })
}
