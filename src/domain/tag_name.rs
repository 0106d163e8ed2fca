//! Validated tag/group name type and the reserved names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::note_name::ILLEGAL_NAME_CHARS;

/// Name of the aggregate tag that links every note.
pub const ALL: &str = "All";

/// Name of the bucket for notes without a group prefix.
pub const NOT_GROUPED: &str = "Not Grouped";

/// Name of the archive group; archived notes are hidden from link
/// suggestions.
pub const ARCHIVE: &str = "Archive";

/// A single tag or group name.
///
/// Group names are embedded in filenames as the bracketed prefix, so the
/// validation rules match [`NoteName`](crate::domain::NoteName): no
/// filesystem-illegal characters, no brackets, no control characters. Nested
/// group paths are built by joining names with `/`, which the character
/// rules already keep out of any single name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TagName(String);

/// Error returned when parsing an invalid tag name.
#[derive(Debug, Clone)]
pub struct ParseTagNameError(String);

impl fmt::Display for ParseTagNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseTagNameError {}

impl TagName {
    /// Creates a new TagName from a string.
    ///
    /// Surrounding whitespace is trimmed; case is preserved.
    ///
    /// # Errors
    ///
    /// Returns `ParseTagNameError` if the name is empty, contains a
    /// filesystem-illegal character, a bracket, or a control character.
    pub fn new(s: &str) -> Result<Self, ParseTagNameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ParseTagNameError("tag name cannot be empty".to_string()));
        }

        if let Some(c) = trimmed
            .chars()
            .find(|c| ILLEGAL_NAME_CHARS.contains(c) || (*c as u32) < 32)
        {
            return Err(ParseTagNameError(format!(
                "invalid tag name '{}': character '{}' is not allowed",
                trimmed,
                c.escape_default()
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this is one of the reserved names (`All`,
    /// `Not Grouped`, `Archive`).
    pub fn is_reserved(&self) -> bool {
        self.0 == ALL || self.0 == NOT_GROUPED || self.0 == ARCHIVE
    }

    /// Returns whether two names differ only by ASCII case.
    pub fn eq_ignore_case(&self, other: &TagName) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagName(\"{}\")", self.0)
    }
}

impl FromStr for TagName {
    type Err = ParseTagNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for TagName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TagName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
