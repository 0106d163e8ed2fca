//! Validated note name type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters that cannot appear in a note or group name.
///
/// `< > : " / \ | ? *` are illegal in filenames on at least one supported
/// platform; `[` and `]` delimit the group prefix in encoded filenames.
pub(crate) const ILLEGAL_NAME_CHARS: &[char] =
    &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']'];

/// A note's display name, which doubles as the stem of its filename.
///
/// Because the name is embedded verbatim in the on-disk filename, it must be
/// legal on every supported filesystem and must not contain the group
/// delimiter characters.
///
/// # Validation Rules
/// - Non-empty after trimming
/// - No `< > : " / \ | ? *`, `[`, or `]`
/// - No control characters (0–31)
///
/// # Examples
///
/// ```
/// use nook::domain::NoteName;
///
/// let name = NoteName::new("Meeting Notes").unwrap();
/// assert_eq!(name.as_str(), "Meeting Notes");
///
/// assert!(NoteName::new("a/b").is_err());
/// assert!(NoteName::new("[draft]").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NoteName(String);

/// Error returned when parsing an invalid note name.
#[derive(Debug, Clone)]
pub struct ParseNoteNameError(String);

impl fmt::Display for ParseNoteNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseNoteNameError {}

impl NoteName {
    /// Creates a new NoteName from a string.
    ///
    /// Surrounding whitespace is trimmed; case is preserved.
    ///
    /// # Errors
    ///
    /// Returns `ParseNoteNameError` if the name is empty, contains a
    /// filesystem-illegal character, a bracket, or a control character.
    pub fn new(s: &str) -> Result<Self, ParseNoteNameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ParseNoteNameError("note name cannot be empty".to_string()));
        }

        if let Some(c) = trimmed
            .chars()
            .find(|c| ILLEGAL_NAME_CHARS.contains(c) || (*c as u32) < 32)
        {
            return Err(ParseNoteNameError(format!(
                "invalid note name '{}': character '{}' is not allowed",
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

    /// Returns whether two names differ only by ASCII case.
    ///
    /// Case-only renames are legal even on case-insensitive filesystems and
    /// must not be mistaken for collisions.
    pub fn eq_ignore_case(&self, other: &NoteName) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteName(\"{}\")", self.0)
    }
}

impl FromStr for NoteName {
    type Err = ParseNoteNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for NoteName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NoteName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ===========================================
    // Phase 1: Validation
    // ===========================================

    #[test]
    fn new_with_valid_name() {
        let name = NoteName::new("Meeting Notes").unwrap();
        assert_eq!(name.as_str(), "Meeting Notes");
    }

    #[test]
    fn new_rejects_empty() {
        assert!(NoteName::new("").is_err());
        assert!(NoteName::new("   ").is_err());
    }

    #[test]
    fn new_trims_whitespace() {
        let name = NoteName::new("  Plans  ").unwrap();
        assert_eq!(name.as_str(), "Plans");
    }

    #[test]
    fn new_rejects_filesystem_illegal_chars() {
        for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
            let candidate = format!("bad{}name", c);
            assert!(
                NoteName::new(&candidate).is_err(),
                "'{}' should be rejected",
                candidate
            );
        }
    }

    #[test]
    fn new_rejects_brackets() {
        assert!(NoteName::new("[draft]").is_err());
        assert!(NoteName::new("a]b").is_err());
    }

    #[test]
    fn new_rejects_control_chars() {
        assert!(NoteName::new("a\tb").is_err());
        assert!(NoteName::new("a\nb").is_err());
    }

    #[test]
    fn new_allows_dots_and_unicode() {
        assert!(NoteName::new("v2.0 release").is_ok());
        assert!(NoteName::new("日記").is_ok());
    }

    #[test]
    fn error_names_offending_character() {
        let err = NoteName::new("a|b").unwrap_err();
        assert!(err.to_string().contains('|'));
    }

    // ===========================================
    // Phase 2: Case handling
    // ===========================================

    #[test]
    fn case_is_preserved() {
        let name = NoteName::new("ToDo").unwrap();
        assert_eq!(name.as_str(), "ToDo");
    }

    #[test]
    fn equality_is_case_sensitive() {
        let a = NoteName::new("foo").unwrap();
        let b = NoteName::new("FOO").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn eq_ignore_case_matches_case_variants() {
        let a = NoteName::new("foo").unwrap();
        let b = NoteName::new("FOO").unwrap();
        assert!(a.eq_ignore_case(&b));
    }

    // ===========================================
    // Phase 3: Display, FromStr, Serde
    // ===========================================

    #[test]
    fn display_shows_name() {
        let name = NoteName::new("Plans").unwrap();
        assert_eq!(format!("{}", name), "Plans");
    }

    #[test]
    fn debug_format() {
        let name = NoteName::new("Plans").unwrap();
        assert_eq!(format!("{:?}", name), "NoteName(\"Plans\")");
    }

    #[test]
    fn parse_via_fromstr() {
        let name: NoteName = "Plans".parse().unwrap();
        assert_eq!(name.as_str(), "Plans");
    }

    #[test]
    fn serde_roundtrip() {
        let name = NoteName::new("Plans").unwrap();
        let yaml = serde_yaml::to_string(&name).unwrap();
        let parsed: NoteName = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(name, parsed);
    }

    #[test]
    fn serde_rejects_invalid_on_deserialize() {
        let result: Result<NoteName, _> = serde_yaml::from_str("'a/b'\n");
        assert!(result.is_err());
    }
}
