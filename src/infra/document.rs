//! Note file format: a leading metadata comment followed by an HTML shell.
//!
//! Every file this system writes starts with a machine-generated HTML
//! comment holding YAML metadata, then a minimal document skeleton wrapping
//! the body:
//!
//! ```text
//! <!--nook
//! authors:
//!   - alice
//! charset: utf-8
//! -->
//! <!DOCTYPE html>
//! <html>
//! <head>
//! <meta charset="utf-8">
//! </head>
//! <body>…</body>
//! </html>
//! ```
//!
//! Files created by other programs (a cloud-sync peer, a browser "save as")
//! may lack the comment entirely; those parse with default metadata.

use thiserror::Error;

use crate::domain::NoteMeta;

const META_OPEN: &str = "<!--nook";
const META_CLOSE: &str = "-->";

/// Result of parsing a note file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub meta: NoteMeta,
    pub body: String,
}

/// Errors during note document parsing.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("metadata comment is never closed with '-->'")]
    UnclosedMetadata,

    #[error("invalid YAML in metadata comment: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Parses a note file into metadata and body.
///
/// A file without the metadata comment parses with `NoteMeta::default()`
/// and its whole content as body. The body is the inner text of the
/// `<body>` element when the skeleton is present, otherwise everything
/// after the metadata comment.
///
/// # Errors
///
/// Returns `DocumentError::UnclosedMetadata` if the comment opens but never
/// closes, and `DocumentError::InvalidYaml` if the metadata doesn't parse.
pub fn parse(content: &str) -> Result<ParsedDocument, DocumentError> {
    let (meta, rest) = if let Some(after_open) = strip_meta_open(content) {
        let close = find_meta_close(after_open).ok_or(DocumentError::UnclosedMetadata)?;
        let yaml = &after_open[..close];
        let meta = if yaml.trim().is_empty() {
            NoteMeta::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        let rest = &after_open[close + META_CLOSE.len()..];
        (meta, rest.strip_prefix('\n').unwrap_or(rest))
    } else {
        (NoteMeta::default(), content)
    };

    Ok(ParsedDocument {
        meta,
        body: extract_body(rest),
    })
}

/// Serializes metadata and body into the full file content.
pub fn serialize(meta: &NoteMeta, body: &str) -> String {
    let yaml = serde_yaml::to_string(meta).expect("metadata serialization is infallible");
    format!(
        "{}\n{}{}\n<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"{}\">\n</head>\n<body>{}</body>\n</html>\n",
        META_OPEN, yaml, META_CLOSE, meta.charset, body
    )
}

/// Strips the opening delimiter line, returning the text after it.
fn strip_meta_open(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(META_OPEN)?;
    // The delimiter must be a whole line.
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Finds the closing delimiter at the start of a line.
fn find_meta_close(content: &str) -> Option<usize> {
    if content.starts_with(META_CLOSE) {
        return Some(0);
    }
    content
        .find(&format!("\n{}", META_CLOSE))
        .map(|pos| pos + 1)
}

/// Extracts the inner text of the `<body>` element, or the whole remainder
/// when no skeleton is present.
fn extract_body(rest: &str) -> String {
    if let Some(open) = rest.find("<body>")
        && let Some(close) = rest.rfind("</body>")
        && open + "<body>".len() <= close
    {
        return rest[open + "<body>".len()..close].to_string();
    }
    rest.to_string()
}
