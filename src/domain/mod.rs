//! Core types: NoteName, TagName, NoteMeta, Note, and the tag tree.

mod meta;
mod note;
mod note_name;
pub mod tag_name;
mod tree;

pub use meta::{NoteMeta, VersionEntry};
pub use note::{Note, NoteContent, NotLoaded};
pub use note_name::{NoteName, ParseNoteNameError};
pub use tag_name::{ParseTagNameError, TagName};
pub use tree::{TagId, TagKind, TagMatch, TagNode, TagTree, TreeError};
