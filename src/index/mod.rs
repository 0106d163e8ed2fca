//! The file-backed index, filename codec, and mutation engine.

pub mod engine;
pub mod filename;
mod store;

pub use engine::{EngineError, EngineResult};
pub use store::{GroupRenameOutcome, NoteStore, ScanIssue, ScanReport, StoreError, StoreResult};
