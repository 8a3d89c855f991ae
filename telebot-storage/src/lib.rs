//! Storage crate: byte-stream file store keyed by hierarchical paths.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`file_store`] – FileStore rooted at a mount directory
//! - [`kind`] – FileKind classification by extension

mod error;
mod file_store;
mod kind;

pub use error::StorageError;
pub use file_store::{EntryInfo, FileStore};
pub use kind::{FileKind, SUPPORTED_EXTENSIONS};
