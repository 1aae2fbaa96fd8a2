//! Word-format container handling for the stencil templating engine.
//!
//! This crate owns the byte-level half of the pipeline: opening and
//! repacking the ZIP container, repairing run fragmentation so directives
//! survive authoring-tool splits, and removing table rows left empty by
//! loop expansion. It knows nothing about the directive language itself.

pub mod archive;
pub mod error;
pub mod normalize;
pub mod rows;

pub use archive::{Archive, CONTENT_TYPES_PART, MAIN_DOCUMENT_PART, RELATIONSHIPS_PART};
pub use error::{OoxmlError, Result};
pub use normalize::{normalize, DEFAULT_MAX_MERGE_ITERATIONS};
pub use rows::remove_empty_rows;
