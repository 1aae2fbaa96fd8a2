//! Error types for container and markup handling.

use thiserror::Error;

/// Result type alias for stencil-ooxml operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Errors that can occur while reading, repairing or writing a document
/// container.
#[derive(Debug, Error)]
pub enum OoxmlError {
    /// The input is smaller than any plausible document archive.
    #[error("container too small: {size} bytes")]
    TooSmall { size: usize },

    /// The input exceeds the accepted archive size.
    #[error("container too large: {size} bytes")]
    TooLarge { size: usize },

    /// The input is not a recognizable document archive.
    #[error("not a recognized document container: {reason}")]
    InvalidContainer { reason: String },

    /// A mandatory part is absent from the archive.
    #[error("required part '{name}' is missing")]
    MissingPart { name: String },

    /// A part exists but its content cannot be used.
    #[error("part '{name}' is corrupted: {reason}")]
    CorruptedPart { name: String, reason: String },

    /// I/O failure while packing or unpacking.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
