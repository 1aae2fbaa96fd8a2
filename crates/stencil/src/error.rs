//! Top-level error type for the rendering facade.

use thiserror::Error;

/// Result type alias for stencil operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the rendering facade.
///
/// Container and parse errors abort a render. Expression and formatter
/// problems never appear here: they render as inline `[ERROR: …]` markers
/// plus warnings so the rest of the document still comes out.
#[derive(Debug, Error)]
pub enum Error {
    /// Archive-level failure: bad container, size bounds, missing or
    /// corrupted parts.
    #[error(transparent)]
    Container(#[from] stencil_ooxml::OoxmlError),

    /// Parse-level failure in the directive language.
    #[error(transparent)]
    Template(#[from] stencil_template::TemplateError),

    /// The caller's data payload was rejected.
    #[error("input data invalid: {reason}")]
    InputDataInvalid { reason: String },
}
