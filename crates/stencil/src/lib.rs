//! Word-document templating engine.
//!
//! stencil transforms a Word-format document (a ZIP archive of XML parts)
//! and a structured data object into a new document with the data
//! interpolated into the template's textual slots, loops expanded,
//! conditionals evaluated and formatter pipelines applied.
//!
//! # Entry points
//!
//! - [`render`]: one template, one data object, rendered bytes out.
//! - [`render_batch`]: one template against many datasets, with batching.
//! - [`validate`]: static inspection of directives, problems, statistics.
//!
//! ```ignore
//! let data = serde_json::json!({"users": [{"name": "Alice", "score": 95}]});
//! let output = stencil::render(&template_bytes, &data, &stencil::Config::default())?;
//! ```
//!
//! # Template language
//!
//! Directives are `${…}` constructs in the document text:
//!
//! - `${user.name}`, `${items[0].price|currency:EUR}`
//! - `${#if total >= 1000}…${#else}…${/if}`
//! - `${#each users}${this.name} (${index})${/each}`
//!
//! Inside a loop, `this`, `index`, `first`, `last`, `count` and `parent`
//! are bound per iteration; `parent` chains walk outward through nested
//! loops. Loop iterations concatenate directly, so bodies carry their own
//! separators. Expressions are a closed grammar; no host-language
//! evaluation happens anywhere.
//!
//! # Surrounding services
//!
//! The engine is transport- and storage-agnostic. Callers typically pair it
//! with: a transport layer multiplexing render/validate/batch calls, a
//! template registry resolving ids to raw archive bytes, and a structured
//! log sink recording per-render outcomes. None of those live here; the
//! facade functions take and return plain bytes so any of them can sit on
//! top.

pub mod config;
pub mod error;
pub mod render;
pub mod validate;

pub use config::{Config, StylingEmit};
pub use error::{Error, Result};
pub use render::{render, render_batch, render_with_diagnostics, BatchItem, BatchOptions};
pub use validate::{validate, DirectiveInfo, Statistics, ValidationReport};

// Re-export the engine types callers interact with.
pub use stencil_template::{Diagnostic, DiagnosticKind, Value};
