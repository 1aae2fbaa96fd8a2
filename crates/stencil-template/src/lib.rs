/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive-language engine for the stencil document templating system.
//!
//! This crate owns the text-level half of the pipeline: it scans markup for
//! `${…}` directives, parses them into a nested tree, evaluates expressions
//! against a scope chain rooted in the caller's data, applies formatter
//! pipelines, and emits the rendered text. It supports:
//!
//! - Variable interpolation: `${user.name}`, `${items[0]}`
//! - Conditionals: `${#if expr}…${#else}…${/if}`
//! - Loops: `${#each items}…${/each}` with `this`, `index`, `first`,
//!   `last`, `count` and `parent` bound per iteration
//! - Formatter pipelines: `${total|currency:USD|bold}`
//!
//! # Architecture
//!
//! The engine is independent of any container format. It sees markup as an
//! opaque string with directives embedded in text; the surrounding crates
//! handle archives and markup normalization. Expressions are a closed
//! grammar evaluated by a typed interpreter; no host-language evaluation
//! happens anywhere.
//!
//! # Example
//!
//! ```ignore
//! use stencil_template::{EvalContext, Template, Value};
//!
//! let template = Template::compile("Hello, ${name}!")?;
//! let data = Value::from_json(&serde_json::json!({"name": "World"}));
//! let mut ctx = EvalContext::new();
//! assert_eq!(template.render(&data, &mut ctx), "Hello, World!");
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod eval_context;
pub mod evaluator;
pub mod expr;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod xmltext;

// Re-export main types at crate root
pub use ast::{EachNode, ExprSlot, FormatterCall, IfNode, InterpNode, LiteralNode, Node, Span};
pub use context::{Frame, Scope};
pub use error::{BlockKind, TemplateError, TemplateResult};
pub use eval_context::{Diagnostic, DiagnosticCollector, DiagnosticKind, EvalContext};
pub use parser::Template;
pub use value::{Style, Value};
