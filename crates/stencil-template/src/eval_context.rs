/*
 * eval_context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Evaluation context for template rendering.
//!
//! [`EvalContext`] is threaded through the executor to collect diagnostics,
//! carry the render clock, and hold evaluation options. Warnings do not stop
//! a render; in strict mode they are recorded as errors instead.

use chrono::{DateTime, Utc};

/// Severity of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Warning,
    Error,
}

/// One diagnostic collected during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Byte offset of the offending directive in the template source.
    pub offset: Option<usize>,
}

/// Collector for diagnostics produced while rendering.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn warn_at(&mut self, message: impl Into<String>, offset: Option<usize>) {
        let message = message.into();
        tracing::warn!(?offset, "{}", message);
        self.add(Diagnostic {
            kind: DiagnosticKind::Warning,
            message,
            offset,
        });
    }

    pub fn error_at(&mut self, message: impl Into<String>, offset: Option<usize>) {
        self.add(Diagnostic {
            kind: DiagnosticKind::Error,
            message: message.into(),
            offset,
        });
    }

    /// Check if any errors were collected (warnings don't count).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Consume the collector, sorted by source offset.
    pub fn into_diagnostics(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| d.offset.unwrap_or(0));
        self.diagnostics
    }
}

/// Context threaded through template evaluation.
pub struct EvalContext {
    /// Collected warnings and errors.
    pub diagnostics: DiagnosticCollector,

    /// The render clock, captured once so one render is internally
    /// consistent. Only `fromNow` and the `_meta.generatedAt` stamp read it.
    pub now: DateTime<Utc>,

    /// Strict mode: record warnings as errors.
    pub strict_mode: bool,
}

impl EvalContext {
    pub fn new() -> Self {
        Self {
            diagnostics: DiagnosticCollector::new(),
            now: Utc::now(),
            strict_mode: false,
        }
    }

    /// Pin the render clock, for deterministic output in tests.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Enable or disable strict mode.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Record a warning, or an error in strict mode.
    pub fn warn_at(&mut self, message: impl Into<String>, offset: Option<usize>) {
        if self.strict_mode {
            self.diagnostics.error_at(message, offset);
        } else {
            self.diagnostics.warn_at(message, offset);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_diagnostics()
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
