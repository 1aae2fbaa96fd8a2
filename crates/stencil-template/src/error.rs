/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing.
//!
//! Parse errors abort a render. Expression and formatter problems do not
//! appear here: they are scoped to the offending node at evaluation time and
//! surface as diagnostics plus an inline `[ERROR: …]` marker.

use thiserror::Error;

/// The kind of block construct an opener introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    Each,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::If => write!(f, "#if"),
            BlockKind::Each => write!(f, "#each"),
        }
    }
}

/// Errors that can occur while parsing a template body.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// A `${` was opened but the matching `}` crosses a markup boundary,
    /// which happens when the author split a directive across a paragraph.
    #[error("directive at byte {offset} spans a block boundary")]
    DirectiveSpansBlock { offset: usize },

    /// A `${` was opened and never closed.
    #[error("unterminated directive at byte {offset}")]
    UnterminatedDirective { offset: usize },

    /// A `${#…}` or `${/…}` keyword the grammar does not know.
    #[error("unknown keyword '{keyword}' at byte {offset}")]
    UnknownKeyword { keyword: String, offset: usize },

    /// Unbalanced parentheses inside a condition or expression.
    #[error("unbalanced parentheses in expression at byte {offset}")]
    UnbalancedParen { offset: usize },

    /// A block opener with no matching closer.
    #[error("missing closer for {kind} opened at byte {opened_at}")]
    MissingCloser { kind: BlockKind, opened_at: usize },

    /// A closer with no matching opener.
    #[error("closer for {kind} at byte {offset} has no matching opener")]
    UnexpectedCloser { kind: BlockKind, offset: usize },

    /// `${#else}` outside any `${#if}` block.
    #[error("#else at byte {offset} is outside any #if block")]
    ElseOutsideIf { offset: usize },

    /// `${#each}` with no iterable path.
    #[error("#each at byte {offset} names no target")]
    EmptyEachTarget { offset: usize },
}

/// Result type for template parsing.
pub type TemplateResult<T> = Result<T, TemplateError>;
