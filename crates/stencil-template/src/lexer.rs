/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive scanner.
//!
//! Walks template markup and splits it into inert literal spans and raw
//! `${…}` directives. The scanner only understands three things about its
//! input: `\${` is an escaped literal, a directive's closing `}` must not
//! cross a tag boundary, and quoted strings inside a directive may contain
//! `}` and `<` freely.

use crate::ast::Span;
use crate::error::{TemplateError, TemplateResult};
use crate::xmltext::decode_entities;

/// A raw directive as found in the source, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDirective {
    /// Decoded content between `${` and `}`, zero-width characters removed.
    pub content: String,
    /// The raw source slice between `${` and `}`, untouched.
    pub raw: String,
    /// Byte range of the whole `${…}` in the source.
    pub span: Span,
}

/// One scanned segment: either inert markup or a directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal { text: String, span: Span },
    Directive(RawDirective),
}

/// Invisible characters Word likes to drop into text runs.
fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

/// Scan markup into literal and directive segments.
pub fn scan(source: &str) -> TemplateResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut literal_start = 0usize;
    let mut pos = 0usize;

    while let Some(found) = source[pos..].find("${") {
        let open = pos + found;

        // `\${` emits a literal `${` with the backslash dropped.
        if open > 0 && source.as_bytes()[open - 1] == b'\\' {
            literal.push_str(&source[pos..open - 1]);
            literal.push_str("${");
            pos = open + 2;
            continue;
        }

        literal.push_str(&source[pos..open]);
        if !literal.is_empty() {
            segments.push(Segment::Literal {
                text: std::mem::take(&mut literal),
                span: Span::new(literal_start, open),
            });
        }

        let close = find_closing_brace(source, open)?;
        let raw = &source[open + 2..close];
        let content: String = decode_entities(raw)
            .chars()
            .filter(|c| !is_zero_width(*c))
            .collect();

        segments.push(Segment::Directive(RawDirective {
            content,
            raw: raw.to_string(),
            span: Span::new(open, close + 1),
        }));

        pos = close + 1;
        literal_start = pos;
    }

    literal.push_str(&source[pos..]);
    if !literal.is_empty() {
        segments.push(Segment::Literal {
            text: literal,
            span: Span::new(literal_start, source.len()),
        });
    }

    Ok(segments)
}

/// Find the `}` closing the directive opened at `open` (pointing at `$`).
///
/// Quoted strings may contain `}` and `<`. An unquoted `<` means the
/// directive runs into markup, which after normalization only happens when
/// the author broke the directive across a paragraph or table cell.
fn find_closing_brace(source: &str, open: usize) -> TemplateResult<usize> {
    let mut quote: Option<char> = None;
    let mut prev_backslash = false;

    for (i, c) in source[open + 2..].char_indices() {
        let at = open + 2 + i;
        match quote {
            Some(q) => {
                if prev_backslash {
                    prev_backslash = false;
                } else if c == '\\' {
                    prev_backslash = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '}' => return Ok(at),
                '<' => return Err(TemplateError::DirectiveSpansBlock { offset: open }),
                _ => {}
            },
        }
    }

    Err(TemplateError::UnterminatedDirective { offset: open })
}
