/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive parser.
//!
//! Classifies scanned directives and builds the nested directive tree.
//! Block structure is strict: openers and closers must nest, a closer
//! always matches the innermost unmatched opener, and `#else` is only
//! legal directly inside an `#if`.

use crate::ast::{EachNode, ExprSlot, FormatterCall, IfNode, InterpNode, LiteralNode, Node, Span};
use crate::error::{BlockKind, TemplateError, TemplateResult};
use crate::expr::{self, ExprError};
use crate::lexer::{self, Segment};

/// A compiled template body ready for evaluation.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
    source: String,
}

impl Template {
    /// Compile a template from normalized markup.
    pub fn compile(source: &str) -> TemplateResult<Self> {
        let segments = lexer::scan(source)?;
        let nodes = build_tree(segments)?;
        Ok(Template {
            nodes,
            source: source.to_string(),
        })
    }

    /// The parsed directive tree.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The markup this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// What a directive's content turned out to be.
enum Classified {
    Interp {
        expr: ExprSlot,
        source: String,
        formatters: Vec<FormatterCall>,
    },
    IfOpen {
        cond: ExprSlot,
        source: String,
    },
    Else,
    EachOpen {
        target: ExprSlot,
        source: String,
    },
    IfClose,
    EachClose,
}

/// An open block on the builder stack.
struct OpenBlock {
    kind: OpenKind,
    children: Vec<Node>,
}

enum OpenKind {
    If {
        cond: ExprSlot,
        source: String,
        /// Set once `#else` is seen; holds the then-branch.
        then_done: Option<Vec<Node>>,
        open: Span,
    },
    Each {
        target: ExprSlot,
        source: String,
        open: Span,
    },
}

impl OpenKind {
    fn block_kind(&self) -> BlockKind {
        match self {
            OpenKind::If { .. } => BlockKind::If,
            OpenKind::Each { .. } => BlockKind::Each,
        }
    }

    fn opened_at(&self) -> usize {
        match self {
            OpenKind::If { open, .. } => open.start,
            OpenKind::Each { open, .. } => open.start,
        }
    }
}

fn build_tree(segments: Vec<Segment>) -> TemplateResult<Vec<Node>> {
    let mut out: Vec<Node> = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();

    fn push_node(out: &mut Vec<Node>, stack: &mut [OpenBlock], node: Node) {
        if let Some(top) = stack.last_mut() {
            top.children.push(node);
        } else {
            out.push(node);
        }
    }

    for segment in segments {
        match segment {
            Segment::Literal { text, span } => {
                push_node(&mut out, &mut stack, Node::Literal(LiteralNode { text, span }));
            }
            Segment::Directive(raw) => {
                let span = raw.span;
                match classify(&raw.content, span)? {
                    Classified::Interp {
                        expr,
                        source,
                        formatters,
                    } => {
                        push_node(
                            &mut out,
                            &mut stack,
                            Node::Interp(InterpNode {
                                expr,
                                source,
                                formatters,
                                span,
                            }),
                        );
                    }
                    Classified::IfOpen { cond, source } => {
                        stack.push(OpenBlock {
                            kind: OpenKind::If {
                                cond,
                                source,
                                then_done: None,
                                open: span,
                            },
                            children: Vec::new(),
                        });
                    }
                    Classified::EachOpen { target, source } => {
                        stack.push(OpenBlock {
                            kind: OpenKind::Each {
                                target,
                                source,
                                open: span,
                            },
                            children: Vec::new(),
                        });
                    }
                    Classified::Else => {
                        let top = stack.last_mut().ok_or(TemplateError::ElseOutsideIf {
                            offset: span.start,
                        })?;
                        match &mut top.kind {
                            OpenKind::If { then_done, .. } => {
                                if then_done.is_some() {
                                    return Err(TemplateError::ElseOutsideIf {
                                        offset: span.start,
                                    });
                                }
                                *then_done = Some(std::mem::take(&mut top.children));
                            }
                            OpenKind::Each { .. } => {
                                return Err(TemplateError::ElseOutsideIf {
                                    offset: span.start,
                                });
                            }
                        }
                    }
                    Classified::IfClose => {
                        let block = stack.pop().ok_or(TemplateError::UnexpectedCloser {
                            kind: BlockKind::If,
                            offset: span.start,
                        })?;
                        match block.kind {
                            OpenKind::If {
                                cond,
                                source,
                                then_done,
                                open,
                            } => {
                                let (then_branch, else_branch) = match then_done {
                                    Some(then_branch) => (then_branch, Some(block.children)),
                                    None => (block.children, None),
                                };
                                push_node(
                                    &mut out,
                                    &mut stack,
                                    Node::If(IfNode {
                                        cond,
                                        source,
                                        then_branch,
                                        else_branch,
                                        open,
                                        close: span,
                                    }),
                                );
                            }
                            other => {
                                return Err(TemplateError::MissingCloser {
                                    kind: other.block_kind(),
                                    opened_at: other.opened_at(),
                                });
                            }
                        }
                    }
                    Classified::EachClose => {
                        let block = stack.pop().ok_or(TemplateError::UnexpectedCloser {
                            kind: BlockKind::Each,
                            offset: span.start,
                        })?;
                        match block.kind {
                            OpenKind::Each {
                                target,
                                source,
                                open,
                            } => {
                                push_node(
                                    &mut out,
                                    &mut stack,
                                    Node::Each(EachNode {
                                        target,
                                        source,
                                        body: block.children,
                                        open,
                                        close: span,
                                    }),
                                );
                            }
                            other => {
                                return Err(TemplateError::MissingCloser {
                                    kind: other.block_kind(),
                                    opened_at: other.opened_at(),
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    if let Some(block) = stack.last() {
        return Err(TemplateError::MissingCloser {
            kind: block.kind.block_kind(),
            opened_at: block.kind.opened_at(),
        });
    }

    Ok(out)
}

fn classify(content: &str, span: Span) -> TemplateResult<Classified> {
    let trimmed = content.trim();

    if let Some(rest) = trimmed.strip_prefix('#') {
        let (keyword, tail) = split_keyword(rest);
        return match keyword {
            "if" => Ok(Classified::IfOpen {
                cond: parse_expr_slot(tail, span)?,
                source: tail.trim().to_string(),
            }),
            "each" => {
                let target = tail.trim();
                if target.is_empty() {
                    return Err(TemplateError::EmptyEachTarget { offset: span.start });
                }
                Ok(Classified::EachOpen {
                    target: parse_expr_slot(target, span)?,
                    source: target.to_string(),
                })
            }
            "else" if tail.trim().is_empty() => Ok(Classified::Else),
            _ => Err(TemplateError::UnknownKeyword {
                keyword: format!("#{}", keyword),
                offset: span.start,
            }),
        };
    }

    if let Some(rest) = trimmed.strip_prefix('/') {
        return match rest.trim() {
            "if" => Ok(Classified::IfClose),
            "each" => Ok(Classified::EachClose),
            other => Err(TemplateError::UnknownKeyword {
                keyword: format!("/{}", other),
                offset: span.start,
            }),
        };
    }

    // Interpolation: expression plus optional formatter pipeline.
    let mut parts = split_pipes(trimmed);
    let expr_src = parts.remove(0);
    let expr_slot = parse_expr_slot(&expr_src, span)?;

    let mut formatters = Vec::new();
    for part in parts {
        match parse_formatter(&part) {
            Some(call) => formatters.push(call),
            None => {
                return Ok(Classified::Interp {
                    expr: ExprSlot::Invalid {
                        reason: format!("malformed formatter '{}'", part.trim()),
                    },
                    source: trimmed.to_string(),
                    formatters: Vec::new(),
                })
            }
        }
    }

    Ok(Classified::Interp {
        expr: expr_slot,
        source: trimmed.to_string(),
        formatters,
    })
}

/// Parse an expression, escalating parenthesis imbalance to a fatal error
/// and keeping everything else scoped to the node.
fn parse_expr_slot(src: &str, span: Span) -> TemplateResult<ExprSlot> {
    match expr::parse(src.trim()) {
        Ok(expr) => Ok(ExprSlot::Parsed(expr)),
        Err(ExprError::UnbalancedParen) => {
            Err(TemplateError::UnbalancedParen { offset: span.start })
        }
        Err(ExprError::Bad(reason)) => Ok(ExprSlot::Invalid { reason }),
    }
}

/// Split `#keyword tail` where the keyword is the leading word. The tail
/// may start without whitespace, as in `${#if(a && b)}`.
fn split_keyword(rest: &str) -> (&str, &str) {
    match rest.find(|c: char| !c.is_alphanumeric()) {
        Some(at) => (&rest[..at], &rest[at..]),
        None => (rest, ""),
    }
}

/// Split directive content on top-level `|`, leaving `||` to the
/// expression grammar and respecting quoted strings.
fn split_pipes(content: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '|' => {
                    if chars.peek() == Some(&'|') {
                        current.push('|');
                        current.push('|');
                        chars.next();
                    } else {
                        parts.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            },
        }
    }
    parts.push(current);
    parts
}

/// Parse one formatter segment: `name` or `name:arg1:arg2`.
///
/// Arguments are raw text; quoted arguments may contain `:` and `|`.
fn parse_formatter(segment: &str) -> Option<FormatterCall> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in segment.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                ':' => parts.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    parts.push(current);

    let name = parts[0].trim().to_string();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let args = parts[1..].iter().map(|arg| unquote(arg.trim())).collect();
    Some(FormatterCall { name, args })
}

/// Strip one layer of matching quotes, if present.
fn unquote(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_only() {
        let template = Template::compile("just text").unwrap();
        assert_eq!(template.nodes().len(), 1);
        match &template.nodes()[0] {
            Node::Literal(lit) => assert_eq!(lit.text, "just text"),
            _ => panic!("expected literal node"),
        }
    }

    #[test]
    fn test_parse_interp_with_formatters() {
        let template = Template::compile("${total|currency:USD|bold}").unwrap();
        match &template.nodes()[0] {
            Node::Interp(interp) => {
                assert!(matches!(interp.expr, ExprSlot::Parsed(_)));
                assert_eq!(interp.formatters.len(), 2);
                assert_eq!(interp.formatters[0].name, "currency");
                assert_eq!(interp.formatters[0].args, vec!["USD"]);
                assert_eq!(interp.formatters[1].name, "bold");
            }
            _ => panic!("expected interp node"),
        }
    }

    #[test]
    fn test_quoted_formatter_arg() {
        let template = Template::compile(r#"${items|join:", "}"#).unwrap();
        match &template.nodes()[0] {
            Node::Interp(interp) => {
                assert_eq!(interp.formatters[0].name, "join");
                assert_eq!(interp.formatters[0].args, vec![", "]);
            }
            _ => panic!("expected interp node"),
        }
    }

    #[test]
    fn test_if_else_tree() {
        let template = Template::compile("${#if ok}yes${#else}no${/if}").unwrap();
        match &template.nodes()[0] {
            Node::If(node) => {
                assert_eq!(node.then_branch.len(), 1);
                assert!(node.else_branch.is_some());
            }
            _ => panic!("expected if node"),
        }
    }

    #[test]
    fn test_nested_each() {
        let template =
            Template::compile("${#each teams}${#each this.members}${this}${/each}${/each}")
                .unwrap();
        match &template.nodes()[0] {
            Node::Each(outer) => match &outer.body[0] {
                Node::Each(inner) => assert_eq!(inner.body.len(), 1),
                _ => panic!("expected nested each"),
            },
            _ => panic!("expected each node"),
        }
    }

    #[test]
    fn test_or_expression_not_split_as_pipe() {
        let template = Template::compile("${a || b}").unwrap();
        match &template.nodes()[0] {
            Node::Interp(interp) => {
                assert!(matches!(interp.expr, ExprSlot::Parsed(_)));
                assert!(interp.formatters.is_empty());
            }
            _ => panic!("expected interp node"),
        }
    }

    #[test]
    fn test_missing_closer() {
        let err = Template::compile("${#if a}never closed").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingCloser {
                kind: BlockKind::If,
                opened_at: 0
            }
        ));
    }

    #[test]
    fn test_closer_matches_innermost() {
        let err = Template::compile("${#if a}${#each b}${/if}${/each}").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingCloser {
                kind: BlockKind::Each,
                ..
            }
        ));
    }

    #[test]
    fn test_else_outside_if() {
        let err = Template::compile("${#else}").unwrap_err();
        assert!(matches!(err, TemplateError::ElseOutsideIf { .. }));

        let err = Template::compile("${#each xs}${#else}${/each}").unwrap_err();
        assert!(matches!(err, TemplateError::ElseOutsideIf { .. }));
    }

    #[test]
    fn test_unknown_keyword() {
        let err = Template::compile("${#unless x}${/unless}").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnknownKeyword { ref keyword, .. } if keyword == "#unless"
        ));
    }

    #[test]
    fn test_empty_each_target() {
        let err = Template::compile("${#each}${/each}").unwrap_err();
        assert!(matches!(err, TemplateError::EmptyEachTarget { .. }));
    }

    #[test]
    fn test_unbalanced_paren_is_fatal() {
        let err = Template::compile("${#if (a && b}x${/if}").unwrap_err();
        assert!(matches!(err, TemplateError::UnbalancedParen { .. }));
    }

    #[test]
    fn test_bad_expression_is_scoped() {
        // Host-language escape attempts parse to an invalid slot, not a
        // fatal error; the executor renders a marker for them.
        let template = Template::compile("${ ({}).toString() }").unwrap();
        match &template.nodes()[0] {
            Node::Interp(interp) => assert!(matches!(interp.expr, ExprSlot::Invalid { .. })),
            _ => panic!("expected interp node"),
        }
    }
}
