/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template execution engine.
//!
//! A single recursive walk over the directive tree: literals are appended
//! verbatim, interpolations are evaluated and escaped, conditionals pick a
//! branch, loops push one scope frame per element. A failed expression
//! renders as an inline `[ERROR: …]` marker and the walk continues; only
//! parse and container errors abort a render.

use crate::ast::{EachNode, ExprSlot, IfNode, InterpNode, Node};
use crate::context::Scope;
use crate::eval_context::EvalContext;
use crate::expr;
use crate::format;
use crate::parser::Template;
use crate::value::Value;
use crate::xmltext::escape_xml;

impl Template {
    /// Render this template against a data object.
    ///
    /// The data object is the bottom of the scope chain and is never
    /// mutated. Warnings collect on `ctx`; the output always renders.
    pub fn render(&self, root: &Value, ctx: &mut EvalContext) -> String {
        tracing::debug!(nodes = self.nodes().len(), "rendering template");
        let mut scope = Scope::new(root);
        let mut out = String::new();
        execute(self.nodes(), &mut scope, ctx, &mut out);
        tracing::debug!(bytes = out.len(), "render complete");
        out
    }
}

/// Walk a node list in document order, appending output to `out`.
pub fn execute(nodes: &[Node], scope: &mut Scope, ctx: &mut EvalContext, out: &mut String) {
    for node in nodes {
        match node {
            Node::Literal(lit) => out.push_str(&lit.text),
            Node::Interp(interp) => emit_interp(interp, scope, ctx, out),
            Node::If(node) => emit_if(node, scope, ctx, out),
            Node::Each(node) => emit_each(node, scope, ctx, out),
        }
    }
}

fn emit_error_marker(source: &str, reason: &str, offset: usize, ctx: &mut EvalContext, out: &mut String) {
    ctx.warn_at(
        format!("bad expression '{}': {}", source, reason),
        Some(offset),
    );
    out.push_str(&escape_xml(&format!("[ERROR: {}]", source)));
}

fn emit_interp(interp: &InterpNode, scope: &mut Scope, ctx: &mut EvalContext, out: &mut String) {
    let expr = match &interp.expr {
        ExprSlot::Parsed(expr) => expr,
        ExprSlot::Invalid { reason } => {
            emit_error_marker(&interp.source, reason, interp.span.start, ctx, out);
            return;
        }
    };

    let mut value = expr::eval(expr, scope);
    for call in &interp.formatters {
        value = format::apply(call, value, ctx, interp.span.start);
    }

    // Styling wrappers flatten to their text on emission.
    let text = value.to_display();

    // The escape formatter already produced XML-safe text; escaping it
    // again would corrupt its entities.
    let already_escaped = interp.formatters.iter().any(|f| f.name == "escape");
    if already_escaped {
        out.push_str(&text);
    } else {
        out.push_str(&escape_xml(&text));
    }
}

fn emit_if(node: &IfNode, scope: &mut Scope, ctx: &mut EvalContext, out: &mut String) {
    let cond = match &node.cond {
        ExprSlot::Parsed(expr) => expr,
        ExprSlot::Invalid { reason } => {
            emit_error_marker(&node.source, reason, node.open.start, ctx, out);
            return;
        }
    };

    if expr::eval(cond, scope).is_truthy() {
        execute(&node.then_branch, scope, ctx, out);
    } else if let Some(else_branch) = &node.else_branch {
        execute(else_branch, scope, ctx, out);
    }
}

fn emit_each(node: &EachNode, scope: &mut Scope, ctx: &mut EvalContext, out: &mut String) {
    let target = match &node.target {
        ExprSlot::Parsed(expr) => expr,
        ExprSlot::Invalid { reason } => {
            emit_error_marker(&node.source, reason, node.open.start, ctx, out);
            return;
        }
    };

    let value = expr::eval(target, scope);
    let items = match value.unstyled() {
        Value::List(items) => items.clone(),
        other => {
            ctx.warn_at(
                format!(
                    "'{}' is not iterable (got {}); loop expands to nothing",
                    node.source,
                    other.kind()
                ),
                Some(node.open.start),
            );
            return;
        }
    };

    let count = items.len();
    for (index, item) in items.into_iter().enumerate() {
        scope.push(item, index, count);
        execute(&node.body, scope, ctx, out);
        scope.pop();
    }
}
