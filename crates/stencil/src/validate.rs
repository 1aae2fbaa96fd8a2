//! Static template inspection.
//!
//! The validator parses a template without executing it: it enumerates
//! directives, counts constructs, flags syntactic problems and suspicious
//! characters, and computes a complexity score. Parse errors make the
//! template invalid; everything else is a warning, because the executor
//! would still produce output.

use serde::Serialize;
use stencil_ooxml::{normalize, Archive};
use stencil_template::lexer::{self, Segment};
use stencil_template::{format, ExprSlot, FormatterCall, Node, Template};

use crate::config::Config;
use crate::error::Result;

/// One directive found in the template.
#[derive(Debug, Clone, Serialize)]
pub struct DirectiveInfo {
    /// `placeholder`, `condition` or `loop`.
    pub kind: String,
    /// Byte offset in the normalized document markup.
    pub offset: usize,
}

/// Construct counts and the derived complexity score.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub placeholders: usize,
    pub conditions: usize,
    pub loops: usize,
    pub nested_loops: usize,
    pub tables: usize,
    pub aggregations: usize,
    pub stylings: usize,
    pub complexity: usize,
}

impl Statistics {
    fn score(&mut self) {
        self.complexity = self.placeholders
            + 3 * self.conditions
            + 5 * self.loops
            + 10 * self.nested_loops
            + 4 * self.aggregations
            + 2 * self.stylings;
    }
}

/// The validator's report.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub directives: Vec<DirectiveInfo>,
    pub statistics: Statistics,
}

/// Inspect a template archive without executing it.
///
/// Container errors abort (there is nothing to inspect); parse errors land
/// in the report with `valid: false`.
pub fn validate(template_bytes: &[u8]) -> Result<ValidationReport> {
    let config = Config::default();
    let archive = Archive::open(template_bytes)?;
    let main = archive.read_main()?;
    let normalized = normalize(&main, config.max_merge_iterations)?;

    let mut report = ValidationReport {
        valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        directives: Vec::new(),
        statistics: Statistics::default(),
    };

    report.statistics.tables = count_tables(&normalized);
    check_directive_characters(&normalized, &mut report);

    let template = match Template::compile(&normalized) {
        Ok(template) => template,
        Err(e) => {
            report.errors.push(e.to_string());
            report.valid = false;
            report.statistics.score();
            return Ok(report);
        }
    };

    inspect_nodes(template.nodes(), 0, &mut report);
    report.statistics.score();
    report.valid = report.errors.is_empty();
    Ok(report)
}

fn inspect_nodes(nodes: &[Node], loop_depth: usize, report: &mut ValidationReport) {
    for node in nodes {
        match node {
            Node::Literal(_) => {}
            Node::Interp(interp) => {
                report.statistics.placeholders += 1;
                report.directives.push(DirectiveInfo {
                    kind: "placeholder".to_string(),
                    offset: interp.span.start,
                });
                if let ExprSlot::Invalid { reason } = &interp.expr {
                    report.warnings.push(format!(
                        "bad expression '{}' at byte {}: {}",
                        interp.source, interp.span.start, reason
                    ));
                }
                for call in &interp.formatters {
                    inspect_formatter(call, interp.span.start, report);
                }
            }
            Node::If(node) => {
                report.statistics.conditions += 1;
                report.directives.push(DirectiveInfo {
                    kind: "condition".to_string(),
                    offset: node.open.start,
                });
                if let ExprSlot::Invalid { reason } = &node.cond {
                    report.warnings.push(format!(
                        "bad condition '{}' at byte {}: {}",
                        node.source, node.open.start, reason
                    ));
                }
                inspect_nodes(&node.then_branch, loop_depth, report);
                if let Some(else_branch) = &node.else_branch {
                    inspect_nodes(else_branch, loop_depth, report);
                }
            }
            Node::Each(node) => {
                report.statistics.loops += 1;
                report.directives.push(DirectiveInfo {
                    kind: "loop".to_string(),
                    offset: node.open.start,
                });
                if loop_depth > 0 {
                    report.statistics.nested_loops += 1;
                    report.warnings.push(format!(
                        "nested loop at byte {}; verify parent/this references",
                        node.open.start
                    ));
                }
                if let ExprSlot::Invalid { reason } = &node.target {
                    report.warnings.push(format!(
                        "bad loop target '{}' at byte {}: {}",
                        node.source, node.open.start, reason
                    ));
                }
                inspect_nodes(&node.body, loop_depth + 1, report);
            }
        }
    }
}

fn inspect_formatter(call: &FormatterCall, offset: usize, report: &mut ValidationReport) {
    if !format::is_known(&call.name) {
        report.warnings.push(format!(
            "unknown formatter '{}' at byte {}",
            call.name, offset
        ));
        return;
    }
    if format::is_aggregate(&call.name) {
        report.statistics.aggregations += 1;
    }
    if format::is_styling(&call.name) {
        report.statistics.stylings += 1;
    }
    // Any three-letter code is accepted, matching the formatter.
    if call.name == "currency" {
        if let Some(code) = call.args.first() {
            let plausible = code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic());
            if !plausible {
                report.warnings.push(format!(
                    "'{}' does not look like an ISO currency code at byte {}",
                    code, offset
                ));
            }
        }
    }
}

fn count_tables(xml: &str) -> usize {
    let mut count = 0;
    let mut pos = 0;
    while let Some(found) = xml[pos..].find("<w:tbl") {
        let at = pos + found;
        let after = &xml[at + 6..];
        if after.starts_with('>') || after.starts_with(char::is_whitespace) {
            count += 1;
        }
        pos = at + 6;
    }
    count
}

/// Characters Word substitutes invisibly that break expressions: smart
/// quotes and zero-width spaces inside directive content.
fn check_directive_characters(normalized: &str, report: &mut ValidationReport) {
    let Ok(segments) = lexer::scan(normalized) else {
        // Scan failures surface as parse errors during compile.
        return;
    };

    for segment in segments {
        if let Segment::Directive(raw) = segment {
            if raw
                .raw
                .chars()
                .any(|c| matches!(c, '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}'))
            {
                report.warnings.push(format!(
                    "smart quotes inside directive at byte {}; replace with straight quotes",
                    raw.span.start
                ));
            }
            if raw
                .raw
                .chars()
                .any(|c| matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}'))
            {
                report.warnings.push(format!(
                    "zero-width characters inside directive at byte {}",
                    raw.span.start
                ));
            }
        }
    }
}
