//! Table-row cleanup.
//!
//! Authors put loop openers and closers on their own table rows so the table
//! structure survives editing. After expansion those rows hold no text and
//! would render as blank stripes. This pass removes any row whose aggregate
//! text is whitespace-only; rows with user text are never touched. It runs
//! after template expansion, never before.

/// Remove table rows whose concatenated text content is empty.
pub fn remove_empty_rows(xml: &str) -> String {
    let spans = collect_row_spans(xml);

    let mut empty: Vec<(usize, usize)> = spans
        .into_iter()
        .filter(|&(start, end)| row_text(&xml[start..end]).trim().is_empty())
        .collect();
    empty.sort_by_key(|&(start, _)| start);

    // Nested tables: an empty outer row subsumes its inner rows, so only
    // the outermost empty spans are spliced out.
    let mut selected: Vec<(usize, usize)> = Vec::new();
    for span in empty {
        let contained = selected
            .last()
            .map_or(false, |&(s, e)| s <= span.0 && span.1 <= e);
        if !contained {
            selected.push(span);
        }
    }

    if selected.is_empty() {
        return xml.to_string();
    }
    tracing::debug!(rows = selected.len(), "removing empty table rows");

    let mut out = String::with_capacity(xml.len());
    let mut pos = 0;
    for (start, end) in selected {
        out.push_str(&xml[pos..start]);
        pos = end;
    }
    out.push_str(&xml[pos..]);
    out
}

/// Collect the full byte spans of every `<w:tr>…</w:tr>` element,
/// tracking nesting for tables inside cells.
fn collect_row_spans(xml: &str) -> Vec<(usize, usize)> {
    // Gather opener and closer positions, then pair them with a stack.
    let mut tokens: Vec<(usize, bool)> = Vec::new();

    let mut pos = 0;
    while let Some(found) = xml[pos..].find("<w:tr") {
        let at = pos + found;
        let after = &xml[at + 5..];
        if after.starts_with('>') || after.starts_with(char::is_whitespace) {
            tokens.push((at, true));
        }
        pos = at + 5;
    }

    pos = 0;
    while let Some(found) = xml[pos..].find("</w:tr>") {
        let at = pos + found;
        tokens.push((at, false));
        pos = at + "</w:tr>".len();
    }

    tokens.sort_by_key(|&(at, _)| at);

    let mut spans = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    for (at, is_open) in tokens {
        if is_open {
            stack.push(at);
        } else if let Some(start) = stack.pop() {
            spans.push((start, at + "</w:tr>".len()));
        }
    }

    spans
}

/// Concatenate the `<w:t>` leaf contents of a row.
fn row_text(row_xml: &str) -> String {
    let mut text = String::new();
    let mut pos = 0;

    while let Some(found) = row_xml[pos..].find("<w:t") {
        let at = pos + found;
        let after = &row_xml[at + 4..];
        if !(after.starts_with('>') || after.starts_with(char::is_whitespace)) {
            pos = at + 4;
            continue;
        }
        let Some(gt_rel) = row_xml[at + 4..].find('>') else {
            break;
        };
        let gt = at + 4 + gt_rel;
        if row_xml[at + 4..gt].ends_with('/') {
            pos = gt + 1;
            continue;
        }
        let Some(close_rel) = row_xml[gt + 1..].find("</w:t>") else {
            break;
        };
        text.push_str(&row_xml[gt + 1..gt + 1 + close_rel]);
        pos = gt + 1 + close_rel + "</w:t>".len();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cell_text: &str) -> String {
        format!(
            "<w:tr><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc></w:tr>",
            cell_text
        )
    }

    #[test]
    fn test_empty_row_removed() {
        let xml = format!("<w:tbl>{}{}{}</w:tbl>", row("Name"), row(""), row("Bob"));
        let out = remove_empty_rows(&xml);
        assert_eq!(
            out,
            format!("<w:tbl>{}{}</w:tbl>", row("Name"), row("Bob"))
        );
    }

    #[test]
    fn test_whitespace_only_row_removed() {
        let xml = format!("<w:tbl>{}</w:tbl>", row("   "));
        assert_eq!(remove_empty_rows(&xml), "<w:tbl></w:tbl>");
    }

    #[test]
    fn test_rows_with_text_survive() {
        let xml = format!("<w:tbl>{}{}</w:tbl>", row("Header"), row("data"));
        assert_eq!(remove_empty_rows(&xml), xml);
    }

    #[test]
    fn test_multiple_cells_count_together() {
        let xml = "<w:tbl><w:tr>\
             <w:tc><w:p><w:r><w:t></w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc>\
             </w:tr></w:tbl>";
        assert_eq!(remove_empty_rows(xml), xml);
    }

    #[test]
    fn test_nested_table_rows() {
        // The outer row holds a nested table with text; it must survive.
        let inner = format!("<w:tbl>{}</w:tbl>", row("inner text"));
        let outer = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>",
            inner
        );
        assert_eq!(remove_empty_rows(&outer), outer);

        // Entirely empty nested structure goes away as one outer row.
        let empty_inner = format!("<w:tbl>{}</w:tbl>", row(""));
        let empty_outer = format!("<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>", empty_inner);
        assert_eq!(remove_empty_rows(&empty_outer), "<w:tbl></w:tbl>");
    }

    #[test]
    fn test_row_properties_do_not_count_as_text() {
        let xml = "<w:tbl><w:tr><w:trPr><w:trHeight w:val=\"240\"/></w:trPr>\
             <w:tc><w:p><w:r><w:t></w:t></w:r></w:p></w:tc></w:tr></w:tbl>";
        assert_eq!(remove_empty_rows(xml), "<w:tbl></w:tbl>");
    }
}
