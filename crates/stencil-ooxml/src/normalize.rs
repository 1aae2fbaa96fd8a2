//! Markup normalizer.
//!
//! Authoring tools split what the author sees as one word into many
//! adjacent runs and sprinkle revision/proofing markers over them, so a
//! directive like `${total}` may be stored as
//! `<w:r><w:t>${to</w:t></w:r><w:r><w:t>tal}</w:t></w:r>`. The normalizer
//! repairs this in three steps:
//!
//! 1. strip revision attributes and proofing markers,
//! 2. merge runs across bare text seams, to a fixed point,
//! 3. delete runs left empty by the merge.
//!
//! After normalization, every `${` the author typed sits in the same text
//! node as its closing `}` unless the author broke the directive across a
//! paragraph or table cell.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::archive::MAIN_DOCUMENT_PART;
use crate::error::{OoxmlError, Result};

/// Default ceiling for the iterative merge pass.
pub const DEFAULT_MAX_MERGE_ITERATIONS: usize = 20;

/// Normalize document markup so directives survive run fragmentation.
pub fn normalize(xml: &str, max_merge_iterations: usize) -> Result<String> {
    let stripped = strip_revision_markup(xml)?;

    let mut current = stripped;
    for pass in 0..max_merge_iterations.max(1) {
        let (merged, changed) = merge_adjacent_runs(&current);
        current = merged;
        if !changed {
            tracing::debug!(passes = pass + 1, "run merge reached fixed point");
            break;
        }
    }

    Ok(remove_empty_runs(&current))
}

/// Attributes dropped from paragraphs and runs.
fn is_revision_attribute(element: &str, key: &str) -> bool {
    if key.starts_with("w:rsid") {
        return true;
    }
    element == "w:p" && matches!(key, "w14:paraId" | "w14:textId")
}

fn is_tracked_element(name: &str) -> bool {
    matches!(name, "w:p" | "w:r")
}

/// Event pass: drop revision attributes and proofing-error markers.
fn strip_revision_markup(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;

    let mut writer = Writer::new(Vec::new());

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "w:proofErr" {
                    continue;
                }
                if is_tracked_element(&name) {
                    let filtered = filter_attributes(&e, &name)?;
                    write_event(&mut writer, Event::Start(filtered))?;
                } else {
                    write_event(&mut writer, Event::Start(e))?;
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "w:proofErr" {
                    continue;
                }
                if is_tracked_element(&name) {
                    let filtered = filter_attributes(&e, &name)?;
                    write_event(&mut writer, Event::Empty(filtered))?;
                } else {
                    write_event(&mut writer, Event::Empty(e))?;
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "w:proofErr" {
                    continue;
                }
                write_event(&mut writer, Event::End(e))?;
            }
            Ok(event) => write_event(&mut writer, event)?,
            Err(e) => {
                return Err(OoxmlError::CorruptedPart {
                    name: MAIN_DOCUMENT_PART.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| OoxmlError::CorruptedPart {
        name: MAIN_DOCUMENT_PART.to_string(),
        reason: e.to_string(),
    })
}

fn filter_attributes(start: &BytesStart, name: &str) -> Result<BytesStart<'static>> {
    let mut out = BytesStart::new(name.to_string());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| OoxmlError::CorruptedPart {
            name: MAIN_DOCUMENT_PART.to_string(),
            reason: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if is_revision_attribute(name, &key) {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| OoxmlError::CorruptedPart {
                name: MAIN_DOCUMENT_PART.to_string(),
                reason: e.to_string(),
            })?;
        out.push_attribute((key.as_str(), value.as_ref()));
    }
    Ok(out)
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| OoxmlError::CorruptedPart {
            name: MAIN_DOCUMENT_PART.to_string(),
            reason: e.to_string(),
        })
}

/// Whether the tag body after `<w:r` / `<w:t` really belongs to that
/// element and leaves it open (not self-closing).
fn is_open_tag_rest(rest: &str) -> bool {
    if rest.contains('<') || rest.ends_with('/') {
        return false;
    }
    rest.is_empty() || rest.starts_with(char::is_whitespace)
}

/// One left-to-right sweep merging `</w:t></w:r><w:r…><w:t…>` seams.
///
/// Returns the rewritten markup and whether anything changed. A chain of
/// fragmented runs collapses in a single sweep; the caller's iteration cap
/// bounds pathological inputs.
fn merge_adjacent_runs(xml: &str) -> (String, bool) {
    const SEAM: &str = "</w:t></w:r><w:r";
    const END_T: &str = "</w:t>";

    let mut out = String::with_capacity(xml.len());
    let mut pos = 0;
    let mut changed = false;

    while let Some(found) = xml[pos..].find(SEAM) {
        let seam_start = pos + found;
        let after_run = seam_start + SEAM.len();

        let merged = (|| {
            let gt = after_run + xml[after_run..].find('>')?;
            if !is_open_tag_rest(&xml[after_run..gt]) {
                return None;
            }
            let rest = &xml[gt + 1..];
            if !rest.starts_with("<w:t") {
                return None;
            }
            let after_t = gt + 1 + 4;
            let t_gt = after_t + xml[after_t..].find('>')?;
            let t_rest = &xml[after_t..t_gt];
            if !is_open_tag_rest(t_rest) {
                return None;
            }
            Some((t_gt + 1, t_rest.contains("preserve")))
        })();

        match merged {
            Some((resume, second_preserves)) => {
                out.push_str(&xml[pos..seam_start]);
                if second_preserves {
                    mark_preserve_on_open_text(&mut out);
                }
                pos = resume;
                changed = true;
            }
            None => {
                // Not a bare seam; copy through the closing text tag and
                // keep scanning.
                out.push_str(&xml[pos..seam_start + END_T.len()]);
                pos = seam_start + END_T.len();
            }
        }
    }

    out.push_str(&xml[pos..]);
    (out, changed)
}

/// The surviving text element absorbs content from a space-preserving
/// neighbor, so it must preserve space itself.
fn mark_preserve_on_open_text(out: &mut String) {
    let Some(open) = rfind_text_open(out) else {
        return;
    };
    let Some(gt_rel) = out[open..].find('>') else {
        return;
    };
    let tag = &out[open..open + gt_rel];
    if !tag.contains("preserve") {
        out.insert_str(open + gt_rel, " xml:space=\"preserve\"");
    }
}

/// Find the last `<w:t` that opens a text element (not `<w:tbl`, `<w:tc`…).
fn rfind_text_open(s: &str) -> Option<usize> {
    let mut search_end = s.len();
    while let Some(at) = s[..search_end].rfind("<w:t") {
        let after = &s[at + 4..];
        if after.starts_with('>') || after.starts_with(char::is_whitespace) {
            return Some(at);
        }
        search_end = at;
    }
    None
}

/// Delete runs whose content is nothing but run properties and empty text.
fn remove_empty_runs(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut pos = 0;

    while let Some(found) = xml[pos..].find("<w:r") {
        let start = pos + found;
        let after = &xml[start + 4..];
        if !(after.starts_with('>') || after.starts_with(char::is_whitespace)) {
            out.push_str(&xml[pos..start + 4]);
            pos = start + 4;
            continue;
        }

        let removed = (|| {
            let gt = start + 4 + xml[start + 4..].find('>')?;
            if xml[start + 4..gt].ends_with('/') {
                return None;
            }
            let close = gt + 1 + xml[gt + 1..].find("</w:r>")?;
            if run_content_is_empty(&xml[gt + 1..close]) {
                Some(close + "</w:r>".len())
            } else {
                None
            }
        })();

        match removed {
            Some(resume) => {
                out.push_str(&xml[pos..start]);
                pos = resume;
            }
            None => {
                out.push_str(&xml[pos..start + 4]);
                pos = start + 4;
            }
        }
    }

    out.push_str(&xml[pos..]);
    out
}

/// A run is empty when it holds at most run properties and text elements
/// with no content. Runs carrying breaks, tabs or drawings are kept.
fn run_content_is_empty(inner: &str) -> bool {
    let mut rest = inner.trim();

    if rest.starts_with("<w:rPr/>") {
        rest = rest["<w:rPr/>".len()..].trim_start();
    } else if rest.starts_with("<w:rPr") {
        match rest.find("</w:rPr>") {
            Some(end) => rest = rest[end + "</w:rPr>".len()..].trim_start(),
            None => return false,
        }
    }

    loop {
        if rest.is_empty() {
            return true;
        }
        if !rest.starts_with("<w:t") {
            return false;
        }
        let after = &rest[4..];
        if !(after.starts_with('>') || after.starts_with(char::is_whitespace)) {
            return false;
        }
        let Some(gt) = rest.find('>') else {
            return false;
        };
        if rest[..gt].ends_with('/') {
            rest = rest[gt + 1..].trim_start();
            continue;
        }
        if !rest[gt + 1..].starts_with("</w:t>") {
            return false;
        }
        rest = rest[gt + 1 + "</w:t>".len()..].trim_start();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize_default(xml: &str) -> String {
        normalize(xml, DEFAULT_MAX_MERGE_ITERATIONS).unwrap()
    }

    #[test]
    fn test_split_directive_merges() {
        let xml = "<w:p><w:r><w:t>${use</w:t></w:r><w:r><w:t>r.name}</w:t></w:r></w:p>";
        let out = normalize_default(xml);
        assert!(out.contains("${user.name}"), "got: {}", out);
    }

    #[test]
    fn test_chain_of_fragments_merges() {
        let xml = "<w:p><w:r><w:t>${t</w:t></w:r><w:r><w:t>ot</w:t></w:r><w:r><w:t>al}</w:t></w:r></w:p>";
        let out = normalize_default(xml);
        assert!(out.contains("${total}"), "got: {}", out);
    }

    #[test]
    fn test_rsid_attributes_stripped() {
        let xml = r#"<w:p w:rsidR="00AB12CD" w14:paraId="1234ABCD"><w:r w:rsidRPr="00AB12CD"><w:t>x</w:t></w:r></w:p>"#;
        let out = normalize_default(xml);
        assert!(!out.contains("rsid"));
        assert!(!out.contains("paraId"));
        assert!(out.contains("<w:t>x</w:t>"));
    }

    #[test]
    fn test_proof_err_removed() {
        let xml = r#"<w:p><w:proofErr w:type="spellStart"/><w:r><w:t>wrd</w:t></w:r><w:proofErr w:type="spellEnd"/></w:p>"#;
        let out = normalize_default(xml);
        assert!(!out.contains("proofErr"));
        assert!(out.contains("<w:t>wrd</w:t>"));
    }

    #[test]
    fn test_merge_with_run_attributes() {
        let xml = r#"<w:p><w:r><w:t>${a</w:t></w:r><w:r w:foo="1"><w:t>b}</w:t></w:r></w:p>"#;
        let out = normalize_default(xml);
        assert!(out.contains("${ab}"), "got: {}", out);
    }

    #[test]
    fn test_space_preservation_carried_over() {
        let xml = r#"<w:p><w:r><w:t>${a}</w:t></w:r><w:r><w:t xml:space="preserve"> ${b}</w:t></w:r></w:p>"#;
        let out = normalize_default(xml);
        assert!(out.contains("${a} ${b}"), "got: {}", out);
        assert!(out.contains("preserve"), "got: {}", out);
    }

    #[test]
    fn test_seam_with_properties_not_merged() {
        // A run with its own rPr is a genuine formatting boundary.
        let xml = "<w:p><w:r><w:t>a</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>b</w:t></w:r></w:p>";
        let out = normalize_default(xml);
        assert!(out.contains("<w:t>a</w:t>"));
        assert!(out.contains("<w:t>b</w:t>"));
    }

    #[test]
    fn test_empty_runs_deleted() {
        let xml = "<w:p><w:r><w:t></w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t></w:t></w:r><w:r><w:t>keep</w:t></w:r></w:p>";
        let out = normalize_default(xml);
        assert_eq!(out, "<w:p><w:r><w:t>keep</w:t></w:r></w:p>");
    }

    #[test]
    fn test_run_with_break_kept() {
        let xml = "<w:p><w:r><w:br/></w:r></w:p>";
        let out = normalize_default(xml);
        assert!(out.contains("<w:br/>"));
    }

    #[test]
    fn test_fragmentation_invariance() {
        // Any split of the text that preserves concatenation normalizes to
        // the same merged content.
        let whole = "<w:p><w:r><w:t>${user.name} is here</w:t></w:r></w:p>";
        let split =
            "<w:p><w:r><w:t>${us</w:t></w:r><w:r><w:t>er.na</w:t></w:r><w:r><w:t>me} is here</w:t></w:r></w:p>";
        assert_eq!(normalize_default(whole), normalize_default(split));
    }
}
