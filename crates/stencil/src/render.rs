//! The rendering facade.
//!
//! Composes the pipeline: open the archive, normalize the main document's
//! markup, parse the directive tree, execute it against the data, clean up
//! control rows, and repack. Each render owns its inputs; calls are
//! independent and may run in parallel.

use std::time::Duration;

use chrono::SecondsFormat;
use hashlink::LinkedHashMap;
use stencil_ooxml::{normalize, remove_empty_rows, Archive};
use stencil_template::{Diagnostic, EvalContext, Template, Value};

use crate::config::Config;
use crate::error::{Error, Result};

/// Serialized data payloads above this size are rejected.
const MAX_DATA_BYTES: usize = 10 * 1024 * 1024;

/// Render a template archive against a data object.
///
/// Returns the rendered archive bytes. Container and parse errors abort;
/// expression and formatter problems render as inline markers and warnings.
pub fn render(template_bytes: &[u8], data: &serde_json::Value, config: &Config) -> Result<Vec<u8>> {
    render_with_diagnostics(template_bytes, data, config).map(|(bytes, _)| bytes)
}

/// Render and also return the warnings collected along the way, so callers
/// can surface unknown formatters and non-iterable loops to authors.
pub fn render_with_diagnostics(
    template_bytes: &[u8],
    data: &serde_json::Value,
    config: &Config,
) -> Result<(Vec<u8>, Vec<Diagnostic>)> {
    validate_input(data)?;

    let started = std::time::Instant::now();
    let mut archive = Archive::open(template_bytes)?;
    let main = archive.read_main()?;

    if config.debug {
        tracing::debug!(input_size = template_bytes.len(), "render started");
    }

    let normalized = normalize(&main, config.max_merge_iterations)?;
    let template = Template::compile(&normalized)?;

    let mut ctx = EvalContext::new();
    let root = build_root(data, &ctx);

    let rendered = template.render(&root, &mut ctx);
    let cleaned = remove_empty_rows(&rendered);

    archive.write_main(cleaned);
    let bytes = archive.pack()?;

    if config.debug {
        tracing::debug!(
            output_size = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            warnings = ctx.diagnostics.diagnostics().len(),
            "render finished"
        );
    }

    Ok((bytes, ctx.into_diagnostics()))
}

/// Convert caller data and seed the `_meta` bindings.
///
/// `_meta.generatedAt` carries the render clock; a caller-supplied `_meta`
/// key wins over the seeded one.
fn build_root(data: &serde_json::Value, ctx: &EvalContext) -> Value {
    let mut root = Value::from_json(data);
    if let Value::Record(map) = &mut root {
        if !map.contains_key("_meta") {
            let mut meta = LinkedHashMap::new();
            meta.insert(
                "generatedAt".to_string(),
                Value::String(ctx.now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
            map.insert("_meta".to_string(), Value::Record(meta));
        }
    }
    root
}

fn validate_input(data: &serde_json::Value) -> Result<()> {
    if !data.is_object() {
        return Err(Error::InputDataInvalid {
            reason: format!("expected an object at the top level, got {}", json_kind(data)),
        });
    }
    let serialized = serde_json::to_vec(data).map_err(|e| Error::InputDataInvalid {
        reason: e.to_string(),
    })?;
    if serialized.len() > MAX_DATA_BYTES {
        return Err(Error::InputDataInvalid {
            reason: format!(
                "payload is {} bytes, over the {} byte limit",
                serialized.len(),
                MAX_DATA_BYTES
            ),
        });
    }
    Ok(())
}

fn json_kind(data: &serde_json::Value) -> &'static str {
    match data {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Options for bulk generation.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of renders per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_delay: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: None,
        }
    }
}

/// One slot of a bulk generation result. Slots match input order and
/// succeed or fail independently.
#[derive(Debug)]
pub struct BatchItem {
    pub index: usize,
    pub result: Result<Vec<u8>>,
}

impl BatchItem {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Render one template against a list of datasets.
pub fn render_batch(
    template_bytes: &[u8],
    datasets: &[serde_json::Value],
    options: &BatchOptions,
    config: &Config,
) -> Vec<BatchItem> {
    let batch_size = options.batch_size.max(1);
    let mut items = Vec::with_capacity(datasets.len());

    for (batch_index, chunk) in datasets.chunks(batch_size).enumerate() {
        if batch_index > 0 {
            if let Some(delay) = options.batch_delay {
                std::thread::sleep(delay);
            }
        }
        for data in chunk {
            let index = items.len();
            let result = render(template_bytes, data, config);
            if let Err(e) = &result {
                tracing::warn!(index, error = %e, "batch slot failed");
            }
            items.push(BatchItem { index, result });
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_object_data() {
        let err = validate_input(&serde_json::json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::InputDataInvalid { .. }));

        let err = validate_input(&serde_json::json!("text")).unwrap_err();
        assert!(matches!(err, Error::InputDataInvalid { .. }));

        assert!(validate_input(&serde_json::json!({"ok": true})).is_ok());
    }

    #[test]
    fn test_meta_seeded_and_not_overwritten() {
        let ctx = EvalContext::new();

        let root = build_root(&serde_json::json!({}), &ctx);
        let meta = root.get_key("_meta").expect("meta should be seeded");
        assert!(meta.get_key("generatedAt").is_some());

        let root = build_root(&serde_json::json!({"_meta": {"custom": 1}}), &ctx);
        let meta = root.get_key("_meta").unwrap();
        assert!(meta.get_key("generatedAt").is_none());
        assert!(meta.get_key("custom").is_some());
    }
}
