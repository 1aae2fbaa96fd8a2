//! Rendering configuration.

use serde::{Deserialize, Serialize};

/// How styled interpolation results are written into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StylingEmit {
    /// Styled values flatten to their text. This is the implemented mode.
    #[default]
    Flatten,
    /// Reserved for emitting run-property blocks around styled text.
    /// Currently accepted in configuration but rendered as `Flatten`.
    RunProps,
}

/// Configuration recognized by the rendering core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Emit a verbose trace of the render pipeline.
    pub debug: bool,

    /// Ceiling for the run-merge pass of the normalizer.
    pub max_merge_iterations: usize,

    /// Styling emission mode; see [`StylingEmit`].
    pub styling_emit: StylingEmit,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            max_merge_iterations: stencil_ooxml::DEFAULT_MAX_MERGE_ITERATIONS,
            styling_emit: StylingEmit::Flatten,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_merge_iterations(mut self, iterations: usize) -> Self {
        self.max_merge_iterations = iterations;
        self
    }

    pub fn with_styling_emit(mut self, mode: StylingEmit) -> Self {
        self.styling_emit = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.debug);
        assert_eq!(config.max_merge_iterations, 20);
        assert_eq!(config.styling_emit, StylingEmit::Flatten);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: Config = serde_json::from_str(r#"{"styling_emit":"run_props"}"#).unwrap();
        assert_eq!(config.styling_emit, StylingEmit::RunProps);
        assert_eq!(config.max_merge_iterations, 20);
    }
}
