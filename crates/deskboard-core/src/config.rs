//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the settings it
//! changes:
//!
//! ```
//! # use deskboard_core::EditorConfig;
//! let config = EditorConfig::from_json(r#"{ "max_zoom": 5.0 }"#).unwrap();
//! assert_eq!(config.max_zoom, 5.0);
//! assert_eq!(config.history_limit, 100);
//! ```

use crate::document::DEFAULT_CANVAS_SIZE;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::tools::ToolSettings;
use crate::viewport::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM_STEP};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunable editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Factor applied by a single zoom step.
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Quiet period after the last change before an autosave runs.
    pub autosave_debounce_ms: u64,
    /// Maximum number of undo steps kept.
    pub history_limit: usize,
    /// Background grid cell size in document units.
    pub grid_cell_size: f64,
    /// Logical drawing surface size for new documents.
    pub canvas_size: Size,
    /// Initial tool settings.
    pub tool_defaults: ToolSettings,
    /// Ramer-Douglas-Peucker tolerance applied to committed strokes
    /// (0 keeps every point).
    pub stroke_simplify_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zoom_step: DEFAULT_ZOOM_STEP,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            autosave_debounce_ms: 2000,
            history_limit: DEFAULT_HISTORY_LIMIT,
            grid_cell_size: 20.0,
            canvas_size: DEFAULT_CANVAS_SIZE,
            tool_defaults: ToolSettings::default(),
            stroke_simplify_tolerance: 0.0,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON. Out-of-range values are corrected.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Replace unusable values with their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.zoom_step) || self.zoom_step <= 1.0 {
            log::warn!("zoom_step {} ignored", self.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        if !positive(self.min_zoom) || !positive(self.max_zoom) || self.min_zoom > self.max_zoom {
            log::warn!("zoom range [{}, {}] ignored", self.min_zoom, self.max_zoom);
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }
        if self.history_limit == 0 {
            self.history_limit = 1;
        }
        if !positive(self.grid_cell_size) {
            self.grid_cell_size = defaults.grid_cell_size;
        }
        if !positive(self.canvas_size.width) || !positive(self.canvas_size.height) {
            self.canvas_size = defaults.canvas_size;
        }
        if !self.stroke_simplify_tolerance.is_finite() || self.stroke_simplify_tolerance < 0.0 {
            self.stroke_simplify_tolerance = 0.0;
        }
        self
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
