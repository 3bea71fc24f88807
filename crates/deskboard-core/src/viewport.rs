//! Viewport module for pan/zoom transforms.

use crate::config::EditorConfig;
use crate::document::ViewState;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Multiplier applied by a single zoom step.
pub const DEFAULT_ZOOM_STEP: f64 = 1.2;
pub const DEFAULT_MIN_ZOOM: f64 = 0.1;
pub const DEFAULT_MAX_ZOOM: f64 = 3.0;

/// Viewport manages the view transform for the canvas.
///
/// Maps between screen (input) coordinates and document coordinates:
/// `document = (screen - origin - pan) / zoom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    /// Current translation offset in screen units.
    pub pan: Vec2,
    /// Screen position of the canvas surface's top-left corner.
    pub origin: Point,
    /// Factor applied by `zoom_in`/`zoom_out`.
    pub zoom_step: f64,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            origin: Point::ZERO,
            zoom_step: DEFAULT_ZOOM_STEP,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport using the configured zoom limits.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            zoom_step: config.zoom_step,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            ..Self::default()
        }
    }

    /// Transform from document coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2() + self.pan) * Affine::scale(self.zoom)
    }

    /// Transform from screen coordinates to document coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-(self.origin.to_vec2() + self.pan))
    }

    /// Transform from document coordinates to canvas-surface pixels, i.e.
    /// [`transform`](Self::transform) without the surface origin.
    pub fn surface_transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Convert a screen point to document coordinates.
    pub fn to_document_coords(&self, screen_point: Point) -> Point {
        ((screen_point - self.origin - self.pan) / self.zoom).to_point()
    }

    /// Convert a document point to screen coordinates.
    pub fn to_screen_coords(&self, document_point: Point) -> Point {
        self.origin + self.pan + document_point.to_vec2() * self.zoom
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pan += delta;
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / self.zoom_step);
    }

    /// Set the zoom level, clamped to `[min_zoom, max_zoom]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        }
    }

    /// Zoom by `factor`, keeping the document point under `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let document_point = self.to_document_coords(screen_point);
        self.zoom = new_zoom;

        let drift = screen_point - self.to_screen_coords(document_point);
        self.pan += drift;
    }

    /// Reset to 100% zoom with no pan.
    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }

    /// Persistable part of the viewport.
    pub fn view_state(&self) -> ViewState {
        ViewState {
            zoom: self.zoom,
            pan: self.pan,
        }
    }

    /// Restore zoom and pan from a persisted view, re-applying the clamp.
    pub fn apply_view_state(&mut self, view: &ViewState) {
        self.zoom = 1.0;
        self.set_zoom(view.zoom);
        self.pan = Vec2::ZERO;
        self.pan(view.pan);
    }
}
