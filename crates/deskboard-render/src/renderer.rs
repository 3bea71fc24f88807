//! Renderer trait abstraction.

use deskboard_core::{Document, Editor, ElementId, Stroke, TextEditState, Viewport};
use kurbo::Size;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid (plain background).
    None,
    /// Full grid lines.
    #[default]
    Lines,
    /// Only intersection dots.
    Dots,
}

/// Default grid cell size in document units.
pub const DEFAULT_GRID_CELL_SIZE: f64 = 20.0;

/// Context for a single render frame.
///
/// Everything a frame depends on is borrowed here, so rendering can never
/// mutate the document.
pub struct RenderContext<'a> {
    /// The document to render.
    pub document: &'a Document,
    /// Pan and zoom applied to the document.
    pub viewport: &'a Viewport,
    /// Canvas surface size in pixels.
    pub viewport_size: Size,
    /// Background color.
    pub background_color: Color,
    /// Grid display style.
    pub grid_style: GridStyle,
    /// Grid cell size in document units.
    pub grid_cell_size: f64,
    /// Selection highlight color.
    pub selection_color: Color,
    /// Currently selected element.
    pub selection: Option<ElementId>,
    /// Stroke being drawn, replayed after the committed ones.
    pub active_stroke: Option<&'a Stroke>,
    /// Inline text edit in progress; its buffer replaces the element content.
    pub editing: Option<&'a TextEditState>,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(document: &'a Document, viewport: &'a Viewport, viewport_size: Size) -> Self {
        Self {
            document,
            viewport,
            viewport_size,
            background_color: Color::from_rgba8(250, 250, 250, 255),
            grid_style: GridStyle::default(),
            grid_cell_size: DEFAULT_GRID_CELL_SIZE,
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            selection: None,
            active_stroke: None,
            editing: None,
        }
    }

    /// Context for the editor's current state.
    pub fn from_editor(editor: &'a Editor, viewport_size: Size) -> Self {
        Self::new(editor.document(), editor.viewport(), viewport_size)
            .with_grid_cell_size(editor.config().grid_cell_size)
            .with_selection(editor.selection())
            .with_active_stroke(editor.active_stroke())
            .with_text_edit(editor.text_edit())
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    pub fn with_grid_cell_size(mut self, cell_size: f64) -> Self {
        self.grid_cell_size = cell_size;
        self
    }

    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Set the selected element.
    pub fn with_selection(mut self, selection: Option<ElementId>) -> Self {
        self.selection = selection;
        self
    }

    /// Set the in-progress stroke.
    pub fn with_active_stroke(mut self, stroke: Option<&'a Stroke>) -> Self {
        self.active_stroke = stroke;
        self
    }

    /// Set the text edit whose buffer is shown in place of the element content.
    pub fn with_text_edit(mut self, editing: Option<&'a TextEditState>) -> Self {
        self.editing = editing;
        self
    }

    /// Surface size in whole pixels, at least 1x1.
    pub fn pixel_size(&self) -> (u32, u32) {
        let side = |v: f64| if v.is_finite() && v >= 1.0 { v.round() as u32 } else { 1 };
        (side(self.viewport_size.width), side(self.viewport_size.height))
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Redraw the whole frame from `ctx`.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskboard_core::{ElementKind, KeyEvent};
    use kurbo::Point;

    #[test]
    fn test_context_from_editor() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::Text, Point::new(10.0, 10.0));
        assert!(editor.begin_text_edit(id));
        editor.handle_key(&KeyEvent::char('!'));

        let ctx = RenderContext::from_editor(&editor, Size::new(640.0, 480.0));
        assert_eq!(ctx.selection, Some(id));
        assert_eq!(ctx.editing.map(|e| e.element_id()), Some(id));
        assert!(ctx.active_stroke.is_none());
        assert_eq!(ctx.grid_style, GridStyle::Lines);
        assert_eq!(ctx.pixel_size(), (640, 480));
    }

    #[test]
    fn test_pixel_size_never_zero() {
        let document = Document::new();
        let viewport = Viewport::new();
        let ctx = RenderContext::new(&document, &viewport, Size::new(0.0, f64::NAN));
        assert_eq!(ctx.pixel_size(), (1, 1));
    }
}
