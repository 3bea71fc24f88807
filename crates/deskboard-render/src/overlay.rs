//! Vector overlay: discrete elements as paintable nodes.

use crate::renderer::RenderContext;
use deskboard_core::{Element, ElementId, ElementKind, TextEditState};
use kurbo::{Affine, BezPath, Point, Rect, Shape, Size};
use peniko::Color;

/// Gap between an element and its selection outline, in pixels.
pub const SELECTION_PADDING: f64 = 4.0;
/// Selection outline width in pixels.
pub const SELECTION_STROKE_WIDTH: f64 = 1.5;

/// What an overlay node paints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// The element itself.
    Element,
    /// Highlight drawn around the selected element.
    SelectionOutline,
}

/// Text to lay out inside an element's bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub content: String,
    pub font_size: f64,
    pub color: Color,
    /// Layout box in element-local coordinates.
    pub bounds: Size,
    /// Byte offset of the caret when the element is being edited.
    pub cursor: Option<usize>,
}

/// One paintable item of the overlay.
#[derive(Debug, Clone)]
pub struct OverlayNode {
    pub element_id: ElementId,
    pub kind: ElementKind,
    pub role: NodeRole,
    /// Outline in element-local coordinates.
    pub path: BezPath,
    /// Element-local to surface transform.
    pub transform: Affine,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    /// Outline width in element-local units.
    pub stroke_width: f64,
    pub text: Option<TextRun>,
    pub selected: bool,
}

/// Build the overlay for a frame: one node per element in paint order,
/// followed by the selection outline if an element is selected.
pub fn build_overlay(ctx: &RenderContext) -> Vec<OverlayNode> {
    let view = ctx.viewport.surface_transform();
    let mut nodes = Vec::with_capacity(ctx.document.elements.len() + 1);
    let mut outline = None;

    for element in ctx.document.elements_ordered() {
        let selected = ctx.selection == Some(element.id());
        let transform = view * element.local_transform();
        if selected {
            outline = Some(selection_outline(element, transform, ctx.viewport.zoom, ctx.selection_color));
        }
        nodes.push(element_node(element, transform, selected, ctx.editing));
    }

    nodes.extend(outline);
    nodes
}

fn element_node(
    element: &Element,
    transform: Affine,
    selected: bool,
    editing: Option<&TextEditState>,
) -> OverlayNode {
    let style = &element.style;
    let fill = if element.is_fillable() { style.fill_with_opacity() } else { None };
    // Text is drawn in the stroke color; its box has no outline
    let stroke = match element.kind {
        ElementKind::Text | ElementKind::Image => None,
        _ if style.stroke_width > 0.0 => Some(style.stroke_with_opacity()),
        _ => None,
    };

    let text = element.kind.carries_text().then(|| {
        let edit = editing.filter(|edit| edit.element_id() == element.id());
        TextRun {
            content: edit.map_or_else(|| element.content.clone(), |edit| edit.text().to_string()),
            font_size: style.font_size,
            color: style.stroke_with_opacity(),
            bounds: element.size(),
            cursor: edit.map(TextEditState::cursor),
        }
    });

    OverlayNode {
        element_id: element.id(),
        kind: element.kind,
        role: NodeRole::Element,
        path: element.local_path(),
        transform,
        fill,
        stroke,
        stroke_width: style.stroke_width,
        text,
        selected,
    }
}

fn selection_outline(element: &Element, transform: Affine, zoom: f64, color: Color) -> OverlayNode {
    // Constant on-screen padding and width regardless of zoom
    let pad = SELECTION_PADDING / zoom;
    let rect = Rect::from_origin_size(Point::ZERO, element.size()).inflate(pad, pad);
    OverlayNode {
        element_id: element.id(),
        kind: element.kind,
        role: NodeRole::SelectionOutline,
        path: rect.to_path(0.1),
        transform,
        fill: None,
        stroke: Some(color),
        stroke_width: SELECTION_STROKE_WIDTH / zoom,
        text: None,
        selected: true,
    }
}
