//! Whiteboard document and its structural mutations.

use crate::element::{Element, ElementId, ElementKind, ElementPatch};
use crate::stroke::Stroke;
use crate::tools::ToolSettings;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default logical drawing surface size.
pub const DEFAULT_CANVAS_SIZE: Size = Size::new(3000.0, 2000.0);

/// Persisted zoom and pan. Not tracked by undo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f64,
    pub pan: Vec2,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

fn default_canvas_size() -> Size {
    DEFAULT_CANVAS_SIZE
}

/// A whiteboard document: elements, freehand strokes and view.
///
/// The whole document is the unit of persistence; `elements` and `strokes`
/// are the unit of undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Elements in sequence order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Freehand strokes in creation order.
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default = "default_canvas_size")]
    pub canvas_size: Size,
    #[serde(default)]
    pub view: ViewState,
}

fn default_name() -> String {
    "Untitled".to_string()
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: default_name(),
            elements: Vec::new(),
            strokes: Vec::new(),
            canvas_size: DEFAULT_CANVAS_SIZE,
            view: ViewState::default(),
        }
    }

    /// Create an element of `kind` at `position`, styled from the current
    /// tool settings, and append it on top.
    pub fn add_element(&mut self, kind: ElementKind, position: Point, settings: &ToolSettings) -> &Element {
        let mut element = Element::new(kind, position, settings.element_style(kind));
        element.z_index = self.next_z_index();
        self.push_element(element)
    }

    /// Z index that paints above every current element.
    pub fn next_z_index(&self) -> i64 {
        self.elements.iter().map(|e| e.z_index).max().map_or(0, |top| top + 1)
    }

    /// Append a fully built element, keeping ids unique.
    pub fn push_element(&mut self, mut element: Element) -> &Element {
        if self.element(element.id()).is_some() {
            element.id = Uuid::new_v4();
        }
        let index = self.elements.len();
        self.elements.push(element);
        &self.elements[index]
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    /// Merge `patch` into the element with `id`. Unknown ids are ignored.
    ///
    /// Returns whether an element was updated.
    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.apply(patch);
                true
            }
            None => {
                log::debug!("update_element: no element {id}");
                false
            }
        }
    }

    /// Remove the element with `id`, if present.
    pub fn delete_element(&mut self, id: ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id() == id)?;
        Some(self.elements.remove(index))
    }

    /// Append a finished stroke.
    pub fn commit_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Remove every element and stroke.
    pub fn clear_all(&mut self) {
        self.elements.clear();
        self.strokes.clear();
    }

    /// Elements in paint order (back to front).
    pub fn elements_ordered(&self) -> Vec<&Element> {
        let mut order: Vec<&Element> = self.elements.iter().collect();
        // Stable sort keeps sequence order for equal z indices
        order.sort_by_key(|e| e.z_index);
        order
    }

    /// Topmost element whose bounding box contains `point`.
    pub fn element_at(&self, point: Point) -> Option<ElementId> {
        self.elements_ordered()
            .into_iter()
            .rev()
            .find(|e| e.contains(point))
            .map(Element::id)
    }

    /// Paint the element above every other element.
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        let top = self.elements.iter().map(|e| e.z_index).max().unwrap_or(0);
        match self.element_mut(id) {
            Some(element) => {
                element.z_index = top + 1;
                self.normalize_z_order();
                true
            }
            None => false,
        }
    }

    /// Paint the element below every other element.
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        let bottom = self.elements.iter().map(|e| e.z_index).min().unwrap_or(0);
        match self.element_mut(id) {
            Some(element) => {
                element.z_index = bottom - 1;
                self.normalize_z_order();
                true
            }
            None => false,
        }
    }

    /// Renumber z indices to `0..n` in paint order and reorder the sequence
    /// to match.
    fn normalize_z_order(&mut self) {
        self.elements.sort_by_key(|e| e.z_index);
        for (i, element) in self.elements.iter_mut().enumerate() {
            element.z_index = i as i64;
        }
    }

    /// Bounding box of all content.
    pub fn bounds(&self) -> Option<Rect> {
        self.elements
            .iter()
            .map(Element::bounds)
            .chain(self.strokes.iter().filter_map(Stroke::bounds))
            .reduce(|a, b| a.union(b))
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.strokes.is_empty()
    }

    /// Re-establish invariants on data that did not come through the
    /// mutation API (deserialized or imported documents).
    pub fn sanitize(&mut self) {
        for element in &mut self.elements {
            let size = element.size();
            element.set_size(size);
            element.style.sanitize();
        }
        let mut seen = std::collections::HashSet::new();
        for element in &mut self.elements {
            if !seen.insert(element.id()) {
                log::warn!("duplicate element id {} reassigned", element.id());
                element.id = Uuid::new_v4();
                seen.insert(element.id());
            }
        }
        if !(self.view.zoom.is_finite() && self.view.zoom > 0.0) {
            self.view.zoom = 1.0;
        }
        if !self.view.pan.is_finite() {
            self.view.pan = Vec2::ZERO;
        }
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut document: Self = serde_json::from_str(json)?;
        document.sanitize();
        Ok(document)
    }
}
