//! Tool system for the whiteboard.

use crate::element::{ElementId, ElementKind};
use crate::stroke::{Stroke, StrokeMode};
use crate::style::{ElementStyle, Rgba};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Fill given to sticky notes when no fill color is selected.
pub const STICKY_NOTE_FILL: Rgba = Rgba::new(0xFE, 0xF0, 0x8A, 0xFF);

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Pen,
    Eraser,
    Rectangle,
    Circle,
    Triangle,
    Arrow,
    Text,
    StickyNote,
}

impl ToolKind {
    /// Element created by a click with this tool, if any.
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            ToolKind::Rectangle => Some(ElementKind::Rectangle),
            ToolKind::Circle => Some(ElementKind::Circle),
            ToolKind::Triangle => Some(ElementKind::Triangle),
            ToolKind::Arrow => Some(ElementKind::Arrow),
            ToolKind::Text => Some(ElementKind::Text),
            ToolKind::StickyNote => Some(ElementKind::StickyNote),
            ToolKind::Select | ToolKind::Pan | ToolKind::Pen | ToolKind::Eraser => None,
        }
    }

    /// Stroke mode drawn by this tool, if it is a freehand tool.
    pub fn stroke_mode(self) -> Option<StrokeMode> {
        match self {
            ToolKind::Pen => Some(StrokeMode::Draw),
            ToolKind::Eraser => Some(StrokeMode::Erase),
            _ => None,
        }
    }

    /// Single-key shortcut that activates this tool.
    pub fn shortcut(self) -> char {
        match self {
            ToolKind::Select => 'v',
            ToolKind::Pan => 'h',
            ToolKind::Pen => 'p',
            ToolKind::Eraser => 'e',
            ToolKind::Rectangle => 'r',
            ToolKind::Circle => 'o',
            ToolKind::Triangle => 'g',
            ToolKind::Arrow => 'a',
            ToolKind::Text => 't',
            ToolKind::StickyNote => 'n',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        const ALL: [ToolKind; 10] = [
            ToolKind::Select,
            ToolKind::Pan,
            ToolKind::Pen,
            ToolKind::Eraser,
            ToolKind::Rectangle,
            ToolKind::Circle,
            ToolKind::Triangle,
            ToolKind::Arrow,
            ToolKind::Text,
            ToolKind::StickyNote,
        ];
        let key = key.to_ascii_lowercase();
        ALL.into_iter().find(|tool| tool.shortcut() == key)
    }
}

/// Drawing settings applied to new strokes and elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub stroke_color: Rgba,
    pub stroke_width: f64,
    pub font_size: f64,
    pub fill_color: Option<Rgba>,
    /// Width of eraser strokes.
    pub eraser_width: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            stroke_color: Rgba::new(0x1F, 0x29, 0x37, 0xFF),
            stroke_width: 2.0,
            font_size: 16.0,
            fill_color: None,
            eraser_width: 20.0,
        }
    }
}

impl ToolSettings {
    /// Style for a new element of `kind`.
    pub fn element_style(&self, kind: ElementKind) -> ElementStyle {
        let fill_color = match (kind, self.fill_color) {
            (ElementKind::StickyNote, None) => Some(STICKY_NOTE_FILL),
            (_, fill) => fill,
        };
        ElementStyle {
            stroke_color: self.stroke_color,
            fill_color,
            font_size: self.font_size,
            stroke_width: self.stroke_width,
            opacity: 1.0,
        }
    }

    /// Start a freehand stroke in `mode` at `point`.
    pub fn start_stroke(&self, mode: StrokeMode, point: Point) -> Stroke {
        let width = match mode {
            StrokeMode::Draw => self.stroke_width,
            StrokeMode::Erase => self.eraser_width,
        };
        Stroke::new(mode, self.stroke_color, width, point)
    }
}

/// State of the in-progress pointer gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    /// Waiting for a pointer-down.
    #[default]
    Idle,
    /// Dragging an element with the select tool.
    Dragging {
        id: ElementId,
        /// Document point of the previous pointer event.
        last: Point,
        /// Element position when the drag started.
        origin: Point,
    },
    /// Panning the viewport.
    Panning {
        /// Screen point of the previous pointer event.
        last: Point,
    },
    /// Drawing a pen or eraser stroke.
    Drawing { stroke: Stroke },
    /// A click-to-place tool was pressed; nothing happens until release.
    Placed,
}

/// Manages the current tool, its settings and the gesture in progress.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    current_tool: ToolKind,
    /// Settings applied to new content.
    pub settings: ToolSettings,
    gesture: Gesture,
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ToolSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn current_tool(&self) -> ToolKind {
        self.current_tool
    }

    /// Set the current tool. Any gesture in progress is returned so the
    /// caller can undo its side effects.
    pub fn set_tool(&mut self, tool: ToolKind) -> Gesture {
        self.current_tool = tool;
        self.cancel()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub(crate) fn begin(&mut self, gesture: Gesture) {
        self.gesture = gesture;
    }

    pub(crate) fn gesture_mut(&mut self) -> &mut Gesture {
        &mut self.gesture
    }

    /// End the gesture, returning its final state.
    pub(crate) fn finish(&mut self) -> Gesture {
        std::mem::take(&mut self.gesture)
    }

    /// Abandon the current gesture without committing anything.
    pub fn cancel(&mut self) -> Gesture {
        std::mem::take(&mut self.gesture)
    }

    /// Check if a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// The stroke being drawn, if any (for live rendering).
    pub fn active_stroke(&self) -> Option<&Stroke> {
        match &self.gesture {
            Gesture::Drawing { stroke } => Some(stroke),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_selection() {
        let mut tm = ToolManager::new();
        assert_eq!(tm.current_tool(), ToolKind::Select);

        tm.set_tool(ToolKind::Rectangle);
        assert_eq!(tm.current_tool(), ToolKind::Rectangle);
    }

    #[test]
    fn test_set_tool_cancels_gesture() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Pen);
        let stroke = tm.settings.start_stroke(StrokeMode::Draw, Point::ZERO);
        tm.begin(Gesture::Drawing { stroke });
        assert!(tm.is_active());
        assert!(tm.active_stroke().is_some());

        let cancelled = tm.set_tool(ToolKind::Select);
        assert!(matches!(cancelled, Gesture::Drawing { .. }));
        assert!(!tm.is_active());
        assert!(tm.active_stroke().is_none());
    }

    #[test]
    fn test_shortcuts_roundtrip() {
        for key in ['v', 'h', 'p', 'e', 'r', 'o', 'g', 'a', 't', 'n'] {
            let tool = ToolKind::from_shortcut(key).unwrap();
            assert_eq!(tool.shortcut(), key);
        }
        assert_eq!(ToolKind::from_shortcut('R'), Some(ToolKind::Rectangle));
        assert_eq!(ToolKind::from_shortcut('z'), None);
    }

    #[test]
    fn test_sticky_note_gets_default_fill() {
        let settings = ToolSettings::default();
        assert_eq!(
            settings.element_style(ElementKind::StickyNote).fill_color,
            Some(STICKY_NOTE_FILL)
        );
        assert_eq!(settings.element_style(ElementKind::Rectangle).fill_color, None);
    }

    #[test]
    fn test_eraser_uses_eraser_width() {
        let settings = ToolSettings::default();
        let stroke = settings.start_stroke(StrokeMode::Erase, Point::ZERO);
        assert!((stroke.stroke_width - settings.eraser_width).abs() < f64::EPSILON);
    }
}
