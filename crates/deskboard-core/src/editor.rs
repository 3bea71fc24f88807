//! Editing session: routes input through the active tool into the document,
//! viewport and history.

use crate::config::EditorConfig;
use crate::document::Document;
use crate::element::{Element, ElementId, ElementKind, ElementPatch, EmbeddedImage};
use crate::history::History;
use crate::input::{ClickTracker, Command, KeyEvent, MouseButton, PointerEvent};
use crate::stroke::Stroke;
use crate::text_edit::{TextEditResult, TextEditState};
use crate::tools::{Gesture, ToolKind, ToolManager, ToolSettings};
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Pixels of wheel travel per zoom step.
const SCROLL_ZOOM_UNIT: f64 = 100.0;

/// A whiteboard editing session.
///
/// Owns the document and all transient state around it. Every content
/// mutation goes through here so history checkpoints are taken only for
/// changes that actually happen.
#[derive(Debug, Clone)]
pub struct Editor {
    document: Document,
    viewport: Viewport,
    tools: ToolManager,
    history: History,
    selection: Option<ElementId>,
    text_edit: Option<TextEditState>,
    clicks: ClickTracker,
    /// Button that started the current gesture.
    gesture_button: MouseButton,
    config: EditorConfig,
    /// Bumped on every persisted change.
    revision: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor with an empty document.
    pub fn new(config: EditorConfig) -> Self {
        let mut document = Document::new();
        document.canvas_size = config.canvas_size;
        Self::with_document(document, config)
    }

    /// Create an editor for an existing document.
    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        let mut viewport = Viewport::from_config(&config);
        viewport.apply_view_state(&document.view);
        Self {
            document,
            viewport,
            tools: ToolManager::with_settings(config.tool_defaults.clone()),
            history: History::new(config.history_limit),
            selection: None,
            text_edit: None,
            clicks: ClickTracker::new(),
            gesture_button: MouseButton::Left,
            config,
            revision: 0,
        }
    }

    /// Replace the document, dropping history and all transient state.
    pub fn open(&mut self, document: Document) {
        log::info!("opening document {} ({} elements)", document.id, document.elements.len());
        let origin = self.viewport.origin;
        self.viewport = Viewport::from_config(&self.config);
        self.viewport.origin = origin;
        self.viewport.apply_view_state(&document.view);
        self.document = document;
        self.history = History::new(self.config.history_limit);
        self.tools.cancel();
        self.selection = None;
        self.text_edit = None;
        self.touch();
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Settings used for new strokes and elements.
    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.tools.settings
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> Option<ElementId> {
        self.selection
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selection.and_then(|id| self.document.element(id))
    }

    /// The stroke being drawn, if any.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.tools.active_stroke()
    }

    pub fn text_edit(&self) -> Option<&TextEditState> {
        self.text_edit.as_ref()
    }

    /// Counter that changes whenever persisted state changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Copy of the document with the current view, ready to persist.
    pub fn snapshot_for_save(&self) -> Document {
        let mut document = self.document.clone();
        document.view = self.viewport.view_state();
        document
    }

    // --- Selection ---

    /// Select an element. Returns false if it does not exist.
    pub fn select(&mut self, id: ElementId) -> bool {
        if self.document.element(id).is_none() {
            return false;
        }
        self.selection = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // --- Tools and gestures ---

    /// Switch tools. Clears the selection and abandons any gesture.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.commit_text_edit();
        let abandoned = self.tools.set_tool(tool);
        self.revert_gesture(abandoned);
        self.selection = None;
        log::debug!("tool: {tool:?}");
    }

    /// Abandon the current gesture without committing anything.
    pub fn cancel_gesture(&mut self) {
        let abandoned = self.tools.cancel();
        self.revert_gesture(abandoned);
    }

    fn revert_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Dragging { id, origin, .. } => {
                if let Some(element) = self.document.element_mut(id) {
                    element.position = origin;
                }
                log::debug!("drag of {id} cancelled");
            }
            Gesture::Drawing { stroke } => {
                log::debug!("discarded stroke with {} points", stroke.len());
            }
            Gesture::Idle | Gesture::Panning { .. } | Gesture::Placed => {}
        }
    }

    /// Handle a pointer event in screen coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.handle_pointer_at(event, Instant::now());
    }

    /// Handle a pointer event received at `now`.
    pub fn handle_pointer_at(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Down { position, button } => self.handle_press(position, button, now),
            PointerEvent::Move { position } => self.handle_drag(position),
            PointerEvent::Up { position, button } => {
                // Only the button that started a gesture ends it
                if !self.tools.is_active() || button == self.gesture_button {
                    self.handle_release(position);
                }
            }
            PointerEvent::Scroll {
                position,
                delta,
                modifiers,
            } => {
                if modifiers.command() {
                    if delta.y.abs() > f64::EPSILON {
                        let factor = self.viewport.zoom_step.powf(-delta.y / SCROLL_ZOOM_UNIT);
                        self.zoom_at(position, factor);
                    }
                } else {
                    self.pan_by(-delta);
                }
            }
        }
    }

    fn handle_press(&mut self, screen: Point, button: MouseButton, now: Instant) {
        if self.tools.is_active() {
            return;
        }
        self.gesture_button = button;
        match button {
            MouseButton::Middle => {
                self.tools.begin(Gesture::Panning { last: screen });
                return;
            }
            MouseButton::Right => return,
            MouseButton::Left => {}
        }

        let point = self.viewport.to_document_coords(screen);
        let double_click = self.clicks.register(screen, now);
        let hit = self.document.element_at(point);

        // Clicking elsewhere ends text editing
        if let Some(state) = &self.text_edit {
            if hit == Some(state.element_id()) {
                return;
            }
            self.commit_text_edit();
        }

        let tool = self.tools.current_tool();
        match tool {
            ToolKind::Select => match hit {
                Some(id) => {
                    if double_click && self.begin_text_edit(id) {
                        return;
                    }
                    self.selection = Some(id);
                    if let Some(element) = self.document.element(id) {
                        self.tools.begin(Gesture::Dragging {
                            id,
                            last: point,
                            origin: element.position,
                        });
                    }
                }
                None => self.selection = None,
            },
            ToolKind::Pan => self.tools.begin(Gesture::Panning { last: screen }),
            ToolKind::Pen | ToolKind::Eraser => {
                if let Some(mode) = tool.stroke_mode() {
                    let stroke = self.tools.settings.start_stroke(mode, point);
                    self.tools.begin(Gesture::Drawing { stroke });
                }
            }
            ToolKind::Rectangle
            | ToolKind::Circle
            | ToolKind::Triangle
            | ToolKind::Arrow
            | ToolKind::Text
            | ToolKind::StickyNote => {
                if let Some(kind) = tool.element_kind() {
                    self.add_element(kind, point);
                    self.tools.begin(Gesture::Placed);
                }
            }
        }
    }

    fn handle_drag(&mut self, screen: Point) {
        let point = self.viewport.to_document_coords(screen);
        let mut pan_delta = None;
        match self.tools.gesture_mut() {
            Gesture::Dragging { id, last, .. } => {
                let delta = point - *last;
                *last = point;
                if let Some(element) = self.document.element_mut(*id) {
                    element.translate(delta);
                }
            }
            Gesture::Panning { last } => {
                pan_delta = Some(screen - *last);
                *last = screen;
            }
            Gesture::Drawing { stroke } => stroke.add_point(point),
            Gesture::Idle | Gesture::Placed => {}
        }
        if let Some(delta) = pan_delta {
            self.pan_by(delta);
        }
    }

    fn handle_release(&mut self, screen: Point) {
        let point = self.viewport.to_document_coords(screen);
        match self.tools.finish() {
            Gesture::Dragging { id, origin, .. } => {
                let Some(current) = self.document.element(id).map(|e| e.position) else {
                    return;
                };
                if current != origin {
                    // Checkpoint the pre-drag state, then re-apply the move
                    self.set_position(id, origin);
                    self.history.checkpoint(&self.document);
                    self.set_position(id, current);
                    self.touch();
                    log::debug!("moved {id} by {:?}", current - origin);
                }
            }
            Gesture::Drawing { mut stroke } => {
                if stroke.points.last() != Some(&point) {
                    stroke.add_point(point);
                }
                self.commit_stroke(stroke);
            }
            Gesture::Idle | Gesture::Panning { .. } | Gesture::Placed => {}
        }
    }

    fn set_position(&mut self, id: ElementId, position: Point) {
        if let Some(element) = self.document.element_mut(id) {
            element.position = position;
        }
    }

    /// Handle a key press. Returns true if it was consumed.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if let Some(state) = &mut self.text_edit {
            match state.handle_key(event) {
                TextEditResult::Handled => return true,
                TextEditResult::ExitEdit => {
                    self.commit_text_edit();
                    return true;
                }
                TextEditResult::NotHandled => self.commit_text_edit(),
            };
        }
        match Command::from_key(event) {
            Some(command) => {
                self.execute(command);
                true
            }
            None => false,
        }
    }

    /// Run a keyboard command.
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Undo => {
                self.undo();
            }
            Command::Redo => {
                self.redo();
            }
            Command::DeleteSelection => {
                self.delete_selected();
            }
            Command::Cancel => {
                if self.tools.is_active() {
                    self.cancel_gesture();
                } else {
                    self.selection = None;
                }
            }
            Command::ResetView => self.reset_view(),
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::SelectTool(tool) => self.set_tool(tool),
        }
    }

    // --- Document mutations ---

    /// Create an element of `kind` at `position` (document coordinates) and
    /// select it.
    pub fn add_element(&mut self, kind: ElementKind, position: Point) -> ElementId {
        self.history.checkpoint(&self.document);
        let id = self.document.add_element(kind, position, &self.tools.settings).id();
        self.selection = Some(id);
        self.touch();
        log::debug!("added {} {id}", kind.name());
        id
    }

    /// Place an image element at `position` and select it.
    pub fn add_image(&mut self, position: Point, image: EmbeddedImage) -> ElementId {
        self.history.checkpoint(&self.document);
        let mut element = Element::image(position, image, self.tools.settings.element_style(ElementKind::Image));
        element.z_index = self.document.next_z_index();
        let id = self.document.push_element(element).id();
        self.selection = Some(id);
        self.touch();
        id
    }

    /// Merge `patch` into an element. Unknown ids and empty patches are no-ops.
    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        if patch.is_empty() || self.document.element(id).is_none() {
            return false;
        }
        self.history.checkpoint(&self.document);
        self.document.update_element(id, patch);
        self.touch();
        true
    }

    /// Remove an element. Unknown ids are a no-op.
    pub fn delete_element(&mut self, id: ElementId) -> bool {
        if self.document.element(id).is_none() {
            return false;
        }
        if matches!(self.tools.gesture(), Gesture::Dragging { id: dragged, .. } if *dragged == id) {
            self.tools.cancel();
        }
        self.history.checkpoint(&self.document);
        self.document.delete_element(id);
        if self.selection == Some(id) {
            self.selection = None;
        }
        if self.text_edit.as_ref().is_some_and(|s| s.element_id() == id) {
            self.text_edit = None;
        }
        self.touch();
        log::debug!("deleted {id}");
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selection {
            Some(id) => self.delete_element(id),
            None => false,
        }
    }

    /// Append a finished stroke. Strokes with fewer than two points are
    /// dropped.
    pub fn commit_stroke(&mut self, mut stroke: Stroke) -> bool {
        if stroke.is_degenerate() {
            log::debug!("ignoring degenerate stroke");
            return false;
        }
        stroke.simplify(self.config.stroke_simplify_tolerance);
        self.history.checkpoint(&self.document);
        self.document.commit_stroke(stroke);
        self.touch();
        true
    }

    /// Remove all elements and strokes. Requires `confirmed`; a single
    /// `undo` restores everything.
    pub fn clear_all(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            log::debug!("clear_all without confirmation ignored");
            return false;
        }
        if self.document.is_empty() {
            return false;
        }
        self.cancel_gesture();
        self.text_edit = None;
        self.history.checkpoint(&self.document);
        self.document.clear_all();
        self.selection = None;
        self.touch();
        log::info!("cleared document {}", self.document.id);
        true
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        if self.document.element(id).is_none() {
            return false;
        }
        self.history.checkpoint(&self.document);
        self.document.bring_to_front(id);
        self.touch();
        true
    }

    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        if self.document.element(id).is_none() {
            return false;
        }
        self.history.checkpoint(&self.document);
        self.document.send_to_back(id);
        self.touch();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.commit_text_edit();
        self.cancel_gesture();
        let changed = self.history.undo(&mut self.document);
        if changed {
            self.after_history_step();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        self.commit_text_edit();
        self.cancel_gesture();
        let changed = self.history.redo(&mut self.document);
        if changed {
            self.after_history_step();
        }
        changed
    }

    fn after_history_step(&mut self) {
        if self.selection.is_some_and(|id| self.document.element(id).is_none()) {
            self.selection = None;
        }
        self.touch();
    }

    // --- Inline text editing ---

    /// Start editing the content of a text or sticky-note element.
    pub fn begin_text_edit(&mut self, id: ElementId) -> bool {
        let Some(element) = self.document.element(id) else {
            return false;
        };
        if !element.kind.carries_text() {
            return false;
        }
        let state = TextEditState::new(id, &element.content);
        self.commit_text_edit();
        self.cancel_gesture();
        self.text_edit = Some(state);
        self.selection = Some(id);
        true
    }

    /// Type into the element being edited.
    pub fn insert_text(&mut self, text: &str) -> bool {
        match &mut self.text_edit {
            Some(state) => {
                state.insert_str(text);
                true
            }
            None => false,
        }
    }

    /// Finish editing, writing changed content back as one undo step.
    pub fn commit_text_edit(&mut self) -> bool {
        let Some(state) = self.text_edit.take() else {
            return false;
        };
        if !state.is_modified() {
            return false;
        }
        let id = state.element_id();
        self.update_element(id, ElementPatch::default().content(state.into_text()))
    }

    /// Stop editing and discard typed text.
    pub fn cancel_text_edit(&mut self) {
        self.text_edit = None;
    }

    // --- View ---

    /// Set the screen position of the canvas surface.
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.viewport.origin = origin;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
        self.touch();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.touch();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.touch();
    }

    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.viewport.zoom_at(screen_point, factor);
        self.touch();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, Modifiers};
    use crate::style::Rgba;
    use kurbo::Size;
    use std::time::Duration;

    fn press(editor: &mut Editor, x: f64, y: f64) {
        editor.handle_pointer(PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
        });
    }

    fn move_to(editor: &mut Editor, x: f64, y: f64) {
        editor.handle_pointer(PointerEvent::Move {
            position: Point::new(x, y),
        });
    }

    fn release(editor: &mut Editor, x: f64, y: f64) {
        editor.handle_pointer(PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        });
    }

    fn click(editor: &mut Editor, x: f64, y: f64) {
        press(editor, x, y);
        release(editor, x, y);
    }

    #[test]
    fn test_create_select_undo_redo() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::Rectangle);
        click(&mut editor, 50.0, 50.0);

        let doc = editor.document();
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].position, Point::new(50.0, 50.0));
        assert_eq!(doc.elements[0].size(), Size::new(100.0, 100.0));
        let id = doc.elements[0].id();

        editor.set_tool(ToolKind::Select);
        assert_eq!(editor.selection(), None);
        click(&mut editor, 75.0, 75.0);
        assert_eq!(editor.selection(), Some(id));

        assert!(editor.undo());
        assert!(editor.document().elements.is_empty());
        assert_eq!(editor.selection(), None);

        assert!(editor.redo());
        assert_eq!(editor.document().elements.len(), 1);
        assert_eq!(editor.document().elements[0].id(), id);
    }

    #[test]
    fn test_pen_stroke_commit_and_undo() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::Pen);
        let blue = Rgba::from_hex("#3B82F6").unwrap();
        editor.settings_mut().stroke_color = blue;
        editor.settings_mut().stroke_width = 3.0;

        press(&mut editor, 0.0, 0.0);
        move_to(&mut editor, 10.0, 0.0);
        move_to(&mut editor, 10.0, 10.0);
        assert_eq!(editor.active_stroke().map(Stroke::len), Some(3));
        assert!(editor.document().strokes.is_empty());
        release(&mut editor, 10.0, 10.0);

        let strokes = &editor.document().strokes;
        assert_eq!(strokes.len(), 1);
        assert_eq!(
            strokes[0].points,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
        assert_eq!(strokes[0].color, blue);
        assert!((strokes[0].stroke_width - 3.0).abs() < f64::EPSILON);

        assert!(editor.undo());
        assert!(editor.document().strokes.is_empty());
    }

    #[test]
    fn test_zoom_in_shortcut_five_times() {
        let mut editor = Editor::default();
        let zoom_in = KeyEvent::new(Key::Character('='), Modifiers::CTRL);
        for _ in 0..5 {
            assert!(editor.handle_key(&zoom_in));
        }
        assert!((editor.viewport().zoom - 2.48832).abs() < 1e-9);

        editor.handle_key(&KeyEvent::new(Key::Character('0'), Modifiers::CTRL));
        assert!((editor.viewport().zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_all_is_one_undo_step() {
        let mut editor = Editor::default();
        for i in 0..3 {
            editor.add_element(ElementKind::Circle, Point::new(i as f64 * 200.0, 0.0));
        }
        for i in 0..2 {
            let y = i as f64 * 50.0;
            editor.commit_stroke(Stroke::from_points(
                crate::stroke::StrokeMode::Draw,
                Rgba::black(),
                2.0,
                vec![Point::new(0.0, y), Point::new(100.0, y)],
            ));
        }

        assert!(!editor.clear_all(false));
        assert_eq!(editor.document().elements.len(), 3);

        assert!(editor.clear_all(true));
        assert!(editor.document().is_empty());

        assert!(editor.undo());
        assert_eq!(editor.document().elements.len(), 3);
        assert_eq!(editor.document().strokes.len(), 2);
    }

    #[test]
    fn test_drag_checkpoints_once() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::Rectangle, Point::new(0.0, 0.0));
        let steps = editor.history().cursor();

        press(&mut editor, 10.0, 10.0);
        move_to(&mut editor, 20.0, 15.0);
        move_to(&mut editor, 40.0, 30.0);
        assert_eq!(editor.history().cursor(), steps);
        release(&mut editor, 40.0, 30.0);

        assert_eq!(editor.document().element(id).unwrap().position, Point::new(30.0, 20.0));
        assert_eq!(editor.history().cursor(), steps + 1);

        assert!(editor.undo());
        assert_eq!(editor.document().element(id).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_click_without_move_does_not_checkpoint() {
        let mut editor = Editor::default();
        editor.add_element(ElementKind::Rectangle, Point::ZERO);
        let steps = editor.history().cursor();
        click(&mut editor, 10.0, 10.0);
        click(&mut editor, 500.0, 500.0);
        assert_eq!(editor.history().cursor(), steps);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_escape_cancels_drag() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::Triangle, Point::new(100.0, 100.0));
        let steps = editor.history().cursor();

        press(&mut editor, 110.0, 110.0);
        move_to(&mut editor, 300.0, 300.0);
        editor.handle_key(&KeyEvent::plain(Key::Escape));
        release(&mut editor, 300.0, 300.0);

        assert_eq!(editor.document().element(id).unwrap().position, Point::new(100.0, 100.0));
        assert_eq!(editor.history().cursor(), steps);
        assert_eq!(editor.selection(), Some(id));
    }

    #[test]
    fn test_tool_switch_discards_stroke() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::Eraser);
        press(&mut editor, 0.0, 0.0);
        move_to(&mut editor, 50.0, 50.0);
        editor.handle_key(&KeyEvent::char('v'));
        release(&mut editor, 50.0, 50.0);

        assert_eq!(editor.tools().current_tool(), ToolKind::Select);
        assert!(editor.document().strokes.is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_single_point_stroke_is_dropped() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::Pen);
        click(&mut editor, 5.0, 5.0);
        assert!(editor.document().strokes.is_empty());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut editor = Editor::default();
        editor.add_element(ElementKind::Arrow, Point::ZERO);
        let steps = editor.history().cursor();
        assert!(!editor.delete_element(uuid::Uuid::new_v4()));
        assert!(!editor.update_element(uuid::Uuid::new_v4(), ElementPatch::default().rotation(10.0)));
        assert_eq!(editor.history().cursor(), steps);
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::StickyNote, Point::ZERO);
        assert_eq!(editor.selection(), Some(id));

        assert!(editor.handle_key(&KeyEvent::plain(Key::Delete)));
        assert!(editor.document().elements.is_empty());
        assert_eq!(editor.selection(), None);

        // Nothing selected: no checkpoint
        let steps = editor.history().cursor();
        editor.handle_key(&KeyEvent::plain(Key::Backspace));
        assert_eq!(editor.history().cursor(), steps);
    }

    #[test]
    fn test_double_click_edits_text() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::Text, Point::ZERO);
        let steps = editor.history().cursor();
        let start = Instant::now();
        let down = PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Left,
        };
        let up = PointerEvent::Up {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Left,
        };

        editor.handle_pointer_at(down, start);
        editor.handle_pointer_at(up, start);
        editor.handle_pointer_at(down, start + Duration::from_millis(150));
        editor.handle_pointer_at(up, start + Duration::from_millis(150));
        assert_eq!(editor.text_edit().map(TextEditState::element_id), Some(id));

        for _ in 0.."Double-click to edit".len() {
            editor.handle_key(&KeyEvent::plain(Key::Backspace));
        }
        for c in "Agenda".chars() {
            assert!(editor.handle_key(&KeyEvent::char(c)));
        }
        // Tool letters are text while editing
        assert_eq!(editor.tools().current_tool(), ToolKind::Select);
        assert_eq!(editor.history().cursor(), steps);

        editor.handle_key(&KeyEvent::plain(Key::Escape));
        assert!(editor.text_edit().is_none());
        assert_eq!(editor.document().element(id).unwrap().content, "Agenda");
        assert_eq!(editor.history().cursor(), steps + 1);

        assert!(editor.undo());
        assert_eq!(editor.document().element(id).unwrap().content, "Double-click to edit");
    }

    #[test]
    fn test_click_elsewhere_commits_text_edit() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::StickyNote, Point::ZERO);
        assert!(editor.begin_text_edit(id));
        assert!(editor.insert_text("!"));
        click(&mut editor, 1000.0, 1000.0);
        assert!(editor.text_edit().is_none());
        assert_eq!(editor.document().element(id).unwrap().content, "New note!");
    }

    #[test]
    fn test_shapes_cannot_be_text_edited() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::Circle, Point::ZERO);
        assert!(!editor.begin_text_edit(id));
    }

    #[test]
    fn test_middle_button_pans() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::Pen);
        editor.handle_pointer(PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Middle,
        });
        move_to(&mut editor, 130.0, 80.0);
        editor.handle_pointer(PointerEvent::Up {
            position: Point::new(130.0, 80.0),
            button: MouseButton::Middle,
        });
        assert_eq!(editor.viewport().pan, Vec2::new(30.0, -20.0));
        assert!(editor.document().strokes.is_empty());
    }

    #[test]
    fn test_image_added_after_delete_is_on_top() {
        let mut editor = Editor::default();
        let a = editor.add_element(ElementKind::Rectangle, Point::new(300.0, 300.0));
        let c = editor.add_element(ElementKind::Rectangle, Point::ZERO);
        editor.delete_element(a);

        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let image = EmbeddedImage::from_bytes(&png_header, 4, 3).unwrap();
        let d = editor.add_image(Point::ZERO, image);
        let doc = editor.document();
        assert!(doc.element(d).unwrap().z_index > doc.element(c).unwrap().z_index);
        assert_eq!(doc.element_at(Point::new(1.0, 1.0)), Some(d));
    }

    #[test]
    fn test_other_button_release_keeps_drag() {
        let mut editor = Editor::default();
        let id = editor.add_element(ElementKind::Rectangle, Point::new(0.0, 0.0));
        press(&mut editor, 10.0, 10.0);
        move_to(&mut editor, 30.0, 10.0);
        editor.handle_pointer(PointerEvent::Up {
            position: Point::new(30.0, 10.0),
            button: MouseButton::Right,
        });
        assert!(editor.tools().is_active());

        move_to(&mut editor, 50.0, 10.0);
        release(&mut editor, 50.0, 10.0);
        assert!(!editor.tools().is_active());
        assert_eq!(editor.document().element(id).unwrap().position, Point::new(40.0, 0.0));
        assert!(editor.undo());
        assert_eq!(editor.document().element(id).unwrap().position, Point::ZERO);
    }

    #[test]
    fn test_left_release_does_not_end_middle_pan() {
        let mut editor = Editor::default();
        editor.handle_pointer(PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Middle,
        });
        move_to(&mut editor, 110.0, 100.0);
        release(&mut editor, 110.0, 100.0);
        move_to(&mut editor, 120.0, 100.0);
        assert_eq!(editor.viewport().pan, Vec2::new(20.0, 0.0));

        editor.handle_pointer(PointerEvent::Up {
            position: Point::new(120.0, 100.0),
            button: MouseButton::Middle,
        });
        move_to(&mut editor, 150.0, 100.0);
        assert_eq!(editor.viewport().pan, Vec2::new(20.0, 0.0));
    }

    #[test]
    fn test_ctrl_scroll_zooms_at_cursor() {
        let mut editor = Editor::default();
        let cursor = Point::new(320.0, 240.0);
        let before = editor.viewport().to_document_coords(cursor);
        editor.handle_pointer(PointerEvent::Scroll {
            position: cursor,
            delta: Vec2::new(0.0, -100.0),
            modifiers: Modifiers::CTRL,
        });
        assert!((editor.viewport().zoom - 1.2).abs() < 1e-9);
        let after = editor.viewport().to_document_coords(cursor);
        assert!((after - before).hypot() < 1e-9);

        editor.handle_pointer(PointerEvent::Scroll {
            position: cursor,
            delta: Vec2::new(0.0, 40.0),
            modifiers: Modifiers::NONE,
        });
        assert!((editor.viewport().zoom - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_tools_use_zoomed_coordinates() {
        let mut editor = Editor::default();
        editor.zoom_at(Point::ZERO, 2.0);
        editor.set_canvas_origin(Point::new(0.0, 40.0));
        editor.set_tool(ToolKind::Circle);
        click(&mut editor, 100.0, 140.0);
        assert_eq!(editor.document().elements[0].position, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_revision_tracks_changes() {
        let mut editor = Editor::default();
        let start = editor.revision();
        editor.set_tool(ToolKind::Select);
        assert_eq!(editor.revision(), start);
        editor.add_element(ElementKind::Rectangle, Point::ZERO);
        assert_ne!(editor.revision(), start);

        editor.zoom_in();
        let saved = editor.snapshot_for_save();
        assert!((saved.view.zoom - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_open_restores_view_and_resets_history() {
        let mut editor = Editor::default();
        editor.add_element(ElementKind::Rectangle, Point::ZERO);

        let mut document = Document::new();
        document.view.zoom = 2.0;
        editor.open(document);
        assert!((editor.viewport().zoom - 2.0).abs() < f64::EPSILON);
        assert!(!editor.can_undo());
        assert!(editor.document().elements.is_empty());
    }

    #[test]
    fn test_z_order_changes_are_undoable() {
        let mut editor = Editor::default();
        let back = editor.add_element(ElementKind::Rectangle, Point::ZERO);
        let front = editor.add_element(ElementKind::Rectangle, Point::ZERO);
        assert!(editor.bring_to_front(back));
        assert_eq!(editor.document().element_at(Point::new(5.0, 5.0)), Some(back));
        assert!(editor.undo());
        assert_eq!(editor.document().element_at(Point::new(5.0, 5.0)), Some(front));
    }
}
