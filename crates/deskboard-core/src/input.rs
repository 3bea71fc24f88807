//! Pointer and keyboard events, and the keyboard shortcut table.

use crate::tools::ToolKind;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        ..Self::NONE
    };

    /// Platform command modifier (Ctrl, or Cmd on macOS).
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Scroll { position, .. } => position,
        }
    }
}

/// Logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Character(char),
    Delete,
    Backspace,
    Escape,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

impl Key {
    /// Display label used in shortcut listings.
    pub fn label(&self) -> String {
        match self {
            Key::Character(c) => c.to_uppercase().to_string(),
            Key::Delete => "Delete".to_string(),
            Key::Backspace => "Backspace".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Enter => "Enter".to_string(),
            Key::Tab => "Tab".to_string(),
            Key::Left => "Left".to_string(),
            Key::Right => "Right".to_string(),
            Key::Up => "Up".to_string(),
            Key::Down => "Down".to_string(),
            Key::Home => "Home".to_string(),
            Key::End => "End".to_string(),
        }
    }
}

/// Key press with the modifiers held at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Unmodified key press.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn char(c: char) -> Self {
        Self::plain(Key::Character(c))
    }
}

/// Editor action bound to a keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Undo,
    Redo,
    DeleteSelection,
    Cancel,
    ResetView,
    ZoomIn,
    ZoomOut,
    SelectTool(ToolKind),
}

impl Command {
    /// Resolve a key press to a command, if it is bound to one.
    pub fn from_key(event: &KeyEvent) -> Option<Self> {
        let mods = event.modifiers;
        match event.key {
            Key::Delete | Key::Backspace => Some(Command::DeleteSelection),
            Key::Escape => Some(Command::Cancel),
            Key::Character(c) if mods.command() => match c.to_ascii_lowercase() {
                'z' if mods.shift => Some(Command::Redo),
                'z' => Some(Command::Undo),
                'y' => Some(Command::Redo),
                '0' => Some(Command::ResetView),
                '=' | '+' => Some(Command::ZoomIn),
                '-' | '_' => Some(Command::ZoomOut),
                _ => None,
            },
            Key::Character(c) if !mods.alt => ToolKind::from_shortcut(c).map(Command::SelectTool),
            _ => None,
        }
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: Key, ctrl: bool, shift: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        parts.push(self.key.label());
        parts.join("+")
    }

    /// The key event that triggers this shortcut.
    pub fn event(&self) -> KeyEvent {
        KeyEvent::new(
            self.key,
            Modifiers {
                ctrl: self.ctrl,
                shift: self.shift,
                ..Modifiers::NONE
            },
        )
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        let mut shortcuts = vec![
            Shortcut::new(Key::Character('z'), true, false, "Undo"),
            Shortcut::new(Key::Character('z'), true, true, "Redo"),
            Shortcut::new(Key::Character('y'), true, false, "Redo"),
            Shortcut::new(Key::Character('0'), true, false, "Reset view"),
            Shortcut::new(Key::Character('='), true, false, "Zoom in"),
            Shortcut::new(Key::Character('-'), true, false, "Zoom out"),
            Shortcut::new(Key::Delete, false, false, "Delete selected element"),
            Shortcut::new(Key::Backspace, false, false, "Delete selected element"),
            Shortcut::new(Key::Escape, false, false, "Cancel current action"),
        ];
        shortcuts.extend(TOOL_SHORTCUTS.iter().map(|&(tool, description)| {
            Shortcut::new(Key::Character(tool.shortcut()), false, false, description)
        }));
        shortcuts
    }
}

const TOOL_SHORTCUTS: [(ToolKind, &str); 10] = [
    (ToolKind::Select, "Select tool"),
    (ToolKind::Pan, "Pan tool"),
    (ToolKind::Pen, "Pen tool"),
    (ToolKind::Eraser, "Eraser tool"),
    (ToolKind::Rectangle, "Rectangle tool"),
    (ToolKind::Circle, "Circle tool"),
    (ToolKind::Triangle, "Triangle tool"),
    (ToolKind::Arrow, "Arrow tool"),
    (ToolKind::Text, "Text tool"),
    (ToolKind::StickyNote, "Sticky note tool"),
];

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Detects double clicks from a sequence of primary-button presses.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(Instant, Point)>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press at `position`. Returns true if it completes a double click.
    pub fn register(&mut self, position: Point, now: Instant) -> bool {
        if let Some((last_time, last_pos)) = self.last_click {
            let elapsed = now.saturating_duration_since(last_time).as_millis();
            if elapsed < DOUBLE_CLICK_TIME_MS && (position - last_pos).hypot() < DOUBLE_CLICK_DISTANCE {
                // Reset to prevent triple-click being detected as another double-click
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some((now, position));
        false
    }
}
