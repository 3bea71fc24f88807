//! Deskboard Core Library
//!
//! Platform-agnostic document model, tools, history and persistence for the
//! Deskboard whiteboard.

pub mod config;
pub mod document;
pub mod editor;
pub mod element;
pub mod history;
pub mod input;
pub mod storage;
pub mod stroke;
pub mod style;
pub mod text_edit;
pub mod tools;
pub mod viewport;

pub use config::{ConfigError, EditorConfig};
pub use document::{Document, ViewState};
pub use editor::Editor;
pub use element::{Element, ElementId, ElementKind, ElementPatch, EmbeddedImage, ImageFormat};
pub use history::History;
pub use input::{Command, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use storage::{AutoSaver, SaveStatus, Storage, StorageError, StorageResult};
pub use stroke::{Stroke, StrokeId, StrokeMode};
pub use style::{ElementStyle, Rgba};
pub use text_edit::{TextEditResult, TextEditState};
pub use tools::{Gesture, ToolKind, ToolManager, ToolSettings};
pub use viewport::Viewport;
