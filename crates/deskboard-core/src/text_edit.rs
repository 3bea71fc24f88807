//! Inline plain-text editing of text and sticky-note elements.

use crate::element::ElementId;
use crate::input::{Key, KeyEvent};

/// Result of handling a text editing event.
#[derive(Debug, Clone, PartialEq)]
pub enum TextEditResult {
    /// Event was handled, text may have changed.
    Handled,
    /// Event was handled, user wants to exit editing.
    ExitEdit,
    /// Event was not handled (pass to other handlers).
    NotHandled,
}

/// Editing state for the element whose content is being typed into.
///
/// The cursor is a byte offset that always sits on a char boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditState {
    element_id: ElementId,
    buffer: String,
    cursor: usize,
    /// Content when editing started.
    original: String,
}

impl TextEditState {
    /// Start editing `text`, with the cursor at the end.
    pub fn new(element_id: ElementId, text: &str) -> Self {
        Self {
            element_id,
            buffer: text.to_string(),
            cursor: text.len(),
            original: text.to_string(),
        }
    }

    pub fn element_id(&self) -> ElementId {
        self.element_id
    }

    /// Get the current text content.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor position as a byte offset into [`text`](Self::text).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the text differs from when editing started.
    pub fn is_modified(&self) -> bool {
        self.buffer != self.original
    }

    /// Consume the state, returning the edited text.
    pub fn into_text(self) -> String {
        self.buffer
    }

    pub fn insert_str(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, event: &KeyEvent) -> TextEditResult {
        let word = event.modifiers.command();
        match event.key {
            Key::Escape => return TextEditResult::ExitEdit,
            Key::Enter => self.insert_str("\n"),
            Key::Tab => return TextEditResult::NotHandled,
            Key::Backspace => {
                let start = if word { self.word_start() } else { self.prev_boundary() };
                self.buffer.replace_range(start..self.cursor, "");
                self.cursor = start;
            }
            Key::Delete => {
                let end = if word { self.word_end() } else { self.next_boundary() };
                self.buffer.replace_range(self.cursor..end, "");
            }
            Key::Left => self.cursor = if word { self.word_start() } else { self.prev_boundary() },
            Key::Right => self.cursor = if word { self.word_end() } else { self.next_boundary() },
            Key::Home => self.cursor = self.line_start(),
            Key::End => self.cursor = self.line_end(),
            Key::Up | Key::Down => {}
            Key::Character(c) => {
                // Shortcuts such as Ctrl+Z are not text
                if event.modifiers.command() {
                    return TextEditResult::NotHandled;
                }
                let mut utf8 = [0u8; 4];
                self.insert_str(c.encode_utf8(&mut utf8));
            }
        }
        TextEditResult::Handled
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map_or(self.cursor, |c| self.cursor + c.len_utf8())
    }

    fn word_start(&self) -> usize {
        let before = &self.buffer[..self.cursor];
        let trimmed = before.trim_end();
        trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8())
    }

    fn word_end(&self) -> usize {
        let after = &self.buffer[self.cursor..];
        let skipped = after.len() - after.trim_start().len();
        after[skipped..]
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map_or(self.buffer.len(), |(i, _)| self.cursor + skipped + i)
    }

    fn line_start(&self) -> usize {
        self.buffer[..self.cursor].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_end(&self) -> usize {
        self.buffer[self.cursor..]
            .find('\n')
            .map_or(self.buffer.len(), |i| self.cursor + i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use uuid::Uuid;

    fn type_str(state: &mut TextEditState, text: &str) {
        for c in text.chars() {
            assert_eq!(state.handle_key(&KeyEvent::char(c)), TextEditResult::Handled);
        }
    }

    fn press(state: &mut TextEditState, key: Key) -> TextEditResult {
        state.handle_key(&KeyEvent::plain(key))
    }

    #[test]
    fn test_typing_appends_at_cursor() {
        let mut state = TextEditState::new(Uuid::new_v4(), "Hello");
        type_str(&mut state, " world");
        assert_eq!(state.text(), "Hello world");
        assert!(state.is_modified());
    }

    #[test]
    fn test_cursor_movement_and_insert() {
        let mut state = TextEditState::new(Uuid::new_v4(), "ac");
        press(&mut state, Key::Left);
        type_str(&mut state, "b");
        assert_eq!(state.text(), "abc");
        press(&mut state, Key::Home);
        press(&mut state, Key::Delete);
        assert_eq!(state.text(), "bc");
        press(&mut state, Key::End);
        press(&mut state, Key::Backspace);
        assert_eq!(state.text(), "b");
    }

    #[test]
    fn test_multibyte_characters() {
        let mut state = TextEditState::new(Uuid::new_v4(), "né");
        press(&mut state, Key::Backspace);
        assert_eq!(state.text(), "n");
        type_str(&mut state, "ü✓");
        press(&mut state, Key::Left);
        press(&mut state, Key::Backspace);
        assert_eq!(state.text(), "n✓");
    }

    #[test]
    fn test_lines() {
        let mut state = TextEditState::new(Uuid::new_v4(), "one");
        press(&mut state, Key::Enter);
        type_str(&mut state, "two");
        assert_eq!(state.text(), "one\ntwo");
        press(&mut state, Key::Home);
        assert_eq!(state.cursor(), 4);
        press(&mut state, Key::Left);
        press(&mut state, Key::Home);
        assert_eq!(state.cursor(), 0);
        press(&mut state, Key::End);
        assert_eq!(state.cursor(), 3);
    }

    #[test]
    fn test_word_backspace() {
        let mut state = TextEditState::new(Uuid::new_v4(), "buy more milk");
        state.handle_key(&KeyEvent::new(Key::Backspace, Modifiers::CTRL));
        assert_eq!(state.text(), "buy more ");
        state.handle_key(&KeyEvent::new(Key::Backspace, Modifiers::CTRL));
        assert_eq!(state.text(), "buy ");
    }

    #[test]
    fn test_edges_are_noops() {
        let mut state = TextEditState::new(Uuid::new_v4(), "");
        assert_eq!(press(&mut state, Key::Backspace), TextEditResult::Handled);
        assert_eq!(press(&mut state, Key::Delete), TextEditResult::Handled);
        assert_eq!(press(&mut state, Key::Left), TextEditResult::Handled);
        assert_eq!(state.text(), "");
        assert!(!state.is_modified());
    }

    #[test]
    fn test_escape_exits_and_shortcuts_pass_through() {
        let mut state = TextEditState::new(Uuid::new_v4(), "x");
        assert_eq!(press(&mut state, Key::Escape), TextEditResult::ExitEdit);
        let undo = KeyEvent::new(Key::Character('z'), Modifiers::CTRL);
        assert_eq!(state.handle_key(&undo), TextEditResult::NotHandled);
        assert_eq!(state.text(), "x");
    }
}
