/// What the single-line prompt at the bottom of the screen is collecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    GoTo,
    Search,
    ItemTitle,
    ItemBody,
    Comment,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::GoTo => "Go to",
            InputMode::Search => "Search items",
            InputMode::ItemTitle => "New item title",
            InputMode::ItemBody => "New item body (optional)",
            InputMode::Comment => "Comment",
        }
    }
}

pub struct InputState {
    pub buffer: String,
    pub mode: InputMode,
    cursor_position: usize,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            mode: InputMode::Normal,
            cursor_position: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode != InputMode::Normal
    }

    pub fn begin(&mut self, mode: InputMode, initial: &str) {
        self.mode = mode;
        self.buffer = initial.to_string();
        self.cursor_position = self.buffer.chars().count();
    }

    fn byte_index(&self) -> usize {
        self.buffer
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    pub fn cursor(&self) -> usize {
        self.cursor_position
    }

    pub fn handle_char(&mut self, c: char) {
        let idx = self.byte_index();
        self.buffer.insert(idx, c);
        self.cursor_position += 1;
    }

    pub fn handle_backspace(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let idx = self.byte_index();
        self.buffer.remove(idx);
    }

    pub fn move_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.buffer.chars().count());
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor_position = 0;
        self.mode = InputMode::Normal;
    }

    /// Ends the prompt, handing back what was typed.
    pub fn submit(&mut self) -> (InputMode, String) {
        let mode = self.mode;
        let text = std::mem::take(&mut self.buffer);
        self.clear();
        (mode, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_the_cursor_with_multibyte_text() {
        let mut input = InputState::new();
        input.begin(InputMode::Search, "héllo");
        input.move_left();
        input.move_left();
        input.handle_char('X');
        assert_eq!(input.buffer, "hélXlo");
        input.handle_backspace();
        input.handle_backspace();
        assert_eq!(input.buffer, "hélo");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn submit_returns_mode_and_text_and_resets() {
        let mut input = InputState::new();
        input.begin(InputMode::Comment, "");
        for c in "ok".chars() {
            input.handle_char(c);
        }
        assert_eq!(input.submit(), (InputMode::Comment, "ok".to_string()));
        assert!(!input.is_active());
        assert!(input.buffer.is_empty());
    }
}
