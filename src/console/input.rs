//! A single-line text field with a character-indexed cursor.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    buffer: String,
    cursor_pos: usize,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    /// Replaces the whole contents and moves the cursor to the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.cursor_end();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor_pos = 0;
    }

    /// Returns the contents and leaves the field empty.
    pub fn take(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.buffer)
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.byte_index(self.cursor_pos);
        self.buffer.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    pub fn remove_char_before(&mut self) -> bool {
        if self.cursor_pos == 0 {
            return false;
        }
        let byte_pos = self.byte_index(self.cursor_pos - 1);
        self.buffer.remove(byte_pos);
        self.cursor_pos -= 1;
        true
    }

    pub fn remove_char_at(&mut self) -> bool {
        if self.cursor_pos >= self.char_count() {
            return false;
        }
        let byte_pos = self.byte_index(self.cursor_pos);
        self.buffer.remove(byte_pos);
        true
    }

    pub fn cursor_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor_pos < self.char_count() {
            self.cursor_pos += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_pos = self.char_count();
    }

    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_respects_multibyte_characters() {
        let mut line = InputLine::new();
        for c in "héllo".chars() {
            line.insert_char(c);
        }
        line.cursor_left();
        line.cursor_left();
        line.cursor_left();
        assert!(line.remove_char_before());
        assert_eq!(line.as_str(), "hllo");
        line.insert_char('é');
        assert_eq!(line.as_str(), "héllo");
        assert!(line.remove_char_at());
        assert_eq!(line.as_str(), "hélo");
    }

    #[test]
    fn take_empties_the_field() {
        let mut line = InputLine::new();
        line.set("  spaced  ");
        assert!(!line.is_blank());
        assert_eq!(line.take(), "  spaced  ");
        assert!(line.is_blank());
        assert_eq!(line.cursor_pos(), 0);
    }
}
