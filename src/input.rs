use secrecy::SecretString;

/// Single-line editor state for the password field
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub value: String,
    pub cursor: usize,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Hand the entered text off as a secret and wipe the field
    pub fn submit(&mut self) -> SecretString {
        let secret = SecretString::from(std::mem::take(&mut self.value));
        self.cursor = 0;
        secret
    }

    pub fn insert(&mut self, c: char) {
        let byte_idx = self
            .value
            .chars()
            .take(self.cursor)
            .map(|c| c.len_utf8())
            .sum();
        self.value.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self
                .value
                .chars()
                .take(self.cursor - 1)
                .map(|c| c.len_utf8())
                .sum();
            self.value.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn backspace_word(&mut self) {
        if self.cursor > 0 {
            let chars: Vec<char> = self.value.chars().collect();
            let mut idx = self.cursor;
            while idx > 0 && idx <= chars.len() && chars[idx - 1].is_whitespace() {
                idx -= 1;
            }
            while idx > 0 && !chars[idx - 1].is_whitespace() {
                idx -= 1;
            }

            let start_byte = chars.iter().take(idx).map(|c| c.len_utf8()).sum::<usize>();
            let end_byte = chars
                .iter()
                .take(self.cursor)
                .map(|c| c.len_utf8())
                .sum::<usize>();

            self.value.replace_range(start_byte..end_byte, "");
            self.cursor = idx;
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Handle common editing keys, returns true if the key was handled
    pub fn handle_key(&mut self, key: &crossterm::event::KeyEvent) -> bool {
        use crossterm::event::{KeyCode, KeyModifiers};

        match key.code {
            KeyCode::Char(c) => {
                self.insert(c);
                true
            }
            KeyCode::Backspace
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.backspace_word();
                true
            }
            KeyCode::Backspace => {
                self.backspace();
                true
            }
            KeyCode::Left => {
                self.move_left();
                true
            }
            KeyCode::Right => {
                self.move_right();
                true
            }
            KeyCode::Home => {
                self.move_home();
                true
            }
            KeyCode::End => {
                self.move_end();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn insert_and_backspace_track_the_cursor() {
        let mut input = InputState::new();
        for c in "hunter2".chars() {
            input.insert(c);
        }
        assert_eq!(input.value, "hunter2");
        assert_eq!(input.cursor, 7);

        input.backspace();
        assert_eq!(input.value, "hunter");
        assert_eq!(input.cursor, 6);
    }

    #[test]
    fn insert_mid_string_respects_multibyte_chars() {
        let mut input = InputState::new();
        input.insert('é');
        input.insert('x');
        input.move_left();
        input.move_left();
        input.insert('a');
        assert_eq!(input.value, "aéx");
    }

    #[test]
    fn submit_yields_the_secret_and_wipes_the_field() {
        let mut input = InputState::new();
        for c in "hunter2".chars() {
            input.insert(c);
        }
        let secret = input.submit();
        assert_eq!(secret.expose_secret(), "hunter2");
        assert_eq!(input.value, "");
        assert_eq!(input.cursor, 0);
    }
}
