//! Platform-independent key events.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    /// Letter pressed with Ctrl, lowercased.
    Ctrl(char),
}

impl Key {
    /// Translate a browser `KeyboardEvent.key` value.
    ///
    /// Returns `None` for keys the editor ignores (modifiers, function keys).
    pub fn from_dom(key: &str, ctrl: bool) -> Option<Self> {
        let named = match key {
            "Enter" => Some(Self::Enter),
            "Escape" | "Esc" => Some(Self::Escape),
            "Backspace" => Some(Self::Backspace),
            "Delete" => Some(Self::Delete),
            "Tab" => Some(Self::Tab),
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            "Home" => Some(Self::Home),
            "End" => Some(Self::End),
            "PageUp" => Some(Self::PageUp),
            "PageDown" => Some(Self::PageDown),
            _ => None,
        };
        if named.is_some() {
            return named;
        }

        let mut chars = key.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Some(if ctrl {
            Self::Ctrl(c.to_ascii_lowercase())
        } else {
            Self::Char(c)
        })
    }
}
