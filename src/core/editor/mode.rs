//! Editor modes.
//!
//! Each variant carries only the state that mode needs, so a selection
//! cannot outlive visual mode and a command line cannot exist outside
//! command-line mode.

use super::buffer::Position;

/// What the command line is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// `:` ex command.
    Ex,
    /// `/` search pattern.
    Search,
}

impl Prompt {
    pub fn prefix(&self) -> char {
        match self {
            Self::Ex => ':',
            Self::Search => '/',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal {
        /// First key of a two-key command (`dd`, `yy`, `gg`).
        pending: Option<char>,
    },
    Insert,
    Visual {
        /// Where the selection started; the cursor is the other end.
        anchor: Position,
    },
    CommandLine {
        prompt: Prompt,
        input: String,
    },
}

impl Default for Mode {
    fn default() -> Self {
        Self::normal()
    }
}

impl Mode {
    pub const fn normal() -> Self {
        Self::Normal { pending: None }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Normal { .. } => ModeKind::Normal,
            Self::Insert => ModeKind::Insert,
            Self::Visual { .. } => ModeKind::Visual,
            Self::CommandLine { .. } => ModeKind::Command,
        }
    }
}

/// Mode without its payload, for display and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Normal,
    Insert,
    Visual,
    Command,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Visual => "VISUAL",
            Self::Command => "COMMAND",
        }
    }
}
