//! Line buffer and cursor positions.
//!
//! Columns count characters, not bytes.

/// Cursor position in the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Text held as lines without their terminators. Never empty: a blank
/// buffer is one empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    pub fn from_content(content: &str) -> Self {
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        if lines.is_empty() {
            Self::new()
        } else {
            Self { lines }
        }
    }

    /// File contents: lines joined with `\n` plus a final newline, or nothing
    /// for a blank buffer.
    pub fn content(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut content = self.lines.join("\n");
        content.push('\n');
        content
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length of a line in characters (0 past the end).
    pub fn line_len(&self, index: usize) -> usize {
        self.line(index).map_or(0, |line| line.chars().count())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Column of the first non-blank character.
    pub fn first_non_blank(&self, index: usize) -> usize {
        self.line(index)
            .and_then(|line| line.chars().position(|c| !c.is_whitespace()))
            .unwrap_or(0)
    }

    /// Lines `[at, at + count)`, clamped to the buffer.
    pub fn slice(&self, at: usize, count: usize) -> &[String] {
        let start = at.min(self.lines.len());
        let end = at.saturating_add(count).min(self.lines.len());
        &self.lines[start..end]
    }

    /// Replace `remove` lines starting at `at` with `insert`.
    pub(super) fn splice(&mut self, at: usize, remove: usize, insert: &[String]) {
        let start = at.min(self.lines.len());
        let end = at.saturating_add(remove).min(self.lines.len());
        self.lines.splice(start..end, insert.iter().cloned());
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
    }
}

/// Byte offset of character `column` in `line`, clamped to its length.
pub fn byte_index(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map_or(line.len(), |(idx, _)| idx)
}

/// Split `line` at character `column`.
pub fn split_at_column(line: &str, column: usize) -> (&str, &str) {
    line.split_at(byte_index(line, column))
}
