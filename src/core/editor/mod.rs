//! Modal vi-style editor hosted by the shell.
//!
//! The shell opens an [`Editor`] when a command asks for one and forwards
//! keys to it until [`Editor::handle_key`] reports [`EditorOutcome::Exit`].
//! Reading and writing files goes through [`EditorIo`], which the session
//! backs with the filesystem store.
//!
//! # Modes
//!
//! - Normal: motions, operators, undo/redo
//! - Insert: text entry; one insert session is one undo step
//! - Visual: charwise selection
//! - Command line: `:` ex commands and `/` searches

mod buffer;
mod commands;
mod input;
mod key;
mod mode;
mod undo;

pub use buffer::{Position, TextBuffer};
pub use commands::ExCommand;
pub use key::Key;
pub use mode::{Mode, ModeKind, Prompt};
pub use undo::{BufferDiff, UndoHistory, VimChange};

use regex::Regex;

use crate::config::editor::{DEFAULT_VIEWPORT_HEIGHT, MAX_UNDO_DEPTH};
use crate::core::error::EditorError;
use crate::core::filesystem;

/// File access for the editor.
pub trait EditorIo {
    /// Contents of the file at absolute `path`, if it exists.
    fn load(&mut self, path: &str) -> Option<String>;
    /// Create or replace the file at absolute `path`.
    fn save(&mut self, path: &str, content: &str) -> bool;
}

/// What the host should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOutcome {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// Status line message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
}

/// Yanked or deleted text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    pub text: String,
    /// Whole lines (`yy`, `dd`) rather than a run of characters.
    pub linewise: bool,
}

/// Last search and where it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub pattern: String,
    pub results: Vec<Position>,
}

const HELP_TEXT: &str = "\
Editor help (press any key to return)

Movement   h j k l  arrows  0 ^ $  w b  gg G  PageUp PageDown
Insert     i a I A o O    Esc returns to normal mode
Edit       x  dd  D  yy  p P  u (undo)  Ctrl-r (redo)
Visual     v, then move; d or x deletes, y yanks
Search     /pattern  n next  N previous

:w [file]      write            :q      quit
:wq  :x        write and quit   :q!     quit without saving
:e[!] file     edit a file      :set nu / nonu
:<number>      go to line       :help   this text";

/// Editor state for one editing session.
#[derive(Debug)]
pub struct Editor {
    buffer: TextBuffer,
    cursor: Position,
    mode: Mode,
    /// Absolute path of the file being edited.
    filename: Option<String>,
    /// Directory relative names are resolved against.
    directory: String,
    history: UndoHistory,
    /// Edits since the last undo step was closed.
    transaction: Option<VimChange>,
    register: Register,
    search: Option<Search>,
    message: Option<StatusMessage>,
    show_line_numbers: bool,
    show_help: bool,
    scroll_offset: usize,
    viewport_height: usize,
}

impl Editor {
    /// Empty, unnamed buffer.
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            buffer: TextBuffer::new(),
            cursor: Position::default(),
            mode: Mode::normal(),
            filename: None,
            directory: directory.into(),
            history: UndoHistory::new(MAX_UNDO_DEPTH),
            transaction: None,
            register: Register::default(),
            search: None,
            message: None,
            show_line_numbers: false,
            show_help: false,
            scroll_offset: 0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }

    /// Editor on `filename`; `content` is `None` for a file that does not
    /// exist yet.
    pub fn open(filename: Option<String>, directory: impl Into<String>, content: Option<&str>) -> Self {
        let mut editor = Self::new(directory);
        if let Some(path) = filename {
            editor.load_buffer(path, content);
        }
        editor
    }

    pub fn with_viewport_height(mut self, height: usize) -> Self {
        self.viewport_height = height.max(1);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn is_modified(&self) -> bool {
        self.history.is_modified() || self.transaction.as_ref().is_some_and(|t| !t.is_empty())
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    pub fn search(&self) -> Option<&Search> {
        self.search.as_ref()
    }

    pub fn show_line_numbers(&self) -> bool {
        self.show_line_numbers
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Text typed on the command line, while it is open.
    pub fn command_input(&self) -> Option<&str> {
        match &self.mode {
            Mode::CommandLine { input, .. } => Some(input),
            _ => None,
        }
    }

    /// Ordered selection bounds in visual mode (both ends inclusive).
    pub fn selection(&self) -> Option<(Position, Position)> {
        match self.mode {
            Mode::Visual { anchor } => Some(if anchor <= self.cursor {
                (anchor, self.cursor)
            } else {
                (self.cursor, anchor)
            }),
            _ => None,
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Lines inside the viewport, numbered when `number` is set. The help
    /// text replaces the buffer while it is shown.
    pub fn visible_lines(&self) -> Vec<String> {
        let (source, offset): (Vec<&str>, usize) = if self.show_help {
            (HELP_TEXT.lines().collect(), 0)
        } else {
            (
                self.buffer.lines().iter().map(String::as_str).collect(),
                self.scroll_offset,
            )
        };

        source
            .into_iter()
            .enumerate()
            .skip(offset)
            .take(self.viewport_height)
            .map(|(index, line)| {
                if self.show_line_numbers && !self.show_help {
                    format!("{:>4} {}", index + 1, line)
                } else {
                    line.to_string()
                }
            })
            .collect()
    }

    /// Mode, file name, modified flag and cursor position.
    pub fn status_line(&self) -> String {
        let name = self.filename.as_deref().unwrap_or("[No Name]");
        let modified = if self.is_modified() { " [+]" } else { "" };
        format!(
            "-- {} -- {}{}  {},{}",
            self.mode_kind().as_str(),
            name,
            modified,
            self.cursor.line + 1,
            self.cursor.column + 1
        )
    }

    /// Bottom line: the command being typed, else the last message.
    pub fn command_line(&self) -> String {
        match &self.mode {
            Mode::CommandLine { prompt, input } => format!("{}{}", prompt.prefix(), input),
            _ => self
                .message
                .as_ref()
                .map(|m| m.text.clone())
                .unwrap_or_default(),
        }
    }

    // =========================================================================
    // Messages
    // =========================================================================

    fn info(&mut self, text: impl Into<String>) {
        self.message = Some(StatusMessage {
            text: text.into(),
            kind: MessageKind::Info,
        });
    }

    fn error(&mut self, err: EditorError) {
        self.message = Some(StatusMessage {
            text: err.to_string(),
            kind: MessageKind::Error,
        });
    }

    // =========================================================================
    // Buffer lifecycle
    // =========================================================================

    /// Absolute path for a name typed in the editor.
    fn resolve(&self, name: &str) -> String {
        let posix = filesystem::strip_drive(name).replace('\\', "/");
        filesystem::resolve(&self.directory, &posix)
    }

    /// Replace the buffer with a file's contents and forget the undo history.
    fn load_buffer(&mut self, path: String, content: Option<&str>) {
        self.buffer = content.map_or_else(TextBuffer::new, TextBuffer::from_content);
        self.history = UndoHistory::new(MAX_UNDO_DEPTH);
        self.transaction = None;
        self.cursor = Position::default();
        self.scroll_offset = 0;
        self.search = None;
        self.show_help = false;
        match content {
            Some(text) => self.info(format!(
                "\"{}\" {}L, {}B",
                path,
                self.buffer.line_count(),
                text.len()
            )),
            None => self.info(format!("\"{}\" [New]", path)),
        }
        self.filename = Some(path);
    }

    // =========================================================================
    // Editing primitives
    // =========================================================================

    /// Replace `remove` lines at `at` with `new`, recording the diff in the
    /// open transaction.
    fn replace_lines(&mut self, at: usize, remove: usize, new: Vec<String>) {
        let old = self.buffer.slice(at, remove).to_vec();
        if old == new {
            return;
        }
        let diff = BufferDiff::new(at, old, new);
        diff.apply(&mut self.buffer);
        let cursor = self.cursor;
        self.transaction
            .get_or_insert_with(|| VimChange::new(cursor))
            .push(diff);
    }

    fn set_line(&mut self, index: usize, text: String) {
        self.replace_lines(index, 1, vec![text]);
    }

    fn current_line(&self) -> &str {
        self.buffer.line(self.cursor.line).unwrap_or_default()
    }

    /// Close the open transaction as one undo step.
    fn commit(&mut self) {
        if let Some(mut change) = self.transaction.take() {
            change.cursor_after = self.cursor;
            self.history.push(change);
        }
    }

    fn undo(&mut self) {
        self.commit();
        match self.history.undo() {
            Some(change) => {
                change.revert(&mut self.buffer);
                self.cursor = change.cursor_before;
                self.info("1 change undone");
            }
            None => self.info("Already at oldest change"),
        }
        self.clamp_cursor();
    }

    fn redo(&mut self) {
        self.commit();
        match self.history.redo() {
            Some(change) => {
                change.apply(&mut self.buffer);
                self.cursor = change.cursor_before;
                self.info("1 change redone");
            }
            None => self.info("Already at newest change"),
        }
        self.clamp_cursor();
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// Highest column the cursor may occupy in the current mode.
    fn max_column(&self, line: usize) -> usize {
        let len = self.buffer.line_len(line);
        match self.mode {
            Mode::Insert => len,
            _ => len.saturating_sub(1),
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor.line = self.cursor.line.min(self.buffer.line_count() - 1);
        self.cursor.column = self.cursor.column.min(self.max_column(self.cursor.line));
    }

    fn move_to(&mut self, position: Position) {
        self.cursor = position;
        self.clamp_cursor();
    }

    /// Keep the cursor inside the viewport.
    fn scroll_to_cursor(&mut self) {
        let line = self.cursor.line;
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = line + 1 - self.viewport_height;
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    fn find_matches(&self, pattern: &str) -> Option<Vec<Position>> {
        let regex = Regex::new(pattern)
            .or_else(|_| Regex::new(&regex::escape(pattern)))
            .ok()?;
        let results = self
            .buffer
            .lines()
            .iter()
            .enumerate()
            .flat_map(|(index, line)| {
                regex
                    .find_iter(line)
                    .map(move |m| Position::new(index, line[..m.start()].chars().count()))
            })
            .collect();
        Some(results)
    }

    /// Search for `pattern` (or repeat the last one if empty) and jump to the
    /// next match.
    fn start_search(&mut self, pattern: &str) {
        let pattern = if pattern.is_empty() {
            match &self.search {
                Some(search) => search.pattern.clone(),
                None => return,
            }
        } else {
            pattern.to_string()
        };
        self.search = Some(Search {
            pattern,
            results: Vec::new(),
        });
        self.jump_to_match(true);
    }

    fn jump_to_match(&mut self, forward: bool) {
        let Some(pattern) = self.search.as_ref().map(|s| s.pattern.clone()) else {
            return;
        };
        let results = self.find_matches(&pattern).unwrap_or_default();
        if let Some(search) = self.search.as_mut() {
            search.results = results.clone();
        }

        let cursor = self.cursor;
        let target = if forward {
            match results.iter().find(|p| **p > cursor) {
                Some(p) => Some((*p, false)),
                None => results.first().map(|p| (*p, true)),
            }
        } else {
            match results.iter().rev().find(|p| **p < cursor) {
                Some(p) => Some((*p, false)),
                None => results.last().map(|p| (*p, true)),
            }
        };

        match target {
            Some((position, wrapped)) => {
                self.move_to(position);
                if wrapped {
                    self.info(if forward {
                        "search hit BOTTOM, continuing at TOP"
                    } else {
                        "search hit TOP, continuing at BOTTOM"
                    });
                } else {
                    self.info(format!("/{}", pattern));
                }
            }
            None => self.error(EditorError::PatternNotFound(pattern)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;

    use super::*;

    /// In-memory files for editor tests.
    #[derive(Debug, Default)]
    pub struct MemoryIo {
        pub files: BTreeMap<String, String>,
        pub fail_writes: bool,
    }

    impl EditorIo for MemoryIo {
        fn load(&mut self, path: &str) -> Option<String> {
            self.files.get(path).cloned()
        }

        fn save(&mut self, path: &str, content: &str) -> bool {
            if self.fail_writes {
                return false;
            }
            self.files.insert(path.to_string(), content.to_string());
            true
        }
    }

    /// Feed keys written as text: `\x1b` is Escape, `\n` is Enter, `\x08` is
    /// Backspace, `\x12` is Ctrl-r. Returns the last outcome.
    pub fn type_keys(editor: &mut Editor, io: &mut MemoryIo, keys: &str) -> EditorOutcome {
        let mut outcome = EditorOutcome::Continue;
        for c in keys.chars() {
            let key = match c {
                '\x1b' => Key::Escape,
                '\n' => Key::Enter,
                '\x08' => Key::Backspace,
                '\x12' => Key::Ctrl('r'),
                c => Key::Char(c),
            };
            outcome = editor.handle_key(key, io);
        }
        outcome
    }
}
