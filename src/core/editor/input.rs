//! Key handling per mode.

use super::buffer::{Position, split_at_column};
use super::{Editor, EditorIo, EditorOutcome, Key, Mode, Prompt, Register};
use crate::config::editor::TAB_WIDTH;

/// Character classes for word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Blank,
    Word,
    Punctuation,
}

fn class_of(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Blank
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

impl Editor {
    /// Apply one key press.
    pub fn handle_key(&mut self, key: Key, io: &mut dyn EditorIo) -> EditorOutcome {
        if self.show_help {
            // Any key closes the help overlay and is otherwise ignored.
            self.show_help = false;
            return EditorOutcome::Continue;
        }

        let outcome = match self.mode {
            Mode::Normal { pending } => {
                self.handle_normal(key, pending);
                EditorOutcome::Continue
            }
            Mode::Insert => {
                self.handle_insert(key);
                EditorOutcome::Continue
            }
            Mode::Visual { anchor } => {
                self.handle_visual(key, anchor);
                EditorOutcome::Continue
            }
            Mode::CommandLine { .. } => self.handle_command_line(key, io),
        };

        if !matches!(self.mode, Mode::Insert) {
            self.commit();
        }
        self.clamp_cursor();
        self.scroll_to_cursor();
        outcome
    }

    // =========================================================================
    // Motions shared by normal and visual mode
    // =========================================================================

    /// Move the cursor for a motion key. Returns false if `key` is not one.
    fn apply_motion(&mut self, key: Key) -> bool {
        let Position { line, column } = self.cursor;
        let target = match key {
            Key::Char('h') | Key::Left | Key::Backspace => {
                Position::new(line, column.saturating_sub(1))
            }
            Key::Char('l') | Key::Right | Key::Char(' ') => Position::new(line, column + 1),
            Key::Char('j') | Key::Down | Key::Enter => {
                Position::new((line + 1).min(self.buffer.line_count() - 1), column)
            }
            Key::Char('k') | Key::Up => Position::new(line.saturating_sub(1), column),
            Key::Char('0') | Key::Home => Position::new(line, 0),
            Key::Char('^') => Position::new(line, self.buffer.first_non_blank(line)),
            Key::Char('$') | Key::End => Position::new(line, usize::MAX),
            Key::Char('w') => self.next_word_start(),
            Key::Char('b') => self.previous_word_start(),
            Key::Char('G') => {
                let last = self.buffer.line_count() - 1;
                Position::new(last, self.buffer.first_non_blank(last))
            }
            Key::PageDown | Key::Ctrl('f') => Position::new(
                (line + self.viewport_height).min(self.buffer.line_count() - 1),
                column,
            ),
            Key::PageUp | Key::Ctrl('b') => {
                Position::new(line.saturating_sub(self.viewport_height), column)
            }
            _ => return false,
        };
        self.move_to(target);
        true
    }

    pub(super) fn go_to_line(&mut self, line: usize) {
        let line = line.min(self.buffer.line_count() - 1);
        self.move_to(Position::new(line, self.buffer.first_non_blank(line)));
    }

    fn next_word_start(&self) -> Position {
        let Position { line, column } = self.cursor;
        let chars: Vec<char> = self.current_line().chars().collect();
        let mut col = column.min(chars.len());

        if let Some(&c) = chars.get(col) {
            let class = class_of(c);
            if class != CharClass::Blank {
                while col < chars.len() && class_of(chars[col]) == class {
                    col += 1;
                }
            }
        }
        while col < chars.len() && chars[col].is_whitespace() {
            col += 1;
        }
        if col < chars.len() {
            return Position::new(line, col);
        }

        for next in line + 1..self.buffer.line_count() {
            let text = self.buffer.line(next).unwrap_or_default();
            if text.is_empty() {
                return Position::new(next, 0);
            }
            if let Some(col) = text.chars().position(|c| !c.is_whitespace()) {
                return Position::new(next, col);
            }
        }
        Position::new(line, usize::MAX)
    }

    fn previous_word_start(&self) -> Position {
        let mut line = self.cursor.line;
        let mut chars: Vec<char> = self.current_line().chars().collect();
        let mut col = self.cursor.column.min(chars.len());

        loop {
            while col > 0 && chars[col - 1].is_whitespace() {
                col -= 1;
            }
            if col > 0 {
                break;
            }
            if line == 0 {
                return Position::new(0, 0);
            }
            line -= 1;
            chars = self.buffer.line(line).unwrap_or_default().chars().collect();
            col = chars.len();
            if chars.is_empty() {
                return Position::new(line, 0);
            }
        }

        let class = class_of(chars[col - 1]);
        while col > 0 && class_of(chars[col - 1]) == class {
            col -= 1;
        }
        Position::new(line, col)
    }

    // =========================================================================
    // Normal mode
    // =========================================================================

    fn handle_normal(&mut self, key: Key, pending: Option<char>) {
        self.mode = Mode::normal();

        if let Some(first) = pending {
            match (first, key) {
                ('d', Key::Char('d')) => self.delete_lines(),
                ('y', Key::Char('y')) => self.yank_line(),
                ('g', Key::Char('g')) => self.go_to_line(0),
                _ => {}
            }
            return;
        }

        if self.apply_motion(key) {
            return;
        }

        let Position { line, column } = self.cursor;
        match key {
            Key::Char(c @ ('d' | 'y' | 'g')) => {
                self.mode = Mode::Normal { pending: Some(c) };
            }
            Key::Char('i') => self.enter_insert(self.cursor),
            Key::Char('a') => {
                let column = if self.buffer.line_len(line) == 0 { 0 } else { column + 1 };
                self.enter_insert(Position::new(line, column));
            }
            Key::Char('I') => {
                self.enter_insert(Position::new(line, self.buffer.first_non_blank(line)));
            }
            Key::Char('A') => self.enter_insert(Position::new(line, usize::MAX)),
            Key::Char('o') => {
                self.replace_lines(line + 1, 0, vec![String::new()]);
                self.enter_insert(Position::new(line + 1, 0));
            }
            Key::Char('O') => {
                self.replace_lines(line, 0, vec![String::new()]);
                self.enter_insert(Position::new(line, 0));
            }
            Key::Char('x') | Key::Delete => self.delete_char_under_cursor(),
            Key::Char('D') => self.delete_to_line_end(),
            Key::Char('p') => self.put(true),
            Key::Char('P') => self.put(false),
            Key::Char('u') => self.undo(),
            Key::Ctrl('r') => self.redo(),
            Key::Char('v') => {
                self.mode = Mode::Visual {
                    anchor: self.cursor,
                };
            }
            Key::Char(':') => self.open_command_line(Prompt::Ex),
            Key::Char('/') => self.open_command_line(Prompt::Search),
            Key::Char('n') => self.jump_to_match(true),
            Key::Char('N') => self.jump_to_match(false),
            Key::Escape => self.message = None,
            _ => {}
        }
    }

    fn enter_insert(&mut self, at: Position) {
        self.mode = Mode::Insert;
        self.message = None;
        self.move_to(at);
    }

    fn open_command_line(&mut self, prompt: Prompt) {
        self.message = None;
        self.mode = Mode::CommandLine {
            prompt,
            input: String::new(),
        };
    }

    fn delete_char_under_cursor(&mut self) {
        let Position { line, column } = self.cursor;
        let text = self.current_line().to_string();
        let Some(removed) = text.chars().nth(column) else {
            return;
        };
        let kept: String = text
            .chars()
            .enumerate()
            .filter(|(i, _)| *i != column)
            .map(|(_, c)| c)
            .collect();
        self.register = Register {
            text: removed.to_string(),
            linewise: false,
        };
        self.set_line(line, kept);
    }

    fn delete_to_line_end(&mut self) {
        let Position { line, column } = self.cursor;
        let text = self.current_line().to_string();
        let (head, tail) = split_at_column(&text, column);
        if tail.is_empty() {
            return;
        }
        self.register = Register {
            text: tail.to_string(),
            linewise: false,
        };
        self.set_line(line, head.to_string());
    }

    fn delete_lines(&mut self) {
        let line = self.cursor.line;
        self.register = Register {
            text: self.current_line().to_string(),
            linewise: true,
        };
        if self.buffer.line_count() == 1 {
            self.set_line(0, String::new());
        } else {
            self.replace_lines(line, 1, Vec::new());
        }
        let line = line.min(self.buffer.line_count() - 1);
        self.cursor = Position::new(line, self.buffer.first_non_blank(line));
    }

    fn yank_line(&mut self) {
        self.register = Register {
            text: self.current_line().to_string(),
            linewise: true,
        };
        self.info("1 line yanked");
    }

    /// Put the register after (`p`) or before (`P`) the cursor.
    fn put(&mut self, after: bool) {
        if self.register.text.is_empty() && !self.register.linewise {
            return;
        }
        let Position { line, column } = self.cursor;
        let text = self.register.text.clone();

        if self.register.linewise {
            let at = if after { line + 1 } else { line };
            self.replace_lines(at, 0, text.split('\n').map(str::to_string).collect());
            self.cursor = Position::new(at, self.buffer.first_non_blank(at));
            return;
        }

        let current = self.current_line().to_string();
        let at = if after && !current.is_empty() { column + 1 } else { column };
        let (head, tail) = split_at_column(&current, at);
        let mut pieces: Vec<String> = text.split('\n').map(str::to_string).collect();
        let last_len = pieces.last().map_or(0, |p| p.chars().count());
        let end_line = line + pieces.len() - 1;
        let end_column = if pieces.len() == 1 {
            at + last_len
        } else {
            last_len
        };

        if let Some(first) = pieces.first_mut() {
            first.insert_str(0, head);
        }
        if let Some(last) = pieces.last_mut() {
            last.push_str(tail);
        }
        self.replace_lines(line, 1, pieces);
        self.cursor = Position::new(end_line, end_column.saturating_sub(1));
    }

    // =========================================================================
    // Insert mode
    // =========================================================================

    fn handle_insert(&mut self, key: Key) {
        let Position { line, column } = self.cursor;
        match key {
            Key::Escape => {
                self.mode = Mode::normal();
                self.commit();
                self.cursor.column = column.saturating_sub(1);
            }
            Key::Char(c) => self.insert_text(&c.to_string()),
            Key::Tab => self.insert_text(&" ".repeat(TAB_WIDTH)),
            Key::Enter => {
                let text = self.current_line().to_string();
                let (head, tail) = split_at_column(&text, column);
                let indent: String = head.chars().take_while(|c| *c == ' ').collect();
                let new_line = format!("{}{}", indent, tail);
                self.replace_lines(line, 1, vec![head.to_string(), new_line]);
                self.cursor = Position::new(line + 1, indent.chars().count());
            }
            Key::Backspace => {
                if column > 0 {
                    let text = self.current_line().to_string();
                    let (head, tail) = split_at_column(&text, column);
                    let mut head = head.to_string();
                    head.pop();
                    self.set_line(line, format!("{}{}", head, tail));
                    self.cursor.column = column - 1;
                } else if line > 0 {
                    let previous = self.buffer.line(line - 1).unwrap_or_default().to_string();
                    let joined = format!("{}{}", previous, self.current_line());
                    self.replace_lines(line - 1, 2, vec![joined]);
                    self.cursor = Position::new(line - 1, previous.chars().count());
                }
            }
            Key::Delete => {
                let text = self.current_line().to_string();
                if column < text.chars().count() {
                    let (head, tail) = split_at_column(&text, column);
                    let tail: String = tail.chars().skip(1).collect();
                    self.set_line(line, format!("{}{}", head, tail));
                } else if line + 1 < self.buffer.line_count() {
                    let next = self.buffer.line(line + 1).unwrap_or_default();
                    let joined = format!("{}{}", text, next);
                    self.replace_lines(line, 2, vec![joined]);
                }
            }
            Key::Left => self.cursor.column = column.saturating_sub(1),
            Key::Right => self.cursor.column = column + 1,
            Key::Up => self.cursor.line = line.saturating_sub(1),
            Key::Down => self.cursor.line = line + 1,
            Key::Home => self.cursor.column = 0,
            Key::End => self.cursor.column = usize::MAX,
            _ => {}
        }
    }

    fn insert_text(&mut self, inserted: &str) {
        let Position { line, column } = self.cursor;
        let text = self.current_line().to_string();
        let (head, tail) = split_at_column(&text, column);
        self.set_line(line, format!("{}{}{}", head, inserted, tail));
        self.cursor.column = column + inserted.chars().count();
    }

    // =========================================================================
    // Visual mode
    // =========================================================================

    fn handle_visual(&mut self, key: Key, anchor: Position) {
        if self.apply_motion(key) {
            return;
        }
        match key {
            Key::Escape | Key::Char('v') => self.mode = Mode::normal(),
            Key::Char('y') => {
                self.register = self.selected_text(anchor);
                self.mode = Mode::normal();
                self.cursor = anchor.min(self.cursor);
            }
            Key::Char('d') | Key::Char('x') | Key::Delete => self.delete_selection(anchor),
            _ => {}
        }
    }

    fn ordered(&self, anchor: Position) -> (Position, Position) {
        if anchor <= self.cursor {
            (anchor, self.cursor)
        } else {
            (self.cursor, anchor)
        }
    }

    /// Text between the anchor and the cursor, both ends included.
    fn selected_text(&self, anchor: Position) -> Register {
        let (start, end) = self.ordered(anchor);
        let lines = self.buffer.slice(start.line, end.line - start.line + 1);
        let count = lines.len();
        let text = lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let from = if i == 0 { start.column } else { 0 };
                let chars = text.chars().skip(from);
                if i + 1 == count {
                    let to = end.column + 1 - if i == 0 { start.column } else { 0 };
                    chars.take(to).collect::<String>()
                } else {
                    chars.collect()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        Register {
            text,
            linewise: false,
        }
    }

    fn delete_selection(&mut self, anchor: Position) {
        let (start, end) = self.ordered(anchor);
        self.register = self.selected_text(anchor);

        let first = self.buffer.line(start.line).unwrap_or_default();
        let last = self.buffer.line(end.line).unwrap_or_default();
        let (head, _) = split_at_column(first, start.column);
        let (_, tail) = split_at_column(last, end.column + 1);
        let joined = format!("{}{}", head, tail);

        self.mode = Mode::normal();
        self.replace_lines(start.line, end.line - start.line + 1, vec![joined]);
        self.cursor = start;
    }

    // =========================================================================
    // Command line
    // =========================================================================

    fn handle_command_line(&mut self, key: Key, io: &mut dyn EditorIo) -> EditorOutcome {
        let Mode::CommandLine { prompt, input } = &mut self.mode else {
            return EditorOutcome::Continue;
        };
        let prompt = *prompt;

        match key {
            Key::Escape => self.mode = Mode::normal(),
            Key::Backspace => {
                if input.pop().is_none() {
                    self.mode = Mode::normal();
                }
            }
            Key::Char(c) => input.push(c),
            Key::Tab => input.push(' '),
            Key::Enter => {
                let line = std::mem::take(input);
                self.mode = Mode::normal();
                return match prompt {
                    Prompt::Ex => self.execute_ex(&line, io),
                    Prompt::Search => {
                        self.start_search(&line);
                        EditorOutcome::Continue
                    }
                };
            }
            _ => {}
        }
        EditorOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{MemoryIo, type_keys};
    use super::super::{ModeKind, Position};
    use super::*;

    fn editor(content: &str) -> (Editor, MemoryIo) {
        (
            Editor::open(Some("/f.txt".into()), "/", Some(content)),
            MemoryIo::default(),
        )
    }

    #[test]
    fn test_basic_motions() {
        let (mut ed, mut io) = editor("hello world\n  second line\n");
        type_keys(&mut ed, &mut io, "$");
        assert_eq!(ed.cursor(), Position::new(0, 10));
        type_keys(&mut ed, &mut io, "l");
        assert_eq!(ed.cursor(), Position::new(0, 10));
        type_keys(&mut ed, &mut io, "j");
        assert_eq!(ed.cursor(), Position::new(1, 10));
        type_keys(&mut ed, &mut io, "^");
        assert_eq!(ed.cursor(), Position::new(1, 2));
        type_keys(&mut ed, &mut io, "0k");
        assert_eq!(ed.cursor(), Position::new(0, 0));
    }

    #[test]
    fn test_word_motions() {
        let (mut ed, mut io) = editor("foo.bar baz\n\nqux\n");
        type_keys(&mut ed, &mut io, "w");
        assert_eq!(ed.cursor(), Position::new(0, 3));
        type_keys(&mut ed, &mut io, "w");
        assert_eq!(ed.cursor(), Position::new(0, 4));
        type_keys(&mut ed, &mut io, "ww");
        assert_eq!(ed.cursor(), Position::new(1, 0));
        type_keys(&mut ed, &mut io, "w");
        assert_eq!(ed.cursor(), Position::new(2, 0));
        type_keys(&mut ed, &mut io, "bb");
        assert_eq!(ed.cursor(), Position::new(0, 8));
        type_keys(&mut ed, &mut io, "b");
        assert_eq!(ed.cursor(), Position::new(0, 4));
    }

    #[test]
    fn test_insert_variants() {
        let (mut ed, mut io) = editor("  mid\n");
        type_keys(&mut ed, &mut io, "I>\x1bA<\x1b");
        assert_eq!(ed.buffer().lines(), &["  >mid<"]);
        type_keys(&mut ed, &mut io, "Oabove\x1bjobelow\x1b");
        assert_eq!(ed.buffer().lines(), &["above", "  >mid<", "below"]);
        assert_eq!(ed.mode_kind(), ModeKind::Normal);
        assert_eq!(ed.cursor(), Position::new(2, 4));
    }

    #[test]
    fn test_insert_enter_backspace_and_tab() {
        let (mut ed, mut io) = editor("abcd\n");
        type_keys(&mut ed, &mut io, "ll");
        type_keys(&mut ed, &mut io, "i\n");
        assert_eq!(ed.buffer().lines(), &["ab", "cd"]);
        assert_eq!(ed.cursor(), Position::new(1, 0));

        type_keys(&mut ed, &mut io, "\x08");
        assert_eq!(ed.buffer().lines(), &["abcd"]);
        assert_eq!(ed.cursor(), Position::new(0, 2));

        ed.handle_key(Key::Tab, &mut io);
        assert_eq!(ed.buffer().lines(), &["ab    cd"]);
        ed.handle_key(Key::Delete, &mut io);
        assert_eq!(ed.buffer().lines(), &["ab    d"]);
    }

    #[test]
    fn test_delete_and_put() {
        let (mut ed, mut io) = editor("one\ntwo\nthree\n");
        type_keys(&mut ed, &mut io, "ddp");
        assert_eq!(ed.buffer().lines(), &["two", "one", "three"]);
        assert!(ed.register().linewise);

        type_keys(&mut ed, &mut io, "ggyyP");
        assert_eq!(ed.buffer().lines(), &["two", "two", "one", "three"]);

        type_keys(&mut ed, &mut io, "Gx");
        assert_eq!(ed.buffer().lines()[3], "hree");
        type_keys(&mut ed, &mut io, "p");
        assert_eq!(ed.buffer().lines()[3], "htree");

        type_keys(&mut ed, &mut io, "0lD");
        assert_eq!(ed.buffer().lines()[3], "h");
        assert_eq!(ed.register().text, "tree");
    }

    #[test]
    fn test_dd_on_last_line_leaves_empty_buffer() {
        let (mut ed, mut io) = editor("only\n");
        type_keys(&mut ed, &mut io, "dd");
        assert!(ed.buffer().is_empty());
        assert!(ed.is_modified());
    }

    #[test]
    fn test_visual_delete_across_lines() {
        let (mut ed, mut io) = editor("abc\ndef\nghi\n");
        type_keys(&mut ed, &mut io, "lvjd");
        assert_eq!(ed.buffer().lines(), &["af", "ghi"]);
        assert_eq!(ed.register().text, "bc\nde");
        assert_eq!(ed.mode_kind(), ModeKind::Normal);
        assert_eq!(ed.cursor(), Position::new(0, 1));

        type_keys(&mut ed, &mut io, "u");
        assert_eq!(ed.buffer().lines(), &["abc", "def", "ghi"]);
    }

    #[test]
    fn test_visual_yank_and_selection() {
        let (mut ed, mut io) = editor("hello world\n");
        type_keys(&mut ed, &mut io, "wv$");
        assert_eq!(
            ed.selection(),
            Some((Position::new(0, 6), Position::new(0, 10)))
        );
        type_keys(&mut ed, &mut io, "y");
        assert_eq!(ed.register().text, "world");
        assert_eq!(ed.selection(), None);
        assert_eq!(ed.cursor(), Position::new(0, 6));
        assert!(!ed.is_modified());
    }

    #[test]
    fn test_command_line_editing() {
        let (mut ed, mut io) = editor("x\n");
        type_keys(&mut ed, &mut io, ":ab\x08");
        assert_eq!(ed.command_input(), Some("a"));
        type_keys(&mut ed, &mut io, "\x08\x08");
        assert_eq!(ed.mode_kind(), ModeKind::Normal);

        type_keys(&mut ed, &mut io, ":set\x1b");
        assert_eq!(ed.mode_kind(), ModeKind::Normal);
        assert!(!ed.show_line_numbers());
    }
}
