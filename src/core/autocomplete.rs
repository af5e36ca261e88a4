//! Tab completion for command names and arguments.
//!
//! The engine keeps the suggestion list shown under the prompt:
//! - The first word completes against registered command names and aliases
//! - Later words ask the command's own completer (paths for filesystem commands)
//!
//! Tab policy:
//! - Single candidate: replace the current word with it
//! - Several candidates sharing a longer prefix: extend to that prefix
//! - Otherwise: show the list for manual selection

use crate::config::MAX_SUGGESTIONS;
use crate::core::commands::CommandContext;

// ============================================================================
// Public Types
// ============================================================================

/// Input line after a completion was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub input: String,
    /// Cursor position in characters.
    pub cursor: usize,
}

/// The word under the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
struct WordSpan {
    /// Position among the whitespace-separated words (0 = command).
    index: usize,
    /// Byte range of the whole word in the input.
    start: usize,
    end: usize,
    /// Text typed before the cursor.
    partial: String,
    /// Complete words between the command and the current word.
    preceding: Vec<String>,
}

/// Suggestion list state.
#[derive(Debug)]
pub struct AutocompleteEngine {
    suggestions: Vec<String>,
    selected: Option<usize>,
    visible: bool,
    limit: usize,
    span: Option<WordSpan>,
}

impl Default for AutocompleteEngine {
    fn default() -> Self {
        Self::new(MAX_SUGGESTIONS)
    }
}

impl AutocompleteEngine {
    pub fn new(limit: usize) -> Self {
        Self {
            suggestions: Vec::new(),
            selected: None,
            visible: false,
            limit,
            span: None,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Compute suggestions for the word under `cursor` and show them.
    pub fn generate(&mut self, input: &str, cursor: usize, ctx: &CommandContext<'_>) -> &[String] {
        let span = word_at(input, cursor);
        let mut suggestions = if span.index == 0 {
            ctx.registry.suggestions(&span.partial)
        } else {
            let command = input.split_whitespace().next().unwrap_or_default();
            ctx.registry
                .get(command)
                .map(|def| def.complete(&span.partial, &span.preceding, ctx))
                .unwrap_or_default()
        };
        suggestions.truncate(self.limit);

        self.visible = !suggestions.is_empty();
        self.suggestions = suggestions;
        self.selected = None;
        self.span = Some(span);
        &self.suggestions
    }

    /// Handle a Tab press.
    ///
    /// Returns the rewritten input when something was completed; `None` when
    /// the list is shown (or there was nothing to offer) and the input stays.
    pub fn tab(&mut self, input: &str, cursor: usize, ctx: &CommandContext<'_>) -> Option<Completion> {
        self.generate(input, cursor, ctx);
        let span = self.span.clone()?;

        match self.suggestions.as_slice() {
            [] => {
                self.hide();
                None
            }
            [only] => {
                let completion = replace_word(input, &span, only);
                self.hide();
                Some(completion)
            }
            many => {
                let prefix = common_prefix(many);
                if prefix.chars().count() > span.partial.chars().count() {
                    let completion = replace_word(input, &span, &prefix);
                    // The list stays open, now anchored to the extended word.
                    self.span = Some(WordSpan {
                        end: span.start + prefix.len(),
                        partial: prefix,
                        ..span
                    });
                    Some(completion)
                } else {
                    self.visible = true;
                    None
                }
            }
        }
    }

    /// Move the selection down, wrapping to the top.
    pub fn select_next(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i + 1 < self.suggestions.len() => i + 1,
            _ => 0,
        });
    }

    /// Move the selection up, wrapping to the bottom.
    pub fn select_previous(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        let last = self.suggestions.len() - 1;
        self.selected = Some(match self.selected {
            Some(0) | None => last,
            Some(i) => i - 1,
        });
    }

    /// Apply the selected suggestion to `input` and close the list.
    pub fn accept(&mut self, input: &str) -> Option<Completion> {
        let candidate = self.suggestions.get(self.selected?)?;
        let span = self.span.as_ref()?;
        input.get(span.start..span.end)?;

        let completion = replace_word(input, span, candidate);
        self.hide();
        Some(completion)
    }

    pub fn hide(&mut self) {
        self.suggestions.clear();
        self.selected = None;
        self.visible = false;
        self.span = None;
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Longest prefix shared by every string.
pub fn common_prefix(strings: &[String]) -> String {
    let Some((first, rest)) = strings.split_first() else {
        return String::new();
    };

    let mut prefix_len = first.len();
    for s in rest {
        prefix_len = first
            .char_indices()
            .zip(s.chars())
            .take_while(|((idx, a), b)| *idx < prefix_len && a == b)
            .map(|((idx, a), _)| idx + a.len_utf8())
            .last()
            .unwrap_or(0);
    }

    first[..prefix_len].to_string()
}

/// Byte offset of the `cursor`-th character, clamped to the input length.
fn byte_offset(input: &str, cursor: usize) -> usize {
    input
        .char_indices()
        .nth(cursor)
        .map_or(input.len(), |(idx, _)| idx)
}

fn word_at(input: &str, cursor: usize) -> WordSpan {
    let at = byte_offset(input, cursor);
    let before = &input[..at];

    let chunks: Vec<&str> = before.split_whitespace().collect();
    let starts_new_word = before.is_empty() || before.ends_with(char::is_whitespace);
    let index = if starts_new_word {
        chunks.len()
    } else {
        chunks.len().saturating_sub(1)
    };

    let start = before
        .rfind(char::is_whitespace)
        .map_or(0, |idx| idx + before[idx..].chars().next().map_or(1, char::len_utf8));
    let end = input[at..]
        .find(char::is_whitespace)
        .map_or(input.len(), |idx| at + idx);

    WordSpan {
        index,
        start,
        end,
        partial: before[start..].to_string(),
        preceding: chunks
            .iter()
            .skip(1)
            .take(index.saturating_sub(1))
            .map(|s| s.to_string())
            .collect(),
    }
}

fn replace_word(input: &str, span: &WordSpan, replacement: &str) -> Completion {
    let mut rewritten = String::with_capacity(input.len() + replacement.len());
    rewritten.push_str(&input[..span.start]);
    rewritten.push_str(replacement);
    let cursor = rewritten.chars().count();
    rewritten.push_str(&input[span.end..]);

    Completion {
        input: rewritten,
        cursor,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::testing::Fixture;
    use crate::core::store::{FileSystemStore, FsMutator};
    use crate::models::OsProfile;

    /// Run `f` with a context built from `fx`.
    fn with_ctx<R>(fx: &Fixture, f: impl FnOnce(&CommandContext<'_>) -> R) -> R {
        let tree = fx.store.snapshot();
        let ctx = CommandContext {
            current_directory: &fx.cwd,
            home_directory: "/home/guest",
            os: fx.os,
            env: &fx.env,
            history: &fx.history,
            file_system: &tree,
            user: "guest",
            host: "portfolio",
            mutator: None,
            registry: &fx.registry,
            started_at: 0,
        };
        f(&ctx)
    }

    #[test]
    fn test_common_prefix() {
        let strings = vec![
            "hello".to_string(),
            "help".to_string(),
            "helicopter".to_string(),
        ];
        assert_eq!(common_prefix(&strings), "hel");
        assert_eq!(common_prefix(&[]), "");
        assert_eq!(common_prefix(&["only".to_string()]), "only");
        assert_eq!(common_prefix(&["abc".to_string(), "xyz".to_string()]), "");
        assert_eq!(common_prefix(&["é1".to_string(), "é2".to_string()]), "é");
    }

    #[test]
    fn test_word_at() {
        let span = word_at("cd Doc", 6);
        assert_eq!(span.index, 1);
        assert_eq!(span.partial, "Doc");
        assert_eq!((span.start, span.end), (3, 6));

        let span = word_at("cp a ", 5);
        assert_eq!(span.index, 2);
        assert_eq!(span.partial, "");
        assert_eq!(span.preceding, vec!["a".to_string()]);

        assert_eq!(word_at("", 0).index, 0);
        assert_eq!(word_at("ec", 2).partial, "ec");
    }

    #[test]
    fn test_single_command_completion() {
        let fx = Fixture::linux();
        let mut engine = AutocompleteEngine::default();
        let completion = with_ctx(&fx, |ctx| engine.tab("pw", 2, ctx)).unwrap();
        assert_eq!(completion.input, "pwd");
        assert_eq!(completion.cursor, 3);
        assert!(!engine.is_visible());
    }

    #[test]
    fn test_single_path_completion_keeps_rest_of_line() {
        let fx = Fixture::linux();
        let mut engine = AutocompleteEngine::default();
        let completion = with_ctx(&fx, |ctx| engine.tab("cd Doc", 6, ctx)).unwrap();
        assert_eq!(completion.input, "cd Documents/");
        assert_eq!(completion.cursor, "cd Documents/".len());

        let completion = with_ctx(&fx, |ctx| engine.tab("cat rea extra", 7, ctx)).unwrap();
        assert_eq!(completion.input, "cat readme.txt extra");
        assert_eq!(completion.cursor, "cat readme.txt".len());
    }

    #[test]
    fn test_multiple_candidates_show_list() {
        let fx = Fixture::linux();
        let mut engine = AutocompleteEngine::default();
        // echo, env, exit, export
        assert_eq!(with_ctx(&fx, |ctx| engine.tab("e", 1, ctx)), None);
        assert!(engine.is_visible());
        assert!(engine.suggestions().contains(&"echo".to_string()));

        // exit, export: nothing longer to extend to
        assert_eq!(with_ctx(&fx, |ctx| engine.tab("ex", 2, ctx)), None);
        assert_eq!(engine.suggestions(), &["exit", "export"]);
    }

    #[test]
    fn test_prefix_extension() {
        let fx = Fixture::linux();
        fx.store.create_file("/home/guest", "notes-a.txt", "");
        fx.store.create_file("/home/guest", "notes-b.txt", "");

        let mut engine = AutocompleteEngine::default();
        let completion = with_ctx(&fx, |ctx| engine.tab("cat no", 6, ctx)).unwrap();
        assert_eq!(completion.input, "cat notes-");
        assert_eq!(completion.cursor, 10);
        assert!(engine.is_visible());
        assert_eq!(engine.suggestions().len(), 2);
    }

    #[test]
    fn test_navigation_wraps_and_accepts() {
        let fx = Fixture::linux();
        let mut engine = AutocompleteEngine::default();
        with_ctx(&fx, |ctx| engine.generate("cd ", 3, ctx));
        assert_eq!(engine.suggestions(), &["Documents/", "Projects/"]);

        engine.select_previous();
        assert_eq!(engine.selected(), Some(1));
        engine.select_next();
        assert_eq!(engine.selected(), Some(0));
        engine.select_next();
        engine.select_next();
        assert_eq!(engine.selected(), Some(0));

        let completion = engine.accept("cd ").unwrap();
        assert_eq!(completion.input, "cd Documents/");
        assert!(!engine.is_visible());
        assert_eq!(engine.accept("cd "), None);
    }

    #[test]
    fn test_windows_profile_completion() {
        let fx = Fixture::windows();
        let mut engine = AutocompleteEngine::default();
        let completion = with_ctx(&fx, |ctx| engine.tab("di", 2, ctx)).unwrap();
        assert_eq!(completion.input, "dir");

        let completion = with_ctx(&fx, |ctx| engine.tab("cd Pro", 6, ctx)).unwrap();
        assert_eq!(completion.input, "cd Projects\\");
        assert_eq!(fx.os, OsProfile::Windows);
    }

    #[test]
    fn test_limit() {
        let fx = Fixture::linux();
        let mut engine = AutocompleteEngine::new(3);
        let shown = with_ctx(&fx, |ctx| engine.generate("", 0, ctx).len());
        assert_eq!(shown, 3);
    }

    #[test]
    fn test_unknown_command_has_no_argument_suggestions() {
        let fx = Fixture::linux();
        let mut engine = AutocompleteEngine::default();
        assert_eq!(with_ctx(&fx, |ctx| engine.tab("nope x", 6, ctx)), None);
        assert!(!engine.is_visible());
    }
}
