//! Lexer for splitting shell input into words.
//!
//! Handles:
//! - Whitespace separation
//! - Single and double quotes (the quote characters are dropped)
//! - Escapes in the profile's style: `\` anywhere for POSIX shells, `^`
//!   outside quotes for cmd, where `\` is a path separator
//!
//! There is no globbing, piping or redirection. An unterminated quote runs to
//! the end of the input.

use crate::models::OsProfile;

/// Split raw input into words using POSIX shell escapes.
pub fn tokenize(raw: &str) -> Vec<String> {
    tokenize_for(raw, OsProfile::Linux)
}

/// Split raw input into words the way `os`'s shell would.
pub fn tokenize_for(raw: &str, os: OsProfile) -> Vec<String> {
    let mut lexer = Lexer::new(os);
    for c in raw.chars() {
        lexer.feed(c);
    }
    lexer.finish()
}

/// Single-pass lexer state.
#[derive(Debug)]
struct Lexer {
    tokens: Vec<String>,
    current: String,
    /// Active quote character while inside quotes.
    quote: Option<char>,
    escaped: bool,
    escape: char,
    /// Whether the escape character still escapes inside quotes.
    escape_in_quotes: bool,
}

impl Lexer {
    fn new(os: OsProfile) -> Self {
        let (escape, escape_in_quotes) = match os {
            OsProfile::Linux => ('\\', true),
            OsProfile::Windows => ('^', false),
        };
        Self {
            tokens: Vec::new(),
            current: String::new(),
            quote: None,
            escaped: false,
            escape,
            escape_in_quotes,
        }
    }

    fn feed(&mut self, c: char) {
        if self.escaped {
            self.current.push(c);
            self.escaped = false;
            return;
        }

        match (c, self.quote) {
            (c, None) if c == self.escape => self.escaped = true,
            (c, Some(_)) if c == self.escape && self.escape_in_quotes => self.escaped = true,
            ('"' | '\'', None) => self.quote = Some(c),
            (c, Some(q)) if c == q => self.quote = None,
            (c, None) if c.is_whitespace() => self.flush(),
            (c, _) => self.current.push(c),
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.tokens
    }
}
