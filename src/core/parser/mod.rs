//! Command-line parser.
//!
//! Turns raw input into a [`ParsedCommandLine`]: the command name, positional
//! arguments and a flag map. Parsing never fails; odd flag syntax degrades to
//! positional arguments or boolean flags.
//!
//! A flag that can carry a value takes the next token when that token does not
//! start with `-`, so `ls -l docs` records `l = "docs"`. Commands that know
//! their boolean switches recover the real operands with
//! [`ParsedCommandLine::operands`]; `--flag=value` always binds unambiguously.

mod lexer;

pub use lexer::{tokenize, tokenize_for};

use std::collections::BTreeMap;

use crate::models::OsProfile;

/// Value of a parsed flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    Bool(bool),
    Value(String),
}

impl Flag {
    /// True for `Bool(true)` and for any value-carrying flag.
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Bool(true) | Self::Value(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            Self::Bool(_) => None,
        }
    }
}

/// One submitted line, split into command, arguments and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommandLine {
    pub command: String,
    /// Positional arguments in order.
    pub args: Vec<String>,
    /// Input exactly as typed.
    pub raw: String,
    pub flags: BTreeMap<String, Flag>,
    /// Every token after the command name, unclassified.
    pub words: Vec<String>,
}

impl ParsedCommandLine {
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }

    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(Flag::is_set)
    }

    pub fn has_any_flag(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.has_flag(n))
    }

    pub fn flag_value(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(Flag::value)
    }

    /// Positional operands, given which flags really take a value.
    ///
    /// Re-walks [`words`](Self::words) so that tokens the parser bound to a
    /// boolean switch are returned as operands, in their original order.
    pub fn operands(&self, value_flags: &[&str]) -> Vec<String> {
        let mut operands = Vec::new();
        let mut iter = self.words.iter().peekable();

        while let Some(word) = iter.next() {
            let takes_value = if let Some(long) = word.strip_prefix("--") {
                if long.is_empty() || long.starts_with('=') {
                    operands.push(word.clone());
                    continue;
                }
                !long.contains('=') && value_flags.contains(&long)
            } else if word.len() > 1 && word.starts_with('-') {
                let last = word.chars().last().map(String::from).unwrap_or_default();
                value_flags.contains(&last.as_str())
            } else {
                operands.push(word.clone());
                continue;
            };

            if takes_value && iter.peek().is_some_and(|next| !next.starts_with('-')) {
                iter.next();
            }
        }

        operands
    }
}

/// Parse a raw input line with POSIX shell quoting.
pub fn parse(raw: &str) -> ParsedCommandLine {
    parse_for(raw, OsProfile::Linux)
}

/// Parse a raw input line typed at `os`'s prompt.
///
/// Only tokenization differs between profiles: Windows keeps `\` as a path
/// separator and escapes with `^`.
pub fn parse_for(raw: &str, os: OsProfile) -> ParsedCommandLine {
    let mut parsed = ParsedCommandLine {
        raw: raw.to_string(),
        ..Default::default()
    };

    let mut tokens = tokenize_for(raw, os).into_iter();
    let Some(command) = tokens.next() else {
        return parsed;
    };
    parsed.command = command;
    parsed.words = tokens.collect();

    let words = &parsed.words;
    let mut i = 0;
    while i < words.len() {
        let token = &words[i];
        let next_value = words
            .get(i + 1)
            .filter(|next| !next.starts_with('-'))
            .cloned();

        if let Some(long) = token.strip_prefix("--") {
            match long.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    parsed
                        .flags
                        .insert(name.to_string(), Flag::Value(value.to_string()));
                }
                _ if long.is_empty() || long.starts_with('=') => {
                    parsed.args.push(token.clone());
                }
                _ => {
                    let flag = match next_value {
                        Some(value) => {
                            i += 1;
                            Flag::Value(value)
                        }
                        None => Flag::Bool(true),
                    };
                    parsed.flags.insert(long.to_string(), flag);
                }
            }
        } else if token.chars().count() > 1 && token.starts_with('-') {
            let cluster: Vec<char> = token.chars().skip(1).collect();
            if let Some((last, rest)) = cluster.split_last() {
                for c in rest {
                    parsed.flags.insert(c.to_string(), Flag::Bool(true));
                }
                let flag = match next_value {
                    Some(value) => {
                        i += 1;
                        Flag::Value(value)
                    }
                    None => Flag::Bool(true),
                };
                parsed.flags.insert(last.to_string(), flag);
            }
        } else {
            parsed.args.push(token.clone());
        }

        i += 1;
    }

    parsed
}
