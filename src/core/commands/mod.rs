//! Command definitions and execution context.
//!
//! This module provides:
//! - [`CommandDefinition`] for one named command with aliases and a handler
//! - [`CommandContext`] for the read-only view a handler runs against
//! - [`CommandResult`] for the changes a handler asks the session to apply
//! - [`CommandRegistry`] for profile-specific lookup
//!
//! # Architecture
//!
//! Commands are plain functions grouped into sets (`shared`, `linux`,
//! `network`, `windows`). The registry assembles the sets for one OS profile.
//! Handlers never mutate the session: they read the context, may call the
//! filesystem mutator, and describe everything else in their result.

mod linux;
mod network;
mod registry;
mod result;
mod shared;
mod windows;

pub use registry::CommandRegistry;
pub use result::{CommandResult, EditorRequest};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use futures::future::LocalBoxFuture;
use regex::Regex;

use crate::core::error::CommandError;
use crate::core::filesystem::{self, PathFilter};
use crate::core::parser::ParsedCommandLine;
use crate::core::store::FsMutator;
use crate::models::{FsItem, OsProfile, last_segment};

/// What a handler returns. `Err` means the handler itself broke, not that
/// the user asked for something impossible.
pub type HandlerResult = Result<CommandResult, CommandError>;

pub type SyncHandler = fn(&ParsedCommandLine, &CommandContext<'_>) -> HandlerResult;

pub type AsyncHandler =
    for<'a> fn(&'a ParsedCommandLine, &'a CommandContext<'a>) -> LocalBoxFuture<'a, HandlerResult>;

/// Completion callback: `(partial word, preceding arguments, context)`.
pub type CompleteFn = fn(&str, &[String], &CommandContext<'_>) -> Vec<String>;

/// Command implementation.
#[derive(Clone, Copy)]
pub enum Handler {
    Sync(SyncHandler),
    /// Runs on the single-threaded executor (simulated latency and the like).
    Async(AsyncHandler),
}

/// A named command.
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: Handler,
    pub autocomplete: Option<CompleteFn>,
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: SyncHandler,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            description,
            usage,
            handler: Handler::Sync(handler),
            autocomplete: None,
        }
    }

    pub const fn new_async(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: AsyncHandler,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            description,
            usage,
            handler: Handler::Async(handler),
            autocomplete: None,
        }
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn complete_with(mut self, complete: CompleteFn) -> Self {
        self.autocomplete = Some(complete);
        self
    }

    /// Run the handler, awaiting it if it is asynchronous.
    pub async fn execute(&self, cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
        match self.handler {
            Handler::Sync(handler) => handler(cmd, ctx),
            Handler::Async(handler) => handler(cmd, ctx).await,
        }
    }

    /// Argument suggestions; empty when the command has no completer.
    pub fn complete(&self, partial: &str, args: &[String], ctx: &CommandContext<'_>) -> Vec<String> {
        self.autocomplete
            .map(|complete| complete(partial, args, ctx))
            .unwrap_or_default()
    }
}

// =============================================================================
// Context
// =============================================================================

/// Read-only snapshot a command runs against.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    /// Absolute, normalized.
    pub current_directory: &'a str,
    pub home_directory: &'a str,
    pub os: OsProfile,
    pub env: &'a BTreeMap<String, String>,
    /// Oldest first.
    pub history: &'a [String],
    pub file_system: &'a FsItem,
    pub user: &'a str,
    pub host: &'a str,
    pub mutator: Option<&'a dyn FsMutator>,
    pub registry: &'a CommandRegistry,
    /// Session start, Unix milliseconds.
    pub started_at: u64,
}

impl<'a> CommandContext<'a> {
    /// Resolve a user-typed path to an absolute one.
    ///
    /// Expands `~` on Linux; accepts `C:` and `\` on Windows.
    pub fn resolve(&self, target: &str) -> String {
        match self.os {
            OsProfile::Linux => {
                let expanded = expand_home(target, self.home_directory);
                filesystem::resolve(self.current_directory, &expanded)
            }
            OsProfile::Windows => {
                filesystem::resolve(self.current_directory, &windows_to_posix(target))
            }
        }
    }

    pub fn find(&self, path: &str) -> Option<&'a FsItem> {
        filesystem::find(self.file_system, path)
    }

    pub fn is_directory(&self, path: &str) -> bool {
        filesystem::is_directory(self.file_system, path)
    }

    /// Path as the profile prints it (`/a/b` or `C:\a\b`).
    pub fn display_path(&self, path: &str) -> String {
        match self.os {
            OsProfile::Linux => path.to_string(),
            OsProfile::Windows => posix_to_windows(path),
        }
    }

    pub fn mutator(&self) -> Result<&'a dyn FsMutator, CommandError> {
        self.mutator.ok_or(CommandError::ReadOnly)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(target: &str, home: &str) -> String {
    if target == "~" {
        return home.to_string();
    }
    match target.strip_prefix("~/") {
        Some(rest) => filesystem::join(home, rest),
        None => target.to_string(),
    }
}

/// `C:\Users\x` -> `/Users/x`; relative paths stay relative.
pub fn windows_to_posix(path: &str) -> String {
    filesystem::strip_drive(path).replace('\\', "/")
}

/// `/Users/x` -> `C:\Users\x`.
pub fn posix_to_windows(path: &str) -> String {
    format!("C:{}", path.replace('/', "\\"))
}

// =============================================================================
// Completion Helpers
// =============================================================================

pub(crate) fn complete_any_path(partial: &str, _args: &[String], ctx: &CommandContext<'_>) -> Vec<String> {
    complete_with_filter(partial, ctx, PathFilter::Any)
}

pub(crate) fn complete_directory(
    partial: &str,
    _args: &[String],
    ctx: &CommandContext<'_>,
) -> Vec<String> {
    complete_with_filter(partial, ctx, PathFilter::DirectoriesOnly)
}

fn complete_with_filter(partial: &str, ctx: &CommandContext<'_>, filter: PathFilter) -> Vec<String> {
    let tilde = ctx.os == OsProfile::Linux && (partial == "~" || partial.starts_with("~/"));
    if !tilde {
        return filesystem::complete_path(
            ctx.file_system,
            ctx.current_directory,
            partial,
            filter,
            ctx.os.path_separator(),
        );
    }

    // Complete against the expanded path, then put the `~` back
    let mut expanded = expand_home(partial, ctx.home_directory);
    if partial == "~" {
        expanded.push('/');
    }
    let home = ctx.home_directory.trim_end_matches('/');
    filesystem::complete_path(ctx.file_system, ctx.current_directory, &expanded, filter, '/')
        .into_iter()
        .map(|completion| completion.replacen(home, "~", 1))
        .collect()
}

// =============================================================================
// Copy / Move Helpers
// =============================================================================

/// Where a copy or move lands.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Destination {
    pub parent: String,
    pub name: String,
    pub path: String,
    /// Whatever already sits at `path`.
    pub existing: Option<FsItem>,
}

/// Resolve the target of `cp src dest` style commands.
///
/// An existing directory receives the source under its own name; anything
/// else names the new item directly. `None` when the parent does not exist.
pub(crate) fn destination_for(ctx: &CommandContext<'_>, source: &FsItem, dest: &str) -> Option<Destination> {
    let (parent, name) = match ctx.find(dest) {
        Some(item) if item.is_dir() => (item.path.clone(), source.name.clone()),
        _ => (filesystem::parent_path(dest), last_segment(dest).to_string()),
    };
    if name.is_empty() || !ctx.is_directory(&parent) {
        return None;
    }

    let path = filesystem::join(&parent, &name);
    let existing = ctx.find(&path).cloned();
    Some(Destination {
        parent,
        name,
        path,
        existing,
    })
}

/// Recreate `item` (and everything below it) as `parent/name`.
pub(crate) fn copy_item(mutator: &dyn FsMutator, item: &FsItem, parent: &str, name: &str) -> bool {
    if item.is_file() {
        return mutator.create_file(parent, name, item.content.as_deref().unwrap_or(""));
    }
    if !mutator.create_folder(parent, name) {
        return false;
    }

    let path = filesystem::join(parent, name);
    item.children
        .iter()
        .all(|child| copy_item(mutator, child, &path, &child.name))
}

/// Copy `source` to `dest`, replacing an existing file of the same name.
pub(crate) fn transfer(mutator: &dyn FsMutator, source: &FsItem, dest: &Destination) -> bool {
    if let Some(existing) = &dest.existing {
        if existing.is_dir() || !mutator.remove_item(&existing.path) {
            return false;
        }
    }
    copy_item(mutator, source, &dest.parent, &dest.name)
}

/// Create `path` and any missing parents.
///
/// `created` tracks folders made earlier in the same command, which the
/// context snapshot cannot see. On failure returns the path that could not be
/// created.
pub(crate) fn create_dir_all(
    ctx: &CommandContext<'_>,
    mutator: &dyn FsMutator,
    path: &str,
    created: &mut BTreeSet<String>,
) -> Result<(), String> {
    let mut current = String::from("/");
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let next = filesystem::join(&current, segment);
        match ctx.find(&next) {
            Some(item) if item.is_dir() => {}
            Some(_) => return Err(next),
            None if created.contains(&next) => {}
            None => {
                if !mutator.create_folder(&current, segment) {
                    return Err(next);
                }
                created.insert(next.clone());
            }
        }
        current = next;
    }
    Ok(())
}

/// Path of a walked item as the user would type it, relative to the operand
/// the walk started from.
pub(crate) fn display_relative(operand: &str, base: &str, item_path: &str) -> String {
    let rest = item_path
        .strip_prefix(base)
        .unwrap_or(item_path)
        .trim_start_matches('/');
    if rest.is_empty() {
        operand.to_string()
    } else {
        format!("{}/{}", operand.trim_end_matches('/'), rest)
    }
}

/// Translate a shell glob (`*`, `?`) into an anchored regex.
pub(crate) fn glob_to_regex(glob: &str) -> Result<Regex, CommandError> {
    let mut pattern = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    Ok(Regex::new(&pattern)?)
}

// =============================================================================
// Test Support
// =============================================================================
