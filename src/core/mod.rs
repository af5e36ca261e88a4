//! Core shell logic.
//!
//! This module provides:
//! - [`parser`] tokenizing and flag parsing of a command line
//! - [`filesystem`] path arithmetic and queries over an [`FsItem`](crate::models::FsItem) tree
//! - [`store`] the filesystem collaborator the shell mutates through
//! - [`commands`] the per-profile command sets and their [`CommandRegistry`]
//! - [`autocomplete`] and [`history`] for the input line
//! - [`session`] the controller that ties them together
//! - [`editor`] the modal editor a command can open

pub mod autocomplete;
pub mod commands;
pub mod editor;
pub mod env;
pub mod error;
pub mod filesystem;
pub mod history;
pub mod parser;
pub mod session;
pub mod store;

pub use autocomplete::{AutocompleteEngine, Completion};
pub use commands::{CommandContext, CommandDefinition, CommandRegistry, CommandResult};
pub use editor::{Editor, EditorIo, EditorOutcome, Key};
pub use error::{CommandError, EditorError, StorageError};
pub use history::HistoryManager;
pub use parser::{ParsedCommandLine, parse, parse_for};
pub use session::{Session, SessionEvent};
pub use store::{FileSystemStore, FsMutator, MemoryStore};
