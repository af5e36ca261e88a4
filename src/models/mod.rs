//! Plain data types shared across the shell.
//!
//! - [`FsItem`], [`FsKind`] - virtual filesystem nodes
//! - [`OsProfile`] - linux / windows command flavour
//! - [`OutputLine`], [`OutputKind`] - terminal output

mod filesystem;
mod os;
mod terminal;

pub use filesystem::{FsItem, FsKind, last_segment};
pub use os::{OsProfile, UnknownProfile};
pub use terminal::{OutputKind, OutputLine, OutputLineData};
