//! A simulated shell for a web desktop.
//!
//! The host page supplies a filesystem tree through
//! [`FileSystemStore`](core::FileSystemStore) and drives a
//! [`Session`](core::Session) with submitted lines and key presses. The
//! session runs Linux or Windows flavoured commands against the tree, keeps
//! per-profile history, completes paths and command names, and hosts a modal
//! vi-style editor.

pub mod config;
pub mod core;
pub mod models;
pub mod utils;

pub use crate::config::SessionConfig;
pub use crate::core::{Session, SessionEvent};
pub use crate::models::OsProfile;
