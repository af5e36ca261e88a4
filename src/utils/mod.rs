//! Platform helpers and small data structures.
//!
//! Provides:
//! - [`RingBuffer`] - bounded scrollback storage
//! - [`storage`] - key-value persistence (`localStorage` on wasm32)
//! - [`clock`] - wall-clock time and simulated latency
//! - [`console`] - browser console logging
//! - [`format`] - date, duration and size formatting

pub mod clock;
pub mod console;
pub mod format;
mod ring_buffer;
pub mod storage;

pub use ring_buffer::RingBuffer;
