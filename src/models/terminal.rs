//! Terminal output lines.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Rendering category of an output line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Input,
    #[default]
    Output,
    Error,
    Success,
    Warning,
    Info,
}

/// A single line of terminal output with a unique ID.
#[derive(Clone, Debug)]
pub struct OutputLine {
    /// Unique ID for keyed rendering.
    pub id: usize,
    pub data: OutputLineData,
}

/// Content of an output line.
#[derive(Clone, Debug, PartialEq)]
pub enum OutputLineData {
    /// Echo of a submitted command with the prompt it was typed at.
    Command { prompt: String, input: String },
    Text(String),
    Error(String),
    Success(String),
    Warning(String),
    Info(String),
}

static OUTPUT_LINE_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl OutputLine {
    fn new(data: OutputLineData) -> Self {
        Self {
            id: OUTPUT_LINE_COUNTER.fetch_add(1, Ordering::Relaxed),
            data,
        }
    }

    pub fn command(prompt: impl Into<String>, input: impl Into<String>) -> Self {
        Self::new(OutputLineData::Command {
            prompt: prompt.into(),
            input: input.into(),
        })
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::new(OutputLineData::Text(s.into()))
    }

    pub fn error(s: impl Into<String>) -> Self {
        Self::new(OutputLineData::Error(s.into()))
    }

    pub fn success(s: impl Into<String>) -> Self {
        Self::new(OutputLineData::Success(s.into()))
    }

    pub fn warning(s: impl Into<String>) -> Self {
        Self::new(OutputLineData::Warning(s.into()))
    }

    pub fn info(s: impl Into<String>) -> Self {
        Self::new(OutputLineData::Info(s.into()))
    }

    /// Build a line of the given kind. `Input` lines carry no prompt.
    pub fn of_kind(kind: OutputKind, s: impl Into<String>) -> Self {
        match kind {
            OutputKind::Input => Self::command("", s),
            OutputKind::Output => Self::text(s),
            OutputKind::Error => Self::error(s),
            OutputKind::Success => Self::success(s),
            OutputKind::Warning => Self::warning(s),
            OutputKind::Info => Self::info(s),
        }
    }

    pub fn kind(&self) -> OutputKind {
        match self.data {
            OutputLineData::Command { .. } => OutputKind::Input,
            OutputLineData::Text(_) => OutputKind::Output,
            OutputLineData::Error(_) => OutputKind::Error,
            OutputLineData::Success(_) => OutputKind::Success,
            OutputLineData::Warning(_) => OutputKind::Warning,
            OutputLineData::Info(_) => OutputKind::Info,
        }
    }

    /// Plain text of the line (the input part for command echoes).
    pub fn content(&self) -> &str {
        match &self.data {
            OutputLineData::Command { input, .. } => input,
            OutputLineData::Text(s)
            | OutputLineData::Error(s)
            | OutputLineData::Success(s)
            | OutputLineData::Warning(s)
            | OutputLineData::Info(s) => s,
        }
    }
}

impl PartialEq for OutputLine {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}
