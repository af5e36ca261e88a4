//! Command execution result type.

use crate::models::OutputKind;

/// Request to open the modal editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorRequest {
    /// Absolute path of the file to edit, if one was named.
    pub filename: Option<String>,
    /// Working directory the editor was opened from.
    pub directory: String,
}

/// Result of executing a command.
///
/// Commands never touch session state themselves. Everything they want to
/// happen (output, a directory change, clearing the screen, opening the
/// editor) is described here and applied by the session.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandResult {
    pub success: bool,
    /// Text to display, one output line per `\n`-separated line.
    pub output: String,
    pub error: Option<String>,
    /// Wipe the scrollback before printing anything else.
    pub clear: bool,
    /// Absolute path that becomes the current directory.
    pub new_directory: Option<String>,
    /// The user asked to leave the shell.
    pub exit: bool,
    /// How `output` is rendered.
    pub kind: OutputKind,
    pub editor: Option<EditorRequest>,
    /// Environment assignments, `None` removes the variable.
    pub env_changes: Vec<(String, Option<String>)>,
}

impl Default for CommandResult {
    fn default() -> Self {
        Self {
            success: true,
            output: String::new(),
            error: None,
            clear: false,
            new_directory: None,
            exit: false,
            kind: OutputKind::Output,
            editor: None,
            env_changes: Vec::new(),
        }
    }
}

impl CommandResult {
    /// Successful result with nothing to print.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Successful result with plain output.
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            output: text.into(),
            ..Self::default()
        }
    }

    /// Successful result with output of a given kind.
    pub fn with_kind(kind: OutputKind, text: impl Into<String>) -> Self {
        Self {
            output: text.into(),
            kind,
            ..Self::default()
        }
    }

    /// Failed result carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Output for the operands that worked plus errors for those that did not.
    ///
    /// Successful when `errors` is empty.
    pub fn partial(output: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            success: errors.is_empty(),
            output: output.join("\n"),
            error: (!errors.is_empty()).then(|| errors.join("\n")),
            ..Self::default()
        }
    }

    pub fn clear_screen() -> Self {
        Self {
            clear: true,
            ..Self::default()
        }
    }

    pub fn change_directory(path: impl Into<String>) -> Self {
        Self {
            new_directory: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn exit(farewell: impl Into<String>) -> Self {
        Self {
            exit: true,
            output: farewell.into(),
            kind: OutputKind::Info,
            ..Self::default()
        }
    }

    pub fn set_env(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            env_changes: vec![(name.into(), value)],
            ..Self::default()
        }
    }

    pub fn open_editor(filename: Option<String>, directory: impl Into<String>) -> Self {
        Self {
            editor: Some(EditorRequest {
                filename,
                directory: directory.into(),
            }),
            ..Self::default()
        }
    }
}
