//! Error types for the shell core.
//!
//! - [`CommandError`] - a command handler could not produce a result at all
//! - [`StorageError`] - key-value persistence failures (history)
//! - [`EditorError`] - coded errors shown in the editor status line
//!
//! Ordinary user mistakes (missing files, wrong types) are not errors in this
//! sense: handlers report them through a failed `CommandResult`.

use thiserror::Error;

/// Failure raised by a command handler.
///
/// The session surfaces any of these as a single error line prefixed with the
/// command name; the shell itself stays usable.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A user supplied regular expression did not compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// The command needs to mutate the filesystem but no mutator was wired in.
    #[error("filesystem is read-only")]
    ReadOnly,
}

/// Key-value storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage not available")]
    Unavailable,
    #[error("failed to serialize value: {0}")]
    Serialization(String),
    #[error("failed to write key '{0}'")]
    WriteFailed(String),
}

/// Editor errors, formatted the way vi reports them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("E32: No file name")]
    NoFileName,
    #[error("E37: No write since last change (add ! to override)")]
    NoWriteSinceLastChange,
    #[error("E492: Not an editor command: {0}")]
    NotAnEditorCommand(String),
    #[error("E518: Unknown option: {0}")]
    UnknownOption(String),
    #[error("E212: Can't open file for writing: {0}")]
    WriteFailed(String),
    #[error("E486: Pattern not found: {0}")]
    PatternNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_error_codes() {
        assert_eq!(EditorError::NoFileName.to_string(), "E32: No file name");
        assert_eq!(
            EditorError::NotAnEditorCommand("foo".into()).to_string(),
            "E492: Not an editor command: foo"
        );
        assert!(
            EditorError::NoWriteSinceLastChange
                .to_string()
                .starts_with("E37")
        );
    }

    #[test]
    fn test_command_error_from_regex() {
        let err: CommandError = regex::Regex::new("(").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid pattern"));
    }
}
