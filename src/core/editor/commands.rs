//! Ex commands typed after `:`.

use super::{Editor, EditorIo, EditorOutcome};
use crate::core::error::EditorError;
use crate::utils::console;

/// Parsed ex command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommand {
    /// `:w [file]`
    Write { file: Option<String> },
    /// `:q`, `:q!`
    Quit { force: bool },
    /// `:wq [file]`, `:x`
    WriteQuit { file: Option<String> },
    /// `:e[!] [file]`
    Edit { file: Option<String>, force: bool },
    /// `:set opt...`
    Set(Vec<String>),
    /// `:help`
    Help,
    /// `:<number>`, `:$`; 1-based, clamped when applied.
    Goto(usize),
    /// Empty command line.
    Nothing,
}

impl ExCommand {
    /// Parse a command line (without the leading `:`).
    pub fn parse(line: &str) -> Result<Self, EditorError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Nothing);
        }
        if line == "$" {
            return Ok(Self::Goto(usize::MAX));
        }
        if let Ok(number) = line.parse::<usize>() {
            return Ok(Self::Goto(number));
        }

        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));
        let file = (!rest.is_empty()).then(|| rest.to_string());

        Ok(match name {
            "w" | "write" => Self::Write { file },
            "q" | "quit" => Self::Quit { force: false },
            "q!" | "quit!" => Self::Quit { force: true },
            "wq" | "wq!" | "x" | "xit" => Self::WriteQuit { file },
            "e" | "edit" => Self::Edit { file, force: false },
            "e!" | "edit!" => Self::Edit { file, force: true },
            "set" | "se" => Self::Set(rest.split_whitespace().map(str::to_string).collect()),
            "help" | "h" => Self::Help,
            _ => return Err(EditorError::NotAnEditorCommand(line.to_string())),
        })
    }
}

impl Editor {
    /// Run a command line. The editor is back in normal mode afterwards,
    /// whether or not the command succeeded.
    pub(super) fn execute_ex(&mut self, line: &str, io: &mut dyn EditorIo) -> EditorOutcome {
        match ExCommand::parse(line).and_then(|command| self.run_ex(command, io)) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.error(err);
                EditorOutcome::Continue
            }
        }
    }

    fn run_ex(&mut self, command: ExCommand, io: &mut dyn EditorIo) -> Result<EditorOutcome, EditorError> {
        match command {
            ExCommand::Nothing => {}
            ExCommand::Write { file } => self.write(file.as_deref(), io)?,
            ExCommand::Quit { force } => {
                if !force && self.is_modified() {
                    return Err(EditorError::NoWriteSinceLastChange);
                }
                return Ok(EditorOutcome::Exit);
            }
            ExCommand::WriteQuit { file } => {
                self.write(file.as_deref(), io)?;
                return Ok(EditorOutcome::Exit);
            }
            ExCommand::Edit { file, force } => self.edit(file.as_deref(), force, io)?,
            ExCommand::Set(options) => self.set_options(&options)?,
            ExCommand::Help => self.show_help = true,
            ExCommand::Goto(number) => self.go_to_line(number.saturating_sub(1)),
        }
        Ok(EditorOutcome::Continue)
    }

    fn write(&mut self, file: Option<&str>, io: &mut dyn EditorIo) -> Result<(), EditorError> {
        let path = match file {
            Some(name) => self.resolve(name),
            None => self.filename.clone().ok_or(EditorError::NoFileName)?,
        };

        let content = self.buffer.content();
        if !io.save(&path, &content) {
            console::error(&format!("editor: failed to write {}", path));
            return Err(EditorError::WriteFailed(path));
        }

        // Writing an unnamed buffer names it.
        if self.filename.is_none() {
            self.filename = Some(path.clone());
        }
        if self.filename.as_deref() == Some(path.as_str()) {
            self.history.mark_saved();
        }
        self.info(format!(
            "\"{}\" {}L, {}B written",
            path,
            self.buffer.line_count(),
            content.len()
        ));
        Ok(())
    }

    fn edit(&mut self, file: Option<&str>, force: bool, io: &mut dyn EditorIo) -> Result<(), EditorError> {
        if !force && self.is_modified() {
            return Err(EditorError::NoWriteSinceLastChange);
        }
        let path = match file {
            Some(name) => self.resolve(name),
            None => self.filename.clone().ok_or(EditorError::NoFileName)?,
        };
        let content = io.load(&path);
        self.load_buffer(path, content.as_deref());
        Ok(())
    }

    fn set_options(&mut self, options: &[String]) -> Result<(), EditorError> {
        if options.is_empty() {
            self.info(if self.show_line_numbers {
                "  number"
            } else {
                "  nonumber"
            });
            return Ok(());
        }

        for option in options {
            self.show_line_numbers = match option.as_str() {
                "number" | "nu" => true,
                "nonumber" | "nonu" => false,
                "number!" | "nu!" | "invnumber" | "invnu" => !self.show_line_numbers,
                other => return Err(EditorError::UnknownOption(other.to_string())),
            };
        }
        Ok(())
    }
}
