//! Session controller.
//!
//! One [`Session`] per terminal instance. It owns the scrollback, the input
//! line, the working directory and the environment, and it is the only place
//! that applies a [`CommandResult`]. Commands see a fresh [`CommandContext`]
//! built from the session and a snapshot of the filesystem collaborator.
//!
//! While the modal editor is open, key presses go to [`Session::handle_editor_key`]
//! and command submission is ignored until the editor exits.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures::FutureExt;

use crate::config::SessionConfig;
use crate::core::autocomplete::AutocompleteEngine;
use crate::core::commands::{CommandContext, CommandRegistry, CommandResult, posix_to_windows};
use crate::core::editor::{Editor, EditorIo, EditorOutcome, Key};
use crate::core::filesystem::{self, parent_path};
use crate::core::history::HistoryManager;
use crate::core::parser::parse_for;
use crate::core::store::{FileSystemStore, FsMutator};
use crate::models::{FsItem, OsProfile, OutputKind, OutputLine, last_segment};
use crate::utils::RingBuffer;
use crate::utils::clock::now_ms;
use crate::utils::console;
use crate::utils::storage::KeyValueStore;

/// Line appended after a command asks to end the session.
const EXIT_NOTICE: &str = "[Process completed]";

/// Signals for the surrounding UI, drained with [`Session::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Focus should move to the editor.
    EditorOpened {
        filename: Option<String>,
        directory: String,
    },
    /// The editor exited; focus returns to the prompt.
    EditorClosed { filename: Option<String> },
    /// A command asked to end the session. Closing the window is up to the host.
    Exited,
}

pub struct Session {
    user: String,
    host: String,
    home_directory: String,
    current_directory: String,
    os: OsProfile,
    env: BTreeMap<String, String>,
    output: RingBuffer<OutputLine>,
    input: String,
    /// Cursor position in `input`, in characters.
    cursor: usize,
    executing: bool,
    registry: CommandRegistry,
    history: HistoryManager,
    autocomplete: AutocompleteEngine,
    store: Rc<dyn FileSystemStore>,
    editor: Option<Editor>,
    events: Vec<SessionEvent>,
    started_at: u64,
    viewport_height: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("os", &self.os)
            .field("current_directory", &self.current_directory)
            .field("executing", &self.executing)
            .field("editor", &self.editor.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session.
    ///
    /// `storage` backs the per-profile command history; `store` owns the
    /// filesystem tree. A configured start directory that does not exist
    /// falls back to its nearest existing ancestor.
    pub fn new(
        config: SessionConfig,
        store: Rc<dyn FileSystemStore>,
        storage: Rc<dyn KeyValueStore>,
    ) -> Self {
        let os = config.os;
        let env = config.environment(os);
        let mut session = Self {
            history: HistoryManager::with_limit(storage, os, config.history_limit),
            registry: CommandRegistry::new(os),
            autocomplete: AutocompleteEngine::default(),
            output: RingBuffer::new(config.output_limit.max(1)),
            current_directory: filesystem::normalize(&config.initial_directory),
            home_directory: filesystem::normalize(&config.home_directory),
            user: config.user,
            host: config.host,
            os,
            env,
            input: String::new(),
            cursor: 0,
            executing: false,
            store,
            editor: None,
            events: Vec::new(),
            started_at: now_ms(),
            viewport_height: config.viewport_height,
        };
        session.ensure_directory_exists();
        session
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn output(&self) -> &RingBuffer<OutputLine> {
        &self.output
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_directory(&self) -> &str {
        &self.current_directory
    }

    pub fn home_directory(&self) -> &str {
        &self.home_directory
    }

    pub fn os(&self) -> OsProfile {
        self.os
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn autocomplete(&self) -> &AutocompleteEngine {
        &self.autocomplete
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    /// Take every event raised since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// `guest@host:~/Documents$` on Linux, `C:\home\guest>` on Windows.
    pub fn prompt(&self) -> String {
        match self.os {
            OsProfile::Linux => format!(
                "{}@{}:{}$",
                self.user,
                self.host,
                abbreviate_home(&self.current_directory, &self.home_directory)
            ),
            OsProfile::Windows => format!("{}>", posix_to_windows(&self.current_directory)),
        }
    }

    // =========================================================================
    // Input line
    // =========================================================================

    /// Replace the input line and put the cursor at its end.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.cursor = self.input.chars().count();
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.input.chars().count());
    }

    /// Recall an older command.
    pub fn history_up(&mut self) {
        if let Some(entry) = self.history.up().map(str::to_string) {
            self.set_input(entry);
        }
    }

    /// Recall a newer command; stepping past the newest empties the line.
    pub fn history_down(&mut self) {
        let was_browsing = self.history.is_browsing();
        match self.history.down().map(str::to_string) {
            Some(entry) => self.set_input(entry),
            None if was_browsing => self.set_input(String::new()),
            None => {}
        }
    }

    /// Tab: complete the word under the cursor or show the candidates.
    pub fn tab_complete(&mut self) {
        let tree = self.store.snapshot();
        let mutator = StoreHandle(&*self.store);
        let mut engine = std::mem::take(&mut self.autocomplete);
        let completion = {
            let ctx = self.context(&tree, &mutator);
            engine.tab(&self.input, self.cursor, &ctx)
        };
        self.autocomplete = engine;

        if let Some(completion) = completion {
            self.input = completion.input;
            self.cursor = completion.cursor;
        }
    }

    pub fn select_next_suggestion(&mut self) {
        self.autocomplete.select_next();
    }

    pub fn select_previous_suggestion(&mut self) {
        self.autocomplete.select_previous();
    }

    /// Put the highlighted suggestion into the input line.
    pub fn accept_suggestion(&mut self) -> bool {
        match self.autocomplete.accept(&self.input) {
            Some(completion) => {
                self.input = completion.input;
                self.cursor = completion.cursor;
                true
            }
            None => false,
        }
    }

    pub fn hide_suggestions(&mut self) {
        self.autocomplete.hide();
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run one submitted line to completion.
    ///
    /// Ignored while another command is executing or the editor is open.
    pub async fn execute_command(&mut self, raw: &str) {
        if self.executing {
            console::debug(&format!("ignoring '{}': a command is still running", raw));
            return;
        }
        if self.editor.is_some() {
            console::debug(&format!("ignoring '{}': the editor is open", raw));
            return;
        }

        let prompt = self.prompt();
        self.output.push(OutputLine::command(prompt, raw));

        let line = raw.trim();
        if !line.is_empty() {
            self.history.add(line);
            self.executing = true;
            self.run(raw).await;
        }

        self.executing = false;
        self.input.clear();
        self.cursor = 0;
        self.autocomplete.hide();
        self.history.reset_navigation();
    }

    async fn run(&mut self, raw: &str) {
        let parsed = parse_for(raw, self.os);
        if parsed.is_empty() {
            return;
        }

        let outcome = {
            let Some(def) = self.registry.get(&parsed.command) else {
                let message = self.os.not_found_message(&parsed.command);
                self.output.extend(message.lines().map(OutputLine::error));
                return;
            };
            let tree = self.store.snapshot();
            let mutator = StoreHandle(&*self.store);
            let ctx = self.context(&tree, &mutator);
            AssertUnwindSafe(def.execute(&parsed, &ctx))
                .catch_unwind()
                .await
        };

        match outcome {
            Ok(Ok(result)) => self.apply(result),
            Ok(Err(err)) => {
                console::error(&format!("{} failed: {}", parsed.command, err));
                self.output
                    .push(OutputLine::error(format!("{}: {}", parsed.command, err)));
            }
            // Only reachable where panics unwind; wasm32 aborts instead.
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                console::error(&format!("{} panicked: {}", parsed.command, reason));
                self.output.push(OutputLine::error(format!(
                    "{}: internal error: {}",
                    parsed.command, reason
                )));
            }
        }
        self.ensure_directory_exists();
    }

    fn apply(&mut self, result: CommandResult) {
        if result.clear {
            self.output.clear();
        }
        if !result.output.is_empty() {
            let kind = result.kind;
            self.output
                .extend(result.output.lines().map(|line| OutputLine::of_kind(kind, line)));
        }
        if let Some(error) = result.error.as_deref().filter(|e| !e.is_empty()) {
            self.output.extend(error.lines().map(OutputLine::error));
        }
        if let Some(dir) = result.new_directory {
            self.current_directory = filesystem::normalize(&dir);
        }
        for (name, value) in result.env_changes {
            match value {
                Some(value) => {
                    self.env.insert(name, value);
                }
                None => {
                    self.env.remove(&name);
                }
            }
        }
        if result.exit {
            self.output.push(OutputLine::of_kind(OutputKind::Info, EXIT_NOTICE));
            self.events.push(SessionEvent::Exited);
        }
        if let Some(request) = result.editor {
            self.open_editor(request.filename, request.directory);
        }
    }

    fn open_editor(&mut self, filename: Option<String>, directory: String) {
        let tree = self.store.snapshot();
        let content = filename
            .as_deref()
            .and_then(|path| filesystem::read_file(&tree, path));
        let editor = Editor::open(filename.clone(), directory.clone(), content)
            .with_viewport_height(self.viewport_height);
        self.editor = Some(editor);
        self.events
            .push(SessionEvent::EditorOpened { filename, directory });
    }

    /// Forward a key to the open editor. Returns `false` once it has closed.
    pub fn handle_editor_key(&mut self, key: Key) -> bool {
        let Some(editor) = self.editor.as_mut() else {
            return false;
        };
        let mut io = StoreHandle(&*self.store);
        if editor.handle_key(key, &mut io) == EditorOutcome::Continue {
            return true;
        }

        let filename = editor.filename().map(str::to_string);
        self.editor = None;
        self.events.push(SessionEvent::EditorClosed { filename });
        self.ensure_directory_exists();
        false
    }

    /// Switch the command set, history slot and shell variables to `os`.
    pub fn switch_os(&mut self, os: OsProfile) {
        if os == self.os {
            return;
        }
        self.os = os;
        self.registry.switch_os(os);
        self.history.switch_os(os);
        self.env
            .insert("SHELL".to_string(), os.shell_path().to_string());
        self.env
            .insert("PATH".to_string(), os.default_path().to_string());
        self.autocomplete.hide();
        self.set_input(String::new());
    }

    fn context<'a>(&'a self, tree: &'a FsItem, mutator: &'a dyn FsMutator) -> CommandContext<'a> {
        CommandContext {
            current_directory: &self.current_directory,
            home_directory: &self.home_directory,
            os: self.os,
            env: &self.env,
            history: self.history.entries(),
            file_system: tree,
            user: &self.user,
            host: &self.host,
            mutator: Some(mutator),
            registry: &self.registry,
            started_at: self.started_at,
        }
    }

    /// Move up to the nearest existing directory if the current one vanished.
    fn ensure_directory_exists(&mut self) {
        let tree = self.store.snapshot();
        let mut dir = self.current_directory.clone();
        while dir != "/" && !filesystem::is_directory(&tree, &dir) {
            dir = parent_path(&dir);
        }
        if dir != self.current_directory {
            console::debug(&format!(
                "{} no longer exists, moving to {}",
                self.current_directory, dir
            ));
            self.current_directory = dir;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn abbreviate_home(path: &str, home: &str) -> String {
    if path == home {
        return "~".to_string();
    }
    match path.strip_prefix(home) {
        Some(rest) if home != "/" && rest.starts_with('/') => format!("~{}", rest),
        _ => path.to_string(),
    }
}

// =============================================================================
// Store adapter
// =============================================================================

/// Borrowed store, handed to commands as their mutator and to the editor as
/// its load and save callbacks.
struct StoreHandle<'a>(&'a dyn FileSystemStore);

impl FsMutator for StoreHandle<'_> {
    fn create_file(&self, parent: &str, name: &str, content: &str) -> bool {
        self.0.create_file(parent, name, content)
    }

    fn create_folder(&self, parent: &str, name: &str) -> bool {
        self.0.create_folder(parent, name)
    }

    fn remove_item(&self, path: &str) -> bool {
        self.0.remove_item(path)
    }
}

impl EditorIo for StoreHandle<'_> {
    fn load(&mut self, path: &str) -> Option<String> {
        let tree = self.0.snapshot();
        filesystem::read_file(&tree, path).map(str::to_string)
    }

    fn save(&mut self, path: &str, content: &str) -> bool {
        let tree = self.0.snapshot();
        if filesystem::is_directory(&tree, path) {
            return false;
        }
        let (parent, name) = (parent_path(path), last_segment(path));
        let previous = filesystem::read_file(&tree, path);
        if previous.is_some() && !self.0.remove_item(path) {
            return false;
        }
        if self.0.create_file(&parent, name, content) {
            return true;
        }

        // Put the old file back so a failed write loses nothing
        let restored = previous.is_none_or(|old| self.0.create_file(&parent, name, old));
        if !restored {
            console::error(&format!("could not restore {} after a failed write", path));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::core::commands::{CommandDefinition, HandlerResult};
    use crate::core::history::history_key;
    use crate::core::parser::ParsedCommandLine;
    use crate::core::store::MemoryStore;
    use crate::models::OutputLineData;
    use crate::utils::storage::MemoryStorage;

    struct Harness {
        session: Session,
        store: Rc<MemoryStore>,
        storage: Rc<MemoryStorage>,
    }

    fn harness(config: SessionConfig) -> Harness {
        let store = Rc::new(MemoryStore::with_home("guest"));
        let storage = Rc::new(MemoryStorage::new());
        let session = Session::new(config, store.clone(), storage.clone());
        Harness {
            session,
            store,
            storage,
        }
    }

    fn linux() -> Harness {
        harness(SessionConfig::default())
    }

    fn windows() -> Harness {
        harness(SessionConfig {
            os: OsProfile::Windows,
            ..SessionConfig::default()
        })
    }

    fn contents(session: &Session) -> Vec<String> {
        session
            .output()
            .iter()
            .map(|line| line.content().to_string())
            .collect()
    }

    fn keys(session: &mut Session, text: &str) {
        for c in text.chars() {
            let key = match c {
                '\x1b' => Key::Escape,
                '\n' => Key::Enter,
                c => Key::Char(c),
            };
            session.handle_editor_key(key);
        }
    }

    #[test]
    fn test_prompt() {
        let mut h = linux();
        assert_eq!(h.session.prompt(), "guest@portfolio:~$");
        h.session.current_directory = "/home/guest/Documents".to_string();
        assert_eq!(h.session.prompt(), "guest@portfolio:~/Documents$");
        h.session.current_directory = "/tmp".to_string();
        assert_eq!(h.session.prompt(), "guest@portfolio:/tmp$");

        let h = windows();
        assert_eq!(h.session.prompt(), "C:\\home\\guest>");
    }

    #[test]
    fn test_abbreviate_home_needs_separator() {
        assert_eq!(abbreviate_home("/home/guestbook", "/home/guest"), "/home/guestbook");
        assert_eq!(abbreviate_home("/", "/"), "~");
    }

    #[test]
    fn test_missing_start_directory_falls_back() {
        let h = harness(SessionConfig {
            initial_directory: "/home/guest/nowhere/deeper".to_string(),
            ..SessionConfig::default()
        });
        assert_eq!(h.session.current_directory(), "/home/guest");
    }

    #[tokio::test]
    async fn test_empty_input_echoes_without_history() {
        let mut h = linux();
        h.session.set_input("   ");
        h.session.execute_command("   ").await;

        assert_eq!(h.session.output().len(), 1);
        assert!(matches!(
            &h.session.output().get(0).unwrap().data,
            OutputLineData::Command { input, .. } if input == "   "
        ));
        assert!(h.session.history().is_empty());
        assert_eq!(h.session.input(), "");
        assert_eq!(h.session.cursor(), 0);
    }

    #[tokio::test]
    async fn test_command_output_and_history() {
        let mut h = linux();
        h.session.execute_command("echo hello").await;

        let lines = contents(&h.session);
        assert_eq!(lines, vec!["echo hello", "hello"]);
        assert_eq!(h.session.history().entries(), ["echo hello"]);
        assert!(!h.session.is_executing());
        assert!(h.storage.get_item(&history_key(OsProfile::Linux)).is_some());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut h = linux();
        h.session.execute_command("frobnicate now").await;
        let last = h.session.output().last().unwrap();
        assert_eq!(last.kind(), OutputKind::Error);
        assert_eq!(last.content(), "bash: frobnicate: command not found");
        assert_eq!(h.session.history().len(), 1);

        let mut h = windows();
        h.session.execute_command("frobnicate").await;
        let errors: Vec<_> = h
            .session
            .output()
            .iter()
            .filter(|line| line.kind() == OutputKind::Error)
            .collect();
        assert!(errors[0].content().contains("'frobnicate' is not recognized"));
    }

    #[tokio::test]
    async fn test_cd_updates_directory_and_prompt() {
        let mut h = linux();
        h.session.execute_command("cd Documents").await;
        assert_eq!(h.session.current_directory(), "/home/guest/Documents");
        assert_eq!(h.session.prompt(), "guest@portfolio:~/Documents$");

        h.session.execute_command("cd /nope").await;
        assert_eq!(h.session.current_directory(), "/home/guest/Documents");
        assert_eq!(
            h.session.output().last().unwrap().kind(),
            OutputKind::Error
        );
    }

    #[tokio::test]
    async fn test_clear_wipes_output() {
        let mut h = linux();
        h.session.execute_command("echo one").await;
        h.session.execute_command("clear").await;
        assert!(h.session.output().is_empty());
    }

    #[tokio::test]
    async fn test_exit_emits_notice_and_event() {
        let mut h = linux();
        h.session.execute_command("exit").await;
        let lines = contents(&h.session);
        assert_eq!(lines.last().map(String::as_str), Some(EXIT_NOTICE));
        assert_eq!(h.session.drain_events(), vec![SessionEvent::Exited]);
        assert!(h.session.drain_events().is_empty());
    }

    #[tokio::test]
    async fn test_export_changes_environment() {
        let mut h = linux();
        h.session.execute_command("export GREETING=hi").await;
        assert_eq!(h.session.env().get("GREETING").map(String::as_str), Some("hi"));
        h.session.execute_command("echo $GREETING").await;
        assert_eq!(h.session.output().last().unwrap().content(), "hi");
    }

    #[tokio::test]
    async fn test_removing_current_directory_moves_up() {
        let mut h = linux();
        h.session.execute_command("cd Documents").await;
        assert!(h.store.remove_item("/home/guest/Documents"));
        h.session.execute_command("pwd").await;
        assert_eq!(h.session.current_directory(), "/home/guest");
    }

    #[tokio::test]
    async fn test_mkdir_goes_through_store() {
        let mut h = linux();
        h.session.execute_command("mkdir notes").await;
        let tree = h.store.snapshot();
        assert!(filesystem::is_directory(&tree, "/home/guest/notes"));
    }

    #[tokio::test]
    async fn test_history_navigation() {
        let mut h = linux();
        h.session.execute_command("pwd").await;
        h.session.execute_command("whoami").await;

        h.session.history_up();
        assert_eq!(h.session.input(), "whoami");
        assert_eq!(h.session.cursor(), 6);
        h.session.history_up();
        h.session.history_up();
        assert_eq!(h.session.input(), "pwd");
        h.session.history_down();
        assert_eq!(h.session.input(), "whoami");
        h.session.history_down();
        assert_eq!(h.session.input(), "");

        // Down without browsing leaves a typed line alone
        h.session.set_input("draft");
        h.session.history_down();
        assert_eq!(h.session.input(), "draft");
    }

    #[tokio::test]
    async fn test_tab_completion() {
        let mut h = linux();
        h.session.set_input("cd Doc");
        h.session.tab_complete();
        assert_eq!(h.session.input(), "cd Documents/");
        assert_eq!(h.session.cursor(), "cd Documents/".len());

        h.session.set_input("e");
        h.session.tab_complete();
        assert!(h.session.autocomplete().is_visible());
        h.session.select_next_suggestion();
        let chosen = h.session.autocomplete().suggestions()[0].clone();
        assert!(h.session.accept_suggestion());
        assert!(h.session.input().starts_with(&chosen));

        h.session.execute_command("pwd").await;
        assert!(!h.session.autocomplete().is_visible());
    }

    #[tokio::test]
    async fn test_switch_os_swaps_commands_and_history() {
        let mut h = linux();
        h.session.execute_command("ls").await;
        h.session.switch_os(OsProfile::Windows);

        assert_eq!(h.session.os(), OsProfile::Windows);
        assert!(h.session.history().is_empty());
        assert!(h.session.registry().get("dir").is_some());
        assert!(h.session.registry().get("ls").is_none());
        assert_eq!(
            h.session.env().get("SHELL").map(String::as_str),
            Some(OsProfile::Windows.shell_path())
        );

        h.session.execute_command("dir").await;
        h.session.switch_os(OsProfile::Linux);
        assert_eq!(h.session.history().entries(), ["ls"]);
    }

    #[tokio::test]
    async fn test_editor_round_trip() {
        let mut h = linux();
        h.session.execute_command("vim notes.txt").await;
        assert!(h.session.is_editing());
        assert_eq!(
            h.session.drain_events(),
            vec![SessionEvent::EditorOpened {
                filename: Some("/home/guest/notes.txt".to_string()),
                directory: "/home/guest".to_string(),
            }]
        );

        // Submissions are ignored while editing
        let before = h.session.output().len();
        h.session.execute_command("ls").await;
        assert_eq!(h.session.output().len(), before);

        keys(&mut h.session, "ihello\x1b:wq\n");
        assert!(!h.session.is_editing());
        assert_eq!(
            h.session.drain_events(),
            vec![SessionEvent::EditorClosed {
                filename: Some("/home/guest/notes.txt".to_string())
            }]
        );
        let tree = h.store.snapshot();
        assert_eq!(
            filesystem::read_file(&tree, "/home/guest/notes.txt"),
            Some("hello\n")
        );
    }

    #[tokio::test]
    async fn test_editor_overwrites_existing_file() {
        let mut h = linux();
        h.session.execute_command("vim readme.txt").await;
        let editor = h.session.editor().unwrap();
        assert!(editor.buffer().line(0).unwrap().starts_with("Welcome!"));

        keys(&mut h.session, "ddiupdated\x1b:wq\n");
        let tree = h.store.snapshot();
        assert_eq!(
            filesystem::read_file(&tree, "/home/guest/readme.txt"),
            Some("updated\n")
        );
    }

    #[tokio::test]
    async fn test_editor_quit_without_changes() {
        let mut h = linux();
        h.session.execute_command("vim").await;
        assert!(h.session.handle_editor_key(Key::Char(':')));
        keys(&mut h.session, "q\n");
        assert!(!h.session.is_editing());
        assert!(!h.session.handle_editor_key(Key::Char('x')));
    }

    fn explode(_cmd: &ParsedCommandLine, _ctx: &CommandContext<'_>) -> HandlerResult {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_error_line() {
        let mut h = linux();
        h.session
            .registry
            .register(CommandDefinition::new("explode", "Always panics", "explode", explode));

        h.session.set_input("explode");
        h.session.execute_command("explode").await;
        let last = h.session.output().last().unwrap();
        assert_eq!(last.kind(), OutputKind::Error);
        assert_eq!(last.content(), "explode: internal error: kaboom");
        assert!(!h.session.is_executing());
        assert_eq!(h.session.input(), "");

        h.session.execute_command("echo still here").await;
        assert_eq!(h.session.output().last().unwrap().content(), "still here");
    }

    #[tokio::test]
    async fn test_windows_paths_reach_commands() {
        let mut h = windows();
        h.session.execute_command("md notes\\2024").await;
        h.session.execute_command("cd C:\\home\\guest\\notes\\2024").await;
        assert_eq!(h.session.current_directory(), "/home/guest/notes/2024");
        assert_eq!(h.session.prompt(), "C:\\home\\guest\\notes\\2024>");

        h.session.execute_command("cd ..\\..").await;
        assert_eq!(h.session.current_directory(), "/home/guest");
        h.session.execute_command("cd C:\\").await;
        assert_eq!(h.session.current_directory(), "/");
    }

    /// Store whose next `create_file` fails once.
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_create: Cell<bool>,
    }

    impl FsMutator for FlakyStore {
        fn create_file(&self, parent: &str, name: &str, content: &str) -> bool {
            !self.fail_next_create.replace(false) && self.inner.create_file(parent, name, content)
        }

        fn create_folder(&self, parent: &str, name: &str) -> bool {
            self.inner.create_folder(parent, name)
        }

        fn remove_item(&self, path: &str) -> bool {
            self.inner.remove_item(path)
        }
    }

    impl FileSystemStore for FlakyStore {
        fn snapshot(&self) -> FsItem {
            self.inner.snapshot()
        }
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let store = FlakyStore {
            inner: MemoryStore::with_home("guest"),
            fail_next_create: Cell::new(true),
        };
        let path = "/home/guest/readme.txt";
        let original = filesystem::read_file(&store.snapshot(), path).map(str::to_string);

        let mut io = StoreHandle(&store);
        assert!(!io.save(path, "replacement\n"));
        assert_eq!(
            filesystem::read_file(&store.snapshot(), path).map(str::to_string),
            original
        );

        assert!(io.save(path, "replacement\n"));
        assert_eq!(io.load(path).as_deref(), Some("replacement\n"));
        assert!(!io.save("/home/guest/Documents", "x"));
    }
}
