//! End-to-end flows through the public API.

use std::rc::Rc;

use deskshell::core::editor::{Key, ModeKind};
use deskshell::core::filesystem;
use deskshell::core::history::history_key;
use deskshell::core::store::{FileSystemStore, MemoryStore};
use deskshell::models::OutputKind;
use deskshell::utils::storage::{KeyValueStore, MemoryStorage};
use deskshell::{OsProfile, Session, SessionConfig, SessionEvent};

fn session(config: SessionConfig) -> (Session, Rc<MemoryStore>, Rc<MemoryStorage>) {
    let store = Rc::new(MemoryStore::with_home("guest"));
    let storage = Rc::new(MemoryStorage::new());
    let session = Session::new(config, store.clone(), storage.clone());
    (session, store, storage)
}

fn last_output(session: &Session) -> String {
    session
        .output()
        .last()
        .map(|line| line.content().to_string())
        .unwrap_or_default()
}

fn press(session: &mut Session, keys: &str) {
    for c in keys.chars() {
        let key = match c {
            '\x1b' => Key::Escape,
            '\n' => Key::Enter,
            c => Key::Char(c),
        };
        session.handle_editor_key(key);
    }
}

#[tokio::test]
async fn test_file_commands_through_the_store() {
    let (mut shell, store, _) = session(SessionConfig::default());

    shell.execute_command("mkdir -p work/src").await;
    shell.execute_command("cd work").await;
    assert_eq!(shell.prompt(), "guest@portfolio:~/work$");

    shell.execute_command("cp ../readme.txt src/intro.txt").await;
    shell.execute_command("cat src/intro.txt").await;
    assert!(last_output(&shell).starts_with("Welcome!"));

    let tree = store.snapshot();
    assert!(filesystem::is_file(&tree, "/home/guest/work/src/intro.txt"));

    shell.execute_command("rm -r /home/guest/work").await;
    shell.execute_command("pwd").await;
    assert_eq!(shell.current_directory(), "/home/guest");
}

#[tokio::test]
async fn test_profiles_keep_separate_history() {
    let (mut shell, _, storage) = session(SessionConfig::default());

    shell.execute_command("ls").await;
    shell.execute_command("whoami").await;
    shell.switch_os(OsProfile::Windows);
    assert_eq!(shell.prompt(), "C:\\home\\guest>");

    shell.execute_command("dir").await;
    shell.execute_command("ls").await;
    assert_eq!(
        shell.output().last().map(|line| line.kind()),
        Some(OutputKind::Error)
    );
    assert_eq!(shell.history().entries(), ["dir", "ls"]);

    shell.switch_os(OsProfile::Linux);
    assert_eq!(shell.history().entries(), ["ls", "whoami"]);
    shell.history_up();
    assert_eq!(shell.input(), "whoami");

    assert!(storage.get_item(&history_key(OsProfile::Linux)).is_some());
    assert!(storage.get_item(&history_key(OsProfile::Windows)).is_some());

    // A fresh session over the same storage sees the persisted list
    let store = Rc::new(MemoryStore::with_home("guest"));
    let restored = Session::new(SessionConfig::default(), store, storage.clone());
    assert_eq!(restored.history().entries(), ["ls", "whoami"]);
}

#[tokio::test]
async fn test_editor_round_trip() {
    let (mut shell, store, _) = session(SessionConfig::default());

    shell.execute_command("vim todo.txt").await;
    assert!(matches!(
        shell.drain_events().as_slice(),
        [SessionEvent::EditorOpened { filename: Some(name), .. }] if name == "/home/guest/todo.txt"
    ));

    press(&mut shell, "ifirst\nsecond\x1b");
    let editor = shell.editor().expect("editor open");
    assert_eq!(editor.mode_kind(), ModeKind::Normal);
    assert!(editor.is_modified());

    // Unsaved changes block a plain quit
    press(&mut shell, ":q\n");
    let editor = shell.editor().expect("quit was refused");
    assert_eq!(editor.mode_kind(), ModeKind::Normal);
    assert!(editor.message().is_some_and(|m| m.text.starts_with("E37")));

    press(&mut shell, "u");
    assert_eq!(shell.editor().unwrap().buffer().lines(), [""]);
    shell.handle_editor_key(Key::Ctrl('r'));
    assert_eq!(shell.editor().unwrap().buffer().lines(), ["first", "second"]);

    press(&mut shell, ":wq\n");
    assert!(!shell.is_editing());
    assert_eq!(
        shell.drain_events(),
        vec![SessionEvent::EditorClosed {
            filename: Some("/home/guest/todo.txt".to_string())
        }]
    );

    let tree = store.snapshot();
    assert_eq!(
        filesystem::read_file(&tree, "/home/guest/todo.txt"),
        Some("first\nsecond\n")
    );

    shell.execute_command("cat todo.txt").await;
    assert_eq!(last_output(&shell), "second");
}

#[tokio::test]
async fn test_config_from_json() {
    let config = SessionConfig::from_json(
        r#"{"user":"ada","host":"lab","os":"windows","homeDirectory":"/home/ada","initialDirectory":"/home/ada"}"#,
    );
    let store = Rc::new(MemoryStore::with_home("ada"));
    let storage = Rc::new(MemoryStorage::new());
    let mut shell = Session::new(config, store, storage);

    assert_eq!(shell.os(), OsProfile::Windows);
    assert_eq!(shell.current_directory(), "/home/ada");
    shell.execute_command("echo %USER%").await;
    assert_eq!(last_output(&shell), "ada");
}

#[tokio::test]
async fn test_windows_command_lines_keep_backslashes() {
    let (mut shell, store, _) = session(SessionConfig::default());
    shell.switch_os(OsProfile::Windows);

    shell.execute_command("cd C:\\home").await;
    assert_eq!(shell.current_directory(), "/home");
    assert_eq!(shell.prompt(), "C:\\home>");

    shell.execute_command("cd ..\\..").await;
    assert_eq!(shell.current_directory(), "/");

    shell.execute_command("dir").await;
    let listing: Vec<String> = shell
        .output()
        .iter()
        .map(|line| line.content().to_string())
        .collect();
    assert!(listing.iter().any(|line| line == " Directory of C:\\"));
    assert!(listing.iter().any(|line| line.ends_with("<DIR>          home")));

    shell
        .execute_command("copy C:\\home\\guest\\readme.txt C:\\tmp\\copy.txt")
        .await;
    let tree = store.snapshot();
    assert_eq!(
        filesystem::read_file(&tree, "/tmp/copy.txt"),
        filesystem::read_file(&tree, "/home/guest/readme.txt")
    );

    // cmd escapes with ^, not \
    shell.execute_command("echo a^ b\\c").await;
    assert_eq!(last_output(&shell), "a b\\c");
}

#[tokio::test]
async fn test_windows_tab_completion_submits_cleanly() {
    let (mut shell, _, _) = session(SessionConfig {
        os: OsProfile::Windows,
        ..SessionConfig::default()
    });

    shell.set_input("cd C:\\home\\guest\\Doc");
    shell.tab_complete();
    assert_eq!(shell.input(), "cd C:\\home\\guest\\Documents\\");

    let line = shell.input().to_string();
    shell.execute_command(&line).await;
    assert_eq!(shell.current_directory(), "/home/guest/Documents");
    assert_eq!(shell.prompt(), "C:\\home\\guest\\Documents>");
}
