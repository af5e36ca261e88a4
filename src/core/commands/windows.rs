//! DOS-style commands for the Windows profile.
//!
//! Paths may use `\` or `/` and an optional `C:` drive; output always shows
//! `C:\...`. Switches are `/x` words, which the flag parser leaves alone.

use std::collections::BTreeSet;

use super::{
    CommandContext, CommandDefinition, CommandResult, HandlerResult, complete_any_path,
    complete_directory, copy_item, create_dir_all, destination_for, glob_to_regex, transfer,
};
use crate::core::env::{format_environment, lookup, parse_assignment};
use crate::core::filesystem::{is_within, parent_path};
use crate::core::parser::ParsedCommandLine;
use crate::models::{FsItem, last_segment};
use crate::utils::format::{format_dos_timestamp, group_thousands};

const NOT_FOUND_FILE: &str = "The system cannot find the file specified.";
const NOT_FOUND_PATH: &str = "The system cannot find the path specified.";
const INVALID_DIRECTORY: &str = "The directory name is invalid.";
const ACCESS_DENIED: &str = "Access is denied.";
const IN_USE: &str = "The process cannot access the file because it is being used by another process.";
const SYNTAX_ERROR: &str = "The syntax of the command is incorrect.";

/// Free space reported by `dir`.
const BYTES_FREE: u64 = 1 << 30;

pub(super) fn commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("dir", "List directory contents", "dir [/b] [/a] [path]", dir)
            .complete_with(complete_any_path),
        CommandDefinition::new("cd", "Show or change the current directory", "cd [path]", cd)
            .aliases(&["chdir"])
            .complete_with(complete_directory),
        CommandDefinition::new("md", "Create a directory", "md path", md)
            .aliases(&["mkdir"])
            .complete_with(complete_directory),
        CommandDefinition::new("rd", "Remove a directory", "rd [/s] [/q] path", rd)
            .aliases(&["rmdir"])
            .complete_with(complete_directory),
        CommandDefinition::new("del", "Delete files", "del [/q] names", del)
            .aliases(&["erase"])
            .complete_with(complete_any_path),
        CommandDefinition::new("copy", "Copy files", "copy source destination", copy)
            .complete_with(complete_any_path),
        CommandDefinition::new("move", "Move files and directories", "move source destination", move_item)
            .complete_with(complete_any_path),
        CommandDefinition::new("type", "Display file contents", "type file...", type_file)
            .complete_with(complete_any_path),
        CommandDefinition::new("attrib", "Display file attributes", "attrib [path]", attrib)
            .complete_with(complete_any_path),
        CommandDefinition::new("set", "Display or set environment variables", "set [name[=value]]", set),
    ]
}

/// Split words into lowercased `/x` switches and operands.
fn split_switches(cmd: &ParsedCommandLine) -> (BTreeSet<String>, Vec<String>) {
    let mut switches = BTreeSet::new();
    let mut operands = Vec::new();
    for word in &cmd.words {
        let is_switch = word.len() == 2 && word.starts_with('/');
        if is_switch {
            switches.insert(word.to_lowercase());
        } else {
            operands.push(word.clone());
        }
    }
    (switches, operands)
}

fn sorted_children(dir: &FsItem, include_hidden: bool) -> Vec<&FsItem> {
    let mut children: Vec<&FsItem> = dir
        .children
        .iter()
        .filter(|child| include_hidden || !child.is_hidden())
        .collect();
    children.sort_by_key(|child| child.name.to_lowercase());
    children
}

// =============================================================================
// dir / cd
// =============================================================================

fn dir(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (switches, operands) = split_switches(cmd);
    let bare = switches.contains("/b");
    let include_hidden = switches.contains("/a");

    let target = operands.first().map(String::as_str).unwrap_or(".");
    let path = ctx.resolve(target);
    let Some(item) = ctx.find(&path) else {
        return Ok(CommandResult::failure("File Not Found"));
    };

    let (listed_dir, entries): (&FsItem, Vec<(String, &FsItem)>) = if item.is_dir() {
        let mut entries = Vec::new();
        if !bare {
            entries.push((".".to_string(), item));
            if let Some(parent) = ctx.find(&parent_path(&item.path)).filter(|_| item.path != "/") {
                entries.push(("..".to_string(), parent));
            }
        }
        entries.extend(
            sorted_children(item, include_hidden)
                .into_iter()
                .map(|child| (child.name.clone(), child)),
        );
        (item, entries)
    } else {
        let parent = ctx.find(&parent_path(&item.path)).unwrap_or(item);
        (parent, vec![(item.name.clone(), item)])
    };

    if bare {
        let names: Vec<String> = entries.into_iter().map(|(name, _)| name).collect();
        return Ok(CommandResult::output(names.join("\n")));
    }

    let mut lines = vec![
        " Volume in drive C has no label.".to_string(),
        " Volume Serial Number is 1A2B-3C4D".to_string(),
        String::new(),
        format!(" Directory of {}", ctx.display_path(&listed_dir.path)),
        String::new(),
    ];

    let (mut files, mut dirs, mut bytes) = (0usize, 0usize, 0u64);
    for (name, entry) in &entries {
        let stamp = format_dos_timestamp(entry.modified.unwrap_or(ctx.started_at));
        if entry.is_dir() {
            dirs += 1;
            lines.push(format!("{}    <DIR>          {}", stamp, name));
        } else {
            files += 1;
            bytes += entry.size();
            lines.push(format!(
                "{}    {:>14} {}",
                stamp,
                group_thousands(entry.size()),
                name
            ));
        }
    }

    lines.push(format!(
        "{:>16} File(s) {:>14} bytes",
        files,
        group_thousands(bytes)
    ));
    lines.push(format!(
        "{:>16} Dir(s) {:>15} bytes free",
        dirs,
        group_thousands(BYTES_FREE)
    ));

    Ok(CommandResult::output(lines.join("\n")))
}

fn cd(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (_, operands) = split_switches(cmd);
    let Some(target) = operands.first() else {
        return Ok(CommandResult::output(ctx.display_path(ctx.current_directory)));
    };

    let path = ctx.resolve(target);
    match ctx.find(&path) {
        Some(item) if item.is_dir() => Ok(CommandResult::change_directory(path)),
        Some(_) => Ok(CommandResult::failure(INVALID_DIRECTORY)),
        None => Ok(CommandResult::failure(NOT_FOUND_PATH)),
    }
}

// =============================================================================
// md / rd / del
// =============================================================================

fn md(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (_, operands) = split_switches(cmd);
    if operands.is_empty() {
        return Ok(CommandResult::failure(SYNTAX_ERROR));
    }

    let mutator = ctx.mutator()?;
    let mut created = BTreeSet::new();
    let mut errors = Vec::new();
    for operand in &operands {
        let path = ctx.resolve(operand);
        if ctx.find(&path).is_some() || created.contains(&path) {
            errors.push(format!(
                "A subdirectory or file {} already exists.",
                operand
            ));
        } else if create_dir_all(ctx, mutator, &path, &mut created).is_err() {
            errors.push(NOT_FOUND_PATH.to_string());
        }
    }

    Ok(CommandResult::partial(Vec::new(), errors))
}

fn rd(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (switches, operands) = split_switches(cmd);
    if operands.is_empty() {
        return Ok(CommandResult::failure(SYNTAX_ERROR));
    }
    let recursive = switches.contains("/s");

    let mutator = ctx.mutator()?;
    let mut errors = Vec::new();
    for operand in &operands {
        let path = ctx.resolve(operand);
        let error = match ctx.find(&path) {
            None => Some(NOT_FOUND_FILE),
            Some(item) if !item.is_dir() => Some(INVALID_DIRECTORY),
            Some(_) if is_within(&path, ctx.current_directory) => Some(IN_USE),
            Some(item) if !item.children.is_empty() && !recursive => {
                Some("The directory is not empty.")
            }
            Some(_) if !mutator.remove_item(&path) => Some(ACCESS_DENIED),
            Some(_) => None,
        };
        errors.extend(error.map(str::to_string));
    }

    Ok(CommandResult::partial(Vec::new(), errors))
}

fn del(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (_, operands) = split_switches(cmd);
    if operands.is_empty() {
        return Ok(CommandResult::failure(SYNTAX_ERROR));
    }

    let mutator = ctx.mutator()?;
    let mut errors = Vec::new();
    for operand in &operands {
        let path = ctx.resolve(operand);
        let name = last_segment(&path);

        let targets: Vec<&FsItem> = if name.contains(['*', '?']) {
            let pattern = glob_to_regex(&name.to_lowercase())?;
            ctx.find(&parent_path(&path))
                .map(|dir| {
                    dir.children
                        .iter()
                        .filter(|c| c.is_file() && pattern.is_match(&c.name.to_lowercase()))
                        .collect()
                })
                .unwrap_or_default()
        } else {
            match ctx.find(&path) {
                Some(item) if item.is_dir() => {
                    errors.push(ACCESS_DENIED.to_string());
                    continue;
                }
                Some(item) => vec![item],
                None => Vec::new(),
            }
        };

        if targets.is_empty() {
            errors.push(format!("Could Not Find {}", ctx.display_path(&path)));
        }
        for target in targets {
            if !mutator.remove_item(&target.path) {
                errors.push(format!("{} - {}", ctx.display_path(&target.path), ACCESS_DENIED));
            }
        }
    }

    Ok(CommandResult::partial(Vec::new(), errors))
}

// =============================================================================
// copy / move
// =============================================================================

fn copy(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (_, operands) = split_switches(cmd);
    let (source_operand, dest_operand) = match operands.as_slice() {
        [source] => (source, "."),
        [source, dest] => (source, dest.as_str()),
        _ => return Ok(CommandResult::failure(SYNTAX_ERROR)),
    };

    let Some(source) = ctx.find(&ctx.resolve(source_operand)) else {
        return Ok(CommandResult::failure(NOT_FOUND_FILE));
    };
    let dest = ctx.resolve(dest_operand);
    let mutator = ctx.mutator()?;

    // A directory source copies the files directly inside it
    let sources: Vec<&FsItem> = if source.is_dir() {
        source.children.iter().filter(|c| c.is_file()).collect()
    } else {
        vec![source]
    };
    if source.is_dir() && !ctx.is_directory(&dest) {
        return Ok(CommandResult::failure(NOT_FOUND_PATH));
    }

    let mut copied = 0;
    for file in sources {
        let Some(target) = destination_for(ctx, file, &dest) else {
            return Ok(CommandResult::failure(NOT_FOUND_PATH));
        };
        if target.path == file.path {
            return Ok(CommandResult::failure(
                "The file cannot be copied onto itself.",
            ));
        }
        if target.existing.as_ref().is_some_and(FsItem::is_dir) || !transfer(mutator, file, &target) {
            return Ok(CommandResult::failure(ACCESS_DENIED));
        }
        copied += 1;
    }

    Ok(CommandResult::output(format!("{:>9} file(s) copied.", copied)))
}

fn move_item(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (_, operands) = split_switches(cmd);
    let [source_operand, dest_operand] = operands.as_slice() else {
        return Ok(CommandResult::failure(SYNTAX_ERROR));
    };

    let Some(source) = ctx.find(&ctx.resolve(source_operand)) else {
        return Ok(CommandResult::failure(NOT_FOUND_FILE));
    };
    let dest = ctx.resolve(dest_operand);
    let Some(target) = destination_for(ctx, source, &dest) else {
        return Ok(CommandResult::failure(NOT_FOUND_PATH));
    };

    if target.path == source.path {
        return Ok(CommandResult::output(format!("{:>9} file(s) moved.", 1)));
    }
    if (source.is_dir() && is_within(&source.path, &target.path))
        || is_within(&source.path, ctx.current_directory)
    {
        return Ok(CommandResult::failure(IN_USE));
    }
    if target.existing.as_ref().is_some_and(FsItem::is_dir) {
        return Ok(CommandResult::failure(ACCESS_DENIED));
    }

    let mutator = ctx.mutator()?;
    let moved = match &target.existing {
        Some(_) => transfer(mutator, source, &target),
        None => copy_item(mutator, source, &target.parent, &target.name),
    };
    if !moved || !mutator.remove_item(&source.path) {
        return Ok(CommandResult::failure(ACCESS_DENIED));
    }

    let noun = if source.is_dir() { "dir(s)" } else { "file(s)" };
    Ok(CommandResult::output(format!("{:>9} {} moved.", 1, noun)))
}

// =============================================================================
// type / attrib / set
// =============================================================================

fn type_file(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (_, operands) = split_switches(cmd);
    if operands.is_empty() {
        return Ok(CommandResult::failure(SYNTAX_ERROR));
    }

    let mut output = Vec::new();
    let mut errors = Vec::new();
    for operand in &operands {
        match ctx.find(&ctx.resolve(operand)) {
            Some(item) if item.is_dir() => errors.push(ACCESS_DENIED.to_string()),
            Some(item) => {
                if operands.len() > 1 {
                    output.push(format!("\n{}\n", operand));
                }
                let content = item.content.as_deref().unwrap_or("");
                output.push(content.strip_suffix('\n').unwrap_or(content).to_string());
            }
            None => errors.push(NOT_FOUND_FILE.to_string()),
        }
    }

    Ok(CommandResult::partial(output, errors))
}

fn attrib(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let (_, operands) = split_switches(cmd);
    let target = operands.first().map(String::as_str).unwrap_or(".");
    let path = ctx.resolve(target);

    let files: Vec<&FsItem> = match ctx.find(&path) {
        Some(item) if item.is_dir() => sorted_children(item, true)
            .into_iter()
            .filter(|c| c.is_file())
            .collect(),
        Some(item) => vec![item],
        None => {
            return Ok(CommandResult::failure(format!(
                "File not found - {}",
                ctx.display_path(&path)
            )));
        }
    };

    let lines: Vec<String> = files
        .iter()
        .map(|file| {
            let flags = if file.is_hidden() { "A    H" } else { "A" };
            format!("{:<21}{}", flags, ctx.display_path(&file.path))
        })
        .collect();
    Ok(CommandResult::output(lines.join("\n")))
}

fn set(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let arg = cmd.words.join(" ");
    if arg.is_empty() {
        return Ok(CommandResult::output(format_environment(ctx.env)));
    }

    if arg.contains('=') {
        let Some((name, value)) = parse_assignment(&arg) else {
            return Ok(CommandResult::failure(SYNTAX_ERROR));
        };
        // Reuse the stored spelling of an existing variable
        let name = ctx
            .env
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string());
        let value = (!value.is_empty()).then(|| value.to_string());
        return Ok(CommandResult::set_env(name, value));
    }

    if let Some(value) = lookup(ctx.env, &arg, ctx.os) {
        if ctx.env.keys().filter(|k| k.eq_ignore_ascii_case(&arg)).count() == 1
            && !ctx.env.keys().any(|k| {
                k.len() > arg.len() && k.to_lowercase().starts_with(&arg.to_lowercase())
            })
        {
            return Ok(CommandResult::output(format!("{}={}", arg.to_uppercase(), value)));
        }
    }

    let prefix = arg.to_lowercase();
    let lines: Vec<String> = ctx
        .env
        .iter()
        .filter(|(key, _)| key.to_lowercase().starts_with(&prefix))
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    if lines.is_empty() {
        return Ok(CommandResult::failure(format!(
            "Environment variable {} not defined",
            arg
        )));
    }
    Ok(CommandResult::output(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::super::testing::Fixture;
    use super::*;
    use crate::core::filesystem::{self, read_file};
    use crate::core::store::FsMutator;

    #[tokio::test]
    async fn test_dir_listing() {
        let fx = Fixture::windows();
        let result = fx.run("dir").await;
        assert!(result.success);
        assert!(result.output.contains(" Directory of C:\\home\\guest"));
        assert!(result.output.contains("<DIR>          Documents"));
        assert!(result.output.contains("readme.txt"));
        assert!(result.output.contains("1 File(s)"));
        // ., .., Documents, Projects
        assert!(result.output.contains("4 Dir(s)"));
    }

    #[tokio::test]
    async fn test_dir_bare_and_missing() {
        let fx = Fixture::windows();
        let bare = fx.run("dir /b").await;
        assert_eq!(bare.output, "Documents\nProjects\nreadme.txt");

        let drive = fx.run("dir /B C:\\home").await;
        assert_eq!(drive.output, "guest");

        let missing = fx.run("dir nowhere").await;
        assert_eq!(missing.error.as_deref(), Some("File Not Found"));
    }

    #[tokio::test]
    async fn test_cd_prints_and_changes() {
        let fx = Fixture::windows();
        assert_eq!(fx.run("cd").await.output, "C:\\home\\guest");
        assert_eq!(
            fx.run("chdir Documents").await.new_directory.as_deref(),
            Some("/home/guest/Documents")
        );
        assert_eq!(fx.run("cd C:\\").await.new_directory.as_deref(), Some("/"));
        assert_eq!(fx.run("cd ..\\..").await.new_directory.as_deref(), Some("/"));
        assert_eq!(fx.run("cd nowhere").await.error.as_deref(), Some(NOT_FOUND_PATH));
        assert_eq!(fx.run("cd readme.txt").await.error.as_deref(), Some(INVALID_DIRECTORY));
    }

    #[tokio::test]
    async fn test_md_creates_intermediates() {
        let fx = Fixture::windows();
        assert!(fx.run("md a\\b\\c").await.success);
        assert!(filesystem::is_directory(&fx.tree(), "/home/guest/a/b/c"));

        let exists = fx.run("mkdir Documents").await;
        assert_eq!(
            exists.error.as_deref(),
            Some("A subdirectory or file Documents already exists.")
        );
    }

    #[tokio::test]
    async fn test_rd() {
        let fx = Fixture::windows();
        fx.store.create_file("/home/guest/Documents", "a.txt", "");

        let not_empty = fx.run("rd Documents").await;
        assert_eq!(not_empty.error.as_deref(), Some("The directory is not empty."));

        assert!(fx.run("rd /s /q Documents").await.success);
        assert!(!filesystem::exists(&fx.tree(), "/home/guest/Documents"));

        assert!(fx.run("rmdir Projects").await.success);
        assert_eq!(fx.run("rd readme.txt").await.error.as_deref(), Some(INVALID_DIRECTORY));
        assert_eq!(fx.run("rd ..").await.error.as_deref(), Some(IN_USE));
    }

    #[tokio::test]
    async fn test_del_with_wildcard() {
        let fx = Fixture::windows();
        fx.store.create_file("/home/guest", "a.log", "");
        fx.store.create_file("/home/guest", "b.LOG", "");

        assert!(fx.run("del *.log").await.success);
        let tree = fx.tree();
        assert!(!filesystem::exists(&tree, "/home/guest/a.log"));
        assert!(!filesystem::exists(&tree, "/home/guest/b.LOG"));
        assert!(filesystem::exists(&tree, "/home/guest/readme.txt"));

        let missing = fx.run("erase ghost.txt").await;
        assert_eq!(
            missing.error.as_deref(),
            Some("Could Not Find C:\\home\\guest\\ghost.txt")
        );
        assert_eq!(fx.run("del Documents").await.error.as_deref(), Some(ACCESS_DENIED));
    }

    #[tokio::test]
    async fn test_copy() {
        let fx = Fixture::windows();
        let result = fx.run("copy readme.txt Documents").await;
        assert_eq!(result.output, "        1 file(s) copied.");
        assert!(filesystem::is_file(&fx.tree(), "/home/guest/Documents/readme.txt"));

        assert!(fx.run("copy readme.txt C:\\home\\guest\\second.txt").await.success);
        assert_eq!(
            read_file(&fx.tree(), "/home/guest/second.txt"),
            read_file(&fx.tree(), "/home/guest/readme.txt")
        );

        assert_eq!(fx.run("copy ghost.txt x").await.error.as_deref(), Some(NOT_FOUND_FILE));
        assert!(!fx.run("copy readme.txt readme.txt").await.success);
    }

    #[tokio::test]
    async fn test_move() {
        let fx = Fixture::windows();
        let result = fx.run("move readme.txt Documents").await;
        assert_eq!(result.output, "        1 file(s) moved.");
        let tree = fx.tree();
        assert!(!filesystem::exists(&tree, "/home/guest/readme.txt"));
        assert!(filesystem::is_file(&tree, "/home/guest/Documents/readme.txt"));

        let dir = fx.run("move Documents Projects").await;
        assert_eq!(dir.output, "        1 dir(s) moved.");
        assert!(filesystem::is_file(
            &fx.tree(),
            "/home/guest/Projects/Documents/readme.txt"
        ));
    }

    #[tokio::test]
    async fn test_type() {
        let fx = Fixture::windows();
        let result = fx.run("type readme.txt").await;
        assert!(result.output.starts_with("Welcome!"));
        assert_eq!(fx.run("type Documents").await.error.as_deref(), Some(ACCESS_DENIED));
        assert_eq!(fx.run("type nope").await.error.as_deref(), Some(NOT_FOUND_FILE));
    }

    #[tokio::test]
    async fn test_attrib() {
        let fx = Fixture::windows();
        fx.store.create_file("/home/guest", ".hidden", "");
        let result = fx.run("attrib").await;
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("A    H"));
        assert!(lines[0].ends_with("C:\\home\\guest\\.hidden"));
        assert!(lines[1].ends_with("C:\\home\\guest\\readme.txt"));

        assert!(!fx.run("attrib ghost").await.success);
    }

    #[tokio::test]
    async fn test_set() {
        let fx = Fixture::windows();
        assert!(fx.run("set").await.output.contains("USER=guest"));
        assert_eq!(fx.run("set user").await.output, "USER=guest");

        let assign = fx.run("set greeting=hello world").await;
        assert_eq!(
            assign.env_changes,
            vec![("greeting".to_string(), Some("hello world".to_string()))]
        );

        let clear = fx.run("set user=").await;
        assert_eq!(clear.env_changes, vec![("USER".to_string(), None)]);

        assert!(!fx.run("set nothing").await.success);
    }
}
