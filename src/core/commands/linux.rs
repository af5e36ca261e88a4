//! POSIX-style commands for the Linux profile.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use super::{
    CommandContext, CommandDefinition, CommandResult, HandlerResult, complete_any_path,
    complete_directory, create_dir_all, destination_for, display_relative, glob_to_regex,
    transfer,
};
use crate::core::env::{format_environment, parse_assignment};
use crate::core::filesystem::{self, is_within, parent_path};
use crate::core::parser::ParsedCommandLine;
use crate::models::{FsItem, last_segment};
use crate::utils::format::format_listing_date;

pub(super) fn commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("ls", "List directory contents", "ls [-a] [-l] [path...]", ls)
            .complete_with(complete_any_path),
        CommandDefinition::new("cd", "Change the working directory", "cd [dir]", cd)
            .complete_with(complete_directory),
        CommandDefinition::new("pwd", "Print the working directory", "pwd", pwd),
        CommandDefinition::new("mkdir", "Create directories", "mkdir [-p] dir...", mkdir)
            .complete_with(complete_directory),
        CommandDefinition::new("rm", "Remove files or directories", "rm [-r] [-f] path...", rm)
            .complete_with(complete_any_path),
        CommandDefinition::new("cp", "Copy files and directories", "cp [-r] source... dest", cp)
            .complete_with(complete_any_path),
        CommandDefinition::new("mv", "Move or rename files", "mv source... dest", mv)
            .complete_with(complete_any_path),
        CommandDefinition::new("cat", "Print file contents", "cat file...", cat)
            .complete_with(complete_any_path),
        CommandDefinition::new(
            "grep",
            "Search files for a pattern",
            "grep [-i] [-n] [-v] [-r] pattern path...",
            grep,
        )
        .complete_with(complete_any_path),
        CommandDefinition::new(
            "find",
            "Search for files in a directory tree",
            "find [path] [-name glob] [-type f|d]",
            find,
        )
        .complete_with(complete_any_path),
        CommandDefinition::new("env", "Print the environment", "env", env),
        CommandDefinition::new("export", "Set an environment variable", "export [NAME=value]", export),
    ]
}

fn no_such_file(command: &str, operand: &str) -> String {
    format!("{}: {}: No such file or directory", command, operand)
}

// =============================================================================
// Navigation
// =============================================================================

fn ls(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let show_all = cmd.has_any_flag(&["a", "all"]);
    let long = cmd.has_flag("l");

    let mut operands = cmd.operands(&[]);
    if operands.is_empty() {
        operands.push(".".to_string());
    }

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    let mut errors = Vec::new();
    for operand in &operands {
        match ctx.find(&ctx.resolve(operand)) {
            Some(item) if item.is_dir() => dirs.push((operand, item)),
            Some(item) => files.push((operand.to_string(), item)),
            None => errors.push(format!(
                "ls: cannot access '{}': No such file or directory",
                operand
            )),
        }
    }

    let mut sections = Vec::new();
    if !files.is_empty() {
        sections.push(render_listing(&files, long, ctx));
    }

    let with_headers = operands.len() > 1;
    for (operand, dir) in dirs {
        let mut entries: Vec<(String, &FsItem)> = Vec::new();
        if show_all {
            entries.push((".".to_string(), dir));
            if let Some(parent) = ctx.find(&parent_path(&dir.path)) {
                entries.push(("..".to_string(), parent));
            }
        }
        let mut children: Vec<&FsItem> = dir
            .children
            .iter()
            .filter(|child| show_all || !child.is_hidden())
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        entries.extend(children.into_iter().map(|c| (c.name.clone(), c)));

        let listing = render_listing(&entries, long, ctx);
        sections.push(match (with_headers, listing.is_empty()) {
            (true, true) => format!("{}:", operand),
            (true, false) => format!("{}:\n{}", operand, listing),
            (false, _) => listing,
        });
    }

    let output: Vec<String> = sections.into_iter().filter(|s| !s.is_empty()).collect();
    Ok(CommandResult {
        success: errors.is_empty(),
        output: output.join("\n\n"),
        error: (!errors.is_empty()).then(|| errors.join("\n")),
        ..CommandResult::default()
    })
}

fn render_listing(entries: &[(String, &FsItem)], long: bool, ctx: &CommandContext<'_>) -> String {
    if !long {
        return entries
            .iter()
            .map(|(name, item)| {
                if item.is_dir() && name != "." && name != ".." {
                    format!("{}/", name)
                } else {
                    name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
    }

    let width = entries
        .iter()
        .map(|(_, item)| display_size(item).to_string().len())
        .max()
        .unwrap_or(1);

    entries
        .iter()
        .map(|(name, item)| {
            let mode = if item.is_dir() { "drwxr-xr-x" } else { "-rw-r--r--" };
            format!(
                "{} 1 {} {} {:>width$} {} {}",
                mode,
                ctx.user,
                ctx.user,
                display_size(item),
                format_listing_date(item.modified.unwrap_or(ctx.started_at)),
                name,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_size(item: &FsItem) -> u64 {
    if item.is_dir() { 4096 } else { item.size() }
}

fn cd(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let operands = cmd.operands(&[]);
    if operands.len() > 1 {
        return Ok(CommandResult::failure("cd: too many arguments"));
    }

    let Some(target) = operands.first() else {
        return Ok(CommandResult::change_directory(ctx.home_directory));
    };

    let path = ctx.resolve(target);
    match ctx.find(&path) {
        Some(item) if item.is_dir() => Ok(CommandResult::change_directory(path)),
        Some(_) => Ok(CommandResult::failure(format!("cd: {}: Not a directory", target))),
        None => Ok(CommandResult::failure(no_such_file("cd", target))),
    }
}

fn pwd(_cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    Ok(CommandResult::output(ctx.current_directory))
}

// =============================================================================
// Mutation
// =============================================================================

fn mkdir(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let operands = cmd.operands(&[]);
    if operands.is_empty() {
        return Ok(CommandResult::failure("mkdir: missing operand"));
    }

    let mutator = ctx.mutator()?;
    let parents = cmd.has_any_flag(&["p", "parents"]);
    let mut created = BTreeSet::new();
    let mut errors = Vec::new();

    for operand in &operands {
        let path = ctx.resolve(operand);
        let cannot = |reason: &str| {
            format!("mkdir: cannot create directory '{}': {}", operand, reason)
        };

        if parents {
            if create_dir_all(ctx, mutator, &path, &mut created).is_err() {
                errors.push(cannot("Not a directory"));
            }
            continue;
        }

        if ctx.find(&path).is_some() || created.contains(&path) {
            errors.push(cannot("File exists"));
            continue;
        }
        let parent = parent_path(&path);
        if !ctx.is_directory(&parent) && !created.contains(&parent) {
            errors.push(cannot("No such file or directory"));
            continue;
        }
        if mutator.create_folder(&parent, last_segment(&path)) {
            created.insert(path);
        } else {
            errors.push(cannot("Operation not permitted"));
        }
    }

    Ok(CommandResult::partial(Vec::new(), errors))
}

fn rm(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let force = cmd.has_any_flag(&["f", "force"]);
    let recursive = cmd.has_any_flag(&["r", "R", "recursive"]);
    let operands = cmd.operands(&[]);
    if operands.is_empty() {
        return Ok(if force {
            CommandResult::empty()
        } else {
            CommandResult::failure("rm: missing operand")
        });
    }

    let mutator = ctx.mutator()?;
    let mut errors = Vec::new();
    for operand in &operands {
        let path = ctx.resolve(operand);
        let Some(item) = ctx.find(&path) else {
            if !force {
                errors.push(format!(
                    "rm: cannot remove '{}': No such file or directory",
                    operand
                ));
            }
            continue;
        };

        if path == "/" {
            errors.push("rm: it is dangerous to operate recursively on '/'".to_string());
        } else if item.is_dir() && !recursive {
            errors.push(format!("rm: cannot remove '{}': Is a directory", operand));
        } else if !mutator.remove_item(&path) {
            errors.push(format!(
                "rm: cannot remove '{}': Operation not permitted",
                operand
            ));
        }
    }

    Ok(CommandResult::partial(Vec::new(), errors))
}

fn cp(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let recursive = cmd.has_any_flag(&["r", "R", "recursive"]);
    transfer_command(cmd, ctx, "cp", |source, operand| {
        (source.is_dir() && !recursive)
            .then(|| format!("cp: -r not specified; omitting directory '{}'", operand))
    })
}

fn mv(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    transfer_command(cmd, ctx, "mv", |_, _| None)
}

/// Shared body of `cp` and `mv`. `refuse` may veto a source up front.
fn transfer_command(
    cmd: &ParsedCommandLine,
    ctx: &CommandContext<'_>,
    name: &str,
    refuse: impl Fn(&FsItem, &str) -> Option<String>,
) -> HandlerResult {
    let moving = name == "mv";
    let mut operands = cmd.operands(&[]);
    let Some(dest_operand) = operands.pop() else {
        return Ok(CommandResult::failure(format!("{}: missing file operand", name)));
    };
    if operands.is_empty() {
        return Ok(CommandResult::failure(format!(
            "{}: missing destination file operand after '{}'",
            name, dest_operand
        )));
    }

    let dest = ctx.resolve(&dest_operand);
    if operands.len() > 1 && !ctx.is_directory(&dest) {
        return Ok(CommandResult::failure(format!(
            "{}: target '{}' is not a directory",
            name, dest_operand
        )));
    }

    let mutator = ctx.mutator()?;
    let mut errors = Vec::new();
    for operand in &operands {
        let Some(source) = ctx.find(&ctx.resolve(operand)) else {
            errors.push(format!(
                "{}: cannot stat '{}': No such file or directory",
                name, operand
            ));
            continue;
        };
        if let Some(reason) = refuse(source, operand) {
            errors.push(reason);
            continue;
        }

        let Some(target) = destination_for(ctx, source, &dest) else {
            errors.push(format!(
                "{}: cannot create regular file '{}': No such file or directory",
                name, dest_operand
            ));
            continue;
        };

        if target.path == source.path {
            errors.push(format!(
                "{}: '{}' and '{}' are the same file",
                name, operand, dest_operand
            ));
        } else if source.is_dir() && is_within(&source.path, &target.path) {
            errors.push(if moving {
                format!(
                    "mv: cannot move '{}' to a subdirectory of itself, '{}'",
                    operand, dest_operand
                )
            } else {
                format!(
                    "cp: cannot copy a directory, '{}', into itself, '{}'",
                    operand, dest_operand
                )
            });
        } else if target.existing.as_ref().is_some_and(FsItem::is_dir) {
            errors.push(format!(
                "{}: cannot overwrite directory '{}'",
                name, target.path
            ));
        } else if !transfer(mutator, source, &target)
            || (moving && !mutator.remove_item(&source.path))
        {
            errors.push(format!(
                "{}: cannot create '{}': Operation not permitted",
                name, dest_operand
            ));
        }
    }

    Ok(CommandResult::partial(Vec::new(), errors))
}

// =============================================================================
// Reading
// =============================================================================

fn cat(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let operands = cmd.operands(&[]);
    if operands.is_empty() {
        return Ok(CommandResult::failure(
            "cat: reading standard input is not supported",
        ));
    }

    let mut output = Vec::new();
    let mut errors = Vec::new();
    for operand in &operands {
        match ctx.find(&ctx.resolve(operand)) {
            Some(item) if item.is_dir() => errors.push(format!("cat: {}: Is a directory", operand)),
            Some(item) => {
                let content = item.content.as_deref().unwrap_or("");
                output.push(content.strip_suffix('\n').unwrap_or(content).to_string());
            }
            None => errors.push(no_such_file("cat", operand)),
        }
    }

    Ok(CommandResult::partial(output, errors))
}

fn grep(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let mut operands = cmd.operands(&[]).into_iter();
    let Some(pattern) = operands.next() else {
        return Ok(CommandResult::failure("Usage: grep [OPTION]... PATTERNS [FILE]..."));
    };
    let paths: Vec<String> = operands.collect();
    if paths.is_empty() {
        return Ok(CommandResult::failure(
            "grep: no input files (standard input is not supported)",
        ));
    }

    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(cmd.has_any_flag(&["i", "ignore-case"]))
        .build()?;
    let invert = cmd.has_any_flag(&["v", "invert-match"]);
    let line_numbers = cmd.has_any_flag(&["n", "line-number"]);
    let recursive = cmd.has_any_flag(&["r", "R", "recursive"]);
    let show_names = paths.len() > 1 || recursive;

    let mut matches = Vec::new();
    let mut errors = Vec::new();
    for operand in &paths {
        let path = ctx.resolve(operand);
        let Some(item) = ctx.find(&path) else {
            errors.push(no_such_file("grep", operand));
            continue;
        };

        let mut files: Vec<(String, &FsItem)> = Vec::new();
        if item.is_file() {
            files.push((operand.clone(), item));
        } else if recursive {
            let base = if item.path == "/" { "" } else { item.path.as_str() };
            filesystem::walk(item, &mut |node| {
                if node.is_file() {
                    files.push((display_relative(operand, base, &node.path), node));
                }
            });
        } else {
            errors.push(format!("grep: {}: Is a directory", operand));
            continue;
        }

        for (display, file) in files {
            let content = file.content.as_deref().unwrap_or("");
            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) == invert {
                    continue;
                }
                let mut out = String::new();
                if show_names {
                    out.push_str(&display);
                    out.push(':');
                }
                if line_numbers {
                    out.push_str(&format!("{}:", idx + 1));
                }
                out.push_str(line);
                matches.push(out);
            }
        }
    }

    let found = !matches.is_empty();
    let mut result = CommandResult::partial(matches, errors);
    result.success = result.success && found;
    Ok(result)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFilter {
    File,
    Directory,
}

fn find(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    // `-name` and `-type` are single-dash words, so walk the raw words
    // instead of the flag map.
    let mut starts = Vec::new();
    let mut name_filter: Option<Regex> = None;
    let mut type_filter = None;

    let mut words = cmd.words.iter();
    while let Some(word) = words.next() {
        match word.as_str() {
            "-name" | "-iname" => {
                let Some(glob) = words.next() else {
                    return Ok(CommandResult::failure(format!(
                        "find: missing argument to '{}'",
                        word
                    )));
                };
                let regex = glob_to_regex(glob)?;
                name_filter = Some(if word == "-iname" {
                    RegexBuilder::new(regex.as_str())
                        .case_insensitive(true)
                        .build()?
                } else {
                    regex
                });
            }
            "-type" => match words.next().map(String::as_str) {
                Some("f") => type_filter = Some(TypeFilter::File),
                Some("d") => type_filter = Some(TypeFilter::Directory),
                Some(other) => {
                    return Ok(CommandResult::failure(format!(
                        "find: Unknown argument to -type: {}",
                        other
                    )));
                }
                None => {
                    return Ok(CommandResult::failure("find: missing argument to '-type'"));
                }
            },
            w if w.starts_with('-') && w.len() > 1 => {
                return Ok(CommandResult::failure(format!(
                    "find: unknown predicate '{}'",
                    w
                )));
            }
            _ => starts.push(word.clone()),
        }
    }
    if starts.is_empty() {
        starts.push(".".to_string());
    }

    let mut found = Vec::new();
    let mut errors = Vec::new();
    for operand in &starts {
        let path = ctx.resolve(operand);
        let Some(root) = ctx.find(&path) else {
            errors.push(format!("find: '{}': No such file or directory", operand));
            continue;
        };

        let base = if root.path == "/" { "" } else { root.path.as_str() };
        let mut hits: Vec<&FsItem> = Vec::new();
        filesystem::walk(root, &mut |node| {
            let type_ok = match type_filter {
                Some(TypeFilter::File) => node.is_file(),
                Some(TypeFilter::Directory) => node.is_dir(),
                None => true,
            };
            let name = if node.path == root.path {
                last_segment(operand)
            } else {
                node.name.as_str()
            };
            let name_ok = name_filter.as_ref().is_none_or(|re| re.is_match(name));
            if type_ok && name_ok {
                hits.push(node);
            }
        });
        found.extend(
            hits.into_iter()
                .map(|node| display_relative(operand, base, &node.path)),
        );
    }

    Ok(CommandResult::partial(found, errors))
}

// =============================================================================
// Environment
// =============================================================================

fn env(_cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    Ok(CommandResult::output(format_environment(ctx.env)))
}

fn export(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let Some(arg) = cmd.words.first() else {
        let lines: Vec<String> = ctx
            .env
            .iter()
            .map(|(key, value)| format!("declare -x {}=\"{}\"", key, value))
            .collect();
        return Ok(CommandResult::output(lines.join("\n")));
    };

    if !arg.contains('=') {
        return Ok(CommandResult::empty());
    }
    match parse_assignment(arg) {
        Some((name, value)) => Ok(CommandResult::set_env(name, Some(value.to_string()))),
        None => Ok(CommandResult::failure(format!(
            "export: `{}': not a valid identifier",
            arg
        ))),
    }
}
