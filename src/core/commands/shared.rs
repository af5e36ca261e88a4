//! Commands available under every OS profile.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::network::{simulated_address, simulated_latency};
use super::{CommandContext, CommandDefinition, CommandResult, HandlerResult, complete_any_path};
use crate::config::network::{DEFAULT_PING_COUNT, MAX_PING_COUNT, PING_INTERVAL_MS};
use crate::core::env::expand_variables;
use crate::core::parser::ParsedCommandLine;
use crate::models::{OsProfile, OutputKind};
use crate::utils::clock::{now_ms, sleep};
use crate::utils::format::{format_dos_date, format_unix_date};

pub(super) fn commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("clear", "Clear the terminal screen", "clear", clear)
            .aliases(&["cls"]),
        CommandDefinition::new("exit", "Leave the shell", "exit", exit)
            .aliases(&["logout", "quit"]),
        CommandDefinition::new("help", "List commands or show usage", "help [command]", help)
            .aliases(&["?"])
            .complete_with(complete_command_name),
        CommandDefinition::new("echo", "Print arguments", "echo [text...]", echo),
        CommandDefinition::new("date", "Print the current date and time", "date", date),
        CommandDefinition::new("whoami", "Print the current user", "whoami", whoami),
        CommandDefinition::new_async(
            "ping",
            "Send simulated echo requests to a host",
            "ping [-c count | -n count] host",
            ping,
        ),
        CommandDefinition::new("history", "List previously entered commands", "history [n]", history),
        CommandDefinition::new("vim", "Edit a file", "vim [file]", vim)
            .aliases(&["vi", "nvim"])
            .complete_with(complete_any_path),
    ]
}

fn clear(_cmd: &ParsedCommandLine, _ctx: &CommandContext<'_>) -> HandlerResult {
    Ok(CommandResult::clear_screen())
}

fn exit(_cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let farewell = match ctx.os {
        OsProfile::Linux => "logout",
        OsProfile::Windows => "",
    };
    Ok(CommandResult::exit(farewell))
}

fn help(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    if let Some(topic) = cmd.args.first() {
        let Some(def) = ctx.registry.get(topic) else {
            return Ok(CommandResult::failure(format!(
                "help: no help topics match '{}'",
                topic
            )));
        };

        let mut lines = vec![
            format!("{} - {}", def.name, def.description),
            format!("Usage: {}", def.usage),
        ];
        if !def.aliases.is_empty() {
            lines.push(format!("Aliases: {}", def.aliases.join(", ")));
        }
        return Ok(CommandResult::output(lines.join("\n")));
    }

    let mut lines = vec!["Available commands:".to_string()];
    lines.extend(
        ctx.registry
            .definitions()
            .map(|def| format!("  {:<10} {}", def.name, def.description)),
    );
    lines.push(String::new());
    lines.push("Type 'help <command>' for details.".to_string());
    Ok(CommandResult::with_kind(OutputKind::Info, lines.join("\n")))
}

fn complete_command_name(partial: &str, args: &[String], ctx: &CommandContext<'_>) -> Vec<String> {
    if args.is_empty() {
        ctx.registry.suggestions(partial)
    } else {
        Vec::new()
    }
}

fn echo(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let text = cmd.words.join(" ");
    let expanded = expand_variables(&text, ctx.env, ctx.os)?;
    Ok(CommandResult::output(expanded))
}

fn date(_cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let now = now_ms();
    let output = match ctx.os {
        OsProfile::Linux => format_unix_date(now),
        OsProfile::Windows => format!("The current date is: {}", format_dos_date(now)),
    };
    Ok(CommandResult::output(output))
}

fn whoami(_cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let output = match ctx.os {
        OsProfile::Linux => ctx.user.to_string(),
        OsProfile::Windows => format!("{}\\{}", ctx.host, ctx.user).to_lowercase(),
    };
    Ok(CommandResult::output(output))
}

fn history(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let skip = match cmd.args.first() {
        Some(n) => match n.parse::<usize>() {
            Ok(n) => ctx.history.len().saturating_sub(n),
            Err(_) => {
                return Ok(CommandResult::failure(format!(
                    "history: {}: numeric argument required",
                    n
                )));
            }
        },
        None => 0,
    };

    let lines: Vec<String> = ctx
        .history
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, entry)| format!("{:>5}  {}", i + 1, entry))
        .collect();
    Ok(CommandResult::output(lines.join("\n")))
}

fn vim(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let directory = ctx.current_directory.to_string();
    let Some(target) = cmd.operands(&[]).into_iter().next() else {
        return Ok(CommandResult::open_editor(None, directory));
    };

    let path = ctx.resolve(&target);
    if ctx.is_directory(&path) {
        return Ok(CommandResult::failure(format!(
            "vim: \"{}\" is a directory",
            target
        )));
    }
    Ok(CommandResult::open_editor(Some(path), directory))
}

// =============================================================================
// ping
// =============================================================================

fn ping<'a>(
    cmd: &'a ParsedCommandLine,
    ctx: &'a CommandContext<'a>,
) -> LocalBoxFuture<'a, HandlerResult> {
    async move { Ok(run_ping(cmd, ctx.os).await) }.boxed_local()
}

async fn run_ping(cmd: &ParsedCommandLine, os: OsProfile) -> CommandResult {
    let count_flag = match os {
        OsProfile::Linux => "c",
        OsProfile::Windows => "n",
    };

    let count = match cmd.flag_value(count_flag) {
        None => DEFAULT_PING_COUNT,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n > 0 => n.min(MAX_PING_COUNT),
            _ => {
                return CommandResult::failure(match os {
                    OsProfile::Linux => format!("ping: invalid argument: '{}'", raw),
                    OsProfile::Windows => format!(
                        "Bad value for option -n, valid range is from 1 to {}.",
                        MAX_PING_COUNT
                    ),
                });
            }
        },
    };

    let Some(host) = cmd.operands(&[count_flag]).into_iter().next() else {
        return CommandResult::failure(match os {
            OsProfile::Linux => "ping: usage error: Destination address required".to_string(),
            OsProfile::Windows => "Usage: ping [-n count] target_name".to_string(),
        });
    };

    let address = simulated_address(&host);
    let mut times = Vec::with_capacity(count as usize);
    let mut lines = vec![match os {
        OsProfile::Linux => format!("PING {} ({}) 56(84) bytes of data.", host, address),
        OsProfile::Windows => format!("Pinging {} [{}] with 32 bytes of data:", host, address),
    }];

    for seq in 1..=count {
        sleep(PING_INTERVAL_MS).await;
        let time = simulated_latency(&host, seq);
        times.push(time);
        lines.push(match os {
            OsProfile::Linux => format!(
                "64 bytes from {} ({}): icmp_seq={} ttl=117 time={:.1} ms",
                host, address, seq, time
            ),
            OsProfile::Windows => format!(
                "Reply from {}: bytes=32 time={}ms TTL=117",
                address,
                time.round() as u64
            ),
        });
    }

    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max = times.iter().copied().fold(0.0, f64::max);
    let avg = times.iter().sum::<f64>() / times.len() as f64;

    lines.push(String::new());
    match os {
        OsProfile::Linux => {
            let mdev = (times.iter().map(|t| (t - avg).powi(2)).sum::<f64>() / times.len() as f64)
                .sqrt();
            lines.push(format!("--- {} ping statistics ---", host));
            lines.push(format!(
                "{} packets transmitted, {} received, 0% packet loss, time {}ms",
                count,
                count,
                (count - 1) * PING_INTERVAL_MS
            ));
            lines.push(format!(
                "rtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
                min, avg, max, mdev
            ));
        }
        OsProfile::Windows => {
            lines.push(format!("Ping statistics for {}:", address));
            lines.push(format!(
                "    Packets: Sent = {}, Received = {}, Lost = 0 (0% loss),",
                count, count
            ));
            lines.push("Approximate round trip times in milli-seconds:".to_string());
            lines.push(format!(
                "    Minimum = {}ms, Maximum = {}ms, Average = {}ms",
                min.round() as u64,
                max.round() as u64,
                avg.round() as u64
            ));
        }
    }

    CommandResult::output(lines.join("\n"))
}
