//! Simulated network and process commands (Linux only).
//!
//! Nothing here touches a real network. Addresses and round-trip times are
//! derived from the host name so repeated runs print the same thing.

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::{CommandContext, CommandDefinition, CommandResult, HandlerResult};
use crate::config::network::LATENCY_MS;
use crate::config::{KERNEL_RELEASE, MACHINE_ARCH};
use crate::core::parser::ParsedCommandLine;
use crate::utils::clock::{now_ms, sleep};
use crate::utils::format::{format_clock, format_unix_date, format_uptime};

pub(super) fn commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new_async("curl", "Transfer a URL (simulated)", "curl [-I] url", curl),
        CommandDefinition::new("ps", "Report running processes", "ps [aux]", ps),
        CommandDefinition::new("uptime", "Show how long the session has run", "uptime", uptime),
        CommandDefinition::new("uname", "Print system information", "uname [-asnrm]", uname),
    ]
}

/// FNV-1a over the lowercased host name.
fn host_hash(host: &str) -> u32 {
    host.to_lowercase().bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

/// Stable fake IPv4 address for a host.
pub(super) fn simulated_address(host: &str) -> String {
    if host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1" {
        return "127.0.0.1".to_string();
    }
    let h = host_hash(host);
    format!(
        "{}.{}.{}.{}",
        1 + (h >> 24) % 223,
        (h >> 16) & 0xff,
        (h >> 8) & 0xff,
        1 + (h & 0xff) % 254
    )
}

/// Round-trip time in milliseconds for one simulated echo request.
pub(super) fn simulated_latency(host: &str, seq: u32) -> f64 {
    if simulated_address(host) == "127.0.0.1" {
        return 0.04;
    }
    let h = host_hash(host);
    let base = 8.0 + f64::from(h % 40);
    let jitter = f64::from(h.rotate_left(seq.wrapping_mul(7)) % 1000) / 250.0;
    ((base + jitter) * 10.0).round() / 10.0
}

// =============================================================================
// curl
// =============================================================================

fn curl<'a>(
    cmd: &'a ParsedCommandLine,
    _ctx: &'a CommandContext<'a>,
) -> LocalBoxFuture<'a, HandlerResult> {
    async move { Ok(run_curl(cmd).await) }.boxed_local()
}

async fn run_curl(cmd: &ParsedCommandLine) -> CommandResult {
    let Some(url) = cmd.operands(&[]).into_iter().next() else {
        return CommandResult::failure("curl: try 'curl --help' for more information");
    };

    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(&url);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();

    sleep(LATENCY_MS).await;

    if !is_resolvable(host) {
        return CommandResult::failure(format!("curl: (6) Could not resolve host: {}", host));
    }

    let body = format!(
        "<!doctype html>\n<html>\n<head><title>{host}</title></head>\n<body>\n<h1>{host}</h1>\n<p>This response was simulated; no request left the browser.</p>\n</body>\n</html>"
    );

    if cmd.has_any_flag(&["I", "head"]) {
        let headers = [
            "HTTP/1.1 200 OK".to_string(),
            "Content-Type: text/html; charset=UTF-8".to_string(),
            format!("Content-Length: {}", body.len()),
            format!("Date: {}", format_unix_date(now_ms())),
            "Server: portfolio-sim".to_string(),
        ];
        return CommandResult::output(headers.join("\n"));
    }

    CommandResult::output(body)
}

fn is_resolvable(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.contains('.')
        && !host.starts_with('.')
        && !host.ends_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

// =============================================================================
// ps / uptime / uname
// =============================================================================

fn ps(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let full = cmd.has_any_flag(&["e", "a", "u", "x"]) || cmd.args.iter().any(|a| a == "aux");

    let lines: Vec<String> = if full {
        let user = ctx.user;
        let rows = [
            ("root", 1, "0.1", "/sbin/init"),
            ("root", 87, "0.2", "/usr/sbin/sshd -D"),
            (user, 312, "0.4", "-bash"),
            (user, 415, "0.1", "ps aux"),
        ];
        std::iter::once(format!("{:<10} {:>5} {:>4} {:>4} COMMAND", "USER", "PID", "%CPU", "%MEM"))
            .chain(rows.iter().map(|(owner, pid, mem, command)| {
                format!("{:<10} {:>5} {:>4} {:>4} {}", owner, pid, "0.0", mem, command)
            }))
            .collect()
    } else {
        vec![
            format!("{:>7} {:<8} {:>8} CMD", "PID", "TTY", "TIME"),
            format!("{:>7} {:<8} {:>8} bash", 312, "pts/0", "00:00:00"),
            format!("{:>7} {:<8} {:>8} ps", 415, "pts/0", "00:00:00"),
        ]
    };

    Ok(CommandResult::output(lines.join("\n")))
}

fn uptime(_cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    let now = now_ms();
    let elapsed = now.saturating_sub(ctx.started_at);
    Ok(CommandResult::output(format!(
        " {} up {},  1 user,  load average: 0.00, 0.01, 0.05",
        format_clock(now),
        format_uptime(elapsed)
    )))
}

fn uname(cmd: &ParsedCommandLine, ctx: &CommandContext<'_>) -> HandlerResult {
    if cmd.has_any_flag(&["a", "all"]) {
        return Ok(CommandResult::output(format!(
            "Linux {} {} #1 SMP {} GNU/Linux",
            ctx.host, KERNEL_RELEASE, MACHINE_ARCH
        )));
    }

    let fields = [
        ("s", "Linux"),
        ("n", ctx.host),
        ("r", KERNEL_RELEASE),
        ("m", MACHINE_ARCH),
    ];
    let mut selected: Vec<&str> = fields
        .iter()
        .filter(|(flag, _)| cmd.has_flag(flag))
        .map(|(_, value)| *value)
        .collect();
    if selected.is_empty() {
        selected.push("Linux");
    }

    Ok(CommandResult::output(selected.join(" ")))
}
