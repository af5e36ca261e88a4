//! Environment variables.
//!
//! The session owns the variable map; commands read it through their context
//! and request changes through `CommandResult::env_changes`.

use std::collections::BTreeMap;

use regex::{Captures, Regex};

use crate::core::error::CommandError;
use crate::models::OsProfile;

/// Check if a variable name is valid.
///
/// Valid names must:
/// - Not be empty
/// - Start with a letter or underscore
/// - Contain only alphanumeric characters and underscores
pub fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split `NAME=value` into its parts.
pub fn parse_assignment(arg: &str) -> Option<(&str, &str)> {
    let (name, value) = arg.split_once('=')?;
    is_valid_var_name(name).then_some((name, value))
}

/// Look up a variable, ignoring case on Windows.
pub fn lookup<'a>(env: &'a BTreeMap<String, String>, name: &str, os: OsProfile) -> Option<&'a str> {
    match os {
        OsProfile::Linux => env.get(name).map(String::as_str),
        OsProfile::Windows => env
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str()),
    }
}

/// Expand variable references in `text`.
///
/// - Linux: `$NAME` and `${NAME}`; unknown names expand to nothing
/// - Windows: `%NAME%`; unknown names are left as typed
pub fn expand_variables(
    text: &str,
    env: &BTreeMap<String, String>,
    os: OsProfile,
) -> Result<String, CommandError> {
    let expanded = match os {
        OsProfile::Linux => {
            let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")?;
            pattern
                .replace_all(text, |caps: &Captures| {
                    let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                    lookup(env, name, os).unwrap_or_default().to_string()
                })
                .into_owned()
        }
        OsProfile::Windows => {
            let pattern = Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%")?;
            pattern
                .replace_all(text, |caps: &Captures| {
                    lookup(env, &caps[1], os)
                        .map(str::to_string)
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned()
        }
    };

    Ok(expanded)
}

/// `NAME=value` lines, sorted by name.
pub fn format_environment(env: &BTreeMap<String, String>) -> String {
    env.iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}
