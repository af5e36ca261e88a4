//! OS profiles select which command set and message style the shell uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command-set flavour of the shell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsProfile {
    #[default]
    Linux,
    Windows,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown OS profile: {0}")]
pub struct UnknownProfile(pub String);

impl OsProfile {
    pub const ALL: [OsProfile; 2] = [OsProfile::Linux, OsProfile::Windows];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Error line for an unknown command name.
    pub fn not_found_message(&self, command: &str) -> String {
        match self {
            Self::Linux => format!("bash: {}: command not found", command),
            Self::Windows => format!(
                "'{}' is not recognized as an internal or external command,\noperable program or batch file.",
                command
            ),
        }
    }

    pub fn shell_path(&self) -> &'static str {
        match self {
            Self::Linux => "/bin/bash",
            Self::Windows => "C:\\Windows\\System32\\cmd.exe",
        }
    }

    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Linux => "/usr/local/bin:/usr/bin:/bin",
            Self::Windows => "C:\\Windows\\system32;C:\\Windows",
        }
    }

    /// Separator appended to directory completions.
    pub fn path_separator(&self) -> char {
        match self {
            Self::Linux => '/',
            Self::Windows => '\\',
        }
    }
}

impl fmt::Display for OsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            _ => Err(UnknownProfile(s.to_string())),
        }
    }
}
