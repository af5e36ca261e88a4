//! Shell configuration.
//!
//! Compile-time defaults live here as constants; [`SessionConfig`] carries the
//! values a host page may override at startup.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::OsProfile;
use crate::utils::console;

// =============================================================================
// Identity
// =============================================================================

/// Default user name shown in prompts and `whoami`.
pub const DEFAULT_USER: &str = "guest";

/// Default host name shown in prompts.
pub const DEFAULT_HOST: &str = "portfolio";

/// Kernel release reported by `uname -r`.
pub const KERNEL_RELEASE: &str = "6.1.0-portfolio";

/// Machine architecture reported by `uname -m`.
pub const MACHINE_ARCH: &str = "wasm32";

// =============================================================================
// History
// =============================================================================

/// Key namespace for persisted command history (`<namespace>-<profile>`).
pub const HISTORY_NAMESPACE: &str = "terminal-history";

/// Maximum number of command history entries kept per profile.
pub const MAX_COMMAND_HISTORY: usize = 1000;

// =============================================================================
// Terminal
// =============================================================================

/// Maximum number of output lines kept in the scrollback.
pub const MAX_TERMINAL_OUTPUT: usize = 1000;

/// Maximum number of autocomplete suggestions shown at once.
pub const MAX_SUGGESTIONS: usize = 20;

// =============================================================================
// Editor
// =============================================================================

/// Editor configuration.
pub mod editor {
    /// Visible lines in the editor viewport.
    pub const DEFAULT_VIEWPORT_HEIGHT: usize = 20;
    /// Maximum number of undo steps kept per editor session.
    pub const MAX_UNDO_DEPTH: usize = 500;
    /// Spaces inserted for a Tab key press in insert mode.
    pub const TAB_WIDTH: usize = 4;
}

// =============================================================================
// Simulated network
// =============================================================================

/// Simulated network behaviour for `ping` and `curl`.
pub mod network {
    /// Delay before a simulated response arrives.
    pub const LATENCY_MS: u32 = 300;
    /// Delay between simulated ping replies.
    pub const PING_INTERVAL_MS: u32 = 250;
    /// Ping count when none is given.
    pub const DEFAULT_PING_COUNT: u32 = 4;
    /// Upper bound on a user supplied ping count.
    pub const MAX_PING_COUNT: u32 = 20;
}

// =============================================================================
// Runtime configuration
// =============================================================================

/// Settings supplied by the host page when a terminal is created.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub user: String,
    pub host: String,
    /// Home directory; `~` expands to it.
    pub home_directory: String,
    /// Working directory at startup.
    pub initial_directory: String,
    pub os: OsProfile,
    pub history_limit: usize,
    pub output_limit: usize,
    pub viewport_height: usize,
    /// Extra environment variables layered over the defaults.
    pub env: BTreeMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            host: DEFAULT_HOST.to_string(),
            home_directory: format!("/home/{}", DEFAULT_USER),
            initial_directory: format!("/home/{}", DEFAULT_USER),
            os: OsProfile::Linux,
            history_limit: MAX_COMMAND_HISTORY,
            output_limit: MAX_TERMINAL_OUTPUT,
            viewport_height: editor::DEFAULT_VIEWPORT_HEIGHT,
            env: BTreeMap::new(),
        }
    }
}

impl SessionConfig {
    /// Parse a JSON config, falling back to defaults if it is malformed.
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|err| {
            console::warn(&format!("invalid session config, using defaults: {}", err));
            Self::default()
        })
    }

    /// Environment variables for a profile: defaults, then user overrides.
    pub fn environment(&self, os: OsProfile) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("USER".to_string(), self.user.clone());
        env.insert("HOSTNAME".to_string(), self.host.clone());
        env.insert("HOME".to_string(), self.home_directory.clone());
        env.insert("SHELL".to_string(), os.shell_path().to_string());
        env.insert("TERM".to_string(), "xterm-256color".to_string());
        env.insert("PATH".to_string(), os.default_path().to_string());
        env.extend(self.env.clone());
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.user, "guest");
        assert_eq!(config.home_directory, "/home/guest");
        assert_eq!(config.history_limit, 1000);
        assert_eq!(config.os, OsProfile::Linux);
    }

    #[test]
    fn test_from_json_partial() {
        let config = SessionConfig::from_json(r#"{"user":"ada","os":"windows","historyLimit":5}"#);
        assert_eq!(config.user, "ada");
        assert_eq!(config.os, OsProfile::Windows);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_from_json_malformed_falls_back() {
        assert_eq!(SessionConfig::from_json("{oops"), SessionConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = SessionConfig::default();
        config.env.insert("EDITOR".into(), "vim".into());
        config.env.insert("USER".into(), "root".into());

        let env = config.environment(OsProfile::Windows);
        assert_eq!(env.get("EDITOR").map(String::as_str), Some("vim"));
        assert_eq!(env.get("USER").map(String::as_str), Some("root"));
        assert_eq!(
            env.get("SHELL").map(String::as_str),
            Some(OsProfile::Windows.shell_path())
        );
    }
}
