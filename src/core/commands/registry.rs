//! Profile-specific command lookup.

use std::collections::BTreeMap;

use super::{CommandDefinition, linux, network, shared, windows};
use crate::models::OsProfile;
use crate::utils::console;

/// Builds one group of commands.
type CommandSet = fn() -> Vec<CommandDefinition>;

/// Command groups per profile, registered in order.
const PROFILE_COMMANDS: &[(OsProfile, &[CommandSet])] = &[
    (
        OsProfile::Linux,
        &[shared::commands, linux::commands, network::commands],
    ),
    (OsProfile::Windows, &[shared::commands, windows::commands]),
];

/// Name and alias lookup for the active OS profile.
#[derive(Debug)]
pub struct CommandRegistry {
    os: OsProfile,
    commands: BTreeMap<String, CommandDefinition>,
    /// Alias -> canonical name.
    aliases: BTreeMap<String, String>,
}

impl CommandRegistry {
    pub fn new(os: OsProfile) -> Self {
        let mut registry = Self {
            os,
            commands: BTreeMap::new(),
            aliases: BTreeMap::new(),
        };
        registry.load(os);
        registry
    }

    pub fn os(&self) -> OsProfile {
        self.os
    }

    /// Drop every command and load the sets of another profile.
    pub fn switch_os(&mut self, os: OsProfile) {
        self.commands.clear();
        self.aliases.clear();
        self.os = os;
        self.load(os);
    }

    fn load(&mut self, os: OsProfile) {
        let sets = PROFILE_COMMANDS
            .iter()
            .filter(|(profile, _)| *profile == os)
            .flat_map(|(_, sets)| sets.iter());

        for build in sets {
            for definition in build() {
                self.register(definition);
            }
        }
    }

    /// Add a command. A later definition with the same name replaces the
    /// earlier one.
    pub fn register(&mut self, definition: CommandDefinition) {
        let name = definition.name.to_lowercase();
        if self.commands.contains_key(&name) {
            console::warn(&format!("command '{}' registered twice", name));
        }
        for alias in definition.aliases {
            self.aliases.insert(alias.to_lowercase(), name.clone());
        }
        self.commands.insert(name, definition);
    }

    /// Look up a command by name or alias, ignoring case.
    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        let name = name.to_lowercase();
        match self.aliases.get(&name) {
            Some(canonical) => self.commands.get(canonical),
            None => self.commands.get(&name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Command names and aliases starting with `partial`, sorted.
    pub fn suggestions(&self, partial: &str) -> Vec<String> {
        let partial = partial.to_lowercase();
        let mut names: Vec<String> = self
            .commands
            .keys()
            .chain(self.aliases.keys())
            .filter(|name| name.starts_with(&partial))
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Definitions sorted by name.
    pub fn definitions(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_commands() {
        let registry = CommandRegistry::new(OsProfile::Linux);
        for name in [
            "ls", "cd", "pwd", "mkdir", "rm", "cp", "mv", "cat", "grep", "find", "curl", "ps",
            "uptime", "uname", "clear", "exit", "help", "echo", "date", "whoami", "ping", "vim",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(!registry.contains("dir"));
        assert!(!registry.contains("attrib"));
    }

    #[test]
    fn test_windows_commands() {
        let registry = CommandRegistry::new(OsProfile::Windows);
        for name in [
            "dir", "cd", "md", "rd", "del", "copy", "move", "type", "attrib", "cls", "vim", "ping",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(!registry.contains("ls"));
        assert!(!registry.contains("curl"));
    }

    #[test]
    fn test_alias_resolution() {
        let registry = CommandRegistry::new(OsProfile::Linux);
        assert_eq!(registry.get("cls").map(|d| d.name), Some("clear"));
        assert_eq!(registry.get("vi").map(|d| d.name), Some("vim"));
        assert_eq!(registry.get("LS").map(|d| d.name), Some("ls"));
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_suggestions_include_aliases() {
        let registry = CommandRegistry::new(OsProfile::Linux);
        let suggestions = registry.suggestions("c");
        assert!(suggestions.contains(&"cat".to_string()));
        assert!(suggestions.contains(&"cls".to_string()));
        assert!(suggestions.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(registry.suggestions("PW"), vec!["pwd"]);
        assert!(registry.suggestions("zzz").is_empty());
    }

    #[test]
    fn test_switch_os_rebuilds() {
        let mut registry = CommandRegistry::new(OsProfile::Linux);
        registry.switch_os(OsProfile::Windows);
        assert_eq!(registry.os(), OsProfile::Windows);
        assert!(registry.contains("dir"));
        assert!(!registry.contains("ls"));
        assert!(!registry.contains("uname"));
    }
}
