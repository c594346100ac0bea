//! The solver's output: one chosen implementation per interface.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::architecture::Architecture;
use crate::feed::{Command, Dependency, Implementation, Restriction, Stability};
use crate::version::ImplementationVersion;

/// Snapshot of a chosen implementation.
///
/// Dependencies and restrictions are already filtered for the requested OS,
/// and `commands` holds only the commands that were actually asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImplementationSelection {
    pub interface: String,
    /// Set when the implementation came from a feed other than the interface's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_feed: Option<String>,
    pub id: String,
    pub version: ImplementationVersion,
    #[serde(default)]
    pub architecture: Architecture,
    pub stability: Stability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executable_commands: Vec<String>,
}

impl ImplementationSelection {
    /// Copy the identifying fields and executable commands of
    /// `implementation`. Dependencies, restrictions and commands are filled
    /// in by the solver.
    pub fn new(
        interface: impl Into<String>,
        feed: &str,
        implementation: &Implementation,
        stability: Stability,
    ) -> Self {
        let interface = interface.into();
        let from_feed = (feed != interface).then(|| feed.to_string());
        Self {
            interface,
            from_feed,
            id: implementation.id.clone(),
            version: implementation.version.clone(),
            architecture: implementation.architecture,
            stability,
            digest: implementation.digest.clone(),
            local_path: implementation.local_path.clone(),
            dependencies: Vec::new(),
            restrictions: Vec::new(),
            commands: Vec::new(),
            executable_commands: implementation.executable_commands.clone(),
        }
    }

    pub fn get_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// An empty name asks for no command and is always present.
    pub fn has_command(&self, name: &str) -> bool {
        name.is_empty() || self.get_command(name).is_some()
    }

    /// Every interface this selection points at, through dependencies or runners.
    pub fn referenced_interfaces(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.dependencies.iter().map(|d| d.interface.as_str()).collect();
        for command in &self.commands {
            out.extend(command.dependencies.iter().map(|d| d.interface.as_str()));
            if let Some(runner) = &command.runner {
                out.push(runner.interface.as_str());
            }
        }
        out
    }
}

/// A complete, ordered set of selections rooted at one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Selections {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub implementations: Vec<ImplementationSelection>,
}

impl Selections {
    pub fn new(interface: impl Into<String>, command: Option<String>) -> Self {
        Self {
            interface: interface.into(),
            command,
            implementations: Vec::new(),
        }
    }

    pub fn get(&self, interface: &str) -> Option<&ImplementationSelection> {
        self.implementations.iter().find(|s| s.interface == interface)
    }

    pub fn contains(&self, interface: &str) -> bool {
        self.get(interface).is_some()
    }

    /// The selection for the root interface.
    pub fn main(&self) -> Option<&ImplementationSelection> {
        self.get(&self.interface)
    }

    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}

impl fmt::Display for Selections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sel in &self.implementations {
            writeln!(f, "{}: {} ({})", sel.interface, sel.version, sel.id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Runner;

    fn imp(id: &str, version: &str) -> Implementation {
        Implementation::new(id, ImplementationVersion::parse(version).unwrap())
    }

    #[test]
    fn from_feed_only_for_foreign_feeds() {
        let own = ImplementationSelection::new("app", "app", &imp("a", "1"), Stability::Stable);
        assert_eq!(own.from_feed, None);
        let foreign =
            ImplementationSelection::new("app", "app-extra", &imp("a", "1"), Stability::Stable);
        assert_eq!(foreign.from_feed.as_deref(), Some("app-extra"));
    }

    #[test]
    fn referenced_interfaces_include_runners() {
        let mut sel = ImplementationSelection::new("app", "app", &imp("a", "1"), Stability::Stable);
        sel.dependencies.push(Dependency::new("lib"));
        sel.commands.push(
            Command::new("run")
                .with_runner(Runner::new("java"))
                .with_dependency(Dependency::new("log")),
        );
        assert_eq!(sel.referenced_interfaces(), vec!["lib", "log", "java"]);
        assert!(sel.has_command("run"));
        assert!(sel.has_command(""));
        assert!(!sel.has_command("test"));
    }

    #[test]
    fn lookup_and_json() {
        let mut selections = Selections::new("app", Some("run".into()));
        selections
            .implementations
            .push(ImplementationSelection::new("app", "app", &imp("a", "1.0"), Stability::Stable));
        selections
            .implementations
            .push(ImplementationSelection::new("lib", "lib", &imp("b", "2.0"), Stability::Testing));

        assert_eq!(selections.main().unwrap().id, "a");
        assert!(selections.contains("lib"));
        assert!(!selections.contains("other"));
        assert_eq!(selections.to_string(), "app: 1.0 (a)\nlib: 2.0 (b)\n");

        let json = serde_json::to_string(&selections).unwrap();
        let back: Selections = serde_json::from_str(&json).unwrap();
        assert_eq!(back, selections);
    }
}
