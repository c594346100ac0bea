//! What the caller asks the solver for.

use std::collections::BTreeMap;
use std::fmt;

use feedsolve_util::errors::{SolveError, SolveResult};
use serde::{Deserialize, Serialize};

use crate::architecture::{Architecture, Cpu};
use crate::feed::{Dependency, Runner};
use crate::version::{ImplementationVersion, VersionRange};

/// A request to select an implementation of `interface`, plus everything it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Requirements {
    pub interface: String,
    /// `None` picks a default during normalization; `Some("")` asks for no command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub architecture: Architecture,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    /// Version ranges per interface. Every range listed for an interface must match.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_restrictions: BTreeMap<String, Vec<VersionRange>>,
}

impl Requirements {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            command: None,
            architecture: Architecture::ALL,
            languages: Vec::new(),
            extra_restrictions: BTreeMap::new(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }

    /// Constrain the versions of the requested interface itself.
    pub fn with_versions(mut self, range: VersionRange) -> Self {
        let interface = self.interface.clone();
        self.add_restriction(interface, range);
        self
    }

    pub fn with_restriction(mut self, interface: impl Into<String>, range: VersionRange) -> Self {
        self.add_restriction(interface, range);
        self
    }

    pub fn add_restriction(&mut self, interface: impl Into<String>, range: VersionRange) {
        if range.is_unrestricted() {
            return;
        }
        let ranges = self.extra_restrictions.entry(interface.into()).or_default();
        if !ranges.contains(&range) {
            ranges.push(range);
        }
    }

    pub fn versions_for(&self, interface: &str) -> &[VersionRange] {
        self.extra_restrictions
            .get(interface)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `true` if `version` satisfies every range recorded for `interface`.
    pub fn allows_version(&self, interface: &str, version: &ImplementationVersion) -> bool {
        self.versions_for(interface).iter().all(|r| r.matches(version))
    }

    /// The requested command, with the empty string meaning "none".
    pub fn command_name(&self) -> &str {
        self.command.as_deref().unwrap_or_default()
    }

    /// Reject requirements that cannot be solved at all.
    pub fn validate(&self) -> SolveResult<()> {
        if self.interface.trim().is_empty() {
            return Err(SolveError::InvalidArgument {
                message: "requirements must name an interface".to_string(),
            });
        }
        Ok(())
    }

    /// Normalized variants to try in order, using the running host for wildcards.
    pub fn effective(&self) -> Vec<Self> {
        self.effective_for(&Architecture::current())
    }

    /// Fill in defaults for `host`.
    ///
    /// The command defaults to `compile` for source requests and `run` otherwise.
    /// Wildcard OS and CPU take the host's values. An x86_64 request gets an
    /// i686 fallback variant appended.
    pub fn effective_for(&self, host: &Architecture) -> Vec<Self> {
        let mut primary = self.clone();
        if primary.command.is_none() {
            let default = if self.architecture.cpu == Cpu::Source {
                "compile"
            } else {
                "run"
            };
            primary.command = Some(default.to_string());
        }
        primary.architecture = self.architecture.resolve_wildcards(host);

        if primary.architecture.cpu == Cpu::X86_64 {
            let mut x86 = primary.clone();
            x86.architecture.cpu = Cpu::I686;
            vec![primary, x86]
        } else {
            vec![primary]
        }
    }

    /// Sub-requirements for a dependency edge, one per command the edge binds.
    pub fn for_dependency(&self, dep: &Dependency) -> Vec<Self> {
        let commands: Vec<String> = if dep.commands.is_empty() {
            vec![String::new()]
        } else {
            dep.commands.clone()
        };
        commands
            .into_iter()
            .map(|command| self.derive(&dep.interface, command, dep.versions.as_ref()))
            .collect()
    }

    /// Sub-requirements for a command's runner.
    pub fn for_runner(&self, runner: &Runner) -> Self {
        self.derive(
            &runner.interface,
            runner.command_name().to_string(),
            runner.versions.as_ref(),
        )
    }

    /// Sub-requirements asking for another command of an interface that is
    /// already being solved.
    pub fn for_own_command(&self, interface: &str, command: &str) -> Self {
        self.derive(interface, command.to_string(), None)
    }

    fn derive(&self, interface: &str, command: String, versions: Option<&VersionRange>) -> Self {
        let mut sub = Self {
            interface: interface.to_string(),
            command: Some(command),
            architecture: self.architecture,
            languages: self.languages.clone(),
            extra_restrictions: self.extra_restrictions.clone(),
        };
        if let Some(range) = versions {
            sub.add_restriction(interface, range.clone());
        }
        sub
    }
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.command.as_deref() {
            Some(command) if !command.is_empty() => write!(f, "{} ({command})", self.interface),
            _ => f.write_str(&self.interface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Os;

    fn range(s: &str) -> VersionRange {
        VersionRange::parse(s).unwrap()
    }

    fn linux64() -> Architecture {
        Architecture::new(Os::Linux, Cpu::X86_64)
    }

    #[test]
    fn empty_interface_is_invalid() {
        let err = Requirements::new("").validate().unwrap_err();
        assert!(matches!(err, SolveError::InvalidArgument { .. }));
        assert!(!err.is_solver_failure());
        assert!(Requirements::new("http://example.com/a").validate().is_ok());
    }

    #[test]
    fn default_command_depends_on_cpu() {
        let host = Architecture::new(Os::Linux, Cpu::Armv7l);
        let run = Requirements::new("a").effective_for(&host);
        assert_eq!(run[0].command.as_deref(), Some("run"));

        let compile = Requirements::new("a")
            .with_architecture(Architecture::new(Os::All, Cpu::Source))
            .effective_for(&host);
        assert_eq!(compile[0].command.as_deref(), Some("compile"));
        assert_eq!(compile[0].architecture, Architecture::new(Os::Linux, Cpu::Source));
    }

    #[test]
    fn explicit_empty_command_is_kept() {
        let effective = Requirements::new("a")
            .with_command("")
            .effective_for(&linux64());
        assert_eq!(effective[0].command.as_deref(), Some(""));
    }

    #[test]
    fn x86_64_gets_i686_variant() {
        let variants = Requirements::new("a").effective_for(&linux64());
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].architecture.cpu, Cpu::X86_64);
        assert_eq!(variants[1].architecture.cpu, Cpu::I686);
        assert_eq!(variants[1].architecture.os, Os::Linux);
    }

    #[test]
    fn restrictions_are_conjunctive() {
        let req = Requirements::new("a")
            .with_restriction("b", range("1.0.."))
            .with_restriction("b", range("..!2.0"));
        let v = |s: &str| ImplementationVersion::parse(s).unwrap();
        assert!(req.allows_version("b", &v("1.5")));
        assert!(!req.allows_version("b", &v("2.0")));
        assert!(!req.allows_version("b", &v("0.9")));
        assert!(req.allows_version("c", &v("0.1")));
    }

    #[test]
    fn dependency_sub_requirements() {
        let top = Requirements::new("app")
            .with_architecture(linux64())
            .with_restriction("lib", range("1.0.."));
        let dep = Dependency::new("lib").with_versions(range("..!2.0"));

        let subs = top.for_dependency(&dep);
        assert_eq!(subs.len(), 1);
        let sub = &subs[0];
        assert_eq!(sub.interface, "lib");
        assert_eq!(sub.command.as_deref(), Some(""));
        assert_eq!(sub.architecture, linux64());
        assert_eq!(sub.versions_for("lib").len(), 2);

        let dep = Dependency::new("tool").with_command("run").with_command("check");
        let subs = top.for_dependency(&dep);
        let commands: Vec<_> = subs.iter().map(|s| s.command_name()).collect();
        assert_eq!(commands, vec!["run", "check"]);
    }

    #[test]
    fn runner_sub_requirements() {
        let top = Requirements::new("app").with_architecture(linux64());
        let sub = top.for_runner(&Runner::new("java").with_versions(range("8..")));
        assert_eq!(sub.interface, "java");
        assert_eq!(sub.command_name(), "run");
        assert_eq!(sub.versions_for("java"), &[range("8..")]);
    }

    #[test]
    fn own_command_sub_requirements() {
        let top = Requirements::new("app")
            .with_architecture(linux64())
            .with_restriction("lib", range("1.0.."));
        let sub = top.for_own_command("app", "helper");
        assert_eq!(sub.interface, "app");
        assert_eq!(sub.command_name(), "helper");
        assert!(sub.versions_for("app").is_empty());
        assert_eq!(sub.versions_for("lib"), &[range("1.0..")]);
    }

    #[test]
    fn display_includes_command() {
        assert_eq!(Requirements::new("a").with_command("run").to_string(), "a (run)");
        assert_eq!(Requirements::new("a").with_command("").to_string(), "a");
    }
}
