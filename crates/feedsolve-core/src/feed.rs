//! Feeds and the implementations they describe.
//!
//! A [`Feed`] lists concrete [`Implementation`]s of one interface and may
//! point to further feeds through [`FeedReference`]s. Implementations declare
//! [`Dependency`] edges, [`Restriction`]s on other interfaces, and named
//! [`Command`]s which may need a [`Runner`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::architecture::{Architecture, Os};
use crate::version::{ImplementationVersion, VersionRange};

/// Quality rating of an implementation. Smaller values are more stable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Preferred,
    Stable,
    #[default]
    Testing,
    Developer,
    Buggy,
    Insecure,
}

impl Stability {
    /// Buggy and insecure implementations are never selected, whatever the policy.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Buggy | Self::Insecure)
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Preferred => "preferred",
            Self::Stable => "stable",
            Self::Testing => "testing",
            Self::Developer => "developer",
            Self::Buggy => "buggy",
            Self::Insecure => "insecure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Essential,
    /// Dropped from the selections instead of failing when unsatisfiable.
    Recommended,
}

/// An edge from an implementation to another interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dependency {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionRange>,
    /// Only applies when the requested OS is compatible with this one.
    #[serde(default, skip_serializing_if = "is_all_os", with = "os_name")]
    pub os: Os,
    #[serde(default)]
    pub importance: Importance,
    /// Commands of the target that get bound into this implementation's environment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
}

impl Dependency {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            versions: None,
            os: Os::All,
            importance: Importance::Essential,
            commands: Vec::new(),
        }
    }

    pub fn with_versions(mut self, versions: VersionRange) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn with_os(mut self, os: Os) -> Self {
        self.os = os;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn recommended(mut self) -> Self {
        self.importance = Importance::Recommended;
        self
    }

    pub fn is_essential(&self) -> bool {
        self.importance == Importance::Essential
    }

    pub fn applies_to(&self, architecture: &Architecture) -> bool {
        self.os.runs_on(architecture.os)
    }
}

/// A version constraint on another interface, without pulling it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Restriction {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionRange>,
    #[serde(default, skip_serializing_if = "is_all_os", with = "os_name")]
    pub os: Os,
}

impl Restriction {
    pub fn new(interface: impl Into<String>, versions: VersionRange) -> Self {
        Self {
            interface: interface.into(),
            versions: Some(versions),
            os: Os::All,
        }
    }

    pub fn with_os(mut self, os: Os) -> Self {
        self.os = os;
        self
    }

    pub fn applies_to(&self, architecture: &Architecture) -> bool {
        self.os.runs_on(architecture.os)
    }

    pub fn allows(&self, version: &ImplementationVersion) -> bool {
        self.versions.as_ref().map_or(true, |range| range.matches(version))
    }
}

impl From<&Dependency> for Restriction {
    fn from(dep: &Dependency) -> Self {
        Self {
            interface: dep.interface.clone(),
            versions: dep.versions.clone(),
            os: dep.os,
        }
    }
}

/// The interpreter a command needs, e.g. a Java VM for a jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Runner {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionRange>,
}

impl Runner {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            command: None,
            versions: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_versions(mut self, versions: VersionRange) -> Self {
        self.versions = Some(versions);
        self
    }

    /// The runner's own command, `run` unless specified.
    pub fn command_name(&self) -> &str {
        self.command.as_deref().unwrap_or("run")
    }
}

/// A named entry point of an implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Command {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<Runner>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
    /// Own commands to expose as executables while this one runs. Not
    /// supported by any solver.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executable_commands: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            runner: None,
            dependencies: Vec::new(),
            restrictions: Vec::new(),
            executable_commands: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_runner(mut self, runner: Runner) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn with_dependency(mut self, dep: Dependency) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    pub fn with_executable_command(mut self, command: impl Into<String>) -> Self {
        self.executable_commands.push(command.into());
        self
    }
}

/// One concrete, content-addressed version of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Implementation {
    pub id: String,
    pub version: ImplementationVersion,
    #[serde(default)]
    pub architecture: Architecture,
    #[serde(default)]
    pub stability: Stability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Already unpacked at this path; counts as cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<Restriction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
    /// Own commands exposed as executables, which must be selectable
    /// together with this implementation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executable_commands: Vec<String>,
}

impl Implementation {
    pub fn new(id: impl Into<String>, version: ImplementationVersion) -> Self {
        Self {
            id: id.into(),
            version,
            architecture: Architecture::ALL,
            stability: Stability::Testing,
            digest: None,
            local_path: None,
            languages: Vec::new(),
            dependencies: Vec::new(),
            restrictions: Vec::new(),
            commands: Vec::new(),
            executable_commands: Vec::new(),
        }
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_stability(mut self, stability: Stability) -> Self {
        self.stability = stability;
        self
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn with_local_path(mut self, path: impl Into<String>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }

    pub fn with_dependency(mut self, dep: Dependency) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restrictions.push(restriction);
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn with_executable_command(mut self, command: impl Into<String>) -> Self {
        self.executable_commands.push(command.into());
        self
    }

    /// An empty name asks for no command and always succeeds.
    pub fn contains_command(&self, name: &str) -> bool {
        name.is_empty() || self.get_command(name).is_some()
    }

    pub fn get_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }
}

/// Points from one feed to another that provides more implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeedReference {
    pub source: String,
    #[serde(default)]
    pub architecture: Architecture,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
}

impl FeedReference {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            architecture: Architecture::ALL,
            languages: Vec::new(),
        }
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Feed {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Feeds needing a newer solver than this one are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_solver_version: Option<ImplementationVersion>,
    #[serde(default)]
    pub implementations: Vec<Implementation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feeds: Vec<FeedReference>,
}

impl Feed {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            min_solver_version: None,
            implementations: Vec::new(),
            feeds: Vec::new(),
        }
    }

    pub fn with_implementation(mut self, implementation: Implementation) -> Self {
        self.implementations.push(implementation);
        self
    }

    pub fn with_feed(mut self, reference: FeedReference) -> Self {
        self.feeds.push(reference);
        self
    }

    pub fn with_min_solver_version(mut self, version: ImplementationVersion) -> Self {
        self.min_solver_version = Some(version);
        self
    }

    pub fn get_implementation(&self, id: &str) -> Option<&Implementation> {
        self.implementations.iter().find(|i| i.id == id)
    }
}

/// `true` if the two language lists share an entry, or if either is empty.
///
/// With `ignore_country` only the part before `_` is compared, so `en_GB`
/// matches `en_US`.
pub fn languages_overlap(a: &[String], b: &[String], ignore_country: bool) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    let key = |lang: &str| -> String {
        if ignore_country {
            lang.split(['_', '-']).next().unwrap_or(lang).to_string()
        } else {
            lang.to_string()
        }
    };
    a.iter().any(|x| b.iter().any(|y| key(x) == key(y)))
}

fn is_all_os(os: &Os) -> bool {
    *os == Os::All
}

mod os_name {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::architecture::{Architecture, Os};

    pub fn serialize<S: Serializer>(os: &Os, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(os.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Os, D::Error> {
        let name = String::deserialize(deserializer)?;
        let arch = Architecture::parse(&format!("{name}-*")).map_err(serde::de::Error::custom)?;
        Ok(arch.os)
    }
}
