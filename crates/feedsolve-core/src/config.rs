use std::path::Path;

use feedsolve_util::errors::{SolveError, SolveResult};
use serde::{Deserialize, Serialize};

use crate::feed::Stability;

/// How freely the solver may assume implementations can be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkLevel {
    /// Only cached implementations are suitable.
    Offline,
    /// Cached implementations are strongly preferred.
    Minimal,
    #[default]
    Full,
}

/// Solver settings, usually read from a `solver.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default, rename = "network-use")]
    pub network_use: NetworkLevel,
    /// Rank testing releases alongside stable ones.
    #[serde(default, rename = "help-with-testing")]
    pub help_with_testing: bool,
    /// Deepest dependency chain followed before a branch is abandoned.
    #[serde(default = "default_max_depth", rename = "max-depth")]
    pub max_depth: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            network_use: NetworkLevel::Full,
            help_with_testing: false,
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    256
}

impl SolverConfig {
    pub fn from_toml_str(content: &str) -> SolveResult<Self> {
        toml::from_str(content).map_err(|e| SolveError::Parse {
            message: format!("Failed to parse solver config: {e}"),
        })
    }

    /// Load from `path`, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> SolveResult<Self> {
        if path.is_file() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            tracing::debug!("no solver config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// The stability policy for interfaces without a user override.
    pub fn default_stability_policy(&self) -> Stability {
        if self.help_with_testing {
            Stability::Testing
        } else {
            Stability::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, SolverConfig::default());
        assert_eq!(config.network_use, NetworkLevel::Full);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.default_stability_policy(), Stability::Stable);
    }

    #[test]
    fn kebab_case_keys() {
        let config = SolverConfig::from_toml_str(
            r#"
network-use = "offline"
help-with-testing = true
max-depth = 12
"#,
        )
        .unwrap();
        assert_eq!(config.network_use, NetworkLevel::Offline);
        assert!(config.help_with_testing);
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.default_stability_policy(), Stability::Testing);
    }

    #[test]
    fn bad_value_is_parse_error() {
        let err = SolverConfig::from_toml_str("network-use = \"sometimes\"").unwrap_err();
        assert!(matches!(err, SolveError::Parse { .. }));
    }
}
