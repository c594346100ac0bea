use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feed::{FeedReference, Stability};

/// Per-interface user settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfacePreferences {
    /// Overrides the configured stability policy for this interface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_policy: Option<Stability>,
    /// Feeds the user registered in addition to the interface's own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feeds: Vec<FeedReference>,
}

impl InterfacePreferences {
    pub fn with_stability_policy(mut self, policy: Stability) -> Self {
        self.stability_policy = Some(policy);
        self
    }

    pub fn with_feed(mut self, reference: FeedReference) -> Self {
        self.feeds.push(reference);
        self
    }
}

/// Per-feed user settings, keyed by implementation ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeedPreferences {
    #[serde(default)]
    pub implementations: BTreeMap<String, ImplementationPreferences>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImplementationPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_stability: Option<Stability>,
}

impl FeedPreferences {
    pub fn with_user_stability(mut self, id: impl Into<String>, stability: Stability) -> Self {
        self.implementations.entry(id.into()).or_default().user_stability = Some(stability);
        self
    }

    pub fn user_stability(&self, id: &str) -> Option<Stability> {
        self.implementations.get(id).and_then(|p| p.user_stability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_stability_lookup() {
        let prefs = FeedPreferences::default().with_user_stability("sha1=a", Stability::Preferred);
        assert_eq!(prefs.user_stability("sha1=a"), Some(Stability::Preferred));
        assert_eq!(prefs.user_stability("sha1=b"), None);
    }

    #[test]
    fn interface_preferences_from_toml() {
        let prefs: InterfacePreferences = toml::from_str(
            r#"
stability-policy = "developer"

[[feeds]]
source = "http://example.com/extra.xml"
architecture = "Linux-*"
"#,
        )
        .unwrap();
        assert_eq!(prefs.stability_policy, Some(Stability::Developer));
        assert_eq!(prefs.feeds.len(), 1);
        assert_eq!(prefs.feeds[0].source, "http://example.com/extra.xml");
    }
}
