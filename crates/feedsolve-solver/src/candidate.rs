//! One implementation considered for one set of requirements.

use feedsolve_core::architecture::{Architecture, Cpu};
use feedsolve_core::feed::{
    languages_overlap, Command, Dependency, Implementation, Restriction, Stability,
};
use feedsolve_core::preferences::FeedPreferences;
use feedsolve_core::requirements::Requirements;
use feedsolve_core::selection::ImplementationSelection;
use feedsolve_core::version::ImplementationVersion;

/// An implementation paired with the feed it came from, the user's
/// stability override and the verdict on whether it may be selected.
#[derive(Debug, Clone)]
pub struct SelectionCandidate {
    pub feed_uri: String,
    pub implementation: Implementation,
    pub user_stability: Option<Stability>,
    pub is_cached: bool,
    /// Why the candidate is unsuitable, if it is.
    notes: Option<String>,
}

impl SelectionCandidate {
    /// Evaluate `implementation` against `requirements`.
    ///
    /// `offline` marks uncached candidates unsuitable.
    pub fn new(
        feed_uri: impl Into<String>,
        implementation: Implementation,
        feed_preferences: &FeedPreferences,
        requirements: &Requirements,
        is_cached: bool,
        offline: bool,
    ) -> Self {
        let user_stability = feed_preferences.user_stability(&implementation.id);
        let mut candidate = Self {
            feed_uri: feed_uri.into(),
            implementation,
            user_stability,
            is_cached,
            notes: None,
        };
        candidate.notes = candidate.check_suitability(requirements, offline);
        candidate
    }

    fn check_suitability(&self, requirements: &Requirements, offline: bool) -> Option<String> {
        let imp = &self.implementation;
        let stability = self.effective_stability();
        let command = requirements.command_name();

        if imp.architecture.cpu == Cpu::Source && requirements.architecture.cpu != Cpu::Source {
            Some("This is a source implementation; a binary was requested".to_string())
        } else if !imp.architecture.is_compatible(&requirements.architecture) {
            Some(format!(
                "Built for {}, not {}",
                imp.architecture, requirements.architecture
            ))
        } else if !languages_overlap(&imp.languages, &requirements.languages, false) {
            Some("Not available in any of the requested languages".to_string())
        } else if !requirements.allows_version(&requirements.interface, &imp.version) {
            Some("Version is outside the requested range".to_string())
        } else if stability.is_blocked() || imp.stability.is_blocked() {
            Some(format!("Marked as {}", stability.max(imp.stability)))
        } else if !imp.contains_command(command) {
            Some(format!("No command '{command}'"))
        } else if offline && !self.is_cached {
            Some("Not cached and network use is offline".to_string())
        } else {
            None
        }
    }

    /// The user's override if set, otherwise the feed's rating.
    pub fn effective_stability(&self) -> Stability {
        self.user_stability.unwrap_or(self.implementation.stability)
    }

    pub fn is_suitable(&self) -> bool {
        self.notes.is_none()
    }

    /// Empty for suitable candidates.
    pub fn notes(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        &self.implementation.id
    }

    pub fn version(&self) -> &ImplementationVersion {
        &self.implementation.version
    }

    /// Snapshot this candidate as the selection for `requirements`, keeping
    /// only what applies to the requested OS and command.
    pub fn to_selection(&self, requirements: &Requirements) -> ImplementationSelection {
        let arch = &requirements.architecture;
        let imp = &self.implementation;
        let mut selection = ImplementationSelection::new(
            requirements.interface.as_str(),
            &self.feed_uri,
            imp,
            self.effective_stability(),
        );
        selection.dependencies = imp
            .dependencies
            .iter()
            .filter(|d| d.applies_to(arch))
            .cloned()
            .collect();
        selection.restrictions = imp
            .restrictions
            .iter()
            .filter(|r| r.applies_to(arch))
            .cloned()
            .collect();
        if let Some(command) = imp.get_command(requirements.command_name()) {
            selection.commands.push(filter_command(command, arch));
        }
        selection
    }

    /// Version constraints this candidate would impose on other interfaces
    /// if selected for `requirements`.
    ///
    /// Recommended dependencies never constrain: they are dropped instead.
    pub fn restrictions(&self, requirements: &Requirements) -> Vec<Restriction> {
        let arch = &requirements.architecture;
        let imp = &self.implementation;
        let mut out: Vec<Restriction> = imp
            .restrictions
            .iter()
            .filter(|r| r.applies_to(arch))
            .cloned()
            .chain(
                imp.dependencies
                    .iter()
                    .filter(|d| d.is_essential() && d.applies_to(arch))
                    .map(Restriction::from),
            )
            .collect();
        if let Some(command) = imp.get_command(requirements.command_name()) {
            out.extend(command_restrictions(command, arch));
        }
        out.retain(|r| r.versions.is_some());
        out
    }
}

/// `command` with its dependencies and restrictions narrowed to `arch`.
pub(crate) fn filter_command(command: &Command, arch: &Architecture) -> Command {
    let mut filtered = command.clone();
    filtered.dependencies.retain(|d| d.applies_to(arch));
    filtered.restrictions.retain(|r| r.applies_to(arch));
    filtered
}

/// The dependencies among `deps` that apply to `arch`, essential ones first.
pub(crate) fn essential_first<'d>(
    deps: impl IntoIterator<Item = &'d Dependency>,
    arch: &Architecture,
) -> Vec<&'d Dependency> {
    let mut out: Vec<&Dependency> = deps.into_iter().filter(|d| d.applies_to(arch)).collect();
    out.sort_by_key(|d| !d.is_essential());
    out
}

/// Version constraints a command imposes through its restrictions,
/// essential dependencies and runner.
pub(crate) fn command_restrictions(command: &Command, arch: &Architecture) -> Vec<Restriction> {
    let mut out: Vec<Restriction> = command
        .restrictions
        .iter()
        .filter(|r| r.applies_to(arch))
        .cloned()
        .chain(
            command
                .dependencies
                .iter()
                .filter(|d| d.is_essential() && d.applies_to(arch))
                .map(Restriction::from),
        )
        .collect();
    if let Some(runner) = &command.runner {
        if let Some(versions) = &runner.versions {
            out.push(Restriction::new(runner.interface.as_str(), versions.clone()));
        }
    }
    out.retain(|r| r.versions.is_some());
    out
}

#[cfg(test)]
mod tests {
    use feedsolve_core::architecture::{Architecture, Os};
    use feedsolve_core::feed::Command;
    use feedsolve_core::version::VersionRange;

    use super::*;

    fn linux64() -> Architecture {
        Architecture::new(Os::Linux, Cpu::X86_64)
    }

    fn req() -> Requirements {
        Requirements::new("app")
            .with_command("run")
            .with_architecture(linux64())
    }

    fn imp(version: &str) -> Implementation {
        Implementation::new(
            format!("id-{version}"),
            ImplementationVersion::parse(version).unwrap(),
        )
        .with_command(Command::new("run"))
    }

    fn candidate(imp: Implementation, req: &Requirements) -> SelectionCandidate {
        SelectionCandidate::new("app", imp, &FeedPreferences::default(), req, false, false)
    }

    #[test]
    fn plain_candidate_is_suitable() {
        let c = candidate(imp("1.0"), &req());
        assert!(c.is_suitable());
        assert_eq!(c.notes(), "");
    }

    #[test]
    fn blocked_stabilities_never_suitable() {
        for stability in [Stability::Buggy, Stability::Insecure] {
            let c = candidate(imp("1.0").with_stability(stability), &req());
            assert!(!c.is_suitable());
            assert!(c.notes().contains(&stability.to_string()));
        }
    }

    #[test]
    fn user_override_can_block_but_not_unblock() {
        let prefs = FeedPreferences::default().with_user_stability("id-1.0", Stability::Buggy);
        let c = SelectionCandidate::new("app", imp("1.0"), &prefs, &req(), false, false);
        assert_eq!(c.effective_stability(), Stability::Buggy);
        assert!(!c.is_suitable());

        let prefs = FeedPreferences::default().with_user_stability("id-1.0", Stability::Preferred);
        let c = SelectionCandidate::new(
            "app",
            imp("1.0").with_stability(Stability::Insecure),
            &prefs,
            &req(),
            false,
            false,
        );
        assert_eq!(c.effective_stability(), Stability::Preferred);
        assert!(!c.is_suitable());
        assert_eq!(c.notes(), "Marked as insecure");
    }

    #[test]
    fn foreign_architecture_is_unsuitable() {
        let arch = Architecture::new(Os::FreeBsd, Cpu::Ppc);
        let c = candidate(imp("1.0").with_architecture(arch), &req());
        assert!(!c.is_suitable());
        assert!(c.notes().contains("FreeBSD-ppc"));
    }

    #[test]
    fn source_needs_source_request() {
        let src = Architecture::new(Os::All, Cpu::Source);
        let c = candidate(imp("1.0").with_architecture(src), &req());
        assert!(!c.is_suitable());

        let source_req = Requirements::new("app")
            .with_command("run")
            .with_architecture(Architecture::new(Os::Linux, Cpu::Source));
        let c = candidate(imp("1.0").with_architecture(src), &source_req);
        assert!(c.is_suitable());
    }

    #[test]
    fn version_range_applies_to_own_interface_only() {
        let r = req().with_versions(VersionRange::parse("..!1.0").unwrap());
        assert!(!candidate(imp("1.0"), &r).is_suitable());
        assert!(candidate(imp("0.9"), &r).is_suitable());

        let r = req().with_restriction("other", VersionRange::parse("..!1.0").unwrap());
        assert!(candidate(imp("1.0"), &r).is_suitable());
    }

    #[test]
    fn missing_command() {
        let r = req().with_command("test");
        let c = candidate(imp("1.0"), &r);
        assert_eq!(c.notes(), "No command 'test'");
    }

    #[test]
    fn languages_must_overlap() {
        let r = req().with_language("de");
        assert!(!candidate(imp("1.0").with_language("fr"), &r).is_suitable());
        assert!(candidate(imp("1.0").with_language("de"), &r).is_suitable());
        assert!(candidate(imp("1.0"), &r).is_suitable());
    }

    #[test]
    fn selection_snapshot_filters_by_os() {
        use feedsolve_core::feed::{Dependency, Runner};

        let imp = imp("1.0")
            .with_dependency(Dependency::new("win-only").with_os(Os::Windows))
            .with_dependency(
                Dependency::new("lib").with_versions(VersionRange::parse("2..").unwrap()),
            )
            .with_command(Command::new("test").with_runner(
                Runner::new("python").with_versions(VersionRange::parse("3..").unwrap()),
            ));
        let c = candidate(imp, &req());

        let sel = c.to_selection(&req());
        assert_eq!(sel.id, "id-1.0");
        assert_eq!(sel.dependencies.len(), 1);
        assert_eq!(sel.dependencies[0].interface, "lib");
        assert_eq!(sel.commands.len(), 1);
        assert_eq!(sel.commands[0].name, "run");

        let restricted: Vec<_> = c.restrictions(&req()).into_iter().map(|r| r.interface).collect();
        assert_eq!(restricted, vec!["lib"]);

        let test_req = req().with_command("test");
        let restricted: Vec<_> =
            c.restrictions(&test_req).into_iter().map(|r| r.interface).collect();
        assert_eq!(restricted, vec!["lib", "python"]);
    }

    #[test]
    fn recommended_dependencies_do_not_restrict() {
        use feedsolve_core::feed::Dependency;

        let five_up = VersionRange::parse("5..").unwrap();
        let imp = imp("1.0")
            .with_dependency(Dependency::new("lib").with_versions(five_up.clone()).recommended())
            .with_dependency(Dependency::new("tool").with_versions(five_up.clone()))
            .with_command(
                Command::new("test")
                    .with_dependency(Dependency::new("util").with_versions(five_up).recommended()),
            );
        let c = candidate(imp, &req());

        let restricted: Vec<_> = c.restrictions(&req()).into_iter().map(|r| r.interface).collect();
        assert_eq!(restricted, vec!["tool"]);
        let test_req = req().with_command("test");
        let restricted: Vec<_> =
            c.restrictions(&test_req).into_iter().map(|r| r.interface).collect();
        assert_eq!(restricted, vec!["tool"]);
    }

    #[test]
    fn essential_dependencies_come_first() {
        use feedsolve_core::feed::Dependency;

        let deps = [
            Dependency::new("a").recommended(),
            Dependency::new("b"),
            Dependency::new("c").with_os(Os::Windows),
            Dependency::new("d").recommended(),
            Dependency::new("e"),
        ];
        let order: Vec<_> = essential_first(&deps, &linux64())
            .into_iter()
            .map(|d| d.interface.as_str())
            .collect();
        assert_eq!(order, vec!["b", "e", "a", "d"]);
    }

    #[test]
    fn offline_requires_cache() {
        let prefs = FeedPreferences::default();
        let uncached = SelectionCandidate::new("app", imp("1.0"), &prefs, &req(), false, true);
        assert!(!uncached.is_suitable());
        let cached = SelectionCandidate::new("app", imp("1.0"), &prefs, &req(), true, true);
        assert!(cached.is_suitable());
    }
}
