//! Candidate ranking.
//!
//! Ranking is an ordered list of rules. Each rule compares two candidates
//! and the first rule that tells them apart decides. The last rule compares
//! implementation IDs, so the order is total and never depends on input order.

use std::cmp::Ordering;

use feedsolve_core::config::NetworkLevel;
use feedsolve_core::feed::Stability;

use crate::candidate::SelectionCandidate;

/// A single tie-break. `Less` means `x` ranks before `y`.
pub type Rule = fn(&SelectionCandidateComparer, &SelectionCandidate, &SelectionCandidate) -> Ordering;

/// The rules in the order they are applied.
pub const RULES: &[(&str, Rule)] = &[
    ("preferred", preferred_first),
    ("cached-when-network-restricted", cached_first_when_restricted),
    ("stability-policy", within_policy_first),
    ("version", newer_first),
    ("cpu-specificity", specific_cpu_first),
    ("cached", cached_first_when_unrestricted),
    ("id", by_id),
];

/// Orders candidates for one interface, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCandidateComparer {
    pub network_use: NetworkLevel,
    /// Candidates at least this stable rank above the rest.
    pub stability_policy: Stability,
}

impl SelectionCandidateComparer {
    pub fn new(network_use: NetworkLevel, stability_policy: Stability) -> Self {
        Self {
            network_use,
            stability_policy,
        }
    }

    pub fn compare(&self, x: &SelectionCandidate, y: &SelectionCandidate) -> Ordering {
        RULES
            .iter()
            .map(|(_, rule)| rule(self, x, y))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Name of the first rule that separates `x` and `y`, if any.
    pub fn deciding_rule(&self, x: &SelectionCandidate, y: &SelectionCandidate) -> Option<&'static str> {
        RULES
            .iter()
            .find(|(_, rule)| rule(self, x, y).is_ne())
            .map(|(name, _)| *name)
    }

    pub fn sort(&self, candidates: &mut [SelectionCandidate]) {
        candidates.sort_by(|x, y| self.compare(x, y));
    }
}

/// `true` sorts first.
fn prefer(x: bool, y: bool) -> Ordering {
    y.cmp(&x)
}

pub fn preferred_first(
    _: &SelectionCandidateComparer,
    x: &SelectionCandidate,
    y: &SelectionCandidate,
) -> Ordering {
    prefer(
        x.effective_stability() == Stability::Preferred,
        y.effective_stability() == Stability::Preferred,
    )
}

pub fn cached_first_when_restricted(
    cmp: &SelectionCandidateComparer,
    x: &SelectionCandidate,
    y: &SelectionCandidate,
) -> Ordering {
    if cmp.network_use == NetworkLevel::Full {
        return Ordering::Equal;
    }
    prefer(x.is_cached, y.is_cached)
}

pub fn within_policy_first(
    cmp: &SelectionCandidateComparer,
    x: &SelectionCandidate,
    y: &SelectionCandidate,
) -> Ordering {
    prefer(
        x.effective_stability() <= cmp.stability_policy,
        y.effective_stability() <= cmp.stability_policy,
    )
}

pub fn newer_first(
    _: &SelectionCandidateComparer,
    x: &SelectionCandidate,
    y: &SelectionCandidate,
) -> Ordering {
    y.version().cmp(x.version())
}

pub fn specific_cpu_first(
    _: &SelectionCandidateComparer,
    x: &SelectionCandidate,
    y: &SelectionCandidate,
) -> Ordering {
    let x_cpu = x.implementation.architecture.cpu.specificity();
    let y_cpu = y.implementation.architecture.cpu.specificity();
    y_cpu.cmp(&x_cpu)
}

pub fn cached_first_when_unrestricted(
    cmp: &SelectionCandidateComparer,
    x: &SelectionCandidate,
    y: &SelectionCandidate,
) -> Ordering {
    if cmp.network_use != NetworkLevel::Full {
        return Ordering::Equal;
    }
    prefer(x.is_cached, y.is_cached)
}

pub fn by_id(
    _: &SelectionCandidateComparer,
    x: &SelectionCandidate,
    y: &SelectionCandidate,
) -> Ordering {
    x.id().cmp(y.id())
}
