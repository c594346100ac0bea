//! Per-solve context: feed gathering, candidate construction and the caches
//! that live for exactly one solve call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use feedsolve_core::config::NetworkLevel;
use feedsolve_core::feed::{languages_overlap, Feed, Implementation};
use feedsolve_core::preferences::{FeedPreferences, InterfacePreferences};
use feedsolve_core::requirements::Requirements;
use feedsolve_core::version::ImplementationVersion;
use feedsolve_util::errors::{SolveError, SolveResult};

use crate::candidate::SelectionCandidate;
use crate::provider::SolverContext;
use crate::rank::SelectionCandidateComparer;

/// State owned by one solve call and passed by reference through the search.
pub struct SolverRun<'a> {
    ctx: &'a SolverContext,
    solver_version: Option<ImplementationVersion>,
    interface_preferences: HashMap<String, InterfacePreferences>,
    feed_preferences: HashMap<String, FeedPreferences>,
    /// `None` marks a feed that was fetched but skipped.
    feeds: HashMap<String, Option<Arc<Feed>>>,
    comparers: HashMap<String, SelectionCandidateComparer>,
    store_hits: HashMap<String, bool>,
    stale_feeds: bool,
}

impl<'a> SolverRun<'a> {
    pub fn new(ctx: &'a SolverContext) -> Self {
        Self {
            ctx,
            solver_version: ImplementationVersion::parse(env!("CARGO_PKG_VERSION")).ok(),
            interface_preferences: HashMap::new(),
            feed_preferences: HashMap::new(),
            feeds: HashMap::new(),
            comparers: HashMap::new(),
            store_hits: HashMap::new(),
            stale_feeds: false,
        }
    }

    pub fn context(&self) -> &SolverContext {
        self.ctx
    }

    /// `true` if any feed consulted so far was stale.
    pub fn stale_feeds(&self) -> bool {
        self.stale_feeds
    }

    /// All candidates for `requirements`, best first. Unsuitable candidates
    /// are included so callers can report why they were passed over.
    pub fn sorted_candidates(&mut self, requirements: &Requirements) -> SolveResult<Vec<SelectionCandidate>> {
        let offline = self.ctx.config.network_use == NetworkLevel::Offline;
        let mut candidates = Vec::new();
        for (feed_uri, feed) in self.gather_feeds(requirements)? {
            let preferences = self.feed_preferences(&feed_uri).clone();
            for implementation in &feed.implementations {
                let cached = self.is_cached(implementation);
                candidates.push(SelectionCandidate::new(
                    feed_uri.as_str(),
                    implementation.clone(),
                    &preferences,
                    requirements,
                    cached,
                    offline,
                ));
            }
        }

        let comparer = self.comparer(&requirements.interface);
        comparer.sort(&mut candidates);
        tracing::trace!(
            "{} candidates for {}: {:?}",
            candidates.len(),
            requirements,
            candidates.iter().map(SelectionCandidate::id).collect::<Vec<_>>()
        );
        Ok(candidates)
    }

    /// The interface's own feed, every compatible feed it references
    /// (recursively), then feeds the user registered for the interface.
    fn gather_feeds(&mut self, requirements: &Requirements) -> SolveResult<Vec<(String, Arc<Feed>)>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.add_feed(&requirements.interface, requirements, &mut out, &mut seen)?;

        let extra: Vec<String> = self
            .interface_preferences(&requirements.interface)
            .feeds
            .iter()
            .map(|r| r.source.clone())
            .collect();
        for uri in extra {
            self.add_feed(&uri, requirements, &mut out, &mut seen)
                .map_err(|e| match e {
                    SolveError::Feed { uri, message } => SolveError::Feed {
                        message: format!(
                            "{message} (registered as an extra feed for {})",
                            requirements.interface
                        ),
                        uri,
                    },
                    other => other,
                })?;
        }
        Ok(out)
    }

    fn add_feed(
        &mut self,
        uri: &str,
        requirements: &Requirements,
        out: &mut Vec<(String, Arc<Feed>)>,
        seen: &mut HashSet<String>,
    ) -> SolveResult<()> {
        if !seen.insert(uri.to_string()) {
            return Ok(());
        }
        let Some(feed) = self.fetch(uri)? else {
            return Ok(());
        };
        out.push((uri.to_string(), Arc::clone(&feed)));

        for reference in &feed.feeds {
            if reference.architecture.is_compatible(&requirements.architecture)
                && languages_overlap(&reference.languages, &requirements.languages, true)
            {
                self.add_feed(&reference.source, requirements, out, seen)?;
            }
        }
        Ok(())
    }

    fn fetch(&mut self, uri: &str) -> SolveResult<Option<Arc<Feed>>> {
        if let Some(cached) = self.feeds.get(uri) {
            return Ok(cached.clone());
        }
        let fetched = self.ctx.feeds.get_feed(uri)?;
        if fetched.stale {
            tracing::debug!("feed {uri} is stale");
            self.stale_feeds = true;
        }

        let usable = match (&fetched.feed.min_solver_version, &self.solver_version) {
            (Some(required), Some(ours)) if required > ours => {
                tracing::warn!(
                    "The feed '{uri}' requires solver version {required} or later, but this is {ours}; skipping it"
                );
                None
            }
            _ => Some(fetched.feed),
        };
        self.feeds.insert(uri.to_string(), usable.clone());
        Ok(usable)
    }

    fn interface_preferences(&mut self, uri: &str) -> &InterfacePreferences {
        let ctx = self.ctx;
        self.interface_preferences
            .entry(uri.to_string())
            .or_insert_with(|| ctx.preferences.load_interface(uri))
    }

    fn feed_preferences(&mut self, uri: &str) -> &FeedPreferences {
        let ctx = self.ctx;
        self.feed_preferences
            .entry(uri.to_string())
            .or_insert_with(|| ctx.preferences.load_feed(uri))
    }

    /// One comparer per interface, since the stability policy is per interface.
    fn comparer(&mut self, interface: &str) -> SelectionCandidateComparer {
        if let Some(comparer) = self.comparers.get(interface) {
            return *comparer;
        }
        let ctx = self.ctx;
        let config = &ctx.config;
        let policy = self
            .interface_preferences(interface)
            .stability_policy
            .unwrap_or_else(|| config.default_stability_policy());
        let comparer = SelectionCandidateComparer::new(config.network_use, policy);
        self.comparers.insert(interface.to_string(), comparer);
        comparer
    }

    fn is_cached(&mut self, implementation: &Implementation) -> bool {
        if implementation.local_path.is_some() {
            return true;
        }
        let Some(digest) = &implementation.digest else {
            return false;
        };
        let ctx = self.ctx;
        *self
            .store_hits
            .entry(digest.clone())
            .or_insert_with(|| ctx.store.contains(digest))
    }
}
