//! In-memory collaborators and builders shared by the solver integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use feedsolve_core::architecture::{Architecture, Cpu, Os};
use feedsolve_core::config::SolverConfig;
use feedsolve_core::feed::{Command, Feed, Implementation};
use feedsolve_core::preferences::{FeedPreferences, InterfacePreferences};
use feedsolve_core::requirements::Requirements;
use feedsolve_core::version::{ImplementationVersion, VersionRange};
use feedsolve_solver::cancel::CancellationToken;
use feedsolve_solver::provider::{FeedProvider, FetchedFeed, PreferenceLoader, SolverContext, Store};
use feedsolve_util::errors::{SolveError, SolveResult};

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn v(s: &str) -> ImplementationVersion {
    ImplementationVersion::parse(s).unwrap()
}

pub fn range(s: &str) -> VersionRange {
    VersionRange::parse(s).unwrap()
}

pub fn linux64() -> Architecture {
    Architecture::new(Os::Linux, Cpu::X86_64)
}

/// Requirements for `interface` on Linux-x86_64, so results don't depend on the host.
pub fn request(interface: &str) -> Requirements {
    Requirements::new(interface).with_architecture(linux64())
}

/// A platform-neutral implementation with no commands.
pub fn imp(id: &str, version: &str) -> Implementation {
    Implementation::new(id, v(version))
}

/// A platform-neutral implementation with a `run` command.
pub fn runnable(id: &str, version: &str) -> Implementation {
    imp(id, version).with_command(Command::new("run").with_path("bin/run"))
}

pub fn feed(uri: &str, implementations: Vec<Implementation>) -> Feed {
    implementations
        .into_iter()
        .fold(Feed::new(uri), Feed::with_implementation)
}

#[derive(Default)]
pub struct MemoryFeeds {
    feeds: HashMap<String, Arc<Feed>>,
    stale: HashSet<String>,
    broken: HashSet<String>,
    /// Cancelled as soon as this URI is fetched.
    cancel_on: Option<(String, CancellationToken)>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryFeeds {
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl FeedProvider for MemoryFeeds {
    fn get_feed(&self, uri: &str) -> SolveResult<FetchedFeed> {
        self.fetched.lock().unwrap().push(uri.to_string());
        if let Some((trigger, token)) = &self.cancel_on {
            if trigger == uri {
                token.cancel();
            }
        }
        if self.broken.contains(uri) {
            return Err(SolveError::Feed {
                uri: uri.to_string(),
                message: "signature verification failed".to_string(),
            });
        }
        match self.feeds.get(uri) {
            Some(feed) => Ok(FetchedFeed {
                feed: Arc::clone(feed),
                stale: self.stale.contains(uri),
            }),
            None => Err(SolveError::Feed {
                uri: uri.to_string(),
                message: "not found".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    digests: HashSet<String>,
}

impl Store for MemoryStore {
    fn contains(&self, digest: &str) -> bool {
        self.digests.contains(digest)
    }
}

#[derive(Default)]
pub struct MemoryPreferences {
    interfaces: HashMap<String, InterfacePreferences>,
    feeds: HashMap<String, FeedPreferences>,
}

impl PreferenceLoader for MemoryPreferences {
    fn load_interface(&self, uri: &str) -> InterfacePreferences {
        self.interfaces.get(uri).cloned().unwrap_or_default()
    }

    fn load_feed(&self, uri: &str) -> FeedPreferences {
        self.feeds.get(uri).cloned().unwrap_or_default()
    }
}

/// Builder for a complete set of collaborators.
#[derive(Default)]
pub struct World {
    pub feeds: MemoryFeeds,
    pub store: MemoryStore,
    pub preferences: MemoryPreferences,
    pub config: SolverConfig,
    pub cancel: CancellationToken,
}

impl World {
    pub fn new() -> Self {
        init_logging();
        Self::default()
    }

    pub fn feed(mut self, feed: Feed) -> Self {
        self.feeds.feeds.insert(feed.uri.clone(), Arc::new(feed));
        self
    }

    pub fn stale(mut self, uri: &str) -> Self {
        self.feeds.stale.insert(uri.to_string());
        self
    }

    pub fn broken(mut self, uri: &str) -> Self {
        self.feeds.broken.insert(uri.to_string());
        self
    }

    pub fn cancel_on_fetch(mut self, uri: &str) -> Self {
        self.feeds.cancel_on = Some((uri.to_string(), self.cancel.clone()));
        self
    }

    pub fn cached(mut self, digest: &str) -> Self {
        self.store.digests.insert(digest.to_string());
        self
    }

    pub fn interface_preferences(mut self, uri: &str, prefs: InterfacePreferences) -> Self {
        self.preferences.interfaces.insert(uri.to_string(), prefs);
        self
    }

    pub fn feed_preferences(mut self, uri: &str, prefs: FeedPreferences) -> Self {
        self.preferences.feeds.insert(uri.to_string(), prefs);
        self
    }

    pub fn config(mut self, edit: impl FnOnce(&mut SolverConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn context(self) -> SolverContext {
        SolverContext::new(
            self.config,
            Arc::new(self.feeds),
            Arc::new(self.store),
            Arc::new(self.preferences),
        )
        .with_cancellation(self.cancel)
    }

    /// Like [`context`](Self::context), but keeps a handle on the feed provider.
    pub fn context_with_feeds(self) -> (SolverContext, Arc<MemoryFeeds>) {
        let feeds = Arc::new(self.feeds);
        let ctx = SolverContext::new(
            self.config,
            feeds.clone(),
            Arc::new(self.store),
            Arc::new(self.preferences),
        )
        .with_cancellation(self.cancel);
        (ctx, feeds)
    }
}

/// `(interface, version)` pairs of a solution, in selection order.
pub fn chosen(selections: &feedsolve_core::selection::Selections) -> Vec<(String, String)> {
    selections
        .implementations
        .iter()
        .map(|s| (s.interface.clone(), s.version.to_string()))
        .collect()
}
