//! Collaborators a solver consults: feeds, the implementation store and
//! user preferences.
//!
//! Downloading, signature checks and preference file formats live behind
//! these traits; the solver only reads through them.

use std::sync::Arc;

use feedsolve_core::config::SolverConfig;
use feedsolve_core::feed::Feed;
use feedsolve_core::preferences::{FeedPreferences, InterfacePreferences};
use feedsolve_util::errors::SolveResult;

use crate::cancel::CancellationToken;

/// A feed as delivered by a [`FeedProvider`].
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub feed: Arc<Feed>,
    /// The cached copy is older than its freshness window.
    pub stale: bool,
}

pub trait FeedProvider: Send + Sync {
    /// Retrieve the feed at `uri`.
    ///
    /// Failures abort the current solve; they are never treated as "no candidates".
    fn get_feed(&self, uri: &str) -> SolveResult<FetchedFeed>;
}

/// Membership test against the local implementation cache.
pub trait Store: Send + Sync {
    fn contains(&self, digest: &str) -> bool;
}

/// Loads per-user preferences. Missing or unreadable preferences yield defaults.
pub trait PreferenceLoader: Send + Sync {
    fn load_interface(&self, uri: &str) -> InterfacePreferences;
    fn load_feed(&self, uri: &str) -> FeedPreferences;
}

/// A [`PreferenceLoader`] that always returns defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreferences;

impl PreferenceLoader for NoPreferences {
    fn load_interface(&self, _uri: &str) -> InterfacePreferences {
        InterfacePreferences::default()
    }

    fn load_feed(&self, _uri: &str) -> FeedPreferences {
        FeedPreferences::default()
    }
}

/// Everything a solver strategy needs besides the requirements.
///
/// Cheap to clone; strategies built from the same context share collaborators.
#[derive(Clone)]
pub struct SolverContext {
    pub config: SolverConfig,
    pub feeds: Arc<dyn FeedProvider>,
    pub store: Arc<dyn Store>,
    pub preferences: Arc<dyn PreferenceLoader>,
    pub cancel: CancellationToken,
}

impl SolverContext {
    pub fn new(
        config: SolverConfig,
        feeds: Arc<dyn FeedProvider>,
        store: Arc<dyn Store>,
        preferences: Arc<dyn PreferenceLoader>,
    ) -> Self {
        Self {
            config,
            feeds,
            store,
            preferences,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
