//! # Cache Decision
//!
//! The cache coherence policy between the source tree and the exhaust tree.
//! States are computed, never stored: every request observes the filesystem
//! afresh and [`decide`] maps what it saw to exactly one action.
//!
//! ```text
//! source  artifact  outdated   action
//! ------  --------  --------   -------------------
//!   no      yes        -       EvictThenNotFound
//!   no      no         -       NotFound
//!   yes     yes      false     ServeCached
//!   yes     yes      true      GenerateThenServe
//!   yes     no         -       GenerateThenServe
//! ```
//!
//! Validity is tied to source existence only. `artifact_outdated` is always
//! `false` unless modification-time revalidation is enabled in the server
//! configuration, in which case an artifact older than its source is
//! regenerated in place. Without it, a source overwritten in place keeps
//! serving the artifact derived from its previous content.
//!
//! `EvictThenNotFound` is the only self-healing transition: it reclaims
//! artifacts whose source was deleted.

use std::time::SystemTime;

/// What the filesystem looked like for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExistenceFacts {
    /// The original image exists and is not a directory.
    pub source_exists: bool,
    /// The derived artifact exists and is not a directory.
    pub artifact_exists: bool,
    /// The artifact is older than its source. Only ever set when
    /// modification-time revalidation is enabled.
    pub artifact_outdated: bool,
}

impl ExistenceFacts {
    /// Facts from the two existence checks alone.
    pub fn new(source_exists: bool, artifact_exists: bool) -> Self {
        Self {
            source_exists,
            artifact_exists,
            artifact_outdated: false,
        }
    }

    /// Mark the artifact as outdated when its modification time predates the
    /// source's. Missing timestamps never mark an artifact outdated.
    pub fn with_mtimes(mut self, source: Option<SystemTime>, artifact: Option<SystemTime>) -> Self {
        self.artifact_outdated = match (source, artifact) {
            (Some(s), Some(a)) => self.source_exists && self.artifact_exists && a < s,
            _ => false,
        };
        self
    }
}

/// The four terminal actions of the cache state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheAction {
    /// Source gone, artifact orphaned: delete the artifact and answer 404.
    EvictThenNotFound,
    /// Neither exists: answer 404 without touching the filesystem.
    NotFound,
    /// Serve the artifact bytes currently on disk.
    ServeCached,
    /// Transcode the source, persist the artifact, then serve it.
    GenerateThenServe,
}

impl CacheAction {
    /// Stable lowercase label, used for metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EvictThenNotFound => "evict_then_not_found",
            Self::NotFound => "not_found",
            Self::ServeCached => "serve_cached",
            Self::GenerateThenServe => "generate_then_serve",
        }
    }

    /// Whether this action ends in a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EvictThenNotFound | Self::NotFound)
    }
}

impl std::fmt::Display for CacheAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide what to do for one request.
pub fn decide(facts: ExistenceFacts) -> CacheAction {
    match (facts.source_exists, facts.artifact_exists) {
        (false, true) => CacheAction::EvictThenNotFound,
        (false, false) => CacheAction::NotFound,
        (true, true) if facts.artifact_outdated => CacheAction::GenerateThenServe,
        (true, true) => CacheAction::ServeCached,
        (true, false) => CacheAction::GenerateThenServe,
    }
}
