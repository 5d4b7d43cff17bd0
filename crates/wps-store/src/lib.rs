//! # wps-store — Artifact Persistence
//!
//! Everything that touches the filesystem on behalf of the cache lives here:
//!
//! - [`ArtifactStore`] — existence, timestamps, directory creation, atomic
//!   writes, reads and deletes.
//! - [`GenerationLocks`] — per-artifact-path single-flight so concurrent
//!   requests for one missing artifact transcode it once.
//! - [`sweep`] — bulk eviction of artifacts whose source is gone.
//!
//! The store holds no index. Every call observes the disk as it is now.

pub mod error;
pub mod flight;
pub mod store;
pub mod sweep;

pub use error::StoreError;
pub use flight::{FlightGuard, GenerationLocks};
pub use store::ArtifactStore;
pub use sweep::{sweep_orphans, SweepReport};
