//! # wps-core — Foundational Types for the WebP Server
//!
//! Pure, I/O-free building blocks shared by every other crate in the
//! workspace. Nothing here touches the filesystem except [`config`], which
//! reads the configuration file once at startup.
//!
//! ## Key Design Principles
//!
//! 1. **Paths are derived, never stored.** [`ResolvedPaths`] is computed from
//!    the request path on every request. The filesystem is the cache index.
//!
//! 2. **Additive suffix.** `/a/b/cat.jpg` maps to `<cache_root>/a/b/cat.jpg.webp`.
//!    The original basename and extension are preserved so two distinct
//!    request paths can never share an artifact.
//!
//! 3. **Decisions are pure.** [`decide`] maps [`ExistenceFacts`] to exactly
//!    one of four [`CacheAction`]s. All side effects live in the callers.
//!
//! 4. **Immutable configuration.** [`ServerConfig`] is built once and shared
//!    by reference. There is no process-wide mutable state.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `wps-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod decision;
pub mod error;
pub mod gate;
pub mod paths;

pub use config::ServerConfig;
pub use decision::{decide, CacheAction, ExistenceFacts};
pub use error::ConfigError;
pub use gate::AllowList;
pub use paths::{resolve, PathResolver, ResolvedPaths, ARTIFACT_CONTENT_TYPE, ARTIFACT_SUFFIX};
