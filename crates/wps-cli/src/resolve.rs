//! # Resolve
//!
//! `wps resolve <path>` prints where a request path maps on disk and which
//! cache action a request for it would take right now. Nothing is modified.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde_json::{json, Value};

use wps_core::{decide, ExistenceFacts, ServerConfig};
use wps_store::ArtifactStore;

/// Arguments for `wps resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Request path, e.g. `/a/b/cat.jpg`.
    pub path: String,
}

/// Describe the resolution of `request_path` under `config`.
pub fn describe(config: &ServerConfig, request_path: &str) -> Value {
    let paths = config.resolver().resolve(request_path);
    let allowed = config.allowed_types.is_allowed(&paths.extension);

    let action = if allowed {
        let store = ArtifactStore::new(&config.cache_root);
        let facts = ExistenceFacts::new(
            store.exists(&paths.source_path),
            store.exists(&paths.artifact_path),
        );
        let facts = if config.revalidate_mtime {
            facts.with_mtimes(
                store.modified(&paths.source_path),
                store.modified(&paths.artifact_path),
            )
        } else {
            facts
        };
        decide(facts).as_str()
    } else {
        "forbidden"
    };

    json!({
        "request_path": paths.request_path,
        "extension": paths.extension,
        "allowed": allowed,
        "source_path": paths.source_path.display().to_string(),
        "artifact_path": paths.artifact_path.display().to_string(),
        "action": action,
    })
}

/// Execute `wps resolve`.
pub fn run_resolve(args: &ResolveArgs, config_path: &Path) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let value = describe(&config, &args.path);
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(0)
}
