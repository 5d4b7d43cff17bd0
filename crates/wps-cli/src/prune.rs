//! # Prune
//!
//! `wps prune` walks the cache tree and deletes every artifact whose source
//! image no longer exists. A request for such an artifact would evict it
//! anyway; pruning does it for the whole tree without waiting for traffic.
//!
//! Pruning refuses to run when `IMG_PATH` is not a directory: every artifact
//! would look orphaned and the whole cache would be deleted.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use wps_core::ServerConfig;
use wps_store::{sweep_orphans, ArtifactStore, SweepReport};

/// Arguments for `wps prune`.
#[derive(Args, Debug, Default)]
pub struct PruneArgs {
    /// List orphaned artifacts without deleting them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Sweep the cache root of `config`.
pub fn prune(config: &ServerConfig, args: &PruneArgs) -> Result<SweepReport> {
    let store = ArtifactStore::new(&config.cache_root);
    sweep_orphans(&store, &config.resolver(), args.dry_run)
        .with_context(|| format!("failed to sweep {}", config.cache_root.display()))
}

/// Execute `wps prune`.
pub fn run_prune(args: &PruneArgs, config_path: &Path) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let report = prune(&config, args)?;

    let verb = if args.dry_run { "would evict" } else { "evicted" };
    for orphan in &report.orphans {
        println!("{verb} {}", orphan.display());
    }
    println!(
        "scanned {} artifacts, {verb} {}, {} failed",
        report.scanned,
        report.orphans.len(),
        report.failed
    );

    Ok(if report.failed > 0 { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wps_core::AllowList;

    fn config_in(dir: &Path, image_dir: &str) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 3333,
            image_root: dir.join(image_dir),
            quality: 80.0,
            allowed_types: AllowList::new(["jpg"]),
            cache_root: dir.join("exhaust"),
            revalidate_mtime: false,
        }
    }

    #[test]
    fn prune_refuses_missing_image_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pics")).unwrap();
        let config = config_in(dir.path(), "pics-typo");
        std::fs::create_dir_all(config.cache_root.join("a")).unwrap();
        let artifacts = ["a.jpg.webp", "a/b.jpg.webp", "c.png.webp"];
        for a in artifacts {
            std::fs::write(config.cache_root.join(a), b"w").unwrap();
        }

        let err = prune(&config, &PruneArgs::default()).unwrap_err();
        assert!(format!("{err:#}").contains("pics-typo"));
        for a in artifacts {
            assert!(config.cache_root.join(a).exists(), "{a} was deleted");
        }
    }

    #[test]
    fn prune_removes_orphans_and_keeps_live_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), "pics");
        std::fs::create_dir_all(config.image_root.join("a")).unwrap();
        std::fs::create_dir_all(config.cache_root.join("a")).unwrap();
        std::fs::write(config.image_root.join("a/live.jpg"), b"x").unwrap();
        std::fs::write(config.cache_root.join("a/live.jpg.webp"), b"w").unwrap();
        std::fs::write(config.cache_root.join("a/dead.jpg.webp"), b"w").unwrap();

        let dry = prune(&config, &PruneArgs { dry_run: true }).unwrap();
        assert_eq!(dry.orphans.len(), 1);
        assert!(config.cache_root.join("a/dead.jpg.webp").exists());

        let report = prune(&config, &PruneArgs::default()).unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.orphans, vec![config.cache_root.join("a/dead.jpg.webp")]);
        assert!(!config.cache_root.join("a/dead.jpg.webp").exists());
        assert!(config.cache_root.join("a/live.jpg.webp").exists());
    }
}
