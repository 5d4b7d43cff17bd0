//! # Configuration Check
//!
//! `wps check-config` loads the configuration exactly as `serve` would and
//! prints the resolved values as JSON. Exits non-zero when the image root is
//! not a directory or the allow-list is empty.

use std::path::Path;

use anyhow::Result;
use serde_json::{json, Value};

use wps_core::ServerConfig;

/// Resolved configuration plus the problems found in it.
pub fn describe(config: &ServerConfig) -> (Value, Vec<String>) {
    let mut problems = Vec::new();
    if !config.image_root.is_dir() {
        problems.push(format!(
            "IMG_PATH {} is not a directory",
            config.image_root.display()
        ));
    }
    if config.allowed_types.is_empty() {
        problems.push("ALLOWED_TYPES is empty; every request will be rejected".to_string());
    }

    let value = json!({
        "listen": config.listen_address(),
        "image_root": config.image_root.display().to_string(),
        "cache_root": config.cache_root.display().to_string(),
        "quality": config.quality,
        "allowed_types": config.allowed_types.iter().collect::<Vec<_>>(),
        "revalidate_mtime": config.revalidate_mtime,
    });
    (value, problems)
}

/// Execute `wps check-config`.
pub fn run_check_config(config_path: &Path) -> Result<u8> {
    let config = crate::load_config(config_path)?;
    let (value, problems) = describe(&config);
    println!("{}", serde_json::to_string_pretty(&value)?);

    if problems.is_empty() {
        return Ok(0);
    }
    for problem in &problems {
        eprintln!("error: {problem}");
    }
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_config_has_no_problems() {
        let dir = tempfile::tempdir().unwrap();
        let json = format!(
            r#"{{"IMG_PATH": "{}", "QUALITY": 75, "ALLOWED_TYPES": ["png", "jpg"]}}"#,
            dir.path().display()
        );
        let config = ServerConfig::from_json(&json, dir.path()).unwrap();
        let (value, problems) = describe(&config);
        assert!(problems.is_empty(), "{problems:?}");
        assert_eq!(value["allowed_types"], json!(["jpg", "png"]));
        assert_eq!(value["quality"], json!(75.0));
        assert_eq!(value["listen"], json!("127.0.0.1:3333"));
        assert_eq!(
            value["cache_root"],
            json!(dir.path().join("exhaust").display().to_string())
        );
    }

    #[test]
    fn missing_image_root_and_empty_allow_list_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::from_json(
            r#"{"IMG_PATH": "does-not-exist", "QUALITY": "80", "ALLOWED_TYPES": []}"#,
            dir.path(),
        )
        .unwrap();
        let (_, problems) = describe(&config);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("does-not-exist"));
    }
}
