//! Property tests for request path derivation.
//!
//! The artifact path must be a deterministic, collision-free function of the
//! request path: cache root + directories + basename + `.webp`, for any
//! nesting depth and any number of dots in the filename.

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use wps_core::{decide, resolve, CacheAction, ExistenceFacts, ARTIFACT_SUFFIX};

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,12}"
}

fn filename() -> impl Strategy<Value = (String, String)> {
    (prop::collection::vec(segment(), 1..4), "[a-z]{2,4}")
        .prop_map(|(stems, ext)| (format!("{}.{ext}", stems.join(".")), ext))
}

proptest! {
    #[test]
    fn artifact_path_appends_suffix(
        dirs in prop::collection::vec(segment(), 0..6),
        (name, ext) in filename(),
    ) {
        let source_root = Path::new("/srv/src");
        let cache_root = Path::new("/srv/cache");
        let mut request = String::new();
        for d in &dirs {
            request.push('/');
            request.push_str(d);
        }
        request.push('/');
        request.push_str(&name);

        let r = resolve(&request, source_root, cache_root);

        let mut expected_dir = cache_root.to_path_buf();
        expected_dir.extend(&dirs);
        prop_assert_eq!(&r.artifact_dir, &expected_dir);
        prop_assert_eq!(
            &r.artifact_path,
            &expected_dir.join(format!("{name}.{ARTIFACT_SUFFIX}"))
        );
        prop_assert_eq!(&r.extension, &ext);
        prop_assert_eq!(&r.request_path, &request);

        let mut expected_source = source_root.to_path_buf();
        expected_source.extend(&dirs);
        expected_source.push(&name);
        prop_assert_eq!(&r.source_path, &expected_source);
    }

    #[test]
    fn resolution_is_deterministic(path in "(/[a-z.]{1,8}){1,5}") {
        let a = resolve(&path, Path::new("/s"), Path::new("/c"));
        let b = resolve(&path, Path::new("/s"), Path::new("/c"));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn resolved_paths_stay_inside_roots(path in "(/(\\.\\.|\\.|[a-z]{1,4})){0,8}") {
        let r = resolve(&path, Path::new("/s"), Path::new("/c"));
        prop_assert!(r.source_path.starts_with("/s"));
        prop_assert!(r.artifact_path.starts_with("/c"));
    }

    #[test]
    fn distinct_names_never_collide(a in segment(), b in segment()) {
        prop_assume!(a != b);
        let ra = resolve(&format!("/{a}.jpg"), Path::new("/s"), Path::new("/c"));
        let rb = resolve(&format!("/{b}.jpg"), Path::new("/s"), Path::new("/c"));
        prop_assert_ne!(ra.artifact_path, rb.artifact_path);
    }

    #[test]
    fn decision_without_source_is_always_not_found(artifact in any::<bool>(), outdated in any::<bool>()) {
        let facts = ExistenceFacts { source_exists: false, artifact_exists: artifact, artifact_outdated: outdated };
        prop_assert!(decide(facts).is_not_found());
    }

    #[test]
    fn decision_with_source_always_serves(artifact in any::<bool>(), outdated in any::<bool>()) {
        let facts = ExistenceFacts { source_exists: true, artifact_exists: artifact, artifact_outdated: outdated };
        let action = decide(facts);
        prop_assert!(matches!(action, CacheAction::ServeCached | CacheAction::GenerateThenServe));
    }
}

#[test]
fn concrete_scenario_paths() {
    let r = resolve("/photo.jpg", Path::new("/pics"), Path::new("/work/exhaust"));
    assert_eq!(r.artifact_path, PathBuf::from("/work/exhaust/photo.jpg.webp"));
    assert_eq!(r.extension, "jpg");
}
