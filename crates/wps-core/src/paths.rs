//! # Request Path Resolution
//!
//! Maps an incoming request path onto the two trees the server works with:
//!
//! ```text
//! request        /a/b/cat.jpg
//! source         <source_root>/a/b/cat.jpg
//! artifact       <cache_root>/a/b/cat.jpg.webp
//! artifact dir   <cache_root>/a/b
//! extension      jpg
//! ```
//!
//! Resolution is a pure function with no failure mode. Malformed request
//! paths resolve to paths that simply fail the existence checks downstream.
//!
//! ## Normalization
//!
//! The request path is cleaned lexically before it is joined onto either
//! root: empty and `.` segments are dropped and `..` removes the previous
//! segment, clamped at the root. A resolved path therefore always lies inside
//! its root, whatever the client sent.

use std::path::{Path, PathBuf};

/// Suffix appended (not substituted) to the source filename to name its artifact.
pub const ARTIFACT_SUFFIX: &str = "webp";

/// `Content-Type` of every served artifact.
pub const ARTIFACT_CONTENT_TYPE: &str = "image/webp";

/// Every path derived from one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Normalized request path, always starting with `/`.
    pub request_path: String,
    /// Absolute path of the original image.
    pub source_path: PathBuf,
    /// Extension of the final path segment, without the dot. Empty if none.
    pub extension: String,
    /// Absolute path of the derived artifact.
    pub artifact_path: PathBuf,
    /// Directory holding the derived artifact.
    pub artifact_dir: PathBuf,
}

/// Resolve `request_path` against a source root and a cache root.
pub fn resolve(request_path: &str, source_root: &Path, cache_root: &Path) -> ResolvedPaths {
    let segments = normalize(request_path);
    let (basename, dirs) = match segments.split_last() {
        Some((last, dirs)) => (*last, dirs),
        None => ("", &[][..]),
    };

    let mut source_path = source_root.to_path_buf();
    source_path.extend(&segments);

    let mut artifact_dir = cache_root.to_path_buf();
    artifact_dir.extend(dirs);
    let artifact_path = artifact_dir.join(format!("{basename}.{ARTIFACT_SUFFIX}"));

    ResolvedPaths {
        request_path: format!("/{}", segments.join("/")),
        source_path,
        extension: extension_of(basename).to_string(),
        artifact_path,
        artifact_dir,
    }
}

/// Lexically clean a request path into its segments.
fn normalize(request_path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

/// Text after the last `.` of a filename, or `""` when there is none.
fn extension_of(basename: &str) -> &str {
    match basename.rfind('.') {
        Some(i) => &basename[i + 1..],
        None => "",
    }
}

/// Resolver bound to a fixed pair of roots.
///
/// Holds no mutable state; cheap to clone and share across requests.
#[derive(Debug, Clone)]
pub struct PathResolver {
    source_root: PathBuf,
    cache_root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for the given source and cache roots.
    pub fn new(source_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            cache_root: cache_root.into(),
        }
    }

    /// Resolve a request path. See [`resolve`].
    pub fn resolve(&self, request_path: &str) -> ResolvedPaths {
        resolve(request_path, &self.source_root, &self.cache_root)
    }

    /// Root directory of the original images.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Root directory of the derived artifacts.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> (PathBuf, PathBuf) {
        (PathBuf::from("/srv/pics"), PathBuf::from("/home/wps/exhaust"))
    }

    #[test]
    fn resolves_nested_request() {
        let (src, cache) = roots();
        let r = resolve("/a/b/cat.jpg", &src, &cache);
        assert_eq!(r.request_path, "/a/b/cat.jpg");
        assert_eq!(r.source_path, PathBuf::from("/srv/pics/a/b/cat.jpg"));
        assert_eq!(r.extension, "jpg");
        assert_eq!(
            r.artifact_path,
            PathBuf::from("/home/wps/exhaust/a/b/cat.jpg.webp")
        );
        assert_eq!(r.artifact_dir, PathBuf::from("/home/wps/exhaust/a/b"));
    }

    #[test]
    fn resolves_top_level_request() {
        let (src, cache) = roots();
        let r = resolve("/photo.jpg", &src, &cache);
        assert_eq!(r.source_path, PathBuf::from("/srv/pics/photo.jpg"));
        assert_eq!(r.artifact_path, PathBuf::from("/home/wps/exhaust/photo.jpg.webp"));
        assert_eq!(r.artifact_dir, cache);
    }

    #[test]
    fn multiple_dots_use_last_extension() {
        let (src, cache) = roots();
        let r = resolve("/x/cat.v2.jpg", &src, &cache);
        assert_eq!(r.extension, "jpg");
        assert_eq!(
            r.artifact_path,
            PathBuf::from("/home/wps/exhaust/x/cat.v2.jpg.webp")
        );
    }

    #[test]
    fn missing_extension_is_empty() {
        let (src, cache) = roots();
        assert_eq!(resolve("/a/README", &src, &cache).extension, "");
        assert_eq!(resolve("/a/trailing.", &src, &cache).extension, "");
    }

    #[test]
    fn dotted_directory_does_not_leak_extension() {
        let (src, cache) = roots();
        assert_eq!(resolve("/a.b/cat", &src, &cache).extension, "");
    }

    #[test]
    fn extension_is_case_preserving() {
        let (src, cache) = roots();
        assert_eq!(resolve("/CAT.JPG", &src, &cache).extension, "JPG");
    }

    #[test]
    fn parent_segments_cannot_escape_roots() {
        let (src, cache) = roots();
        let r = resolve("/../../etc/passwd.png", &src, &cache);
        assert_eq!(r.source_path, PathBuf::from("/srv/pics/etc/passwd.png"));
        assert_eq!(
            r.artifact_path,
            PathBuf::from("/home/wps/exhaust/etc/passwd.png.webp")
        );
        assert!(r.source_path.starts_with(&src));
        assert!(r.artifact_path.starts_with(&cache));
    }

    #[test]
    fn redundant_separators_and_dots_are_cleaned() {
        let (src, cache) = roots();
        let r = resolve("//a/./b//../c/dog.png", &src, &cache);
        assert_eq!(r.request_path, "/a/c/dog.png");
        assert_eq!(r.source_path, PathBuf::from("/srv/pics/a/c/dog.png"));
    }

    #[test]
    fn root_request_has_no_extension() {
        let (src, cache) = roots();
        let r = resolve("/", &src, &cache);
        assert_eq!(r.request_path, "/");
        assert_eq!(r.extension, "");
        assert_eq!(r.source_path, src);
    }

    #[test]
    fn distinct_requests_get_distinct_artifacts() {
        let (src, cache) = roots();
        let jpg = resolve("/cat.jpg", &src, &cache);
        let png = resolve("/cat.png", &src, &cache);
        assert_ne!(jpg.artifact_path, png.artifact_path);
    }

    #[test]
    fn resolver_matches_free_function() {
        let (src, cache) = roots();
        let resolver = PathResolver::new(&src, &cache);
        assert_eq!(resolver.resolve("/a/b.png"), resolve("/a/b.png", &src, &cache));
        assert_eq!(resolver.source_root(), src.as_path());
        assert_eq!(resolver.cache_root(), cache.as_path());
    }
}
