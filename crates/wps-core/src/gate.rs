//! # Extension Gate
//!
//! Validates a request's file extension against the configured allow-list.
//! Matching is exact and case-sensitive: an allow-list of `["jpg"]` rejects
//! `JPG`. A rejected request ends with HTTP 403 and no further processing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Set of permitted file extensions, without leading dots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    /// Build an allow-list from any collection of extensions.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(extensions.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated list such as `jpg,png,jpeg`.
    ///
    /// Surrounding whitespace is trimmed and empty items are skipped.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(
            csv.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
    }

    /// Whether `extension` is permitted. The empty extension never is.
    pub fn is_allowed(&self, extension: &str) -> bool {
        !extension.is_empty() && self.0.contains(extension)
    }

    /// Iterate the permitted extensions in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for AllowList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items: Vec<&str> = self.iter().collect();
        f.write_str(&items.join(","))
    }
}
