//! Exclude-glob filtering for the watcher/reconciler walk.
//!
//! Grounded on the skip-reason reporting pattern used elsewhere in this
//! codebase: a small sortable enum distinguishes why a path was passed over,
//! so startup scans can report a deterministic, ordered skip summary instead
//! of a single opaque count.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Reason a candidate path did not enter the active set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    ExcludedByGlob,
    NotAFile,
}

impl SkipReason {
    pub fn sort_key(&self) -> u8 {
        match self {
            SkipReason::ExcludedByGlob => 0,
            SkipReason::NotAFile => 1,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SkipReason::ExcludedByGlob => "excluded by pattern",
            SkipReason::NotAFile => "not a regular file",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl PartialOrd for SkipReason {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SkipReason {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// A path skipped during a scan, paired with why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: String,
    pub reason: SkipReason,
}

impl SkippedPath {
    pub fn format_stderr(&self) -> String {
        format!("SKIP {}: {}", self.path, self.reason)
    }
}

/// Compiled exclude-glob set, built once at startup/config reload.
pub struct ExcludeFilter {
    set: GlobSet,
}

impl ExcludeFilter {
    /// Invalid individual patterns are skipped rather than rejecting the
    /// whole set; a typo in one glob should not disable every other
    /// exclusion (§4.9 config tolerance).
    pub fn new(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    tracing::warn!(pattern = %pattern, error = %err, "ignoring invalid exclude pattern");
                }
            }
        }
        let set = builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap());
        Self { set }
    }

    /// Returns a [`SkipReason`] when `path` should be skipped, `None` when it
    /// should be watched.
    pub fn check(&self, path: &Path) -> Option<SkipReason> {
        if self.set.is_match(path) {
            Some(SkipReason::ExcludedByGlob)
        } else {
            None
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn matches_git_directory() {
        let filter = ExcludeFilter::new(&["**/.git/**".to_string()]);
        assert!(filter.is_excluded(&PathBuf::from("repo/.git/HEAD")));
        assert!(!filter.is_excluded(&PathBuf::from("repo/src/main.rs")));
    }

    #[test]
    fn invalid_pattern_is_skipped_not_fatal() {
        let filter = ExcludeFilter::new(&["[".to_string(), "**/target/**".to_string()]);
        assert!(filter.is_excluded(&PathBuf::from("proj/target/debug/x")));
    }

    #[test]
    fn skip_reason_sorts_glob_before_not_a_file() {
        assert!(SkipReason::ExcludedByGlob < SkipReason::NotAFile);
    }

    #[test]
    fn format_stderr_matches_shape() {
        let skipped = SkippedPath {
            path: "target/debug/x".to_string(),
            reason: SkipReason::ExcludedByGlob,
        };
        assert_eq!(skipped.format_stderr(), "SKIP target/debug/x: excluded by pattern");
    }
}
