//! Glob pattern expansion.

use crate::error::ResolveError;
use std::path::PathBuf;

/// Expand glob patterns into file paths, in pattern order.
///
/// Each pattern's matches come in the glob walker's sorted order. Nothing is
/// deduplicated across patterns. A pattern that matches nothing is handed to
/// `on_empty` and expansion carries on with the next one.
pub fn expand_patterns<S: AsRef<str>>(
    patterns: &[S],
    mut on_empty: impl FnMut(&str),
) -> Result<Vec<PathBuf>, ResolveError> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = glob::glob(pattern).map_err(|source| ResolveError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let before = files.len();
        for entry in paths {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => {
                    tracing::debug!(path = %e.path().display(), error = %e, "skipping unreadable entry")
                }
            }
        }

        let matched = files.len() - before;
        if matched == 0 {
            on_empty(pattern);
        } else {
            tracing::debug!(pattern, matched, "expanded pattern");
        }
    }
    Ok(files)
}
