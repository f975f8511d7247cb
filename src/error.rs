//! Fatal resolution errors.

use crate::document::XmlError;
use std::path::PathBuf;

/// A file or pattern that stops input resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: XmlError,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl ResolveError {
    /// The offending file, if the error is tied to one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ResolveError::Read { path, .. } | ResolveError::Parse { path, .. } => Some(path),
            ResolveError::InvalidPattern { .. } => None,
        }
    }
}
