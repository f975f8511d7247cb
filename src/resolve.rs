//! Input resolution: turn validated input tokens into parsed, tagged documents.
//!
//! Explicit `package=file` mappings are read first, in token order. Pattern
//! tokens are then expanded together and every match is read in expansion
//! order. The first unreadable or malformed file aborts the whole run, so a
//! caller either gets every document or none.

use crate::document::CoverageDocument;
use crate::error::ResolveError;
use crate::expand::expand_patterns;
use crate::model::{package_from_parent, InputData, InputToken};
use std::fmt;
use std::path::Path;

/// Non-fatal condition reported while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A glob pattern matched no files.
    EmptyPattern(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyPattern(pattern) => {
                write!(f, "Warning: No files found matching pattern '{}'", pattern)
            }
        }
    }
}

/// Resolve input tokens into an ordered list of parsed documents.
///
/// Warnings go to `on_warning` as they happen, so they are not lost when a
/// later file turns out to be fatal.
pub fn resolve(
    tokens: &[InputToken],
    mut on_warning: impl FnMut(Warning),
) -> Result<Vec<InputData>, ResolveError> {
    let mut patterns = Vec::new();
    let mut inputs = Vec::new();

    for token in tokens {
        match token {
            InputToken::Explicit { package, file } => {
                tracing::debug!(package = %package, file = %file, "reading explicit input");
                let data = CoverageDocument::read(Path::new(file))?;
                inputs.push(InputData {
                    package_name: package.clone(),
                    file_name: file.clone(),
                    data,
                });
            }
            InputToken::Pattern(pattern) => patterns.push(pattern.as_str()),
        }
    }

    let files = expand_patterns(&patterns, |pattern| {
        on_warning(Warning::EmptyPattern(pattern.to_string()))
    })?;

    for path in files {
        let package_name = package_from_parent(&path);
        tracing::debug!(package = %package_name, file = %path.display(), "reading matched input");
        let data = CoverageDocument::read(&path)?;
        inputs.push(InputData {
            package_name,
            file_name: path.to_string_lossy().into_owned(),
            data,
        });
    }

    Ok(inputs)
}
