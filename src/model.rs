//! Input tokens and resolved input records.

use crate::document::CoverageDocument;
use serde::Serialize;
use std::path::Path;

/// A positional input token, classified by the presence of `=`.
///
/// Each variant carries its own package-name rule: explicit mappings use the
/// literal left-hand side, patterns name every match after its parent
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputToken {
    /// `package=file`, split on the first `=`.
    Explicit { package: String, file: String },
    /// Anything without `=`, expanded as a filesystem glob.
    Pattern(String),
}

impl InputToken {
    /// Classify a raw token. A token containing `=` is never a pattern.
    pub fn classify(token: &str) -> Self {
        match token.split_once('=') {
            Some((package, file)) => InputToken::Explicit {
                package: package.to_string(),
                file: file.to_string(),
            },
            None => InputToken::Pattern(token.to_string()),
        }
    }
}

/// Package name for a pattern-derived file: basename of its parent directory.
///
/// "coverage/a/cov.xml" → "a". A bare file name has the current directory
/// as parent and yields ".". A parent without a basename ("..", "/") is
/// returned as written.
pub fn package_from_parent(path: &Path) -> String {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => ".".to_string(),
        Some(parent) => match parent.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => parent.to_string_lossy().into_owned(),
        },
        None => path.to_string_lossy().into_owned(),
    }
}

/// One parsed coverage file, tagged with its package name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    pub package_name: String,
    pub file_name: String,
    pub data: CoverageDocument,
}

/// Everything the merge stage needs from one invocation.
#[derive(Debug, Serialize)]
pub struct Handoff<'a> {
    /// Destination for the merged report (`-o`).
    pub output: Option<&'a Path>,
    /// Whether a summary was requested (`-p` / `--print`).
    pub print: bool,
    pub inputs: &'a [InputData],
}
