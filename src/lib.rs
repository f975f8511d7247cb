//! Input resolution for merge-cobertura.
//!
//! Turns command line tokens into an ordered list of parsed Cobertura
//! documents, each tagged with a package name:
//!
//! - `package=file` maps a file to a package explicitly
//! - anything else is a glob; each match is named after its parent directory
//!
//! Explicit mappings always come first, then pattern matches.

pub mod cli;
pub mod document;
pub mod error;
pub mod expand;
pub mod model;
pub mod resolve;

pub use cli::{Args, RawArgs, UsageError};
pub use document::{CoverageDocument, XmlError};
pub use error::ResolveError;
pub use model::{Handoff, InputData, InputToken};
pub use resolve::{resolve, Warning};
