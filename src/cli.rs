//! Command line lexing and argument validation.
//!
//! Lexing is deliberately loose: [`RawArgs`] records one entry per occurrence
//! of `-o`, `-p` and `--print`, holding either the value it carried or
//! [`NO_VALUE`], so that [`Args::validate`] can reject the bad shapes with a
//! precise reason.

use crate::model::InputToken;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Recorded for a flag given without a value. Command line arguments cannot
/// contain NUL, so it never collides with a real value.
pub const NO_VALUE: &str = "\0";

/// Raw argument bag as produced by the lexer.
#[derive(Parser, Debug)]
#[command(
    name = "merge-cobertura",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct RawArgs {
    /// package=file mappings or glob patterns
    pub inputs: Vec<String>,

    /// Output file, one entry per occurrence
    #[arg(
        short = 'o',
        num_args = 0..=1,
        default_missing_value = NO_VALUE,
        action = ArgAction::Append
    )]
    pub output: Vec<String>,

    /// `-p` occurrences; a value is only accepted as `-p=value`
    #[arg(
        short = 'p',
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = NO_VALUE,
        action = ArgAction::Append
    )]
    pub print_short: Vec<String>,

    /// `--print` occurrences; a value is only accepted as `--print=value`
    #[arg(
        long = "print",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = NO_VALUE,
        action = ArgAction::Append
    )]
    pub print_long: Vec<String>,
}

/// Malformed command line. The driver answers every variant with the usage text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("Unknown argument {0}")]
    UnknownArgument(String),

    #[error("No input files given")]
    MissingInputs,

    #[error("-o requires a file name")]
    OutputWithoutPath,

    #[error("-o can only be given once")]
    RepeatedOutput,

    #[error("{0} does not take a value")]
    PrintWithValue(&'static str),

    #[error("{0} can only be given once")]
    RepeatedPrint(&'static str),

    #[error("Invalid arguments: {0}")]
    Malformed(String),
}

impl RawArgs {
    /// Lex a full argv, program name first.
    pub fn lex<I, T>(argv: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(argv).map_err(usage_from_clap)
    }
}

fn usage_from_clap(err: clap::Error) -> UsageError {
    match err.kind() {
        ErrorKind::UnknownArgument => {
            let name = match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(arg)) => arg.trim_start_matches('-'),
                _ => "",
            };
            // "--foo=bar" is reported as "foo"
            let name = name.split('=').next().unwrap_or(name);
            UsageError::UnknownArgument(name.to_string())
        }
        kind => {
            let reason = kind.as_str().unwrap_or("unexpected argument");
            UsageError::Malformed(reason.to_string())
        }
    }
}

/// Validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Input tokens in command line order; never empty.
    pub inputs: Vec<InputToken>,
    /// Destination for the merged report.
    pub output: Option<PathBuf>,
    /// Whether a coverage summary was requested.
    pub print: bool,
}

impl Args {
    /// Check the shape of a raw argument bag.
    ///
    /// The program name is consumed by the lexer, so `raw.inputs` holds only
    /// user-supplied tokens and at least one is required.
    pub fn validate(raw: RawArgs) -> Result<Self, UsageError> {
        if raw.inputs.is_empty() {
            return Err(UsageError::MissingInputs);
        }

        let output = match raw.output.as_slice() {
            [] => None,
            [path] if path == NO_VALUE => return Err(UsageError::OutputWithoutPath),
            [path] => Some(PathBuf::from(path)),
            _ => return Err(UsageError::RepeatedOutput),
        };

        let print_short = check_print("-p", &raw.print_short)?;
        let print_long = check_print("--print", &raw.print_long)?;

        Ok(Self {
            inputs: raw.inputs.iter().map(|t| InputToken::classify(t)).collect(),
            output,
            print: print_short || print_long,
        })
    }
}

/// A print flag is a bare presence marker, given at most once.
fn check_print(flag: &'static str, occurrences: &[String]) -> Result<bool, UsageError> {
    match occurrences {
        [] => Ok(false),
        [value] if value == NO_VALUE => Ok(true),
        [_] => Err(UsageError::PrintWithValue(flag)),
        _ => Err(UsageError::RepeatedPrint(flag)),
    }
}

/// Version line, syntax and examples shown on any usage error.
pub fn usage() -> String {
    format!(
        "\
Version {version}
Syntax:    merge-cobertura [options]... [package=input...]
           merge-cobertura [options]... input-files...

Examples:  merge-cobertura -o output.xml package1=output1.xml package2=output2.xml
           merge-cobertura -o output.xml coverage/*.xml
           merge-cobertura -p package1=output1.xml package2=output2.xml

Options
-o FILE         Specify output file
-p, --print     print coverage report summary
",
        version = env!("CARGO_PKG_VERSION")
    )
}
