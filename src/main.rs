//! merge-cobertura: resolve coverage inputs for merging.
//!
//! Validates the command line, reads every input file and writes the
//! resolved inputs as JSON to stdout for the merge stage:
//!
//! - `merge-cobertura -o out.xml pkg1=cov1.xml pkg2=cov2.xml`
//! - `merge-cobertura -o out.xml coverage/*/cobertura.xml`

use anyhow::{Context, Result};
use merge_cobertura::{cli, resolve, Args, Handoff, RawArgs, ResolveError, UsageError};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let args = match RawArgs::lex(std::env::args_os()).and_then(Args::validate) {
        Ok(args) => args,
        Err(e) => return usage_failure(&e),
    };

    let inputs = match resolve(&args.inputs, |warning| eprintln!("{}", warning)) {
        Ok(inputs) => inputs,
        Err(e) => return resolve_failure(&e),
    };

    let handoff = Handoff {
        output: args.output.as_deref(),
        print: args.print,
        inputs: &inputs,
    };
    if let Err(e) = write_handoff(&handoff) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Print the reason and the usage text. Nothing has been read yet.
fn usage_failure(err: &UsageError) -> ExitCode {
    eprintln!("{}\n", err);
    print!("{}", cli::usage());
    ExitCode::FAILURE
}

fn resolve_failure(err: &ResolveError) -> ExitCode {
    eprintln!("error: {}", err);
    if let Some(path) = err.path() {
        eprintln!("Unable to read file {}", path.display());
    }
    ExitCode::FAILURE
}

fn write_handoff(handoff: &Handoff<'_>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, handoff).context("failed to serialize inputs")?;
    writeln!(out).context("failed to write to stdout")?;
    Ok(())
}
