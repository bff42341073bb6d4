//! Command-line front end for the Z80 decompiler: argument parsing, output
//! placement and console/file writing around [`decompiler_core`].

use env_logger as _;

/// Command-line parsing.
pub mod args;
/// One decompile run.
pub mod decompile;
/// CLI error type.
pub mod errors;
/// Output path resolution and writers.
pub mod output;

pub use args::{parse_args, ParseResult, RunOptions, USAGE_TEXT};
pub use decompile::{run, RunSummary};
pub use errors::CliError;

#[cfg(test)]
use tempfile as _;
