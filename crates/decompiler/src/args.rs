//! Command-line parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use decompiler_core::config::DEFAULT_STEP_LIMIT;

use crate::errors::CliError;

/// Help text printed for `-h` and after usage errors.
pub const USAGE_TEXT: &str = "\
Usage: z80-decompile <input> --load-point <addr> [options]

Options:
  --load-point <addr>   Address the first image byte is loaded at (required)
  --start-offset <n>    Bytes to skip before the image starts (default 0)
  --entry <addr>        Extra entry point, may be repeated
  --memory <addr>       Extra memory location of interest, may be repeated
  --limit <n>           Instructions decoded per pass (default 10000)
  -o, --output <path>   Write the listing to a file or into a directory
  --partial             Keep the listing even if decoding did not finish
  --stamp-version       Add the tool version to the output
  -v, --verbose         Log pass progress to stderr
  -h, --help            Show this help message

Numbers are decimal, 0x-prefixed hex, or hex with a trailing h.

Examples:
  z80-decompile game.tap --load-point 0x5e27 --start-offset 91
  z80-decompile game.tap --load-point 5e27h -o listings/
";

/// Options for one decompile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Image file.
    pub input: PathBuf,
    /// Address of the first decoded byte.
    pub load_point: u16,
    /// File bytes skipped before decoding.
    pub start_offset: usize,
    /// Caller-supplied entry points.
    pub entries: Vec<u16>,
    /// Caller-supplied memory locations.
    pub memory: Vec<u16>,
    /// Per-pass step limit.
    pub step_limit: usize,
    /// Output file or directory; console when absent.
    pub output: Option<PathBuf>,
    /// Write the listing even when decoding stopped early.
    pub partial: bool,
    /// Stamp the tool version into the output.
    pub stamp_version: bool,
    /// Debug logging.
    pub verbose: bool,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum ParseResult {
    /// Run the decompiler.
    Run(RunOptions),
    /// Print help.
    Help,
}

/// Parses a number given as decimal, `0x` hex, or hex with an `h` suffix.
#[must_use]
pub fn parse_number(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    if let Some(hex) = text.strip_suffix('h').or_else(|| text.strip_suffix('H')) {
        return u64::from_str_radix(hex, 16).ok();
    }
    text.parse().ok()
}

fn address_value(flag: &str, value: Option<OsString>) -> Result<u16, CliError> {
    let text = flag_value(flag, value)?;
    parse_number(&text)
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| CliError::Usage(format!("{flag} expects a 16-bit address, got {text}")))
}

fn count_value(flag: &str, value: Option<OsString>) -> Result<usize, CliError> {
    let text = flag_value(flag, value)?;
    parse_number(&text)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| CliError::Usage(format!("{flag} expects a number, got {text}")))
}

fn flag_value(flag: &str, value: Option<OsString>) -> Result<String, CliError> {
    value
        .map(|v| v.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::Usage(format!("missing value for {flag}")))
}

/// Parses the arguments following the program name.
///
/// # Errors
///
/// Returns [`CliError::Usage`] for unknown options, missing or malformed
/// values, and a missing input path or load point.
#[allow(clippy::while_let_on_iterator)]
pub fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, CliError> {
    let mut input: Option<PathBuf> = None;
    let mut load_point: Option<u16> = None;
    let mut start_offset = 0;
    let mut entries = Vec::new();
    let mut memory = Vec::new();
    let mut step_limit = DEFAULT_STEP_LIMIT;
    let mut output: Option<PathBuf> = None;
    let mut partial = false;
    let mut stamp_version = false;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        let flag = arg.to_string_lossy().into_owned();
        match flag.as_str() {
            "-h" | "--help" => return Ok(ParseResult::Help),
            "-v" | "--verbose" => verbose = true,
            "--partial" => partial = true,
            "--stamp-version" => stamp_version = true,
            "--load-point" => load_point = Some(address_value(&flag, args.next())?),
            "--start-offset" => start_offset = count_value(&flag, args.next())?,
            "--entry" => entries.push(address_value(&flag, args.next())?),
            "--memory" => memory.push(address_value(&flag, args.next())?),
            "--limit" => step_limit = count_value(&flag, args.next())?,
            "-o" | "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliError::Usage(format!("missing value for {flag}")))?;
                output = Some(PathBuf::from(value));
            }
            other if other.starts_with('-') => {
                return Err(CliError::Usage(format!("unknown option: {other}")));
            }
            _ => {
                if input.is_some() {
                    return Err(CliError::Usage("multiple input paths provided".to_string()));
                }
                input = Some(PathBuf::from(arg));
            }
        }
    }

    let input = input.ok_or_else(|| CliError::Usage("missing input path".to_string()))?;
    let load_point =
        load_point.ok_or_else(|| CliError::Usage("missing --load-point".to_string()))?;
    Ok(ParseResult::Run(RunOptions {
        input,
        load_point,
        start_offset,
        entries,
        memory,
        step_limit,
        output,
        partial,
        stamp_version,
        verbose,
    }))
}
