//! One decompile run: read the image, decode it, emit the listing.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use decompiler_core::{Decompiler, DecompilerConfig, PassOutcome, ADDRESS_SPACE_BYTES};
use log::{info, warn};

use crate::args::RunOptions;
use crate::errors::CliError;
use crate::output::{is_tape_image, resolve_output_path, write_console, write_new_file};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// How decoding ended.
    pub outcome: PassOutcome,
    /// Listing lines emitted.
    pub lines: usize,
    /// File written, when not printing to the console.
    pub written: Option<PathBuf>,
}

/// Runs the decompiler as configured by `options`.
///
/// Console output goes to `console`. On a decode failure the partial listing
/// is printed there before the error is returned.
///
/// # Errors
///
/// Returns [`CliError`] when the input cannot be read, decoding fails or
/// stops early without `--partial`, or the listing cannot be written.
pub fn run(options: &RunOptions, console: &mut impl Write) -> Result<RunSummary, CliError> {
    let image = fs::read(&options.input).map_err(|source| CliError::Io {
        path: options.input.clone(),
        source,
    })?;
    if !is_tape_image(&options.input) {
        warn!("{} does not look like a .tap image", options.input.display());
    }
    if image.len() > ADDRESS_SPACE_BYTES {
        warn!(
            "{} is {} bytes, larger than the 64K address space",
            options.input.display(),
            image.len()
        );
    }

    let config = DecompilerConfig::default().with_step_limit(options.step_limit);
    let mut decompiler =
        Decompiler::new(&image, options.load_point, options.start_offset, config)
            .map_err(CliError::Setup)?;
    let mut entries: BTreeSet<u16> = options.entries.iter().copied().collect();
    let mut memory: BTreeSet<u16> = options.memory.iter().copied().collect();

    let outcome = match decompiler.decode_to_fixpoint(&mut entries, &mut memory) {
        Ok(outcome) => outcome,
        Err(error) => {
            let io_error = |source| CliError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            };
            write_console(console, &decompiler.listing(), false).map_err(io_error)?;
            console.flush().map_err(io_error)?;
            return Err(CliError::Decode(Box::new(error)));
        }
    };

    if !outcome.is_finished() && !options.partial {
        return Err(CliError::Unfinished {
            steps: outcome.steps(),
            limit: options.step_limit,
        });
    }

    let listing = decompiler.listing();
    info!(
        "decoded {} instruction(s), {} entry point(s), {} memory location(s)",
        listing.len(),
        entries.len(),
        memory.len()
    );

    let written = match &options.output {
        Some(output) => {
            let path = resolve_output_path(&options.input, output, options.stamp_version);
            write_new_file(&path, &listing)?;
            info!("listing written to {}", path.display());
            Some(path)
        }
        None => {
            write_console(console, &listing, options.stamp_version).map_err(|source| {
                CliError::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            None
        }
    };

    Ok(RunSummary {
        outcome,
        lines: listing.len(),
        written,
    })
}
