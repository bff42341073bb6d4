//! Errors surfaced by the command-line front end.

use std::io;
use std::path::PathBuf;

use decompiler_core::{DecodeError, DecodeFault};
use thiserror::Error;

/// Everything that can stop a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),
    /// Reading or writing a file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The output file is already there.
    #[error("{} already exists, refusing to overwrite", path.display())]
    OutputExists {
        /// Path that would have been written.
        path: PathBuf,
    },
    /// The decompiler could not be set up for the image.
    #[error("cannot start decoding: {0}")]
    Setup(#[source] DecodeFault),
    /// A pass failed part way.
    #[error("{0}")]
    Decode(#[source] Box<DecodeError>),
    /// The step limit stopped decoding and `--partial` was not given.
    #[error("decoding stopped after {steps} instruction(s) at the step limit of {limit}; use --partial to keep the listing")]
    Unfinished {
        /// Instructions decoded across all passes.
        steps: usize,
        /// Per-pass step limit in effect.
        limit: usize,
    },
}

impl CliError {
    /// Whether the usage text should follow the message.
    #[must_use]
    pub const fn wants_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}
