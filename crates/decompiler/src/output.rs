//! Where listings go and how they are written.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::errors::CliError;

/// Tool version stamped into output with `--stamp-version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns `true` when `path` has a `.tap` extension, in any case.
#[must_use]
pub fn is_tape_image(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("tap"))
}

fn names_directory(path: &Path) -> bool {
    let text = path.as_os_str().to_string_lossy();
    path.is_dir() || text.ends_with('/') || text.ends_with(MAIN_SEPARATOR)
}

/// Resolves the listing file for `input` given the `-o` argument.
///
/// A directory argument, either existing or spelled with a trailing
/// separator, receives `<input name without .tap>.txt`, or
/// `<name>.v<version>.txt` when stamping. Anything else is used as is.
#[must_use]
pub fn resolve_output_path(input: &Path, output: &Path, stamp_version: bool) -> PathBuf {
    if !names_directory(output) {
        return output.to_path_buf();
    }
    let name = if is_tape_image(input) {
        input.file_stem()
    } else {
        input.file_name()
    };
    let base = name.map_or_else(|| "listing".to_string(), |n| n.to_string_lossy().into_owned());
    let file = if stamp_version {
        format!("{base}.v{VERSION}.txt")
    } else {
        format!("{base}.txt")
    };
    output.join(file)
}

/// Writes `lines` to a new file at `path`, creating missing parent
/// directories.
///
/// # Errors
///
/// Returns [`CliError::OutputExists`] if `path` already exists, and
/// [`CliError::Io`] for any other I/O failure.
pub fn write_new_file(path: &Path, lines: &[String]) -> Result<(), CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                CliError::OutputExists {
                    path: path.to_path_buf(),
                }
            } else {
                io_error(source)
            }
        })?;
    let mut writer = BufWriter::new(file);
    write_lines(&mut writer, lines).map_err(io_error)?;
    writer.flush().map_err(io_error)
}

/// Writes the listing to the console, prefixed by a version line when
/// stamping.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_console(
    console: &mut impl Write,
    lines: &[String],
    stamp_version: bool,
) -> io::Result<()> {
    if stamp_version {
        writeln!(console, "; v{VERSION}")?;
    }
    write_lines(console, lines)
}

fn write_lines(writer: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
