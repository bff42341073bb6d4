//! CLI entry point for the z80-decompile binary.

use std::env;
use std::io;

use decompiler::{parse_args, run, ParseResult, USAGE_TEXT};
use decompiler_core as _;
use log::LevelFilter;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(options)) => {
            init_logger(options.verbose);
            let result = run(&options, &mut io::stdout().lock());
            match result {
                Ok(_) => 0,
                Err(error) => {
                    eprintln!("error: {error}");
                    1
                }
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            if error.wants_usage() {
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
