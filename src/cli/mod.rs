//! The `oasm` command-line interface.
//!
//! Parses arguments, installs logging, and dispatches to the library.
//! Any error is printed through miette and ends the process with status 1.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cache::{load_or_parse, read_source};
use crate::cli::args::{Command, OasmArgs};
use crate::cli::output::{print_keywords, print_tree, Status};
use crate::errors::{print_error, ErrorKind, OasmError};
use crate::project::parse_project_with;
use crate::syntax::{lexicon, parse_to_json};

pub mod args;
pub mod output;

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

pub fn run() {
    let args = OasmArgs::parse();
    init_tracing(args.verbose);
    let mut status = Status::new(args.color.choice());

    let result = match args.command {
        Command::Parse { file, cache } => parse_file(&file, cache.as_deref()),
        Command::Check { files } => check_files(&files, &mut status),
        Command::Build {
            source_dir,
            cache_dir,
        } => build_project(&source_dir, &cache_dir, &mut status),
        Command::Keywords => {
            print_keywords(lexicon().reserved_words());
            Ok(())
        }
    };

    if let Err(e) = result {
        print_error(e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins unless `--verbose` asks for debug output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("oasm=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// COMMANDS
// ============================================================================

fn parse_file(file: &Path, cache: Option<&Path>) -> Result<(), OasmError> {
    let file = resolve_path(file)?;
    let json = match cache {
        Some(cache) => load_or_parse(&file, cache)?.json,
        None => parse_to_json(&read_source(&file)?)?,
    };
    print_tree(&json);
    Ok(())
}

fn check_files(files: &[PathBuf], status: &mut Status) -> Result<(), OasmError> {
    let mut failed = 0;
    for file in files {
        status.begin("Checking", &file.display().to_string());
        match read_source(file).and_then(|source| parse_to_json(&source)) {
            Ok(_) => status.done("ok"),
            Err(e) => {
                status.failed("error");
                print_error(e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        process::exit(1);
    }
    Ok(())
}

fn build_project(source_dir: &Path, cache_dir: &Path, status: &mut Status) -> Result<(), OasmError> {
    let report = parse_project_with(source_dir, cache_dir, |file| status.file(file))?;
    status.summary(&report);
    Ok(())
}

/// `-` means the path arrives as one line on standard input.
fn resolve_path(file: &Path) -> Result<PathBuf, OasmError> {
    if file != Path::new("-") {
        return Ok(file.to_path_buf());
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| OasmError::io(Path::new("<stdin>"), &e))?;
    let path = line.trim_end_matches(['\n', '\r']);
    if path.is_empty() {
        return Err(OasmError::unspanned(
            ErrorKind::Io {
                path: "<stdin>".into(),
                message: "expected a file path on standard input".into(),
            },
            "<stdin>",
            "io",
        ));
    }
    Ok(PathBuf::from(path))
}
