//! Command-line arguments for `oasm`, declared with clap's derive API.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use termcolor::ColorChoice;

#[derive(Debug, Parser)]
#[command(
    name = "oasm",
    version,
    about = "Parse Organised Assembly source into position-annotated JSON parse trees."
)]
pub struct OasmArgs {
    /// Log parser and cache activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// When to color status output.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse one file and print its tree as a single JSON line.
    Parse {
        /// Source file, or `-` to read the path from standard input.
        #[arg(required = true)]
        file: PathBuf,
        /// Reuse or refresh a cached tree at this path.
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// Parse files and report which ones are well-formed.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Parse every `.oasm` file under a directory into a mirrored cache tree.
    Build {
        #[arg(required = true)]
        source_dir: PathBuf,
        #[arg(required = true)]
        cache_dir: PathBuf,
    },
    /// List the reserved words, one per line.
    Keywords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}
