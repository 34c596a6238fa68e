//! Defines the command-line arguments and subcommands for the Sigil CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "sigil",
    version,
    about = "Checked, compile-time macro expansion for Swift-style sources."
)]
pub struct SigilArgs {
    /// YAML engine configuration.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Symbol catalog (one name per line); overrides the configured one.
    #[arg(long, global = true, value_name = "FILE")]
    pub symbols: Option<PathBuf>,

    /// Expand the sites of each file on the thread pool.
    #[arg(long, global = true)]
    pub parallel: bool,

    /// Log engine decisions to stderr. `SIGIL_LOG` takes precedence.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// When to colorize output.
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Expand every macro site and print the synthesized code.
    Expand {
        /// Source files, or directories to search for `.swift` files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Report macro diagnostics only; exits non-zero if any site fails.
    Check {
        /// Source files, or directories to search for `.swift` files.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the syntax tree for a source file as JSON.
    Ast {
        /// The path to the source file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// List all available macros with their signatures.
    ListMacros,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}
