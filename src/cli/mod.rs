//! The Sigil Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions. Exit codes: `0` when every site expanded,
//! `1` when a site was rejected or a file could not be read or parsed, `2`
//! when the run could not proceed at all (bad configuration, host contract
//! violation, broken output).

use crate::cli::args::{Command, SigilArgs};
use crate::cli::output::Summary;
use crate::config::{EngineConfig, LogLevel};
use crate::errors::{print_error, SigilError};
use crate::macros::{MacroExpander, MacroRegistry, SiteOutcome};
use crate::sites::collect_sites;
use crate::syntax::parse_source;
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::StandardStream;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use walkdir::WalkDir;

pub mod args;
pub mod output;

/// Extension of the source files picked up from directories.
const SOURCE_EXTENSION: &str = "swift";

/// Environment variable holding a tracing filter; wins over every flag.
pub const LOG_ENV: &str = "SIGIL_LOG";

/// The main entry point for the CLI. Returns the process exit code.
pub fn run(args: SigilArgs) -> i32 {
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(error) => {
            init_logging(args.verbose, LogLevel::default());
            print_error(error);
            return 2;
        }
    };
    init_logging(args.verbose, config.logging.level);

    let result = match &args.command {
        Command::Expand { paths, json } => handle_expand(&args, &config, paths, *json),
        Command::Check { paths } => handle_check(&args, &config, paths),
        Command::Ast { file } => handle_ast(file),
        Command::ListMacros => handle_list_macros(&args),
    };

    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(error) => {
            print_error(error);
            2
        }
    }
}

// ============================================================================
// SETUP
// ============================================================================

fn load_config(args: &SigilArgs) -> Result<EngineConfig, SigilError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(symbols) = &args.symbols {
        config.symbols.catalog = Some(absolute(symbols));
    }
    Ok(config)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(dir) => dir.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn init_logging(verbose: bool, level: LogLevel) {
    let fallback = if verbose {
        LogLevel::Debug.directive()
    } else {
        level.directive()
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter);

    // A second initialisation (e.g. in-process tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Handles the `expand` subcommand.
fn handle_expand(
    args: &SigilArgs,
    config: &EngineConfig,
    paths: &[PathBuf],
    json: bool,
) -> Result<bool, SigilError> {
    let expander = MacroExpander::standard(config.services()?);
    let mut stdout = StandardStream::stdout(output::color_choice(args.color));
    let mut summary = Summary::default();
    let mut reports = Vec::new();

    for path in source_files(paths)? {
        let Some(outcomes) = expand_file(&expander, &path, args.parallel, &mut summary)? else {
            continue;
        };
        if json {
            reports.push(output::outcomes_json(&path.display().to_string(), &outcomes));
            continue;
        }
        for outcome in &outcomes {
            output::write_outcome(&mut stdout, outcome).map_err(output_error)?;
        }
    }

    if json {
        let text = serde_json::to_string_pretty(&reports)
            .map_err(|e| SigilError::config(format!("cannot encode JSON: {e}")))?;
        writeln!(stdout, "{text}").map_err(output_error)?;
    } else {
        output::write_summary(&mut stdout, &summary).map_err(output_error)?;
    }
    Ok(summary.is_clean())
}

/// Handles the `check` subcommand.
fn handle_check(args: &SigilArgs, config: &EngineConfig, paths: &[PathBuf]) -> Result<bool, SigilError> {
    let expander = MacroExpander::standard(config.services()?);
    let mut stdout = StandardStream::stdout(output::color_choice(args.color));
    let mut summary = Summary::default();

    for path in source_files(paths)? {
        let Some(outcomes) = expand_file(&expander, &path, args.parallel, &mut summary)? else {
            continue;
        };
        for diagnostic in outcomes.iter().flat_map(|o| o.diagnostics.iter()) {
            output::write_diagnostic(&mut stdout, diagnostic).map_err(output_error)?;
        }
    }

    output::write_summary(&mut stdout, &summary).map_err(output_error)?;
    Ok(summary.is_clean())
}

/// Handles the `ast` subcommand.
fn handle_ast(path: &Path) -> Result<bool, SigilError> {
    let text = read_source(path)?;
    let file = parse_source(&path.display().to_string(), &text)?;
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| SigilError::config(format!("cannot encode JSON: {e}")))?;
    println!("{json}");
    Ok(true)
}

/// Handles the `list-macros` subcommand.
fn handle_list_macros(args: &SigilArgs) -> Result<bool, SigilError> {
    let mut stdout = StandardStream::stdout(output::color_choice(args.color));
    output::write_macro_list(&mut stdout, MacroRegistry::standard()).map_err(output_error)?;
    Ok(true)
}

// ============================================================================
// PIPELINE HELPERS
// ============================================================================

/// Parses and expands one file. Unreadable or unparsable files are reported
/// and counted, not fatal; a host contract violation is.
fn expand_file(
    expander: &MacroExpander<'_>,
    path: &Path,
    parallel: bool,
    summary: &mut Summary,
) -> Result<Option<Vec<SiteOutcome>>, SigilError> {
    let parsed = read_source(path).and_then(|text| parse_source(&path.display().to_string(), &text));
    let file = match parsed {
        Ok(file) => file,
        Err(error) => {
            summary.unreadable += 1;
            print_error(error);
            return Ok(None);
        }
    };

    let sites = collect_sites(&file, expander.registry());
    debug!("{}: {} expansion site(s)", path.display(), sites.len());
    let outcomes = if parallel {
        expander.expand_all_parallel(&sites)?
    } else {
        expander.expand_all(&sites)?
    };
    summary.record(&outcomes);
    Ok(Some(outcomes))
}

/// Files named directly, plus every `.swift` file under named directories,
/// in a stable order.
fn source_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, SigilError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let location = e.path().unwrap_or(path.as_path()).display().to_string();
                SigilError::io(location, e.into())
            })?;
            let is_source = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == SOURCE_EXTENSION);
            if is_source {
                found.push(entry.into_path());
            }
        }
        info!("Found {} source file(s) under {}", found.len(), path.display());
        files.extend(found);
    }
    Ok(files)
}

fn read_source(path: &Path) -> Result<String, SigilError> {
    std::fs::read_to_string(path).map_err(|e| SigilError::io(path.display().to_string(), e))
}

fn output_error(error: std::io::Error) -> SigilError {
    SigilError::io("<stdout>", error)
}
