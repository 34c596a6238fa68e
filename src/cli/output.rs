//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for colorizing output, formatting diagnostics,
//! and generating JSON. Every writer takes a `WriteColor`, so commands print
//! to a `StandardStream` and tests capture into a `termcolor::Buffer`.

use crate::cli::args::ColorMode;
use crate::diagnostics::MacroDiagnostic;
use crate::macros::{Expansion, MacroRegistry, MacroRole, SiteOutcome};
use serde_json::{json, Value};
use std::io;
use termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

// ============================================================================
// COLOR SELECTION
// ============================================================================

/// `auto` colors only when stdout is a terminal.
pub fn color_choice(mode: ColorMode) -> ColorChoice {
    match mode {
        ColorMode::Always => ColorChoice::Always,
        ColorMode::Never => ColorChoice::Never,
        ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
        ColorMode::Auto => ColorChoice::Never,
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

/// Totals over one CLI invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub sites: usize,
    pub rejected: usize,
    pub unreadable: usize,
}

impl Summary {
    pub fn record(&mut self, outcomes: &[SiteOutcome]) {
        self.files += 1;
        self.sites += outcomes.len();
        self.rejected += outcomes.iter().filter(|o| !o.is_success()).count();
    }

    pub fn is_clean(&self) -> bool {
        self.rejected == 0 && self.unreadable == 0
    }
}

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// `file:line:col #name` followed by the expansion or its diagnostics.
pub fn write_outcome(out: &mut dyn WriteColor, outcome: &SiteOutcome) -> io::Result<()> {
    let site = &outcome.site;
    let (line, column) = site.source.line_col(site.node.span.start);
    write!(out, "{}:{}:{} ", site.source.name(), line, column)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(out, "{}{}", sigil_for(site.role), site.macro_name)?;
    out.reset()?;

    match &outcome.result {
        Ok(expansion) => write_indented(out, &expansion_text(expansion)),
        Err(_) => {
            for diagnostic in outcome.diagnostics.iter() {
                out.write_all(b"    ")?;
                write_diagnostic(out, diagnostic)?;
            }
            Ok(())
        }
    }
}

/// One diagnostic on one line.
pub fn write_diagnostic(out: &mut dyn WriteColor, diagnostic: &MacroDiagnostic) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
    write!(out, "{}", diagnostic.render_plain())?;
    out.reset()?;
    writeln!(out)
}

pub fn write_macro_list(out: &mut dyn WriteColor, registry: &MacroRegistry) -> io::Result<()> {
    for entry in registry.entries() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(out, "{:<16}", entry.name)?;
        out.reset()?;
        writeln!(out, " {:<10} {}", entry.role().to_string(), entry.signature)?;
        writeln!(out, "{:<16}            {}", "", entry.summary)?;
    }
    Ok(())
}

pub fn write_summary(out: &mut dyn WriteColor, summary: &Summary) -> io::Result<()> {
    let color = if summary.is_clean() {
        Color::Green
    } else {
        Color::Red
    };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(
        out,
        "{} file(s), {} site(s), {} rejected",
        summary.files, summary.sites, summary.rejected
    )?;
    if summary.unreadable > 0 {
        write!(out, ", {} unreadable", summary.unreadable)?;
    }
    out.reset()?;
    writeln!(out)
}

/// Machine-readable form of one file's outcomes.
pub fn outcomes_json(file: &str, outcomes: &[SiteOutcome]) -> Value {
    let sites: Vec<Value> = outcomes
        .iter()
        .map(|outcome| {
            let site = &outcome.site;
            let (line, column) = site.source.line_col(site.node.span.start);
            let mut entry = json!({
                "macro": site.macro_name,
                "role": site.role,
                "line": line,
                "column": column,
            });
            match &outcome.result {
                Ok(expansion) => entry["expansion"] = json!(expansion_text(expansion)),
                Err(_) => entry["diagnostics"] = json!(outcome.diagnostics.as_slice()),
            }
            entry
        })
        .collect();
    json!({ "file": file, "sites": sites })
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn sigil_for(role: MacroRole) -> char {
    match role {
        MacroRole::Expression => '#',
        MacroRole::Accessor => '@',
    }
}

fn expansion_text(expansion: &Expansion) -> String {
    match expansion {
        Expansion::Accessors(accessors) if accessors.is_empty() => "(no accessors)".to_string(),
        other => other.render(),
    }
}

fn write_indented(out: &mut dyn WriteColor, text: &str) -> io::Result<()> {
    for line in text.lines() {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}
