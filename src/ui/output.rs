//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout; notes, warnings and diagnostics go to stderr.
//! Quiet mode only silences notes and warnings, never results. When
//! `--json` is enabled, results are printed as pretty JSON.

use std::fmt::Display;

use serde::Serialize;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - results only
    Quiet,
    /// Normal mode - results plus notes and warnings
    Normal,
}

impl Verbosity {
    /// Create verbosity from the `--quiet` flag. Debug detail goes
    /// through the logger, not through this setting.
    pub fn from_flags(quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a result line.
pub fn print(message: impl Display) {
    println!("{}", message);
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a note to stderr, e.g. about an absent result (respects quiet mode).
pub fn note(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items on one line, or a placeholder when empty.
pub fn format_inline<T: Display>(items: &[T], empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
