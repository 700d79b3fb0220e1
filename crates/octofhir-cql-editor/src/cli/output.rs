//! Output formatting utilities

use anyhow::{Context, Result};
use colored::Colorize;
use octofhir_cql_editor_diagnostics::NormalizedError;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown output format '{other}' (expected text or json)"),
        }
    }
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(std::io::stdout().is_terminal()),
    }
}

/// Format an error for display
pub fn format_error(error: &anyhow::Error) -> String {
    format!("{} {:#}", "Error:".red().bold(), error)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Format diagnostic information (file:line:col)
pub fn format_location(file: &str, line: u32, col: u32) -> String {
    format!("{}:{}:{}", file.cyan(), line, col)
}

/// Format one normalized error as `severity file:line:col [source] message`
pub fn format_diagnostic(file: &str, error: &NormalizedError) -> String {
    format!(
        "  {} {} [{}] {}",
        error.severity.colorize(),
        format_location(file, error.start_line, error.start_char),
        error.source,
        error.message
    )
}

/// Serialize a report as pretty JSON
pub fn format_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize JSON")
}
