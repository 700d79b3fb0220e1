//! Parse command implementation
//!
//! Reports the declarations and syntax errors of a CQL file without
//! contacting any service.

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use octofhir_cql_editor_diagnostics::NormalizedError;
use octofhir_cql_editor_parser::{ParseResult, parse};
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;

/// Configuration for parse command
#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub file: PathBuf,
    pub format: OutputFormat,
}

/// Parse a CQL file and print its declarations.
///
/// Returns `true` when the file has syntax errors.
pub fn run(config: &ParseConfig) -> Result<bool> {
    let content = fs::read_to_string(&config.file)
        .with_context(|| format!("Failed to read file: {}", config.file.display()))?;
    let result = parse(&content);

    let report = match config.format {
        OutputFormat::Json => output::format_json(&result)?,
        OutputFormat::Text => render_report(&config.file.display().to_string(), &result),
    };
    println!("{report}");
    Ok(result.has_syntax_errors())
}

/// Human-readable declaration report
pub fn render_report(file: &str, result: &ParseResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", file.cyan().bold());

    match &result.library {
        Some(library) => {
            let _ = writeln!(
                out,
                "  library {} version {}",
                library.name,
                library.version.as_deref().unwrap_or("(no version)")
            );
        }
        None => {
            let _ = writeln!(out, "  (no library declaration)");
        }
    }
    for using in &result.usings {
        let _ = writeln!(
            out,
            "  using {} {}",
            using.model,
            using.version.as_deref().unwrap_or("")
        );
    }

    let counts = [
        ("includes", result.includes.len()),
        ("code systems", result.code_systems.len()),
        ("value sets", result.value_sets.len()),
        ("codes", result.codes.len()),
        ("concepts", result.concepts.len()),
        ("parameters", result.parameters.len()),
        ("definitions", result.definitions.len()),
    ];
    for (label, count) in counts {
        let _ = writeln!(out, "  {label}: {count}");
    }

    if result.syntax_errors.is_empty() {
        let _ = write!(out, "{}", output::format_success("No syntax errors"));
    } else {
        let _ = writeln!(out, "{}", "Syntax errors:".red().bold());
        for error in &result.syntax_errors {
            let normalized = NormalizedError::from(error);
            let _ = writeln!(
                out,
                "{} {}",
                output::format_diagnostic(file, &normalized),
                format!("({})", error.code).dimmed()
            );
        }
    }
    out.trim_end().to_string()
}
