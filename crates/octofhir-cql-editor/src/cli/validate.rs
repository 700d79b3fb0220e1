//! Validate command implementation

use super::output::{self, OutputFormat};
use crate::aggregator::ErrorAggregator;
use crate::annotations::{EditorView, ValidationSummary};
use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use octofhir_cql_editor_diagnostics::NormalizedError;
use octofhir_cql_editor_parser::parse;
use octofhir_cql_editor_services::{DataModel, EditorConfig, SessionContext};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Configuration for validate command
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    pub files: Vec<PathBuf>,
    pub editor: EditorConfig,
    pub session: SessionContext,
    /// Forces the data model instead of reading it from the `using` statement
    pub model: Option<DataModel>,
    pub format: OutputFormat,
    pub strict: bool,
    pub verbose: bool,
}

/// Validation result for a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub model: DataModel,
    pub errors: Vec<NormalizedError>,
    /// `None` for a blank file
    pub summary: Option<ValidationSummary>,
}

/// Totals over every validated file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationTotals {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl ValidationTotals {
    /// Whether the run should exit with a failure status
    pub fn is_failure(&self, strict: bool) -> bool {
        self.errors > 0 || (strict && self.warnings > 0)
    }

    fn add(&mut self, report: &FileReport) {
        self.files += 1;
        if let Some(summary) = report.summary {
            self.errors += summary.errors;
            self.warnings += summary.warnings;
        }
    }
}

/// Validate CQL files against the configured services and print the results
pub async fn validate(config: &ValidateConfig) -> Result<ValidationTotals> {
    if config.files.is_empty() {
        anyhow::bail!("No files specified for validation");
    }
    config.editor.validate()?;
    let aggregator = ErrorAggregator::from_config(&config.editor.services)?;

    let reports = validate_files(&aggregator, config).await?;
    let mut totals = ValidationTotals::default();
    for report in &reports {
        totals.add(report);
    }

    match config.format {
        OutputFormat::Json => println!("{}", output::format_json(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                print_report(report);
            }
            print_totals(&totals, config.strict);
        }
    }
    Ok(totals)
}

/// Run the aggregator over every file in order
pub async fn validate_files(
    aggregator: &ErrorAggregator,
    config: &ValidateConfig,
) -> Result<Vec<FileReport>> {
    let mut reports = Vec::with_capacity(config.files.len());
    for file in &config.files {
        if config.verbose {
            eprintln!("Validating: {}", file.display());
        }
        let content = fs::read_to_string(file)
            .with_context(|| format!("Failed to read file: {}", file.display()))?;
        let parse_result = parse(&content);
        let model = config
            .model
            .or_else(|| DataModel::detect(&parse_result))
            .unwrap_or(config.session.model);
        debug!("validating {} as {model}", file.display());

        let session = config.session.clone().with_model(model);
        let outcome = aggregator
            .aggregate(&content, &parse_result, &session)
            .await
            .with_context(|| format!("Validation of {} failed", file.display()))?;
        let view = EditorView::from_outcome(outcome.as_deref());

        reports.push(FileReport {
            file: file.display().to_string(),
            model,
            errors: outcome.unwrap_or_default(),
            summary: view.summary,
        });
    }
    Ok(reports)
}

fn print_report(report: &FileReport) {
    let clean = report.errors.is_empty();
    let status = if clean {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    let summary = report
        .summary
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Nothing to validate".to_string());
    println!("{} {} ({})", status, report.file.cyan(), summary);

    for error in &report.errors {
        println!("{}", output::format_diagnostic(&report.file, error));
    }
}

fn print_totals(totals: &ValidationTotals, strict: bool) {
    println!();
    if totals.errors == 0 && totals.warnings == 0 {
        println!(
            "{}",
            output::format_success(&format!(
                "All {} file(s) validated successfully",
                totals.files
            ))
        );
        return;
    }

    let mut parts = Vec::new();
    if totals.errors > 0 {
        parts.push(format!("{} error(s)", totals.errors).red().to_string());
    }
    if totals.warnings > 0 {
        parts.push(format!("{} warning(s)", totals.warnings).yellow().to_string());
    }
    eprintln!(
        "{} Found {}",
        "Validation failed:".red().bold(),
        parts.join(", ")
    );
    if strict && totals.warnings > 0 {
        eprintln!("{}", "Strict mode: treating warnings as errors".yellow());
    }
}
