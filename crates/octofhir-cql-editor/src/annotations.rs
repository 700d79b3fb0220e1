//! Editor projections of normalized errors
//!
//! Editor rows are 0-based while error lines are 1-based; columns are used
//! as they are. Annotations and markers are recomputed from scratch for every
//! aggregation cycle.

use octofhir_cql_editor_diagnostics::{NormalizedError, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CSS class of the underline marker
pub const MARKER_CLASS: &str = "editor-error-underline";
/// Marker kind understood by the editor widget
pub const MARKER_KIND: &str = "text";

/// Gutter annotation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Error,
    Warning,
}

impl From<Severity> for AnnotationType {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => AnnotationType::Error,
            Severity::Warning | Severity::Info => AnnotationType::Warning,
        }
    }
}

impl AnnotationType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AnnotationType::Error => "error",
            AnnotationType::Warning => "warning",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gutter annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorAnnotation {
    /// 0-based row
    pub row: u32,
    pub column: u32,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    pub text: String,
}

impl From<&NormalizedError> for EditorAnnotation {
    fn from(error: &NormalizedError) -> Self {
        Self {
            row: error.start_line.saturating_sub(1),
            column: error.start_char,
            kind: error.severity.into(),
            text: format!("{}: {}", error.source, error.message),
        }
    }
}

/// A 0-based row range in editor coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorRange {
    pub start_row: u32,
    pub start_column: u32,
    pub end_row: u32,
    pub end_column: u32,
}

/// An underline marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorMarker {
    pub range: EditorRange,
    pub class_name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&NormalizedError> for EditorMarker {
    fn from(error: &NormalizedError) -> Self {
        Self {
            range: EditorRange {
                start_row: error.start_line.saturating_sub(1),
                start_column: error.start_char,
                end_row: error.end_line.saturating_sub(1),
                end_column: error.end_char,
            },
            class_name: MARKER_CLASS.to_string(),
            kind: MARKER_KIND.to_string(),
        }
    }
}

pub fn to_annotations(errors: &[NormalizedError]) -> Vec<EditorAnnotation> {
    errors.iter().map(EditorAnnotation::from).collect()
}

pub fn to_markers(errors: &[NormalizedError]) -> Vec<EditorMarker> {
    errors.iter().map(EditorMarker::from).collect()
}

/// Summary header counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub errors: usize,
    pub warnings: usize,
}

impl ValidationSummary {
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total() {
            0 => write!(f, "No errors found"),
            1 => write!(f, "1 issue found"),
            n => write!(f, "{n} issues found"),
        }
    }
}

/// Everything the editor renders for one aggregation outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorView {
    pub annotations: Vec<EditorAnnotation>,
    pub markers: Vec<EditorMarker>,
    /// `None` when there was nothing to validate
    pub summary: Option<ValidationSummary>,
}

impl EditorView {
    /// Project an aggregation outcome.
    ///
    /// `None` (blank text) yields an empty view without a summary; an empty
    /// list yields a zero-count summary.
    pub fn from_outcome(outcome: Option<&[NormalizedError]>) -> Self {
        let Some(errors) = outcome else {
            return Self::default();
        };
        let annotations = to_annotations(errors);
        let errors_count = annotations
            .iter()
            .filter(|a| a.kind == AnnotationType::Error)
            .count();
        Self {
            summary: Some(ValidationSummary {
                errors: errors_count,
                warnings: annotations.len() - errors_count,
            }),
            markers: to_markers(errors),
            annotations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
