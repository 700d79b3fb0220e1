//! The normalized error shape shared by every validator

use crate::{Position, Severity, SourceRange, SyntaxError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the pipeline produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSource {
    /// Compiler diagnostic from the ELM translation service
    #[serde(rename = "ELM")]
    Elm,
    /// A code declaration rejected by terminology validation
    #[serde(rename = "Code")]
    Code,
    /// A code system or value set rejected by VSAC
    #[serde(rename = "VSAC")]
    Vsac,
    /// Lexical or declaration error found by the local parser
    #[serde(rename = "Syntax")]
    Syntax,
}

impl ErrorSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorSource::Elm => "ELM",
            ErrorSource::Code => "Code",
            ErrorSource::Vsac => "VSAC",
            ErrorSource::Syntax => "Syntax",
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned error ready for display in the editor.
///
/// Positions are unsigned, so every normalized error carries a renderable span.
/// Remote diagnostics with missing or negative coordinates must be filtered
/// through [`NormalizedError::from_raw`] before they get here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    pub start_line: u32,
    pub start_char: u32,
    pub end_line: u32,
    pub end_char: u32,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub source: ErrorSource,
    pub message: String,
}

impl NormalizedError {
    pub fn new(
        source: ErrorSource,
        range: SourceRange,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            start_line: range.start.line,
            start_char: range.start.column,
            end_line: range.end.line,
            end_char: range.end.column,
            severity,
            source,
            message: message.into(),
        }
    }

    /// An error-severity entry
    pub fn error(source: ErrorSource, range: SourceRange, message: impl Into<String>) -> Self {
        Self::new(source, range, Severity::Error, message)
    }

    /// Build from untrusted coordinates.
    ///
    /// Returns `None` when any coordinate is missing, negative, or the line is
    /// zero (lines are 1-based).
    pub fn from_raw(
        source: ErrorSource,
        start_line: Option<i64>,
        start_char: Option<i64>,
        end_line: Option<i64>,
        end_char: Option<i64>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Option<Self> {
        let coordinate = |value: Option<i64>| value.and_then(|v| u32::try_from(v).ok());
        let start_line = coordinate(start_line).filter(|line| *line > 0)?;
        let start_char = coordinate(start_char)?;
        let end_line = coordinate(end_line).filter(|line| *line > 0)?;
        let end_char = coordinate(end_char)?;
        Some(Self::new(
            source,
            SourceRange::from_parts(start_line, start_char, end_line, end_char),
            severity,
            message,
        ))
    }

    /// Line/column range of the error
    pub fn range(&self) -> SourceRange {
        SourceRange::new(
            Position::new(self.start_line, self.start_char),
            Position::new(self.end_line, self.end_char),
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&SyntaxError> for NormalizedError {
    fn from(error: &SyntaxError) -> Self {
        Self::error(ErrorSource::Syntax, error.range, error.message.clone())
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.range().start,
            self.source,
            self.severity,
            self.message
        )
    }
}
