//! CQL editor error types

use crate::{ErrorCode, SourceRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - the library cannot be translated as written
    #[default]
    Error,
    /// Warning - potential issue, translation can continue
    Warning,
    /// Information - informational message
    Info,
}

impl Severity {
    /// Map a translator severity string (`"Error"`, `"Warning"`, `"Info"`).
    ///
    /// Unknown or missing severities are treated as errors.
    pub fn from_translator(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("warning") => Severity::Warning,
            Some("info") | Some("information") | Some("message") => Severity::Info,
            _ => Severity::Error,
        }
    }

    #[cfg(feature = "colored")]
    pub fn colorize(&self) -> colored::ColoredString {
        use colored::Colorize;
        match self {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A syntax error found by the declaration parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Where the error was detected
    pub range: SourceRange,
}

impl SyntaxError {
    pub fn new(code: ErrorCode, message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            code,
            message: message.into(),
            range,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.code, self.message, self.range.start)
    }
}

/// Main CQL editor error type
#[derive(Debug, Clone, Error)]
pub enum EditorError {
    /// A required service or setting is missing or malformed
    #[error("{code}: {message}")]
    Configuration { code: ErrorCode, message: String },

    /// The request never produced a response (connection, timeout)
    #[error("{code}: {message}")]
    Transport { code: ErrorCode, message: String },

    /// The remote service answered with a non-success status
    #[error("{code}: {message} (HTTP {status})")]
    Status {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded
    #[error("{code}: {message}")]
    Decode { code: ErrorCode, message: String },

    /// A locator string was not of the form `L1:C1-L2:C2`
    #[error("{code}: invalid locator '{locator}'")]
    Locator { code: ErrorCode, locator: String },

    /// Reading input or configuration failed
    #[error("{code}: {message}")]
    Io { code: ErrorCode, message: String },
}

impl EditorError {
    /// Create a configuration error
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Transport {
            code,
            message: message.into(),
        }
    }

    /// Create a status error
    pub fn status(code: ErrorCode, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            status,
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Decode {
            code,
            message: message.into(),
        }
    }

    /// Create a locator error
    pub fn locator(code: ErrorCode, locator: impl Into<String>) -> Self {
        Self::Locator {
            code,
            locator: locator.into(),
        }
    }

    /// Create an I/O error
    pub fn io(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Io {
            code,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { code, .. }
            | Self::Transport { code, .. }
            | Self::Status { code, .. }
            | Self::Decode { code, .. }
            | Self::Locator { code, .. }
            | Self::Io { code, .. } => *code,
        }
    }

    /// Whether this error indicates a deployment misconfiguration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// HTTP status of a status error
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
