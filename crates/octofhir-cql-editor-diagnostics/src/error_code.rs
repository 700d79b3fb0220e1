//! CQL editor error codes following a structured numbering system
//!
//! Error code ranges:
//! - CQLE0001-CQLE0099: Syntax errors reported by the declaration parser
//! - CQLE0100-CQLE0199: Translation service errors
//! - CQLE0200-CQLE0299: Terminology service errors
//! - CQLE0300-CQLE0399: System errors (configuration, I/O, formats)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a syntax error (0001-0099)
    pub const fn is_syntax_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a translation error (0100-0199)
    pub const fn is_translation_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a terminology error (0200-0299)
    pub const fn is_terminology_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0300-0399)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CQLE{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Syntax errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of input"));
    map.insert(3, ErrorInfo::new("Unterminated string literal"));
    map.insert(4, ErrorInfo::new("Unterminated quoted identifier"));
    map.insert(5, ErrorInfo::new("Unterminated block comment"));
    map.insert(6, ErrorInfo::new("Missing closing delimiter"));
    map.insert(7, ErrorInfo::new("Unexpected closing delimiter"));
    map.insert(8, ErrorInfo::new("Invalid library declaration"));
    map.insert(9, ErrorInfo::new("Invalid using declaration"));
    map.insert(10, ErrorInfo::new("Invalid include declaration"));
    map.insert(11, ErrorInfo::new("Invalid codesystem declaration"));
    map.insert(12, ErrorInfo::new("Invalid valueset declaration"));
    map.insert(13, ErrorInfo::new("Invalid code declaration"));
    map.insert(14, ErrorInfo::new("Invalid concept declaration"));
    map.insert(15, ErrorInfo::new("Invalid parameter declaration"));
    map.insert(16, ErrorInfo::new("Invalid context declaration"));
    map.insert(17, ErrorInfo::new("Invalid definition"));

    // Translation errors (0100-0199)
    map.insert(
        100,
        ErrorInfo::new("Translation service not configured")
            .with_help("Set the QDM and FHIR translation service URLs in the editor configuration"),
    );
    map.insert(101, ErrorInfo::new("Translation request failed"));
    map.insert(102, ErrorInfo::new("Translation service returned an error status"));
    map.insert(103, ErrorInfo::new("Invalid translation response"));

    // Terminology errors (0200-0299)
    map.insert(
        200,
        ErrorInfo::new("Terminology service not configured")
            .with_help("Set the terminology service URL in the editor configuration"),
    );
    map.insert(201, ErrorInfo::new("Terminology request failed"));
    map.insert(202, ErrorInfo::new("Terminology service returned an error status"));
    map.insert(203, ErrorInfo::new("Invalid terminology response"));
    map.insert(204, ErrorInfo::new("Not logged in to UMLS"));

    // System errors (0300-0399)
    map.insert(300, ErrorInfo::new("Configuration error"));
    map.insert(301, ErrorInfo::new("I/O error"));
    map.insert(302, ErrorInfo::new("Invalid locator"));
    map.insert(303, ErrorInfo::new("Invalid configuration value"));

    map
});

// Syntax errors
pub const CQLE0001: ErrorCode = ErrorCode::new(1);
pub const CQLE0002: ErrorCode = ErrorCode::new(2);
pub const CQLE0003: ErrorCode = ErrorCode::new(3);
pub const CQLE0004: ErrorCode = ErrorCode::new(4);
pub const CQLE0005: ErrorCode = ErrorCode::new(5);
pub const CQLE0006: ErrorCode = ErrorCode::new(6);
pub const CQLE0007: ErrorCode = ErrorCode::new(7);
pub const CQLE0008: ErrorCode = ErrorCode::new(8);
pub const CQLE0009: ErrorCode = ErrorCode::new(9);
pub const CQLE0010: ErrorCode = ErrorCode::new(10);
pub const CQLE0011: ErrorCode = ErrorCode::new(11);
pub const CQLE0012: ErrorCode = ErrorCode::new(12);
pub const CQLE0013: ErrorCode = ErrorCode::new(13);
pub const CQLE0014: ErrorCode = ErrorCode::new(14);
pub const CQLE0015: ErrorCode = ErrorCode::new(15);
pub const CQLE0016: ErrorCode = ErrorCode::new(16);
pub const CQLE0017: ErrorCode = ErrorCode::new(17);

// Translation errors
pub const CQLE0100: ErrorCode = ErrorCode::new(100);
pub const CQLE0101: ErrorCode = ErrorCode::new(101);
pub const CQLE0102: ErrorCode = ErrorCode::new(102);
pub const CQLE0103: ErrorCode = ErrorCode::new(103);

// Terminology errors
pub const CQLE0200: ErrorCode = ErrorCode::new(200);
pub const CQLE0201: ErrorCode = ErrorCode::new(201);
pub const CQLE0202: ErrorCode = ErrorCode::new(202);
pub const CQLE0203: ErrorCode = ErrorCode::new(203);
pub const CQLE0204: ErrorCode = ErrorCode::new(204);

// System errors
pub const CQLE0300: ErrorCode = ErrorCode::new(300);
pub const CQLE0301: ErrorCode = ErrorCode::new(301);
pub const CQLE0302: ErrorCode = ErrorCode::new(302);
pub const CQLE0303: ErrorCode = ErrorCode::new(303);
