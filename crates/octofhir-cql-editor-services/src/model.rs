//! Data models supported by the translation and terminology services

use octofhir_cql_editor_diagnostics::{CQLE0303, EditorError};
use octofhir_cql_editor_parser::ParseResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The data model a measure is authored against.
///
/// Selects the translation service and shapes the code validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataModel {
    #[default]
    #[serde(rename = "QDM")]
    Qdm,
    #[serde(rename = "QI-Core")]
    QiCore,
}

impl DataModel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataModel::Qdm => "QDM",
            DataModel::QiCore => "QI-Core",
        }
    }

    /// Detect the model from the first `using` declaration
    pub fn detect(parse_result: &ParseResult) -> Option<Self> {
        parse_result.model().and_then(|model| model.parse().ok())
    }
}

impl fmt::Display for DataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataModel {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdm" => Ok(DataModel::Qdm),
            "qi-core" | "qicore" | "fhir" => Ok(DataModel::QiCore),
            _ => Err(EditorError::configuration(
                CQLE0303,
                format!("Unknown data model '{s}', expected QDM or QI-Core"),
            )),
        }
    }
}
