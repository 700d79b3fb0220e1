//! Declarations extracted from a CQL library

use octofhir_cql_editor_diagnostics::SourceRange;
use serde::{Deserialize, Serialize};

/// `library Name version '1.0.0'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDeclaration {
    pub name: String,
    pub version: Option<String>,
    pub range: SourceRange,
}

/// `using QICore version '4.1.1'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsingDeclaration {
    pub model: String,
    pub version: Option<String>,
    pub range: SourceRange,
}

/// `include FHIRHelpers version '4.1.000' called FHIRHelpers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeDeclaration {
    pub name: String,
    pub version: Option<String>,
    pub alias: Option<String>,
    pub range: SourceRange,
}

/// `codesystem "LOINC": 'http://loinc.org' version '2.72'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSystemDeclaration {
    pub name: String,
    /// The code system identifier: an `urn:oid:` or canonical url
    pub oid: String,
    pub version: Option<String>,
    pub range: SourceRange,
}

/// `valueset "Encounter Inpatient": 'urn:oid:2.16.840.1.113883.3.666.5.307'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSetDeclaration {
    pub name: String,
    pub url: String,
    pub version: Option<String>,
    pub range: SourceRange,
}

impl ValueSetDeclaration {
    /// The bare oid of the value set.
    ///
    /// Handles `urn:oid:` identifiers and canonical urls such as
    /// `http://cts.nlm.nih.gov/fhir/ValueSet/2.16.840.1.113883.3.666.5.307`.
    pub fn oid(&self) -> &str {
        oid_from_url(&self.url)
    }

    /// Locator string of the declaration
    pub fn locator(&self) -> String {
        self.range.to_locator()
    }
}

/// Strip an `urn:oid:` prefix or take the last path segment of a url
pub fn oid_from_url(url: &str) -> &str {
    let url = url.trim();
    if let Some(oid) = url.strip_prefix("urn:oid:") {
        return oid;
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
}

/// `code "Birth date": '21112-8' from "LOINC" display 'Birth date'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDeclaration {
    pub name: String,
    pub code_id: String,
    /// Name of the referenced code system
    pub code_system: String,
    /// Library alias when the code system is declared in an included library
    pub code_system_library: Option<String>,
    /// The `display '...'` suffix
    pub display: Option<String>,
    pub range: SourceRange,
}

/// `concept "Diabetes": { "Code A", "Code B" } display 'Diabetes'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDeclaration {
    pub name: String,
    pub codes: Vec<String>,
    pub display: Option<String>,
    pub range: SourceRange,
}

/// `parameter "Measurement Period" Interval<DateTime>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    pub type_specifier: Option<String>,
    pub has_default: bool,
    pub range: SourceRange,
}

/// `context Patient`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDeclaration {
    pub context: String,
    pub range: SourceRange,
}

/// Access modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccessModifier {
    #[default]
    Public,
    Private,
}

/// `define "Initial Population": ...` or `define function "F"(...): ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub access: AccessModifier,
    pub is_function: bool,
    pub is_fluent: bool,
    /// Range of the whole statement including its body
    pub range: SourceRange,
}
