//! Common test utilities for the editor pipeline
//!
//! This module provides shared testing infrastructure including:
//! - Configurable in-memory terminology and translation services
//! - Sample CQL libraries
//! - Helpers for building translator diagnostics

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use octofhir_cql_editor::ErrorAggregator;
use octofhir_cql_editor::services::{DataModel, SessionContext, TranslationError};
use serde_json::json;
use std::sync::Arc;

/// A QDM library with two code systems, two value sets and two codes.
///
/// Line 4 declares the `Bogus` code system used by the `Odd` code (line 8);
/// line 6 declares the `Missing` value set.
pub const SAMPLE_LIBRARY: &str = r#"library Diabetes version '1.0.0'
using QDM version '5.6'
codesystem "LOINC": 'urn:oid:2.16.840.1.113883.6.1'
codesystem "Bogus": 'urn:oid:9.9.9'
valueset "Diabetes": 'urn:oid:2.16.840.1.113883.3.464.1003.103.12.1001'
valueset "Missing": 'urn:oid:2.16.840.1.999'
code "Birth date": '21112-8' from "LOINC" display 'Birth date'
code "Odd": '123' from "Bogus"
parameter "Measurement Period" Interval<DateTime>
context Patient
define "Has Diabetes":
  exists ["Diagnosis": "Diabetes"]
"#;

/// A library without any terminology declarations
pub const PLAIN_LIBRARY: &str = r#"library Plain version '1.0.0'
using QDM version '5.6'
context Patient
define "Always": true
"#;

pub fn session() -> SessionContext {
    SessionContext::new(DataModel::Qdm)
        .with_access_token("test-token")
        .with_api_key("test-key")
}

pub fn aggregator(terminology: &Arc<MockTerminology>, translator: &Arc<MockTranslator>) -> ErrorAggregator {
    ErrorAggregator::new(terminology.clone(), translator.clone())
}

/// A positioned translator diagnostic
pub fn translation_error(line: i64, start: i64, end: i64, message: &str) -> TranslationError {
    serde_json::from_value(json!({
        "startLine": line,
        "startChar": start,
        "endLine": line,
        "endChar": end,
        "message": message,
        "errorSeverity": "Error",
        "errorType": "Syntax"
    }))
    .expect("valid translation error")
}

/// The 1-based line of `source` containing `needle`
pub fn line_of(source: &str, needle: &str) -> u32 {
    source
        .lines()
        .position(|line| line.contains(needle))
        .map(|index| index as u32 + 1)
        .expect("needle present in source")
}

/// Length in chars of the 1-based `line`
pub fn line_len(source: &str, line: u32) -> u32 {
    source
        .lines()
        .nth(line as usize - 1)
        .map(|l| l.chars().count() as u32)
        .expect("line present in source")
}
