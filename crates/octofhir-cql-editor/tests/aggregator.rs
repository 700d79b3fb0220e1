//! Error aggregation over in-memory services

mod common;

use common::*;
use octofhir_cql_editor::diagnostics::{CQLE0101, CQLE0202, EditorError, ErrorSource, Severity};
use octofhir_cql_editor::services::{DataModel, LOGIN_REQUIRED_MESSAGE};
use octofhir_cql_editor::{EditorView, parse};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

fn services() -> (Arc<MockTerminology>, Arc<MockTranslator>) {
    (Arc::new(MockTerminology::new()), Arc::new(MockTranslator::new()))
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\n\t\n")]
#[tokio::test]
async fn test_blank_text_yields_none_without_calls(#[case] text: &str) {
    let (terminology, translator) = services();
    let outcome = aggregator(&terminology, &translator)
        .aggregate(text, &parse(text), &session())
        .await
        .unwrap();

    assert_eq!(outcome, None);
    assert_eq!(terminology.login_calls(), 0);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn test_clean_library_yields_empty_list() {
    let (terminology, translator) = services();
    let outcome = aggregator(&terminology, &translator)
        .aggregate(PLAIN_LIBRARY, &parse(PLAIN_LIBRARY), &session())
        .await
        .unwrap();

    assert_eq!(outcome, Some(Vec::new()));
    assert_eq!(terminology.code_calls(), 0);
    assert_eq!(terminology.value_set_calls(), 0);
    let view = EditorView::from_outcome(outcome.as_deref());
    assert_eq!(view.summary.map(|s| s.to_string()).as_deref(), Some("No errors found"));
}

#[tokio::test]
async fn test_invalid_code_system_and_syntax_error() {
    let (terminology, translator) = services();
    terminology.reject_code_system("Bogus", "Code system not found in VSAC");
    translator.set_errors(vec![translation_error(12, 2, 8, "Syntax error at exists")]);

    let errors = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].source, ErrorSource::Elm);
    assert_eq!(errors[0].start_line, 12);
    assert_eq!(errors[1].source, ErrorSource::Vsac);
    assert_eq!(errors[1].message, "Code system not found in VSAC");
    assert_eq!(errors[1].start_line, line_of(SAMPLE_LIBRARY, "codesystem \"Bogus\""));
}

#[tokio::test]
async fn test_code_failures_are_code_or_vsac_with_message() {
    let (terminology, translator) = services();
    terminology.reject_code("21112-8", "Code not found");
    terminology.reject_code_system("Bogus", "Unknown code system");

    let errors = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(errors.len(), 2);
    for error in &errors {
        assert!(matches!(error.source, ErrorSource::Code | ErrorSource::Vsac));
        assert!(!error.message.is_empty());
    }
    assert_eq!(errors[0].source, ErrorSource::Code);
    assert_eq!(errors[0].start_line, line_of(SAMPLE_LIBRARY, "code \"Birth date\""));
}

const SHARED_SYSTEM_LIBRARY: &str = r#"library Shared version '1.0.0'
using QDM version '5.6'
codesystem "Bogus": 'urn:oid:9.9.9'
codesystem "LOINC": 'urn:oid:2.16.840.1.113883.6.1'
code "A": '1' from "Bogus"
code "B": '2' from "Bogus"
code "Birth date": '21112-8' from "LOINC"
code "Weight": '29463-7' from "LOINC"
"#;

#[tokio::test]
async fn test_shared_invalid_code_system_reported_once() {
    let (terminology, translator) = services();
    terminology.reject_code_system("Bogus", "Code system not found in VSAC");

    let errors = aggregator(&terminology, &translator)
        .aggregate(SHARED_SYSTEM_LIBRARY, &parse(SHARED_SYSTEM_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(terminology.code_calls(), 1);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source, ErrorSource::Vsac);
    assert_eq!(errors[0].message, "Code system not found in VSAC");
    assert_eq!(
        errors[0].start_line,
        line_of(SHARED_SYSTEM_LIBRARY, "codesystem \"Bogus\"")
    );
    let view = EditorView::from_outcome(Some(errors.as_slice()));
    assert_eq!(view.summary.map(|s| s.total()), Some(1));
}

#[tokio::test]
async fn test_shared_valid_code_system_yields_no_errors() {
    let (terminology, translator) = services();

    let errors = aggregator(&terminology, &translator)
        .aggregate(SHARED_SYSTEM_LIBRARY, &parse(SHARED_SYSTEM_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(terminology.code_calls(), 1);
    assert_eq!(errors, Vec::new());
}

#[tokio::test]
async fn test_invalid_codes_keep_one_error_each() {
    let (terminology, translator) = services();
    terminology.reject_code("21112-8", "Code not found");
    terminology.reject_code("29463-7", "Code not found");

    let errors = aggregator(&terminology, &translator)
        .aggregate(SHARED_SYSTEM_LIBRARY, &parse(SHARED_SYSTEM_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    let lines: Vec<_> = errors.iter().map(|e| (e.source, e.start_line)).collect();
    assert_eq!(
        lines,
        vec![
            (ErrorSource::Code, line_of(SHARED_SYSTEM_LIBRARY, "code \"Birth date\"")),
            (ErrorSource::Code, line_of(SHARED_SYSTEM_LIBRARY, "code \"Weight\"")),
        ]
    );
}

#[tokio::test]
async fn test_logged_out_skips_terminology_calls() {
    let (terminology, translator) = services();
    terminology.set_logged_in(Ok(false));

    let errors = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(terminology.login_calls(), 1);
    assert_eq!(terminology.code_calls(), 0);
    assert_eq!(terminology.value_set_calls(), 0);
    // The translator does not depend on the UMLS session
    assert_eq!(translator.calls(), 1);

    let codes: Vec<_> = errors
        .iter()
        .filter(|e| e.source == ErrorSource::Code)
        .collect();
    assert_eq!(codes.len(), 2);
    assert!(codes.iter().all(|e| e.message == LOGIN_REQUIRED_MESSAGE));

    let value_sets: Vec<_> = errors
        .iter()
        .filter(|e| e.source == ErrorSource::Vsac)
        .collect();
    assert_eq!(value_sets.len(), 2);
    assert!(value_sets.iter().all(|e| e.message == LOGIN_REQUIRED_MESSAGE));
}

#[tokio::test]
async fn test_login_check_failure_counts_as_logged_out() {
    let (terminology, translator) = services();
    terminology.set_logged_in(Err(EditorError::transport(CQLE0101, "connection refused")));

    let errors = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(terminology.code_calls(), 0);
    assert!(errors.iter().all(|e| e.message == LOGIN_REQUIRED_MESSAGE));
}

#[rstest]
#[case(404)]
#[case(500)]
#[case(503)]
#[tokio::test]
async fn test_translator_status_failure_rejects(#[case] status: u16) {
    let (terminology, translator) = services();
    translator.fail_with_status(status);

    let err = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(status));
}

#[tokio::test]
async fn test_one_failing_value_set_is_isolated() {
    let (terminology, translator) = services();
    terminology.fail_value_set(
        "2.16.840.1.999",
        EditorError::status(CQLE0202, 404, "Value set not found"),
    );

    let errors = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(terminology.value_set_calls(), 2);
    assert_eq!(errors.len(), 1);
    let line = line_of(SAMPLE_LIBRARY, "valueset \"Missing\"");
    assert_eq!(errors[0].source, ErrorSource::Vsac);
    assert_eq!(errors[0].message, "Missing: Value set not found");
    assert_eq!(
        (errors[0].start_line, errors[0].start_char, errors[0].end_line, errors[0].end_char),
        (line, 0, line, line_len(SAMPLE_LIBRARY, line))
    );
}

#[tokio::test]
async fn test_transport_failure_uses_generic_message() {
    let (terminology, translator) = services();
    terminology.fail_value_set(
        "2.16.840.1.113883.3.464.1003.103.12.1001",
        EditorError::transport(CQLE0101, "request timed out"),
    );

    let errors = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "Unable to retrieve value set, please contact HelpDesk"
    );
}

#[tokio::test]
async fn test_errors_are_ordered_by_source() {
    let (terminology, translator) = services();
    terminology.reject_code("123", "Code not found");
    terminology.fail_value_set(
        "2.16.840.1.999",
        EditorError::status(CQLE0202, 404, "Value set not found"),
    );
    translator.set_errors(vec![
        translation_error(12, 2, 8, "first"),
        translation_error(11, 0, 6, "second"),
    ]);

    let errors = aggregator(&terminology, &translator)
        .aggregate(SAMPLE_LIBRARY, &parse(SAMPLE_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    let sources: Vec<_> = errors.iter().map(|e| e.source).collect();
    assert_eq!(
        sources,
        vec![ErrorSource::Elm, ErrorSource::Elm, ErrorSource::Code, ErrorSource::Vsac]
    );
    assert_eq!(errors[0].message, "first");
    assert_eq!(errors[1].message, "second");
}

#[tokio::test]
async fn test_aggregation_is_idempotent() {
    let (terminology, translator) = services();
    terminology.reject_code_system("Bogus", "Unknown code system");
    terminology.fail_value_set(
        "2.16.840.1.999",
        EditorError::status(CQLE0202, 404, "Value set not found"),
    );
    translator.set_errors(vec![translation_error(12, 2, 8, "Syntax error")]);
    let aggregator = aggregator(&terminology, &translator);
    let parsed = parse(SAMPLE_LIBRARY);

    let first = aggregator
        .aggregate(SAMPLE_LIBRARY, &parsed, &session())
        .await
        .unwrap();
    let second = aggregator
        .aggregate(SAMPLE_LIBRARY, &parsed, &session())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.map(|e| e.len()), Some(3));
}

#[tokio::test]
async fn test_unpositioned_translator_diagnostics_are_dropped() {
    let (terminology, translator) = services();
    let mut unpositioned = translation_error(1, 0, 1, "Could not resolve library");
    unpositioned.start_line = None;
    let mut negative = translation_error(1, 0, 1, "negative span");
    negative.start_char = Some(-1);
    translator.set_errors(vec![unpositioned, negative, translation_error(4, 0, 5, "kept")]);

    let errors = aggregator(&terminology, &translator)
        .aggregate(PLAIN_LIBRARY, &parse(PLAIN_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "kept");
}

#[tokio::test]
async fn test_translator_warning_keeps_severity() {
    let (terminology, translator) = services();
    let mut warning = translation_error(4, 0, 5, "List promotion");
    warning.error_severity = Some("Warning".to_string());
    translator.set_errors(vec![warning]);

    let errors = aggregator(&terminology, &translator)
        .aggregate(PLAIN_LIBRARY, &parse(PLAIN_LIBRARY), &session())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(errors[0].severity, Severity::Warning);
    let view = EditorView::from_outcome(Some(errors.as_slice()));
    assert_eq!(view.summary.map(|s| (s.errors, s.warnings)), Some((0, 1)));
}

#[tokio::test]
async fn test_translator_receives_session_model() {
    let (terminology, translator) = services();
    let session = session().with_model(DataModel::QiCore);

    aggregator(&terminology, &translator)
        .aggregate(PLAIN_LIBRARY, &parse(PLAIN_LIBRARY), &session)
        .await
        .unwrap();

    assert_eq!(
        translator.requests(),
        vec![(PLAIN_LIBRARY.to_string(), DataModel::QiCore)]
    );
}
