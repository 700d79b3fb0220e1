//! The validate command end to end over HTTP

#![cfg(feature = "cli")]

use octofhir_cql_editor::cli::output::OutputFormat;
use octofhir_cql_editor::cli::validate::{ValidateConfig, validate_files};
use octofhir_cql_editor::diagnostics::ErrorSource;
use octofhir_cql_editor::services::ServiceConfig;
use octofhir_cql_editor::{DataModel, EditorConfig, ErrorAggregator, SessionContext};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FHIR_LIBRARY: &str = r#"library Screening version '0.1.0'
using QICore version '4.1.1'
include FHIRHelpers version '4.1.000' called FHIRHelpers
valueset "Office Visit": 'http://cts.nlm.nih.gov/fhir/ValueSet/2.16.840.1.113883.3.464.1003.101.12.1001'
context Patient
define "Qualifying Encounters":
  [Encounter: "Office Visit"]
"#;

fn envelope(body: Value) -> Value {
    json!({ "json": body.to_string() })
}

fn write_library(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn config(server: &MockServer, files: Vec<PathBuf>) -> ValidateConfig {
    let services = ServiceConfig {
        qdm_translator_url: Some(format!("{}/qdm", server.uri())),
        fhir_translator_url: Some(format!("{}/fhir", server.uri())),
        terminology_url: Some(format!("{}/api", server.uri())),
        ..ServiceConfig::default()
    };
    ValidateConfig {
        files,
        editor: EditorConfig {
            services,
            ..EditorConfig::default()
        },
        session: SessionContext::new(DataModel::Qdm).with_access_token("token"),
        model: None,
        format: OutputFormat::Json,
        strict: false,
        verbose: false,
    }
}

async fn mount_login(server: &MockServer, logged_in: bool) {
    Mock::given(method("GET"))
        .and(path("/api/vsac/umls-credentials/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(logged_in)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_model_is_detected_from_using_statement() {
    let server = MockServer::start().await;
    mount_login(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/api/vsac/valueset"))
        .and(query_param("oid", "2.16.840.1.113883.3.464.1003.101.12.1001"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Value set not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fhir/cql/translator/cql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "errorExceptions": [{
                "startLine": 3, "startChar": 0, "endLine": 3, "endChar": 60,
                "message": "Could not load source for library FHIRHelpers",
                "errorSeverity": "Error", "errorType": "Include"
            }]
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let file = write_library(FHIR_LIBRARY);
    let config = config(&server, vec![file.path().to_path_buf()]);
    let aggregator = ErrorAggregator::from_config(&config.editor.services).unwrap();
    let reports = validate_files(&aggregator, &config).await.unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.model, DataModel::QiCore);
    let sources: Vec<_> = report.errors.iter().map(|e| e.source).collect();
    assert_eq!(sources, vec![ErrorSource::Elm, ErrorSource::Vsac]);
    assert_eq!(report.errors[1].message, "Office Visit: Value set not found");
    assert_eq!(report.errors[1].start_line, 4);
    assert_eq!(report.summary.map(|s| s.errors), Some(2));
}

#[tokio::test]
async fn test_translator_outage_fails_the_file() {
    let server = MockServer::start().await;
    mount_login(&server, false).await;
    Mock::given(method("PUT"))
        .and(path("/qdm/cql/translator/cql"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let file = write_library("library Plain version '1'\nusing QDM version '5.6'\n");
    let config = config(&server, vec![file.path().to_path_buf()]);
    let aggregator = ErrorAggregator::from_config(&config.editor.services).unwrap();
    let err = validate_files(&aggregator, &config).await.unwrap_err();

    assert!(err.to_string().starts_with("Validation of"));
}

#[tokio::test]
async fn test_blank_file_has_no_summary() {
    let server = MockServer::start().await;

    let file = write_library("\n   \n");
    let config = config(&server, vec![file.path().to_path_buf()]);
    let aggregator = ErrorAggregator::from_config(&config.editor.services).unwrap();
    let reports = validate_files(&aggregator, &config).await.unwrap();

    assert_eq!(reports[0].summary, None);
    assert!(reports[0].errors.is_empty());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
