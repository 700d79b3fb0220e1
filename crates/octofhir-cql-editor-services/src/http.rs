//! Shared HTTP plumbing for the service clients

use log::debug;
use octofhir_cql_editor_diagnostics::{CQLE0300, EditorError, ErrorCode, Result};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

/// Build a client with a fixed request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder().timeout(timeout).build().map_err(|e| {
        EditorError::configuration(CQLE0300, format!("Failed to build HTTP client: {e}"))
    })
}

/// Convert a reqwest failure that produced no response
pub(crate) fn transport_error(code: ErrorCode, service: &str, err: &reqwest::Error) -> EditorError {
    if err.is_timeout() {
        EditorError::transport(code, format!("{service} request timed out"))
    } else {
        EditorError::transport(code, format!("Failed to contact {service}: {err}"))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Pass successful responses through; turn others into status errors.
///
/// The message is taken from a JSON `message`/`error` field when the service
/// sends one.
pub(crate) async fn check_status(
    code: ErrorCode,
    service: &str,
    response: Response,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("{service} answered {status}: {body}");
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| format!("{service} request failed"));
    Err(EditorError::status(code, status.as_u16(), message))
}

/// Decode a JSON body
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    code: ErrorCode,
    service: &str,
    response: Response,
) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| EditorError::decode(code, format!("Failed to read {service} response: {e}")))?;
    serde_json::from_str(&body)
        .map_err(|e| EditorError::decode(code, format!("Invalid {service} response: {e}")))
}
