//! VSAC terminology service
//!
//! The terminology service owns three contracts used by the editor:
//!
//! - `GET  /vsac/umls-credentials/status` answers whether the session is
//!   signed in to UMLS (`true`/`false` body)
//! - `PUT  /vsac/validations/codes?model=<model>` validates a batch of code
//!   declarations and echoes them back decorated with validity
//! - `GET  /vsac/valueset?oid=<oid>` resolves one value set

use crate::config::ServiceConfig;
use crate::http::{build_client, check_status, decode_json, transport_error};
use crate::model::DataModel;
use crate::session::SessionContext;
use async_trait::async_trait;
use log::debug;
use octofhir_cql_editor_diagnostics::{CQLE0201, CQLE0202, CQLE0203, EditorError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

const SERVICE: &str = "terminology service";

/// Code system part of a code validation item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemValidation {
    pub name: String,
    pub oid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One code declaration as exchanged with the code validation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeValidation {
    pub name: String,
    pub code_id: String,
    pub code_system: CodeSystemValidation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Terminology operations needed by the validators
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TerminologyService: Send + Sync {
    /// Whether the session is signed in to UMLS
    async fn check_login(&self, session: &SessionContext) -> Result<bool>;

    /// Validate a batch of codes; the response has one entry per request item
    async fn validate_codes(
        &self,
        session: &SessionContext,
        model: DataModel,
        codes: Vec<CodeValidation>,
    ) -> Result<Vec<CodeValidation>>;

    /// Resolve a value set by oid
    async fn get_value_set(&self, session: &SessionContext, oid: &str) -> Result<Value>;
}

/// [`TerminologyService`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpTerminologyClient {
    base_url: Url,
    client: Client,
}

impl HttpTerminologyClient {
    /// Create a client from the service configuration.
    ///
    /// Fails with a configuration error when no terminology URL is set.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.terminology_url()?,
            client: build_client(config.request_timeout())?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            EditorError::transport(CQLE0201, format!("Invalid terminology endpoint '{path}': {e}"))
        })
    }
}

#[async_trait]
impl TerminologyService for HttpTerminologyClient {
    async fn check_login(&self, session: &SessionContext) -> Result<bool> {
        let url = self.endpoint("vsac/umls-credentials/status")?;
        let response = session
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| transport_error(CQLE0201, SERVICE, &e))?;
        let response = check_status(CQLE0202, SERVICE, response).await?;
        decode_json(CQLE0203, SERVICE, response).await
    }

    async fn validate_codes(
        &self,
        session: &SessionContext,
        model: DataModel,
        codes: Vec<CodeValidation>,
    ) -> Result<Vec<CodeValidation>> {
        let mut url = self.endpoint("vsac/validations/codes")?;
        url.query_pairs_mut().append_pair("model", model.as_str());
        debug!("validating {} codes for {model}", codes.len());
        let response = session
            .authorize(self.client.put(url))
            .json(&codes)
            .send()
            .await
            .map_err(|e| transport_error(CQLE0201, SERVICE, &e))?;
        let response = check_status(CQLE0202, SERVICE, response).await?;
        decode_json(CQLE0203, SERVICE, response).await
    }

    async fn get_value_set(&self, session: &SessionContext, oid: &str) -> Result<Value> {
        let mut url = self.endpoint("vsac/valueset")?;
        url.query_pairs_mut().append_pair("oid", oid);
        let response = session
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| transport_error(CQLE0201, SERVICE, &e))?;
        let response = check_status(CQLE0202, SERVICE, response).await?;
        decode_json(CQLE0203, SERVICE, response).await
    }
}
