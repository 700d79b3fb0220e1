//! ELM translation service
//!
//! CQL text is compiled remotely by `PUT {base}/cql/translator/cql`. The
//! response wraps the translation as a JSON string, `{"json": "..."}`, which
//! is decoded into [`ElmTranslation`]. Unlike the terminology validators,
//! translation failures propagate: a missing service URL, a non-success
//! status or a timeout means no translation happened at all.

use crate::config::ServiceConfig;
use crate::http::{build_client, check_status, decode_json, transport_error};
use crate::model::DataModel;
use crate::session::SessionContext;
use async_trait::async_trait;
use log::{debug, warn};
use octofhir_cql_editor_diagnostics::{
    CQLE0101, CQLE0102, CQLE0103, EditorError, ErrorSource, NormalizedError, Result, Severity,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SERVICE: &str = "translation service";

/// Translator options, all enabled
const TRANSLATOR_FLAGS: &[&str] = &[
    "showWarnings",
    "annotations",
    "locators",
    "disable-list-demotion",
    "disable-list-promotion",
    "disable-method-invocation",
    "validate-units",
];

/// A compiler diagnostic reported by the translator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationError {
    pub start_line: Option<i64>,
    pub start_char: Option<i64>,
    pub end_line: Option<i64>,
    pub end_char: Option<i64>,
    pub message: String,
    /// `Error`, `Warning` or `Info`
    pub error_severity: Option<String>,
    /// `Syntax`, `Semantic`, `Include`, ...
    pub error_type: Option<String>,
    pub target_include_library_id: Option<String>,
    pub target_include_library_version_id: Option<String>,
}

impl TranslationError {
    /// The editor error, or `None` when the diagnostic has no usable position
    pub fn to_error(&self) -> Option<NormalizedError> {
        NormalizedError::from_raw(
            ErrorSource::Elm,
            self.start_line,
            self.start_char,
            self.end_line,
            self.end_char,
            Severity::from_translator(self.error_severity.as_deref()),
            self.message.clone(),
        )
    }
}

/// `library.identifier`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElmIdentifier {
    pub id: Option<String>,
    pub version: Option<String>,
}

/// `library.valueSets.def[]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElmValueSetDef {
    pub name: String,
    pub id: String,
    pub locator: Option<String>,
    pub access_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ElmDefs<T> {
    #[serde(default)]
    pub def: Vec<T>,
}

/// The parts of the translated library the editor consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElmLibrary {
    pub identifier: Option<ElmIdentifier>,
    #[serde(default)]
    pub value_sets: Option<ElmDefs<ElmValueSetDef>>,
}

/// Result of translating one CQL text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElmTranslation {
    #[serde(default)]
    pub error_exceptions: Vec<TranslationError>,
    #[serde(default)]
    pub external_errors: Vec<Value>,
    pub library: Option<ElmLibrary>,
}

impl ElmTranslation {
    /// Value set definitions of the translated library
    pub fn value_set_defs(&self) -> &[ElmValueSetDef] {
        self.library
            .as_ref()
            .and_then(|library| library.value_sets.as_ref())
            .map(|defs| defs.def.as_slice())
            .unwrap_or_default()
    }

    /// Editor errors of every positioned diagnostic, in translator order
    pub fn to_errors(&self) -> Vec<NormalizedError> {
        self.error_exceptions
            .iter()
            .filter_map(|exception| {
                let error = exception.to_error();
                if error.is_none() {
                    warn!(
                        "dropping translator diagnostic without position: {}",
                        exception.message
                    );
                }
                error
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct TranslationEnvelope {
    json: String,
}

/// Compiles CQL into ELM
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(
        &self,
        session: &SessionContext,
        cql: &str,
        model: DataModel,
    ) -> Result<ElmTranslation>;
}

/// [`TranslationService`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpTranslationClient {
    config: ServiceConfig,
    client: Client,
}

impl HttpTranslationClient {
    /// Create a client; service URLs are resolved per request so a missing
    /// URL surfaces as a translation error.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = build_client(config.translator_timeout())?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl TranslationService for HttpTranslationClient {
    async fn translate(
        &self,
        session: &SessionContext,
        cql: &str,
        model: DataModel,
    ) -> Result<ElmTranslation> {
        let mut url = self
            .config
            .translator_url(model)?
            .join("cql/translator/cql")
            .map_err(|e| EditorError::transport(CQLE0101, format!("Invalid translator URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for flag in TRANSLATOR_FLAGS {
                query.append_pair(flag, "true");
            }
        }

        debug!("translating {} bytes of CQL with the {model} translator", cql.len());
        let response = session
            .authorize(self.client.put(url))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(cql.to_string())
            .send()
            .await
            .map_err(|e| transport_error(CQLE0101, SERVICE, &e))?;
        let response = check_status(CQLE0102, SERVICE, response).await?;
        let envelope: TranslationEnvelope = decode_json(CQLE0103, SERVICE, response).await?;
        let translation: ElmTranslation = serde_json::from_str(&envelope.json).map_err(|e| {
            EditorError::decode(CQLE0103, format!("Invalid ELM translation: {e}"))
        })?;
        debug!(
            "translation finished with {} diagnostics",
            translation.error_exceptions.len()
        );
        Ok(translation)
    }
}
