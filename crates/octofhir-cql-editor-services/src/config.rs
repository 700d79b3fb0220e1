//! Editor configuration
//!
//! Configuration is read from a TOML file and can be overridden through
//! `CQL_EDITOR_*` environment variables:
//!
//! ```toml
//! debounce_ms = 1500
//!
//! [services]
//! qdm_translator_url = "https://qdm-translator.example.org/api"
//! fhir_translator_url = "https://fhir-translator.example.org/api"
//! terminology_url = "https://terminology.example.org/api"
//! translator_timeout_ms = 15000
//! value_set_concurrency = 8
//! ```

use crate::model::DataModel;
use log::debug;
use octofhir_cql_editor_diagnostics::{
    CQLE0100, CQLE0200, CQLE0300, CQLE0301, CQLE0303, EditorError, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TRANSLATOR_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_500;
pub const DEFAULT_VALUE_SET_CONCURRENCY: usize = 8;

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "CQL_EDITOR_";

/// Remote service endpoints and limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the QDM ELM translation service
    pub qdm_translator_url: Option<String>,
    /// Base URL of the FHIR (QI-Core) ELM translation service
    pub fhir_translator_url: Option<String>,
    /// Base URL of the terminology (VSAC) service
    pub terminology_url: Option<String>,
    /// Client-side timeout of translation requests
    pub translator_timeout_ms: u64,
    /// Client-side timeout of terminology requests
    pub request_timeout_ms: u64,
    /// Maximum number of concurrent value set lookups
    pub value_set_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            qdm_translator_url: None,
            fhir_translator_url: None,
            terminology_url: None,
            translator_timeout_ms: DEFAULT_TRANSLATOR_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            value_set_concurrency: DEFAULT_VALUE_SET_CONCURRENCY,
        }
    }
}

impl ServiceConfig {
    /// Base URL of the translation service for a data model
    pub fn translator_url(&self, model: DataModel) -> Result<Url> {
        let (configured, key) = match model {
            DataModel::Qdm => (&self.qdm_translator_url, "qdm_translator_url"),
            DataModel::QiCore => (&self.fhir_translator_url, "fhir_translator_url"),
        };
        match configured {
            Some(url) => base_url(key, url),
            None => Err(EditorError::configuration(
                CQLE0100,
                format!("{model} translation service URL is not configured ({key})"),
            )),
        }
    }

    /// Base URL of the terminology service
    pub fn terminology_url(&self) -> Result<Url> {
        match &self.terminology_url {
            Some(url) => base_url("terminology_url", url),
            None => Err(EditorError::configuration(
                CQLE0200,
                "Terminology service URL is not configured (terminology_url)",
            )),
        }
    }

    pub fn translator_timeout(&self) -> Duration {
        Duration::from_millis(self.translator_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Check configured values without requiring any URL to be present
    pub fn validate(&self) -> Result<()> {
        for (key, url) in [
            ("qdm_translator_url", &self.qdm_translator_url),
            ("fhir_translator_url", &self.fhir_translator_url),
            ("terminology_url", &self.terminology_url),
        ] {
            if let Some(url) = url {
                base_url(key, url)?;
            }
        }
        if self.translator_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(EditorError::configuration(
                CQLE0303,
                "Request timeouts must be greater than zero",
            ));
        }
        if self.value_set_concurrency == 0 {
            return Err(EditorError::configuration(
                CQLE0303,
                "value_set_concurrency must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Parse a base URL so that relative endpoint paths join below it
fn base_url(key: &str, value: &str) -> Result<Url> {
    let mut url = Url::parse(value.trim()).map_err(|e| {
        EditorError::configuration(CQLE0303, format!("Invalid {key} '{value}': {e}"))
    })?;
    if url.cannot_be_a_base() {
        return Err(EditorError::configuration(
            CQLE0303,
            format!("Invalid {key} '{value}': not a base URL"),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Top-level editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiescence window before a validation cycle starts
    pub debounce_ms: u64,
    pub services: ServiceConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            services: ServiceConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EditorConfig = toml::from_str(content).map_err(|e| {
            EditorError::configuration(CQLE0300, format!("Invalid configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            EditorError::configuration(CQLE0300, format!("Failed to serialize configuration: {e}"))
        })
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            EditorError::io(
                CQLE0301,
                format!("Failed to read configuration {}: {e}", path.display()),
            )
        })?;
        Self::from_toml(&content)
    }

    /// Apply `CQL_EDITOR_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(url) = var("QDM_TRANSLATOR_URL") {
            self.services.qdm_translator_url = Some(url);
        }
        if let Some(url) = var("FHIR_TRANSLATOR_URL") {
            self.services.fhir_translator_url = Some(url);
        }
        if let Some(url) = var("TERMINOLOGY_URL") {
            self.services.terminology_url = Some(url);
        }
        if let Some(value) = var("TRANSLATOR_TIMEOUT_MS") {
            self.services.translator_timeout_ms = parse_number("TRANSLATOR_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("REQUEST_TIMEOUT_MS") {
            self.services.request_timeout_ms = parse_number("REQUEST_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("VALUE_SET_CONCURRENCY") {
            self.services.value_set_concurrency = parse_number("VALUE_SET_CONCURRENCY", &value)?;
        }
        if let Some(value) = var("DEBOUNCE_MS") {
            self.debounce_ms = parse_number("DEBOUNCE_MS", &value)?;
        }
        self.validate()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        self.services.validate()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        EditorError::configuration(
            CQLE0303,
            format!("{ENV_PREFIX}{name} must be a number, got '{value}'"),
        )
    })
}
