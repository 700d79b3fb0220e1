//! Mock implementations for testing
//!
//! Provides configurable in-memory implementations of the terminology and
//! translation services with call counters.

use async_trait::async_trait;
use octofhir_cql_editor::diagnostics::{CQLE0102, EditorError, Result};
use octofhir_cql_editor::services::{
    CodeValidation, DataModel, ElmTranslation, SessionContext, TerminologyService,
    TranslationError, TranslationService,
};
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock terminology service with configurable responses
pub struct MockTerminology {
    logged_in: RwLock<Result<bool>>,
    invalid_codes: RwLock<HashMap<String, String>>,
    invalid_code_systems: RwLock<HashMap<String, String>>,
    failing_value_sets: RwLock<HashMap<String, EditorError>>,
    login_calls: AtomicUsize,
    code_calls: AtomicUsize,
    value_set_calls: AtomicUsize,
}

impl MockTerminology {
    pub fn new() -> Self {
        Self {
            logged_in: RwLock::new(Ok(true)),
            invalid_codes: RwLock::new(HashMap::new()),
            invalid_code_systems: RwLock::new(HashMap::new()),
            failing_value_sets: RwLock::new(HashMap::new()),
            login_calls: AtomicUsize::new(0),
            code_calls: AtomicUsize::new(0),
            value_set_calls: AtomicUsize::new(0),
        }
    }

    /// Configure the login status response
    pub fn set_logged_in(&self, response: Result<bool>) {
        *self.logged_in.write() = response;
    }

    /// Configure a code id to be rejected
    pub fn reject_code(&self, code_id: impl Into<String>, message: impl Into<String>) {
        self.invalid_codes.write().insert(code_id.into(), message.into());
    }

    /// Configure a code system name to be rejected
    pub fn reject_code_system(&self, name: impl Into<String>, message: impl Into<String>) {
        self.invalid_code_systems
            .write()
            .insert(name.into(), message.into());
    }

    /// Configure a value set oid to fail with `error`
    pub fn fail_value_set(&self, oid: impl Into<String>, error: EditorError) {
        self.failing_value_sets.write().insert(oid.into(), error);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn code_calls(&self) -> usize {
        self.code_calls.load(Ordering::SeqCst)
    }

    pub fn value_set_calls(&self) -> usize {
        self.value_set_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTerminology {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TerminologyService for MockTerminology {
    async fn check_login(&self, _session: &SessionContext) -> Result<bool> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.logged_in.read().clone()
    }

    async fn validate_codes(
        &self,
        _session: &SessionContext,
        _model: DataModel,
        codes: Vec<CodeValidation>,
    ) -> Result<Vec<CodeValidation>> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        let invalid_codes = self.invalid_codes.read();
        let invalid_systems = self.invalid_code_systems.read();
        Ok(codes
            .into_iter()
            .map(|mut code| {
                let system_error = invalid_systems.get(&code.code_system.name);
                code.code_system.valid = Some(system_error.is_none());
                code.code_system.error_message = system_error.cloned();
                let code_error = invalid_codes.get(&code.code_id);
                code.valid = Some(code_error.is_none());
                code.error_message = code_error.cloned();
                code
            })
            .collect())
    }

    async fn get_value_set(&self, _session: &SessionContext, oid: &str) -> Result<Value> {
        self.value_set_calls.fetch_add(1, Ordering::SeqCst);
        match self.failing_value_sets.read().get(oid) {
            Some(error) => Err(error.clone()),
            None => Ok(json!({"oid": oid, "concepts": []})),
        }
    }
}

/// Mock translation service with a configurable response and latency
pub struct MockTranslator {
    response: RwLock<Result<ElmTranslation>>,
    delay: RwLock<Duration>,
    requests: RwLock<Vec<(String, DataModel)>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            response: RwLock::new(Ok(ElmTranslation::default())),
            delay: RwLock::new(Duration::ZERO),
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Respond with these diagnostics
    pub fn set_errors(&self, errors: Vec<TranslationError>) {
        *self.response.write() = Ok(ElmTranslation {
            error_exceptions: errors,
            ..ElmTranslation::default()
        });
    }

    /// Respond with a non-success HTTP status
    pub fn fail_with_status(&self, status: u16) {
        *self.response.write() = Err(EditorError::status(
            CQLE0102,
            status,
            "Translation service unavailable",
        ));
    }

    /// Wait this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write() = delay;
    }

    pub fn calls(&self) -> usize {
        self.requests.read().len()
    }

    /// Texts and models of every request in arrival order
    pub fn requests(&self) -> Vec<(String, DataModel)> {
        self.requests.read().clone()
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationService for MockTranslator {
    async fn translate(
        &self,
        _session: &SessionContext,
        cql: &str,
        model: DataModel,
    ) -> Result<ElmTranslation> {
        self.requests.write().push((cql.to_string(), model));
        let delay = *self.delay.read();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.response.read().clone()
    }
}
