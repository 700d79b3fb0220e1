//! Error aggregation
//!
//! One aggregation cycle checks the UMLS login once and then runs the code
//! validator, the ELM translator and the value set validator concurrently.
//! Their findings are merged into a single list in a fixed order: translator
//! diagnostics first, then code and code system failures, then value set
//! failures.

use futures::join;
use log::{debug, warn};
use octofhir_cql_editor_diagnostics::{NormalizedError, Result};
use octofhir_cql_editor_parser::{ParseResult, is_blank};
use octofhir_cql_editor_services::config::DEFAULT_VALUE_SET_CONCURRENCY;
use octofhir_cql_editor_services::{
    HttpTerminologyClient, HttpTranslationClient, ServiceConfig, SessionContext,
    TerminologyService, TranslationService, ValueSetReference, check_login, code_errors,
    validate_codes, validate_value_sets,
};
use std::sync::Arc;

/// Merges translator, code and value set findings into editor errors
#[derive(Clone)]
pub struct ErrorAggregator {
    terminology: Arc<dyn TerminologyService>,
    translator: Arc<dyn TranslationService>,
    value_set_concurrency: usize,
}

impl ErrorAggregator {
    pub fn new(
        terminology: Arc<dyn TerminologyService>,
        translator: Arc<dyn TranslationService>,
    ) -> Self {
        Self {
            terminology,
            translator,
            value_set_concurrency: DEFAULT_VALUE_SET_CONCURRENCY,
        }
    }

    /// Limit the number of concurrent value set lookups
    pub fn with_value_set_concurrency(mut self, concurrency: usize) -> Self {
        self.value_set_concurrency = concurrency.max(1);
        self
    }

    /// Build an aggregator backed by the HTTP service clients
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;
        let terminology = HttpTerminologyClient::new(config)?;
        let translator = HttpTranslationClient::new(config.clone())?;
        Ok(Self::new(Arc::new(terminology), Arc::new(translator))
            .with_value_set_concurrency(config.value_set_concurrency))
    }

    /// Validate one editor text.
    ///
    /// Returns `Ok(None)` for blank text without contacting any service; a
    /// caller must suppress its error summary in that case rather than show
    /// zero errors. Translation failures propagate as `Err`; terminology
    /// failures are folded into the returned errors.
    pub async fn aggregate(
        &self,
        text: &str,
        parse_result: &ParseResult,
        session: &SessionContext,
    ) -> Result<Option<Vec<NormalizedError>>> {
        if is_blank(text) {
            return Ok(None);
        }

        let terminology = self.terminology.as_ref();
        let logged_in = check_login(terminology, session).await;
        let value_sets: Vec<ValueSetReference> = parse_result
            .value_sets
            .iter()
            .map(ValueSetReference::from)
            .collect();

        let (codes, translation, value_set_failures) = join!(
            validate_codes(terminology, session, parse_result, logged_in),
            self.translator.translate(session, text, session.model),
            validate_value_sets(
                terminology,
                session,
                &value_sets,
                logged_in,
                self.value_set_concurrency,
            ),
        );
        let translation = translation?;

        let mut errors = translation.to_errors();
        errors.extend(code_errors(&codes));
        for failure in &value_set_failures {
            match failure.to_error() {
                Ok(error) => errors.push(error),
                Err(err) => warn!("dropping value set failure \"{}\": {err}", failure.message),
            }
        }

        debug!(
            "aggregated {} errors ({} codes, {} value sets checked, logged in: {logged_in})",
            errors.len(),
            codes.len(),
            value_sets.len()
        );
        Ok(Some(errors))
    }
}

impl std::fmt::Debug for ErrorAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorAggregator")
            .field("value_set_concurrency", &self.value_set_concurrency)
            .finish_non_exhaustive()
    }
}
