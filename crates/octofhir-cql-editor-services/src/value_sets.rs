//! Value set validation
//!
//! Every declared value set is looked up with a bounded concurrent fan-out.
//! One failing lookup never cancels the others; successes are dropped and
//! only failures are reported, each carrying the locator of its declaration.

use crate::codes::LOGIN_REQUIRED_MESSAGE;
use crate::session::SessionContext;
use crate::terminology::TerminologyService;
use crate::translation::ElmValueSetDef;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use octofhir_cql_editor_diagnostics::{
    EditorError, ErrorSource, NormalizedError, Result, SourceRange,
};
use octofhir_cql_editor_parser::{ValueSetDeclaration, oid_from_url};
use serde::{Deserialize, Serialize};

const LOOKUP_FAILED_MESSAGE: &str = "Unable to retrieve value set, please contact HelpDesk";

/// A value set to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSetReference {
    pub name: String,
    pub oid: String,
    /// Locator of the declaration, `"L1:C1-L2:C2"`
    pub locator: String,
}

impl From<&ValueSetDeclaration> for ValueSetReference {
    fn from(declaration: &ValueSetDeclaration) -> Self {
        Self {
            name: declaration.name.clone(),
            oid: declaration.oid().to_string(),
            locator: declaration.locator(),
        }
    }
}

impl ValueSetReference {
    /// Build a reference from an ELM value set definition
    pub fn from_elm(def: &ElmValueSetDef) -> Option<Self> {
        let Some(locator) = def.locator.clone() else {
            debug!("ELM value set \"{}\" has no locator", def.name);
            return None;
        };
        Some(Self {
            name: def.name.clone(),
            oid: oid_from_url(&def.id).to_string(),
            locator,
        })
    }
}

/// A failed value set lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSetFailure {
    pub message: String,
    pub locator: String,
}

impl ValueSetFailure {
    /// The editor error, positioned by parsing the locator back into a range
    pub fn to_error(&self) -> Result<NormalizedError> {
        let range: SourceRange = self.locator.parse()?;
        Ok(NormalizedError::error(
            ErrorSource::Vsac,
            range,
            self.message.clone(),
        ))
    }
}

fn failure_message(reference: &ValueSetReference, err: &EditorError) -> String {
    match err {
        EditorError::Status { message, .. } => {
            format!("{}: {message}", reference.name)
        }
        _ => LOOKUP_FAILED_MESSAGE.to_string(),
    }
}

/// Look up every value set and collect the failures.
///
/// At most `concurrency` lookups are in flight at once. Failures are
/// returned in declaration order. When the session is not signed in no
/// lookup is made and every value set is reported with
/// [`LOGIN_REQUIRED_MESSAGE`].
pub async fn validate_value_sets(
    service: &dyn TerminologyService,
    session: &SessionContext,
    value_sets: &[ValueSetReference],
    logged_in: bool,
    concurrency: usize,
) -> Vec<ValueSetFailure> {
    if !logged_in {
        return value_sets
            .iter()
            .map(|reference| ValueSetFailure {
                message: LOGIN_REQUIRED_MESSAGE.to_string(),
                locator: reference.locator.clone(),
            })
            .collect();
    }

    let outcomes: Vec<(ValueSetReference, Result<()>)> =
        stream::iter(value_sets.iter().cloned())
            .map(|reference| async move {
                let outcome = service
                    .get_value_set(session, &reference.oid)
                    .await
                    .map(|_| ());
                (reference, outcome)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

    outcomes
        .into_iter()
        .filter_map(|(reference, outcome)| match outcome {
            Ok(()) => None,
            Err(err) => {
                warn!("value set \"{}\" ({}) failed: {err}", reference.name, reference.oid);
                Some(ValueSetFailure {
                    message: failure_message(&reference, &err),
                    locator: reference.locator,
                })
            }
        })
        .collect()
}
