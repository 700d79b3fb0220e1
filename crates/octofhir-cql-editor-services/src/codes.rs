//! Code declaration validation
//!
//! Codes are joined to their declared code systems by name and validated in a
//! single batched request. Remote failures never escape: they mark every code
//! invalid with a generic message instead.

use crate::session::SessionContext;
use crate::terminology::{CodeSystemValidation, CodeValidation, TerminologyService};
use log::{debug, warn};
use octofhir_cql_editor_diagnostics::{ErrorSource, NormalizedError};
use octofhir_cql_editor_parser::{CodeDeclaration, CodeSystemDeclaration, ParseResult};
use std::collections::HashSet;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please Login to UMLS";
pub const HELPDESK_MESSAGE: &str = "Unable to validate code, please contact HelpDesk";

/// A code declaration with its resolved code system and validation outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCode {
    pub code: CodeDeclaration,
    pub code_system: CodeSystemDeclaration,
    pub valid: bool,
    pub error_message: Option<String>,
    pub code_system_valid: bool,
    pub code_system_error_message: Option<String>,
}

impl ValidatedCode {
    fn new(code: CodeDeclaration, code_system: CodeSystemDeclaration) -> Self {
        Self {
            code,
            code_system,
            valid: true,
            error_message: None,
            code_system_valid: true,
            code_system_error_message: None,
        }
    }

    fn invalidate(&mut self, message: &str) {
        self.valid = false;
        self.error_message = Some(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.valid && self.code_system_valid
    }

    /// The editor error for an invalid code.
    ///
    /// A code system failure is reported as `VSAC` on the code system
    /// declaration; a failure of the code itself as `Code` on the code.
    pub fn to_error(&self) -> Option<NormalizedError> {
        if !self.code_system_valid {
            let message = self
                .code_system_error_message
                .clone()
                .unwrap_or_else(|| format!("Invalid code system \"{}\"", self.code_system.name));
            return Some(NormalizedError::error(
                ErrorSource::Vsac,
                self.code_system.range,
                message,
            ));
        }
        if !self.valid {
            let message = self
                .error_message
                .clone()
                .unwrap_or_else(|| format!("Invalid code \"{}\"", self.code.name));
            return Some(NormalizedError::error(ErrorSource::Code, self.code.range, message));
        }
        None
    }

    fn request_item(&self) -> CodeValidation {
        CodeValidation {
            name: self.code.name.clone(),
            code_id: self.code.code_id.clone(),
            code_system: CodeSystemValidation {
                name: self.code_system.name.clone(),
                oid: self.code_system.oid.clone(),
                version: self.code_system.version.clone(),
                valid: None,
                error_message: None,
            },
            display: self.code.display.clone(),
            valid: None,
            error_message: None,
        }
    }

    fn apply_response(&mut self, response: CodeValidation) {
        self.valid = response.valid.unwrap_or(true);
        self.error_message = response.error_message;
        self.code_system_valid = response.code_system.valid.unwrap_or(true);
        self.code_system_error_message = response.code_system.error_message;
    }
}

/// Editor errors for a set of validated codes, in code order.
///
/// A code system failure is reported once per code system declaration, no
/// matter how many codes reference it.
pub fn code_errors(codes: &[ValidatedCode]) -> Vec<NormalizedError> {
    let mut reported_systems = HashSet::new();
    codes
        .iter()
        .filter(|code| code.code_system_valid || reported_systems.insert(code.code_system.range))
        .filter_map(ValidatedCode::to_error)
        .collect()
}

/// Join code declarations with the code systems they reference.
///
/// Codes whose code system is not declared in this library are skipped.
fn resolve_codes(parse_result: &ParseResult) -> Vec<ValidatedCode> {
    parse_result
        .codes
        .iter()
        .filter_map(|code| {
            if code.code_system_library.is_some() {
                debug!("skipping code \"{}\" from an included library", code.name);
                return None;
            }
            match parse_result.code_system(&code.code_system) {
                Some(system) => Some(ValidatedCode::new(code.clone(), system.clone())),
                None => {
                    debug!(
                        "skipping code \"{}\": code system \"{}\" is not declared",
                        code.name, code.code_system
                    );
                    None
                }
            }
        })
        .collect()
}

/// Validate every code declaration of a parse result.
///
/// When the session is not signed in, every code is marked invalid with
/// [`LOGIN_REQUIRED_MESSAGE`] and no request is made.
pub async fn validate_codes(
    service: &dyn TerminologyService,
    session: &SessionContext,
    parse_result: &ParseResult,
    logged_in: bool,
) -> Vec<ValidatedCode> {
    let mut codes = resolve_codes(parse_result);
    if codes.is_empty() {
        return codes;
    }

    if !logged_in {
        for code in &mut codes {
            code.invalidate(LOGIN_REQUIRED_MESSAGE);
        }
        return codes;
    }

    let request = codes.iter().map(ValidatedCode::request_item).collect::<Vec<_>>();
    match service.validate_codes(session, session.model, request).await {
        Ok(response) if response.len() == codes.len() => {
            for (code, result) in codes.iter_mut().zip(response) {
                code.apply_response(result);
            }
        }
        Ok(response) => {
            warn!(
                "code validation returned {} items for {} codes",
                response.len(),
                codes.len()
            );
            for code in &mut codes {
                code.invalidate(HELPDESK_MESSAGE);
            }
        }
        Err(err) => {
            warn!("code validation failed: {err}");
            for code in &mut codes {
                code.invalidate(HELPDESK_MESSAGE);
            }
        }
    }
    codes
}
