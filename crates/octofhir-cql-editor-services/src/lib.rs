//! Remote services of the CQL editor validation pipeline
//!
//! Provides the configuration and session context for the ELM translation and
//! VSAC terminology services, async service traits with their HTTP clients,
//! and the validators built on top of them:
//!
//! - [`check_login`] resolves the UMLS session state, failing closed
//! - [`validate_codes`] validates code declarations in one batched request
//! - [`validate_value_sets`] looks up value sets with a bounded fan-out
//! - [`TranslationService::translate`] compiles CQL to ELM

pub mod codes;
pub mod config;
mod http;
pub mod login;
pub mod model;
pub mod session;
pub mod terminology;
pub mod translation;
pub mod value_sets;

pub use codes::{
    HELPDESK_MESSAGE, LOGIN_REQUIRED_MESSAGE, ValidatedCode, code_errors, validate_codes,
};
pub use config::{EditorConfig, ServiceConfig};
pub use login::check_login;
pub use model::DataModel;
pub use session::SessionContext;
pub use terminology::{
    CodeSystemValidation, CodeValidation, HttpTerminologyClient, TerminologyService,
};
pub use translation::{
    ElmLibrary, ElmTranslation, ElmValueSetDef, HttpTranslationClient, TranslationError,
    TranslationService,
};
pub use value_sets::{ValueSetFailure, ValueSetReference, validate_value_sets};
