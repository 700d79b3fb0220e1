//! Validation pipeline of a CQL source editor
//!
//! This crate ties the editor validation flow together:
//! - Parsing editor content into declarations and syntax errors
//! - Cross-checking codes and value sets with VSAC and compiling to ELM
//! - Merging every finding into one normalized error list
//! - Projecting errors onto editor annotations and underline markers
//! - Debounced validation sessions that never publish stale results
//! - Formatting CQL Builder snippets and inserting them into the buffer
//!
//! # Example
//!
//! ```ignore
//! use octofhir_cql_editor::{ErrorAggregator, EditorView, SessionContext, parse};
//!
//! let aggregator = ErrorAggregator::from_config(&config.services)?;
//! let text = "library Example version '1.0.0'\nusing QDM version '5.6'";
//! let outcome = aggregator.aggregate(text, &parse(text), &session).await?;
//! let view = EditorView::from_outcome(outcome.as_deref());
//! ```

// Re-export the pipeline crates
pub use octofhir_cql_editor_diagnostics as diagnostics;
pub use octofhir_cql_editor_parser as parser;
pub use octofhir_cql_editor_services as services;

pub mod aggregator;
pub mod annotations;
pub mod session;
pub mod snippet;

// Convenience re-exports
pub use aggregator::ErrorAggregator;
pub use annotations::{
    AnnotationType, EditorAnnotation, EditorMarker, EditorRange, EditorView, ValidationSummary,
    to_annotations, to_markers,
};
pub use octofhir_cql_editor_diagnostics::{EditorError, NormalizedError, Result};
pub use octofhir_cql_editor_parser::{ParseResult, is_blank, parse};
pub use octofhir_cql_editor_services::{DataModel, EditorConfig, SessionContext};
pub use session::{EditorSession, ValidationSnapshot};
pub use snippet::{Snippet, SnippetApplication, apply_snippet};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
