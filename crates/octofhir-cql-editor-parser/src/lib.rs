//! CQL declaration parser using Winnow
//!
//! Extracts the declarations an editor needs (library header, using, include,
//! terminology declarations, parameters and definitions) together with
//! lexical and structural syntax errors. Expression bodies are scanned, not
//! parsed; full semantic checking is left to the translation service.

mod combinators;
mod declarations;
mod library;
mod scanner;

pub use declarations::*;
pub use library::parse;

use octofhir_cql_editor_diagnostics::SyntaxError;
use serde::{Deserialize, Serialize};

/// Everything extracted from one CQL text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub library: Option<LibraryDeclaration>,
    pub usings: Vec<UsingDeclaration>,
    pub includes: Vec<IncludeDeclaration>,
    pub code_systems: Vec<CodeSystemDeclaration>,
    pub value_sets: Vec<ValueSetDeclaration>,
    pub codes: Vec<CodeDeclaration>,
    pub concepts: Vec<ConceptDeclaration>,
    pub parameters: Vec<ParameterDeclaration>,
    pub contexts: Vec<ContextDeclaration>,
    pub definitions: Vec<Definition>,
    /// Syntax errors in source order
    pub syntax_errors: Vec<SyntaxError>,
}

impl ParseResult {
    /// Check if no declaration was found
    pub fn is_empty(&self) -> bool {
        self.library.is_none()
            && self.usings.is_empty()
            && self.includes.is_empty()
            && self.code_systems.is_empty()
            && self.value_sets.is_empty()
            && self.codes.is_empty()
            && self.concepts.is_empty()
            && self.parameters.is_empty()
            && self.contexts.is_empty()
            && self.definitions.is_empty()
    }

    pub fn has_syntax_errors(&self) -> bool {
        !self.syntax_errors.is_empty()
    }

    /// Look up a code system declaration by name
    pub fn code_system(&self, name: &str) -> Option<&CodeSystemDeclaration> {
        self.code_systems.iter().find(|cs| cs.name == name)
    }

    /// Look up a definition by name
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Data model named by the first `using` declaration
    pub fn model(&self) -> Option<&str> {
        self.usings.first().map(|u| u.model.as_str())
    }
}

/// Whether the text is empty or whitespace only
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
