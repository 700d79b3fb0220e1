//! CQL editor diagnostics and error handling
//!
//! This crate provides the shared vocabulary of the editor validation pipeline:
//! source positions and locators, the normalized error shape every validator
//! reduces into, structured error codes, and the pipeline error type.

mod error;
mod error_code;
mod normalized;
mod span;

pub use error::*;
pub use error_code::*;
pub use normalized::*;
pub use span::*;

/// Result type for CQL editor operations
pub type Result<T> = std::result::Result<T, EditorError>;
