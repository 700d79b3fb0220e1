//! CLI functionality for the CQL editor pipeline
//!
//! This module contains all CLI-related functionality including:
//! - Offline declaration and syntax reports
//! - Full validation against the translator and VSAC
//! - Output formatting

pub mod output;
pub mod parse;
pub mod validate;
