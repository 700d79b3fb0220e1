//! CQL Builder snippets
//!
//! Formats the statements produced by the builder panel and inserts them into
//! the editor buffer next to the declarations of the same kind.

use log::debug;
use octofhir_cql_editor_parser::{ParseResult, parse};
use octofhir_cql_editor_services::DataModel;

/// Canonical url prefix of VSAC value sets in FHIR based libraries
pub const VSAC_VALUE_SET_URL: &str = "http://cts.nlm.nih.gov/fhir/ValueSet/";

/// A statement built by the builder panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snippet {
    Include {
        name: String,
        version: Option<String>,
        alias: Option<String>,
    },
    ValueSet {
        name: String,
        oid: String,
    },
    CodeSystem {
        name: String,
        /// A bare oid or a full identifier such as `http://loinc.org`
        oid: String,
        version: Option<String>,
    },
    Code {
        name: String,
        code_id: String,
        code_system: String,
        display: Option<String>,
    },
    Parameter {
        name: String,
        type_specifier: String,
        default: Option<String>,
    },
    Definition {
        name: String,
        expression: String,
    },
}

/// Outcome of [`apply_snippet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetApplication {
    /// The new buffer and the 1-based line the statement starts on
    Inserted { text: String, line: u32 },
    /// The buffer already contains this exact statement
    Duplicate,
}

/// Declaration kinds in the order they appear in a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Library,
    Using,
    Include,
    CodeSystem,
    ValueSet,
    Code,
    Parameter,
}

impl Section {
    const ORDER: [Section; 7] = [
        Section::Library,
        Section::Using,
        Section::Include,
        Section::CodeSystem,
        Section::ValueSet,
        Section::Code,
        Section::Parameter,
    ];

    /// Last 1-based line occupied by a declaration of this kind
    fn last_line(self, parsed: &ParseResult) -> Option<u32> {
        match self {
            Section::Library => parsed.library.as_ref().map(|l| l.range.end.line),
            Section::Using => parsed.usings.iter().map(|d| d.range.end.line).max(),
            Section::Include => parsed.includes.iter().map(|d| d.range.end.line).max(),
            Section::CodeSystem => parsed.code_systems.iter().map(|d| d.range.end.line).max(),
            Section::ValueSet => parsed.value_sets.iter().map(|d| d.range.end.line).max(),
            Section::Code => parsed
                .codes
                .iter()
                .map(|d| d.range.end.line)
                .chain(parsed.concepts.iter().map(|d| d.range.end.line))
                .max(),
            Section::Parameter => parsed.parameters.iter().map(|d| d.range.end.line).max(),
        }
    }
}

fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn quoted_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn is_simple_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn identifier(value: &str) -> String {
    if is_simple_identifier(value) {
        value.to_string()
    } else {
        quoted_identifier(value)
    }
}

fn code_system_identifier(oid: &str) -> String {
    if oid.contains(':') {
        oid.to_string()
    } else {
        format!("urn:oid:{oid}")
    }
}

impl Snippet {
    /// The CQL statement for a library of the given model
    pub fn format(&self, model: DataModel) -> String {
        match self {
            Snippet::Include {
                name,
                version,
                alias,
            } => {
                let mut out = format!("include {}", identifier(name));
                if let Some(version) = version {
                    out.push_str(&format!(" version {}", string_literal(version)));
                }
                if let Some(alias) = alias {
                    out.push_str(&format!(" called {}", identifier(alias)));
                }
                out
            }
            Snippet::ValueSet { name, oid } => {
                let url = match model {
                    DataModel::Qdm => format!("urn:oid:{oid}"),
                    DataModel::QiCore => format!("{VSAC_VALUE_SET_URL}{oid}"),
                };
                format!("valueset {}: {}", quoted_identifier(name), string_literal(&url))
            }
            Snippet::CodeSystem { name, oid, version } => {
                let mut out = format!(
                    "codesystem {}: {}",
                    quoted_identifier(name),
                    string_literal(&code_system_identifier(oid))
                );
                if let Some(version) = version {
                    out.push_str(&format!(" version {}", string_literal(version)));
                }
                out
            }
            Snippet::Code {
                name,
                code_id,
                code_system,
                display,
            } => {
                let mut out = format!(
                    "code {}: {} from {}",
                    quoted_identifier(name),
                    string_literal(code_id),
                    quoted_identifier(code_system)
                );
                if let Some(display) = display {
                    out.push_str(&format!(" display {}", string_literal(display)));
                }
                out
            }
            Snippet::Parameter {
                name,
                type_specifier,
                default,
            } => {
                let mut out = format!("parameter {} {type_specifier}", quoted_identifier(name));
                if let Some(default) = default {
                    out.push_str(&format!(" default {default}"));
                }
                out
            }
            Snippet::Definition { name, expression } => {
                format!("define {}:\n  {}", quoted_identifier(name), expression.trim())
            }
        }
    }

    fn section(&self) -> Option<Section> {
        match self {
            Snippet::Include { .. } => Some(Section::Include),
            Snippet::CodeSystem { .. } => Some(Section::CodeSystem),
            Snippet::ValueSet { .. } => Some(Section::ValueSet),
            Snippet::Code { .. } => Some(Section::Code),
            Snippet::Parameter { .. } => Some(Section::Parameter),
            Snippet::Definition { .. } => None,
        }
    }
}

/// Byte offset of the start of the 1-based `line`, or `None` past the end
fn line_start(buffer: &str, line: u32) -> Option<usize> {
    if line <= 1 {
        return Some(0);
    }
    buffer
        .match_indices('\n')
        .nth(line as usize - 2)
        .map(|(i, _)| i + 1)
        .filter(|&offset| offset < buffer.len())
}

/// Insert a snippet into the buffer.
///
/// Declarations go after the last declaration of the same kind, falling back
/// to the closest earlier kind and then to the top of the buffer. Definitions
/// are appended at the end.
pub fn apply_snippet(buffer: &str, snippet: &Snippet, model: DataModel) -> SnippetApplication {
    let statement = snippet.format(model);
    if buffer.contains(&statement) {
        return SnippetApplication::Duplicate;
    }

    let Some(section) = snippet.section() else {
        return append(buffer, &statement);
    };

    let parsed = parse(buffer);
    let anchor = Section::ORDER
        .iter()
        .rev()
        .filter(|s| **s <= section)
        .find_map(|s| s.last_line(&parsed));
    let line = anchor.map_or(1, |l| l + 1);
    debug!("inserting {section:?} snippet at line {line}");

    match line_start(buffer, line) {
        Some(offset) => {
            let mut text = String::with_capacity(buffer.len() + statement.len() + 1);
            text.push_str(&buffer[..offset]);
            text.push_str(&statement);
            text.push('\n');
            text.push_str(&buffer[offset..]);
            SnippetApplication::Inserted { text, line }
        }
        None => {
            let mut text = buffer.to_string();
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            let line = text.matches('\n').count() as u32 + 1;
            text.push_str(&statement);
            text.push('\n');
            SnippetApplication::Inserted { text, line }
        }
    }
}

fn append(buffer: &str, statement: &str) -> SnippetApplication {
    let mut text = buffer.trim_end().to_string();
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    let line = text.matches('\n').count() as u32 + 1;
    text.push_str(statement);
    text.push('\n');
    SnippetApplication::Inserted { text, line }
}
