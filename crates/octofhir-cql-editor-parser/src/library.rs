//! Library statement parser using winnow
//!
//! Declaration statements are parsed with winnow combinators; expression
//! bodies of `define` and `parameter ... default` are handed to the scanner.
//! Errors never abort the parse: the driver records them and resumes at the
//! next line that starts a statement.

use crate::ParseResult;
use crate::combinators::{
    Input, PResult, failure, identifier, leading_word, line_text_until, offset_of, padded_keyword,
    padded_symbol, qualified_identifier, string_literal, symbol, ws,
};
use crate::declarations::{
    AccessModifier, CodeDeclaration, CodeSystemDeclaration, ConceptDeclaration, ContextDeclaration,
    Definition, IncludeDeclaration, LibraryDeclaration, ParameterDeclaration, UsingDeclaration,
    ValueSetDeclaration,
};
use crate::scanner::scan_body;
use log::debug;
use octofhir_cql_editor_diagnostics::{
    CQLE0001, CQLE0005, CQLE0008, CQLE0009, CQLE0010, CQLE0011, CQLE0012, CQLE0013, CQLE0014,
    CQLE0015, CQLE0016, CQLE0017, ErrorCode, LineIndex, Span, SyntaxError,
};
use winnow::combinator::{alt, opt, separated};
use winnow::prelude::*;
use winnow::token::take_till;

/// Parse CQL source into its declarations and syntax errors.
///
/// Never fails: malformed input is reported through
/// [`ParseResult::syntax_errors`].
pub fn parse(source: &str) -> ParseResult {
    let result = LibraryParser::new(source).run();
    debug!(
        "parsed {} bytes: {} definitions, {} codes, {} value sets, {} syntax errors",
        source.len(),
        result.definitions.len(),
        result.codes.len(),
        result.value_sets.len(),
        result.syntax_errors.len()
    );
    result
}

/// Kinds of top-level statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Library,
    Using,
    Include,
    CodeSystem,
    ValueSet,
    Code,
    Concept,
    Parameter,
    Context,
    Define,
}

impl StatementKind {
    /// Detect the statement kind from its leading keyword(s)
    fn detect(text: &str) -> Option<Self> {
        let mut word = leading_word(text)?;
        if word == "public" || word == "private" {
            let rest = text[word.len()..].trim_start();
            word = leading_word(rest)?;
        }
        match word {
            "library" => Some(Self::Library),
            "using" => Some(Self::Using),
            "include" => Some(Self::Include),
            "codesystem" => Some(Self::CodeSystem),
            "valueset" => Some(Self::ValueSet),
            "code" => Some(Self::Code),
            "concept" => Some(Self::Concept),
            "parameter" => Some(Self::Parameter),
            "context" => Some(Self::Context),
            "define" => Some(Self::Define),
            _ => None,
        }
    }

    fn error_code(self) -> ErrorCode {
        match self {
            Self::Library => CQLE0008,
            Self::Using => CQLE0009,
            Self::Include => CQLE0010,
            Self::CodeSystem => CQLE0011,
            Self::ValueSet => CQLE0012,
            Self::Code => CQLE0013,
            Self::Concept => CQLE0014,
            Self::Parameter => CQLE0015,
            Self::Context => CQLE0016,
            Self::Define => CQLE0017,
        }
    }

    /// Statements that unconditionally end an expression body
    fn always_ends_body(self) -> bool {
        matches!(self, Self::Define | Self::Context)
    }
}

/// A parsed statement head
enum Statement {
    Library(String, Option<String>),
    Using(String, Option<String>),
    Include {
        name: String,
        version: Option<String>,
        alias: Option<String>,
    },
    CodeSystem {
        name: String,
        oid: String,
        version: Option<String>,
    },
    ValueSet {
        name: String,
        url: String,
        version: Option<String>,
    },
    Code {
        name: String,
        code_id: String,
        code_system: Vec<String>,
        display: Option<String>,
    },
    Concept {
        name: String,
        codes: Vec<String>,
        display: Option<String>,
    },
    Parameter {
        name: String,
        type_specifier: Option<String>,
        has_default: bool,
    },
    Context(String),
    Define {
        name: String,
        access: AccessModifier,
        is_function: bool,
        is_fluent: bool,
    },
}

struct LibraryParser<'a> {
    source: &'a str,
    index: LineIndex<'a>,
    result: ParseResult,
}

impl<'a> LibraryParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            result: ParseResult::default(),
        }
    }

    fn run(mut self) -> ParseResult {
        let mut pos = self.skip_trivia(0);
        while pos < self.source.len() {
            pos = match StatementKind::detect(&self.source[pos..]) {
                Some(kind) => self.statement(kind, pos),
                None => self.unexpected_token(pos),
            };
            pos = self.skip_trivia(pos);
        }
        self.result
    }

    fn error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.result
            .syntax_errors
            .push(SyntaxError::new(code, message, self.index.range(span)));
    }

    /// Skip whitespace and comments between statements
    fn skip_trivia(&mut self, mut pos: usize) -> usize {
        loop {
            let rest = &self.source[pos..];
            let trimmed = rest.trim_start();
            pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => pos += end + 4,
                    None => {
                        let eol = self.end_of_line(pos);
                        self.error(CQLE0005, "Unterminated block comment", Span::new(pos, eol));
                        return self.source.len();
                    }
                }
            } else {
                return pos;
            }
        }
    }

    fn end_of_line(&self, pos: usize) -> usize {
        let line = &self.source[pos..];
        pos + line.find('\n').unwrap_or(line.len())
    }

    /// Offset of the first token of the next line that starts a statement
    fn recover(&self, from: usize) -> usize {
        let mut line_start = self.end_of_line(from);
        while line_start < self.source.len() {
            line_start += 1;
            let line = &self.source[line_start..];
            let trimmed = line.trim_start_matches([' ', '\t', '\r']);
            if StatementKind::detect(trimmed).is_some() {
                return line_start + (line.len() - trimmed.len());
            }
            line_start = self.end_of_line(line_start);
        }
        self.source.len()
    }

    /// Whether a new statement starts at `offset` while scanning a body
    fn is_body_boundary(&self, offset: usize, depth: usize) -> bool {
        let text = &self.source[offset..];
        let Some(kind) = StatementKind::detect(text) else {
            return false;
        };
        if kind.always_ends_body() {
            return true;
        }
        // Words like `code` also appear inside expressions; only a well-formed
        // declaration at nesting depth zero ends the body.
        if depth > 0 {
            return false;
        }
        let mut input: Input<'_> = text;
        parse_statement(kind, &mut input).is_ok()
    }

    fn unexpected_token(&mut self, pos: usize) -> usize {
        let rest = &self.source[pos..];
        let len = leading_word(rest)
            .map(str::len)
            .or_else(|| rest.chars().next().map(char::len_utf8))
            .unwrap_or(0);
        let token = &rest[..len];
        self.error(
            CQLE0001,
            format!("Unexpected token '{token}'"),
            Span::new(pos, pos + len),
        );
        self.recover(pos)
    }

    fn statement(&mut self, kind: StatementKind, start: usize) -> usize {
        let mut input: Input<'a> = &self.source[start..];
        let parsed = parse_statement(kind, &mut input);
        let head_end = offset_of(self.source, input);

        let statement = match parsed {
            Ok(statement) => statement,
            Err(_) => {
                let eol = self.end_of_line(start);
                let end = start + self.source[start..eol].trim_end().len();
                self.error(
                    kind.error_code(),
                    kind.error_code().info().description,
                    Span::new(start, end),
                );
                return self.recover(start);
            }
        };

        let body = match &statement {
            Statement::Define { .. } => true,
            Statement::Parameter { has_default, .. } => *has_default,
            _ => false,
        };

        let end = if body {
            // The header may have consumed trailing trivia; scan from the last token
            // so a line break before the next statement is seen.
            let body_start = start + self.source[start..head_end].trim_end().len();
            let scan = scan_body(self.source, body_start, |offset, depth| {
                self.is_body_boundary(offset, depth)
            });
            for error in scan.errors {
                self.error(error.code, error.message, error.span);
            }
            if !scan.has_content {
                let message = match &statement {
                    Statement::Define { name, .. } => {
                        format!("Definition \"{name}\" is missing an expression")
                    }
                    _ => "Parameter default is missing an expression".to_string(),
                };
                self.error(kind.error_code(), message, Span::new(start, body_start));
            }
            scan.end
        } else {
            head_end
        };

        let trimmed_end = start + self.source[start..end].trim_end().len();
        self.record(statement, Span::new(start, trimmed_end));

        if body {
            return end;
        }

        // A declaration must be followed by another statement or the end of input.
        let next = self.skip_trivia(end);
        if next < self.source.len() && StatementKind::detect(&self.source[next..]).is_none() {
            return self.unexpected_token(next);
        }
        next
    }

    fn record(&mut self, statement: Statement, span: Span) {
        let range = self.index.range(span);
        match statement {
            Statement::Library(name, version) => {
                if self.result.library.is_some() {
                    self.error(CQLE0008, "Duplicate library declaration", span);
                } else {
                    self.result.library = Some(LibraryDeclaration {
                        name,
                        version,
                        range,
                    });
                }
            }
            Statement::Using(model, version) => self.result.usings.push(UsingDeclaration {
                model,
                version,
                range,
            }),
            Statement::Include {
                name,
                version,
                alias,
            } => self.result.includes.push(IncludeDeclaration {
                name,
                version,
                alias,
                range,
            }),
            Statement::CodeSystem { name, oid, version } => {
                self.result.code_systems.push(CodeSystemDeclaration {
                    name,
                    oid,
                    version,
                    range,
                })
            }
            Statement::ValueSet { name, url, version } => {
                self.result.value_sets.push(ValueSetDeclaration {
                    name,
                    url,
                    version,
                    range,
                })
            }
            Statement::Code {
                name,
                code_id,
                mut code_system,
                display,
            } => {
                let system = code_system.pop().unwrap_or_default();
                let library = (!code_system.is_empty()).then(|| code_system.join("."));
                self.result.codes.push(CodeDeclaration {
                    name,
                    code_id,
                    code_system: system,
                    code_system_library: library,
                    display,
                    range,
                })
            }
            Statement::Concept {
                name,
                codes,
                display,
            } => self.result.concepts.push(ConceptDeclaration {
                name,
                codes,
                display,
                range,
            }),
            Statement::Parameter {
                name,
                type_specifier,
                has_default,
            } => self.result.parameters.push(ParameterDeclaration {
                name,
                type_specifier,
                has_default,
                range,
            }),
            Statement::Context(context) => self
                .result
                .contexts
                .push(ContextDeclaration { context, range }),
            Statement::Define {
                name,
                access,
                is_function,
                is_fluent,
            } => self.result.definitions.push(Definition {
                name,
                access,
                is_function,
                is_fluent,
                range,
            }),
        }
    }
}

fn parse_statement(kind: StatementKind, input: &mut Input<'_>) -> PResult<Statement> {
    match kind {
        StatementKind::Library => library_statement(input),
        StatementKind::Using => using_statement(input),
        StatementKind::Include => include_statement(input),
        StatementKind::CodeSystem => codesystem_statement(input),
        StatementKind::ValueSet => valueset_statement(input),
        StatementKind::Code => code_statement(input),
        StatementKind::Concept => concept_statement(input),
        StatementKind::Parameter => parameter_statement(input),
        StatementKind::Context => context_statement(input),
        StatementKind::Define => define_statement(input),
    }
}

fn public_modifier(input: &mut Input<'_>) -> PResult<AccessModifier> {
    padded_keyword(input, "public").map(|_| AccessModifier::Public)
}

fn private_modifier(input: &mut Input<'_>) -> PResult<AccessModifier> {
    padded_keyword(input, "private").map(|_| AccessModifier::Private)
}

fn access_modifier(input: &mut Input<'_>) -> PResult<AccessModifier> {
    alt((public_modifier, private_modifier)).parse_next(input)
}

fn fluent_modifier(input: &mut Input<'_>) -> PResult<()> {
    padded_keyword(input, "fluent").map(|_| ())
}

fn function_modifier(input: &mut Input<'_>) -> PResult<()> {
    padded_keyword(input, "function").map(|_| ())
}

/// `returns <type>` up to the colon
fn returns_clause(input: &mut Input<'_>) -> PResult<()> {
    padded_keyword(input, "returns")?;
    text_until(input, ':').map(|_| ())
}

/// `version '<string>'`
fn version_clause(input: &mut Input<'_>) -> PResult<String> {
    ws(input)?;
    padded_keyword(input, "version")?;
    string_literal(input)
}

/// `display '<string>'`
fn display_clause(input: &mut Input<'_>) -> PResult<String> {
    ws(input)?;
    padded_keyword(input, "display")?;
    string_literal(input)
}

/// `called <identifier>`
fn called_clause(input: &mut Input<'_>) -> PResult<String> {
    ws(input)?;
    padded_keyword(input, "called")?;
    identifier(input)
}

/// `<identifier> :`
fn named_head(input: &mut Input<'_>) -> PResult<String> {
    let name = identifier(input)?;
    padded_symbol(input, ':')?;
    Ok(name)
}

fn library_statement(input: &mut Input<'_>) -> PResult<Statement> {
    padded_keyword(input, "library")?;
    let name = qualified_identifier(input)?.join(".");
    let version = opt(version_clause).parse_next(input)?;
    Ok(Statement::Library(name, version))
}

fn using_statement(input: &mut Input<'_>) -> PResult<Statement> {
    padded_keyword(input, "using")?;
    let model = identifier(input)?;
    let version = opt(version_clause).parse_next(input)?;
    opt(called_clause).parse_next(input)?;
    Ok(Statement::Using(model, version))
}

fn include_statement(input: &mut Input<'_>) -> PResult<Statement> {
    padded_keyword(input, "include")?;
    let name = qualified_identifier(input)?.join(".");
    let version = opt(version_clause).parse_next(input)?;
    let alias = opt(called_clause).parse_next(input)?;
    Ok(Statement::Include {
        name,
        version,
        alias,
    })
}

fn codesystem_statement(input: &mut Input<'_>) -> PResult<Statement> {
    opt(access_modifier).parse_next(input)?;
    padded_keyword(input, "codesystem")?;
    let name = named_head(input)?;
    let oid = string_literal(input)?;
    let version = opt(version_clause).parse_next(input)?;
    Ok(Statement::CodeSystem { name, oid, version })
}

/// A qualified reference inside a `{ ... }` list
fn list_item(input: &mut Input<'_>) -> PResult<Vec<String>> {
    let item = qualified_identifier(input)?;
    ws(input)?;
    Ok(item)
}

fn list_separator(input: &mut Input<'_>) -> PResult<char> {
    padded_symbol(input, ',')
}

/// `{ "A", Lib."B" }`
fn reference_list(input: &mut Input<'_>) -> PResult<Vec<Vec<String>>> {
    symbol(input, '{')?;
    ws(input)?;
    let items: Vec<Vec<String>> = separated(1.., list_item, list_separator).parse_next(input)?;
    symbol(input, '}')?;
    Ok(items)
}

/// `codesystems { "A", Lib."B" }`
fn codesystems_clause(input: &mut Input<'_>) -> PResult<Vec<Vec<String>>> {
    ws(input)?;
    padded_keyword(input, "codesystems")?;
    reference_list(input)
}

fn valueset_statement(input: &mut Input<'_>) -> PResult<Statement> {
    opt(access_modifier).parse_next(input)?;
    padded_keyword(input, "valueset")?;
    let name = named_head(input)?;
    let url = string_literal(input)?;
    let version = opt(version_clause).parse_next(input)?;
    opt(codesystems_clause).parse_next(input)?;
    Ok(Statement::ValueSet { name, url, version })
}

fn code_statement(input: &mut Input<'_>) -> PResult<Statement> {
    opt(access_modifier).parse_next(input)?;
    padded_keyword(input, "code")?;
    let name = named_head(input)?;
    let code_id = string_literal(input)?;
    ws(input)?;
    padded_keyword(input, "from")?;
    let code_system = qualified_identifier(input)?;
    let display = opt(display_clause).parse_next(input)?;
    Ok(Statement::Code {
        name,
        code_id,
        code_system,
        display,
    })
}

fn concept_statement(input: &mut Input<'_>) -> PResult<Statement> {
    opt(access_modifier).parse_next(input)?;
    padded_keyword(input, "concept")?;
    let name = named_head(input)?;
    let codes = reference_list(input)?;
    let display = opt(display_clause).parse_next(input)?;
    Ok(Statement::Concept {
        name,
        codes: codes.into_iter().map(|parts| parts.join(".")).collect(),
        display,
    })
}

/// Split `Interval<DateTime> default Interval[...]` at the `default` keyword
fn split_default(line: &str) -> (&str, Option<usize>) {
    let mut search = 0;
    while let Some(found) = line[search..].find("default") {
        let at = search + found;
        let before_ok = line[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '"');
        let after = at + "default".len();
        let after_ok = line[after..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '"');
        if before_ok && after_ok {
            return (&line[..at], Some(after));
        }
        search = after;
    }
    (line, None)
}

fn parameter_statement(input: &mut Input<'_>) -> PResult<Statement> {
    opt(access_modifier).parse_next(input)?;
    padded_keyword(input, "parameter")?;
    let name = identifier(input)?;

    let line_start = *input;
    let line = line_text_until(input, '\n')?;
    let line = line.split("//").next().unwrap_or_default();
    let (type_text, default_at) = split_default(line);
    let type_text = type_text.trim();
    if let Some(after) = default_at {
        *input = &line_start[after..];
    } else {
        *input = &line_start[line.trim_end().len()..];
    }

    Ok(Statement::Parameter {
        name,
        type_specifier: (!type_text.is_empty()).then(|| type_text.to_string()),
        has_default: default_at.is_some(),
    })
}

fn context_statement(input: &mut Input<'_>) -> PResult<Statement> {
    padded_keyword(input, "context")?;
    let mut parts = qualified_identifier(input)?;
    match parts.pop() {
        Some(context) => Ok(Statement::Context(context)),
        None => failure(input),
    }
}

fn text_until<'a>(input: &mut Input<'a>, stop: char) -> PResult<&'a str> {
    take_till(0.., stop).parse_next(input)
}

fn define_statement(input: &mut Input<'_>) -> PResult<Statement> {
    let leading = opt(access_modifier).parse_next(input)?;
    padded_keyword(input, "define")?;
    let access = opt(access_modifier)
        .parse_next(input)?
        .or(leading)
        .unwrap_or_default();
    let is_fluent = opt(fluent_modifier).parse_next(input)?.is_some();
    let is_function = opt(function_modifier).parse_next(input)?.is_some();

    let name = identifier(input)?;
    if is_function {
        padded_symbol(input, '(')?;
        text_until(input, ')')?;
        padded_symbol(input, ')')?;
        opt(returns_clause).parse_next(input)?;
    } else if is_fluent {
        return failure(input);
    }
    padded_symbol(input, ':')?;

    Ok(Statement::Define {
        name,
        access,
        is_function,
        is_fluent,
    })
}
