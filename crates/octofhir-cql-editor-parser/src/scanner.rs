//! Lexical scanning of expression bodies
//!
//! Expression bodies are not parsed; the scanner only checks that strings,
//! quoted identifiers and comments are terminated and that delimiters balance,
//! and finds where the body ends.

use octofhir_cql_editor_diagnostics::{CQLE0003, CQLE0004, CQLE0005, CQLE0006, CQLE0007, ErrorCode, Span};

/// A lexical problem found inside a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexicalError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Span,
}

impl LexicalError {
    fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }
}

/// Outcome of scanning one body
#[derive(Debug, Default)]
pub(crate) struct BodyScan {
    /// Offset where the next statement begins, or the end of input
    pub end: usize,
    pub errors: Vec<LexicalError>,
    /// Whether the body contains any token besides trivia
    pub has_content: bool,
}

fn closes(open: char, close: char) -> bool {
    // Interval bounds mix brackets: Interval[a, b)
    match open {
        '(' | '[' => close == ')' || close == ']',
        '{' => close == '}',
        _ => false,
    }
}

fn end_of_line(source: &str, from: usize) -> usize {
    source[from..]
        .find('\n')
        .map(|i| from + i)
        .unwrap_or(source.len())
}

/// Find the closing quote of a literal opened at `start`, honoring backslash escapes
fn closing_quote(source: &str, start: usize, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in source[start + quote.len_utf8()..].char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some(start + quote.len_utf8() + i);
        }
    }
    None
}

/// Scan a body starting at `start`.
///
/// `is_boundary(offset, depth)` is asked for the first token of every new line
/// and decides whether a new statement begins there.
pub(crate) fn scan_body(
    source: &str,
    start: usize,
    is_boundary: impl Fn(usize, usize) -> bool,
) -> BodyScan {
    let mut scan = BodyScan {
        end: source.len(),
        ..BodyScan::default()
    };
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut at_line_start = false;
    let mut i = start;

    while i < source.len() {
        let Some(c) = source[i..].chars().next() else {
            break;
        };

        if at_line_start && !c.is_whitespace() {
            at_line_start = false;
            if is_boundary(i, stack.len()) {
                scan.end = i;
                break;
            }
        }

        match c {
            '\n' => {
                at_line_start = true;
            }
            '/' if source[i..].starts_with("//") => {
                i = end_of_line(source, i);
                continue;
            }
            '/' if source[i..].starts_with("/*") => match source[i + 2..].find("*/") {
                Some(close) => {
                    i += close + 4;
                    continue;
                }
                None => {
                    scan.errors.push(LexicalError::new(
                        CQLE0005,
                        "Unterminated block comment",
                        Span::new(i, end_of_line(source, i)),
                    ));
                    i = source.len();
                    continue;
                }
            },
            '\'' | '"' | '`' => {
                scan.has_content = true;
                match closing_quote(source, i, c) {
                    Some(close) => {
                        i = close + c.len_utf8();
                    }
                    None => {
                        let (code, message) = if c == '\'' {
                            (CQLE0003, "Unterminated string literal")
                        } else {
                            (CQLE0004, "Unterminated quoted identifier")
                        };
                        let eol = end_of_line(source, i);
                        scan.errors
                            .push(LexicalError::new(code, message, Span::new(i, eol)));
                        i = eol;
                    }
                }
                continue;
            }
            '(' | '[' | '{' => {
                scan.has_content = true;
                stack.push((c, i));
            }
            ')' | ']' | '}' => {
                scan.has_content = true;
                match stack.last() {
                    Some((open, _)) if closes(*open, c) => {
                        stack.pop();
                    }
                    _ => scan.errors.push(LexicalError::new(
                        CQLE0007,
                        format!("Unexpected '{c}'"),
                        Span::new(i, i + 1),
                    )),
                }
            }
            c if !c.is_whitespace() => {
                scan.has_content = true;
            }
            _ => {}
        }
        i += c.len_utf8();
    }

    for (open, offset) in stack {
        let expected = match open {
            '(' => ')',
            '[' => ']',
            _ => '}',
        };
        scan.errors.push(LexicalError::new(
            CQLE0006,
            format!("Missing closing '{expected}' for '{open}'"),
            Span::new(offset, offset + 1),
        ));
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn never(_: usize, _: usize) -> bool {
        false
    }

    #[test]
    fn test_balanced_body() {
        let source = "Interval[@2020-01-01, @2021-01-01) contains Today() and {1, 2}";
        let scan = scan_body(source, 0, never);
        assert!(scan.errors.is_empty(), "{:?}", scan.errors);
        assert!(scan.has_content);
        assert_eq!(scan.end, source.len());
    }

    #[test]
    fn test_unclosed_paren() {
        let source = "(1 + 2";
        let scan = scan_body(source, 0, never);
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].code, CQLE0006);
        assert_eq!(scan.errors[0].span, Span::new(0, 1));
    }

    #[test]
    fn test_unexpected_close() {
        let scan = scan_body("1 + 2}", 0, never);
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].code, CQLE0007);
        assert_eq!(scan.errors[0].message, "Unexpected '}'");
    }

    #[test]
    fn test_delimiters_inside_strings_and_comments_are_ignored() {
        let source = "'(' + \"[x\" // )\n + /* } */ 1";
        let scan = scan_body(source, 0, never);
        assert!(scan.errors.is_empty(), "{:?}", scan.errors);
    }

    #[test]
    fn test_unterminated_string_resumes_on_next_line() {
        let source = "'abc\n(1";
        let scan = scan_body(source, 0, never);
        let codes: Vec<_> = scan.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![CQLE0003, CQLE0006]);
        assert_eq!(scan.errors[0].span, Span::new(0, 4));
    }

    #[test]
    fn test_escaped_quote_does_not_close_string() {
        let scan = scan_body(r"'it\'s'", 0, never);
        assert!(scan.errors.is_empty());
    }

    #[test]
    fn test_stops_at_boundary() {
        let source = "true\ndefine Next: false";
        let scan = scan_body(source, 0, |offset, _| source[offset..].starts_with("define"));
        assert_eq!(scan.end, 5);
        assert!(scan.errors.is_empty());
    }

    #[test]
    fn test_unterminated_block_comment() {
        let scan = scan_body("1 /* never closed", 0, never);
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].code, CQLE0005);
    }

    #[test]
    fn test_empty_body_has_no_content() {
        let scan = scan_body("   // just a comment\n", 0, never);
        assert!(!scan.has_content);
    }
}
