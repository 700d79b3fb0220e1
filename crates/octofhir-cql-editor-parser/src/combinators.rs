//! Lexical combinators for CQL declarations

use winnow::ModalResult;
use winnow::ascii::multispace0;
use winnow::combinator::fail;
use winnow::prelude::*;
use winnow::token::{any, take, take_till, take_while};

pub(crate) type Input<'a> = &'a str;
pub(crate) type PResult<T> = ModalResult<T>;

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte offset of the remaining input within the full source
pub(crate) fn offset_of(source: &str, input: &str) -> usize {
    source.len() - input.len()
}

/// The identifier-like word at the start of `text`, if any
pub(crate) fn leading_word(text: &str) -> Option<&str> {
    let end = text
        .char_indices()
        .find(|(_, c)| !is_identifier_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let word = &text[..end];
    word.starts_with(is_identifier_start).then_some(word)
}

fn blank<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    multispace0.parse_next(input)
}

fn rest_of_line<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_till(0.., '\n').parse_next(input)
}

/// Skip whitespace and comments.
///
/// An unterminated block comment swallows the rest of the input; the driver
/// reports it when it scans trivia between statements.
pub(crate) fn ws(input: &mut Input<'_>) -> PResult<()> {
    loop {
        let before = input.len();
        blank(input)?;
        if input.starts_with("//") {
            rest_of_line(input)?;
        } else if input.starts_with("/*") {
            match input[2..].find("*/") {
                Some(end) => *input = &input[end + 4..],
                None => *input = &input[input.len()..],
            }
        }
        if input.len() == before {
            return Ok(());
        }
    }
}

/// Match a single character
pub(crate) fn symbol(input: &mut Input<'_>, mut expected: char) -> PResult<char> {
    expected.parse_next(input)
}

/// Match a symbol surrounded by optional trivia
pub(crate) fn padded_symbol(input: &mut Input<'_>, expected: char) -> PResult<char> {
    ws(input)?;
    let matched = symbol(input, expected)?;
    ws(input)?;
    Ok(matched)
}

/// An identifier-like word (letters, digits, underscore; not starting with a digit)
pub(crate) fn word<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., is_identifier_char)
        .verify(|w: &str| w.starts_with(is_identifier_start))
        .parse_next(input)
}

/// Match an exact keyword on a word boundary
pub(crate) fn keyword<'a>(input: &mut Input<'a>, kw: &'static str) -> PResult<&'a str> {
    word.verify(move |w: &str| w == kw).parse_next(input)
}

/// Match a keyword followed by optional trivia
pub(crate) fn padded_keyword<'a>(input: &mut Input<'a>, kw: &'static str) -> PResult<&'a str> {
    let matched = keyword(input, kw)?;
    ws(input)?;
    Ok(matched)
}

pub(crate) fn failure<T>(input: &mut Input<'_>) -> PResult<T> {
    fail(input)
}

fn next_char(input: &mut Input<'_>) -> PResult<char> {
    any.parse_next(input)
}

fn hex_digits<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take(4usize).parse_next(input)
}

/// Body of a delimited literal; the opening delimiter is already consumed
fn delimited_body(input: &mut Input<'_>, close: char) -> PResult<String> {
    let mut value = String::new();
    loop {
        match next_char(input)? {
            c if c == close => return Ok(value),
            '\\' => match next_char(input)? {
                'n' => value.push('\n'),
                'r' => value.push('\r'),
                't' => value.push('\t'),
                'f' => value.push('\u{000C}'),
                'u' => {
                    let digits = hex_digits(input)?;
                    match u32::from_str_radix(digits, 16).ok().and_then(char::from_u32) {
                        Some(c) => value.push(c),
                        None => {
                            value.push_str("\\u");
                            value.push_str(digits);
                        }
                    }
                }
                other => value.push(other),
            },
            c => value.push(c),
        }
    }
}

/// A single-quoted string literal, unescaped
pub(crate) fn string_literal(input: &mut Input<'_>) -> PResult<String> {
    symbol(input, '\'')?;
    delimited_body(input, '\'')
}

/// A regular, double-quoted or back-quoted identifier
pub(crate) fn identifier(input: &mut Input<'_>) -> PResult<String> {
    if input.starts_with('"') {
        symbol(input, '"')?;
        delimited_body(input, '"')
    } else if input.starts_with('`') {
        symbol(input, '`')?;
        delimited_body(input, '`')
    } else {
        word(input).map(str::to_string)
    }
}

/// A dotted identifier such as `Common.Helpers` or `Lib."Code System"`
pub(crate) fn qualified_identifier(input: &mut Input<'_>) -> PResult<Vec<String>> {
    let mut parts = vec![identifier(input)?];
    loop {
        let checkpoint = *input;
        if symbol(input, '.').is_err() {
            *input = checkpoint;
            break;
        }
        match identifier(input) {
            Ok(part) => parts.push(part),
            Err(_) => {
                *input = checkpoint;
                break;
            }
        }
    }
    Ok(parts)
}

/// Text up to (not including) the next occurrence of `stop` on the current line
pub(crate) fn line_text_until<'a>(input: &mut Input<'a>, stop: char) -> PResult<&'a str> {
    take_till(0.., move |c: char| c == stop || c == '\n').parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("'abc'", "abc")]
    #[case(r"'it\'s'", "it's")]
    #[case(r"'a\nb'", "a\nb")]
    #[case(r"'A'", "A")]
    fn test_string_literal(#[case] source: &str, #[case] expected: &str) {
        let mut input = source;
        assert_eq!(string_literal(&mut input).unwrap(), expected);
        assert!(input.is_empty());
    }

    #[test]
    fn test_padded_symbol() {
        let mut input = "  /* c */ : rest";
        assert_eq!(padded_symbol(&mut input, ':').unwrap(), ':');
        assert_eq!(input, "rest");

        let mut input = "; rest";
        assert!(symbol(&mut input, ':').is_err());
        assert_eq!(input, "; rest");
    }

    #[test]
    fn test_unterminated_string_fails() {
        let mut input = "'abc";
        assert!(string_literal(&mut input).is_err());
    }

    #[rstest]
    #[case("Foo rest", "Foo")]
    #[case("\"Measurement Period\" rest", "Measurement Period")]
    #[case("`quoted` rest", "quoted")]
    fn test_identifier(#[case] source: &str, #[case] expected: &str) {
        let mut input = source;
        assert_eq!(identifier(&mut input).unwrap(), expected);
        assert_eq!(input, " rest");
    }

    #[test]
    fn test_qualified_identifier() {
        let mut input = "Common.\"LOINC\" x";
        assert_eq!(
            qualified_identifier(&mut input).unwrap(),
            vec!["Common".to_string(), "LOINC".to_string()]
        );
        assert_eq!(input, " x");
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        let mut input = "codesystem";
        assert!(keyword(&mut input, "code").is_err());
        let mut input = "code \"x\"";
        assert_eq!(keyword(&mut input, "code").unwrap(), "code");
    }

    #[test]
    fn test_ws_skips_comments() {
        let mut input = "  // line\n /* block */\n  define";
        ws(&mut input).unwrap();
        assert_eq!(input, "define");
    }

    #[test]
    fn test_leading_word() {
        assert_eq!(leading_word("define X"), Some("define"));
        assert_eq!(leading_word("9abc"), None);
        assert_eq!(leading_word("\"x\""), None);
    }
}
