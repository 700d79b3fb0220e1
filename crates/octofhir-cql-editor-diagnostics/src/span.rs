//! Source spans, line/column positions and locators

use crate::{EditorError, CQLE0302};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A span in the source code, represented as a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span from start and end offsets
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A line/column position.
///
/// Lines are 1-based and columns are 0-based, which is the convention used by
/// the translation service and by locator strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-based)
    pub line: u32,
    /// Column number (0-based, in characters)
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A line/column range in the source text
///
/// The textual form is the locator string `"L1:C1-L2:C2"`, e.g. `"11:0-11:67"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Build a range from its four raw components
    pub const fn from_parts(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self {
            start: Position::new(start_line, start_char),
            end: Position::new(end_line, end_char),
        }
    }

    /// A zero-width range at a position
    pub const fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Render the range as a locator string
    pub fn to_locator(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for SourceRange {
    type Err = EditorError;

    /// Parse a locator string.
    ///
    /// Accepts both `"L1:C1-L2:C2"` and the single-position form `"L:C"`
    /// emitted by the translator for zero-width locations.
    fn from_str(locator: &str) -> Result<Self, Self::Err> {
        let invalid = || EditorError::locator(CQLE0302, locator);

        let parse_position = |text: &str| -> Result<Position, EditorError> {
            let (line, column) = text.trim().split_once(':').ok_or_else(invalid)?;
            let line = line.trim().parse::<u32>().map_err(|_| invalid())?;
            let column = column.trim().parse::<u32>().map_err(|_| invalid())?;
            Ok(Position::new(line, column))
        };

        match locator.split_once('-') {
            Some((start, end)) => Ok(Self::new(parse_position(start)?, parse_position(end)?)),
            None => Ok(Self::point(parse_position(locator)?)),
        }
    }
}

/// Maps byte offsets of a source text to line/column positions
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(offset, _)| offset + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    /// Position of a byte offset; offsets past the end clamp to the end of input
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|text| text.chars().count())
            .unwrap_or(offset - line_start);
        Position::new(line as u32 + 1, column as u32)
    }

    /// Line/column range of a byte span
    pub fn range(&self, span: Span) -> SourceRange {
        SourceRange::new(self.position(span.start), self.position(span.end))
    }

    /// Number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
