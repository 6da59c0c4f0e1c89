//! Input buffer with a precomputed line index.

use serde::{Deserialize, Serialize};

/// Characters skipped between tokens. Newline is absent: it ends
/// a statement.
pub const WHITESPACE: &[u8] = b" \t\r";

/// A source location. `offset` is a byte offset into the input; `line` and
/// `column` are 1-based, with columns counted in characters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Immutable view of the text being parsed.
#[derive(Debug)]
pub struct InputBuffer<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> InputBuffer<'a> {
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Everything from `offset` to the end.
    pub fn rest(&self, offset: usize) -> &'a str {
        &self.text[offset..]
    }

    /// First offset at or after `offset` that is not inter-token whitespace.
    pub fn skip_whitespace(&self, offset: usize) -> usize {
        let bytes = self.text.as_bytes();
        let mut at = offset;
        while at < bytes.len() && WHITESPACE.contains(&bytes[at]) {
            at += 1;
        }
        at
    }

    /// Resolves a byte offset to a 1-based line and column.
    pub fn position(&self, offset: usize) -> Position {
        let line_index = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_index];
        let column = self.text[line_start..offset].chars().count() + 1;
        Position {
            offset,
            line: line_index + 1,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let input = InputBuffer::new("ab\ncd");
        assert_eq!(input.position(0), Position { offset: 0, line: 1, column: 1 });
        assert_eq!(input.position(1).column, 2);
        let d = input.position(4);
        assert_eq!((d.line, d.column), (2, 2));
    }

    #[test]
    fn newline_belongs_to_the_line_it_ends() {
        let input = InputBuffer::new("ab\ncd");
        let newline = input.position(2);
        assert_eq!((newline.line, newline.column), (1, 3));
        let after = input.position(3);
        assert_eq!((after.line, after.column), (2, 1));
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let input = InputBuffer::new("'é' x");
        let x = input.text().find('x').unwrap();
        assert_eq!(input.position(x).column, 5);
    }

    #[test]
    fn end_of_input_has_a_position() {
        let input = InputBuffer::new("a\n");
        let end = input.position(input.len());
        assert_eq!((end.line, end.column), (2, 1));
    }

    #[test]
    fn whitespace_skip_stops_at_newline() {
        let input = InputBuffer::new(" \t\r\nx");
        assert_eq!(input.skip_whitespace(0), 3);
    }
}
