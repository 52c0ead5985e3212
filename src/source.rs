// This file is part of safeshell-syntax.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Source buffer and cursor tracking (layer L0).
//!
//! [`SourceBuffer`] wraps the immutable script text and exposes a cursor
//! that walks it one character at a time, keeping byte offset, 1-based line
//! number, and 1-based column in sync. It is the only part of the crate that
//! touches raw `char`s; every layer above it works with [`Position`]s,
//! [`Span`]s, and [`Token`](crate::lexer::Token)s.

use std::fmt;

/// A single point in source text.
///
/// `line` and `column` are 1-based, matching how editors and terminals
/// report positions to humans. `offset` is the 0-based byte offset, used for
/// slicing the original source string.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub const fn start() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range of source text.
///
/// `end` is exclusive at the offset level (so `end.offset - start.offset`
/// is the byte length of the span) but both endpoints are meaningful for
/// line/column display.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// A zero-width span at `position`.
    pub const fn point(position: Position) -> Self {
        Span {
            start: position,
            end: position,
        }
    }

    /// The union of `self` and `other`: the start of whichever begins first
    /// to the end of whichever ends last.
    #[must_use]
    pub fn union(&self, other: &Span) -> Span {
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };
        Span { start, end }
    }

    /// The slice of `text` this span covers. Panics if the span's offsets
    /// are not char-boundary-aligned in `text`, which cannot happen for
    /// spans produced by this crate's own lexer.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start.offset..self.end.offset]
    }
}

/// Immutable source text plus a cursor that tracks offset, line, and column.
///
/// Advancing past one character increments the offset by that character's
/// UTF-8 length; a newline bumps the line count and resets the column to 1;
/// every other character increments the column. A backslash immediately
/// followed by a newline (line continuation) is handled by the lexer's
/// whitespace skipper, not here: the buffer just reports characters one at a
/// time.
#[derive(Debug)]
pub struct SourceBuffer<'a> {
    text: &'a str,
    position: Position,
}

impl<'a> SourceBuffer<'a> {
    pub fn new(text: &'a str) -> Self {
        SourceBuffer {
            text,
            position: Position::start(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.text
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position.offset >= self.text.len()
    }

    /// The character at the current position, without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.text[self.position.offset..].chars().next()
    }

    /// The character one past the current position, without consuming
    /// anything.
    pub fn peek_next(&self) -> Option<char> {
        let mut chars = self.text[self.position.offset..].chars();
        chars.next()?;
        chars.next()
    }

    /// Looks ahead `n` characters (0-based) from the current position
    /// without consuming anything.
    pub fn peek_at(&self, n: usize) -> Option<char> {
        self.text[self.position.offset..].chars().nth(n)
    }

    /// Consumes and returns the current character, advancing the cursor.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position.offset += c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    /// Consumes the current character if it equals `expected`.
    pub fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The remaining, not-yet-consumed source text.
    pub fn rest(&self) -> &'a str {
        &self.text[self.position.offset..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_line_and_column() {
        let mut buf = SourceBuffer::new("ab\ncd");
        assert_eq!(buf.advance(), Some('a'));
        assert_eq!(buf.position(), Position { line: 1, column: 2, offset: 1 });
        assert_eq!(buf.advance(), Some('b'));
        assert_eq!(buf.advance(), Some('\n'));
        assert_eq!(buf.position(), Position { line: 2, column: 1, offset: 3 });
        assert_eq!(buf.advance(), Some('c'));
        assert_eq!(buf.position(), Position { line: 2, column: 2, offset: 4 });
    }

    #[test]
    fn span_union_covers_both_ranges() {
        let a = Span::new(
            Position { line: 1, column: 1, offset: 0 },
            Position { line: 1, column: 3, offset: 2 },
        );
        let b = Span::new(
            Position { line: 1, column: 5, offset: 4 },
            Position { line: 1, column: 7, offset: 6 },
        );
        let u = a.union(&b);
        assert_eq!(u.start.offset, 0);
        assert_eq!(u.end.offset, 6);
    }

    #[test]
    fn is_at_end_on_empty_source() {
        let buf = SourceBuffer::new("");
        assert!(buf.is_at_end());
        assert_eq!(buf.peek(), None);
    }
}
