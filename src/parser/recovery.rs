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

//! Synchronization-point recovery.

use crate::lexer::TokenKind;
use crate::source::{Position, Span};
use crate::syntax::Word;

use super::Parser;

/// `true` for a token kind error recovery treats as a resumption point.
pub fn is_sync_point(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Newline
            | TokenKind::Semicolon
            | TokenKind::EndOfInput
            | TokenKind::Fi
            | TokenKind::Done
            | TokenKind::Esac
            | TokenKind::RBrace
            | TokenKind::RParen
    )
}

impl<'a> Parser<'a> {
    /// Advances past tokens until a synchronization point (exclusive), or
    /// EOF. Returns the skipped tokens' combined span, if any were skipped.
    pub(super) fn skip_to_sync(&mut self) -> Option<Span> {
        let mut span: Option<Span> = None;
        while !is_sync_point(self.peek().kind) {
            let skipped = self.advance();
            span = Some(match span {
                Some(existing) => existing.union(&skipped.span),
                None => skipped.span,
            });
        }
        span
    }

    /// Fabricates a synthetic [`Word`] standing in for a missing token,
    /// positioned immediately after `after`.
    pub(super) fn insert_missing_word(&mut self, label: &str, after: Span) -> Word {
        let position = Position {
            line: after.end.line,
            column: after.end.column,
            offset: after.end.offset,
        };
        let span = Span::point(position);
        Word::literal(format!("<missing {label}>"), span)
    }
}
