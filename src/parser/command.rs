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

//! Simple commands: leading assignments, the command word, arguments,
//! redirections interleaved in source order, and the bare-assignment
//! statement that results when no command word ever shows up.

use crate::lexer::{token_to_word, Token, TokenKind};
use crate::source::{Position, Span};
use crate::syntax::{
    AssignOperator, Assignment, AssignmentValue, Command, Statement, VariableAssignmentStatement, Word, WordPart,
};

use super::error::ParseError;
use super::Parser;

impl<'a> Parser<'a> {
    /// `(assignment | redirect)* word (word | redirect)*` or, if no command
    /// word ever appears, a bare [`VariableAssignmentStatement`].
    pub(super) fn parse_simple_command_or_assignment(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        let mut assignments = Vec::new();
        let mut redirects = Vec::new();

        loop {
            if self.peek().kind == TokenKind::AssignmentWord {
                let token = self.advance();
                assignments.push(self.build_assignment(token)?);
            } else if self.at_redirect() {
                redirects.push(self.parse_redirect()?);
            } else {
                break;
            }
        }

        if !self.peek().is_word_like() {
            let span = start.union(&self.previous_span);
            let id = self.next_id(span);
            return Ok(Statement::VariableAssignment(VariableAssignmentStatement {
                id,
                assignments,
                redirects,
                span,
            }));
        }

        let name = token_to_word(&self.advance());
        let mut args = Vec::new();

        loop {
            if self.at_redirect() {
                redirects.push(self.parse_redirect()?);
            } else if self.peek().is_word_like() || self.current_is_absorbable_keyword() {
                args.push(token_to_word(&self.advance()));
            } else {
                break;
            }
        }

        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::Command(Command {
            id,
            name,
            args,
            redirects,
            assignments,
            span,
        }))
    }

    /// Keyword tokens (`if`, `then`, ...) are recognized unconditionally by
    /// the lexer regardless of position, so an argument position that
    /// happens to hold one of those words (`echo done`) must still absorb it
    /// as a literal word rather than stopping the argument list short.
    fn current_is_absorbable_keyword(&self) -> bool {
        use TokenKind::*;
        matches!(
            self.peek().kind,
            If | Then | Else | Elif | Fi | For | While | Until | Do | Done | Case | Esac | In | Function | Select
                | Time | Coproc
        )
    }

    fn build_assignment(&mut self, token: Token) -> Result<Assignment, ParseError> {
        let full = token_to_word(&token);
        let eq = full.value.find('=').expect("AssignmentWord token always contains '='");
        let (operator, name_len) = if eq > 0 && full.value.as_bytes()[eq - 1] == b'+' {
            (AssignOperator::Append, eq + 1)
        } else {
            (AssignOperator::Set, eq + 1)
        };
        let name_end = if operator == AssignOperator::Append { eq - 1 } else { eq };
        let name = full.value[..name_end].to_string();

        let value_text = full.value[name_len..].to_string();
        let value = if value_text.starts_with('(') && value_text.ends_with(')') {
            AssignmentValue::Array(split_array_literal(&value_text, full.span, name_len))
        } else {
            AssignmentValue::Scalar(split_word_suffix(&full, name_len))
        };

        let span = full.span;
        let id = self.next_id(span);
        Ok(Assignment { id, name, operator, value, span })
    }
}

/// Splits `full` at byte offset `prefix_len` into its value's `Word`,
/// carving the `WordPart` list at the same boundary so expansions inside
/// the value (`VAR=$HOME`) are preserved rather than flattened to text.
fn split_word_suffix(full: &Word, prefix_len: usize) -> Word {
    let value_text = full.value[prefix_len..].to_string();
    let mut remaining = prefix_len;
    let mut parts = Vec::new();
    for part in &full.parts {
        match part {
            WordPart::Literal(s) => {
                if remaining >= s.len() {
                    remaining -= s.len();
                } else {
                    parts.push(WordPart::Literal(s[remaining..].to_string()));
                    remaining = 0;
                }
            }
            other => parts.push(other.clone()),
        }
    }
    let start = Position {
        line: full.span.start.line,
        column: full.span.start.column + prefix_len as u32,
        offset: full.span.start.offset + prefix_len,
    };
    Word {
        id: None,
        value: value_text,
        quoted: full.quoted,
        single_quoted: full.single_quoted,
        parts,
        span: Span::new(start, full.span.end),
    }
}

/// A minimal `(a b c)` array-literal splitter: whitespace-separated words
/// inside the parens, each built as a literal `Word`. Nested quoting or
/// expansions inside array-literal elements are not re-parsed here; this is
/// the same simplification the lexer's fast path makes for assignment
/// words in general.
fn split_array_literal(text: &str, full_span: Span, prefix_len: usize) -> Vec<Word> {
    let inner = &text[1..text.len() - 1];
    let base_offset = full_span.start.offset + prefix_len + 1;
    let mut words = Vec::new();
    let mut index = 0usize;
    for raw in inner.split_whitespace() {
        let local_start = inner[index..].find(raw).map(|p| p + index).unwrap_or(index);
        index = local_start + raw.len();
        let start = Position {
            line: full_span.start.line,
            column: full_span.start.column + (prefix_len + 1 + local_start) as u32,
            offset: base_offset + local_start,
        };
        let end = Position {
            line: start.line,
            column: start.column + raw.chars().count() as u32,
            offset: start.offset + raw.len(),
        };
        words.push(Word::literal(raw.to_string(), Span::new(start, end)));
    }
    words
}
