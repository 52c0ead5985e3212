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

//! The strict-mode parse error and the lookahead-hint enrichment it carries.

use std::fmt;

use crate::diagnostics::Code;
use crate::source::Span;

/// A concrete construct the parser was expecting, used both in the error
/// message and to pick a [`lookahead_hint`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Expected {
    Then,
    Do,
    Fi,
    Done,
    Esac,
    RBrace,
    RParen,
    DoubleRBracket,
    Command,
    Word,
    Name,
    InKeyword,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Expected::Then => "'then'",
            Expected::Do => "'do'",
            Expected::Fi => "'fi'",
            Expected::Done => "'done'",
            Expected::Esac => "'esac'",
            Expected::RBrace => "'}'",
            Expected::RParen => "')'",
            Expected::DoubleRBracket => "']]'",
            Expected::Command => "a command",
            Expected::Word => "a word",
            Expected::Name => "a name",
            Expected::InKeyword => "'in'",
        };
        f.write_str(s)
    }
}

/// A syntax error raised in strict mode.
///
/// `context` names the production the error occurred in (e.g. "in 'if'
/// statement"), and `hint`/`suggestion` carry the lookahead-specific
/// enrichment described in the grammar's error-context rules.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{}", self.rendered())]
pub struct ParseError {
    pub expected: Expected,
    pub found_description: String,
    pub span: Span,
    pub context: Option<String>,
    pub hint: Option<String>,
    pub suggestion: Option<String>,
}

impl ParseError {
    pub fn code(&self) -> Code {
        match self.expected {
            Expected::Then | Expected::Do | Expected::Fi | Expected::Done | Expected::Esac | Expected::InKeyword => {
                Code::MISSING_KEYWORD
            }
            _ => Code::UNEXPECTED_TOKEN,
        }
    }

    fn rendered(&self) -> String {
        let mut out = format!(
            "Expected {} but found {} at {}",
            self.expected, self.found_description, self.span.start
        );
        if let Some(context) = &self.context {
            out.push_str(&format!(" {context}"));
        }
        out
    }
}

/// Enriches a "missing X" diagnosis with a hint/suggestion pair based on what
/// was actually found, per the grammar's required lookahead cases.
pub fn lookahead_hint(expected: Expected, found_lbrace: bool, found_word: bool, found_eof: bool) -> (Option<String>, Option<String>) {
    match expected {
        Expected::Then if found_lbrace => (
            Some("Bash uses 'then' keyword, not '{'".to_string()),
            Some("Replace '{' with 'then'".to_string()),
        ),
        Expected::Then if found_word => (Some("Expected 'then' keyword".to_string()), None),
        Expected::Do if found_lbrace => (
            Some("Bash uses 'do' keyword, not '{'".to_string()),
            Some("Replace '{' with 'do'".to_string()),
        ),
        Expected::Do if found_word => (Some("Expected 'do' keyword".to_string()), None),
        Expected::Fi if found_eof => (Some("Unterminated if-statement".to_string()), None),
        Expected::Done if found_eof => (Some("Unterminated loop".to_string()), None),
        Expected::Fi | Expected::Done => (
            Some("Bash compound commands end with 'fi'/'done', not '}'".to_string()),
            None,
        ),
        Expected::DoubleRBracket => (Some("Mismatched brackets".to_string()), None),
        Expected::Command => (
            Some("Unexpected operator".to_string()),
            Some("Check for missing command before operator".to_string()),
        ),
        _ => (None, None),
    }
}
