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

//! Redirection parsing: the optional leading fd, the operator, and the
//! target word (or here-doc delimiter).
//!
//! Here-documents are a two-phase affair. The redirection operator and
//! delimiter are consumed right here, but the body only becomes available
//! once the lexer passes the statement's terminating newline (see
//! [`super::Parser::drain_heredoc_bodies`]); until then the [`HereDoc`]'s
//! `content` cell is `None`.

use std::rc::Rc;

use crate::diagnostics::{Code, ParseNote, Severity};
use crate::lexer::TokenKind;
use crate::syntax::{HereDoc, Redirection, RedirectionBody, RedirectionOperator, Word};

use super::error::{Expected, ParseError};
use super::Parser;

fn operator_for(kind: TokenKind) -> Option<RedirectionOperator> {
    use RedirectionOperator::*;
    Some(match kind {
        TokenKind::Less => FileIn,
        TokenKind::LessGreat => FileInOut,
        TokenKind::Great => FileOut,
        TokenKind::GreatGreat => FileAppend,
        TokenKind::GreatPipe => FileClobber,
        TokenKind::LessAmp => FdIn,
        TokenKind::GreatAmp => FdOut,
        TokenKind::LessLessLess => HereDocString,
        TokenKind::AndGreat => AndOut,
        TokenKind::AndGreatGreat => AndAppend,
        TokenKind::LessParen => ProcessIn,
        TokenKind::GreatParen => ProcessOut,
        _ => return None,
    })
}

fn is_redirect_start(kind: TokenKind) -> bool {
    operator_for(kind).is_some() || matches!(kind, TokenKind::LessLess | TokenKind::LessLessDash)
}

impl<'a> Parser<'a> {
    /// `true` if a redirection (possibly preceded by a fd/fd-variable
    /// prefix) starts at the current position.
    pub(super) fn at_redirect(&mut self) -> bool {
        if is_redirect_start(self.peek().kind) {
            return true;
        }
        if self.peek().kind == TokenKind::Number && self.redirect_follows_number() {
            return true;
        }
        if self.peek().kind == TokenKind::LBrace && self.redirect_follows_fd_variable() {
            return true;
        }
        false
    }

    /// Parses one redirection. Callers must have already confirmed
    /// [`at_redirect`](Self::at_redirect).
    pub(super) fn parse_redirect(&mut self) -> Result<Redirection, ParseError> {
        let start_span = self.peek().span;

        let (fd, fd_variable) = if self.peek().kind == TokenKind::Number && self.redirect_follows_number() {
            let token = self.advance();
            (token.lexeme.parse().ok(), None)
        } else if self.peek().kind == TokenKind::LBrace && self.redirect_follows_fd_variable() {
            self.advance(); // `{`
            let name_token = self.advance(); // NAME
            self.advance(); // `}`
            (None, Some(name_token.lexeme))
        } else {
            (None, None)
        };

        let kind = self.peek().kind;

        if matches!(kind, TokenKind::LessLess | TokenKind::LessLessDash) {
            let strip_tabs = kind == TokenKind::LessLessDash;
            self.advance();
            let (delimiter_text, quoted) = self
                .lexer
                .last_pending_heredoc()
                .map(|h| (h.delimiter.clone(), h.quoted))
                .unwrap_or_default();
            let delimiter_span = start_span;
            let delimiter = Word::literal(delimiter_text, delimiter_span);
            let here_doc = Rc::new(HereDoc {
                delimiter,
                remove_tabs: strip_tabs,
                quoted,
                content: std::cell::RefCell::new(None),
            });
            self.pending_heredocs.push_back(Rc::clone(&here_doc));
            let span = start_span.union(&self.previous_span);
            let id = self.next_id(span);
            return Ok(Redirection {
                id,
                fd,
                fd_variable,
                body: RedirectionBody::HereDoc(here_doc),
                span,
            });
        }

        let operator = operator_for(kind).expect("caller checked at_redirect");
        self.advance();
        let target = self.parse_redirect_target()?;
        let span = start_span.union(&target.span);
        let id = self.next_id(span);
        Ok(Redirection {
            id,
            fd,
            fd_variable,
            body: RedirectionBody::Normal { operator, target },
            span,
        })
    }

    fn redirect_follows_number(&mut self) -> bool {
        is_redirect_start(self.lexer.peek(&mut self.collector).kind)
    }

    /// `{name}` is a fd-variable prefix only when it is immediately followed
    /// by a redirection operator; this requires looking two tokens past the
    /// already-current `{` without consuming them, so we scan a throwaway
    /// sub-lexer over the remaining source text (starting right after the
    /// `{`) rather than disturbing the real lexer's state.
    fn redirect_follows_fd_variable(&mut self) -> bool {
        let mut probe = crate::lexer::Lexer::new(self.lexer.rest());
        let mut scratch = crate::diagnostics::DiagnosticCollector::new();
        let name = probe.next(&mut scratch);
        if name.kind != TokenKind::Name {
            return false;
        }
        let close = probe.next(&mut scratch);
        if close.kind != TokenKind::RBrace {
            return false;
        }
        is_redirect_start(probe.next(&mut scratch).kind)
    }

    fn parse_redirect_target(&mut self) -> Result<Word, ParseError> {
        if self.peek().is_word_like() {
            let token = self.advance();
            return Ok(crate::lexer::token_to_word(&token));
        }
        if self.strict {
            Err(ParseError {
                expected: Expected::Word,
                found_description: format!("{:?}", self.peek().kind),
                span: self.peek().span,
                context: Some("in redirection".to_string()),
                hint: None,
                suggestion: None,
            })
        } else {
            let span = self.peek().span;
            self.collector.push(ParseNote {
                severity: Severity::Error,
                code: Code::INVALID_REDIRECT,
                message: "missing redirection target".to_string(),
                span,
                context: None,
                fix_hint: None,
            });
            Ok(self.insert_missing_word("WORD", span))
        }
    }
}
