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

//! Shell lexer (layer L2).
//!
//! [`Lexer`] turns source text into a lazy, restartable token stream. It
//! tracks quoting state and expansion balancing inside [`word`], queues and
//! later drains here-document bodies via [`heredoc`], and resolves the
//! context-sensitive `{`/`}`/`!` tokens itself before falling back to the
//! generic operator table in [`operator`].

mod heredoc;
mod operator;
mod token;
mod word;

pub use token::{Token, TokenFlags, TokenKind};
pub use word::token_to_word;

pub(crate) use heredoc::PendingHeredoc;
use operator::match_operator;
use crate::diagnostics::DiagnosticCollector;
use crate::source::{Position, SourceBuffer, Span};

/// Produces tokens from shell source text.
///
/// Exposes a one-token lookahead (`peek`/`next`) plus the whole-stream
/// convenience `tokenize`. `add_pending_heredoc` lets a caller (normally the
/// grammar parser, when it decides the `<<`/`<<-` it just consumed needs a
/// differently-sourced delimiter than what the lexer scanned inline) queue a
/// here-doc registration directly.
pub struct Lexer<'a> {
    buffer: SourceBuffer<'a>,
    pending_heredocs: Vec<PendingHeredoc>,
    ready_heredocs: std::collections::VecDeque<Token>,
    peeked: Option<Token>,
    at_word_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            buffer: SourceBuffer::new(source),
            pending_heredocs: Vec::new(),
            ready_heredocs: std::collections::VecDeque::new(),
            peeked: None,
            at_word_start: true,
        }
    }

    pub fn get_position(&self) -> Position {
        self.buffer.position()
    }

    pub fn is_at_end(&self) -> bool {
        self.peeked.is_none() && self.ready_heredocs.is_empty() && self.buffer.is_at_end()
    }

    /// The source text not yet consumed, including whatever is sitting in
    /// `peeked`'s lexeme (the peeked token's characters were already taken
    /// off the buffer, so callers that need a true continuation must not
    /// have peeked past the point they probe from).
    pub fn rest(&self) -> &'a str {
        self.buffer.rest()
    }

    /// The most recently queued, still-unconsumed here-doc registration --
    /// populated the moment `<<`/`<<-` is scanned, before its body exists.
    pub(crate) fn last_pending_heredoc(&self) -> Option<&PendingHeredoc> {
        self.pending_heredocs.last()
    }

    /// Advances the buffer by one raw character, bypassing tokenization.
    /// Used by the grammar parser's arithmetic-command production, which
    /// re-slices `(( ... ))` bodies itself rather than tokenizing them with
    /// the shell lexer's own rules. Callers must not have a pending `peeked`
    /// token (i.e. must call this only right after consuming the token that
    /// precedes the raw region).
    pub(crate) fn consume_char(&mut self) -> Option<char> {
        self.buffer.advance()
    }

    /// Registers a here-doc delimiter to be captured after the next
    /// newline, without requiring the lexer to have scanned `<<`/`<<-`
    /// itself.
    pub fn add_pending_heredoc(&mut self, delimiter: impl Into<String>, strip_tabs: bool, quoted: bool) {
        self.pending_heredocs.push(PendingHeredoc {
            delimiter: delimiter.into(),
            strip_tabs,
            quoted,
        });
    }

    pub fn peek(&mut self, collector: &mut DiagnosticCollector) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.advance_internal(collector));
        }
        self.peeked.as_ref().unwrap()
    }

    pub fn next(&mut self, collector: &mut DiagnosticCollector) -> Token {
        if let Some(token) = self.peeked.take() {
            return token;
        }
        self.advance_internal(collector)
    }

    /// Alias for [`next`](Self::next), matching the interface named in
    /// component design.
    pub fn advance(&mut self, collector: &mut DiagnosticCollector) -> Token {
        self.next(collector)
    }

    pub fn matches(&mut self, kind: TokenKind, collector: &mut DiagnosticCollector) -> bool {
        self.peek(collector).kind == kind
    }

    /// Drains every remaining token, including a trailing `EndOfInput`.
    pub fn tokenize(&mut self, collector: &mut DiagnosticCollector) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            let token = self.next(collector);
            let is_eof = token.kind == TokenKind::EndOfInput;
            out.push(token);
            if is_eof {
                break;
            }
        }
        out
    }

    fn advance_internal(&mut self, collector: &mut DiagnosticCollector) -> Token {
        if let Some(token) = self.ready_heredocs.pop_front() {
            return token;
        }
        let token = self.scan_token(collector);
        if token.kind == TokenKind::Newline && !self.pending_heredocs.is_empty() {
            let bodies = heredoc::capture_heredoc_bodies(&mut self.buffer, &mut self.pending_heredocs);
            self.ready_heredocs.extend(bodies);
        }
        token
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.buffer.peek() {
                Some(' ') | Some('\t') => {
                    self.buffer.advance();
                }
                Some('\\') if self.buffer.peek_next() == Some('\n') => {
                    self.buffer.advance();
                    self.buffer.advance();
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self, collector: &mut DiagnosticCollector) -> Token {
        self.skip_whitespace();
        let start = self.buffer.position();

        let Some(c) = self.buffer.peek() else {
            return Token::simple(TokenKind::EndOfInput, "", Span::point(start));
        };

        if c == '\n' {
            self.buffer.advance();
            self.at_word_start = true;
            return Token::simple(TokenKind::Newline, "\n", Span::new(start, self.buffer.position()));
        }

        if c == '#' && self.at_word_start {
            return self.scan_comment();
        }

        if c == '!' {
            // `!=` is a WORD (string inequality inside `[[ ... ]]`); a bare
            // `!` is the BANG pipeline-negation token.
            if self.buffer.peek_next() == Some('=') {
                self.at_word_start = false;
                return word::scan_word(&mut self.buffer, collector);
            }
            self.buffer.advance();
            self.at_word_start = false;
            return Token::simple(TokenKind::Bang, "!", Span::new(start, self.buffer.position()));
        }

        if c == '{' || c == '}' {
            if let Some(token) = self.try_scan_brace_operator(start) {
                return token;
            }
            self.at_word_start = false;
            return word::scan_word(&mut self.buffer, collector);
        }

        if let Some((lexeme, kind)) = match_operator(self.buffer.rest()) {
            for _ in 0..lexeme.chars().count() {
                self.buffer.advance();
            }
            let span = Span::new(start, self.buffer.position());
            self.at_word_start = true;

            if matches!(kind, TokenKind::LessLess | TokenKind::LessLessDash) {
                let (delimiter, quoted) = heredoc::scan_heredoc_delimiter(&mut self.buffer);
                let strip_tabs = kind == TokenKind::LessLessDash;
                self.pending_heredocs.push(PendingHeredoc {
                    delimiter,
                    strip_tabs,
                    quoted,
                });
            }

            return Token::simple(kind, lexeme, span);
        }

        if word::starts_slow_path(c) || !c.is_whitespace() {
            self.at_word_start = false;
            return word::scan_word(&mut self.buffer, collector);
        }

        // An unrecognizable lone character outside any word: skip it and
        // keep lexing, preserving progress for recovery mode.
        self.buffer.advance();
        self.scan_token(collector)
    }

    fn scan_comment(&mut self) -> Token {
        let start = self.buffer.position();
        let mut text = String::new();
        while let Some(c) = self.buffer.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.buffer.advance();
        }
        Token::simple(TokenKind::Comment, text, Span::new(start, self.buffer.position()))
    }

    /// Decides whether a `{`/`}` at the current position is a standalone
    /// LBRACE/RBRACE operator token (only when not word-adjacent), per the
    /// brace-disambiguation rule; returns `None` to fall through to word
    /// scanning (the literal-brace and brace-expansion cases, which both
    /// become part of a WORD).
    fn try_scan_brace_operator(&mut self, start: Position) -> Option<Token> {
        let c = self.buffer.peek().unwrap();
        if c == '}' {
            let next = self.buffer.peek_next();
            let followed_by_word_char = next.is_some_and(|n| !n.is_whitespace() && !operator::is_operator_start(n));
            if followed_by_word_char {
                return None;
            }
            self.buffer.advance();
            self.at_word_start = false;
            return Some(Token::simple(TokenKind::RBrace, "}", Span::new(start, self.buffer.position())));
        }

        // `{`: absorbed into a WORD if it forms a brace expansion or a
        // balanced literal-brace group with no whitespace/operator before
        // the matching `}`; otherwise it is LBRACE.
        if looks_like_brace_expansion_or_literal(self.buffer.rest()) {
            return None;
        }
        self.buffer.advance();
        self.at_word_start = false;
        Some(Token::simple(TokenKind::LBrace, "{", Span::new(start, self.buffer.position())))
    }
}

/// Scans forward (without consuming) past a leading `{` to decide if it
/// opens a brace expansion (`{a,b}`, `{1..9}`) or a balanced literal brace
/// group (`{literal}`), both of which get absorbed into a WORD. Stops
/// looking as soon as whitespace, a newline, or an operator-starting
/// character appears before the matching unnested `}`.
fn looks_like_brace_expansion_or_literal(rest: &str) -> bool {
    debug_assert!(rest.starts_with('{'));
    let body = &rest[1..];
    let mut depth = 0usize;
    let mut saw_content = false;
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                depth += 1;
                saw_content = true;
            }
            '}' => {
                if depth == 0 {
                    return saw_content;
                }
                depth -= 1;
                saw_content = true;
            }
            c if c.is_whitespace() || operator::is_operator_start(c) => return false,
            _ => {
                let _ = i;
                saw_content = true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut collector = DiagnosticCollector::new();
        lexer.tokenize(&mut collector)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_pipeline_tokenizes() {
        assert_eq!(
            kinds("ls -la | grep foo"),
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Pipe,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn assignment_word_before_command_name() {
        let tokens = tokenize("FOO=bar echo hi");
        assert_eq!(tokens[0].kind, TokenKind::AssignmentWord);
        assert_eq!(tokens[1].kind, TokenKind::Word);
    }

    #[test]
    fn keyword_recognized_at_word_position() {
        assert_eq!(kinds("if true; then"), vec![
            TokenKind::If,
            TokenKind::Word,
            TokenKind::Semicolon,
            TokenKind::Then,
            TokenKind::EndOfInput,
        ]);
    }

    #[test]
    fn three_char_operators_take_priority() {
        assert_eq!(kinds(";;&"), vec![TokenKind::CaseContinue, TokenKind::EndOfInput]);
        assert_eq!(kinds("&>>"), vec![TokenKind::AndGreatGreat, TokenKind::EndOfInput]);
    }

    #[test]
    fn bang_vs_string_inequality() {
        assert_eq!(kinds("!"), vec![TokenKind::Bang, TokenKind::EndOfInput]);
        assert_eq!(kinds("!="), vec![TokenKind::Word, TokenKind::EndOfInput]);
    }

    #[test]
    fn double_ampersand_is_one_token() {
        assert_eq!(kinds("a && b"), vec![
            TokenKind::Word,
            TokenKind::AndAnd,
            TokenKind::Word,
            TokenKind::EndOfInput,
        ]);
    }

    #[test]
    fn comment_only_at_word_start() {
        let tokens = tokenize("echo hi # a comment\n");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Comment));
        let mid_word = tokenize("a#b");
        assert_eq!(mid_word[0].kind, TokenKind::Word);
        assert_eq!(mid_word[0].lexeme, "a#b");
    }

    #[test]
    fn heredoc_body_captured_after_newline() {
        let tokens = tokenize("cat <<EOF\nhello\nworld\nEOF\n");
        let content = tokens.iter().find(|t| t.kind == TokenKind::HeredocContent).unwrap();
        assert_eq!(content.lexeme, "hello\nworld\n");
    }

    #[test]
    fn heredoc_strip_tabs_variant() {
        let tokens = tokenize("cat <<-EOF\n\t\thello\nEOF\n");
        let content = tokens.iter().find(|t| t.kind == TokenKind::HeredocContent).unwrap();
        assert_eq!(content.lexeme, "hello\n");
    }

    #[test]
    fn brace_group_is_lbrace_rbrace() {
        assert_eq!(kinds("{ echo hi ; }"), vec![
            TokenKind::LBrace,
            TokenKind::Word,
            TokenKind::Word,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::EndOfInput,
        ]);
    }

    #[test]
    fn brace_expansion_is_a_word() {
        assert_eq!(kinds("echo {a,b}"), vec![TokenKind::Word, TokenKind::Word, TokenKind::EndOfInput]);
    }

    #[test]
    fn unknown_character_is_skipped() {
        assert_eq!(kinds("a \u{0} b"), vec![TokenKind::Word, TokenKind::Word, TokenKind::EndOfInput]);
    }

    #[test]
    fn parameter_expansion_in_word() {
        let tokens = tokenize("echo $HOME");
        let word_token = &tokens[1];
        assert_eq!(word_token.kind, TokenKind::Word);
        assert_eq!(word_token.parts.len(), 1);
    }

    #[test]
    fn double_bracket_test_tokens() {
        assert_eq!(kinds("[[ -f a ]]"), vec![
            TokenKind::DoubleLBracket,
            TokenKind::Word,
            TokenKind::Word,
            TokenKind::DoubleRBracket,
            TokenKind::EndOfInput,
        ]);
    }
}
