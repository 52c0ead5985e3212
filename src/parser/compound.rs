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

//! Compound commands: `if`, `for` (both forms), `while`, `until`, `case`,
//! subshells, brace groups, and function declarations.

use crate::arith::ArithmeticExpression;
use crate::lexer::{token_to_word, TokenKind};
use crate::source::Span;
use crate::syntax::{
    Alternate, BraceGroup, CaseItem, CaseStatement, CaseTerminator, CStyleForStatement, ForStatement,
    FunctionDeclaration, IfStatement, Pipeline, PipelineOperator, Redirection, Statement, Subshell, UntilStatement,
    WhileStatement,
};

use super::error::Expected;
use super::error::ParseError;
use super::Parser;

impl<'a> Parser<'a> {
    /// Folds one or more `;`/newline-separated and-or lists that make up a
    /// condition/test clause into a single [`Pipeline`], per the AST's
    /// `Semicolon`-operator convention.
    fn parse_condition_clause(&mut self, stop: TokenKind) -> Result<Pipeline, ParseError> {
        let start = self.peek().span;
        let mut statements = Vec::new();
        self.skip_linebreaks();
        loop {
            statements.push(self.parse_and_or_statement()?);
            self.skip_separators();
            if self.peek().kind == stop || self.peek().kind == TokenKind::EndOfInput {
                break;
            }
        }
        if statements.len() == 1 {
            let Statement::Pipeline(pipeline) = statements.pop().unwrap() else {
                unreachable!("and-or statements are always wrapped in Statement::Pipeline")
            };
            return Ok(pipeline);
        }
        let span = start.union(&self.previous_span);
        Ok(self.make_pipeline(statements, Some(PipelineOperator::Semicolon), span))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `if`
        self.parse_if_tail(start)
    }

    /// Shared by `if` and `elif`, which have identical grammar from this
    /// point on; the outermost `if` is the only one that consumes the final
    /// `fi`, since a nested `elif`'s "else" is this call's `alternate`.
    fn parse_if_tail(&mut self, start: Span) -> Result<Statement, ParseError> {
        let test = self.parse_condition_clause(TokenKind::Then)?;
        self.expect_or_recover(TokenKind::Then, Expected::Then, "in 'if' statement")?;
        let consequent = self.parse_body_until(&[TokenKind::Elif, TokenKind::Else, TokenKind::Fi]);
        let alternate = match self.peek().kind {
            TokenKind::Elif => {
                let elif_start = self.peek().span;
                self.advance();
                let Statement::IfStatement(nested) = self.parse_if_tail(elif_start)? else {
                    unreachable!()
                };
                Alternate::ElseIf(Box::new(nested))
            }
            TokenKind::Else => {
                self.advance();
                let body = self.parse_body_until(&[TokenKind::Fi]);
                self.expect_or_recover(TokenKind::Fi, Expected::Fi, "in 'if' statement")?;
                Alternate::Else(body)
            }
            _ => {
                self.expect_or_recover(TokenKind::Fi, Expected::Fi, "in 'if' statement")?;
                Alternate::None
            }
        };
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::IfStatement(IfStatement { id, test, consequent, alternate, span }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `while`
        let condition = self.parse_condition_clause(TokenKind::Do)?;
        let body = self.parse_do_block("in 'while' loop")?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::WhileStatement(WhileStatement { id, condition, body, span }))
    }

    fn parse_until_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `until`
        let condition = self.parse_condition_clause(TokenKind::Do)?;
        let body = self.parse_do_block("in 'until' loop")?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::UntilStatement(UntilStatement { id, condition, body, span }))
    }

    fn parse_do_block(&mut self, context: &str) -> Result<Vec<Statement>, ParseError> {
        self.expect_or_recover(TokenKind::Do, Expected::Do, context)?;
        let body = self.parse_body_until(&[TokenKind::Done]);
        self.expect_or_recover(TokenKind::Done, Expected::Done, context)?;
        Ok(body)
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `for`
        if self.peek().kind == TokenKind::DoubleLParen {
            return self.parse_cstyle_for_statement(start);
        }
        let variable_token = self.expect(TokenKind::Name, Expected::Name, "in 'for' loop")?;
        let variable = variable_token.lexeme;
        self.skip_linebreaks();
        let iterable = if self.peek().kind == TokenKind::In {
            self.advance();
            let mut words = Vec::new();
            while self.peek().is_word_like() {
                words.push(token_to_word(&self.advance()));
            }
            Some(words)
        } else {
            None
        };
        self.skip_separators();
        let body = self.parse_do_block("in 'for' loop")?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::ForStatement(ForStatement { id, variable, iterable, body, span }))
    }

    /// `for (( init; test; update )); do body; done`. `current` is the
    /// already-scanned `((` token, so the three clauses are re-sliced as
    /// raw text the same way a standalone `(( ))` command is, splitting on
    /// top-level `;` instead of expecting a single expression.
    fn parse_cstyle_for_statement(&mut self, start: Span) -> Result<Statement, ParseError> {
        let (init, test, update) = self.parse_cstyle_for_header()?;
        self.skip_separators();
        let body = self.parse_do_block("in 'for' loop")?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::CStyleForStatement(CStyleForStatement { id, init, test, update, body, span }))
    }

    /// `current` is the already-scanned `((` token; the buffer sits right
    /// after it, so the three clauses are collected as raw text the same way
    /// a standalone `(( ))` command is, splitting on top-level `;` instead of
    /// expecting a single expression. Each clause is optional, per the
    /// C-style-for grammar (`for ((;;))` is a valid infinite loop header).
    #[allow(clippy::type_complexity)]
    fn parse_cstyle_for_header(
        &mut self,
    ) -> Result<
        (Option<ArithmeticExpression>, Option<ArithmeticExpression>, Option<ArithmeticExpression>),
        ParseError,
    > {
        let header_span = self.peek().span;
        self.previous_span = self.peek().span;
        let mut depth = 0i32;
        let mut segments: Vec<String> = vec![String::new()];
        loop {
            let rest = self.lexer.rest();
            if depth == 0 && rest.starts_with("))") {
                break;
            }
            let Some(c) = rest.chars().next() else { break };
            if c == '(' {
                depth += 1;
            } else if c == ')' {
                depth -= 1;
            }
            if c == ';' && depth == 0 {
                segments.push(String::new());
            } else {
                segments.last_mut().expect("segments always has at least one entry").push(c);
            }
            self.lexer.consume_char();
        }
        self.lexer.consume_char();
        self.lexer.consume_char();
        self.current = self.lexer.next(&mut self.collector);

        let parse_segment = |text: &str| -> Result<Option<ArithmeticExpression>, ParseError> {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            crate::arith::parse(trimmed).map(Some).map_err(|err| ParseError {
                expected: Expected::Word,
                found_description: err.to_string(),
                span: header_span,
                context: Some("in 'for' loop header".to_string()),
                hint: None,
                suggestion: None,
            })
        };
        let init = parse_segment(segments.first().map(String::as_str).unwrap_or(""))?;
        let test = parse_segment(segments.get(1).map(String::as_str).unwrap_or(""))?;
        let update = parse_segment(segments.get(2).map(String::as_str).unwrap_or(""))?;
        Ok((init, test, update))
    }

    fn parse_case_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `case`
        let subject = token_to_word(&self.advance());
        self.skip_linebreaks();
        self.expect_or_recover(TokenKind::In, Expected::InKeyword, "in case statement")?;
        self.skip_linebreaks();
        let mut items = Vec::new();
        while self.peek().kind != TokenKind::Esac && self.peek().kind != TokenKind::EndOfInput {
            items.push(self.parse_case_item()?);
            self.skip_linebreaks();
        }
        self.expect_or_recover(TokenKind::Esac, Expected::Esac, "in case statement")?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::CaseStatement(CaseStatement { id, subject, items, span }))
    }

    fn parse_case_item(&mut self) -> Result<CaseItem, ParseError> {
        let start = self.peek().span;
        if self.peek().kind == TokenKind::LParen {
            self.advance();
        }
        let mut patterns = vec![token_to_word(&self.advance())];
        while self.peek().kind == TokenKind::Pipe {
            self.advance();
            patterns.push(token_to_word(&self.advance()));
        }
        self.expect_or_recover(TokenKind::RParen, Expected::RParen, "in case item")?;
        self.skip_linebreaks();
        let body = self.parse_body_until(&[TokenKind::Esac]);
        let terminator = match self.peek().kind {
            TokenKind::CaseBreak => {
                self.advance();
                CaseTerminator::Break
            }
            TokenKind::CaseFallThrough => {
                self.advance();
                CaseTerminator::FallThrough
            }
            TokenKind::CaseContinue => {
                self.advance();
                CaseTerminator::Continue
            }
            _ => CaseTerminator::Break,
        };
        self.skip_linebreaks();
        let span = start.union(&self.previous_span);
        Ok(CaseItem { patterns, body, terminator, span })
    }

    fn parse_subshell(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `(`
        let body = self.parse_body_until(&[TokenKind::RParen]);
        self.expect_or_recover(TokenKind::RParen, Expected::RParen, "in subshell")?;
        let redirects = self.parse_trailing_redirects()?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::Subshell(Subshell { id, body, redirects, span }))
    }

    fn parse_brace_group(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `{`
        let body = self.parse_body_until(&[TokenKind::RBrace]);
        self.expect_or_recover(TokenKind::RBrace, Expected::RBrace, "in brace group")?;
        let redirects = self.parse_trailing_redirects()?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::BraceGroup(BraceGroup { id, body, redirects, span }))
    }

    fn parse_trailing_redirects(&mut self) -> Result<Vec<Redirection>, ParseError> {
        let mut redirects = Vec::new();
        while self.at_redirect() {
            redirects.push(self.parse_redirect()?);
        }
        Ok(redirects)
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        let has_keyword = self.peek().kind == TokenKind::Function;
        if has_keyword {
            self.advance();
        }
        let name = token_to_word(&self.advance());
        if self.peek().kind == TokenKind::LParen {
            self.advance();
            self.expect_or_recover(TokenKind::RParen, Expected::RParen, "in function declaration")?;
        }
        self.skip_linebreaks();
        let body = Box::new(match self.peek().kind {
            TokenKind::LParen => self.parse_subshell()?,
            _ => self.parse_brace_group()?,
        });
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::FunctionDeclaration(FunctionDeclaration { id, has_keyword, name, body, span }))
    }

    /// Parses and-or statements into `body` until one of `stop_kinds` (or a
    /// case terminator, when inside a `case` item body) is seen, or EOF.
    fn parse_body_until(&mut self, stop_kinds: &[TokenKind]) -> Vec<Statement> {
        let mut body = Vec::new();
        self.skip_separators();
        while !stop_kinds.contains(&self.peek().kind)
            && !matches!(
                self.peek().kind,
                TokenKind::CaseBreak | TokenKind::CaseFallThrough | TokenKind::CaseContinue
            )
            && self.peek().kind != TokenKind::EndOfInput
        {
            match self.parse_and_or_statement() {
                Ok(statement) => body.push(statement),
                Err(err) => {
                    self.report(err);
                    self.skip_to_sync();
                    if stop_kinds.contains(&self.peek().kind) || self.peek().kind == TokenKind::EndOfInput {
                        break;
                    }
                }
            }
            self.skip_separators();
        }
        body
    }
}
