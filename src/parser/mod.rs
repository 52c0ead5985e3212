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

//! Recursive-descent grammar parser (layer L4).
//!
//! [`Parser`] drives a [`Lexer`] with one token of its own lookahead
//! (`current`) plus whatever extra lookahead individual productions need
//! from the lexer directly. It runs in one of two modes, chosen once at
//! construction:
//!
//! - strict (`parse`): the first syntax error aborts the parse and is
//!   returned as a [`ParseError`].
//! - recovery (`parse_with_recovery`): every syntax error is downgraded to a
//!   diagnostic, a synthetic node is substituted, and parsing resumes at the
//!   next synchronization point (see [`recovery`]).

mod command;
mod compound;
mod error;
mod redir;
mod recovery;
mod test_command;

pub use error::{Expected, ParseError};

use std::collections::VecDeque;
use std::rc::Rc;

use crate::dialect::Shell;
use crate::diagnostics::{Code, DiagnosticCollector, ParseNote, Severity};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::position::{NodeId, NodeIdGenerator, PositionMap};
use crate::source::Span;
use crate::syntax::{HereDoc, Pipeline, PipelineOperator, Program, Statement, Word};

/// Parser configuration: which dialect to gate constructs against, and
/// whether to abort on the first error or recover and keep going.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub shell: Shell,
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { shell: Shell::default(), strict: true }
    }
}

/// Parses `source` in strict mode, aborting on the first syntax error.
pub fn parse(source: &str, shell: Option<Shell>) -> Result<Program, ParseError> {
    let config = Config { shell: shell.unwrap_or_default(), strict: true };
    let mut parser = Parser::with_config(source, config);
    parser.parse_program()
}

/// Parses `source` in recovery mode: syntax errors become diagnostics and
/// the best-effort [`Program`] parsed around them is still returned.
pub fn parse_with_recovery(source: &str, shell: Option<Shell>) -> (Program, Vec<ParseNote>) {
    let config = Config { shell: shell.unwrap_or_default(), strict: false };
    let mut parser = Parser::with_config(source, config);
    let program = parser
        .parse_program()
        .unwrap_or_else(|_| Program { body: Vec::new() });
    (program, parser.collector.all())
}

/// Recursive-descent parser for one shell script.
///
/// Owns its [`Lexer`], [`NodeIdGenerator`], [`PositionMap`], and
/// [`DiagnosticCollector`] outright; none of them are shared across parses.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    collector: DiagnosticCollector,
    ids: NodeIdGenerator,
    positions: PositionMap,
    shell: Shell,
    strict: bool,
    current: Token,
    previous_span: Span,
    pending_heredocs: VecDeque<Rc<HereDoc>>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, shell: Shell) -> Self {
        Parser::with_config(source, Config { shell, strict: true })
    }

    pub fn with_config(source: &'a str, config: Config) -> Self {
        let mut lexer = Lexer::new(source);
        let mut collector = DiagnosticCollector::new();
        let current = lexer.next(&mut collector);
        let start_span = current.span;
        Parser {
            lexer,
            collector,
            ids: NodeIdGenerator::new(),
            positions: PositionMap::new(),
            shell: config.shell,
            strict: config.strict,
            current,
            previous_span: start_span,
            pending_heredocs: VecDeque::new(),
        }
    }

    pub fn get_shell(&self) -> Shell {
        self.shell
    }

    pub fn get_capabilities(&self) -> crate::dialect::ShellCapabilities {
        self.shell.capabilities()
    }

    pub fn has_capability(&self, feature: crate::dialect::Feature) -> bool {
        self.shell.has_capability(feature)
    }

    pub fn get_position_map(&self) -> &PositionMap {
        &self.positions
    }

    pub fn diagnostics(&self) -> Vec<ParseNote> {
        self.collector.all()
    }

    pub fn into_diagnostics(self) -> Vec<ParseNote> {
        self.collector.all()
    }

    /// Parses the whole program: a sequence of and-or lists separated by
    /// `;`, `&`, or newlines.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        self.skip_separators();
        while self.current.kind != TokenKind::EndOfInput {
            match self.parse_and_or_statement() {
                Ok(statement) => body.push(statement),
                Err(err) => {
                    if self.strict {
                        return Err(err);
                    }
                    self.report(err);
                    self.skip_to_sync();
                }
            }
            if !self.at_statement_terminator() && self.current.kind != TokenKind::EndOfInput {
                let err = self.unexpected(Expected::Command, Some("at top level"));
                if self.strict {
                    return Err(err);
                }
                self.report(err);
                self.skip_to_sync();
            }
            self.skip_separators();
        }
        Ok(Program { body })
    }

    // --- token stream -----------------------------------------------------

    pub(super) fn peek(&self) -> &Token {
        &self.current
    }

    pub(super) fn advance(&mut self) -> Token {
        let next = self.lexer.next(&mut self.collector);
        self.previous_span = self.current.span;
        std::mem::replace(&mut self.current, next)
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub(super) fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skips `;` and newline separators between statements, draining any
    /// here-doc bodies a just-consumed newline made available.
    pub(super) fn skip_separators(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance();
                    self.drain_heredoc_bodies();
                }
                TokenKind::Semicolon => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Skips newlines only (the "linebreak" production that may follow `|`,
    /// `&&`, `||`, and most opening keywords), draining here-doc bodies.
    pub(super) fn skip_linebreaks(&mut self) {
        while self.current.kind == TokenKind::Newline {
            self.advance();
            self.drain_heredoc_bodies();
        }
    }

    fn at_statement_terminator(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::EndOfInput
        )
    }

    /// Matches any `HeredocContent` tokens the lexer just queued against the
    /// here-docs registered earlier in the same statement, in order.
    fn drain_heredoc_bodies(&mut self) {
        while self.current.kind == TokenKind::HeredocContent {
            let token = self.advance();
            if let Some(here_doc) = self.pending_heredocs.pop_front() {
                let word = crate::lexer::token_to_word(&token);
                *here_doc.content.borrow_mut() = Some(word);
            }
        }
    }

    pub(super) fn next_id(&mut self, span: Span) -> Option<NodeId> {
        let id = self.ids.next_id();
        self.positions.set(id, span);
        Some(id)
    }

    pub(super) fn report(&mut self, err: ParseError) {
        let (hint, suggestion) = (err.hint.clone(), err.suggestion.clone());
        self.collector.push(ParseNote {
            severity: Severity::Error,
            code: err.code(),
            message: err.to_string(),
            span: err.span,
            context: err.context.clone(),
            fix_hint: suggestion.or(hint),
        });
    }

    /// Builds a [`ParseError`] for "expected `expected`, found whatever is
    /// current", enriched with a lookahead hint/suggestion and an optional
    /// production-context string.
    pub(super) fn unexpected(&self, expected: Expected, context: Option<&str>) -> ParseError {
        let found_lbrace = self.current.kind == TokenKind::LBrace;
        let found_word = self.current.is_word_like();
        let found_eof = self.current.kind == TokenKind::EndOfInput;
        let (hint, suggestion) = error::lookahead_hint(expected, found_lbrace, found_word, found_eof);
        ParseError {
            expected,
            found_description: describe_token(&self.current),
            span: self.current.span,
            context: context.map(str::to_string),
            hint,
            suggestion,
        }
    }

    /// Consumes `kind` or raises/reports an `expected` error.
    pub(super) fn expect(&mut self, kind: TokenKind, expected: Expected, context: &str) -> Result<Token, ParseError> {
        if self.current.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected, Some(context)))
        }
    }

    /// As [`expect`](Self::expect), but in recovery mode reports the error
    /// and synthesizes the missing token instead of bubbling it up.
    pub(super) fn expect_or_recover(
        &mut self,
        kind: TokenKind,
        expected: Expected,
        context: &str,
    ) -> Result<(), ParseError> {
        if self.current.kind == kind {
            self.advance();
            return Ok(());
        }
        let err = self.unexpected(expected, Some(context));
        if self.strict {
            return Err(err);
        }
        self.report(err);
        Ok(())
    }

    fn make_pipeline(&mut self, commands: Vec<Statement>, operator: Option<PipelineOperator>, span: Span) -> Pipeline {
        let id = self.next_id(span);
        Pipeline {
            id,
            commands,
            operator,
            negated: false,
            background: false,
            span,
        }
    }

    // --- and-or / pipe chains ----------------------------------------------

    /// One statement-list item: an and-or list, optionally backgrounded.
    fn parse_and_or_statement(&mut self) -> Result<Statement, ParseError> {
        let mut pipeline = self.parse_or_level()?;
        if self.current.kind == TokenKind::Amp {
            self.advance();
            pipeline.background = true;
            pipeline.span = pipeline.span.union(&self.previous_span);
            // A multi-command `&&`/`||`/`|` chain backgrounded as a whole
            // reports its outer operator as `&`, the chain operator having
            // already done its job of building the `commands` list; a lone
            // backgrounded command keeps `operator: None` untouched, since
            // there's no chain shape to report.
            if pipeline.commands.len() > 1 {
                pipeline.operator = Some(PipelineOperator::Background);
            }
        }
        Ok(Statement::Pipeline(pipeline))
    }

    /// `&&`-chain wrapped in `||`-chain: `||` binds loosest, so a run of
    /// `&&`-pipelines is what `||` actually chains together.
    fn parse_or_level(&mut self) -> Result<Pipeline, ParseError> {
        let start = self.current.span;
        let first = self.parse_and_level()?;
        if self.current.kind != TokenKind::OrOr {
            return Ok(first);
        }
        let mut commands = vec![Statement::Pipeline(first)];
        while self.current.kind == TokenKind::OrOr {
            self.advance();
            self.skip_linebreaks();
            commands.push(Statement::Pipeline(self.parse_and_level()?));
        }
        let span = start.union(&self.previous_span);
        Ok(self.make_pipeline(commands, Some(PipelineOperator::Or), span))
    }

    fn parse_and_level(&mut self) -> Result<Pipeline, ParseError> {
        let start = self.current.span;
        let first = self.parse_pipe_level()?;
        if self.current.kind != TokenKind::AndAnd {
            return Ok(first);
        }
        let mut commands = vec![Statement::Pipeline(first)];
        while self.current.kind == TokenKind::AndAnd {
            self.advance();
            self.skip_linebreaks();
            commands.push(Statement::Pipeline(self.parse_pipe_level()?));
        }
        let span = start.union(&self.previous_span);
        Ok(self.make_pipeline(commands, Some(PipelineOperator::And), span))
    }

    /// `[!] command (| command | |& command)*`.
    fn parse_pipe_level(&mut self) -> Result<Pipeline, ParseError> {
        let start = self.current.span;
        let negated = self.matches(TokenKind::Bang);
        let mut commands = vec![self.parse_compound_or_simple()?];
        loop {
            match self.current.kind {
                TokenKind::Pipe => {
                    self.advance();
                    self.skip_linebreaks();
                    commands.push(self.parse_compound_or_simple()?);
                }
                TokenKind::PipeAmp => {
                    self.attach_stderr_merge(&mut commands);
                    self.advance();
                    self.skip_linebreaks();
                    commands.push(self.parse_compound_or_simple()?);
                }
                _ => break,
            }
        }
        let span = start.union(&self.previous_span);
        let operator = if commands.len() > 1 { Some(PipelineOperator::Pipe) } else { None };
        let mut pipeline = self.make_pipeline(commands, operator, span);
        pipeline.negated = negated;
        Ok(pipeline)
    }

    /// `|&` is recorded as `|` with an implicit stderr-merge redirection
    /// (`2>&1`) attached to the command that precedes it.
    fn attach_stderr_merge(&mut self, commands: &mut [Statement]) {
        use crate::syntax::{Redirection, RedirectionBody, RedirectionOperator};
        let span = self.current.span;
        let id = self.next_id(span);
        let target = Word::literal("1", span);
        let redirect = Redirection {
            id,
            fd: Some(2),
            fd_variable: None,
            body: RedirectionBody::Normal { operator: RedirectionOperator::FdOut, target },
            span,
        };
        if let Some(Statement::Command(command)) = commands.last_mut() {
            command.redirects.push(redirect);
        }
    }

    /// Dispatches to a compound command, a `[[ ]]` test, `(( ))`, a function
    /// declaration, or falls back to a simple command / bare assignment.
    fn parse_compound_or_simple(&mut self) -> Result<Statement, ParseError> {
        match self.current.kind {
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Until => self.parse_until_statement(),
            TokenKind::Case => self.parse_case_statement(),
            TokenKind::LBrace => self.parse_brace_group(),
            TokenKind::LParen => self.parse_subshell(),
            TokenKind::DoubleLBracket => self.parse_test_command(),
            TokenKind::DoubleLParen => self.parse_arithmetic_command(),
            TokenKind::Function => self.parse_function_declaration(),
            _ if self.at_function_definition() => self.parse_function_declaration(),
            _ => self.parse_simple_statement(),
        }
    }

    /// `name() { ... }` / `name() ( ... )`: a bare name immediately followed
    /// by `()`, with no `function` keyword. Requires two tokens of
    /// lookahead past the current name, so we probe a throwaway sub-lexer
    /// over the remaining source.
    fn at_function_definition(&mut self) -> bool {
        if !matches!(self.current.kind, TokenKind::Word | TokenKind::Name) {
            return false;
        }
        let mut probe = Lexer::new(self.lexer.rest());
        let mut scratch = DiagnosticCollector::new();
        probe.next(&mut scratch).kind == TokenKind::LParen
            && probe.next(&mut scratch).kind == TokenKind::RParen
    }

    fn parse_arithmetic_command(&mut self) -> Result<Statement, ParseError> {
        use crate::syntax::ArithmeticCommand;
        let start = self.current.span;
        // `current` is the already-scanned `((` token; the buffer sits right
        // after it, so we switch to raw scanning from here instead of
        // calling `advance` (which would eagerly tokenize the arithmetic
        // body with the shell lexer's own rules).
        self.previous_span = self.current.span;
        let text_start = self.lexer.get_position();
        let body = self.scan_balanced_arithmetic();
        let expr_span = Span::new(text_start, self.lexer.get_position());
        let expression = crate::arith::parse(&body).map_err(|err| ParseError {
            expected: Expected::Word,
            found_description: err.to_string(),
            span: expr_span,
            context: Some("in arithmetic command".to_string()),
            hint: None,
            suggestion: None,
        })?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::ArithmeticCommand(ArithmeticCommand { id, expression, span }))
    }

    /// Consumes raw source text up to (not including) the closing `))`,
    /// tracking nesting of inner parens so `(( (1) + 2 ))`-style bodies
    /// don't terminate early, then eats the `))` itself and re-synchronizes
    /// the one-token lookahead.
    fn scan_balanced_arithmetic(&mut self) -> String {
        let mut depth = 0i32;
        let mut out = String::new();
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
            out.push(c);
            self.lexer.consume_char();
        }
        self.lexer.consume_char();
        self.lexer.consume_char();
        self.current = self.lexer.next(&mut self.collector);
        out
    }

    fn parse_simple_statement(&mut self) -> Result<Statement, ParseError> {
        match self.current.kind {
            TokenKind::Name if self.is_jump_keyword("return") => self.parse_return_statement(),
            TokenKind::Name if self.is_jump_keyword("break") => self.parse_break_statement(),
            TokenKind::Name if self.is_jump_keyword("continue") => self.parse_continue_statement(),
            _ => self.parse_simple_command_or_assignment(),
        }
    }

    fn is_jump_keyword(&self, keyword: &str) -> bool {
        self.current.lexeme == keyword
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        use crate::syntax::ReturnStatement;
        let start = self.current.span;
        self.advance();
        let value = if self.current.is_word_like() {
            Some(crate::lexer::token_to_word(&self.advance()))
        } else {
            None
        };
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::ReturnStatement(ReturnStatement { id, value, span }))
    }

    fn parse_break_statement(&mut self) -> Result<Statement, ParseError> {
        use crate::syntax::BreakStatement;
        let start = self.current.span;
        self.advance();
        let level = self.parse_jump_level();
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::BreakStatement(BreakStatement { id, level, span }))
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, ParseError> {
        use crate::syntax::ContinueStatement;
        let start = self.current.span;
        self.advance();
        let level = self.parse_jump_level();
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::ContinueStatement(ContinueStatement { id, level, span }))
    }

    fn parse_jump_level(&mut self) -> Option<u32> {
        if self.current.kind == TokenKind::Number {
            let token = self.advance();
            token.lexeme.parse().ok()
        } else {
            None
        }
    }
}

fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::EndOfInput => "end of input".to_string(),
        TokenKind::Newline => "a newline".to_string(),
        _ if token.is_word_like() => format!("'{}'", token.lexeme),
        _ => format!("'{}'", token.lexeme),
    }
}
