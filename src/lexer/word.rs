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

//! Word scanning: the fast path (a bare run of ordinary characters) and the
//! slow path (anything touching a quote or an expansion sigil).

use std::rc::Rc;

use super::operator::is_operator_start;
use super::token::{keyword_kind, Token, TokenFlags, TokenKind};
use crate::diagnostics::{Code, DiagnosticCollector, ParseNote, Severity};
use crate::param;
use crate::source::{SourceBuffer, Span};
use crate::syntax::{
    ArithmeticExpansionPart, CommandSubstitution, ProcessSubstitution, ProcessSubstitutionDirection, Word,
    WordPart,
};

/// Characters that trigger the slow path: any quoting or expansion sigil.
pub fn starts_slow_path(c: char) -> bool {
    matches!(c, '\'' | '"' | '\\' | '$' | '`' | '{' | '}' | '~' | '*' | '?' | '[')
}

/// `true` if `c` ends an unquoted word run: whitespace, newline, or an
/// operator-starting character. `#` is deliberately not included: it only
/// starts a comment at word-start position, which the lexer's dispatcher
/// checks before ever calling [`scan_word`]; inside an already-started word,
/// `#` is just another literal character (`a#b` is one word).
fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || is_operator_start(c)
}

/// Classifies a scanned word: a reserved-word key, `NAME`, `NUMBER`, and
/// `ASSIGNMENT_WORD` in that order, falling back to plain `WORD`. Used for
/// both the fast path (`quoted`/`begins_with_quote` both `false`) and the
/// slow path, where reserved-word recognition is suppressed whenever
/// `quoted` is set, and ASSIGNMENT_WORD is only produced when the word does
/// not begin with a quote.
fn classify_slow_path(word: &str, quoted: bool, begins_with_quote: bool) -> TokenKind {
    if !quoted {
        if let Some(kind) = keyword_kind(word) {
            return kind;
        }
    }
    if is_name(word) {
        return TokenKind::Name;
    }
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
        return TokenKind::Number;
    }
    if !begins_with_quote && is_assignment_word(word) {
        return TokenKind::AssignmentWord;
    }
    TokenKind::Word
}

fn is_name(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `ident([subscript])?\+?=` with something before the `=` at offset > 0.
fn is_assignment_word(word: &str) -> bool {
    let Some(eq) = word.find('=') else { return false };
    if eq == 0 {
        return false;
    }
    let mut lhs = &word[..eq];
    if let Some(stripped) = lhs.strip_suffix('+') {
        lhs = stripped;
    }
    let ident_end = lhs
        .find('[')
        .unwrap_or(lhs.len());
    let ident = &lhs[..ident_end];
    if !is_name(ident) {
        return false;
    }
    if ident_end != lhs.len() {
        lhs.ends_with(']')
    } else {
        true
    }
}

/// Scans characters forward while `open`/`close` stay balanced (honoring
/// nested quotes so an unbalanced paren inside a string doesn't end the
/// scan early), starting at `depth` already-open levels. The caller has
/// already consumed the opening delimiter(s) that establish that depth.
/// Returns the raw text consumed, not including the final closing
/// delimiter.
fn scan_balanced(buffer: &mut SourceBuffer<'_>, open: char, close: char, mut depth: usize) -> String {
    let mut content = String::new();
    while depth > 0 {
        match buffer.peek() {
            None => break,
            Some('\'') => {
                content.push('\'');
                buffer.advance();
                while let Some(c) = buffer.peek() {
                    content.push(c);
                    buffer.advance();
                    if c == '\'' {
                        break;
                    }
                }
            }
            Some('"') => {
                content.push('"');
                buffer.advance();
                while let Some(c) = buffer.peek() {
                    if c == '\\' {
                        content.push(c);
                        buffer.advance();
                        if let Some(n) = buffer.advance() {
                            content.push(n);
                        }
                        continue;
                    }
                    content.push(c);
                    buffer.advance();
                    if c == '"' {
                        break;
                    }
                }
            }
            Some('\\') => {
                content.push('\\');
                buffer.advance();
                if let Some(n) = buffer.advance() {
                    content.push(n);
                }
            }
            Some(c) if c == open => {
                depth += 1;
                content.push(c);
                buffer.advance();
            }
            Some(c) if c == close => {
                depth -= 1;
                buffer.advance();
                if depth == 0 {
                    break;
                }
                content.push(c);
            }
            Some(c) => {
                content.push(c);
                buffer.advance();
            }
        }
    }
    content
}

/// Scans a `` `...` `` command substitution body: raw text up to the next
/// unescaped backtick.
fn scan_backtick(buffer: &mut SourceBuffer<'_>) -> String {
    let mut content = String::new();
    while let Some(c) = buffer.peek() {
        if c == '\\' {
            content.push(c);
            buffer.advance();
            if let Some(n) = buffer.advance() {
                content.push(n);
            }
            continue;
        }
        buffer.advance();
        if c == '`' {
            break;
        }
        content.push(c);
    }
    content
}

/// Scans a quote body (single, ANSI-C `$'...'`, or locale `$"..."`) up to
/// the matching unescaped closing quote. `escapes` controls whether `\` is
/// honored (false for plain single quotes, true otherwise).
fn scan_quoted(buffer: &mut SourceBuffer<'_>, quote: char, escapes: bool) -> String {
    let mut content = String::new();
    while let Some(c) = buffer.peek() {
        if escapes && c == '\\' {
            content.push(c);
            buffer.advance();
            if let Some(n) = buffer.advance() {
                content.push(n);
            }
            continue;
        }
        buffer.advance();
        if c == quote {
            break;
        }
        content.push(c);
    }
    content
}

/// Decodes a double-quoted body's backslash escapes (`\$`, `` \` ``, `\"`,
/// `\\`, and line continuations) into literal text, leaving everything else
/// (including bare `$`/`` ` `` that begin a nested expansion) to the caller.
fn decode_double_quote_escapes(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('$') | Some('`') | Some('"') | Some('\\') => {
                    out.push(chars.next().unwrap());
                }
                Some('\n') => {
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// The accumulated state of an in-progress word scan.
struct WordState {
    start_offset: usize,
    parts: Vec<WordPart>,
    literal: String,
    quoted: bool,
    single_quoted: bool,
    /// `true` once the word's very first character has been consumed and
    /// that character was a quote (`'` or `"`). Only this narrower,
    /// word-initial notion of "quoted" suppresses ASSIGNMENT_WORD
    /// classification; `quoted` (quoting anywhere in the word) is what
    /// suppresses reserved-word recognition.
    begins_with_quote: bool,
    first_char_seen: bool,
}

impl WordState {
    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.parts.push(WordPart::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn push_part(&mut self, part: WordPart) {
        self.flush_literal();
        self.parts.push(part);
    }
}

/// Renders a [`WordPart`] back into a textual approximation, used to build a
/// word's naive `value` field.
fn render_part(part: &WordPart) -> String {
    match part {
        WordPart::Literal(text) => text.clone(),
        WordPart::GlobPattern(text) => text.clone(),
        WordPart::ParameterExpansion(pe) => {
            if pe.braced {
                format!("${{{}}}", pe.parameter)
            } else {
                format!("${}", pe.parameter)
            }
        }
        WordPart::CommandSubstitution(cs) => {
            if cs.backtick {
                format!("`{}`", cs.content)
            } else {
                format!("$({})", cs.content)
            }
        }
        WordPart::ArithmeticExpansion(ae) => format!("$(({}))", render_expr_placeholder(ae)),
        WordPart::ProcessSubstitution(ps) => match ps.direction {
            ProcessSubstitutionDirection::In => format!("<({})", ps.content),
            ProcessSubstitutionDirection::Out => format!(">({})", ps.content),
        },
    }
}

fn render_expr_placeholder(_ae: &ArithmeticExpansionPart) -> &'static str {
    "..."
}

/// Scans one word starting at the buffer's current position, dispatching
/// between the fast path (bare character run) and the slow path (anything
/// touching a quote/expansion sigil), and classifies the result.
pub fn scan_word(buffer: &mut SourceBuffer<'_>, collector: &mut DiagnosticCollector) -> Token {
    let start = buffer.position();
    let mut state = WordState {
        start_offset: start.offset,
        parts: Vec::new(),
        literal: String::new(),
        quoted: false,
        single_quoted: false,
        begins_with_quote: false,
        first_char_seen: false,
    };

    while let Some(c) = buffer.peek() {
        if is_word_boundary(c) {
            break;
        }
        if !state.first_char_seen {
            state.begins_with_quote = matches!(c, '\'' | '"');
            state.first_char_seen = true;
        }
        if !starts_slow_path(c) {
            state.literal.push(c);
            buffer.advance();
            continue;
        }
        scan_slow_path_segment(buffer, &mut state, collector);
    }

    state.flush_literal();
    let end = buffer.position();
    let span = Span::new(start, end);

    let value: String = state.parts.iter().map(render_part).collect();
    // Reserved-word recognition is suppressed inside any quoted span, but a
    // quoted word otherwise classifies exactly like a bare one: "if" quoted
    // anywhere still comes out NAME, not the IF keyword. ASSIGNMENT_WORD
    // alone has the narrower, word-initial rule: only a word that doesn't
    // *begin* with a quote can be one, so `name="v"` (quote appears after
    // the name) is still an assignment while `"name=v"` is not.
    let kind = classify_slow_path(&value, state.quoted, state.begins_with_quote);
    let lexeme = buffer.source()[state.start_offset..end.offset].to_string();

    Token {
        kind,
        lexeme,
        span,
        flags: Some(TokenFlags {
            quoted: state.quoted,
            single_quoted: state.single_quoted,
        }),
        parts: state.parts,
    }
}

/// Turns the token just produced by [`scan_word`] into a full [`Word`] AST
/// node (without an id; the grammar parser assigns one).
pub fn token_to_word(token: &Token) -> Word {
    Word {
        id: None,
        value: token.lexeme.clone(),
        quoted: token.flags.map(|f| f.quoted).unwrap_or(false),
        single_quoted: token.flags.map(|f| f.single_quoted).unwrap_or(false),
        parts: token.parts.clone(),
        span: token.span,
    }
}

fn scan_slow_path_segment(buffer: &mut SourceBuffer<'_>, state: &mut WordState, collector: &mut DiagnosticCollector) {
    let segment_start = buffer.position();
    match buffer.peek().unwrap() {
        '\'' => {
            buffer.advance();
            let body = scan_quoted(buffer, '\'', false);
            state.literal.push_str(&body);
            state.quoted = true;
            state.single_quoted = true;
        }
        '"' => {
            buffer.advance();
            scan_double_quoted_into(buffer, state, collector);
            state.quoted = true;
        }
        '\\' => {
            buffer.advance();
            match buffer.peek() {
                Some('\n') => {
                    buffer.advance();
                }
                Some(c) => {
                    state.literal.push(c);
                    buffer.advance();
                }
                None => {}
            }
        }
        '`' => {
            buffer.advance();
            let content = scan_backtick(buffer);
            let span = Span::new(segment_start, buffer.position());
            state.push_part(WordPart::CommandSubstitution(CommandSubstitution {
                id: None,
                content: Rc::from(content),
                backtick: true,
                span,
            }));
            state.quoted = true;
        }
        '$' => {
            scan_dollar(buffer, state, collector);
        }
        '{' | '}' => {
            scan_brace_literal(buffer, state);
        }
        '~' => {
            state.literal.push('~');
            buffer.advance();
        }
        '*' | '?' => {
            let mut run = String::new();
            while matches!(buffer.peek(), Some('*') | Some('?')) {
                run.push(buffer.advance().unwrap());
            }
            state.push_part(WordPart::GlobPattern(run));
        }
        '[' => {
            scan_bracket_glob(buffer, state);
        }
        _ => unreachable!("starts_slow_path guarantees one of the above"),
    }
}

fn scan_double_quoted_into(buffer: &mut SourceBuffer<'_>, state: &mut WordState, collector: &mut DiagnosticCollector) {
    loop {
        match buffer.peek() {
            None => break,
            Some('"') => {
                buffer.advance();
                break;
            }
            Some('\\') => {
                buffer.advance();
                match buffer.peek() {
                    Some('$') | Some('`') | Some('"') | Some('\\') => {
                        state.literal.push(buffer.advance().unwrap());
                    }
                    Some('\n') => {
                        buffer.advance();
                    }
                    _ => {
                        state.literal.push('\\');
                    }
                }
            }
            Some('$') => scan_dollar(buffer, state, collector),
            Some('`') => {
                let backtick_start = buffer.position();
                buffer.advance();
                let content = scan_backtick(buffer);
                let span = Span::new(backtick_start, buffer.position());
                state.push_part(WordPart::CommandSubstitution(CommandSubstitution {
                    id: None,
                    content: Rc::from(content),
                    backtick: true,
                    span,
                }));
            }
            Some(c) => {
                state.literal.push(c);
                buffer.advance();
            }
        }
    }
}

/// A balanced `{...}` consumed verbatim into the literal text, per the
/// brace-expansion-vs-literal-brace rule (both cases fold into plain
/// literal text; only an isolated `{`/`}` with no word before it is its own
/// LBRACE/RBRACE token, handled by the caller before word scanning starts).
fn scan_brace_literal(buffer: &mut SourceBuffer<'_>, state: &mut WordState) {
    let c = buffer.advance().unwrap();
    state.literal.push(c);
}

fn scan_bracket_glob(buffer: &mut SourceBuffer<'_>, state: &mut WordState) {
    let rest = buffer.rest();
    if let Some(end) = rest.find(']') {
        if !rest[..end].contains(char::is_whitespace) {
            let text = rest[..=end].to_string();
            for _ in 0..text.chars().count() {
                buffer.advance();
            }
            state.push_part(WordPart::GlobPattern(text));
            return;
        }
    }
    state.literal.push('[');
    buffer.advance();
}

fn scan_dollar(buffer: &mut SourceBuffer<'_>, state: &mut WordState, collector: &mut DiagnosticCollector) {
    let start = buffer.position();
    buffer.advance(); // `$`
    match buffer.peek() {
        Some('(') if buffer.peek_next() == Some('(') => {
            buffer.advance();
            buffer.advance();
            let content = scan_balanced(buffer, '(', ')', 2);
            let span = Span::new(start, buffer.position());
            match crate::arith::parse(&content) {
                Ok(expr) => state.push_part(WordPart::ArithmeticExpansion(ArithmeticExpansionPart {
                    id: None,
                    expression: Box::new(expr),
                    span,
                })),
                Err(err) => {
                    collector.push(ParseNote {
                        severity: Severity::Error,
                        code: Code::UNEXPECTED_TOKEN,
                        message: format!("invalid arithmetic expansion: {err}"),
                        span,
                        context: Some("in arithmetic expansion".to_string()),
                        fix_hint: None,
                    });
                }
            }
        }
        Some('(') => {
            buffer.advance();
            let content = scan_balanced(buffer, '(', ')', 1);
            let span = Span::new(start, buffer.position());
            state.push_part(WordPart::CommandSubstitution(CommandSubstitution {
                id: None,
                content: Rc::from(content),
                backtick: false,
                span,
            }));
        }
        Some('{') => {
            buffer.advance();
            let inner = scan_balanced(buffer, '{', '}', 1);
            let span = Span::new(start, buffer.position());
            state.push_part(WordPart::ParameterExpansion(param::parse_braced(&inner, span, collector)));
        }
        Some('[') => {
            buffer.advance();
            let content = scan_balanced(buffer, '[', ']', 1);
            let span = Span::new(start, buffer.position());
            match crate::arith::parse(&content) {
                Ok(expr) => state.push_part(WordPart::ArithmeticExpansion(ArithmeticExpansionPart {
                    id: None,
                    expression: Box::new(expr),
                    span,
                })),
                Err(err) => {
                    collector.push(ParseNote {
                        severity: Severity::Error,
                        code: Code::UNEXPECTED_TOKEN,
                        message: format!("invalid arithmetic expansion: {err}"),
                        span,
                        context: Some("in arithmetic expansion".to_string()),
                        fix_hint: None,
                    });
                }
            }
        }
        Some('\'') => {
            buffer.advance();
            let body = scan_quoted(buffer, '\'', true);
            state.literal.push_str(&body);
            state.quoted = true;
        }
        Some('"') => {
            buffer.advance();
            let body = scan_quoted(buffer, '"', true);
            state.literal.push_str(&decode_double_quote_escapes(&body));
            state.quoted = true;
        }
        Some(c) if param::is_special_parameter_char(c) => {
            buffer.advance();
            let span = Span::new(start, buffer.position());
            state.push_part(WordPart::ParameterExpansion(param::parse_unbraced(&c.to_string(), span)));
        }
        Some(c) if c.is_alphabetic() || c == '_' => {
            let rest = buffer.rest();
            let len = rest
                .char_indices()
                .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let name = rest[..len].to_string();
            for _ in 0..name.chars().count() {
                buffer.advance();
            }
            let full_span = Span::new(start, buffer.position());
            state.push_part(WordPart::ParameterExpansion(param::parse_unbraced(&name, full_span)));
        }
        _ => {
            // A lone `$` with nothing expansion-worthy after it is literal.
            state.literal.push('$');
        }
    }
}
