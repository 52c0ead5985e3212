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

//! Private tokenizer for arithmetic expressions.

use crate::source::{Position, Span};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    Plus,
    PlusPlus,
    PlusEqual,
    Minus,
    MinusMinus,
    MinusEqual,
    Star,
    StarEqual,
    Slash,
    SlashEqual,
    Percent,
    PercentEqual,
    StarStar,
    Less,
    LessEqual,
    LessLess,
    LessLessEqual,
    Greater,
    GreaterEqual,
    GreaterGreater,
    GreaterGreaterEqual,
    EqualEqual,
    BangEqual,
    Bang,
    Tilde,
    Amp,
    AmpAmp,
    AmpEqual,
    Pipe,
    PipePipe,
    PipeEqual,
    Caret,
    CaretEqual,
    Equal,
    Question,
    Colon,
    Comma,
    OpenParen,
    CloseParen,
}

/// Longest match first, so `**` is not lexed as two `*`s.
const OPERATORS: &[(&str, Op)] = &[
    ("**", Op::StarStar),
    ("*=", Op::StarEqual),
    ("*", Op::Star),
    ("<<=", Op::LessLessEqual),
    ("<<", Op::LessLess),
    ("<=", Op::LessEqual),
    ("<", Op::Less),
    (">>=", Op::GreaterGreaterEqual),
    (">>", Op::GreaterGreater),
    (">=", Op::GreaterEqual),
    (">", Op::Greater),
    ("==", Op::EqualEqual),
    ("!=", Op::BangEqual),
    ("!", Op::Bang),
    ("&&", Op::AmpAmp),
    ("&=", Op::AmpEqual),
    ("&", Op::Amp),
    ("||", Op::PipePipe),
    ("|=", Op::PipeEqual),
    ("|", Op::Pipe),
    ("^=", Op::CaretEqual),
    ("^", Op::Caret),
    ("++", Op::PlusPlus),
    ("+=", Op::PlusEqual),
    ("+", Op::Plus),
    ("--", Op::MinusMinus),
    ("-=", Op::MinusEqual),
    ("-", Op::Minus),
    ("/=", Op::SlashEqual),
    ("/", Op::Slash),
    ("%=", Op::PercentEqual),
    ("%", Op::Percent),
    ("~", Op::Tilde),
    ("=", Op::Equal),
    ("?", Op::Question),
    (":", Op::Colon),
    (",", Op::Comma),
    ("(", Op::OpenParen),
    (")", Op::CloseParen),
];

#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    Number(i64),
    Identifier(String),
    /// Raw text between `${` and the matching `}`, handed to
    /// [`crate::param`] by the parser.
    Parameter(String),
    Op(Op),
    EndOfInput,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub value: TokenValue,
    pub span: Span,
}

#[derive(Debug)]
pub struct ArithLexError {
    pub message: String,
    pub span: Span,
}

fn advance_position(pos: Position, consumed: &str) -> Position {
    let mut pos = pos;
    for c in consumed.chars() {
        pos.offset += c.len_utf8();
        if c == '\n' {
            pos.line += 1;
            pos.column = 1;
        } else {
            pos.column += 1;
        }
    }
    pos
}

pub struct ArithLexer<'a> {
    source: &'a str,
    position: Position,
}

impl<'a> ArithLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        ArithLexer {
            source,
            position: Position::start(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position.offset..]
    }

    fn bump(&mut self, text: &str) {
        self.position = advance_position(self.position, text);
    }

    /// Scans the `${...}` braced form starting right after the `$`, tracking
    /// nested braces so a modifier argument containing `}` (rare, but legal
    /// in e.g. `${x/%/{}}`) doesn't truncate early.
    fn scan_braced_parameter(&mut self) -> Result<Token, ArithLexError> {
        let start = self.position;
        self.bump("${");
        let body_start = self.position.offset;
        let mut depth = 1usize;
        loop {
            match self.rest().chars().next() {
                None => {
                    return Err(ArithLexError {
                        message: "unterminated '${' in arithmetic expression".to_string(),
                        span: Span::new(start, self.position),
                    })
                }
                Some('{') => {
                    depth += 1;
                    self.bump("{");
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        let body = &self.source[body_start..self.position.offset];
                        self.bump("}");
                        return Ok(Token {
                            value: TokenValue::Parameter(body.to_string()),
                            span: Span::new(start, self.position),
                        });
                    }
                    self.bump("}");
                }
                Some(c) => self.bump(&c.to_string()),
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.position;
        let rest = self.rest();
        let mut len = 0;
        let value = if rest.starts_with("0x") || rest.starts_with("0X") {
            len += 2;
            let digits_start = len;
            while rest[len..].starts_with(|c: char| c.is_ascii_hexdigit()) {
                len += 1;
            }
            i64::from_str_radix(&rest[digits_start..len], 16).unwrap_or(0)
        } else if rest.starts_with('0') && rest[1..].starts_with(|c: char| ('0'..='7').contains(&c)) {
            while rest[len..].starts_with(|c: char| ('0'..='7').contains(&c)) {
                len += 1;
            }
            i64::from_str_radix(&rest[..len], 8).unwrap_or(0)
        } else {
            while rest[len..].starts_with(|c: char| c.is_ascii_digit()) {
                len += 1;
            }
            rest[..len].parse().unwrap_or(0)
        };
        self.bump(&rest[..len]);
        Token {
            value: TokenValue::Number(value),
            span: Span::new(start, self.position),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.position;
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let name = rest[..len].to_string();
        self.bump(&rest[..len]);
        Token {
            value: TokenValue::Identifier(name),
            span: Span::new(start, self.position),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ArithLexError> {
        let trimmed = self.rest().trim_start();
        let skipped = self.rest().len() - trimmed.len();
        if skipped > 0 {
            let skipped_text = self.rest()[..skipped].to_string();
            self.bump(&skipped_text);
        }

        let start = self.position;
        let rest = self.rest();
        let Some(c) = rest.chars().next() else {
            return Ok(Token {
                value: TokenValue::EndOfInput,
                span: Span::point(start),
            });
        };

        if c == '$' && rest[1..].starts_with('{') {
            self.bump("$");
            return self.scan_braced_parameter();
        }
        if c.is_ascii_digit() {
            return Ok(self.scan_number());
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }
        if let Some(&(lexeme, op)) = OPERATORS.iter().find(|&&(lexeme, _)| rest.starts_with(lexeme)) {
            self.bump(lexeme);
            return Ok(Token {
                value: TokenValue::Op(op),
                span: Span::new(start, self.position),
            });
        }

        Err(ArithLexError {
            message: format!("unexpected character '{c}' at position {}", start.offset),
            span: Span::point(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<TokenValue> {
        let mut lexer = ArithLexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token.value == TokenValue::EndOfInput {
                break;
            }
            out.push(token.value);
        }
        out
    }

    #[test]
    fn lexes_power_operator_not_two_stars() {
        assert_eq!(tokens("2**3"), vec![
            TokenValue::Number(2),
            TokenValue::Op(Op::StarStar),
            TokenValue::Number(3),
        ]);
    }

    #[test]
    fn lexes_hex_and_octal() {
        assert_eq!(tokens("0x1F"), vec![TokenValue::Number(31)]);
        assert_eq!(tokens("017"), vec![TokenValue::Number(15)]);
    }

    #[test]
    fn lexes_braced_parameter() {
        assert_eq!(
            tokens("${foo:-1}"),
            vec![TokenValue::Parameter("foo:-1".to_string())]
        );
    }

    #[test]
    fn unknown_character_is_an_error() {
        let mut lexer = ArithLexer::new("1 @ 2");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("@"));
    }
}
