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

use crate::source::Span;
use crate::syntax::WordPart;

/// Every kind of token the lexer can emit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    EndOfInput,
    Newline,
    Semicolon,
    Amp,

    Pipe,
    PipeAmp,
    AndAnd,
    OrOr,
    Bang,

    Less,
    Great,
    GreatGreat,
    LessLess,
    LessLessDash,
    LessLessLess,
    LessAmp,
    GreatAmp,
    LessGreat,
    GreatPipe,
    AndGreat,
    AndGreatGreat,
    LessParen,
    GreatParen,

    LParen,
    RParen,
    LBrace,
    RBrace,
    DoubleLBracket,
    DoubleRBracket,
    DoubleLParen,
    DoubleRParen,

    CaseBreak,
    CaseFallThrough,
    CaseContinue,

    If,
    Then,
    Else,
    Elif,
    Fi,
    For,
    While,
    Until,
    Do,
    Done,
    Case,
    Esac,
    In,
    Function,
    Select,
    Time,
    Coproc,

    Word,
    Name,
    Number,
    AssignmentWord,
    Comment,
    HeredocContent,
}

/// Quoting metadata carried by word-bearing tokens.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TokenFlags {
    pub quoted: bool,
    pub single_quoted: bool,
}

/// One lexical token.
///
/// `parts` is populated for word-bearing kinds (`Word`, `Name`, `Number`,
/// `AssignmentWord`, `HeredocContent`) with the same [`WordPart`] sequence
/// the grammar parser will hang off the eventual `Word` AST node; this lets
/// the grammar build a `Word` by cloning the token's fields rather than
/// re-scanning.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    pub flags: Option<TokenFlags>,
    pub parts: Vec<WordPart>,
}

impl Token {
    pub fn simple(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            span,
            flags: None,
            parts: Vec::new(),
        }
    }

    pub fn is_word_like(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Word | TokenKind::Name | TokenKind::Number | TokenKind::AssignmentWord
        )
    }
}

/// Reserved words recognized at word-boundary positions, per the fast-path
/// classification table.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("if", TokenKind::If),
    ("then", TokenKind::Then),
    ("else", TokenKind::Else),
    ("elif", TokenKind::Elif),
    ("fi", TokenKind::Fi),
    ("for", TokenKind::For),
    ("while", TokenKind::While),
    ("until", TokenKind::Until),
    ("do", TokenKind::Do),
    ("done", TokenKind::Done),
    ("case", TokenKind::Case),
    ("esac", TokenKind::Esac),
    ("in", TokenKind::In),
    ("function", TokenKind::Function),
    ("select", TokenKind::Select),
    ("time", TokenKind::Time),
    ("coproc", TokenKind::Coproc),
];

pub fn keyword_kind(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|&&(text, _)| text == word)
        .map(|&(_, kind)| kind)
}
