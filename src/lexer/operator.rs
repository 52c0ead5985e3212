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

use super::token::TokenKind;

/// Greedy longest-match operator table: three-character operators first,
/// then two-character, then single-character. `{`, `}`, and `!` are handled
/// separately by the lexer since their tokenization depends on context.
pub const OPERATORS: &[(&str, TokenKind)] = &[
    // three-character
    (";;&", TokenKind::CaseContinue),
    ("<<<", TokenKind::LessLessLess),
    ("&>>", TokenKind::AndGreatGreat),
    ("<<-", TokenKind::LessLessDash),
    // two-character
    ("[[", TokenKind::DoubleLBracket),
    ("]]", TokenKind::DoubleRBracket),
    ("((", TokenKind::DoubleLParen),
    ("))", TokenKind::DoubleRParen),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    (";;", TokenKind::CaseBreak),
    (";&", TokenKind::CaseFallThrough),
    ("|&", TokenKind::PipeAmp),
    (">>", TokenKind::GreatGreat),
    ("<<", TokenKind::LessLess),
    ("<&", TokenKind::LessAmp),
    (">&", TokenKind::GreatAmp),
    ("<>", TokenKind::LessGreat),
    (">|", TokenKind::GreatPipe),
    ("&>", TokenKind::AndGreat),
    ("<(", TokenKind::LessParen),
    (">(", TokenKind::GreatParen),
    // single-character
    ("|", TokenKind::Pipe),
    ("&", TokenKind::Amp),
    (";", TokenKind::Semicolon),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("<", TokenKind::Less),
    (">", TokenKind::Great),
];

/// Finds the longest operator in [`OPERATORS`] that `rest` starts with.
pub fn match_operator(rest: &str) -> Option<(&'static str, TokenKind)> {
    OPERATORS
        .iter()
        .find(|&&(lexeme, _)| rest.starts_with(lexeme))
        .map(|&(lexeme, kind)| (lexeme, kind))
}

/// `true` if `c` can start a (non-brace, non-bang) operator token, used by
/// the word scanner's fast path to find where an unquoted run ends.
pub fn is_operator_start(c: char) -> bool {
    matches!(c, '|' | '&' | ';' | '(' | ')' | '<' | '>')
}
