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

//! `[[ ... ]]` test expressions.
//!
//! The lexer has no dedicated test-operator tokens: `-e`, `-eq`, `=~`, `==`
//! and friends all come through as ordinary `Word`/`Name` tokens, and are
//! recognized here by their literal text. `<` and `>` do get their own
//! tokens (`Less`/`Great`, the same ones redirections use), since those are
//! real operator characters at the lexer layer regardless of context.
//!
//! Precedence, loosest to tightest: `||`, `&&`, `!` (prefix), then a single
//! unary/binary/string primary, matching the grammar of a POSIX `[[ ]]` as
//! bash and ksh extend it.

use crate::lexer::{token_to_word, TokenKind};
use crate::syntax::{
    BinaryTestOperator, LogicalTestOperator, Statement, TestCommand, TestCondition, UnaryTestOperator,
};

use super::error::{Expected, ParseError};
use super::Parser;

fn unary_operator_for(text: &str) -> Option<UnaryTestOperator> {
    use UnaryTestOperator::*;
    Some(match text {
        "-e" => FileExists,
        "-f" => RegularFile,
        "-d" => Directory,
        "-L" | "-h" => SymbolicLink,
        "-b" => BlockDevice,
        "-c" => CharDevice,
        "-p" => NamedPipe,
        "-S" => Socket,
        "-t" => Terminal,
        "-r" => Readable,
        "-w" => Writable,
        "-x" => Executable,
        "-s" => NonEmptyFile,
        "-g" => SetGid,
        "-u" => SetUid,
        "-k" => Sticky,
        "-O" => OwnedByEffectiveUser,
        "-G" => OwnedByEffectiveGroup,
        "-N" => ModifiedSinceLastRead,
        "-z" => StringEmpty,
        "-n" => StringNonEmpty,
        _ => return None,
    })
}

fn binary_word_operator_for(text: &str) -> Option<BinaryTestOperator> {
    use BinaryTestOperator::*;
    Some(match text {
        "=" | "==" => StringEq,
        "!=" => StringNe,
        "-eq" => NumEq,
        "-ne" => NumNe,
        "-lt" => NumLt,
        "-le" => NumLe,
        "-gt" => NumGt,
        "-ge" => NumGe,
        "-nt" => FileNewer,
        "-ot" => FileOlder,
        "-ef" => FileSame,
        "=~" => RegexMatch,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(super) fn parse_test_command(&mut self) -> Result<Statement, ParseError> {
        let start = self.peek().span;
        self.advance(); // `[[`
        let condition = self.parse_test_or()?;
        self.expect_or_recover(TokenKind::DoubleRBracket, Expected::DoubleRBracket, "in '[[ ]]' test")?;
        let span = start.union(&self.previous_span);
        let id = self.next_id(span);
        Ok(Statement::TestCommand(TestCommand { id, condition, span }))
    }

    fn parse_test_or(&mut self) -> Result<TestCondition, ParseError> {
        let mut left = self.parse_test_and()?;
        while self.peek().kind == TokenKind::OrOr {
            self.advance();
            let right = self.parse_test_and()?;
            left = TestCondition::Logical {
                operator: LogicalTestOperator::Or,
                left: Some(Box::new(left)),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_test_and(&mut self) -> Result<TestCondition, ParseError> {
        let mut left = self.parse_test_not()?;
        while self.peek().kind == TokenKind::AndAnd {
            self.advance();
            let right = self.parse_test_not()?;
            left = TestCondition::Logical {
                operator: LogicalTestOperator::And,
                left: Some(Box::new(left)),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_test_not(&mut self) -> Result<TestCondition, ParseError> {
        if self.peek().kind == TokenKind::Bang {
            self.advance();
            let operand = self.parse_test_not()?;
            return Ok(TestCondition::Logical {
                operator: LogicalTestOperator::Not,
                left: None,
                right: Box::new(operand),
            });
        }
        self.parse_test_primary()
    }

    fn parse_test_primary(&mut self) -> Result<TestCondition, ParseError> {
        if self.peek().kind == TokenKind::LParen {
            self.advance();
            let inner = self.parse_test_or()?;
            self.expect_or_recover(TokenKind::RParen, Expected::RParen, "in '[[ ]]' test")?;
            return Ok(TestCondition::Grouped(Box::new(inner)));
        }

        if self.peek().is_word_like() {
            if let Some(operator) = unary_operator_for(&self.peek().lexeme) {
                self.advance();
                let operand = token_to_word(&self.expect_word("in '[[ ]]' test")?);
                return Ok(TestCondition::Unary { operator, operand });
            }
        }

        let left_token = self.expect_word("in '[[ ]]' test")?;
        let left = token_to_word(&left_token);

        if let Some(operator) = binary_word_operator_for(&self.peek().lexeme).filter(|_| self.peek().is_word_like()) {
            self.advance();
            let right_token = self.expect_word("in '[[ ]]' test")?;
            let right = token_to_word(&right_token);
            return Ok(TestCondition::Binary { operator, left, right });
        }
        let string_binary = match self.peek().kind {
            TokenKind::Less => Some(BinaryTestOperator::StringLt),
            TokenKind::Great => Some(BinaryTestOperator::StringGt),
            _ => None,
        };
        if let Some(operator) = string_binary {
            self.advance();
            let right_token = self.expect_word("in '[[ ]]' test")?;
            let right = token_to_word(&right_token);
            return Ok(TestCondition::Binary { operator, left, right });
        }

        Ok(TestCondition::StringTest(left))
    }

    /// Any word-bearing token kind counts as a test operand.
    fn expect_word(&mut self, context: &str) -> Result<crate::lexer::Token, ParseError> {
        if self.peek().is_word_like() {
            Ok(self.advance())
        } else {
            Err(self.unexpected(Expected::Word, Some(context)))
        }
    }
}
