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

//! Pratt (top-down operator precedence) parser over [`super::lexer`]'s
//! token stream.

use thiserror::Error;

use super::ast::{ArithmeticExpression, ArithmeticOp, UnaryArithmeticOp};
use super::lexer::{ArithLexer, Op, Token, TokenValue};
use crate::diagnostics::DiagnosticCollector;
use crate::param;
use crate::source::Span;

/// Failure to parse an arithmetic expression.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ArithError {
    #[error("{message} at position {}", span.start.offset)]
    Syntax { message: String, span: Span },
    #[error("unexpected end of arithmetic expression")]
    UnexpectedEof,
    #[error("left-hand side of assignment must be a variable, at position {}", span.start.offset)]
    InvalidAssignmentTarget { span: Span },
}

/// Binding power of an infix operator: `(left, right)`. For a left-
/// associative operator `right = left + 1`; for a right-associative one
/// `right = left`.
fn infix_binding_power(op: Op) -> Option<(u8, u8, ArithmeticOp)> {
    use ArithmeticOp as A;
    use Op::*;
    Some(match op {
        Comma => (1, 2, A::Comma),
        Equal => (2, 2, A::Assign),
        PlusEqual => (2, 2, A::AddAssign),
        MinusEqual => (2, 2, A::SubAssign),
        StarEqual => (2, 2, A::MulAssign),
        SlashEqual => (2, 2, A::DivAssign),
        PercentEqual => (2, 2, A::ModAssign),
        LessLessEqual => (2, 2, A::ShiftLeftAssign),
        GreaterGreaterEqual => (2, 2, A::ShiftRightAssign),
        AmpEqual => (2, 2, A::BitAndAssign),
        PipeEqual => (2, 2, A::BitOrAssign),
        CaretEqual => (2, 2, A::BitXorAssign),
        // Question/Colon (ternary) is handled specially, not through this table.
        PipePipe => (4, 5, A::LogicalOr),
        AmpAmp => (5, 6, A::LogicalAnd),
        Pipe => (6, 7, A::BitOr),
        Caret => (7, 8, A::BitXor),
        Amp => (8, 9, A::BitAnd),
        EqualEqual => (9, 10, A::Eq),
        BangEqual => (9, 10, A::Ne),
        Less => (10, 11, A::Lt),
        Greater => (10, 11, A::Gt),
        LessEqual => (10, 11, A::Le),
        GreaterEqual => (10, 11, A::Ge),
        LessLess => (11, 12, A::ShiftLeft),
        GreaterGreater => (11, 12, A::ShiftRight),
        Plus => (12, 13, A::Add),
        Minus => (12, 13, A::Sub),
        Star => (13, 14, A::Mul),
        Slash => (13, 14, A::Div),
        Percent => (13, 14, A::Mod),
        StarStar => (14, 14, A::Pow),
        _ => return None,
    })
}

const TERNARY_PRECEDENCE: u8 = 3;
const PREFIX_PRECEDENCE: u8 = 15;

struct Tokens<'a> {
    lexer: ArithLexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Tokens<'a> {
    fn new(source: &'a str) -> Self {
        Tokens {
            lexer: ArithLexer::new(source),
            peeked: None,
        }
    }

    fn peek(&mut self) -> Result<&Token, ArithError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.advance_raw()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    fn next(&mut self) -> Result<Token, ArithError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.advance_raw(),
        }
    }

    fn advance_raw(&mut self) -> Result<Token, ArithError> {
        self.lexer.next_token().map_err(|err| ArithError::Syntax {
            message: err.message,
            span: err.span,
        })
    }
}

struct Parser<'a> {
    tokens: Tokens<'a>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            tokens: Tokens::new(source),
        }
    }

    fn parse_expression(&mut self, min_precedence: u8) -> Result<ArithmeticExpression, ArithError> {
        let mut left = self.parse_prefix()?;

        loop {
            let op = match self.tokens.peek()?.value.clone() {
                TokenValue::Op(op) => op,
                _ => break,
            };

            if op == Op::Question {
                if TERNARY_PRECEDENCE < min_precedence {
                    break;
                }
                left = self.parse_ternary(left)?;
                continue;
            }

            let Some((left_power, right_power, arith_op)) = infix_binding_power(op) else {
                break;
            };
            if left_power < min_precedence {
                break;
            }

            let op_token = self.tokens.next()?;
            if arith_op.is_assignment() {
                if !matches!(left, ArithmeticExpression::VariableReference { .. }) {
                    return Err(ArithError::InvalidAssignmentTarget { span: op_token.span });
                }
                let value = self.parse_expression(right_power)?;
                let span = left.span().union(&value.span());
                left = ArithmeticExpression::AssignmentExpression {
                    id: None,
                    operator: arith_op,
                    target: Box::new(left),
                    value: Box::new(value),
                    span,
                };
                continue;
            }

            let right = self.parse_expression(right_power)?;
            let span = left.span().union(&right.span());
            left = ArithmeticExpression::BinaryArithmeticExpression {
                id: None,
                operator: arith_op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn parse_ternary(&mut self, condition: ArithmeticExpression) -> Result<ArithmeticExpression, ArithError> {
        self.tokens.next()?; // `?`
        let consequent = self.parse_expression(0)?;
        self.expect_op(Op::Colon)?;
        let alternate = self.parse_expression(TERNARY_PRECEDENCE)?;
        let span = condition.span().union(&alternate.span());
        Ok(ArithmeticExpression::ConditionalArithmeticExpression {
            id: None,
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        })
    }

    fn expect_op(&mut self, expected: Op) -> Result<Token, ArithError> {
        let token = self.tokens.next()?;
        match &token.value {
            TokenValue::Op(op) if *op == expected => Ok(token),
            TokenValue::EndOfInput => Err(ArithError::UnexpectedEof),
            _ => Err(ArithError::Syntax {
                message: format!("expected '{}'", op_text(expected)),
                span: token.span,
            }),
        }
    }

    fn parse_prefix(&mut self) -> Result<ArithmeticExpression, ArithError> {
        let token = self.tokens.next()?;
        let expr = match token.value {
            TokenValue::Number(value) => ArithmeticExpression::NumberLiteral {
                id: None,
                value,
                span: token.span,
            },
            TokenValue::Identifier(name) => {
                let reference = ArithmeticExpression::VariableReference {
                    id: None,
                    name,
                    span: token.span,
                };
                return self.parse_postfix(reference);
            }
            TokenValue::Parameter(body) => {
                let mut collector = DiagnosticCollector::new();
                let expansion = param::parse_braced(&body, token.span, &mut collector);
                if collector.has_errors() {
                    return Err(ArithError::Syntax {
                        message: collector.errors()[0].message.clone(),
                        span: token.span,
                    });
                }
                ArithmeticExpression::ParameterExpansion(expansion)
            }
            TokenValue::Op(Op::OpenParen) => {
                let inner = self.parse_expression(0)?;
                let close = self.expect_op(Op::CloseParen)?;
                let span = token.span.union(&close.span);
                ArithmeticExpression::GroupedArithmeticExpression {
                    id: None,
                    inner: Box::new(inner),
                    span,
                }
            }
            TokenValue::Op(op @ (Op::Plus | Op::Minus | Op::Bang | Op::Tilde)) => {
                let operator = match op {
                    Op::Plus => UnaryArithmeticOp::Plus,
                    Op::Minus => UnaryArithmeticOp::Minus,
                    Op::Bang => UnaryArithmeticOp::Not,
                    Op::Tilde => UnaryArithmeticOp::BitNot,
                    _ => unreachable!(),
                };
                let operand = self.parse_expression(PREFIX_PRECEDENCE)?;
                let span = token.span.union(&operand.span());
                ArithmeticExpression::UnaryArithmeticExpression {
                    id: None,
                    operator,
                    operand: Box::new(operand),
                    prefix: true,
                    span,
                }
            }
            TokenValue::Op(op @ (Op::PlusPlus | Op::MinusMinus)) => {
                let operator = if op == Op::PlusPlus {
                    UnaryArithmeticOp::Increment
                } else {
                    UnaryArithmeticOp::Decrement
                };
                let operand = self.parse_expression(PREFIX_PRECEDENCE)?;
                let span = token.span.union(&operand.span());
                ArithmeticExpression::UnaryArithmeticExpression {
                    id: None,
                    operator,
                    operand: Box::new(operand),
                    prefix: true,
                    span,
                }
            }
            TokenValue::EndOfInput => return Err(ArithError::UnexpectedEof),
            TokenValue::Op(other) => {
                return Err(ArithError::Syntax {
                    message: format!("unexpected '{}'", op_text(other)),
                    span: token.span,
                })
            }
        };
        Ok(expr)
    }

    /// After parsing an identifier as a prefix atom, check for a trailing
    /// `++`/`--` turning it into a postfix unary expression.
    fn parse_postfix(&mut self, operand: ArithmeticExpression) -> Result<ArithmeticExpression, ArithError> {
        let is_postfix = matches!(
            self.tokens.peek()?.value,
            TokenValue::Op(Op::PlusPlus) | TokenValue::Op(Op::MinusMinus)
        );
        if !is_postfix {
            return Ok(operand);
        }
        let token = self.tokens.next()?;
        let operator = match token.value {
            TokenValue::Op(Op::PlusPlus) => UnaryArithmeticOp::Increment,
            TokenValue::Op(Op::MinusMinus) => UnaryArithmeticOp::Decrement,
            _ => unreachable!(),
        };
        let span = operand.span().union(&token.span);
        Ok(ArithmeticExpression::UnaryArithmeticExpression {
            id: None,
            operator,
            operand: Box::new(operand),
            prefix: false,
            span,
        })
    }
}

fn op_text(op: Op) -> &'static str {
    use Op::*;
    match op {
        Plus => "+",
        PlusPlus => "++",
        PlusEqual => "+=",
        Minus => "-",
        MinusMinus => "--",
        MinusEqual => "-=",
        Star => "*",
        StarEqual => "*=",
        Slash => "/",
        SlashEqual => "/=",
        Percent => "%",
        PercentEqual => "%=",
        StarStar => "**",
        Less => "<",
        LessEqual => "<=",
        LessLess => "<<",
        LessLessEqual => "<<=",
        Greater => ">",
        GreaterEqual => ">=",
        GreaterGreater => ">>",
        GreaterGreaterEqual => ">>=",
        EqualEqual => "==",
        BangEqual => "!=",
        Bang => "!",
        Tilde => "~",
        Amp => "&",
        AmpAmp => "&&",
        AmpEqual => "&=",
        Pipe => "|",
        PipePipe => "||",
        PipeEqual => "|=",
        Caret => "^",
        CaretEqual => "^=",
        Equal => "=",
        Question => "?",
        Colon => ":",
        Comma => ",",
        OpenParen => "(",
        CloseParen => ")",
    }
}

/// Parses the text inside `$(( ... ))`/`(( ... ))` into an
/// [`ArithmeticExpression`], consuming the entire input (trailing garbage
/// after a complete expression is an error).
pub fn parse(source: &str) -> Result<ArithmeticExpression, ArithError> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expression(0)?;
    let trailing = parser.tokens.next()?;
    if !matches!(trailing.value, TokenValue::EndOfInput) {
        return Err(ArithError::Syntax {
            message: "unexpected trailing token in arithmetic expression".to_string(),
            span: trailing.span,
        });
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::ast::ArithmeticOp;

    #[test]
    fn parses_number() {
        let expr = parse("42").unwrap();
        assert_eq!(
            expr,
            ArithmeticExpression::NumberLiteral {
                id: None,
                value: 42,
                span: expr.span(),
            }
        );
    }

    #[test]
    fn power_is_right_associative() {
        let expr = parse("2 ** 3 ** 2").unwrap();
        match expr {
            ArithmeticExpression::BinaryArithmeticExpression { operator, left, right, .. } => {
                assert_eq!(operator, ArithmeticOp::Pow);
                assert!(matches!(*left, ArithmeticExpression::NumberLiteral { value: 2, .. }));
                assert!(matches!(
                    *right,
                    ArithmeticExpression::BinaryArithmeticExpression { operator: ArithmeticOp::Pow, .. }
                ));
            }
            other => panic!("expected power expression, got {other:?}"),
        }
    }

    #[test]
    fn additive_is_left_associative() {
        let expr = parse("1 + 2 + 3").unwrap();
        match expr {
            ArithmeticExpression::BinaryArithmeticExpression { operator, left, .. } => {
                assert_eq!(operator, ArithmeticOp::Add);
                assert!(matches!(
                    *left,
                    ArithmeticExpression::BinaryArithmeticExpression { operator: ArithmeticOp::Add, .. }
                ));
            }
            other => panic!("expected add expression, got {other:?}"),
        }
    }

    #[test]
    fn ternary_nests_correctly() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        assert!(matches!(expr, ArithmeticExpression::ConditionalArithmeticExpression { .. }));
    }

    #[test]
    fn assignment_requires_variable_target() {
        let err = parse("1 = 2").unwrap_err();
        assert!(matches!(err, ArithError::InvalidAssignmentTarget { .. }));
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse("a = b = 1").unwrap();
        match expr {
            ArithmeticExpression::AssignmentExpression { value, .. } => {
                assert!(matches!(*value, ArithmeticExpression::AssignmentExpression { .. }));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn postfix_increment_on_identifier() {
        let expr = parse("x++").unwrap();
        match expr {
            ArithmeticExpression::UnaryArithmeticExpression { prefix, operator, .. } => {
                assert!(!prefix);
                assert_eq!(operator, UnaryArithmeticOp::Increment);
            }
            other => panic!("expected postfix increment, got {other:?}"),
        }
    }

    #[test]
    fn prefix_increment_on_identifier() {
        let expr = parse("++x").unwrap();
        match expr {
            ArithmeticExpression::UnaryArithmeticExpression { prefix, .. } => assert!(prefix),
            other => panic!("expected prefix increment, got {other:?}"),
        }
    }

    #[test]
    fn grouped_expression_resets_precedence() {
        let expr = parse("(1 + 2) * 3").unwrap();
        match expr {
            ArithmeticExpression::BinaryArithmeticExpression { operator, left, .. } => {
                assert_eq!(operator, ArithmeticOp::Mul);
                assert!(matches!(*left, ArithmeticExpression::GroupedArithmeticExpression { .. }));
            }
            other => panic!("expected multiply, got {other:?}"),
        }
    }

    #[test]
    fn embedded_parameter_expansion() {
        let expr = parse("${x:-1} + 1").unwrap();
        match expr {
            ArithmeticExpression::BinaryArithmeticExpression { left, .. } => {
                assert!(matches!(*left, ArithmeticExpression::ParameterExpansion(_)));
            }
            other => panic!("expected binary expr, got {other:?}"),
        }
    }

    #[test]
    fn unknown_character_fails() {
        let err = parse("1 @ 2").unwrap_err();
        assert!(matches!(err, ArithError::Syntax { .. }));
    }

    #[test]
    fn comma_operator_is_binary() {
        let expr = parse("1, 2").unwrap();
        match expr {
            ArithmeticExpression::BinaryArithmeticExpression { operator, .. } => {
                assert_eq!(operator, ArithmeticOp::Comma);
            }
            other => panic!("expected comma expression, got {other:?}"),
        }
    }
}
