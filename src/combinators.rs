// This file is part of safeshell-syntax, the parser front-end of the
// SafeShell shell-to-TypeScript transpilation toolchain.
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

//! A small, self-contained parser-combinator kit, independent of the
//! hand-written recursive-descent [`crate::parser`].
//!
//! Not wired into the grammar parser: the main parser is hand-written
//! recursive descent, and this module exists as the alternative composition
//! style, exercised by its own tests and the toy and-or-list mirror below.
//!
//! A parser here is any `Fn(&str) -> ParseResult<'_, T>`: it takes the
//! remaining input and returns the parsed value plus whatever input is left,
//! or `None` on failure. There is no mutable state threaded through; failure
//! is "no match", not an error value, matching the combinator style's usual
//! trade-off of discarding error detail for composability.

/// `Some((value, rest))` on success, `None` on failure. `rest` is always a
/// suffix of the input that was passed in.
pub type ParseResult<'a, T> = Option<(T, &'a str)>;

/// A parser is any function from remaining input to a [`ParseResult`].
pub trait Parse<'a, T> {
    fn parse(&self, input: &'a str) -> ParseResult<'a, T>;
}

impl<'a, T, F> Parse<'a, T> for F
where
    F: Fn(&'a str) -> ParseResult<'a, T>,
{
    fn parse(&self, input: &'a str) -> ParseResult<'a, T> {
        self(input)
    }
}

/// Matches a literal string prefix.
pub fn literal(tag: &'static str) -> impl Fn(&str) -> ParseResult<'_, &str> {
    move |input| input.strip_prefix(tag).map(|rest| (tag, rest))
}

/// Skips leading ASCII whitespace (not full shell blank/line-continuation
/// rules; this kit works over plain text, not shell source).
pub fn whitespace(input: &str) -> ParseResult<'_, ()> {
    let rest = input.trim_start_matches(|c: char| c == ' ' || c == '\t');
    Some(((), rest))
}

/// One ASCII-alphanumeric-or-underscore run, the toy grammar's "word".
pub fn bare_word(input: &str) -> ParseResult<'_, &str> {
    let end = input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' || c == '/'))
        .unwrap_or(input.len());
    if end == 0 {
        None
    } else {
        Some((&input[..end], &input[end..]))
    }
}

/// Runs `first`, then `second` on what's left, returning both values.
pub fn sequence<'a, T, U>(
    first: impl Parse<'a, T>,
    second: impl Parse<'a, U>,
) -> impl Fn(&'a str) -> ParseResult<'a, (T, U)> {
    move |input| {
        let (a, rest) = first.parse(input)?;
        let (b, rest) = second.parse(rest)?;
        Some(((a, b), rest))
    }
}

/// Tries `first`; on failure, tries `second` against the original input.
pub fn alt<'a, T>(first: impl Parse<'a, T>, second: impl Parse<'a, T>) -> impl Fn(&'a str) -> ParseResult<'a, T> {
    move |input| first.parse(input).or_else(|| second.parse(input))
}

/// Zero or more repetitions of `item`. Guards against infinite loops: a
/// repetition that consumes no input stops the loop instead of looping
/// forever, matching the non-consuming-repetition rule for any combinator
/// kit's `many`.
pub fn many<'a, T>(item: impl Parse<'a, T>) -> impl Fn(&'a str) -> ParseResult<'a, Vec<T>> {
    move |input| {
        let mut out = Vec::new();
        let mut rest = input;
        while let Some((value, next)) = item.parse(rest) {
            if next.len() == rest.len() {
                break;
            }
            out.push(value);
            rest = next;
        }
        Some((out, rest))
    }
}

/// Left-associative fold: `item (op item)*`, reducing with `combine` as each
/// `(operator, right)` pair is parsed, matching how a Pratt/left-recursive
/// binary-operator chain (`&&`, `||`, `|`) would be expressed combinator-style.
pub fn chainl1<'a, T: Clone, O>(
    item: impl Parse<'a, T>,
    op: impl Parse<'a, O>,
    combine: impl Fn(T, O, T) -> T,
) -> impl Fn(&'a str) -> ParseResult<'a, T> {
    move |input| {
        let (mut left, mut rest) = item.parse(input)?;
        loop {
            match op.parse(rest) {
                Some((operator, after_op)) => match item.parse(after_op) {
                    Some((right, after_right)) => {
                        left = combine(left, operator, right);
                        rest = after_right;
                    }
                    None => break,
                },
                None => break,
            }
        }
        Some((left, rest))
    }
}

/// `open item close`, discarding the delimiters.
pub fn between<'a, O, T, C>(
    open: impl Parse<'a, O>,
    item: impl Parse<'a, T>,
    close: impl Parse<'a, C>,
) -> impl Fn(&'a str) -> ParseResult<'a, T> {
    move |input| {
        let (_, rest) = open.parse(input)?;
        let (value, rest) = item.parse(rest)?;
        let (_, rest) = close.parse(rest)?;
        Some((value, rest))
    }
}

/// Runs `item` without consuming any input, succeeding or failing exactly as
/// `item` would.
pub fn lookahead<'a, T>(item: impl Parse<'a, T>) -> impl Fn(&'a str) -> ParseResult<'a, T> {
    move |input| item.parse(input).map(|(value, _)| (value, input))
}

/// Runs `item`; on failure, returns input untouched with `None` rather than
/// propagating a partial consumption. Useful for optional lookahead-gated
/// branches in a larger `alt`/`sequence` chain.
pub fn try_parse<'a, T>(item: impl Parse<'a, T>) -> impl Fn(&'a str) -> ParseResult<'a, Option<T>> {
    move |input| match item.parse(input) {
        Some((value, rest)) => Some((Some(value), rest)),
        None => Some((None, input)),
    }
}

/// A toy mirror of the and-or-list grammar (`word (&&|| word)*`), built
/// entirely out of the combinators above. Exercises the kit against the same
/// shape of grammar the hand-written parser implements, without sharing any
/// code with it.
#[derive(Clone, Debug, PartialEq)]
pub enum ToyAndOr<'a> {
    Word(&'a str),
    And(Box<ToyAndOr<'a>>, Box<ToyAndOr<'a>>),
    Or(Box<ToyAndOr<'a>>, Box<ToyAndOr<'a>>),
}

fn toy_word(input: &str) -> ParseResult<'_, ToyAndOr<'_>> {
    let (_, input) = whitespace(input)?;
    let (word, rest) = bare_word(input)?;
    Some((ToyAndOr::Word(word), rest))
}

fn toy_operator(input: &str) -> ParseResult<'_, &'static str> {
    let (_, input) = whitespace(input)?;
    alt(literal("&&"), literal("||")).parse(input)
}

/// Parses a toy and-or list: `word (&&|| word)*`, left-associative.
pub fn parse_toy_and_or(input: &str) -> ParseResult<'_, ToyAndOr<'_>> {
    chainl1(toy_word, toy_operator, |left, operator, right| match operator {
        "&&" => ToyAndOr::And(Box::new(left), Box::new(right)),
        "||" => ToyAndOr::Or(Box::new(left), Box::new(right)),
        _ => unreachable!("toy_operator only ever returns \"&&\" or \"||\""),
    })
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_word_stops_at_whitespace() {
        assert_eq!(bare_word("ls -la rest"), Some(("ls", " -la rest")));
    }

    #[test]
    fn alt_falls_through_to_second() {
        let parser = alt(literal("foo"), literal("bar"));
        assert_eq!(parser.parse("bar baz"), Some(("bar", " baz")));
    }

    #[test]
    fn many_stops_on_non_consuming_match() {
        let parser = many(whitespace);
        let (values, rest) = parser.parse("abc").unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(rest, "abc");
    }

    #[test]
    fn between_discards_delimiters() {
        let parser = between(literal("("), bare_word, literal(")"));
        assert_eq!(parser.parse("(ok)"), Some(("ok", "")));
    }

    #[test]
    fn toy_and_or_single_word() {
        let (tree, rest) = parse_toy_and_or("build").unwrap();
        assert_eq!(tree, ToyAndOr::Word("build"));
        assert_eq!(rest, "");
    }

    #[test]
    fn toy_and_or_is_left_associative() {
        let (tree, rest) = parse_toy_and_or("a && b || c").unwrap();
        assert_eq!(rest, "");
        match tree {
            ToyAndOr::Or(left, right) => {
                assert_eq!(*right, ToyAndOr::Word("c"));
                assert_eq!(*left, ToyAndOr::And(Box::new(ToyAndOr::Word("a")), Box::new(ToyAndOr::Word("b"))));
            }
            other => panic!("expected Or at the top, got {other:?}"),
        }
    }

    #[test]
    fn try_parse_recovers_on_failure() {
        let parser = try_parse(literal("nope"));
        assert_eq!(parser.parse("yes"), Some((None, "yes")));
    }

    #[test]
    fn lookahead_does_not_consume() {
        let parser = lookahead(literal("&&"));
        assert_eq!(parser.parse("&& rest"), Some(("&&", "&& rest")));
    }
}
