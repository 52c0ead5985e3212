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

//! Parameter expansion sub-parser (spec layer L4, §4.5).
//!
//! Both the shell word scanner (inside the lexer) and the arithmetic
//! expression parser hit `${...}`/`$name` text and need to turn it into a
//! [`ParameterExpansion`]; this module is the single place that does it, so
//! the two callers can't drift apart on modifier syntax.
//!
//! This sub-parser works on the raw text already captured by the caller (the
//! characters between `${` and the matching `}`, or the bare name after an
//! unbraced `$`) rather than re-scanning the source buffer itself. Brace
//! matching and quote-awareness needed to find that matching `}` is the
//! caller's job (word scanning already has to track nested `${`/`[`/quotes
//! to know where a word ends).

use crate::diagnostics::{Code, DiagnosticCollector, ParseNote, Severity};
use crate::source::Span;
use crate::syntax::{Modifier, ParamType, ParameterExpansion, Word};

/// Special single-character parameters that never follow identifier syntax:
/// `$?`, `$$`, `$!`, `$#`, `$-`, `$0`-`$9`, `$@`, `$*`.
pub fn is_special_parameter_char(c: char) -> bool {
    matches!(c, '?' | '$' | '!' | '#' | '-' | '@' | '*') || c.is_ascii_digit()
}

fn classify(name: &str) -> ParamType {
    if name.len() == 1 {
        if let Some(c) = name.chars().next() {
            if c.is_ascii_digit() {
                return ParamType::Positional(c.to_digit(10).unwrap() as usize);
            }
            if is_special_parameter_char(c) {
                return ParamType::Special;
            }
        }
    }
    if name.chars().all(|c| c.is_ascii_digit()) && !name.is_empty() {
        return ParamType::Positional(name.parse().unwrap_or(0));
    }
    ParamType::Variable
}

/// Parses the bare `$name` form (no braces, no modifiers possible).
pub fn parse_unbraced(name: &str, span: Span) -> ParameterExpansion {
    let param_type = if name == "#" || name == "@" || name == "*" {
        ParamType::PositionalCount
    } else {
        classify(name)
    };
    ParameterExpansion {
        id: None,
        parameter: name.to_string(),
        param_type,
        indirect: false,
        length: false,
        subscript: None,
        modifier: None,
        modifier_argument: None,
        braced: false,
        span,
    }
}

/// The two-character modifier table, checked before their one-character
/// prefixes so `##` is not mistaken for `#` followed by a stray `#`.
const TWO_CHAR_MODIFIERS: &[(&str, fn(bool) -> Modifier)] = &[
    (":-", |_| Modifier::SwitchDefault { colon: true }),
    (":=", |_| Modifier::SwitchAssign { colon: true }),
    (":?", |_| Modifier::SwitchError { colon: true }),
    (":+", |_| Modifier::SwitchAlter { colon: true }),
];

fn parse_modifier(rest: &str) -> Option<(Modifier, &str)> {
    for (prefix, build) in TWO_CHAR_MODIFIERS {
        if let Some(arg) = rest.strip_prefix(prefix) {
            return Some((build(true), arg));
        }
    }
    if let Some(arg) = rest.strip_prefix("##") {
        return Some((Modifier::TrimPrefixLongest, arg));
    }
    if let Some(arg) = rest.strip_prefix("%%") {
        return Some((Modifier::TrimSuffixLongest, arg));
    }
    if let Some(arg) = rest.strip_prefix("^^") {
        return Some((Modifier::CaseAllUpper, arg));
    }
    if let Some(arg) = rest.strip_prefix(",,") {
        return Some((Modifier::CaseAllLower, arg));
    }
    if let Some(arg) = rest.strip_prefix("//") {
        return Some((Modifier::ReplaceAll, arg));
    }
    if let Some(arg) = rest.strip_prefix("/#") {
        return Some((Modifier::ReplacePrefix, arg));
    }
    if let Some(arg) = rest.strip_prefix("/%") {
        return Some((Modifier::ReplaceSuffix, arg));
    }
    if let Some(arg) = rest.strip_prefix('-') {
        return Some((Modifier::SwitchDefault { colon: false }, arg));
    }
    if let Some(arg) = rest.strip_prefix('=') {
        return Some((Modifier::SwitchAssign { colon: false }, arg));
    }
    if let Some(arg) = rest.strip_prefix('?') {
        return Some((Modifier::SwitchError { colon: false }, arg));
    }
    if let Some(arg) = rest.strip_prefix('+') {
        return Some((Modifier::SwitchAlter { colon: false }, arg));
    }
    if let Some(arg) = rest.strip_prefix('#') {
        return Some((Modifier::TrimPrefixShortest, arg));
    }
    if let Some(arg) = rest.strip_prefix('%') {
        return Some((Modifier::TrimSuffixShortest, arg));
    }
    if let Some(arg) = rest.strip_prefix('^') {
        return Some((Modifier::CaseFirstUpper, arg));
    }
    if let Some(arg) = rest.strip_prefix(',') {
        return Some((Modifier::CaseFirstLower, arg));
    }
    if let Some(arg) = rest.strip_prefix('/') {
        return Some((Modifier::ReplaceFirst, arg));
    }
    if let Some(arg) = rest.strip_prefix('@') {
        let mut chars = arg.chars();
        let op = chars.next().unwrap_or('Q');
        return Some((Modifier::At(op), chars.as_str()));
    }
    None
}

/// Parses the inside of `${...}` (the text between the braces, not
/// including them) into a [`ParameterExpansion`] covering `span` (which
/// should include the enclosing `${`/`}`).
///
/// Diagnoses unterminated modifiers and other malformed shapes via
/// `collector` (SSH_1005) rather than failing outright, since a braced
/// expansion with a bad modifier is still recognizable as *an* expansion.
pub fn parse_braced(inner: &str, span: Span, collector: &mut DiagnosticCollector) -> ParameterExpansion {
    let mut rest = inner;

    let indirect = rest.starts_with('!') && rest.len() > 1 && !is_special_parameter_char(rest.as_bytes()[1] as char);
    if indirect {
        rest = &rest[1..];
    }

    // `#@` and `#*` are themselves positional-count queries (the parameter
    // is the literal two-character name `#@`/`#*`), not a `#`-length-prefix
    // over `@`/`*`, so they must be excluded before the generic length-prefix
    // check below would otherwise strip the `#` and leave a dangling `@`/`*`.
    let length = !indirect && rest.starts_with('#') && rest.len() > 1 && rest != "#" && rest != "#@" && rest != "#*";
    if length {
        rest = &rest[1..];
    }

    let name_len = rest
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_') && !is_special_parameter_char(c))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let name_len = if name_len == 0 && !rest.is_empty() {
        // A lone special character (`$`, `?`, etc.) is itself the name.
        rest.chars().next().map(char::len_utf8).unwrap_or(0)
    } else {
        name_len
    };
    let name = &rest[..name_len];
    rest = &rest[name_len..];

    let mut subscript = None;
    if let Some(after_bracket) = rest.strip_prefix('[') {
        if let Some(end) = after_bracket.find(']') {
            subscript = Some(after_bracket[..end].to_string());
            rest = &after_bracket[end + 1..];
        } else {
            collector.push(ParseNote {
                severity: Severity::Error,
                code: Code::UNCLOSED_BRACE,
                message: format!("unterminated subscript in parameter expansion '{inner}'"),
                span,
                context: None,
                fix_hint: Some("add a closing ']'".to_string()),
            });
        }
    }

    let (modifier, modifier_argument) = match parse_modifier(rest) {
        Some((modifier, arg_text)) => {
            let argument = if arg_text.is_empty() {
                None
            } else {
                Some(Word::literal(arg_text.to_string(), span))
            };
            (Some(modifier), argument)
        }
        None => {
            if !rest.is_empty() {
                collector.push(ParseNote {
                    severity: Severity::Warning,
                    code: Code::UNEXPECTED_TOKEN,
                    message: format!("unrecognized parameter expansion modifier '{rest}' in '{inner}'"),
                    span,
                    context: None,
                    fix_hint: None,
                });
            }
            (None, None)
        }
    };

    let param_type = if matches!(name, "#" | "@" | "*" | "#@" | "#*") {
        ParamType::PositionalCount
    } else {
        classify(name)
    };

    ParameterExpansion {
        id: None,
        parameter: name.to_string(),
        param_type,
        indirect,
        length,
        subscript,
        modifier,
        modifier_argument,
        braced: true,
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Position;

    fn span() -> Span {
        Span::point(Position::start())
    }

    #[test]
    fn unbraced_digit_is_positional() {
        let pe = parse_unbraced("1", span());
        assert_eq!(pe.param_type, ParamType::Positional(1));
    }

    #[test]
    fn braced_default_modifier() {
        let mut collector = DiagnosticCollector::new();
        let pe = parse_braced("foo:-bar", span(), &mut collector);
        assert_eq!(pe.parameter, "foo");
        assert_eq!(pe.modifier, Some(Modifier::SwitchDefault { colon: true }));
        assert_eq!(pe.modifier_argument.as_ref().unwrap().value, "bar");
        assert!(!collector.has_errors());
    }

    #[test]
    fn braced_length_prefix() {
        let mut collector = DiagnosticCollector::new();
        let pe = parse_braced("#name", span(), &mut collector);
        assert!(pe.length);
        assert_eq!(pe.parameter, "name");
    }

    #[test]
    fn braced_positional_count_at_is_not_a_length_prefix() {
        let mut collector = DiagnosticCollector::new();
        let pe = parse_braced("#@", span(), &mut collector);
        assert!(!pe.length);
        assert_eq!(pe.parameter, "#@");
        assert_eq!(pe.param_type, ParamType::PositionalCount);
    }

    #[test]
    fn braced_positional_count_star_is_not_a_length_prefix() {
        let mut collector = DiagnosticCollector::new();
        let pe = parse_braced("#*", span(), &mut collector);
        assert!(!pe.length);
        assert_eq!(pe.parameter, "#*");
        assert_eq!(pe.param_type, ParamType::PositionalCount);
    }

    #[test]
    fn braced_indirect_prefix() {
        let mut collector = DiagnosticCollector::new();
        let pe = parse_braced("!name", span(), &mut collector);
        assert!(pe.indirect);
        assert_eq!(pe.parameter, "name");
    }

    #[test]
    fn braced_trim_longest_suffix() {
        let mut collector = DiagnosticCollector::new();
        let pe = parse_braced("path%%.txt", span(), &mut collector);
        assert_eq!(pe.modifier, Some(Modifier::TrimSuffixLongest));
        assert_eq!(pe.modifier_argument.as_ref().unwrap().value, ".txt");
    }

    #[test]
    fn braced_subscript_is_captured() {
        let mut collector = DiagnosticCollector::new();
        let pe = parse_braced("arr[2]", span(), &mut collector);
        assert_eq!(pe.subscript.as_deref(), Some("2"));
    }

    #[test]
    fn unterminated_subscript_is_diagnosed() {
        let mut collector = DiagnosticCollector::new();
        parse_braced("arr[2", span(), &mut collector);
        assert!(collector.has_errors());
    }
}
