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

//! Diagnostics subsystem (layer L5).
//!
//! A [`ParseNote`] is a single diagnostic: a severity, a stable code, a
//! message, a span, and optional context/fix-hint text. A
//! [`DiagnosticCollector`] gathers notes per severity channel in source
//! order. The "accept-but-warn" helpers implement the pattern used
//! throughout the grammar parser (layer L4) and the dialect capability model
//! (layer L6): a production that can succeed with a caveat returns its AST
//! node plus `warned: true`, with the collector as the side channel, instead
//! of raising an exception for something that is not actually fatal.

use std::fmt;

use crate::source::Span;

/// Severity of a [`ParseNote`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Hint => "HINT",
        };
        f.write_str(s)
    }
}

/// A stable diagnostic code, partitioned by range:
/// 1xxx syntax, 2xxx semantic warnings, 3xxx compatibility, 4xxx style.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Code(pub u32);

impl Code {
    // 1xxx: syntax errors
    pub const UNEXPECTED_TOKEN: Code = Code(1001);
    pub const UNEXPECTED_EOF: Code = Code(1002);
    pub const MISSING_KEYWORD: Code = Code(1003);
    pub const UNCLOSED_QUOTE: Code = Code(1004);
    pub const UNCLOSED_BRACE: Code = Code(1005);
    pub const INVALID_REDIRECT: Code = Code(1006);

    // 2xxx: semantic warnings
    pub const UNQUOTED_VARIABLE: Code = Code(2001);
    pub const MISSING_SHEBANG: Code = Code(2002);
    pub const UNUSED_VARIABLE: Code = Code(2003);

    // 3xxx: compatibility
    pub const BASH_ONLY_FEATURE: Code = Code(3001);
    pub const NON_POSIX_FEATURE: Code = Code(3002);

    // 4xxx: style
    pub const PREFER_DOUBLE_BRACKET: Code = Code(4001);
    pub const PREFER_PRINTF: Code = Code(4002);
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SSH_{:04}", self.0)
    }
}

/// A single diagnostic note.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseNote {
    pub severity: Severity,
    pub code: Code,
    pub message: String,
    pub span: Span,
    /// Human-readable production context, e.g. "in 'if' statement".
    pub context: Option<String>,
    /// A concrete suggestion for fixing the diagnosed issue.
    pub fix_hint: Option<String>,
}

/// Extra, optional fields a note can carry, passed to the `accept_*`
/// helpers so call sites don't have to name every field at every call.
#[derive(Clone, Debug, Default)]
pub struct NoteOptions {
    pub context: Option<String>,
    pub fix_hint: Option<String>,
}

impl NoteOptions {
    pub fn new() -> Self {
        NoteOptions::default()
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_fix_hint(mut self, fix_hint: impl Into<String>) -> Self {
        self.fix_hint = Some(fix_hint.into());
        self
    }
}

/// The result of an "accept but warn" helper: the accepted value, tagged
/// with whether a diagnostic was actually emitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Warned<T> {
    pub value: T,
    pub warned: bool,
}

/// Formats a note as `SEVERITY [CODE] L:C: message`, with optional
/// `\n  Context: ...` and `\n  Hint: ...` suffixes.
pub fn format_diagnostic(note: &ParseNote) -> String {
    let mut out = format!(
        "{} [{}] {}: {}",
        note.severity, note.code, note.span.start, note.message
    );
    if let Some(context) = &note.context {
        out.push_str(&format!("\n  Context: {context}"));
    }
    if let Some(fix_hint) = &note.fix_hint {
        out.push_str(&format!("\n  Hint: {fix_hint}"));
    }
    out
}

/// Severity-channeled collector of [`ParseNote`]s.
///
/// Each channel preserves insertion order (which, since the parser walks
/// source left-to-right and recovery always resynchronizes forward, is also
/// source order). [`DiagnosticCollector::all`] returns the channels
/// concatenated in a fixed severity order: errors, warnings, infos, hints.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    errors: Vec<ParseNote>,
    warnings: Vec<ParseNote>,
    infos: Vec<ParseNote>,
    hints: Vec<ParseNote>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        DiagnosticCollector::default()
    }

    pub fn push(&mut self, note: ParseNote) {
        log::trace!("diagnostic: {}", format_diagnostic(&note));
        match note.severity {
            Severity::Error => self.errors.push(note),
            Severity::Warning => self.warnings.push(note),
            Severity::Info => self.infos.push(note),
            Severity::Hint => self.hints.push(note),
        }
    }

    pub fn errors(&self) -> &[ParseNote] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ParseNote] {
        &self.warnings
    }

    pub fn infos(&self) -> &[ParseNote] {
        &self.infos
    }

    pub fn hints(&self) -> &[ParseNote] {
        &self.hints
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.infos.len() + self.hints.len()
    }

    /// All notes, in severity-channel order (errors, then warnings, then
    /// infos, then hints), preserving insertion order within each channel.
    pub fn all(&self) -> Vec<ParseNote> {
        let mut out =
            Vec::with_capacity(self.errors.len() + self.warnings.len() + self.infos.len() + self.hints.len());
        out.extend(self.errors.iter().cloned());
        out.extend(self.warnings.iter().cloned());
        out.extend(self.infos.iter().cloned());
        out.extend(self.hints.iter().cloned());
        out
    }

    pub fn clear(&mut self) {
        self.errors.clear();
        self.warnings.clear();
        self.infos.clear();
        self.hints.clear();
    }

    fn note(
        &mut self,
        severity: Severity,
        value_span: Span,
        code: Code,
        message: impl Into<String>,
        opts: NoteOptions,
    ) {
        self.push(ParseNote {
            severity,
            code,
            message: message.into(),
            span: value_span,
            context: opts.context,
            fix_hint: opts.fix_hint,
        });
    }

    /// Accepts `value` unconditionally, emitting a warning-severity note and
    /// returning `{value, warned: true}`.
    pub fn accept_but_warn<T>(
        &mut self,
        value: T,
        code: Code,
        message: impl Into<String>,
        span: Span,
        opts: NoteOptions,
    ) -> Warned<T> {
        self.note(Severity::Warning, span, code, message, opts);
        Warned { value, warned: true }
    }

    /// As [`accept_but_warn`](Self::accept_but_warn), but at info severity.
    pub fn accept_but_info<T>(
        &mut self,
        value: T,
        code: Code,
        message: impl Into<String>,
        span: Span,
        opts: NoteOptions,
    ) -> Warned<T> {
        self.note(Severity::Info, span, code, message, opts);
        Warned { value, warned: true }
    }

    /// As [`accept_but_warn`](Self::accept_but_warn), but at hint severity.
    pub fn accept_but_hint<T>(
        &mut self,
        value: T,
        code: Code,
        message: impl Into<String>,
        span: Span,
        opts: NoteOptions,
    ) -> Warned<T> {
        self.note(Severity::Hint, span, code, message, opts);
        Warned { value, warned: true }
    }

    /// Emits a warning-severity note only if `condition` holds; either way
    /// `value` is accepted.
    pub fn accept_if<T>(
        &mut self,
        value: T,
        condition: bool,
        code: Code,
        message: impl Into<String>,
        span: Span,
        opts: NoteOptions,
    ) -> Warned<T> {
        if condition {
            self.note(Severity::Warning, span, code, message, opts);
            Warned { value, warned: true }
        } else {
            Warned { value, warned: false }
        }
    }

    /// Specializes [`accept_if`](Self::accept_if) to the SSH_3001
    /// compatibility warning, with a "use a POSIX-compatible alternative"
    /// fix hint, emitted only when `supported` is `false`.
    pub fn accept_with_compatibility_check<T>(
        &mut self,
        value: T,
        supported: bool,
        feature: &str,
        span: Span,
    ) -> Warned<T> {
        self.accept_if(
            value,
            !supported,
            Code::BASH_ONLY_FEATURE,
            format!("'{feature}' is not supported by the target shell dialect"),
            span,
            NoteOptions::new().with_fix_hint("use a POSIX-compatible alternative"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Position;

    fn span() -> Span {
        Span::point(Position { line: 1, column: 1, offset: 0 })
    }

    #[test]
    fn all_preserves_severity_order() {
        let mut collector = DiagnosticCollector::new();
        collector.push(ParseNote {
            severity: Severity::Hint,
            code: Code::PREFER_PRINTF,
            message: "use printf".into(),
            span: span(),
            context: None,
            fix_hint: None,
        });
        collector.push(ParseNote {
            severity: Severity::Error,
            code: Code::UNEXPECTED_EOF,
            message: "eof".into(),
            span: span(),
            context: None,
            fix_hint: None,
        });
        let all = collector.all();
        assert_eq!(all[0].severity, Severity::Error);
        assert_eq!(all[1].severity, Severity::Hint);
    }

    #[test]
    fn has_errors_and_warnings() {
        let mut collector = DiagnosticCollector::new();
        assert!(!collector.has_errors());
        collector.accept_but_warn(
            (),
            Code::BASH_ONLY_FEATURE,
            "bash only",
            span(),
            NoteOptions::new(),
        );
        assert!(!collector.has_errors());
        assert!(collector.has_warnings());
        assert_eq!(collector.count(), 1);
    }

    #[test]
    fn accept_if_respects_condition() {
        let mut collector = DiagnosticCollector::new();
        let warned = collector.accept_if(
            42,
            false,
            Code::UNUSED_VARIABLE,
            "unused",
            span(),
            NoteOptions::new(),
        );
        assert_eq!(warned, Warned { value: 42, warned: false });
        assert_eq!(collector.count(), 0);
    }

    #[test]
    fn compatibility_check_emits_only_when_unsupported() {
        let mut collector = DiagnosticCollector::new();
        let warned = collector.accept_with_compatibility_check(1, true, "arrays", span());
        assert!(!warned.warned);
        let warned = collector.accept_with_compatibility_check(1, false, "arrays", span());
        assert!(warned.warned);
        assert_eq!(collector.warnings()[0].code, Code::BASH_ONLY_FEATURE);
    }

    #[test]
    fn format_diagnostic_includes_context_and_hint() {
        let note = ParseNote {
            severity: Severity::Error,
            code: Code::MISSING_KEYWORD,
            message: "expected 'fi'".into(),
            span: span(),
            context: Some("in 'if' statement".into()),
            fix_hint: Some("add 'fi'".into()),
        };
        let formatted = format_diagnostic(&note);
        assert!(formatted.starts_with("ERROR [SSH_1003] 1:1: expected 'fi'"));
        assert!(formatted.contains("Context: in 'if' statement"));
        assert!(formatted.contains("Hint: add 'fi'"));
    }
}
