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

//! Shell-dialect capability model (layer L6).
//!
//! [`Shell`] enumerates the dialects this parser can target; each has a
//! [`ShellCapabilities`] record of booleans. The grammar parser (layer L4)
//! consults [`checkFeature`](check_feature)-equivalent helpers through the
//! diagnostics path (layer L5) to decide whether a construct is accepted
//! silently or with a compatibility warning.

use crate::diagnostics::{Code, DiagnosticCollector};
use crate::source::Span;

/// A shell dialect this parser can target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Shell {
    Bash,
    Sh,
    Dash,
    Ksh,
    Zsh,
}

impl Default for Shell {
    fn default() -> Self {
        Shell::Bash
    }
}

/// A boolean feature flag gated by [`ShellCapabilities`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Feature {
    Arrays,
    AssociativeArrays,
    ExtendedGlob,
    ProcessSubstitution,
    DoubleBracketTest,
    Coproc,
    Nameref,
    AnsiCQuoting,
    LocaleQuoting,
    FdVariables,
    PipeStderr,
    AppendStderr,
}

impl Feature {
    /// A short human description used in compatibility diagnostics.
    pub fn description(self) -> &'static str {
        match self {
            Feature::Arrays => "indexed arrays",
            Feature::AssociativeArrays => "associative arrays",
            Feature::ExtendedGlob => "extended globbing",
            Feature::ProcessSubstitution => "process substitution",
            Feature::DoubleBracketTest => "the `[[ ]]` test command",
            Feature::Coproc => "the `coproc` keyword",
            Feature::Nameref => "namerefs",
            Feature::AnsiCQuoting => "`$'...'` ANSI-C quoting",
            Feature::LocaleQuoting => "`$\"...\"` locale quoting",
            Feature::FdVariables => "`{fd}>file` file-descriptor variables",
            Feature::PipeStderr => "`|&` pipe-with-stderr",
            Feature::AppendStderr => "`&>>` append-stderr redirection",
        }
    }
}

/// Boolean capability record for one [`Shell`] dialect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShellCapabilities {
    pub arrays: bool,
    pub associative_arrays: bool,
    pub extended_glob: bool,
    pub process_substitution: bool,
    pub double_bracket_test: bool,
    pub coproc: bool,
    pub nameref: bool,
    pub ansi_c_quoting: bool,
    pub locale_quoting: bool,
    pub fd_variables: bool,
    pub pipe_stderr: bool,
    pub append_stderr: bool,
}

impl ShellCapabilities {
    const NONE: ShellCapabilities = ShellCapabilities {
        arrays: false,
        associative_arrays: false,
        extended_glob: false,
        process_substitution: false,
        double_bracket_test: false,
        coproc: false,
        nameref: false,
        ansi_c_quoting: false,
        locale_quoting: false,
        fd_variables: false,
        pipe_stderr: false,
        append_stderr: false,
    };

    const ALL: ShellCapabilities = ShellCapabilities {
        arrays: true,
        associative_arrays: true,
        extended_glob: true,
        process_substitution: true,
        double_bracket_test: true,
        coproc: true,
        nameref: true,
        ansi_c_quoting: true,
        locale_quoting: true,
        fd_variables: true,
        pipe_stderr: true,
        append_stderr: true,
    };

    pub fn get(self, feature: Feature) -> bool {
        match feature {
            Feature::Arrays => self.arrays,
            Feature::AssociativeArrays => self.associative_arrays,
            Feature::ExtendedGlob => self.extended_glob,
            Feature::ProcessSubstitution => self.process_substitution,
            Feature::DoubleBracketTest => self.double_bracket_test,
            Feature::Coproc => self.coproc,
            Feature::Nameref => self.nameref,
            Feature::AnsiCQuoting => self.ansi_c_quoting,
            Feature::LocaleQuoting => self.locale_quoting,
            Feature::FdVariables => self.fd_variables,
            Feature::PipeStderr => self.pipe_stderr,
            Feature::AppendStderr => self.append_stderr,
        }
    }
}

impl Shell {
    /// The capability record for this dialect.
    ///
    /// Known deviations from "has everything": `sh` has none of the
    /// extensions below; `dash` has only ANSI-C quoting; `zsh` has
    /// everything except nameref; `ksh` has everything except
    /// fd-variables, pipe-stderr, and append-stderr.
    pub fn capabilities(self) -> ShellCapabilities {
        match self {
            Shell::Bash => ShellCapabilities::ALL,
            Shell::Sh => ShellCapabilities::NONE,
            Shell::Dash => ShellCapabilities {
                ansi_c_quoting: true,
                ..ShellCapabilities::NONE
            },
            Shell::Zsh => ShellCapabilities {
                nameref: false,
                ..ShellCapabilities::ALL
            },
            Shell::Ksh => ShellCapabilities {
                fd_variables: false,
                pipe_stderr: false,
                append_stderr: false,
                ..ShellCapabilities::ALL
            },
        }
    }

    pub fn has_capability(self, feature: Feature) -> bool {
        self.capabilities().get(feature)
    }

    fn canonical_name(name: &str) -> String {
        name.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect()
    }
}

/// Error returned when a name does not identify any known [`Shell`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unrecognized shell name: {0:?}")]
pub struct UnknownShellError(pub String);

/// Parses a shell name: a basename or absolute path, normalized to
/// lower-case alphanumerics before matching, e.g. `/bin/bash`, `BASH`,
/// `ksh93` (mapped to [`Shell::Ksh`]), `mksh` (also [`Shell::Ksh`]).
pub fn parse_shell(name: &str) -> Result<Shell, UnknownShellError> {
    let basename = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let canonical = Shell::canonical_name(basename);
    match canonical.as_str() {
        "bash" => Ok(Shell::Bash),
        "sh" => Ok(Shell::Sh),
        "dash" => Ok(Shell::Dash),
        "ksh" | "ksh93" | "mksh" => Ok(Shell::Ksh),
        "zsh" => Ok(Shell::Zsh),
        _ => Err(UnknownShellError(name.to_string())),
    }
}

/// Parses the shell named in a shebang line, supporting both the direct
/// form (`#!/bin/bash`) and the `env` form (`#!/usr/bin/env [flags...]
/// bash`).
pub fn detect_shell_from_shebang(line: &str) -> Option<Shell> {
    let rest = line.strip_prefix("#!")?;
    let mut parts = rest.split_whitespace();
    let first = parts.next()?;
    let basename = first.rsplit(['/', '\\']).next().unwrap_or(first);
    if basename == "env" {
        // Skip leading `env` flags like `-S` or `--split-string`.
        for part in parts {
            if !part.starts_with('-') {
                return parse_shell(part).ok();
            }
        }
        None
    } else {
        parse_shell(first).ok()
    }
}

/// Matches a `# (shell|shelltype|safesh-shell): name` directive
/// case-insensitively.
pub fn detect_shell_from_directive(line: &str) -> Option<Shell> {
    let trimmed = line.trim_start();
    let rest = trimmed.strip_prefix('#')?.trim_start();
    let (key, value) = rest.split_once(':')?;
    let key = key.trim().to_ascii_lowercase();
    if key == "shell" || key == "shelltype" || key == "safesh-shell" {
        parse_shell(value.trim()).ok()
    } else {
        None
    }
}

/// Detects the target dialect for `content`: prefers a shebang on the first
/// line, then scans up to `max_lines` lines for a directive.
pub fn detect_shell(content: &str, max_lines: usize) -> Option<Shell> {
    let mut lines = content.lines();
    if let Some(first) = lines.next() {
        if let Some(shell) = detect_shell_from_shebang(first) {
            return Some(shell);
        }
        if let Some(shell) = detect_shell_from_directive(first) {
            return Some(shell);
        }
    }
    for line in content.lines().skip(1).take(max_lines.saturating_sub(1)) {
        if let Some(shell) = detect_shell_from_directive(line) {
            return Some(shell);
        }
    }
    None
}

/// Default `max_lines` for [`detect_shell`].
pub const DEFAULT_DETECT_MAX_LINES: usize = 10;

/// Checks whether `shell` supports `feature`. If unsupported and `collector`
/// is provided, emits an SSH_3001 warning naming the feature and suggesting
/// a POSIX-compatible alternative. Returns whether the feature is
/// supported.
pub fn check_feature(
    shell: Shell,
    feature: Feature,
    span: Span,
    collector: Option<&mut DiagnosticCollector>,
) -> bool {
    let supported = shell.has_capability(feature);
    if let Some(collector) = collector {
        collector.accept_with_compatibility_check(true, supported, feature.description(), span);
    }
    supported
}

/// Error returned by [`require_feature`] when the dialect lacks a required
/// feature.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{feature} is not supported by {shell:?}", feature = .feature.description())]
pub struct UnsupportedFeatureError {
    pub shell: Shell,
    pub feature: Feature,
    pub span: Span,
}

/// As [`check_feature`], but returns an error instead of a warning when the
/// feature is unsupported. Used by strict-mode parsing paths that must
/// reject dialect-incompatible constructs outright.
pub fn require_feature(
    shell: Shell,
    feature: Feature,
    span: Span,
) -> Result<(), UnsupportedFeatureError> {
    if shell.has_capability(feature) {
        Ok(())
    } else {
        Err(UnsupportedFeatureError { shell, feature, span })
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
    fn parse_shell_normalizes_case_and_path() {
        assert_eq!(parse_shell("/bin/BASH").unwrap(), Shell::Bash);
        assert_eq!(parse_shell("ksh93").unwrap(), Shell::Ksh);
        assert_eq!(parse_shell("mksh").unwrap(), Shell::Ksh);
        assert!(parse_shell("fish").is_err());
    }

    #[test]
    fn known_deviations_hold() {
        assert!(!Shell::Sh.has_capability(Feature::Arrays));
        assert!(Shell::Dash.has_capability(Feature::AnsiCQuoting));
        assert!(!Shell::Dash.has_capability(Feature::Arrays));
        assert!(!Shell::Zsh.has_capability(Feature::Nameref));
        assert!(Shell::Zsh.has_capability(Feature::Arrays));
        assert!(!Shell::Ksh.has_capability(Feature::FdVariables));
        assert!(!Shell::Ksh.has_capability(Feature::PipeStderr));
        assert!(!Shell::Ksh.has_capability(Feature::AppendStderr));
        assert!(Shell::Ksh.has_capability(Feature::Arrays));
        assert!(Shell::Bash.has_capability(Feature::Arrays));
    }

    #[test]
    fn detect_shebang_direct_and_env_forms() {
        assert_eq!(detect_shell_from_shebang("#!/bin/bash"), Some(Shell::Bash));
        assert_eq!(
            detect_shell_from_shebang("#!/usr/bin/env bash"),
            Some(Shell::Bash)
        );
        assert_eq!(
            detect_shell_from_shebang("#!/usr/bin/env -S bash -x"),
            Some(Shell::Bash)
        );
        assert_eq!(detect_shell_from_shebang("echo hi"), None);
    }

    #[test]
    fn detect_shell_for_every_dialect_and_shebang_form() {
        for (name, expected) in [
            ("bash", Shell::Bash),
            ("sh", Shell::Sh),
            ("dash", Shell::Dash),
            ("ksh", Shell::Ksh),
            ("zsh", Shell::Zsh),
        ] {
            let direct = format!("#!/path/{name}");
            assert_eq!(detect_shell(&direct, 10), Some(expected));
            let enved = format!("#!/usr/bin/env {name}");
            assert_eq!(detect_shell(&enved, 10), Some(expected));
        }
    }

    #[test]
    fn shebang_takes_priority_over_directive() {
        let content = "#!/bin/bash\n# shell: zsh\necho hi\n";
        assert_eq!(detect_shell(content, 10), Some(Shell::Bash));
    }

    #[test]
    fn directive_used_when_no_shebang() {
        let content = "# this is a script\n# shelltype: ksh\necho hi\n";
        assert_eq!(detect_shell(content, 10), Some(Shell::Ksh));
    }

    #[test]
    fn directive_beyond_max_lines_is_not_found() {
        let mut content = String::from("echo 1\n");
        for _ in 0..20 {
            content.push_str("echo filler\n");
        }
        content.push_str("# shell: zsh\n");
        assert_eq!(detect_shell(&content, 3), None);
    }

    #[test]
    fn check_feature_warns_when_unsupported() {
        let mut collector = DiagnosticCollector::new();
        let supported = check_feature(
            Shell::Sh,
            Feature::Arrays,
            span(),
            Some(&mut collector),
        );
        assert!(!supported);
        assert!(collector.has_warnings());
        assert_eq!(collector.warnings()[0].code, Code::BASH_ONLY_FEATURE);
    }

    #[test]
    fn require_feature_errors_when_unsupported() {
        assert!(require_feature(Shell::Bash, Feature::Arrays, span()).is_ok());
        assert!(require_feature(Shell::Sh, Feature::Arrays, span()).is_err());
    }
}
