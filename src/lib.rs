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

//! Shell script lexer, grammar parser, and arithmetic expression parser.
//!
//! This crate turns shell source text into a typed, position-bearing
//! abstract syntax tree (see [`syntax`]) plus a stream of diagnostics (see
//! [`diagnostics`]). It is the front-end of a shell-to-TypeScript
//! transpiler: downstream stages consume the [`syntax::Program`] and the
//! [`position::PositionMap`] produced here, but evaluating the script,
//! expanding globs, or otherwise running the commands it describes is out
//! of scope for this crate.
//!
//! Three subsystems do the heavy lifting:
//!
//! - [`lexer`]: a context-sensitive, streaming tokenizer (layer L2).
//! - [`parser`]: a recursive-descent grammar parser (layer L4).
//! - [`arith`]: a Pratt parser for `$(( ... ))` / `(( ... ))` (layer L3).
//!
//! [`diagnostics`] and [`dialect`] are consulted by both the lexer and the
//! grammar parser: diagnostics collects severity-channeled notes, and
//! dialect gates which constructs are accepted silently, with a warning, or
//! not at all, depending on the target shell.
//!
//! The crate is a synchronous, single-threaded pipeline: one [`parser::Parser`]
//! owns its lexer, its id generator, its position map, and its diagnostic
//! collector, none of which are shared across parses. There is no async and
//! no global state, so independent parses may run concurrently on separate
//! threads.
//!
//! # Example
//!
//! ```
//! use safeshell_syntax::parse;
//!
//! let program = parse("ls -la | grep .ts", None).unwrap();
//! assert_eq!(program.body.len(), 1);
//! ```

pub mod arith;
pub mod combinators;
pub mod dialect;
pub mod diagnostics;
pub mod lexer;
mod param;
pub mod parser;
pub mod position;
pub mod source;
pub mod syntax;

pub use dialect::{detect_shell, Shell};
pub use diagnostics::ParseNote;
pub use parser::{parse, parse_with_recovery, Parser};
pub use position::{NodeId, PositionMap};
pub use syntax::Program;

/// Parses arithmetic expression text (the interior of `$(( ... ))` or
/// `(( ... ))`, without the enclosing delimiters) into a single
/// [`arith::ArithmeticExpression`].
///
/// This is the entry point host code uses when it already knows it is
/// looking at an arithmetic context, e.g. because another tool extracted the
/// substring for it. The full grammar parser calls the same Pratt parser
/// internally whenever it opens an arithmetic context.
pub fn parse_arithmetic(source: &str) -> Result<arith::ArithmeticExpression, arith::ArithError> {
    arith::parse(source)
}
