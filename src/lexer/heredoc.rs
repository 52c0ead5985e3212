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

//! The pending here-doc queue and body capture.

use super::token::{Token, TokenFlags, TokenKind};
use crate::source::{SourceBuffer, Span};

/// One `<<`/`<<-` registered while its body hasn't been read yet.
#[derive(Clone, Debug)]
pub struct PendingHeredoc {
    pub delimiter: String,
    pub strip_tabs: bool,
    pub quoted: bool,
}

/// Reads the here-doc delimiter immediately following a `<<`/`<<-` token,
/// skipping intervening spaces/tabs (but not consuming past the delimiter
/// itself, per the lexer's lookahead-without-commit rule) -- in practice we
/// do consume through the delimiter here since nothing else can follow it on
/// the operator line except the rest of that same command.
pub fn scan_heredoc_delimiter(buffer: &mut SourceBuffer<'_>) -> (String, bool) {
    while matches!(buffer.peek(), Some(' ') | Some('\t')) {
        buffer.advance();
    }
    match buffer.peek() {
        Some('\'') => {
            buffer.advance();
            let mut text = String::new();
            while let Some(c) = buffer.peek() {
                buffer.advance();
                if c == '\'' {
                    break;
                }
                text.push(c);
            }
            (text, true)
        }
        Some('"') => {
            buffer.advance();
            let mut text = String::new();
            while let Some(c) = buffer.peek() {
                buffer.advance();
                if c == '"' {
                    break;
                }
                if c == '\\' {
                    if let Some(n) = buffer.advance() {
                        text.push(n);
                    }
                    continue;
                }
                text.push(c);
            }
            (text, true)
        }
        _ => {
            let mut text = String::new();
            let mut quoted = false;
            while let Some(c) = buffer.peek() {
                if c.is_whitespace() || matches!(c, '|' | '&' | ';' | '(' | ')' | '<' | '>') {
                    break;
                }
                if c == '\\' {
                    quoted = true;
                    buffer.advance();
                    if let Some(n) = buffer.advance() {
                        text.push(n);
                    }
                    continue;
                }
                text.push(c);
                buffer.advance();
            }
            (text, quoted)
        }
    }
}

/// Drains the pending-heredoc queue in FIFO order, reading each body from
/// the buffer's current position (right after a newline) until a line
/// equals its delimiter exactly, and returns one `HEREDOC_CONTENT` token per
/// queued entry.
pub fn capture_heredoc_bodies(buffer: &mut SourceBuffer<'_>, pending: &mut Vec<PendingHeredoc>) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pending.len());
    for entry in pending.drain(..) {
        let start = buffer.position();
        let mut content = String::new();
        loop {
            if buffer.is_at_end() {
                break;
            }
            let line_start_offset = buffer.position().offset;
            let mut line = String::new();
            while let Some(c) = buffer.peek() {
                buffer.advance();
                if c == '\n' {
                    break;
                }
                line.push(c);
            }
            let mut checked = line.as_str();
            if entry.strip_tabs {
                checked = checked.trim_start_matches('\t');
            }
            if checked == entry.delimiter {
                break;
            }
            let _ = line_start_offset;
            content.push_str(if entry.strip_tabs { checked } else { line.as_str() });
            content.push('\n');
        }
        let span = Span::new(start, buffer.position());
        tokens.push(Token {
            kind: TokenKind::HeredocContent,
            lexeme: content,
            span,
            flags: Some(TokenFlags {
                quoted: entry.quoted,
                single_quoted: false,
            }),
            parts: Vec::new(),
        });
    }
    tokens
}
