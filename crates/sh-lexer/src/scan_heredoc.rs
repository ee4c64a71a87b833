//! HEREDOC_BODY mode (spec §4.3.10).
//!
//! Line boundaries are found by peeking forward for the next raw `\n`
//! without consuming anything, so a line that hasn't fully arrived yet
//! just suspends and re-scans from the same cursor position next call —
//! the same probe-then-commit shape as NORMAL's `{name}` lookahead.

use std::sync::Arc;

use sh_error::{InternalError, Status};
use sh_heredoc::process_line;
use sh_position::Span;
use sh_token::{HeredocBodyData, Token, TokenKind};

use crate::{Lexer, StepOutcome, StepResult};

impl Lexer {
    pub(crate) fn scan_heredoc_body(&mut self, out: &mut Vec<Token>) -> StepResult {
        loop {
            let entry = match self.heredocs.front() {
                Some(e) => e.clone(),
                None => return Lexer::raise_internal_error(InternalError::HeredocBodyWithEmptyQueue),
            };

            let mut len = 0usize;
            let mut found_newline = false;
            loop {
                if !self.cursor.has_lookahead(len + 1) {
                    break;
                }
                if self.cursor.peek_ahead(len) == b'\n' {
                    found_newline = true;
                    break;
                }
                len += 1;
            }
            if !found_newline {
                return Err(Status::Incomplete);
            }

            let mut raw_line = Vec::with_capacity(len);
            for i in 0..len {
                raw_line.push(self.cursor.peek_ahead(i));
            }

            match process_line(&entry, &raw_line) {
                None => {
                    let start = self.cursor.position();
                    for _ in 0..=len {
                        self.cursor.advance();
                    }
                    let end = self.cursor.position();
                    let body = std::mem::take(&mut self.heredoc_body);
                    self.heredocs.pop_front();
                    if self.heredocs.is_empty() {
                        self.modes.pop();
                    }
                    let data = HeredocBodyData {
                        delimiter: entry.delimiter,
                        body: Arc::from(body.as_slice()),
                        delimiter_was_quoted: entry.delimiter_was_quoted,
                    };
                    self.push_token(Token::new(TokenKind::EndOfHeredoc(data), Span::new(start, end)), out);
                    return Ok(StepOutcome::Progress);
                }
                Some(content) => {
                    let content = content.to_vec();
                    for _ in 0..=len {
                        self.cursor.advance();
                    }
                    let (resolved, join_next) = if entry.delimiter_was_quoted {
                        (content, false)
                    } else {
                        resolve_unquoted_heredoc_line(&content)
                    };
                    self.heredoc_body.extend_from_slice(&resolved);
                    if !join_next {
                        self.heredoc_body.push(b'\n');
                    }
                }
            }
        }
    }
}

/// Resolve backslash escapes in one physical body line of an
/// unquoted-delimiter heredoc (spec §4.3.10): `\$`, `` \` ``, `\\` drop the
/// backslash and keep the escaped byte; a backslash as the line's very
/// last byte is a continuation marker (join with the next physical line,
/// no intervening newline in the body); any other backslash is literal.
/// Returns the resolved bytes and whether the next line should be joined.
fn resolve_unquoted_heredoc_line(bytes: &[u8]) -> (Vec<u8>, bool) {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if i + 1 == bytes.len() {
                return (out, true);
            }
            let next = bytes[i + 1];
            if matches!(next, b'$' | b'`' | b'\\') {
                out.push(next);
                i += 2;
                continue;
            }
            out.push(b'\\');
            i += 1;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    (out, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_token::TokenKind as TK;

    fn run(input: &[u8]) -> (Status, Vec<Token>) {
        let mut lexer = Lexer::create();
        lexer.append_input(input);
        let mut out = Vec::new();
        loop {
            let before = out.len();
            match lexer.tokenize(&mut out) {
                Status::Ok if out.len() == before => return (Status::Ok, out),
                Status::Ok => continue,
                other => return (other, out),
            }
        }
    }

    #[test]
    fn simple_heredoc_body() {
        let (status, tokens) = run(b"cat <<EOF\nhello\nEOF\n");
        assert_eq!(status, Status::Ok);
        let heredoc = tokens.iter().find_map(|t| match &t.kind {
            TK::EndOfHeredoc(d) => Some(d),
            _ => None,
        });
        let data = heredoc.expect("heredoc token");
        assert_eq!(&*data.delimiter, "EOF");
        assert_eq!(&*data.body, b"hello\n");
        assert!(!data.delimiter_was_quoted);
    }

    #[test]
    fn dless_dash_strips_leading_tabs() {
        let (status, tokens) = run(b"cat <<-EOF\n\t\thello\n\tEOF\n");
        assert_eq!(status, Status::Ok);
        let data = tokens
            .iter()
            .find_map(|t| match &t.kind {
                TK::EndOfHeredoc(d) => Some(d),
                _ => None,
            })
            .unwrap();
        assert_eq!(&*data.body, b"hello\n");
    }

    #[test]
    fn quoted_delimiter_suppresses_escapes() {
        let (status, tokens) = run(b"cat <<'EOF'\n$x \\$y\nEOF\n");
        assert_eq!(status, Status::Ok);
        let data = tokens
            .iter()
            .find_map(|t| match &t.kind {
                TK::EndOfHeredoc(d) => Some(d),
                _ => None,
            })
            .unwrap();
        assert_eq!(&*data.body, b"$x \\$y\n");
        assert!(data.delimiter_was_quoted);
        assert!(!data.needs_expansion());
    }

    #[test]
    fn incomplete_without_terminator() {
        let (status, _tokens) = run(b"cat <<EOF\nhello\n");
        assert_eq!(status, Status::Incomplete);
    }
}
