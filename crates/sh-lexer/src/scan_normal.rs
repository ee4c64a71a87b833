//! NORMAL mode (spec §4.3.1) and the word-assembly loop it shares with
//! finalize handling. Word *continuation* is also invoked directly by
//! DQUOTE for the non-quote-consuming cases (`scan_quote.rs` re-dispatches
//! `$`/backtick through [`dispatch_dollar`] itself instead of calling back
//! in here, since DQUOTE's escape rules differ from NORMAL's).

use std::sync::Arc;

use sh_error::{LexError, LexErrorKind, Status};
use sh_position::{Position, Span};
use sh_token::{push_literal_byte, Part, Quoting, TildePart, Token, TokenKind, WordData};

use crate::assignment;
use crate::dollar::{dispatch_dollar, DollarDispatch};
use crate::mode::{BacktickState, Mode};
use crate::operators::{is_operator_start, match_operator, OperatorMatch};
use crate::word::{
    is_blank, is_name_byte, is_name_start, is_quote_or_expansion_trigger, is_word_terminator_byte,
    needs_expansion, needs_field_splitting, needs_pathname_expansion, was_quoted, InProgressWord,
};
use crate::{Lexer, PendingHeredocOp, StepOutcome, StepResult};
use sh_heredoc::HeredocEntry;

/// Longest `{name}` this lexer will probe before giving up and treating
/// `{` as an ordinary literal byte (bounds the lookahead scan; genuine
/// file-descriptor names are always short).
const MAX_IO_LOCATION_NAME_LEN: usize = 64;

enum IoLocationProbe {
    Yes { total_len: usize, name: Vec<u8> },
    No,
    NeedMore,
}

impl Lexer {
    pub(crate) fn scan_normal(&mut self, out: &mut Vec<Token>) -> StepResult {
        if self.current_word.is_none() {
            while !self.cursor.at_end() && is_blank(self.cursor.peek()) {
                self.cursor.advance();
            }
        }

        if self.cursor.at_end() {
            if let Some(word) = self.current_word.take() {
                self.finalize_word(word, out);
                return Ok(StepOutcome::Progress);
            }
            if !self.heredocs.is_empty() {
                return Err(Status::Incomplete);
            }
            return Ok(StepOutcome::Eof);
        }

        if self.current_word.is_some() {
            return self.continue_word(out);
        }

        let b = self.cursor.peek();

        if b == b'\n' {
            let start = self.cursor.position();
            self.cursor.advance();
            let end = self.cursor.position();
            if !self.heredocs.is_empty() {
                self.modes.push(Mode::HeredocBody);
            }
            self.push_token(Token::new(TokenKind::Newline, Span::new(start, end)), out);
            return Ok(StepOutcome::Progress);
        }

        if b == b'\\' && self.cursor.peek_ahead(1) == b'\n' {
            if !self.cursor.has_lookahead(2) {
                return Err(Status::Incomplete);
            }
            self.cursor.advance();
            self.cursor.advance();
            return Ok(StepOutcome::Progress);
        }

        if is_operator_start(b) {
            return self.scan_operator(out);
        }

        if b == b'{' {
            match self.probe_io_location() {
                IoLocationProbe::NeedMore => return Err(Status::Incomplete),
                IoLocationProbe::Yes { total_len, name } => {
                    let start = self.cursor.position();
                    for _ in 0..total_len {
                        self.cursor.advance();
                    }
                    let end = self.cursor.position();
                    let text = Arc::from(String::from_utf8_lossy(&name).into_owned());
                    self.push_token(Token::new(TokenKind::IoLocation(text), Span::new(start, end)), out);
                    return Ok(StepOutcome::Progress);
                }
                IoLocationProbe::No => {}
            }
        }

        self.current_word = Some(InProgressWord::new(self.cursor.position()));
        self.continue_word(out)
    }

    fn scan_operator(&mut self, out: &mut Vec<Token>) -> StepResult {
        match match_operator(&self.cursor) {
            OperatorMatch::NeedMore => Err(Status::Incomplete),
            OperatorMatch::NotAnOperator => {
                // Unreachable given the `is_operator_start` guard at the
                // call site, but fall back to treating it as a word byte
                // rather than panicking on a scanner-contract mismatch.
                self.current_word = Some(InProgressWord::new(self.cursor.position()));
                self.continue_word(out)
            }
            OperatorMatch::Found { len, kind } => {
                let start = self.cursor.position();
                for _ in 0..len {
                    self.cursor.advance();
                }
                let end = self.cursor.position();
                let span = Span::new(start, end);
                let is_heredoc_op = matches!(kind, TokenKind::Dless | TokenKind::DlessDash);
                let strip_tabs = matches!(kind, TokenKind::DlessDash);
                self.push_token(Token::new(kind, span), out);
                if is_heredoc_op {
                    self.pending_heredoc =
                        Some(PendingHeredocOp { strip_tabs, token_index: self.tokens_emitted - 1 });
                }
                Ok(StepOutcome::Progress)
            }
        }
    }

    fn probe_io_location(&self) -> IoLocationProbe {
        let mut i = 1usize;
        let mut name = Vec::new();
        loop {
            if !self.cursor.has_lookahead(i + 1) {
                return IoLocationProbe::NeedMore;
            }
            let b = self.cursor.peek_ahead(i);
            if b == b'}' {
                break;
            }
            if !is_name_byte(b) || name.len() >= MAX_IO_LOCATION_NAME_LEN {
                return IoLocationProbe::No;
            }
            name.push(b);
            i += 1;
        }
        if !self.cursor.has_lookahead(i + 2) {
            return IoLocationProbe::NeedMore;
        }
        let after = self.cursor.peek_ahead(i + 1);
        if (after == b'<' || after == b'>') && is_valid_io_location_name(&name) {
            IoLocationProbe::Yes { total_len: i + 1, name }
        } else {
            IoLocationProbe::No
        }
    }

    /// Continue (or begin) assembling `self.current_word` one byte-level
    /// decision at a time, returning as soon as a token is emitted, a
    /// child mode is pushed, or more input is required.
    pub(crate) fn continue_word(&mut self, out: &mut Vec<Token>) -> StepResult {
        let mut word = self.current_word.take().unwrap_or_else(|| InProgressWord::new(self.cursor.position()));
        self.drive_word(&mut word, out)
    }

    fn drive_word(&mut self, word: &mut InProgressWord, out: &mut Vec<Token>) -> StepResult {
        loop {
            if word.extending_tilde {
                if !self.cursor.at_end() {
                    let b = self.cursor.peek();
                    let ends_tilde = b == b'/'
                        || b == b':'
                        || is_word_terminator_byte(b)
                        || is_quote_or_expansion_trigger(b)
                        || b == b'\\';
                    if !ends_tilde {
                        self.cursor.advance();
                        if let Some(Part::Tilde(t)) = word.parts.last_mut() {
                            let mut buf = t.text.to_vec();
                            buf.push(b);
                            t.text = Arc::from(buf);
                        }
                        continue;
                    }
                }
                word.extending_tilde = false;
            }

            if self.cursor.at_end() {
                let finished = std::mem::replace(word, InProgressWord::new(self.cursor.position()));
                self.finalize_word(finished, out);
                return Ok(StepOutcome::Progress);
            }

            let b = self.cursor.peek();
            if is_word_terminator_byte(b) {
                let finished = std::mem::replace(word, InProgressWord::new(self.cursor.position()));
                self.finalize_word(finished, out);
                return Ok(StepOutcome::Progress);
            }

            match b {
                b'\'' => {
                    self.cursor.advance();
                    word.note_quote_or_expansion();
                    self.current_word = Some(std::mem::replace(word, InProgressWord::new(self.cursor.position())));
                    self.modes.push(Mode::Squote);
                    return Ok(StepOutcome::Progress);
                }
                b'"' => {
                    self.cursor.advance();
                    word.note_quote_or_expansion();
                    self.current_word = Some(std::mem::replace(word, InProgressWord::new(self.cursor.position())));
                    self.modes.push(Mode::Dquote);
                    return Ok(StepOutcome::Progress);
                }
                b'`' => {
                    self.cursor.advance();
                    word.note_quote_or_expansion();
                    self.current_word = Some(std::mem::replace(word, InProgressWord::new(self.cursor.position())));
                    self.modes.push(Mode::CmdSubstBacktick(BacktickState {
                        outer_is_dquote: false,
                        captured: Vec::new(),
                    }));
                    return Ok(StepOutcome::Progress);
                }
                b'$' => match dispatch_dollar(&mut self.cursor) {
                    DollarDispatch::Literal => {
                        self.cursor.advance();
                        push_literal_byte(&mut word.parts, Quoting::Unquoted, b'$');
                    }
                    DollarDispatch::NeedMore => {
                        self.current_word =
                            Some(std::mem::replace(word, InProgressWord::new(self.cursor.position())));
                        return Err(Status::Incomplete);
                    }
                    DollarDispatch::Enter(mode) => {
                        word.note_quote_or_expansion();
                        self.current_word =
                            Some(std::mem::replace(word, InProgressWord::new(self.cursor.position())));
                        self.modes.push(mode);
                        return Ok(StepOutcome::Progress);
                    }
                },
                b'~' if tilde_allowed_here(word) => {
                    self.cursor.advance();
                    word.parts.push(Part::Tilde(TildePart { text: Arc::from(&b""[..]) }));
                    word.extending_tilde = true;
                }
                b'\\' => {
                    if !self.cursor.has_lookahead(2) {
                        self.current_word =
                            Some(std::mem::replace(word, InProgressWord::new(self.cursor.position())));
                        return Err(Status::Incomplete);
                    }
                    self.cursor.advance();
                    let escaped = self.cursor.advance();
                    push_literal_byte(&mut word.parts, Quoting::Unquoted, escaped);
                }
                b'=' => {
                    let is_leading = word.parts.is_empty();
                    push_literal_byte(&mut word.parts, Quoting::Unquoted, b'=');
                    self.cursor.advance();
                    word.note_equals(is_leading);
                }
                _ => {
                    push_literal_byte(&mut word.parts, Quoting::Unquoted, b);
                    self.cursor.advance();
                }
            }
        }
    }

    pub(crate) fn finalize_word(&mut self, word: InProgressWord, out: &mut Vec<Token>) {
        let InProgressWord { start, parts, has_equals_before_quote, .. } = word;
        let end = self.cursor.position();
        let span = Span::new(start, end);

        if let Some(pending) = self.pending_heredoc.take() {
            let (delimiter, delimiter_was_quoted) = delimiter_from_parts(&parts);
            self.heredocs.push(HeredocEntry {
                delimiter,
                strip_tabs: pending.strip_tabs,
                delimiter_was_quoted,
                insertion_token_index: pending.token_index,
            });
        }

        match assignment::try_promote(parts, has_equals_before_quote) {
            Ok(data) => {
                self.push_token(Token::new(TokenKind::AssignmentWord(data), span), out);
            }
            Err(parts) => {
                let data = WordData {
                    was_quoted: was_quoted(&parts),
                    needs_expansion: needs_expansion(&parts),
                    needs_field_splitting: needs_field_splitting(&parts),
                    needs_pathname_expansion: needs_pathname_expansion(&parts),
                    has_equals_before_quote,
                    parts,
                };
                self.push_token(Token::new(TokenKind::Word(data), span), out);
            }
        }
    }

    pub(crate) fn fail_unterminated_quote(&mut self) -> StepResult {
        let position = self.cursor.position();
        let err = LexError::new(LexErrorKind::UnterminatedQuote, position);
        self.error = Some(err.clone());
        Err(Status::Error(err))
    }
}

fn tilde_allowed_here(word: &InProgressWord) -> bool {
    match word.parts.last() {
        None => true,
        Some(Part::Literal(l)) if l.quoting == Quoting::Unquoted => {
            matches!(l.text.last(), Some(b'=') | Some(b':'))
        }
        _ => false,
    }
}

fn is_valid_io_location_name(name: &[u8]) -> bool {
    if name.is_empty() {
        return false;
    }
    if name.iter().all(|b| b.is_ascii_digit()) {
        return true;
    }
    is_name_start(name[0]) && name[1..].iter().all(|&b| is_name_byte(b))
}

/// Reconstruct the delimiter text from a finalized WORD's Parts (spec
/// §4.3.1 item 4, §3.3): literal text is used verbatim; expansion Parts
/// are not evaluated, only their raw surface form is concatenated, since
/// the delimiter word undergoes quote removal but not expansion.
fn delimiter_from_parts(parts: &[Part]) -> (Arc<str>, bool) {
    let mut text = Vec::new();
    let mut quoted = false;
    for part in parts {
        match part {
            Part::Literal(lit) => {
                if lit.quoting != Quoting::Unquoted {
                    quoted = true;
                }
                text.extend_from_slice(&lit.text);
            }
            Part::Parameter(p) => {
                text.push(b'$');
                text.extend_from_slice(p.name.as_bytes());
            }
            Part::CommandSubst(cs) => {
                text.extend_from_slice(b"$(");
                text.extend_from_slice(&cs.text);
                text.push(b')');
            }
            Part::Arithmetic(a) => {
                text.extend_from_slice(b"$((");
                text.extend_from_slice(&a.text);
                text.extend_from_slice(b"))");
            }
            Part::Tilde(t) => {
                text.push(b'~');
                text.extend_from_slice(&t.text);
            }
        }
    }
    (Arc::from(String::from_utf8_lossy(&text).into_owned()), quoted)
}
