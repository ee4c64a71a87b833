//! SQUOTE and DQUOTE modes (spec §4.3.2, §4.3.3).

use sh_error::Status;
use sh_token::{push_literal_byte, LiteralPart, Part, Quoting, Token};

use crate::dollar::{dispatch_dollar, DollarDispatch};
use crate::mode::{BacktickState, Mode};
use crate::word::InProgressWord;
use crate::{Lexer, StepOutcome, StepResult};

impl Lexer {
    /// SQUOTE: copy bytes verbatim into a single Literal Part until the
    /// closing `'`. No escapes, no expansions (spec §4.3.2).
    pub(crate) fn scan_squote(&mut self, _out: &mut Vec<Token>) -> StepResult {
        let mut word = self.current_word.take().unwrap_or_else(|| InProgressWord::new(self.cursor.position()));
        let result = self.drive_squote(&mut word);
        self.current_word = Some(word);
        result.map(|()| StepOutcome::Progress)
    }

    fn drive_squote(&mut self, word: &mut InProgressWord) -> Result<(), Status> {
        loop {
            if self.cursor.at_end() {
                return Err(Status::Incomplete);
            }
            let b = self.cursor.advance();
            if b == b'\'' {
                self.modes.pop();
                return Ok(());
            }
            push_literal_byte(&mut word.parts, Quoting::Single, b);
        }
    }

    /// DQUOTE: accumulate a quoted Literal, dispatching `$`/backtick the
    /// same way NORMAL does, with DQUOTE's own escape rule (spec §4.3.3).
    pub(crate) fn scan_dquote(&mut self, _out: &mut Vec<Token>) -> StepResult {
        let mut word = self.current_word.take().unwrap_or_else(|| InProgressWord::new(self.cursor.position()));
        let result = self.drive_dquote(&mut word);
        self.current_word = Some(word);
        result.map(|()| StepOutcome::Progress)
    }

    fn drive_dquote(&mut self, word: &mut InProgressWord) -> Result<(), Status> {
        loop {
            if self.cursor.at_end() {
                return Err(Status::Incomplete);
            }
            let b = self.cursor.peek();
            match b {
                b'"' => {
                    self.cursor.advance();
                    self.modes.pop();
                    return Ok(());
                }
                b'\\' => {
                    if !self.cursor.has_lookahead(2) {
                        return Err(Status::Incomplete);
                    }
                    let next = self.cursor.peek_ahead(1);
                    if matches!(next, b'$' | b'`' | b'"' | b'\\' | b'\n') {
                        self.cursor.advance();
                        let escaped = self.cursor.advance();
                        if escaped != b'\n' {
                            push_literal_byte(&mut word.parts, Quoting::Double, escaped);
                        }
                    } else {
                        self.cursor.advance();
                        push_literal_byte(&mut word.parts, Quoting::Double, b'\\');
                    }
                }
                b'$' => match dispatch_dollar(&mut self.cursor) {
                    DollarDispatch::Literal => {
                        self.cursor.advance();
                        push_literal_byte(&mut word.parts, Quoting::Double, b'$');
                    }
                    DollarDispatch::NeedMore => return Err(Status::Incomplete),
                    DollarDispatch::Enter(mode) => {
                        self.modes.push(mode);
                        return Ok(());
                    }
                },
                b'`' => {
                    self.cursor.advance();
                    self.modes.push(Mode::CmdSubstBacktick(BacktickState {
                        outer_is_dquote: true,
                        captured: Vec::new(),
                    }));
                    return Ok(());
                }
                _ => {
                    self.cursor.advance();
                    push_literal_byte(&mut word.parts, Quoting::Double, b);
                }
            }
        }
    }
}

/// True when the mode directly beneath the current top of the stack is
/// DQUOTE — used by child expansion scanners to set a Part's
/// `in_double_quotes` flag once they pop themselves (spec §3.2, §4.3.3).
pub(crate) fn enclosing_mode_is_dquote(lexer: &Lexer) -> bool {
    matches!(lexer.modes.current(), Mode::Dquote)
}

pub(crate) fn empty_literal_part(quoting: Quoting) -> Part {
    Part::Literal(LiteralPart { text: std::sync::Arc::from(&b""[..]), quoting })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_token::TokenKind;

    #[test]
    fn squote_copies_verbatim_with_no_escapes() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"'a\\b'\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Literal(l) => {
                    assert_eq!(l.quoting, Quoting::Single);
                    assert_eq!(&*l.text, b"a\\b");
                }
                other => panic!("unexpected part {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dquote_interpolates_parameter() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"\"hi $USER\"\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => assert_eq!(w.parts.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dquote_unterminated_is_incomplete() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"\"abc");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Incomplete);
    }
}
