//! ARITH mode (spec §4.3.8): a verbatim-copy scanner like CMD_SUBST_PAREN,
//! but closing on a `))` pair rather than a single `)`, and additionally
//! tracking `${...}` runs (on top of the `'...'`/`"..."`/`` `...` `` runs
//! CMD_SUBST_PAREN already needs) since arithmetic expressions can embed
//! parameter expansions.

use sh_error::{InternalError, LexErrorKind, Status};
use sh_token::{ArithmeticPart, Part, Token};

use crate::mode::{InnerRun, Mode};
use crate::scan_quote::enclosing_mode_is_dquote;
use crate::{Lexer, StepOutcome, StepResult};

impl Lexer {
    /// Entered after `$((` (spec §4.3.8).
    pub(crate) fn scan_arith(&mut self, _out: &mut Vec<Token>) -> StepResult {
        loop {
            if self.cursor.at_end() {
                return Err(Status::Incomplete);
            }
            let b = self.cursor.peek();
            let state = match self.modes.current_mut() {
                Some(Mode::Arith(s)) => s,
                _ => return Lexer::raise_internal_error(InternalError::UnknownMode),
            };
            match state.inner {
                InnerRun::None => match b {
                    b'\\' => {
                        if !self.cursor.has_lookahead(2) {
                            return Err(Status::Incomplete);
                        }
                        self.cursor.advance();
                        let next = self.cursor.advance();
                        if next != b'\n' {
                            state.captured.push(b'\\');
                            state.captured.push(next);
                        }
                    }
                    b'\'' => {
                        state.inner = InnerRun::SingleQuote;
                        state.captured.push(b);
                        self.cursor.advance();
                    }
                    b'"' => {
                        state.inner = InnerRun::DoubleQuote;
                        state.captured.push(b);
                        self.cursor.advance();
                    }
                    b'`' => {
                        state.inner = InnerRun::Backtick;
                        state.captured.push(b);
                        self.cursor.advance();
                    }
                    b'$' => {
                        if !self.cursor.has_lookahead(2) {
                            return Err(Status::Incomplete);
                        }
                        if self.cursor.peek_ahead(1) == b'{' {
                            state.inner = InnerRun::BracedParam(1);
                            state.captured.push(self.cursor.advance());
                            state.captured.push(self.cursor.advance());
                        } else {
                            state.captured.push(self.cursor.advance());
                        }
                    }
                    b'(' => {
                        state.paren_depth += 1;
                        state.captured.push(b);
                        self.cursor.advance();
                    }
                    b')' => {
                        if state.paren_depth == 0 {
                            if !self.cursor.has_lookahead(2) {
                                return Err(Status::Incomplete);
                            }
                            let after = self.cursor.peek_ahead(1);
                            if after == b')' {
                                self.cursor.advance();
                                self.cursor.advance();
                                return self.finish_arith();
                            }
                            return self.raise_error(LexErrorKind::UnbalancedArithmeticParens);
                        }
                        state.paren_depth -= 1;
                        state.captured.push(b);
                        self.cursor.advance();
                    }
                    _ => {
                        state.captured.push(b);
                        self.cursor.advance();
                    }
                },
                InnerRun::SingleQuote => {
                    state.captured.push(b);
                    self.cursor.advance();
                    if b == b'\'' {
                        state.inner = InnerRun::None;
                    }
                }
                InnerRun::DoubleQuote => {
                    if b == b'\\' {
                        if !self.cursor.has_lookahead(2) {
                            return Err(Status::Incomplete);
                        }
                        state.captured.push(self.cursor.advance());
                        state.captured.push(self.cursor.advance());
                    } else {
                        state.captured.push(b);
                        self.cursor.advance();
                        if b == b'"' {
                            state.inner = InnerRun::None;
                        }
                    }
                }
                InnerRun::Backtick => {
                    if b == b'\\' {
                        if !self.cursor.has_lookahead(2) {
                            return Err(Status::Incomplete);
                        }
                        state.captured.push(self.cursor.advance());
                        state.captured.push(self.cursor.advance());
                    } else {
                        state.captured.push(b);
                        self.cursor.advance();
                        if b == b'`' {
                            state.inner = InnerRun::None;
                        }
                    }
                }
                InnerRun::BracedParam(depth) => {
                    if b == b'\\' {
                        if !self.cursor.has_lookahead(2) {
                            return Err(Status::Incomplete);
                        }
                        state.captured.push(self.cursor.advance());
                        state.captured.push(self.cursor.advance());
                        continue;
                    }
                    state.captured.push(b);
                    self.cursor.advance();
                    if b == b'{' {
                        state.inner = InnerRun::BracedParam(depth + 1);
                    } else if b == b'}' {
                        state.inner =
                            if depth <= 1 { InnerRun::None } else { InnerRun::BracedParam(depth - 1) };
                    }
                }
            }
        }
    }

    fn finish_arith(&mut self) -> StepResult {
        let text = match self.modes.pop() {
            Mode::Arith(state) => state.captured,
            _ => return Lexer::raise_internal_error(InternalError::UnknownMode),
        };
        let in_double_quotes = enclosing_mode_is_dquote(self);
        self.append_part_to_current_word(Part::Arithmetic(ArithmeticPart {
            text: std::sync::Arc::from(text.as_slice()),
            in_double_quotes,
        }));
        Ok(StepOutcome::Progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_token::TokenKind;

    #[test]
    fn arith_captures_simple_expression() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$((1 + 2))\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Arithmetic(a) => assert_eq!(&*a.text, b"1 + 2"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn arith_nested_parens_require_matching_close() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$(((1 + 2)))\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Arithmetic(a) => assert_eq!(&*a.text, b"(1 + 2)"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn arith_single_close_paren_followed_by_non_paren_is_error() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$((1)x\n");
        let mut out = Vec::new();
        assert!(matches!(lexer.tokenize(&mut out), Status::Error(_)));
    }

    #[test]
    fn arith_embeds_braced_parameter() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$((${#arr[@]}))\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Arithmetic(a) => assert_eq!(&*a.text, b"${#arr[@]}"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }
}
