//! CMD_SUBST_PAREN and CMD_SUBST_BACKTICK modes (spec §4.3.6, §4.3.7).
//!
//! Both are verbatim-copy scanners: nested nothing gets re-lexed here, it
//! is captured raw and handed to the parser's command-substitution
//! sub-parse later. Depth/run tracking lives directly on the mode's state
//! struct and is mutated byte-by-byte, so a suspension never needs to
//! untangle partial progress the way PARAM_BRACED's multi-field stages do.

use sh_error::{InternalError, Status};
use sh_token::{CommandSubstPart, Part, Token};

use crate::mode::{InnerRun, Mode};
use crate::scan_quote::enclosing_mode_is_dquote;
use crate::{Lexer, StepOutcome, StepResult};

impl Lexer {
    /// Entered after `$(` (spec §4.3.6).
    pub(crate) fn scan_cmd_subst_paren(&mut self, _out: &mut Vec<Token>) -> StepResult {
        loop {
            if self.cursor.at_end() {
                return Err(Status::Incomplete);
            }
            let b = self.cursor.peek();
            let state = match self.modes.current_mut() {
                Some(Mode::CmdSubstParen(s)) => s,
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
                    b'(' => {
                        state.depth += 1;
                        state.captured.push(b);
                        self.cursor.advance();
                    }
                    b')' => {
                        if state.depth == 0 {
                            self.cursor.advance();
                            return self.finish_cmd_subst_paren();
                        }
                        state.depth -= 1;
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
                InnerRun::BracedParam(_) => unreachable!("CMD_SUBST_PAREN never enters a braced-param run"),
            }
        }
    }

    fn finish_cmd_subst_paren(&mut self) -> StepResult {
        let text = match self.modes.pop() {
            Mode::CmdSubstParen(state) => state.captured,
            _ => return Lexer::raise_internal_error(InternalError::UnknownMode),
        };
        let in_double_quotes = enclosing_mode_is_dquote(self);
        self.append_part_to_current_word(Part::CommandSubst(CommandSubstPart {
            text: std::sync::Arc::from(text.as_slice()),
            in_double_quotes,
        }));
        Ok(StepOutcome::Progress)
    }

    /// Entered after a backtick (spec §4.3.7). Backslash is special only
    /// before `$`, `` ` ``, `\`, and newline; any other backslash (and,
    /// per the outer-context rule, `\"` when the surrounding mode is
    /// NORMAL rather than DQUOTE) is kept literally along with the next
    /// byte untouched.
    pub(crate) fn scan_cmd_subst_backtick(&mut self, _out: &mut Vec<Token>) -> StepResult {
        loop {
            if self.cursor.at_end() {
                return Err(Status::Incomplete);
            }
            let b = self.cursor.peek();
            let outer_is_dquote = match self.modes.current() {
                Mode::CmdSubstBacktick(s) => s.outer_is_dquote,
                _ => return Lexer::raise_internal_error(InternalError::UnknownMode),
            };
            if b == b'`' {
                self.cursor.advance();
                return self.finish_cmd_subst_backtick();
            }
            if b == b'\\' {
                if !self.cursor.has_lookahead(2) {
                    return Err(Status::Incomplete);
                }
                let next = self.cursor.peek_ahead(1);
                let escapable = matches!(next, b'$' | b'`' | b'\\' | b'\n') || (next == b'"' && !outer_is_dquote);
                let state = match self.modes.current_mut() {
                    Some(Mode::CmdSubstBacktick(s)) => s,
                    _ => return Lexer::raise_internal_error(InternalError::UnknownMode),
                };
                if escapable {
                    self.cursor.advance();
                    let escaped = self.cursor.advance();
                    if next == b'\n' {
                        // line continuation inside the backtick body: drop both
                    } else {
                        state.captured.push(escaped);
                    }
                } else {
                    state.captured.push(self.cursor.advance());
                }
                continue;
            }
            let state = match self.modes.current_mut() {
                Some(Mode::CmdSubstBacktick(s)) => s,
                _ => return Lexer::raise_internal_error(InternalError::UnknownMode),
            };
            state.captured.push(b);
            self.cursor.advance();
        }
    }

    fn finish_cmd_subst_backtick(&mut self) -> StepResult {
        let text = match self.modes.pop() {
            Mode::CmdSubstBacktick(state) => state.captured,
            _ => return Lexer::raise_internal_error(InternalError::UnknownMode),
        };
        let in_double_quotes = enclosing_mode_is_dquote(self);
        self.append_part_to_current_word(Part::CommandSubst(CommandSubstPart {
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
    fn paren_cmd_subst_tracks_nested_parens() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$(echo (x))\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::CommandSubst(cs) => assert_eq!(&*cs.text, b"echo (x)"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn paren_cmd_subst_ignores_paren_inside_squote() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$(echo ')')\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::CommandSubst(cs) => assert_eq!(&*cs.text, b"echo ')'"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn backtick_cmd_subst_captures_to_matching_backtick() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"`echo hi`\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::CommandSubst(cs) => assert_eq!(&*cs.text, b"echo hi"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }
}
