//! PARAM_UNBRACED and PARAM_BRACED modes (spec §4.3.4, §4.3.5).

use std::sync::Arc;

use sh_error::{LexErrorKind, Status};
use sh_token::{ParameterKind, ParameterPart, Part, Token};

use crate::mode::ParamBracedStage;
use crate::scan_quote::enclosing_mode_is_dquote;
use crate::word::{is_name_byte, is_name_start, is_special_param_byte};
use crate::{Lexer, StepOutcome, StepResult};

impl Lexer {
    /// Entered after `$` with the cursor positioned at the parameter's
    /// first byte (spec §4.3.4).
    pub(crate) fn scan_param_unbraced(&mut self, _out: &mut Vec<Token>) -> StepResult {
        if self.cursor.at_end() {
            return Err(Status::Incomplete);
        }
        let first = self.cursor.peek();
        if !is_name_start(first) {
            if !is_special_param_byte(first) {
                return self.raise_error(LexErrorKind::InvalidBracedParameterChar);
            }
            self.cursor.advance();
            return self.finish_param_unbraced(Arc::from(String::from(first as char)));
        }

        let mut len = 0usize;
        loop {
            if !self.cursor.has_lookahead(len + 1) {
                return Err(Status::Incomplete);
            }
            if !is_name_byte(self.cursor.peek_ahead(len)) {
                break;
            }
            len += 1;
        }
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(self.cursor.advance());
        }
        self.finish_param_unbraced(crate::arc_str_lossy(&bytes))
    }

    fn finish_param_unbraced(&mut self, name: Arc<str>) -> StepResult {
        self.modes.pop();
        let in_double_quotes = enclosing_mode_is_dquote(self);
        self.append_part_to_current_word(Part::Parameter(ParameterPart {
            name,
            kind: ParameterKind::Plain,
            operand: None,
            in_double_quotes,
        }));
        Ok(StepOutcome::Progress)
    }

    /// Entered after `${`. The stage machine is carried in the mode's own
    /// state so a suspension resumes exactly where it left off
    /// (spec §4.3.5). Each `param_braced_*` helper either consumes bytes
    /// atomically (never suspending mid-consumption) or, if it must
    /// suspend, restores the stage it was called with before returning
    /// `Incomplete` — `current_mut` hands the real stage back out via
    /// `std::mem::take`, which leaves the mode holding the default (Start)
    /// until one of those two things happens.
    pub(crate) fn scan_param_braced(&mut self, _out: &mut Vec<Token>) -> StepResult {
        loop {
            let stage = match self.modes.current_mut() {
                Some(crate::mode::Mode::ParamBraced(state)) => std::mem::take(&mut state.stage),
                _ => return Lexer::raise_internal_error(sh_error::InternalError::UnknownMode),
            };
            let next = match stage {
                ParamBracedStage::Start => self.param_braced_start()?,
                ParamBracedStage::ReadingName { saw_hash_or_bang } => {
                    self.param_braced_read_name(saw_hash_or_bang)?
                }
                ParamBracedStage::AfterName { name, kind } => self.param_braced_after_name(name, kind)?,
                ParamBracedStage::ReadingOperand { name, kind, brace_depth, operand } => {
                    self.param_braced_read_operand(name, kind, brace_depth, operand)?
                }
            };
            match next {
                Some(stage) => self.set_param_braced_stage(stage),
                None => return Ok(StepOutcome::Progress),
            }
        }
    }

    fn set_param_braced_stage(&mut self, stage: ParamBracedStage) {
        if let Some(crate::mode::Mode::ParamBraced(state)) = self.modes.current_mut() {
            state.stage = stage;
        }
    }

    /// Handles the optional leading `#`/`!` and the degenerate `${#}`/
    /// `${!}` special-parameter-name case. Consumes nothing before any
    /// `Incomplete` return, so the corrupted-to-`Start` state left behind
    /// by `current_mut`'s `take` is already correct.
    fn param_braced_start(&mut self) -> Result<Option<ParamBracedStage>, Status> {
        if self.cursor.at_end() {
            return Err(Status::Incomplete);
        }
        let b = self.cursor.peek();
        if b == b'#' || b == b'!' {
            if !self.cursor.has_lookahead(2) {
                return Err(Status::Incomplete);
            }
            if self.cursor.peek_ahead(1) == b'}' {
                self.cursor.advance();
                self.cursor.advance();
                let kind = if b == b'#' { ParameterKind::Length } else { ParameterKind::Indirect };
                self.finish_param_braced(Arc::from(String::from(b as char)), kind, None)?;
                return Ok(None);
            }
            self.cursor.advance();
            return Ok(Some(ParamBracedStage::ReadingName { saw_hash_or_bang: Some(b) }));
        }
        Ok(Some(ParamBracedStage::ReadingName { saw_hash_or_bang: None }))
    }

    fn param_braced_read_name(&mut self, saw_hash_or_bang: Option<u8>) -> Result<Option<ParamBracedStage>, Status> {
        if self.cursor.at_end() {
            self.set_param_braced_stage(ParamBracedStage::ReadingName { saw_hash_or_bang });
            return Err(Status::Incomplete);
        }
        let first = self.cursor.peek();
        let name: Arc<str>;
        if is_name_start(first) {
            let mut len = 0usize;
            loop {
                if !self.cursor.has_lookahead(len + 1) {
                    self.set_param_braced_stage(ParamBracedStage::ReadingName { saw_hash_or_bang });
                    return Err(Status::Incomplete);
                }
                if !is_name_byte(self.cursor.peek_ahead(len)) {
                    break;
                }
                len += 1;
            }
            let mut bytes = Vec::with_capacity(len);
            for _ in 0..len {
                bytes.push(self.cursor.advance());
            }
            name = crate::arc_str_lossy(&bytes);
        } else if is_special_param_byte(first) {
            self.cursor.advance();
            name = Arc::from(String::from(first as char));
        } else {
            return Err(self.error_status(LexErrorKind::EmptyBracedParameter));
        }

        let kind = if saw_hash_or_bang == Some(b'#') {
            ParameterKind::Length
        } else if saw_hash_or_bang == Some(b'!') {
            ParameterKind::Indirect
        } else {
            ParameterKind::Plain
        };
        Ok(Some(ParamBracedStage::AfterName { name, kind }))
    }

    fn param_braced_after_name(
        &mut self,
        name: Arc<str>,
        kind: ParameterKind,
    ) -> Result<Option<ParamBracedStage>, Status> {
        if self.cursor.at_end() {
            self.set_param_braced_stage(ParamBracedStage::AfterName { name, kind });
            return Err(Status::Incomplete);
        }
        if self.cursor.peek() == b'}' {
            self.cursor.advance();
            self.finish_param_braced(name, kind, None)?;
            return Ok(None);
        }
        if !matches!(kind, ParameterKind::Plain) {
            // LENGTH/INDIRECT take no operator.
            return Err(self.error_status(LexErrorKind::InvalidBracedParameterOperator));
        }
        match self.param_braced_probe_operator() {
            Some(None) => {
                self.set_param_braced_stage(ParamBracedStage::AfterName { name, kind });
                Err(Status::Incomplete)
            }
            Some(Some(resolved)) => {
                Ok(Some(ParamBracedStage::ReadingOperand { name, kind: resolved, brace_depth: 0, operand: Vec::new() }))
            }
            None => Err(self.error_status(LexErrorKind::InvalidBracedParameterOperator)),
        }
    }

    /// Consumes the operator bytes and resolves the resulting kind.
    /// Returns `None` for "the current byte isn't an operator at all",
    /// `Some(None)` for "need more bytes to disambiguate `%` from `%%`
    /// (etc.)", and `Some(Some(kind))` once resolved.
    fn param_braced_probe_operator(&mut self) -> Option<Option<ParameterKind>> {
        let b = self.cursor.peek();
        match b {
            b':' => {
                if !self.cursor.has_lookahead(2) {
                    return Some(None);
                }
                let next = self.cursor.peek_ahead(1);
                let kind = match next {
                    b'-' => ParameterKind::UseDefault,
                    b'=' => ParameterKind::AssignDefault,
                    b'?' => ParameterKind::ErrorIfUnset,
                    b'+' => ParameterKind::UseAlternate,
                    _ => ParameterKind::Substring,
                };
                self.cursor.advance();
                if !matches!(kind, ParameterKind::Substring) {
                    self.cursor.advance();
                }
                Some(Some(kind))
            }
            b'-' => {
                self.cursor.advance();
                Some(Some(ParameterKind::UseDefault))
            }
            b'=' => {
                self.cursor.advance();
                Some(Some(ParameterKind::AssignDefault))
            }
            b'?' => {
                self.cursor.advance();
                Some(Some(ParameterKind::ErrorIfUnset))
            }
            b'+' => {
                self.cursor.advance();
                Some(Some(ParameterKind::UseAlternate))
            }
            b'%' => {
                if !self.cursor.has_lookahead(2) {
                    return Some(None);
                }
                self.cursor.advance();
                if self.cursor.peek() == b'%' {
                    self.cursor.advance();
                    Some(Some(ParameterKind::RemoveLargeSuffix))
                } else {
                    Some(Some(ParameterKind::RemoveSmallSuffix))
                }
            }
            b'#' => {
                if !self.cursor.has_lookahead(2) {
                    return Some(None);
                }
                self.cursor.advance();
                if self.cursor.peek() == b'#' {
                    self.cursor.advance();
                    Some(Some(ParameterKind::RemoveLargePrefix))
                } else {
                    Some(Some(ParameterKind::RemoveSmallPrefix))
                }
            }
            _ => None,
        }
    }

    fn param_braced_read_operand(
        &mut self,
        name: Arc<str>,
        kind: ParameterKind,
        mut brace_depth: u32,
        mut operand: Vec<u8>,
    ) -> Result<Option<ParamBracedStage>, Status> {
        loop {
            if self.cursor.at_end() {
                self.set_param_braced_stage(ParamBracedStage::ReadingOperand { name, kind, brace_depth, operand });
                return Err(Status::Incomplete);
            }
            let b = self.cursor.peek();
            if b == b'\\' {
                if !self.cursor.has_lookahead(2) {
                    self.set_param_braced_stage(ParamBracedStage::ReadingOperand {
                        name,
                        kind,
                        brace_depth,
                        operand,
                    });
                    return Err(Status::Incomplete);
                }
                operand.push(self.cursor.advance());
                operand.push(self.cursor.advance());
                continue;
            }
            if b == b'{' {
                brace_depth += 1;
                operand.push(self.cursor.advance());
                continue;
            }
            if b == b'}' {
                if brace_depth == 0 {
                    self.cursor.advance();
                    self.finish_param_braced(name, kind, Some(operand))?;
                    return Ok(None);
                }
                brace_depth -= 1;
                operand.push(self.cursor.advance());
                continue;
            }
            operand.push(self.cursor.advance());
        }
    }

    fn finish_param_braced(&mut self, name: Arc<str>, kind: ParameterKind, operand: Option<Vec<u8>>) -> StepResult {
        self.modes.pop();
        let in_double_quotes = enclosing_mode_is_dquote(self);
        self.append_part_to_current_word(Part::Parameter(ParameterPart {
            name,
            kind,
            operand: operand.map(|o| Arc::from(o.as_slice())),
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
    fn plain_unbraced_name() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$foo\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Parameter(p) => {
                    assert_eq!(&*p.name, "foo");
                    assert_eq!(p.kind, ParameterKind::Plain);
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn special_single_digit_positional() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"$1\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Parameter(p) => assert_eq!(&*p.name, "1"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn braced_use_default_operand() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"${foo:-bar}\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Parameter(p) => {
                    assert_eq!(&*p.name, "foo");
                    assert_eq!(p.kind, ParameterKind::UseDefault);
                    assert_eq!(p.operand.as_deref(), Some(&b"bar"[..]));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn braced_length() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"${#foo}\n");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Parameter(p) => assert_eq!(p.kind, ParameterKind::Length),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn braced_remove_large_prefix_needs_disambiguating_byte() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"${foo##");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Incomplete);
        lexer.append_input(b"bar}\n");
        assert_eq!(lexer.tokenize(&mut out), Status::Ok);
        match &out[0].kind {
            TokenKind::Word(w) => match &w.parts[0] {
                Part::Parameter(p) => assert_eq!(p.kind, ParameterKind::RemoveLargePrefix),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_braced_parameter_is_error() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"${}\n");
        let mut out = Vec::new();
        assert!(matches!(lexer.tokenize(&mut out), Status::Error(_)));
    }
}
