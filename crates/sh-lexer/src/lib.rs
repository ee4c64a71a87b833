//! Mode-stack driven lexer for POSIX shell input (spec §4).
//!
//! [`Lexer`] owns an accumulating byte buffer, a stack of scanner modes,
//! and the FIFO heredoc queue. Callers stream bytes in with
//! [`Lexer::append_input`] and drain tokens with [`Lexer::tokenize`]; the
//! `Incomplete` status is a normal outcome, not an error — it means "call
//! again once more bytes have arrived" (see the module docs on
//! [`sh_error::Status`]).
//!
//! Only NORMAL and DQUOTE ever delegate to a child mode on the stack
//! (SQUOTE, the parameter/command-substitution/arithmetic modes); those
//! children scan their own construct verbatim to a closing delimiter using
//! purely local state, so they never push further children.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod assignment;
mod cursor;
mod dollar;
mod mode;
mod operators;
mod scan_arith;
mod scan_cmdsubst;
mod scan_heredoc;
mod scan_normal;
mod scan_param;
mod scan_quote;
mod word;

use std::sync::Arc;

use sh_error::{InternalError, LexError, Status};
use sh_heredoc::HeredocQueue;
use sh_token::{Part, Token, TokenKind};

pub use cursor::ByteCursor;
pub use mode::{ArithState, BacktickState, CmdSubstParenState, InnerRun, Mode, ModeStack, ParamBracedStage, ParamBracedState};
pub use word::InProgressWord;

/// Tunables for a [`Lexer`] instance (spec §9's "Configuration" gap; see
/// `SPEC_FULL.md`). There is deliberately very little here: almost all of
/// the lexer's behavior is fixed by the grammar it implements.
#[derive(Debug, Clone, Copy)]
pub struct LexerConfig {
    /// If true, `tokenize` calls [`ByteCursor::drop_processed_prefix`]
    /// automatically whenever it returns to NORMAL mode with no
    /// in-progress word and an empty heredoc queue — the only point at
    /// which no live span can still reference an earlier buffer offset.
    /// Off by default: callers that want positions to stay meaningful for
    /// diagnostics across the whole session can leave this alone and call
    /// `cursor` reclamation themselves if they need it.
    pub auto_drop_processed_prefix: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self { auto_drop_processed_prefix: false }
    }
}

/// Bookkeeping for a `<<`/`<<-` seen in NORMAL mode: the next WORD token to
/// be finalized is both emitted normally *and* consumed as the heredoc's
/// delimiter (spec §8 scenario 4).
#[derive(Debug, Clone, Copy)]
struct PendingHeredocOp {
    strip_tabs: bool,
    token_index: usize,
}

/// The lexer (spec §4.4, §6.1).
#[derive(Debug)]
pub struct Lexer {
    cursor: ByteCursor,
    modes: ModeStack,
    heredocs: HeredocQueue,
    config: LexerConfig,
    current_word: Option<InProgressWord>,
    pending_heredoc: Option<PendingHeredocOp>,
    /// Raw bytes accumulated so far for the heredoc body currently being
    /// read, valid-so-far across `Incomplete` suspensions (spec §4.3.10).
    heredoc_body: Vec<u8>,
    error: Option<LexError>,
    tokens_emitted: usize,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::create()
    }
}

pub(crate) enum StepOutcome {
    /// At least zero tokens were appended and/or cursor state advanced;
    /// the driver keeps looping unless tokens were actually produced.
    Progress,
    /// NORMAL mode reached true end-of-input with nothing outstanding.
    Eof,
}

pub(crate) type StepResult = Result<StepOutcome, Status>;

impl Lexer {
    /// Construct a fresh lexer with default configuration (spec §6.1).
    pub fn create() -> Self {
        Self::with_config(LexerConfig::default())
    }

    pub fn with_config(config: LexerConfig) -> Self {
        Self {
            cursor: ByteCursor::new(),
            modes: ModeStack::new(),
            heredocs: HeredocQueue::new(),
            config,
            current_word: None,
            pending_heredoc: None,
            heredoc_body: Vec::new(),
            error: None,
            tokens_emitted: 0,
        }
    }

    /// Append freshly-arrived bytes (deep copy; spec §6.1).
    pub fn append_input(&mut self, bytes: &[u8]) {
        self.cursor.append_input(bytes);
    }

    /// Drain newly produced tokens into `out`. Returns `Status::Ok` both
    /// when tokens were produced and when EOF was reached with nothing
    /// more to give (the caller distinguishes the two by whether `out`
    /// grew) — matching spec §4.4's "EOF is not appended, its arrival is
    /// the signal tokenization is complete."
    pub fn tokenize(&mut self, out: &mut Vec<Token>) -> Status {
        loop {
            let before = out.len();
            match self.step(out) {
                Ok(StepOutcome::Progress) => {
                    if out.len() > before {
                        self.maybe_reclaim_buffer();
                        return Status::Ok;
                    }
                }
                Ok(StepOutcome::Eof) => {
                    self.maybe_reclaim_buffer();
                    return Status::Ok;
                }
                Err(status) => {
                    if let Status::Error(ref e) = status {
                        self.error = Some(e.clone());
                    }
                    return status;
                }
            }
        }
    }

    fn maybe_reclaim_buffer(&mut self) {
        if self.config.auto_drop_processed_prefix
            && self.modes.depth() == 0
            && self.current_word.is_none()
            && self.heredocs.is_empty()
        {
            self.cursor.drop_processed_prefix();
        }
    }

    fn step(&mut self, out: &mut Vec<Token>) -> StepResult {
        match self.modes.current() {
            Mode::Normal => self.scan_normal(out),
            Mode::Squote => self.scan_squote(out),
            Mode::Dquote => self.scan_dquote(out),
            Mode::ParamUnbraced => self.scan_param_unbraced(out),
            Mode::ParamBraced(_) => self.scan_param_braced(out),
            Mode::CmdSubstParen(_) => self.scan_cmd_subst_paren(out),
            Mode::CmdSubstBacktick(_) => self.scan_cmd_subst_backtick(out),
            Mode::Arith(_) => self.scan_arith(out),
            Mode::HeredocBody => self.scan_heredoc_body(out),
        }
    }

    fn push_token(&mut self, token: Token, out: &mut Vec<Token>) {
        self.tokens_emitted += 1;
        out.push(token);
    }

    /// The most recent syntax error, if `tokenize` returned `Error` (spec §6.1).
    pub fn get_error(&self) -> Option<&LexError> {
        self.error.as_ref()
    }

    /// Clear everything, restoring the exact state of [`Lexer::create`]
    /// (decision recorded in `DESIGN.md`).
    pub fn reset(&mut self) {
        let config = self.config;
        *self = Self::with_config(config);
    }

    pub(crate) fn raise_internal_error(err: InternalError) -> StepResult {
        Err(Status::InternalError(err))
    }

    pub(crate) fn raise_error(&mut self, kind: sh_error::LexErrorKind) -> StepResult {
        Err(self.error_status(kind))
    }

    /// Same as [`Lexer::raise_error`] but for call sites building a
    /// `Result<_, Status>` other than `StepResult` (the braced-parameter
    /// stage machine, which returns the next stage rather than a
    /// `StepOutcome`).
    pub(crate) fn error_status(&mut self, kind: sh_error::LexErrorKind) -> Status {
        let err = LexError::new(kind, self.cursor.position());
        self.error = Some(err.clone());
        Status::Error(err)
    }

    /// Append a finished expansion Part to the word currently being
    /// assembled by NORMAL or DQUOTE, coalescing is not applicable here
    /// since expansion Parts are never merged with their neighbors
    /// (spec §3.2).
    pub(crate) fn append_part_to_current_word(&mut self, part: Part) {
        let word = self
            .current_word
            .get_or_insert_with(|| InProgressWord::new(self.cursor.position()));
        word.note_quote_or_expansion();
        word.parts.push(part);
    }
}

/// One-shot convenience: lex a complete, final buffer in a single call
/// (spec §6.1). Equivalent to `create` + `append_input` + `tokenize` in a
/// loop until EOF or a non-`Ok` status.
pub fn lex_to_tokens(bytes: &[u8], out: &mut Vec<Token>) -> Status {
    let mut lexer = Lexer::create();
    lexer.append_input(bytes);
    loop {
        let before = out.len();
        match lexer.tokenize(out) {
            Status::Ok if out.len() == before => return Status::Ok,
            Status::Ok => continue,
            other => return other,
        }
    }
}

pub(crate) fn arc_str_lossy(bytes: &[u8]) -> Arc<str> {
    Arc::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_simple_word_to_eof() {
        let mut out = Vec::new();
        let status = lex_to_tokens(b"echo\n", &mut out);
        assert_eq!(status, Status::Ok);
        assert!(matches!(out[0].kind, TokenKind::Word(_)));
        assert!(matches!(out[1].kind, TokenKind::Newline));
    }

    #[test]
    fn reset_restores_fresh_state() {
        let mut lexer = Lexer::create();
        lexer.append_input(b"'unterminated");
        let mut out = Vec::new();
        assert_eq!(lexer.tokenize(&mut out), Status::Incomplete);
        lexer.reset();
        let mut out2 = Vec::new();
        lexer.append_input(b"x\n");
        assert_eq!(lexer.tokenize(&mut out2), Status::Ok);
        assert!(matches!(out2[0].kind, TokenKind::Word(_)));
    }
}
