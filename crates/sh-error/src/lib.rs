//! Status codes and error payloads for the tokenization core (spec §7).
//!
//! Every sub-scanner, the lexer driver, and the alias tokenizer return one
//! of the same four outcomes: `Ok` (progress made, zero or more tokens
//! produced), `Incomplete` (more input needed, state is resumable),
//! `Err(LexError)` (a syntax error the caller should surface), or
//! `Err(LexError::Internal(..))` (an invariant violation — a bug, not a
//! user-facing condition, but still propagated rather than panicking).

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use sh_position::Position;
use thiserror::Error;

/// The outcome of one step of scanning. Not a `Result` by itself because
/// `Incomplete` is not an error (spec §7: "Not an error; the caller appends
/// more bytes and retries") — callers that want `?`-composable code should
/// match on this explicitly or use [`ScanOutcome::into_result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Progress was made; zero or more tokens were appended to the output.
    Ok,
    /// The cursor reached end-of-input mid-construct. State is resumable:
    /// append more bytes and call again.
    Incomplete,
}

/// A syntax error detected during tokenization, carrying the line/column at
/// the cursor when it was raised (spec §7: "User-visible error payloads
/// include the line and column recorded at the cursor at the moment the
/// error was raised").
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{position:?}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

impl LexError {
    pub fn new(kind: LexErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// The taxonomy of syntax errors the core can raise (spec §7).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    /// EOF reached with a single/double quote still open and no more input
    /// is coming (distinct from `Incomplete`, which is what's returned
    /// while streaming is still possible).
    #[error("unterminated quote")]
    UnterminatedQuote,
    /// `$((...))` with parentheses that never balance out.
    #[error("unbalanced parentheses in arithmetic expansion")]
    UnbalancedArithmeticParens,
    /// `${}` with no parameter name.
    #[error("empty parameter name in braced expansion")]
    EmptyBracedParameter,
    /// An operator byte inside `${...}` that doesn't match any recognized
    /// expansion operator.
    #[error("invalid operator in braced parameter expansion")]
    InvalidBracedParameterOperator,
    /// A byte inside `${...}` that can't appear in a parameter name or
    /// operator position.
    #[error("invalid character in braced parameter expansion")]
    InvalidBracedParameterChar,
    /// Alias re-entry exceeded the tokenizer's depth cap (spec §4.5).
    #[error("alias expansion depth exceeded")]
    AliasExpansionDepthExceeded,
    /// The alias tokenizer's re-lex of a replacement text failed.
    #[error("failed to re-lex alias expansion: {cause}")]
    AliasReLexFailed { cause: String },
}

/// Invariant violations: programmer-logic failures, not user syntax errors
/// (spec §7's `InternalError`). These should never happen; when they do,
/// callers propagate rather than silently recovering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("entered HEREDOC_BODY mode with an empty heredoc queue")]
    HeredocBodyWithEmptyQueue,
    #[error("mode stack contains an unrecognized mode")]
    UnknownMode,
}

/// The unified status returned by sub-scanners, the lexer driver, and the
/// alias tokenizer (spec §4.3, §6.1, §6.2: `{OK, ERROR, INCOMPLETE,
/// INTERNAL_ERROR}`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Status {
    #[error("ok")]
    Ok,
    #[error("incomplete")]
    Incomplete,
    #[error(transparent)]
    Error(#[from] LexError),
    #[error(transparent)]
    InternalError(#[from] InternalError),
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Status::Incomplete)
    }
}

impl From<ScanStatus> for Status {
    fn from(s: ScanStatus) -> Self {
        match s {
            ScanStatus::Ok => Status::Ok,
            ScanStatus::Incomplete => Status::Incomplete,
        }
    }
}

/// Convenience alias for scanner-internal code that wants `?` over
/// genuine errors while handling `Incomplete`/`Ok` as plain values.
pub type ScanResult = Result<ScanStatus, LexError>;
