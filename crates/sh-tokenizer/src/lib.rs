//! Alias-expansion and `IO_NUMBER` promotion pass over a lexer token stream
//! (spec §4.5).
//!
//! This sits strictly downstream of `sh-lexer`: it never looks at raw bytes
//! except when re-lexing a matched alias's replacement text, which it does
//! by calling straight back into [`sh_lexer::lex_to_tokens`]. Like the
//! lexer, it is resumable — a WORD that's an all-digit Literal can't be
//! classified as `IO_NUMBER` or left alone until the *next* token (the
//! possible redirection operator) has actually arrived, so [`process`]
//! holds such a WORD back and returns `Status::Incomplete` rather than
//! guessing.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sh_error::{LexError, LexErrorKind, Status};
use sh_position::Position;
use sh_token::{Token, TokenKind, WordData};

/// Read-only alias lookup consumed by [`AliasTokenizer`] (spec §6.3).
pub trait AliasStore {
    fn has_name(&self, name: &str) -> bool;
    fn get_value(&self, name: &str) -> Option<Vec<u8>>;
}

impl AliasStore for HashMap<String, Vec<u8>> {
    fn has_name(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn get_value(&self, name: &str) -> Option<Vec<u8>> {
        self.get(name).cloned()
    }
}

/// Tunables for an [`AliasTokenizer`] (spec §5's resource bound: "alias
/// expansion depth has a hard cap (default 32)").
#[derive(Debug, Clone, Copy)]
pub struct AliasTokenizerConfig {
    pub max_expansion_depth: usize,
}

impl Default for AliasTokenizerConfig {
    fn default() -> Self {
        Self { max_expansion_depth: 32 }
    }
}

/// Tracks how many more tokens of the input sequence belong to one spliced
/// alias replacement, and whether crossing that boundary should force
/// command position back on (the POSIX "trailing blank" rule). Needed
/// because the rule applies to the token immediately *after* the whole
/// replacement, not the first spliced token — and replacements can nest
/// when a spliced token is itself alias-eligible.
#[derive(Debug)]
struct ExpansionFrame {
    remaining: usize,
    trailing_blank: bool,
}

/// The alias tokenizer (spec §4.5, §6.2).
#[derive(Debug)]
pub struct AliasTokenizer<'a, S: AliasStore> {
    store: &'a S,
    config: AliasTokenizerConfig,
    pending: VecDeque<Token>,
    at_command_position: bool,
    force_command_position: bool,
    expansion_stack: Vec<Arc<str>>,
    frames: Vec<ExpansionFrame>,
    error: Option<LexError>,
}

impl<'a, S: AliasStore> AliasTokenizer<'a, S> {
    pub fn create(store: &'a S) -> Self {
        Self::with_config(store, AliasTokenizerConfig::default())
    }

    pub fn with_config(store: &'a S, config: AliasTokenizerConfig) -> Self {
        Self {
            store,
            config,
            pending: VecDeque::new(),
            at_command_position: true,
            force_command_position: false,
            expansion_stack: Vec::new(),
            frames: Vec::new(),
            error: None,
        }
    }

    /// Consume `input` (left empty afterward), appending fully resolved
    /// tokens to `output` (spec §6.2). Returns `Incomplete` when the last
    /// buffered token is an `IO_NUMBER` candidate and no lookahead token has
    /// arrived yet to confirm or rule out the promotion.
    pub fn process(&mut self, input: &mut Vec<Token>, output: &mut Vec<Token>) -> Status {
        self.pending.extend(input.drain(..));

        while let Some(tok) = self.pending.pop_front() {
            let effective_command_position = self.force_command_position || self.at_command_position;
            self.force_command_position = false;

            if effective_command_position {
                if let TokenKind::Word(data) = &tok.kind {
                    if let Some(name) = alias_candidate(data, &self.expansion_stack) {
                        if let Some(value) = self.store.get_value(&name) {
                            match self.expand(name, value, tok.span.start) {
                                Ok(()) => continue,
                                Err(status) => return status,
                            }
                        }
                    }
                }
            }

            if is_io_number_candidate(&tok) && self.pending.is_empty() {
                self.pending.push_front(tok);
                return Status::Incomplete;
            }

            let next_is_redirection = self.pending.front().map(Token::is_redirection_operator).unwrap_or(false);
            let enters_command_position = tok.enters_command_position();
            output.push(promote_io_number(tok, next_is_redirection));

            if enters_command_position {
                self.expansion_stack.clear();
            }
            self.at_command_position = enters_command_position;
            note_consumed(&mut self.frames, &mut self.force_command_position);
        }

        Status::Ok
    }

    fn expand(&mut self, name: Arc<str>, value: Vec<u8>, at: Position) -> Result<(), Status> {
        if self.expansion_stack.len() >= self.config.max_expansion_depth {
            return Err(self.raise(LexErrorKind::AliasExpansionDepthExceeded, at));
        }

        let mut replacement = Vec::new();
        match sh_lexer::lex_to_tokens(&value, &mut replacement) {
            Status::Ok => {}
            Status::InternalError(err) => return Err(Status::InternalError(err)),
            Status::Incomplete => {
                return Err(self.raise(
                    LexErrorKind::AliasReLexFailed {
                        cause: "alias value is not a self-contained, fully closed construct".to_string(),
                    },
                    at,
                ));
            }
            Status::Error(cause) => {
                return Err(self.raise(LexErrorKind::AliasReLexFailed { cause: cause.to_string() }, at));
            }
        }

        let trailing_blank = matches!(value.last(), Some(b' ') | Some(b'\t'));
        let replacement_len = replacement.len();
        for token in replacement.into_iter().rev() {
            self.pending.push_front(token);
        }
        self.expansion_stack.push(name);
        push_expansion_frame(&mut self.frames, replacement_len, trailing_blank, &mut self.force_command_position);
        self.at_command_position = true;
        Ok(())
    }

    fn raise(&mut self, kind: LexErrorKind, at: Position) -> Status {
        let err = LexError::new(kind, at);
        self.error = Some(err.clone());
        Status::Error(err)
    }

    pub fn get_error(&self) -> Option<&LexError> {
        self.error.as_ref()
    }

    /// Clear everything, restoring the state of [`AliasTokenizer::create`]
    /// (mirrors `sh_lexer::Lexer::reset`).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.at_command_position = true;
        self.force_command_position = false;
        self.expansion_stack.clear();
        self.frames.clear();
        self.error = None;
    }
}

/// Closing an expansion frame counts as consuming one slot of whatever
/// frame spliced it in, so closing can cascade outward.
fn note_consumed(frames: &mut Vec<ExpansionFrame>, force_command_position: &mut bool) {
    let finished = match frames.last_mut() {
        Some(top) => {
            top.remaining -= 1;
            top.remaining == 0
        }
        None => return,
    };
    if finished {
        if let Some(done) = frames.pop() {
            if done.trailing_blank {
                *force_command_position = true;
            }
        }
        note_consumed(frames, force_command_position);
    }
}

fn push_expansion_frame(
    frames: &mut Vec<ExpansionFrame>,
    remaining: usize,
    trailing_blank: bool,
    force_command_position: &mut bool,
) {
    if remaining == 0 {
        if trailing_blank {
            *force_command_position = true;
        }
        note_consumed(frames, force_command_position);
    } else {
        frames.push(ExpansionFrame { remaining, trailing_blank });
    }
}

/// The four eligibility conditions for alias lookup (spec §4.5), minus the
/// command-position check (the caller already knows that).
fn alias_candidate(data: &WordData, expansion_stack: &[Arc<str>]) -> Option<Arc<str>> {
    if data.was_quoted || data.parts.len() != 1 {
        return None;
    }
    let literal = data.parts[0].as_unquoted_literal()?;
    let text = std::str::from_utf8(&literal.text).ok()?;
    if expansion_stack.iter().any(|seen| seen.as_ref() == text) {
        return None;
    }
    Some(Arc::from(text))
}

fn is_io_number_candidate(tok: &Token) -> bool {
    match &tok.kind {
        TokenKind::Word(data) if data.parts.len() == 1 => data
            .parts[0]
            .as_unquoted_literal()
            .map(|lit| !lit.text.is_empty() && lit.text.iter().all(u8::is_ascii_digit))
            .unwrap_or(false),
        _ => false,
    }
}

/// Rewrite a WORD in place to `IO_NUMBER` if it qualifies (spec §4.5); any
/// other token, or a WORD that doesn't qualify, passes through unchanged.
fn promote_io_number(tok: Token, next_is_redirection: bool) -> Token {
    if !next_is_redirection {
        return tok;
    }
    match &tok.kind {
        TokenKind::Word(data) if data.parts.len() == 1 => {
            let Some(literal) = data.parts[0].as_unquoted_literal() else {
                return tok;
            };
            if literal.text.is_empty() || !literal.text.iter().all(u8::is_ascii_digit) {
                return tok;
            }
            let mut value: u64 = 0;
            for &b in literal.text.iter() {
                value = value.saturating_mul(10).saturating_add((b - b'0') as u64);
            }
            Token::new(TokenKind::IoNumber(value), tok.span)
        }
        _ => tok,
    }
}
