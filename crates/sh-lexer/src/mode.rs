//! Mode stack (spec §4.2).
//!
//! Only NORMAL and DQUOTE ever push a child mode — every other mode scans
//! its own construct verbatim to its closing delimiter using purely local
//! state (see the `scan_*` modules), so the stack rarely holds more than
//! two or three frames (e.g. `NORMAL, DQUOTE, CMD_SUBST_PAREN` for a command
//! substitution embedded in a double-quoted string).

/// Internal, resumable state for a verbatim-copy scanner that must track
/// nested quote/backtick runs while honoring backslash (CMD_SUBST_PAREN,
/// ARITH). Shared rather than duplicated per mode because the embedded-run
/// handling is identical in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InnerRun {
    #[default]
    None,
    SingleQuote,
    DoubleQuote,
    Backtick,
    /// Nested `${...}`, tracked by brace depth (starts at 1 once entered).
    BracedParam(u32),
}

#[derive(Debug, Clone, Default)]
pub struct CmdSubstParenState {
    pub depth: u32,
    pub inner: InnerRun,
    pub captured: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct BacktickState {
    pub outer_is_dquote: bool,
    pub captured: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ArithState {
    pub paren_depth: u32,
    pub inner: InnerRun,
    pub captured: Vec<u8>,
}

/// PARAM_BRACED's own sub-states (spec §4.3.5): it reads a name, then an
/// operator, then a verbatim operand, each of which can individually
/// suspend on incomplete input.
#[derive(Debug, Clone, Default)]
pub enum ParamBracedStage {
    #[default]
    Start,
    ReadingName {
        saw_hash_or_bang: Option<u8>,
    },
    /// The name (and the base kind implied by a leading `#`/`!`) is known;
    /// still need to see whether `}` or an operator follows.
    AfterName {
        name: std::sync::Arc<str>,
        kind: sh_token::ParameterKind,
    },
    ReadingOperand {
        name: std::sync::Arc<str>,
        kind: sh_token::ParameterKind,
        brace_depth: u32,
        operand: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ParamBracedState {
    pub stage: ParamBracedStage,
}

/// A scanner mode. Carries whatever per-instance state that mode's scanner
/// needs to resume correctly after an `Incomplete` suspension.
#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    Squote,
    Dquote,
    ParamUnbraced,
    ParamBraced(ParamBracedState),
    CmdSubstParen(CmdSubstParenState),
    CmdSubstBacktick(BacktickState),
    Arith(ArithState),
    HeredocBody,
}

impl Mode {
    pub fn is_normal(&self) -> bool {
        matches!(self, Mode::Normal)
    }
}

/// A stack of scanner modes (spec §4.2). An empty stack is defined to mean
/// NORMAL without actually holding a `Mode::Normal` entry, so `push`/`pop`
/// pairs can be used without ever needing to special-case the bottom frame.
#[derive(Debug, Clone, Default)]
pub struct ModeStack {
    stack: Vec<Mode>,
}

impl ModeStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, mode: Mode) {
        self.stack.push(mode);
    }

    /// Pop the top mode. Underflow (stack already empty) is a tolerated
    /// no-op that returns NORMAL, but callers SHOULD log it: it indicates a
    /// scanner imbalance (spec §4.2).
    pub fn pop(&mut self) -> Mode {
        self.stack.pop().unwrap_or_else(|| {
            #[cfg(feature = "logging")]
            tracing::warn!("mode stack underflow: pop() on an empty stack");
            Mode::Normal
        })
    }

    pub fn current(&self) -> &Mode {
        self.stack.last().unwrap_or(&Mode::Normal)
    }

    pub fn current_mut(&mut self) -> Option<&mut Mode> {
        self.stack.last_mut()
    }

    pub fn contains(&self, pred: impl Fn(&Mode) -> bool) -> bool {
        self.stack.iter().any(pred)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
