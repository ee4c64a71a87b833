//! Token and Part data model for the POSIX shell tokenization core.
//!
//! A [`Token`] pairs a [`TokenKind`] with the [`Span`] it occupies in the
//! source. A `WORD` token is not flat text: it is an ordered sequence of
//! [`Part`]s (literal text, parameter expansions, command substitutions,
//! arithmetic expansions, tilde expansions), because expansion boundaries
//! have to survive into the token stream for the consumer (a parser) to
//! resolve later. Raw captured text is kept as bytes, not `str`: the core
//! treats input as 8-bit ASCII-compatible bytes and multi-byte sequences
//! pass through literally inside string bodies.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use std::sync::Arc;

use sh_position::Span;

/// Owned, cheaply-cloneable byte string used for raw captured source text.
pub type RawBytes = Arc<[u8]>;

/// A token produced by the lexer (or, for alias-expanded/IO_NUMBER-promoted
/// tokens, by the tokenizer pass on top of it).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// True for any of the redirection operators that make a preceding
    /// all-digit WORD eligible for IO_NUMBER promotion (spec §4.5).
    pub fn is_redirection_operator(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Less
                | TokenKind::Greater
                | TokenKind::Dgreat
                | TokenKind::Dless
                | TokenKind::DlessDash
                | TokenKind::Lessand
                | TokenKind::Greatand
                | TokenKind::Lessgreat
                | TokenKind::Clobber
        )
    }

    /// True for tokens that put the tokenizer back into command position
    /// (spec §4.5): newline, list/pipeline separators, and the reserved
    /// words that always precede a command.
    pub fn enters_command_position(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Newline
                | TokenKind::Semi
                | TokenKind::Amper
                | TokenKind::Pipe
                | TokenKind::AndIf
                | TokenKind::OrIf
                | TokenKind::Lparen
                | TokenKind::Dsemi
                | TokenKind::If
                | TokenKind::Then
                | TokenKind::Else
                | TokenKind::Elif
                | TokenKind::Do
                | TokenKind::While
                | TokenKind::Until
                | TokenKind::For
                | TokenKind::Case
                | TokenKind::Lbrace
        )
    }
}

/// Token classification. `Eof` is never appended to the lexer's output
/// stream — its arrival is signaled by `tokenize` returning with no new
/// tokens, not by a token value — so the lexer itself only ever emits
/// `Word`, `AssignmentWord`, `IoLocation`, the operator variants, `Newline`,
/// and `EndOfHeredoc`. The reserved-word variants exist for the parser's
/// post-lexing promotion of command-position WORDs (spec §3.1, §9: reserved
/// words are a grammar-context concept, not a lexical one).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Eof,

    /// `WORD`: an ordered sequence of parts plus word-level expansion flags.
    Word(WordData),

    /// `ASSIGNMENT_WORD`: `name=value...`, produced by promoting a WORD at
    /// finalization time (spec §4.3.9).
    AssignmentWord(AssignmentWordData),

    /// `IO_NUMBER`: a redirection-prefix digit run, produced only by the
    /// tokenizer's promotion pass (spec §4.5), never by the lexer directly.
    IoNumber(u64),

    /// `IO_LOCATION`: the inner text of a `{name}` preceding a redirection
    /// operator (spec §4.3.1 item 6).
    IoLocation(Arc<str>),

    // Operators, longest-match (spec §4.3.1 item 4).
    AndIf,
    OrIf,
    Dsemi,
    Dless,
    Dgreat,
    Lessand,
    Greatand,
    Lessgreat,
    DlessDash,
    Clobber,
    Pipe,
    Semi,
    Amper,
    Lparen,
    Rparen,
    Greater,
    Less,

    // Reserved words. Never produced by the lexer; see module docs.
    If,
    Then,
    Else,
    Elif,
    Fi,
    Do,
    Done,
    Case,
    Esac,
    While,
    Until,
    For,
    In,
    Bang,
    Lbrace,
    Rbrace,

    Newline,

    /// `END_OF_HEREDOC`: the body of a heredoc queued earlier on the same
    /// logical line, emitted once the heredoc scheduler consumes it
    /// (spec §4.3.10).
    EndOfHeredoc(HeredocBodyData),
}

/// Payload for a `WORD` token (spec §3.1 invariants, §3.2 Part invariants).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WordData {
    pub parts: Vec<Part>,
    /// Any part needs evaluation (parameter/command/arithmetic/tilde present).
    pub needs_expansion: bool,
    /// Unquoted expansions in this word are subject to field splitting.
    pub needs_field_splitting: bool,
    /// Unquoted parts in this word are subject to pathname expansion.
    pub needs_pathname_expansion: bool,
    /// The WORD was quoted as a whole (single Part, that Part is quoted, or
    /// every byte of the word fell inside a quote/expansion boundary).
    pub was_quoted: bool,
    /// Lexer-internal bookkeeping: true if a top-level `=` was seen before
    /// any quote or expansion trigger, consumed by assignment-word
    /// promotion (spec §4.3.9) and otherwise meaningless downstream.
    pub has_equals_before_quote: bool,
}

impl WordData {
    /// An empty quoted string: one empty, quoted Literal Part (spec §3.1
    /// invariant: a WORD always has at least one Part, except it may
    /// represent `""`/`''` with a single empty-text Literal).
    pub fn empty_quoted(quoting: Quoting) -> Self {
        WordData {
            parts: vec![Part::Literal(LiteralPart { text: Arc::from(&b""[..]), quoting })],
            needs_expansion: false,
            needs_field_splitting: false,
            needs_pathname_expansion: false,
            was_quoted: true,
            has_equals_before_quote: false,
        }
    }
}

/// Payload for an `ASSIGNMENT_WORD` token.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentWordData {
    pub name: Arc<str>,
    pub value: Vec<Part>,
}

/// Payload for an `END_OF_HEREDOC` token.
#[derive(Debug, Clone, PartialEq)]
pub struct HeredocBodyData {
    pub delimiter: Arc<str>,
    pub body: RawBytes,
    pub delimiter_was_quoted: bool,
}

impl HeredocBodyData {
    /// A quoted delimiter suppresses expansion of the body (spec §4.3.10).
    pub fn needs_expansion(&self) -> bool {
        !self.delimiter_was_quoted
    }
}

/// Whether a Literal's text was captured inside a quote construct. The
/// single/double flags in spec §3.2 are mutually exclusive, so this is
/// modeled as one enum rather than two bools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Unquoted,
    Single,
    Double,
}

impl Quoting {
    pub fn is_quoted(self) -> bool {
        !matches!(self, Quoting::Unquoted)
    }
}

/// A semantic fragment of a WORD (spec §3.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Literal(LiteralPart),
    Parameter(ParameterPart),
    CommandSubst(CommandSubstPart),
    Arithmetic(ArithmeticPart),
    Tilde(TildePart),
}

impl Part {
    /// True for an unquoted Literal — the only Part kind eligible for
    /// coalescing (spec §3.2 invariant) and the only kind eligible for
    /// alias lookup / IO_NUMBER promotion (spec §4.5).
    pub fn as_unquoted_literal(&self) -> Option<&LiteralPart> {
        match self {
            Part::Literal(lit) if lit.quoting == Quoting::Unquoted => Some(lit),
            _ => None,
        }
    }

    /// Whether this part appeared inside double quotes, for the quoting
    /// flags carried by Parameter/CommandSubst/Arithmetic/Tilde parts
    /// (spec §3.2). Tilde is always unquoted.
    pub fn in_double_quotes(&self) -> bool {
        match self {
            Part::Literal(lit) => lit.quoting == Quoting::Double,
            Part::Parameter(p) => p.in_double_quotes,
            Part::CommandSubst(p) => p.in_double_quotes,
            Part::Arithmetic(p) => p.in_double_quotes,
            Part::Tilde(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralPart {
    pub text: RawBytes,
    pub quoting: Quoting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Plain,
    Length,
    Substring,
    UseDefault,
    AssignDefault,
    ErrorIfUnset,
    UseAlternate,
    RemoveSmallPrefix,
    RemoveLargePrefix,
    RemoveSmallSuffix,
    RemoveLargeSuffix,
    Indirect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterPart {
    pub name: Arc<str>,
    pub kind: ParameterKind,
    /// The operand text for kinds that carry one (USE_DEFAULT, SUBSTRING,
    /// REMOVE_*, ...). Stored verbatim, not re-lexed (spec §4.3.5).
    pub operand: Option<RawBytes>,
    pub in_double_quotes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSubstPart {
    pub text: RawBytes,
    pub in_double_quotes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticPart {
    pub text: RawBytes,
    pub in_double_quotes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TildePart {
    /// Text after the tilde up to (not including) the terminator; empty
    /// for a bare `~`. Always unquoted (spec §3.2).
    pub text: RawBytes,
}

/// Push raw bytes onto a Part sequence, coalescing with a trailing Literal
/// of the same quoting (spec §3.2: adjacent Literals with the same quote
/// flag must be coalesced; Literals with differing quote flags stay
/// separate).
pub fn push_literal_byte(parts: &mut Vec<Part>, quoting: Quoting, byte: u8) {
    if let Some(Part::Literal(last)) = parts.last_mut() {
        if last.quoting == quoting {
            let mut buf = last.text.to_vec();
            buf.push(byte);
            last.text = Arc::from(buf);
            return;
        }
    }
    parts.push(Part::Literal(LiteralPart { text: Arc::from(vec![byte]), quoting }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_adjacent_unquoted_literals() {
        let mut parts = Vec::new();
        push_literal_byte(&mut parts, Quoting::Unquoted, b'a');
        push_literal_byte(&mut parts, Quoting::Unquoted, b'b');
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].as_unquoted_literal().unwrap().text.as_ref(), b"ab");
    }

    #[test]
    fn does_not_coalesce_across_quote_boundary() {
        let mut parts = Vec::new();
        push_literal_byte(&mut parts, Quoting::Unquoted, b'a');
        push_literal_byte(&mut parts, Quoting::Double, b'b');
        push_literal_byte(&mut parts, Quoting::Double, b'c');
        assert_eq!(parts.len(), 2);
        match &parts[1] {
            Part::Literal(lit) => {
                assert_eq!(lit.text.as_ref(), b"bc");
                assert_eq!(lit.quoting, Quoting::Double);
            }
            _ => panic!("expected literal"),
        }
    }
}
