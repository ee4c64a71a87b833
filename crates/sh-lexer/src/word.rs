//! In-progress WORD assembly state and the byte classifiers NORMAL/DQUOTE
//! dispatch on (spec §4.3.1, §4.3.9).

use sh_position::Position;
use sh_token::{Part, Quoting};

use crate::operators::is_operator_start;

/// A WORD being built across possibly many `tokenize()` calls. Lives on the
/// `Lexer` so that a sub-scanner suspending mid-construct doesn't lose the
/// parts assembled so far (spec §4.3's suspension contract: "accumulate
/// into a Part that is valid-so-far").
#[derive(Debug, Clone)]
pub struct InProgressWord {
    pub start: Position,
    pub parts: Vec<Part>,
    /// Tracks spec §4.3.9's `has_equals_before_quote`: true once a
    /// top-level `=` has been seen while `still_before_quote` holds.
    pub has_equals_before_quote: bool,
    /// Becomes false the moment any quote or expansion trigger is seen;
    /// once false, a later `=` no longer sets `has_equals_before_quote`.
    pub still_before_quote: bool,
    /// True while the last Part is a Tilde Part still accepting more bytes
    /// (spec §4.3.1's tilde-prefix rule).
    pub extending_tilde: bool,
}

impl InProgressWord {
    pub fn new(start: Position) -> Self {
        Self {
            start,
            parts: Vec::new(),
            has_equals_before_quote: false,
            still_before_quote: true,
            extending_tilde: false,
        }
    }

    /// Record a top-level `=` byte. `is_leading_byte` must be true only when
    /// this `=` is the very first byte of the word (spec §4.3.9 rule 2:
    /// the `=` must be at a position greater than 0).
    pub fn note_equals(&mut self, is_leading_byte: bool) {
        if self.still_before_quote && !is_leading_byte {
            self.has_equals_before_quote = true;
        }
    }

    pub fn note_quote_or_expansion(&mut self) {
        self.still_before_quote = false;
    }
}

pub fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

pub fn is_name_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

pub fn is_name_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Special-parameter bytes valid after a bare `$` (spec §4.3.4).
pub fn is_special_param_byte(b: u8) -> bool {
    matches!(b, b'@' | b'*' | b'#' | b'?' | b'-' | b'$' | b'!') || b.is_ascii_digit()
}

/// True for bytes that end a word outside of any quote/expansion mode:
/// blanks, newline, and operator-starting bytes.
pub fn is_word_terminator_byte(b: u8) -> bool {
    is_blank(b) || b == b'\n' || is_operator_start(b)
}

/// True for `$`, `` ` ``, `'`, `"` — bytes that begin a quote or expansion
/// construct rather than plain literal text, inside a word.
pub fn is_quote_or_expansion_trigger(b: u8) -> bool {
    matches!(b, b'$' | b'`' | b'\'' | b'"')
}

/// Whether the byte is eligible to appear bare in an unquoted Literal
/// (i.e. is not itself a trigger, terminator, or backslash).
pub fn is_plain_literal_byte(b: u8) -> bool {
    !is_word_terminator_byte(b) && !is_quote_or_expansion_trigger(b) && b != b'\\'
}

/// Recompute the word-level flags from its finished Part sequence
/// (spec §3.1). `was_quoted` is true when no unquoted Literal Part
/// remains — every byte fell inside a quote or expansion boundary.
pub fn was_quoted(parts: &[Part]) -> bool {
    !parts.iter().any(|p| matches!(p, Part::Literal(l) if l.quoting == Quoting::Unquoted))
}

pub fn needs_expansion(parts: &[Part]) -> bool {
    parts.iter().any(|p| !matches!(p, Part::Literal(_)))
}

pub fn needs_field_splitting(parts: &[Part]) -> bool {
    parts.iter().any(|p| match p {
        Part::Parameter(p) => !p.in_double_quotes,
        Part::CommandSubst(p) => !p.in_double_quotes,
        Part::Arithmetic(p) => !p.in_double_quotes,
        Part::Literal(_) | Part::Tilde(_) => false,
    })
}

pub fn needs_pathname_expansion(parts: &[Part]) -> bool {
    parts.iter().any(|p| match p {
        Part::Literal(l) => l.quoting == Quoting::Unquoted,
        Part::Parameter(p) => !p.in_double_quotes,
        Part::CommandSubst(p) => !p.in_double_quotes,
        Part::Arithmetic(p) => !p.in_double_quotes,
        Part::Tilde(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_token::LiteralPart;
    use std::sync::Arc;

    fn lit(text: &str, quoting: Quoting) -> Part {
        Part::Literal(LiteralPart { text: Arc::from(text.as_bytes()), quoting })
    }

    #[test]
    fn was_quoted_false_with_any_unquoted_literal() {
        assert!(!was_quoted(&[lit("a", Quoting::Unquoted)]));
        assert!(was_quoted(&[lit("a", Quoting::Double)]));
    }

    #[test]
    fn equals_only_counted_before_first_quote() {
        let mut word = InProgressWord::new(Position::start());
        word.parts.push(lit("x", Quoting::Unquoted));
        word.note_equals(false);
        assert!(word.has_equals_before_quote);
        word.note_quote_or_expansion();
        word.has_equals_before_quote = false;
        word.note_equals(false);
        assert!(!word.has_equals_before_quote);
    }
}
