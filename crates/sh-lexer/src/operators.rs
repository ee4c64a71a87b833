//! Operator longest-match table (spec §4.3.1 item 4).

use sh_token::TokenKind;

use crate::cursor::ByteCursor;

/// Outcome of probing the cursor for an operator.
pub enum OperatorMatch {
    /// A complete operator was matched; consume `len` bytes and emit `kind`.
    Found { len: usize, kind: TokenKind },
    /// The bytes seen so far are a strict prefix of a longer operator and
    /// more input is needed to disambiguate (e.g. `<` could still become
    /// `<<` or `<<-` or `<&`).
    NeedMore,
    /// The byte at the cursor does not start any operator.
    NotAnOperator,
}

/// Probe for the longest operator starting at the cursor, without
/// consuming anything. Up to 3 bytes of lookahead (`<<-` is the longest).
pub fn match_operator(cursor: &ByteCursor) -> OperatorMatch {
    let b0 = cursor.peek();
    match b0 {
        b'&' => match cursor.peek_ahead(1) {
            b'&' => found(2, TokenKind::AndIf),
            _ if !cursor.has_lookahead(2) => OperatorMatch::NeedMore,
            _ => found(1, TokenKind::Amper),
        },
        b'|' => match cursor.peek_ahead(1) {
            b'|' => found(2, TokenKind::OrIf),
            _ if !cursor.has_lookahead(2) => OperatorMatch::NeedMore,
            _ => found(1, TokenKind::Pipe),
        },
        b';' => match cursor.peek_ahead(1) {
            b';' => found(2, TokenKind::Dsemi),
            _ if !cursor.has_lookahead(2) => OperatorMatch::NeedMore,
            _ => found(1, TokenKind::Semi),
        },
        b'(' => found(1, TokenKind::Lparen),
        b')' => found(1, TokenKind::Rparen),
        b'<' => match cursor.peek_ahead(1) {
            b'<' => {
                if cursor.peek_ahead(2) == b'-' {
                    found(3, TokenKind::DlessDash)
                } else if !cursor.has_lookahead(3) {
                    OperatorMatch::NeedMore
                } else {
                    found(2, TokenKind::Dless)
                }
            }
            b'&' => found(2, TokenKind::Lessand),
            b'>' => found(2, TokenKind::Lessgreat),
            _ if !cursor.has_lookahead(2) => OperatorMatch::NeedMore,
            _ => found(1, TokenKind::Less),
        },
        b'>' => match cursor.peek_ahead(1) {
            b'>' => found(2, TokenKind::Dgreat),
            b'&' => found(2, TokenKind::Greatand),
            b'|' => found(2, TokenKind::Clobber),
            _ if !cursor.has_lookahead(2) => OperatorMatch::NeedMore,
            _ => found(1, TokenKind::Greater),
        },
        _ => OperatorMatch::NotAnOperator,
    }
}

fn found(len: usize, kind: TokenKind) -> OperatorMatch {
    OperatorMatch::Found { len, kind }
}

/// Whether this byte can ever start an operator, used by the word scanner
/// to decide when a bare byte terminates the current word.
pub fn is_operator_start(b: u8) -> bool {
    matches!(b, b'&' | b'|' | b';' | b'<' | b'>' | b'(' | b')')
}
