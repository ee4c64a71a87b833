//! `$`-dispatch shared between NORMAL and DQUOTE word assembly
//! (spec §4.3.1 item 5, §4.3.3: "same dispatch as NORMAL").

use crate::cursor::ByteCursor;
use crate::mode::{ArithState, CmdSubstParenState, Mode, ParamBracedState};
use crate::word::{is_name_start, is_special_param_byte};

/// Outcome of examining the byte(s) after a `$` at the cursor.
pub enum DollarDispatch {
    /// No expansion construct follows; keep the `$` itself as a literal
    /// byte. Nothing was consumed.
    Literal,
    /// Not enough lookahead yet to tell which construct this is. Nothing
    /// was consumed.
    NeedMore,
    /// The construct's opening bytes (`$`, `${`, `$(`, or `$((`) have
    /// already been consumed; push this mode.
    Enter(Mode),
}

/// Called with the cursor positioned at `$`. Consumes the opening bytes of
/// whichever construct follows, or nothing at all for `Literal`/`NeedMore`.
pub fn dispatch_dollar(cursor: &mut ByteCursor) -> DollarDispatch {
    if !cursor.has_lookahead(2) {
        return DollarDispatch::NeedMore;
    }
    match cursor.peek_ahead(1) {
        b'{' => {
            cursor.advance();
            cursor.advance();
            DollarDispatch::Enter(Mode::ParamBraced(ParamBracedState::default()))
        }
        b'(' => {
            if !cursor.has_lookahead(3) {
                return DollarDispatch::NeedMore;
            }
            if cursor.peek_ahead(2) == b'(' {
                cursor.advance();
                cursor.advance();
                cursor.advance();
                DollarDispatch::Enter(Mode::Arith(ArithState::default()))
            } else {
                cursor.advance();
                cursor.advance();
                DollarDispatch::Enter(Mode::CmdSubstParen(CmdSubstParenState::default()))
            }
        }
        b if is_name_start(b) || is_special_param_byte(b) => {
            cursor.advance();
            DollarDispatch::Enter(Mode::ParamUnbraced)
        }
        _ => DollarDispatch::Literal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor_of(bytes: &[u8]) -> ByteCursor {
        let mut c = ByteCursor::new();
        c.append_input(bytes);
        c
    }

    #[test]
    fn dispatches_braced_param() {
        let mut c = cursor_of(b"${x}");
        assert!(matches!(dispatch_dollar(&mut c), DollarDispatch::Enter(Mode::ParamBraced(_))));
        assert_eq!(c.peek(), b'x');
    }

    #[test]
    fn distinguishes_arith_from_cmd_subst() {
        let mut c = cursor_of(b"$((1))");
        assert!(matches!(dispatch_dollar(&mut c), DollarDispatch::Enter(Mode::Arith(_))));

        let mut c2 = cursor_of(b"$(echo)");
        assert!(matches!(dispatch_dollar(&mut c2), DollarDispatch::Enter(Mode::CmdSubstParen(_))));
    }

    #[test]
    fn bare_dollar_followed_by_punctuation_is_literal() {
        let mut c = cursor_of(b"$ ");
        assert!(matches!(dispatch_dollar(&mut c), DollarDispatch::Literal));
        assert_eq!(c.peek(), b'$');
    }

    #[test]
    fn ambiguous_paren_lookahead_needs_more() {
        let mut c = cursor_of(b"$(");
        assert!(matches!(dispatch_dollar(&mut c), DollarDispatch::NeedMore));
    }
}
