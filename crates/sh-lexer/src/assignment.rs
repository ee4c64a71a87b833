//! Assignment-word promotion (spec §4.3.9).

use std::sync::Arc;

use sh_token::{AssignmentWordData, LiteralPart, Part, Quoting};

/// Try to promote a finished WORD's parts into an ASSIGNMENT_WORD payload.
/// Returns the original parts back on failure so the caller can still emit
/// a plain WORD.
pub fn try_promote(parts: Vec<Part>, has_equals_before_quote: bool) -> Result<AssignmentWordData, Vec<Part>> {
    if !has_equals_before_quote {
        return Err(parts);
    }
    let first = match parts.first() {
        Some(Part::Literal(lit)) if lit.quoting == Quoting::Unquoted => lit,
        _ => return Err(parts),
    };
    let text = first.text.clone();
    let eq_pos = match text.iter().position(|&b| b == b'=') {
        Some(pos) if pos > 0 => pos,
        _ => return Err(parts),
    };
    let name_bytes = &text[..eq_pos];
    if !is_valid_name(name_bytes) {
        return Err(parts);
    }
    let value_bytes = &text[eq_pos + 1..];
    if value_bytes.is_empty() && parts.len() == 1 {
        return Err(parts);
    }
    let name: Arc<str> = Arc::from(String::from_utf8_lossy(name_bytes).into_owned());
    let mut value = Vec::with_capacity(parts.len());
    value.push(Part::Literal(LiteralPart { text: Arc::from(value_bytes), quoting: Quoting::Unquoted }));
    value.extend(parts.into_iter().skip(1));
    Ok(AssignmentWordData { name, value })
}

fn is_valid_name(bytes: &[u8]) -> bool {
    match bytes.split_first() {
        Some((&first, rest)) => {
            (first == b'_' || first.is_ascii_alphabetic())
                && rest.iter().all(|&b| b == b'_' || b.is_ascii_alphanumeric())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> Part {
        Part::Literal(LiteralPart { text: Arc::from(text.as_bytes()), quoting: Quoting::Unquoted })
    }

    #[test]
    fn promotes_simple_assignment() {
        let parts = vec![lit("VAR=foo")];
        let data = try_promote(parts, true).expect("should promote");
        assert_eq!(data.name.as_ref(), "VAR");
        assert_eq!(data.value.len(), 1);
    }

    #[test]
    fn rejects_invalid_name() {
        let parts = vec![lit("1VAR=foo")];
        assert!(try_promote(parts, true).is_err());
    }

    #[test]
    fn rejects_without_flag() {
        let parts = vec![lit("VAR=foo")];
        assert!(try_promote(parts, false).is_err());
    }

    #[test]
    fn value_may_come_from_later_parts() {
        let parts = vec![lit("VAR="), lit("rest")];
        let data = try_promote(parts, true).expect("should promote");
        assert_eq!(data.value.len(), 2);
    }
}
