//! End-to-end lexing scenarios, lifted from the literal input/output pairs
//! used to validate the scanner design (scenarios 1, 3, 4, 5, 7, 8 — the
//! ones that exercise only `sh-lexer`; the alias/IO_NUMBER scenarios live in
//! `sh-tokenizer`'s own test suite since they need that crate).

use sh_error::Status;
use sh_token::{ParameterKind, Part, Token, TokenKind};

fn lex(src: &[u8]) -> Vec<Token> {
    let mut out = Vec::new();
    let status = sh_lexer::lex_to_tokens(src, &mut out);
    assert_eq!(status, Status::Ok, "lexing {src:?} did not complete");
    out
}

fn word_literal(tok: &Token) -> &[u8] {
    match &tok.kind {
        TokenKind::Word(data) => &data.parts[0].as_unquoted_literal().expect("unquoted literal").text,
        other => panic!("expected WORD, got {other:?}"),
    }
}

#[test]
fn scenario_1_double_quoted_word_with_parameter() {
    let tokens = lex(b"echo \"hello $USER\"\n");
    assert_eq!(word_literal(&tokens[0]), b"echo");

    match &tokens[1].kind {
        TokenKind::Word(data) => {
            assert!(data.was_quoted);
            assert!(!data.needs_field_splitting);
            assert_eq!(data.parts.len(), 2);
            match &data.parts[0] {
                Part::Literal(lit) => {
                    assert_eq!(&*lit.text, b"hello ");
                    assert!(lit.quoting.is_quoted());
                }
                other => panic!("expected literal, got {other:?}"),
            }
            match &data.parts[1] {
                Part::Parameter(p) => {
                    assert_eq!(&*p.name, "USER");
                    assert!(p.in_double_quotes);
                    assert_eq!(p.kind, ParameterKind::Plain);
                }
                other => panic!("expected parameter, got {other:?}"),
            }
        }
        other => panic!("expected WORD, got {other:?}"),
    }

    assert!(matches!(tokens[2].kind, TokenKind::Newline));
    assert_eq!(tokens.len(), 3, "EOF is never appended to the token stream");
}

#[test]
fn scenario_3_io_number_candidate_stays_a_plain_word_at_lexer_level() {
    // The lexer alone never promotes IO_NUMBER (spec §4.5 reserves that for
    // the tokenizer pass); it just emits the plain digit WORD followed by
    // the operator.
    let tokens = lex(b"2>file\n");
    assert_eq!(word_literal(&tokens[0]), b"2");
    assert!(matches!(tokens[1].kind, TokenKind::Greater));
    assert_eq!(word_literal(&tokens[2]), b"file");
}

#[test]
fn scenario_4_unquoted_heredoc_body() {
    let tokens = lex(b"cat <<EOF\nhello\nEOF\n");
    assert_eq!(word_literal(&tokens[0]), b"cat");
    assert!(matches!(tokens[1].kind, TokenKind::Dless));
    assert_eq!(word_literal(&tokens[2]), b"EOF");
    assert!(matches!(tokens[3].kind, TokenKind::Newline));
    match &tokens[4].kind {
        TokenKind::EndOfHeredoc(data) => {
            assert_eq!(&*data.delimiter, "EOF");
            assert_eq!(&*data.body, b"hello\n");
            assert!(!data.delimiter_was_quoted);
        }
        other => panic!("expected END_OF_HEREDOC, got {other:?}"),
    }
    assert_eq!(tokens.len(), 5, "EOF is never appended to the token stream");
}

#[test]
fn scenario_5_quoted_delimiter_suppresses_body_expansion() {
    let tokens = lex(b"cat <<'E'\n$x\nE\n");
    let heredoc = tokens
        .iter()
        .find_map(|t| match &t.kind {
            TokenKind::EndOfHeredoc(data) => Some(data),
            _ => None,
        })
        .expect("heredoc token present");
    assert_eq!(&*heredoc.body, b"$x\n");
    assert!(heredoc.delimiter_was_quoted);
    assert!(!heredoc.needs_expansion());
}

#[test]
fn scenario_7_nested_parens_stay_literal_in_arithmetic_text() {
    let tokens = lex(b"$(( (1+2)*3 ))\n");
    match &tokens[0].kind {
        TokenKind::Word(data) => {
            assert_eq!(data.parts.len(), 1);
            match &data.parts[0] {
                Part::Arithmetic(a) => assert_eq!(&*a.text, b" (1+2)*3 "),
                other => panic!("expected arithmetic part, got {other:?}"),
            }
        }
        other => panic!("expected WORD, got {other:?}"),
    }
}

#[test]
fn scenario_8_braced_parameter_with_default() {
    let tokens = lex(b"${var:-default}\n");
    match &tokens[0].kind {
        TokenKind::Word(data) => {
            assert_eq!(data.parts.len(), 1);
            match &data.parts[0] {
                Part::Parameter(p) => {
                    assert_eq!(&*p.name, "var");
                    assert_eq!(p.kind, ParameterKind::UseDefault);
                    assert_eq!(p.operand.as_deref(), Some(&b"default"[..]));
                }
                other => panic!("expected parameter part, got {other:?}"),
            }
        }
        other => panic!("expected WORD, got {other:?}"),
    }
}

#[test]
fn assignment_word_promotion() {
    let tokens = lex(b"VAR=foo cmd arg\n");
    match &tokens[0].kind {
        TokenKind::AssignmentWord(data) => {
            assert_eq!(&*data.name, "VAR");
            assert_eq!(data.value.len(), 1);
            match &data.value[0] {
                Part::Literal(lit) => assert_eq!(&*lit.text, b"foo"),
                other => panic!("expected literal, got {other:?}"),
            }
        }
        other => panic!("expected ASSIGNMENT_WORD, got {other:?}"),
    }
    assert_eq!(word_literal(&tokens[1]), b"cmd");
    assert_eq!(word_literal(&tokens[2]), b"arg");
}

#[test]
fn feeding_in_two_pieces_matches_feeding_in_one_shot() {
    let whole = lex(b"echo \"hello $USER\" && ls\n");

    let mut lexer = sh_lexer::Lexer::create();
    let mut split_out = Vec::new();
    lexer.append_input(b"echo \"hello $US");
    let status = lexer.tokenize(&mut split_out);
    assert!(status.is_ok() || status.is_incomplete());

    lexer.append_input(b"ER\" && ls\n");
    loop {
        let before = split_out.len();
        match lexer.tokenize(&mut split_out) {
            Status::Ok if split_out.len() == before => break,
            Status::Ok => continue,
            other => panic!("unexpected status {other:?}"),
        }
    }

    assert_eq!(split_out, whole);
}

#[test]
fn unterminated_single_quote_reports_incomplete_not_error() {
    let mut out = Vec::new();
    let status = sh_lexer::lex_to_tokens(b"echo 'unterminated", &mut out);
    assert_eq!(status, Status::Incomplete);
}

#[test]
fn heredoc_without_terminator_reports_incomplete() {
    let mut out = Vec::new();
    let status = sh_lexer::lex_to_tokens(b"cat <<EOF\nhello\n", &mut out);
    assert_eq!(status, Status::Incomplete);
}
