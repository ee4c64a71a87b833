//! End-to-end alias/IO_NUMBER scenarios that need both `sh-lexer` and
//! `sh-tokenizer` together.

use std::collections::HashMap;

use sh_error::Status;
use sh_tokenizer::AliasTokenizer;
use sh_token::{Token, TokenKind};

fn store(pairs: &[(&str, &str)]) -> HashMap<String, Vec<u8>> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.as_bytes().to_vec())).collect()
}

fn lex(src: &[u8]) -> Vec<Token> {
    let mut out = Vec::new();
    assert_eq!(sh_lexer::lex_to_tokens(src, &mut out), Status::Ok);
    out
}

fn run(aliases: &[(&str, &str)], src: &[u8]) -> Vec<Token> {
    let s = store(aliases);
    let mut tok = AliasTokenizer::create(&s);
    let mut input = lex(src);
    let mut out = Vec::new();
    assert_eq!(tok.process(&mut input, &mut out), Status::Ok);
    out
}

fn plain_words(tokens: &[Token]) -> Vec<&[u8]> {
    tokens
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::Word(d) => d.parts[0].as_unquoted_literal().map(|lit| lit.text.as_ref()),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_6_trailing_blank_alias_chain() {
    let out = run(&[("ll", "ls -l "), ("bg", "background")], b"ll bg\n");
    assert_eq!(plain_words(&out), vec![b"ls".as_slice(), b"-l".as_slice(), b"background".as_slice()]);
}

#[test]
fn scenario_3_io_number_promotion_through_the_full_pipeline() {
    let out = run(&[], b"2>file\n");
    assert!(matches!(out[0].kind, TokenKind::IoNumber(2)));
    assert!(matches!(out[1].kind, TokenKind::Greater));
}

#[test]
fn io_number_promotion_is_idempotent() {
    let once = run(&[], b"2>file\n");

    let s = store(&[]);
    let mut tok = AliasTokenizer::create(&s);
    let mut input = once.clone();
    let mut twice = Vec::new();
    assert_eq!(tok.process(&mut input, &mut twice), Status::Ok);

    assert_eq!(once, twice);
}

#[test]
fn non_redirection_digit_word_is_never_promoted() {
    let out = run(&[], b"echo 2\n");
    assert!(matches!(out[1].kind, TokenKind::Word(_)));
}

#[test]
fn recursive_alias_terminates_and_keeps_the_recursive_occurrence_literal() {
    let out = run(&[("go", "go fast")], b"go\n");
    assert_eq!(plain_words(&out), vec![b"go".as_slice(), b"fast".as_slice()]);
}
