use pretty_assertions::assert_eq;
use sloth::{
    lexer::Scanner,
    token::{Token, TokenKind},
    DiagnosticKind,
};

fn kinds_and_lexemes(source: &str) -> Vec<(TokenKind, String)> {
    Scanner::new(source)
        .tokenize()
        .expect("source should scan")
        .into_iter()
        .map(|token| (token.kind, token.lexeme))
        .collect()
}

#[test]
fn classifies_every_token_class() {
    let tokens = kinds_and_lexemes(r#"x = (-12) + "a\nb"; // trailing"#);
    assert_eq!(
        tokens,
        vec![
            (TokenKind::Identifier, "x".to_string()),
            (TokenKind::Punct, "=".to_string()),
            (TokenKind::Number, "-12".to_string()),
            (TokenKind::Punct, "+".to_string()),
            (TokenKind::String, "a\nb".to_string()),
            (TokenKind::Separator, ";".to_string()),
            (TokenKind::Eof, String::new()),
        ]
    );
}

#[test]
fn keywords_need_a_word_boundary() {
    let tokens = kinds_and_lexemes("iffy do done end_x return");
    assert_eq!(
        tokens,
        vec![
            (TokenKind::Identifier, "iffy".to_string()),
            (TokenKind::Keyword, "do".to_string()),
            (TokenKind::Identifier, "done".to_string()),
            (TokenKind::Identifier, "end_x".to_string()),
            (TokenKind::Keyword, "return".to_string()),
            (TokenKind::Eof, String::new()),
        ]
    );
}

#[test]
fn multi_character_operators_are_single_tokens() {
    let lexemes: Vec<String> = kinds_and_lexemes("a<=b>=c==d&&e||f")
        .into_iter()
        .filter(|(kind, _)| *kind == TokenKind::Punct)
        .map(|(_, lexeme)| lexeme)
        .collect();
    assert_eq!(lexemes, vec!["<=", ">=", "==", "&&", "||"]);
}

#[test]
fn negative_literal_requires_parentheses() {
    let mut scanner = Scanner::new("(-5) ( -5)");
    let first = scanner.next_token().expect("scans");
    assert_eq!(first.kind, TokenKind::Number);
    assert_eq!(first.value, -5);

    assert!(scanner.next_token().expect("scans").is(TokenKind::Separator, "("));
    assert!(scanner.next_token().expect("scans").is(TokenKind::Punct, "-"));
    assert_eq!(scanner.next_token().expect("scans").value, 5);
}

#[test]
fn string_escapes_are_resolved_and_unknown_ones_kept() {
    let tokens = Scanner::new(r#""q\"b\\s\n" "\t""#)
        .tokenize()
        .expect("scans");
    assert_eq!(tokens[0].lexeme, "q\"b\\s\n");
    assert_eq!(tokens[1].lexeme, "\\t");
}

#[test]
fn comments_run_to_end_of_line() {
    let tokens = kinds_and_lexemes("// whole line\nx; // rest\n// x = 1;");
    assert_eq!(
        tokens,
        vec![
            (TokenKind::Identifier, "x".to_string()),
            (TokenKind::Separator, ";".to_string()),
            (TokenKind::Eof, String::new()),
        ]
    );
}

#[test]
fn tokens_record_their_line() {
    let tokens = Scanner::new("a\n\n  b\nc").tokenize().expect("scans");
    let lines: Vec<usize> = tokens.iter().map(|token| token.line).collect();
    assert_eq!(lines, vec![1, 3, 4, 4]);
}

#[test]
fn peek_looks_ahead_without_consuming() {
    let mut scanner = Scanner::new("a\nb\nc");
    assert_eq!(scanner.peek(2).expect("peeks").lexeme, "c");
    assert_eq!(scanner.peek(0).expect("peeks").lexeme, "a");
    assert!(scanner.peek(5).expect("peeks").is_eof());
    assert_eq!(scanner.next_token().expect("scans").lexeme, "a");
    assert_eq!(scanner.peek(0).expect("peeks").lexeme, "b");
}

#[test]
fn end_of_input_repeats() {
    let mut scanner = Scanner::new("x");
    scanner.next_token().expect("scans");
    for _ in 0..3 {
        let token = scanner.next_token().expect("scans");
        assert_eq!(token, Token::eof(1));
    }
}

#[test]
fn unrecognized_text_reports_its_line() {
    let err = Scanner::new("x = 1;\ny = 2 # 3;")
        .tokenize()
        .expect_err("`#` is not a token");
    assert_eq!(err.kind, DiagnosticKind::Lex);
    assert_eq!(err.line, Some(2));
    assert!(err.message.contains('#'), "message was {}", err.message);
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let err = Scanner::new("s = \"open;").tokenize().expect_err("unterminated");
    assert_eq!(err.kind, DiagnosticKind::Lex);
}

#[test]
fn out_of_range_integer_is_a_lex_error() {
    let err = Scanner::new("99999999999999999999")
        .tokenize()
        .expect_err("does not fit in i64");
    assert_eq!(err.kind, DiagnosticKind::Lex);
    assert_eq!(err.line, Some(1));
}

#[test]
fn token_display_is_tagged() {
    let rendered: Vec<String> = Scanner::new("def f \"s\" 3 ;")
        .tokenize()
        .expect("scans")
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        rendered,
        vec!["<key:def>", "<id:f>", "<str:\"s\">", "<num:3>", "<sep:;>", "<eof>"]
    );
}
