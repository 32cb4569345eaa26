//! Front-end tests: lexing, parsing and JSON decoding.

use keel_ops::{BorrowKind, Operation};

use crate::*;

// ---- Helpers ---------------------------------------------------------------

fn kinds(src: &str) -> Vec<TokenKind> {
    let result = Lexer::new(src).tokenize();
    assert!(result.errors.is_empty(), "lex errors: {:?}", result.errors);
    result.tokens.into_iter().map(|t| t.kind).collect()
}

fn ident(s: &str) -> TokenKind {
    TokenKind::Identifier(s.into())
}

/// Parse and panic on any error.
fn parse_ok(src: &str) -> Vec<Operation> {
    match parse_text(src) {
        Ok(program) => program.operations().cloned().collect(),
        Err(errors) => {
            let msgs: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
            panic!("expected no parse errors, got:\n{}", msgs.join("\n"));
        }
    }
}

/// Parse and return the errors, panicking if there are none.
fn parse_err(src: &str) -> Vec<ParseError> {
    match parse_text(src) {
        Ok(program) => panic!("expected parse errors, got {:?}", program),
        Err(errors) => errors,
    }
}

fn assert_error_contains(errors: &[ParseError], substr: &str) {
    assert!(
        errors.iter().any(|e| e.message.contains(substr)),
        "no error message contains '{}'; errors: {:?}",
        substr,
        errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>()
    );
}

// ===========================================================================
// Lexer
// ===========================================================================

#[test]
fn test_lex_simple_line() {
    assert_eq!(
        kinds("enter S0\n"),
        vec![TokenKind::Enter, ident("S0"), TokenKind::Newline, TokenKind::Eof]
    );
}

#[test]
fn test_lex_adds_final_newline() {
    assert_eq!(
        kinds("exit S0"),
        vec![TokenKind::Exit, ident("S0"), TokenKind::Newline, TokenKind::Eof]
    );
}

#[test]
fn test_lex_collapses_blank_lines_and_comments() {
    assert_eq!(
        kinds("\n\n# setup\nenter S0\n\n\n   # trailing\nexit S0"),
        vec![
            TokenKind::Enter,
            ident("S0"),
            TokenKind::Newline,
            TokenKind::Exit,
            ident("S0"),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_punctuation_and_numbers() {
    assert_eq!(
        kinds("bind R1 @ S0 size 64"),
        vec![
            TokenKind::Bind,
            ident("R1"),
            TokenKind::At,
            ident("S0"),
            TokenKind::Size,
            TokenKind::IntLiteral(64),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_empty_source() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("  # only a comment  "), vec![TokenKind::Eof]);
}

#[test]
fn test_lex_tracks_lines_and_columns() {
    let result = Lexer::new("enter S0\n  bind R1 @ S0\n").tokenize();
    let bind = result
        .tokens
        .iter()
        .find(|t| t.kind == TokenKind::Bind)
        .unwrap();
    assert_eq!(bind.span.line, 2);
    assert_eq!(bind.span.column, 3);
}

#[test]
fn test_lex_unexpected_character() {
    let result = Lexer::new("enter S0 $").tokenize();
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("unexpected character `$`"));
    assert_eq!(result.errors[0].span.column, 10);
}

// ===========================================================================
// Parser: accepted forms
// ===========================================================================

#[test]
fn test_parse_every_operation() {
    let ops = parse_ok(
        "enter S0
        bind R1 @ S0 size 64
        bind H @ S0 rc
        borrow R1 @ S0 = B1
        borrow mut R1 @ S0
        release B1
        move R1 @ S0 as R2
        clone R2 @ S0 as R3
        return R3 @ S0
        use R2
        mutate R2
        drop R2
        exit S0",
    );
    assert_eq!(ops.len(), 13);
    assert_eq!(
        ops[1],
        Operation::Bind {
            name: "R1".into(),
            scope: "S0".into(),
            shared: false,
            size: 64
        }
    );
    assert_eq!(
        ops[2],
        Operation::Bind {
            name: "H".into(),
            scope: "S0".into(),
            shared: true,
            size: 0
        }
    );
    assert_eq!(
        ops[4],
        Operation::Borrow {
            resource: "R1".into(),
            kind: BorrowKind::Exclusive,
            scope: "S0".into(),
            label: None
        }
    );
    assert_eq!(
        ops[6],
        Operation::Move {
            resource: "R1".into(),
            scope: "S0".into(),
            as_name: Some("R2".into())
        }
    );
}

#[test]
fn test_parse_bind_modifiers_in_any_order() {
    let ops = parse_ok("bind R1 @ S0 size 8 rc");
    assert_eq!(
        ops[0],
        Operation::Bind {
            name: "R1".into(),
            scope: "S0".into(),
            shared: true,
            size: 8
        }
    );
}

#[test]
fn test_parse_move_without_new_name() {
    let ops = parse_ok("move R1 @ S1");
    assert_eq!(
        ops[0],
        Operation::Move {
            resource: "R1".into(),
            scope: "S1".into(),
            as_name: None
        }
    );
}

#[test]
fn test_parse_records_line_of_each_operation() {
    let program = parse_text("enter S0\n\n# comment\nbind R1 @ S0\n").unwrap();
    assert_eq!(program.ops[0].span.line, 1);
    assert_eq!(program.ops[1].span.line, 4);
}

#[test]
fn test_printed_program_parses_back() {
    let src = "enter S0
        bind R1 @ S0 rc size 16
        borrow mut R1 @ S0 = B1
        release B1
        clone R1 @ S0 as R2
        exit S0";
    let program = parse_text(src).unwrap();
    let reparsed = parse_text(&program.to_text()).unwrap();
    assert_eq!(
        program.operations().collect::<Vec<_>>(),
        reparsed.operations().collect::<Vec<_>>()
    );
}

// ===========================================================================
// Parser: errors
// ===========================================================================

#[test]
fn test_parse_missing_at() {
    let errors = parse_err("bind R1 S0");
    assert_error_contains(&errors, "expected `@`, found identifier `S0`");
    assert_eq!(errors[0].span.line, 1);
    assert_eq!(errors[0].span.column, 9);
}

#[test]
fn test_parse_missing_name() {
    let errors = parse_err("use\n");
    assert_error_contains(&errors, "expected resource name, found newline");
}

#[test]
fn test_parse_line_must_start_with_operation() {
    let errors = parse_err("R1 @ S0");
    assert_error_contains(&errors, "expected an operation");
}

#[test]
fn test_parse_trailing_tokens() {
    let errors = parse_err("borrow R1 @ S0 = B1 extra");
    assert_error_contains(&errors, "expected end of line");
}

#[test]
fn test_parse_clone_requires_as() {
    let errors = parse_err("clone R1 @ S0");
    assert_error_contains(&errors, "expected `as`");
}

#[test]
fn test_parse_duplicate_modifier() {
    let errors = parse_err("bind R1 @ S0 rc rc");
    assert_error_contains(&errors, "duplicate `rc`");
}

#[test]
fn test_parse_reports_every_bad_line() {
    let errors = parse_err("enter S0\nbind R1\nuse\nexit S0\nrelease");
    assert_eq!(errors.len(), 3, "{:?}", errors);
    let lines: Vec<_> = errors.iter().map(|e| e.span.line).collect();
    assert_eq!(lines, vec![2, 3, 5]);
}

#[test]
fn test_parse_error_display_has_position() {
    let errors = parse_err("enter S0\n  drop");
    assert_eq!(errors[0].to_string(), "2:7: expected resource name, found newline");
}

// ===========================================================================
// JSON
// ===========================================================================

#[test]
fn test_json_bare_array() {
    let program = parse_json(
        r#"[{"op":"enter","scope":"S0"},
            {"op":"bind","name":"R1","scope":"S0","size":32},
            {"op":"borrow","resource":"R1","kind":"exclusive","scope":"S0","label":"B1"},
            {"op":"exit","scope":"S0"}]"#,
    )
    .unwrap();
    assert_eq!(program.len(), 4);
    assert_eq!(program.ops[2].node.to_string(), "borrow mut R1 @ S0 = B1");
    assert!(!program.ops[0].span.is_known());
}

#[test]
fn test_json_wrapped_object() {
    let program = parse_json(r#"{"ops":[{"op":"use","resource":"R1"}]}"#).unwrap();
    assert_eq!(
        program.ops[0].node,
        Operation::Use {
            resource: "R1".into()
        }
    );
}

#[test]
fn test_json_unknown_op_is_error() {
    let err = parse_json("[\n  {\"op\":\"teleport\",\"resource\":\"R1\"}\n]").unwrap_err();
    assert!(err.message.starts_with("invalid JSON program"));
    assert_eq!(err.span.line, 2);
}

#[test]
fn test_json_missing_field_is_error() {
    let err = parse_json(r#"[{"op":"bind","name":"R1"}]"#).unwrap_err();
    assert!(err.message.contains("scope"), "{}", err.message);
}

#[test]
fn test_json_rejects_names_text_cannot_spell() {
    let keyword = parse_json(r#"[{"op":"bind","name":"mut","scope":"S0"}]"#).unwrap_err();
    assert_eq!(
        keyword.message,
        "operation #0: `mut` is not a valid resource name"
    );

    let spaced = parse_json(
        r#"[{"op":"enter","scope":"S0"},{"op":"use","resource":"my var"}]"#,
    )
    .unwrap_err();
    assert!(spaced.message.starts_with("operation #1: `my var`"));

    let label = parse_json(r#"[{"op":"release","label":"B-1"}]"#).unwrap_err();
    assert!(label.message.contains("borrow name"));

    let renamed = parse_json(
        r#"[{"op":"clone","resource":"R1","scope":"S0","as":"größe"}]"#,
    )
    .unwrap_err();
    assert!(renamed.message.contains("`größe`"));

    assert!(parse_json(r#"[{"op":"enter","scope":""}]"#).is_err());
}

#[test]
fn test_json_program_reparses_from_text() {
    let program = parse_json(
        r#"{"ops":[
            {"op":"enter","scope":"outer"},
            {"op":"bind","name":"buf_1","scope":"outer","shared":true,"size":64},
            {"op":"enter","scope":"_inner"},
            {"op":"clone","resource":"buf_1","scope":"_inner","as":"copy"},
            {"op":"borrow","resource":"copy","kind":"exclusive","scope":"_inner","label":"B"},
            {"op":"release","label":"B"},
            {"op":"move","resource":"copy","scope":"_inner","as":"sizeable"},
            {"op":"return","resource":"sizeable","scope":"outer"},
            {"op":"exit","scope":"_inner"},
            {"op":"drop","resource":"sizeable"},
            {"op":"exit","scope":"outer"}]}"#,
    )
    .unwrap();

    let reparsed = parse_text(&program.to_text()).unwrap();
    let original: Vec<_> = program.operations().collect();
    let round_tripped: Vec<_> = reparsed.operations().collect();
    assert_eq!(original, round_tripped);
}

#[test]
fn test_is_identifier() {
    assert!(is_identifier("R1"));
    assert!(is_identifier("_tmp"));
    assert!(is_identifier("sized"));
    assert!(!is_identifier("size"));
    assert!(!is_identifier("as"));
    assert!(!is_identifier("1R"));
    assert!(!is_identifier("x'"));
    assert!(!is_identifier(""));
}
