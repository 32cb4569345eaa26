//! Adversarial front-end tests: malformed and hostile inputs.
//!
//! None of these may panic; each either parses or reports a positioned error.

use crate::*;

#[test]
fn adversarial_01_integer_overflow() {
    let errors = parse_text("bind R1 @ S0 size 99999999999999999999999").unwrap_err();
    assert!(errors.iter().any(|e| e.message.contains("too large")));
}

#[test]
fn adversarial_02_non_ascii_character() {
    let errors = parse_text("bind R1 @ S0 ✓").unwrap_err();
    assert!(errors.iter().any(|e| e.message.contains("unexpected character `✓`")));
}

#[test]
fn adversarial_03_keyword_as_name() {
    let errors = parse_text("bind use @ S0").unwrap_err();
    assert!(errors[0].message.contains("expected resource name, found `use`"));
}

#[test]
fn adversarial_04_only_newlines() {
    let program = parse_text("\n\n\n\r\n").unwrap();
    assert!(program.is_empty());
}

#[test]
fn adversarial_05_crlf_line_endings() {
    let program = parse_text("enter S0\r\nexit S0\r\n").unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program.ops[1].span.line, 2);
}

#[test]
fn adversarial_06_dangling_label_marker() {
    let errors = parse_text("borrow R1 @ S0 =").unwrap_err();
    assert!(errors[0].message.contains("expected borrow label name"));
}

#[test]
fn adversarial_07_comment_after_operation() {
    let program = parse_text("use R1 # read it\n").unwrap();
    assert_eq!(program.len(), 1);
}

#[test]
fn adversarial_08_errors_do_not_swallow_following_lines() {
    let errors = parse_text("@@@\nenter\nexit S0 S1").unwrap_err();
    let lines: Vec<_> = errors.iter().map(|e| e.span.line).collect();
    assert!(lines.contains(&1));
    assert!(lines.contains(&2));
    assert!(lines.contains(&3));
}

#[test]
fn adversarial_09_parser_without_eof_token() {
    let result = Parser::new(vec![]).parse();
    assert!(result.errors.is_empty());
    assert!(result.program.is_empty());
}

#[test]
fn adversarial_10_long_program() {
    let mut src = String::from("enter S0\n");
    for i in 0..5_000 {
        src.push_str(&format!("bind R{i} @ S0\nuse R{i}\n"));
    }
    src.push_str("exit S0\n");
    let program = parse_text(&src).unwrap();
    assert_eq!(program.len(), 10_002);
}

#[test]
fn adversarial_11_json_garbage() {
    assert!(parse_json("not json").is_err());
    assert!(parse_json("{\"ops\": 3}").is_err());
    assert!(parse_json("").is_err());
}
