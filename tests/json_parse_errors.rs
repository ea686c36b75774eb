//! Purpose: Regression coverage for request-body parse-failure categories.
//! Exports: Integration tests only.
//! Role: Verify stable category labels used by strict-mode errors and debug logs.
//! Invariants: Category mapping remains deterministic for representative errors.
//! Invariants: Tests avoid payload leakage; assertions target category/hint text only.
//! Notes: Uses source include to exercise internal helper logic without widening API surface.

#[allow(dead_code)]
#[path = "../src/json/parse.rs"]
mod parse;

use parse::ParseFailureCategory;

fn category_of(body: &[u8]) -> ParseFailureCategory {
    let err = parse::from_slice(body).unwrap_err();
    parse::categorize(body, &err)
}

#[test]
fn category_mapping_handles_syntax_and_eof_errors() {
    assert_eq!(category_of(br#"{"a":}"#), ParseFailureCategory::Syntax);
    assert_eq!(category_of(b"[1, 2"), ParseFailureCategory::Eof);
    assert_eq!(category_of(&[0xff, b'{', b'}']), ParseFailureCategory::Syntax);
}

#[test]
fn empty_bodies_are_their_own_category() {
    assert_eq!(category_of(b""), ParseFailureCategory::Empty);
    assert_eq!(category_of(b"\r\n  "), ParseFailureCategory::Empty);
}

#[test]
fn non_json_whitespace_is_syntax() {
    assert_eq!(category_of(b"\x0c"), ParseFailureCategory::Syntax);
    assert_eq!(category_of(b" \x0b "), ParseFailureCategory::Syntax);
}

#[test]
fn nesting_past_limit_has_its_own_category() {
    let depth = parse::MAX_NESTING_DEPTH + 1;
    let body = format!("{}{}", "{\"a\":[".repeat(depth), "]}".repeat(depth));
    assert_eq!(category_of(body.as_bytes()), ParseFailureCategory::DepthLimit);

    let body = format!("{}{}", "[".repeat(300), "]".repeat(300));
    assert!(parse::from_slice(body.as_bytes()).is_ok());
}

#[test]
fn trailing_garbage_is_syntax() {
    assert_eq!(category_of(b"{} {}"), ParseFailureCategory::Syntax);
}

#[test]
fn labels_are_stable() {
    let cases = [
        (ParseFailureCategory::Empty, "empty"),
        (ParseFailureCategory::Syntax, "syntax"),
        (ParseFailureCategory::Eof, "eof"),
        (ParseFailureCategory::Data, "data"),
        (ParseFailureCategory::Io, "io"),
        (ParseFailureCategory::DepthLimit, "depth-limit"),
    ];
    for (category, label) in cases {
        assert_eq!(category.label(), label);
    }
}

#[test]
fn hint_contains_category_and_context() {
    let body = br#"{"secret":"hunter2""#;
    let err = parse::from_slice(body).unwrap_err();
    let hint = parse::hint_for_error(parse::categorize(body, &err), "test.context");
    assert!(hint.contains("parse category: eof"));
    assert!(hint.contains("context: test.context"));
    assert!(!hint.contains("hunter2"));
}
