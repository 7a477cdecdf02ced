use rstest::rstest;
use serde_json::json;
use toon_codec::{
    decode, decode_default, DecodeErrorKind, DecodeOptions, Indent, KeyMode, SymbolTable, Value,
};

fn lenient() -> DecodeOptions {
    DecodeOptions::new().with_strict(false)
}

#[rstest]
#[case("a:\n   b: 1")]
#[case("a:\n b: 1")]
#[case(" a: 1")]
fn test_strict_rejects_non_multiple_indentation(#[case] input: &str) {
    let err = decode_default(input).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Indentation);
}

#[rstest]
fn test_lenient_accepts_tab_indentation() {
    let err = decode_default("a:\n\tb: 1").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Indentation);

    assert_eq!(
        decode("a:\n\tb: 1", &lenient()).unwrap(),
        Value::from(json!({"a": {"b": 1}}))
    );
}

#[rstest]
fn test_indent_width_validation_uses_configured_width() {
    let opts = DecodeOptions::new().with_indent(Indent::spaces(3));
    assert_eq!(
        decode("a:\n   b: 1", &opts).unwrap(),
        Value::from(json!({"a": {"b": 1}}))
    );
    let err = decode("a:\n  b: 1", &opts).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Indentation);
}

#[rstest]
#[case("items[2]:\n  - a\n\n  - b")]
#[case("users[2]{x}:\n  1\n\n  2")]
fn test_strict_rejects_blank_lines_inside_arrays(#[case] input: &str) {
    let err = decode_default(input).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::BlankLine);
    assert!(decode(input, &lenient()).is_ok());
}

#[rstest]
fn test_blank_lines_between_object_entries_are_tolerated() {
    assert_eq!(
        decode_default("a: 1\n\nb: 2").unwrap(),
        Value::from(json!({"a": 1, "b": 2}))
    );
}

#[rstest]
fn test_trailing_blank_lines_after_array_are_tolerated() {
    assert_eq!(
        decode_default("items[1]:\n  - a\n\n").unwrap(),
        Value::from(json!({"items": ["a"]}))
    );
}

#[rstest]
#[case("tags[2]: a,b,c", "inline longer than declared")]
#[case("tags[4]: a,b,c", "inline shorter than declared")]
#[case("items[1]:\n  - a\n  - b", "list longer than declared")]
#[case("items[2]:\n  - a", "list shorter than declared")]
#[case("users[1]{x}:\n  1\n  2", "tabular longer than declared")]
#[case("users[2]{x}:\n  1", "tabular shorter than declared")]
fn test_strict_rejects_length_mismatches(#[case] input: &str, #[case] label: &str) {
    let err = decode_default(input).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::LengthMismatch, "{label}");
    assert!(decode(input, &lenient()).is_ok(), "{label}");
}

#[rstest]
fn test_strict_rejects_row_width_mismatch() {
    let err = decode_default("users[1]{a,b}:\n  1,2,3").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::LengthMismatch);

    assert_eq!(
        decode("users[1]{a,b}:\n  1,2,3", &lenient()).unwrap(),
        Value::from(json!({"users": [{"a": 1, "b": 2}]}))
    );
}

#[rstest]
fn test_strict_rejects_duplicate_keys() {
    let err = decode_default("a: 1\na: 2").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::DuplicateKey);

    let err = decode_default("users[1]{x,x}:\n  1,2").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::DuplicateKey);

    assert_eq!(
        decode("a: 1\na: 2", &lenient()).unwrap(),
        Value::from(json!({"a": 2}))
    );
}

#[rstest]
fn test_strict_rejects_invalid_unquoted_keys() {
    let err = decode_default("bad key: 1").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::UnexpectedLine);

    assert_eq!(
        decode("bad key: 1", &lenient()).unwrap(),
        Value::from(json!({"bad key": 1}))
    );
}

#[rstest]
fn test_error_location_points_at_failing_line() {
    let err = decode_default("ok: 1\nlist[2]:\n  - a\n  - b\ndup: 1\ndup: 2").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::DuplicateKey);
    assert_eq!(err.location().unwrap().line, 6);
    assert_eq!(err.context(), Some("dup: 2"));
}

#[rstest]
fn test_key_mode_strings_is_default() {
    let value = decode_default("name: Alice").unwrap();
    assert_eq!(value.get("name").and_then(Value::as_str), Some("Alice"));
}

#[rstest]
fn test_key_mode_intern_shares_repeated_keys() {
    let opts = DecodeOptions::new().with_key_mode(KeyMode::Intern);
    let value = decode(
        "users[2]{name,role}:\n  Ada,admin\n  Bob,dev",
        &opts,
    )
    .unwrap();
    assert_eq!(
        value,
        Value::from(json!({"users": [
            {"name": "Ada", "role": "admin"},
            {"name": "Bob", "role": "dev"}
        ]}))
    );
}

#[rstest]
fn test_key_mode_existing_accepts_registered_keys() {
    let symbols: SymbolTable = ["users", "name", "role"].into_iter().collect();
    let opts = DecodeOptions::new()
        .with_key_mode(KeyMode::InternExisting)
        .with_symbols(symbols);
    let value = decode("users[1]{name,role}:\n  Ada,admin", &opts).unwrap();
    assert_eq!(value["users"][0]["name"].as_str(), Some("Ada"));
}

#[rstest]
fn test_key_mode_existing_rejects_unregistered_keys() {
    let symbols: SymbolTable = ["users"].into_iter().collect();
    let opts = DecodeOptions::new()
        .with_key_mode(KeyMode::InternExisting)
        .with_symbols(symbols);
    let err = decode("users[1]{name}:\n  Ada", &opts).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::UnknownSymbol);
    assert!(err.message().contains("name"));
}

#[rstest]
fn test_key_mode_existing_requires_table() {
    let opts = DecodeOptions::new().with_key_mode(KeyMode::InternExisting);
    let err = decode("a: 1", &opts).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::InvalidOptions);
}

#[rstest]
fn test_depth_limit_guards_pathological_nesting() {
    let mut input = String::new();
    for depth in 0..400 {
        for _ in 0..depth {
            input.push_str("  ");
        }
        input.push_str("a:\n");
    }
    let input = input.trim_end().to_string();
    let err = decode_default(&input).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::DepthLimit);
}

#[rstest]
fn test_strict_rejects_trailing_content_after_root_array() {
    let err = decode_default("[1]: a\nb: 1").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::UnexpectedLine);
}
