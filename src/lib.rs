//! Encoder and decoder for a compact, indentation-based serialization
//! format aimed at LLM token efficiency.
//!
//! Arrays pick one of three encodings by shape: primitive-only arrays go
//! inline (`tags[3]: a,b,c`), arrays of same-shaped objects become tables
//! (`users[2]{age,name}:` plus one row per object), and everything else
//! becomes a `- `-marked list. Object keys emit in alphabetical order and
//! every array header carries the element count, which strict decoding
//! verifies.
//!
//! ```
//! use toon_codec::{decode_default, encode_default, Value};
//! use serde_json::json;
//!
//! let value = Value::from(json!({"name": "Alice", "age": 30}));
//! let text = encode_default(&value)?;
//! assert_eq!(text, "age: 30\nname: Alice");
//! assert_eq!(decode_default(&text)?, value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod constants;
mod decode;
mod encode;
pub mod error;
mod number;
mod observe;
mod options;
mod text;
mod value;

pub use error::{DecodeError, DecodeErrorKind, EncodeError, Location};
pub use observe::{NoopObserver, Observer, Operation};
pub use options::{DecodeOptions, Delimiter, EncodeOptions, Indent, KeyMode, SymbolTable};
pub use text::{escape_string_into, is_bare_key, needs_quoting};
pub use value::{Map, Number, ToCanonical, Value};

/// Encode a canonical value tree.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<String, EncodeError> {
    encode::encode_value(value, options)
}

/// Encode with default options (2-space indent, comma delimiter).
pub fn encode_default(value: &Value) -> Result<String, EncodeError> {
    encode(value, &EncodeOptions::default())
}

/// Encode anything that can supply a canonical representation.
pub fn encode_from<T: ToCanonical + ?Sized>(
    value: &T,
    options: &EncodeOptions,
) -> Result<String, EncodeError> {
    encode(&value.to_canonical(), options)
}

/// Encode, notifying the observer around the call. The observer cannot
/// affect the result; failures are reported to it before returning.
pub fn encode_with_observer(
    value: &Value,
    options: &EncodeOptions,
    observer: &dyn Observer,
) -> Result<String, EncodeError> {
    observer.begin(Operation::Encode);
    let result = encode(value, options);
    match &result {
        Ok(_) => observer.end(Operation::Encode),
        Err(err) => observer.error(Operation::Encode, &err.to_string()),
    }
    result
}

/// Decode a document into a canonical value tree.
pub fn decode(input: &str, options: &DecodeOptions) -> Result<Value, DecodeError> {
    decode::decode_value(input, options)
}

/// Decode with default options (strict, 2-space indent, string keys).
pub fn decode_default(input: &str) -> Result<Value, DecodeError> {
    decode(input, &DecodeOptions::default())
}

/// Decode, notifying the observer around the call. The observer cannot
/// affect the result; failures are reported to it before returning.
pub fn decode_with_observer(
    input: &str,
    options: &DecodeOptions,
    observer: &dyn Observer,
) -> Result<Value, DecodeError> {
    observer.begin(Operation::Decode);
    let result = decode(input, options);
    match &result {
        Ok(_) => observer.end(Operation::Decode),
        Err(err) => observer.error(Operation::Decode, &err.to_string()),
    }
    result
}

/// Panicking adapter over [`encode`] for callers that treat failures as
/// bugs. The core API stays `Result`-based; this is a thin wrapper.
#[track_caller]
pub fn must_encode(value: &Value, options: &EncodeOptions) -> String {
    match encode(value, options) {
        Ok(text) => text,
        Err(err) => panic!("encode failed: {err}"),
    }
}

/// Panicking adapter over [`decode`].
#[track_caller]
pub fn must_decode(input: &str, options: &DecodeOptions) -> Value {
    match decode(input, options) {
        Ok(value) => value,
        Err(err) => panic!("decode failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[rstest::rstest]
    fn test_encode_decode_round_trip() {
        let value = Value::from(json!({
            "name": "Alice",
            "age": 30,
            "tags": ["a", "b"],
            "meta": {"active": true}
        }));
        let text = encode_default(&value).unwrap();
        assert_eq!(decode_default(&text).unwrap(), value);
    }

    #[rstest::rstest]
    fn test_encode_from_to_canonical() {
        let tags = vec!["a".to_string(), "b".to_string()];
        let text = encode_from(&tags, &EncodeOptions::default()).unwrap();
        assert_eq!(text, "[2]: a,b");
    }

    #[rstest::rstest]
    fn test_must_variants_pass_through() {
        let value = Value::from(json!({"a": 1}));
        let text = must_encode(&value, &EncodeOptions::default());
        assert_eq!(must_decode(&text, &DecodeOptions::default()), value);
    }

    #[rstest::rstest]
    #[should_panic(expected = "decode failed")]
    fn test_must_decode_panics_on_error() {
        must_decode("tags[2]: a", &DecodeOptions::default());
    }

    #[rstest::rstest]
    fn test_option_errors_surface_before_work() {
        let opts = EncodeOptions::new().with_indent(Indent::spaces(0));
        assert!(matches!(
            encode(&Value::Null, &opts),
            Err(EncodeError::InvalidOptions(_))
        ));

        let opts = DecodeOptions::new().with_indent(Indent::spaces(0));
        let err = decode("a: 1", &opts).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidOptions);
    }
}
