mod writer;

use smol_str::SmolStr;

use crate::constants::MAX_DEPTH;
use crate::error::EncodeError;
use crate::number::write_number_into;
use crate::options::{Delimiter, EncodeOptions};
use crate::text::{needs_quoting, quote_into, write_key_into};
use crate::value::{Number, Value};

use writer::Writer;

pub(crate) fn encode_value(value: &Value, options: &EncodeOptions) -> Result<String, EncodeError> {
    options.validate()?;
    let mut encoder = Encoder {
        out: Writer::new(options.indent.width()),
        delimiter: options.delimiter,
        length_marker: options.length_marker,
    };
    encoder.write_root(value)?;
    Ok(encoder.out.finish())
}

struct Encoder {
    out: Writer,
    delimiter: Delimiter,
    length_marker: Option<char>,
}

/// Encoding strategy for one array, selected by shape. The first matching
/// rule wins: empty, then all-primitive (inline), then uniform objects with
/// primitive fields (tabular), then the general list form.
enum ArrayKind<'a> {
    Empty,
    Inline,
    Tabular(Vec<&'a SmolStr>),
    List,
}

fn classify_array(items: &[Value]) -> ArrayKind<'_> {
    if items.is_empty() {
        return ArrayKind::Empty;
    }
    if items.iter().all(Value::is_primitive) {
        return ArrayKind::Inline;
    }

    let first = match items[0].as_object() {
        Some(obj) => obj,
        None => return ArrayKind::List,
    };
    // An empty field set carries no information, so [{}] stays a list.
    if first.is_empty() || !first.values().all(Value::is_primitive) {
        return ArrayKind::List;
    }

    let fields: Vec<&SmolStr> = first.keys().collect();
    for item in &items[1..] {
        let obj = match item.as_object() {
            Some(obj) => obj,
            None => return ArrayKind::List,
        };
        if obj.len() != fields.len() {
            return ArrayKind::List;
        }
        for field in &fields {
            match obj.get(field.as_str()) {
                Some(value) if value.is_primitive() => {}
                _ => return ArrayKind::List,
            }
        }
    }
    ArrayKind::Tabular(fields)
}

impl Encoder {
    fn write_root(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Object(map) => self.write_object(map, 0),
            Value::Array(items) => self.write_array(None, None, items, 0, 1),
            primitive => {
                let token = self.primitive_token(primitive);
                self.out.push(token, 0);
                Ok(())
            }
        }
    }

    fn write_object(&mut self, map: &crate::value::Map, depth: usize) -> Result<(), EncodeError> {
        check_depth(depth)?;
        for (key, value) in map {
            match value {
                Value::Array(items) => {
                    self.write_array(None, Some(key.as_str()), items, depth, depth + 1)?;
                }
                Value::Object(nested) => {
                    let mut line = String::new();
                    write_key_into(&mut line, key);
                    line.push(':');
                    self.out.push(line, depth);
                    if !nested.is_empty() {
                        self.write_object(nested, depth + 1)?;
                    }
                }
                primitive => {
                    let mut line = String::new();
                    write_key_into(&mut line, key);
                    line.push_str(": ");
                    line.push_str(&self.primitive_token(primitive));
                    self.out.push(line, depth);
                }
            }
        }
        Ok(())
    }

    /// Emit one array. The header (or full inline form) lands on one line at
    /// `line_depth`, optionally behind a list-marker prefix; rows or items
    /// land at `body_depth`. The two depths differ by more than one only for
    /// an array hoisted onto a list item's marker line.
    fn write_array(
        &mut self,
        prefix: Option<&str>,
        key: Option<&str>,
        items: &[Value],
        line_depth: usize,
        body_depth: usize,
    ) -> Result<(), EncodeError> {
        check_depth(body_depth)?;
        match classify_array(items) {
            ArrayKind::Empty => {
                let line = self.header_line(prefix, key, 0, None);
                self.out.push(line, line_depth);
            }
            ArrayKind::Inline => {
                let mut line = self.header_line(prefix, key, items.len(), None);
                line.push(' ');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        line.push(self.delimiter.as_char());
                    }
                    line.push_str(&self.primitive_token(item));
                }
                self.out.push(line, line_depth);
            }
            ArrayKind::Tabular(fields) => {
                let line = self.header_line(prefix, key, items.len(), Some(&fields));
                self.out.push(line, line_depth);
                for item in items {
                    let obj = item.as_object().expect("tabular rows are objects");
                    let mut row = String::new();
                    for (i, field) in fields.iter().enumerate() {
                        if i > 0 {
                            row.push(self.delimiter.as_char());
                        }
                        let cell = obj.get(field.as_str()).expect("tabular field is present");
                        row.push_str(&self.primitive_token(cell));
                    }
                    self.out.push(row, body_depth);
                }
            }
            ArrayKind::List => {
                let line = self.header_line(prefix, key, items.len(), None);
                self.out.push(line, line_depth);
                for item in items {
                    self.write_list_item(item, body_depth)?;
                }
            }
        }
        Ok(())
    }

    fn write_list_item(&mut self, item: &Value, depth: usize) -> Result<(), EncodeError> {
        check_depth(depth)?;
        match item {
            Value::Array(items) => self.write_array(Some("- "), None, items, depth, depth + 1),
            Value::Object(map) if map.is_empty() => {
                self.out.push("-", depth);
                Ok(())
            }
            Value::Object(map) => {
                let mut fields = map.iter();
                let (first_key, first_value) = fields.next().expect("object is non-empty");
                self.write_item_field(Some("- "), first_key, first_value, depth, depth + 2)?;
                for (key, value) in fields {
                    self.write_item_field(None, key, value, depth + 1, depth + 2)?;
                }
                Ok(())
            }
            primitive => {
                let mut line = String::from("- ");
                line.push_str(&self.primitive_token(primitive));
                self.out.push(line, depth);
                Ok(())
            }
        }
    }

    /// One field of a list-item object. The first field shares the marker
    /// line (`prefix` is `"- "`), so its nested content sits two levels below
    /// the marker; later fields sit one level below with their content one
    /// deeper again, which is the same `child_depth`.
    fn write_item_field(
        &mut self,
        prefix: Option<&str>,
        key: &str,
        value: &Value,
        line_depth: usize,
        child_depth: usize,
    ) -> Result<(), EncodeError> {
        match value {
            Value::Array(items) => {
                self.write_array(prefix, Some(key), items, line_depth, child_depth)
            }
            Value::Object(nested) => {
                let mut line = String::from(prefix.unwrap_or(""));
                write_key_into(&mut line, key);
                line.push(':');
                self.out.push(line, line_depth);
                if !nested.is_empty() {
                    self.write_object(nested, child_depth)?;
                }
                Ok(())
            }
            primitive => {
                let mut line = String::from(prefix.unwrap_or(""));
                write_key_into(&mut line, key);
                line.push_str(": ");
                line.push_str(&self.primitive_token(primitive));
                self.out.push(line, line_depth);
                Ok(())
            }
        }
    }

    /// `key[N]:`, `key[#N]:`, `key[N|]{a|b}:` and friends. A non-comma
    /// delimiter is recorded after the count so documents stay
    /// self-describing.
    fn header_line(
        &self,
        prefix: Option<&str>,
        key: Option<&str>,
        len: usize,
        fields: Option<&[&SmolStr]>,
    ) -> String {
        let mut line = String::from(prefix.unwrap_or(""));
        if let Some(key) = key {
            write_key_into(&mut line, key);
        }
        line.push('[');
        if let Some(marker) = self.length_marker {
            line.push(marker);
        }
        let mut buf = itoa::Buffer::new();
        line.push_str(buf.format(len as u64));
        if self.delimiter != Delimiter::Comma {
            line.push(self.delimiter.as_char());
        }
        line.push(']');
        if let Some(fields) = fields {
            line.push('{');
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    line.push(self.delimiter.as_char());
                }
                write_key_into(&mut line, field.as_str());
            }
            line.push('}');
        }
        line.push(':');
        line
    }

    fn primitive_token(&self, value: &Value) -> String {
        let mut out = String::new();
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Number(n) => match n {
                // Non-finite values have no textual form in this format.
                Number::Float(f) if !f.is_finite() => out.push_str("null"),
                other => write_number_into(&mut out, other),
            },
            Value::String(s) => {
                if needs_quoting(s, self.delimiter.as_char()) {
                    quote_into(&mut out, s);
                } else {
                    out.push_str(s);
                }
            }
            Value::Array(_) | Value::Object(_) => {
                unreachable!("containers are routed through write_array/write_object")
            }
        }
        out
    }
}

fn check_depth(depth: usize) -> Result<(), EncodeError> {
    if depth > MAX_DEPTH {
        return Err(EncodeError::DepthLimit(MAX_DEPTH));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{encode, encode_default, EncodeOptions, Value};

    fn enc(value: serde_json::Value) -> String {
        encode_default(&Value::from(value)).unwrap()
    }

    #[rstest::rstest]
    fn test_encode_primitives_at_root() {
        assert_eq!(enc(json!(null)), "null");
        assert_eq!(enc(json!(true)), "true");
        assert_eq!(enc(json!(false)), "false");
        assert_eq!(enc(json!(42)), "42");
        assert_eq!(enc(json!(-5)), "-5");
        assert_eq!(enc(json!("hello")), "hello");
        assert_eq!(enc(json!("hello world")), "hello world");
    }

    #[rstest::rstest]
    fn test_encode_object_sorts_keys() {
        assert_eq!(
            enc(json!({"name": "Alice", "age": 30})),
            "age: 30\nname: Alice"
        );
    }

    #[rstest::rstest]
    fn test_encode_inline_array() {
        assert_eq!(enc(json!({"tags": ["a", "b", "c"]})), "tags[3]: a,b,c");
    }

    #[rstest::rstest]
    fn test_encode_empty_array() {
        assert_eq!(enc(json!({"items": []})), "items[0]:");
    }

    #[rstest::rstest]
    fn test_encode_tabular_array_sorts_fields() {
        assert_eq!(
            enc(json!({"users": [
                {"name": "Alice", "age": 30},
                {"name": "Bob", "age": 25}
            ]})),
            "users[2]{age,name}:\n  30,Alice\n  25,Bob"
        );
    }

    #[rstest::rstest]
    fn test_encode_list_for_non_uniform_objects() {
        let text = enc(json!({"items": [
            {"a": 1},
            {"a": 1, "b": 2}
        ]}));
        assert_eq!(text, "items[2]:\n  - a: 1\n  - a: 1\n    b: 2");
    }

    #[rstest::rstest]
    fn test_encode_list_for_mixed_items() {
        let text = enc(json!({"items": [1, {"a": 1}]}));
        assert_eq!(text, "items[2]:\n  - 1\n  - a: 1");
    }

    #[rstest::rstest]
    fn test_encode_empty_object_items_as_bare_markers() {
        assert_eq!(enc(json!({"items": [{}, {}]})), "items[2]:\n  -\n  -");
    }

    #[rstest::rstest]
    fn test_encode_nested_object() {
        assert_eq!(
            enc(json!({"user": {"name": "Alice", "age": 30}})),
            "user:\n  age: 30\n  name: Alice"
        );
    }

    #[rstest::rstest]
    fn test_encode_empty_nested_object() {
        assert_eq!(enc(json!({"user": {}})), "user:");
    }

    #[rstest::rstest]
    fn test_encode_root_array_keyless_header() {
        assert_eq!(enc(json!(["a", "b"])), "[2]: a,b");
        assert_eq!(enc(json!([])), "[0]:");
        assert_eq!(
            enc(json!([{"id": 1}, {"id": 2}])),
            "[2]{id}:\n  1\n  2"
        );
    }

    #[rstest::rstest]
    fn test_encode_nested_array_in_list_item() {
        let text = enc(json!({"matrix": [[1, 2], [3]]}));
        assert_eq!(text, "matrix[2]:\n  - [2]: 1,2\n  - [1]: 3");
    }

    #[rstest::rstest]
    fn test_encode_hoisted_tabular_rows_two_levels_under_marker() {
        let text = enc(json!({"entries": [
            {"people": [{"name": "Alice", "age": 30}, {"name": "Bob", "age": 25}], "total": 2}
        ]}));
        assert_eq!(
            text,
            "entries[1]:\n  - people[2]{age,name}:\n      30,Alice\n      25,Bob\n    total: 2"
        );
    }

    #[rstest::rstest]
    fn test_encode_array_field_after_marker_line() {
        let text = enc(json!({"items": [
            {"count": 1, "users": [{"id": 1, "name": "Ada"}]}
        ]}));
        assert_eq!(
            text,
            "items[1]:\n  - count: 1\n    users[1]{id,name}:\n      1,Ada"
        );
    }

    #[rstest::rstest]
    fn test_encode_hoisted_inline_array_stays_on_marker_line() {
        let text = enc(json!({"items": [
            {"tags": ["a", "b", "c"], "name": "test"}
        ]}));
        assert_eq!(text, "items[1]:\n  - name: test\n    tags[3]: a,b,c");
    }

    #[rstest::rstest]
    fn test_encode_quotes_ambiguous_strings() {
        assert_eq!(enc(json!({"a": "true"})), "a: \"true\"");
        assert_eq!(enc(json!({"a": "05"})), "a: \"05\"");
        assert_eq!(enc(json!({"a": ""})), "a: \"\"");
        assert_eq!(enc(json!({"a": "x,y"})), "a: \"x,y\"");
    }

    #[rstest::rstest]
    fn test_encode_quotes_non_bare_keys() {
        assert_eq!(enc(json!({"a key": 1})), "\"a key\": 1");
        assert_eq!(enc(json!({"0": 1})), "\"0\": 1");
    }

    #[rstest::rstest]
    fn test_encode_non_finite_floats_as_null() {
        use crate::value::{Map, Number};
        let mut map = Map::new();
        map.insert("n".into(), Value::Number(Number::Float(f64::NAN)));
        map.insert("p".into(), Value::Number(Number::Float(f64::INFINITY)));
        assert_eq!(encode_default(&Value::Object(map)).unwrap(), "n: null\np: null");
    }

    #[rstest::rstest]
    fn test_encode_pipe_delimiter_recorded_in_header() {
        let opts = EncodeOptions::new().with_delimiter(crate::Delimiter::Pipe);
        let value = Value::from(json!({"tags": ["a", "b,c"]}));
        assert_eq!(encode(&value, &opts).unwrap(), "tags[2|]: a|b,c");

        let value = Value::from(json!({"users": [{"id": 1}, {"id": 2}]}));
        assert_eq!(encode(&value, &opts).unwrap(), "users[2|]{id}:\n  1\n  2");
    }

    #[rstest::rstest]
    fn test_encode_length_marker() {
        let opts = EncodeOptions::new().with_length_marker('#');
        let value = Value::from(json!({"tags": ["a", "b", "c"], "items": []}));
        assert_eq!(
            encode(&value, &opts).unwrap(),
            "items[#0]:\ntags[#3]: a,b,c"
        );
    }

    #[rstest::rstest]
    fn test_encode_indent_width() {
        let opts = EncodeOptions::new().with_indent(crate::Indent::spaces(4));
        let value = Value::from(json!({"a": {"b": 1}}));
        assert_eq!(encode(&value, &opts).unwrap(), "a:\n    b: 1");
    }

    #[rstest::rstest]
    fn test_encode_depth_limit() {
        let mut nested = json!(1);
        for _ in 0..300 {
            nested = json!({ "a": nested });
        }
        let err = encode_default(&Value::from(nested)).unwrap_err();
        assert!(matches!(err, crate::EncodeError::DepthLimit(_)));
    }

    #[rstest::rstest]
    fn test_encode_whole_floats_integer_style() {
        assert_eq!(enc(json!({"n": 30.0})), "n: 30");
        assert_eq!(enc(json!({"n": 2.5})), "n: 2.5");
    }
}
