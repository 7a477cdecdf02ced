//! Property-based round-trip checks over generated value trees.
//!
//! Generation sticks to the shapes the format guarantees exactly: null,
//! booleans, integers, and arbitrary strings, nested in arrays and objects.

use proptest::prelude::*;
use smol_str::SmolStr;
use toon_codec::{decode_default, encode_default, Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        ".*".prop_map(|s: String| Value::String(s)),
    ]
}

fn value_tree() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6).prop_map(|entries| {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(SmolStr::new(key), value);
                }
                Value::Object(map)
            }),
        ]
    })
}

fn assert_round_trip(value: &Value) {
    let text = encode_default(value).expect("encode");
    let back = decode_default(&text)
        .unwrap_or_else(|err| panic!("decode failed: {err}\ndocument was:\n{text}"));
    assert_eq!(&back, value, "document was:\n{text}");
}

proptest! {
    #[test]
    fn prop_scalars_round_trip(value in scalar()) {
        assert_round_trip(&value);
    }

    #[test]
    fn prop_value_trees_round_trip(value in value_tree()) {
        assert_round_trip(&value);
    }

    #[test]
    fn prop_string_objects_round_trip(s in ".*") {
        let mut map = Map::new();
        map.insert(SmolStr::new("k"), Value::String(s));
        assert_round_trip(&Value::Object(map));
    }

    #[test]
    fn prop_string_arrays_round_trip(items in prop::collection::vec(".*", 0..8)) {
        let mut map = Map::new();
        map.insert(
            SmolStr::new("items"),
            Value::Array(items.into_iter().map(Value::String).collect()),
        );
        assert_round_trip(&Value::Object(map));
    }

    #[test]
    fn prop_integer_arrays_round_trip(items in prop::collection::vec(any::<i64>(), 0..16)) {
        let mut map = Map::new();
        map.insert(
            SmolStr::new("ns"),
            Value::Array(items.into_iter().map(Value::from).collect()),
        );
        assert_round_trip(&Value::Object(map));
    }

    #[test]
    fn prop_header_count_matches_length(items in prop::collection::vec(any::<u32>(), 0..20)) {
        let n = items.len();
        let mut map = Map::new();
        map.insert(
            SmolStr::new("a"),
            Value::Array(items.into_iter().map(Value::from).collect()),
        );
        let text = encode_default(&Value::Object(map)).unwrap();
        prop_assert!(text.starts_with(&format!("a[{n}]")));
    }

    #[test]
    fn prop_uniform_objects_encode_tabular(rows in prop::collection::vec(
        (any::<i32>(), "[a-z]{1,6}"),
        1..8
    )) {
        let mut items = Vec::new();
        for (id, name) in rows {
            let mut row = Map::new();
            row.insert(SmolStr::new("id"), Value::from(id));
            row.insert(SmolStr::new("name"), Value::String(name));
            items.push(Value::Object(row));
        }
        let mut map = Map::new();
        map.insert(SmolStr::new("rows"), Value::Array(items));
        let value = Value::Object(map);

        let text = encode_default(&value).unwrap();
        prop_assert!(text.lines().next().unwrap().contains("{id,name}"));
        prop_assert_eq!(decode_default(&text).unwrap(), value);
    }
}
