use std::{
    collections::BTreeMap,
    fmt,
    ops::{Index, IndexMut},
};

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

/// Object storage. `BTreeMap` keeps keys unique and iteration alphabetical,
/// which is what drives reproducible emission order.
pub type Map = BTreeMap<SmolStr, Value>;

/// A number that remembers whether it is integral. Integral values render
/// without a decimal point; non-finite floats render as `null`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    PosInt(u64),
    NegInt(i64),
    Float(f64),
}

impl Number {
    pub fn from_f64(f: f64) -> Option<Self> {
        if f.is_finite() {
            Some(Number::Float(f))
        } else {
            None
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::PosInt(_) | Number::NegInt(_) => true,
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::PosInt(u) => {
                if *u <= i64::MAX as u64 {
                    Some(*u as i64)
                } else {
                    None
                }
            }
            Number::NegInt(i) => Some(*i),
            Number::Float(f) => {
                let i = *f as i64;
                if i as f64 == *f {
                    Some(i)
                } else {
                    None
                }
            }
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::PosInt(u) => Some(*u),
            Number::NegInt(_) => None,
            Number::Float(f) => {
                if *f >= 0.0 {
                    let u = *f as u64;
                    if u as f64 == *f {
                        Some(u)
                    } else {
                        None
                    }
                } else {
                    None
                }
            }
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Number::PosInt(u) => Some(*u as f64),
            Number::NegInt(i) => Some(*i as f64),
            Number::Float(f) => Some(*f),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        if n >= 0 {
            Number::PosInt(n as u64)
        } else {
            Number::NegInt(n)
        }
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::PosInt(n)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::Float(n)
    }
}

macro_rules! number_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Number {
            fn from(n: $ty) -> Self {
                Number::from(n as i64)
            }
        })*
    };
}

macro_rules! number_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Number {
            fn from(n: $ty) -> Self {
                Number::PosInt(n as u64)
            }
        })*
    };
}

number_from_signed!(i8, i16, i32, isize);
number_from_unsigned!(u8, u16, u32, usize);

impl From<f32> for Number {
    fn from(n: f32) -> Self {
        Number::Float(n as f64)
    }
}

/// The canonical value tree shared by encoder and decoder.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// True for the four scalar variants. Arrays of primitives encode inline;
    /// objects whose values are all primitive are tabular candidates.
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(obj) => obj.get(key),
            _ => None,
        }
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(arr) => arr.get(index),
            _ => None,
        }
    }

    pub fn take(&mut self) -> Value {
        std::mem::replace(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Value::Array(arr) => arr.get(index).unwrap_or_else(|| {
                panic!(
                    "index {index} out of bounds for array of length {}",
                    arr.len()
                )
            }),
            _ => panic!(
                "cannot index into non-array value of type {}",
                self.type_name()
            ),
        }
    }
}

impl IndexMut<usize> for Value {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self {
            Value::Array(arr) => {
                let len = arr.len();
                arr.get_mut(index).unwrap_or_else(|| {
                    panic!("index {index} out of bounds for array of length {len}")
                })
            }
            _ => panic!(
                "cannot index into non-array value of type {}",
                self.type_name()
            ),
        }
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        match self {
            Value::Object(obj) => obj.get(key).unwrap_or_else(|| {
                panic!("key '{key}' not found in object with {} entries", obj.len())
            }),
            _ => panic!(
                "cannot index into non-object value of type {}",
                self.type_name()
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Value::Number(Number::from(n))
            }
        })*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::from(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Number(Number::from(u))
                } else if let Some(f) = n.as_f64() {
                    Value::Number(Number::from(f))
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                let mut map = Map::new();
                for (k, v) in obj {
                    map.insert(SmolStr::new(k), Value::from(v));
                }
                Value::Object(map)
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        value.clone().into()
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => match n {
                Number::PosInt(u) => serde_json::Value::Number(u.into()),
                Number::NegInt(i) => serde_json::Value::Number(i.into()),
                Number::Float(f) => serde_json::Number::from_f64(f)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(Into::into).collect())
            }
            Value::Object(obj) => {
                let mut map = serde_json::Map::new();
                for (k, v) in obj {
                    map.insert(k.to_string(), v.into());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::PosInt(u)) => serializer.serialize_u64(*u),
            Value::Number(Number::NegInt(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (key, value) in obj {
                    map.serialize_entry(key.as_str(), value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any canonical value")
            }

            fn visit_bool<E: serde::de::Error>(self, b: bool) -> Result<Value, E> {
                Ok(Value::Bool(b))
            }

            fn visit_i64<E: serde::de::Error>(self, i: i64) -> Result<Value, E> {
                Ok(Value::Number(Number::from(i)))
            }

            fn visit_u64<E: serde::de::Error>(self, u: u64) -> Result<Value, E> {
                Ok(Value::Number(Number::from(u)))
            }

            fn visit_f64<E: serde::de::Error>(self, f: f64) -> Result<Value, E> {
                Ok(Value::Number(Number::from(f)))
            }

            fn visit_str<E: serde::de::Error>(self, s: &str) -> Result<Value, E> {
                Ok(Value::String(s.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, s: String) -> Result<Value, E> {
                Ok(Value::String(s))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Array(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
                let mut map = Map::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    map.insert(SmolStr::new(key), value);
                }
                Ok(Value::Object(map))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Capability interface for types that can supply their own canonical
/// representation. The codec only ever consumes the resulting [`Value`];
/// which fields participate is the implementor's decision.
pub trait ToCanonical {
    fn to_canonical(&self) -> Value;
}

impl ToCanonical for Value {
    fn to_canonical(&self) -> Value {
        self.clone()
    }
}

impl ToCanonical for bool {
    fn to_canonical(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToCanonical for str {
    fn to_canonical(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToCanonical for String {
    fn to_canonical(&self) -> Value {
        Value::String(self.clone())
    }
}

macro_rules! to_canonical_number {
    ($($ty:ty),*) => {
        $(impl ToCanonical for $ty {
            fn to_canonical(&self) -> Value {
                Value::Number(Number::from(*self))
            }
        })*
    };
}

to_canonical_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: ToCanonical> ToCanonical for Option<T> {
    fn to_canonical(&self) -> Value {
        match self {
            Some(inner) => inner.to_canonical(),
            None => Value::Null,
        }
    }
}

impl<T: ToCanonical> ToCanonical for Vec<T> {
    fn to_canonical(&self) -> Value {
        Value::Array(self.iter().map(ToCanonical::to_canonical).collect())
    }
}

impl<T: ToCanonical> ToCanonical for [T] {
    fn to_canonical(&self) -> Value {
        Value::Array(self.iter().map(ToCanonical::to_canonical).collect())
    }
}

impl<T: ToCanonical> ToCanonical for BTreeMap<String, T> {
    fn to_canonical(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in self {
            map.insert(SmolStr::new(key), value.to_canonical());
        }
        Value::Object(map)
    }
}

impl<T: ToCanonical> ToCanonical for std::collections::HashMap<String, T> {
    fn to_canonical(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in self {
            map.insert(SmolStr::new(key), value.to_canonical());
        }
        Value::Object(map)
    }
}
