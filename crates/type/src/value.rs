// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{AttrMap, Timestamp};

/// Wire key marking a JSON object as an instant, e.g. `{"$date": "2025-…"}`.
pub const DATE_KEY: &str = "$date";

/// A single attribute value as stored inside a chunk payload.
#[derive(Clone, Debug)]
pub enum Value {
    /// Value is not defined (think null in common programming languages).
    /// Doubles as the tombstone sentinel inside deltas.
    Undefined,
    /// A boolean: true or false.
    Bool(bool),
    /// A 8-byte signed integer.
    Int(i64),
    /// A 8-byte IEEE-754 float.
    Float(f64),
    /// A UTF-8 encoded text.
    Text(String),
    /// A wall-clock instant.
    Instant(Timestamp),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A nested attribute map.
    Map(AttrMap),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_instant(&self) -> Option<Timestamp> {
        match self {
            Value::Instant(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&AttrMap> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Variant rank used to totally order values of different kinds.
    fn rank(&self) -> u8 {
        match self {
            Value::Undefined => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::Text(_) => 4,
            Value::Instant(_) => 5,
            Value::List(_) => 6,
            Value::Map(_) => 7,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Int(l), Value::Int(r)) => l == r,
            // total_cmp so that NaN compares equal to itself and deltas stay
            // stable under repeated saves of the same payload
            (Value::Float(l), Value::Float(r)) => l.total_cmp(r) == Ordering::Equal,
            (Value::Text(l), Value::Text(r)) => l == r,
            (Value::Instant(l), Value::Instant(r)) => l == r,
            (Value::List(l), Value::List(r)) => l == r,
            (Value::Map(l), Value::Map(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
            (Value::Int(l), Value::Int(r)) => l.cmp(r),
            (Value::Float(l), Value::Float(r)) => l.total_cmp(r),
            (Value::Text(l), Value::Text(r)) => l.cmp(r),
            (Value::Instant(l), Value::Instant(r)) => l.cmp(r),
            (Value::List(l), Value::List(r)) => l.cmp(r),
            (Value::Map(l), Value::Map(r)) => l.cmp(r),
            (left, right) => left.rank().cmp(&right.rank()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Int(value) => Display::fmt(value, f),
            Value::Float(value) => Display::fmt(value, f),
            Value::Text(value) => Display::fmt(value, f),
            Value::Instant(value) => Display::fmt(value, f),
            Value::List(values) => {
                f.write_str("[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(value, f)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Instant(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<AttrMap> for Value {
    fn from(value: AttrMap) -> Self {
        Value::Map(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Undefined,
            serde_json::Value::Bool(v) => Value::Bool(v),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Value::Int(v),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(v) => Value::Text(v),
            serde_json::Value::Array(values) => {
                Value::List(values.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(serde_json::Value::String(raw)) = map.get(DATE_KEY) {
                        if let Ok(instant) = raw.parse::<Timestamp>() {
                            return Value::Instant(instant);
                        }
                    }
                }
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Undefined => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(v),
            Value::Int(v) => serde_json::Value::Number(v.into()),
            Value::Float(v) => serde_json::Number::from_f64(v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(v) => serde_json::Value::String(v),
            Value::Instant(v) => {
                serde_json::json!({ DATE_KEY: v.to_rfc3339() })
            }
            Value::List(values) => {
                serde_json::Value::Array(values.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Text(v) => serializer.serialize_str(v),
            Value::Instant(v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(DATE_KEY, &v.to_rfc3339())?;
                map.end()
            }
            Value::List(values) => values.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from(value))
    }
}

#[cfg(test)]
mod test {
    use crate::{Timestamp, Value, attrs};

    #[test]
    fn test_deep_equality() {
        let left = Value::Map(attrs! { "tags" => vec![Value::from("a"), Value::from("b")] });
        let right = Value::Map(attrs! { "tags" => vec![Value::from("a"), Value::from("b")] });
        assert_eq!(left, right);

        let reordered = Value::Map(attrs! { "tags" => vec![Value::from("b"), Value::from("a")] });
        assert_ne!(left, reordered);
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(f64::NAN), Value::Float(0.0));
    }

    #[test]
    fn test_cross_variant_inequality() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Undefined, Value::Text("undefined".into()));
    }

    #[test]
    fn test_json_round_trip_keeps_instants() {
        let instant = Timestamp::now();
        let original = Value::Instant(instant);
        let json: serde_json::Value = original.clone().into();
        assert_eq!(Value::from(json), original);
    }

    #[test]
    fn test_ordering_is_total() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Int(3),
            Value::Undefined,
            Value::Int(-1),
            Value::Text("a".into()),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Undefined,
                Value::Int(-1),
                Value::Int(3),
                Value::Text("a".into()),
                Value::Text("b".into()),
            ]
        );
    }
}
