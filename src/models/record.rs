//! Normalized record model
//!
//! A [`Record`] is what a stream emits: the declared fields of one upstream
//! object, in declared order. Non-integer numbers are held as [`BigDecimal`]
//! so monetary amounts never pass through floating point and never lose
//! digits, however many the upstream literal carries.

use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// A numeric literal that does not parse as a decimal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid decimal literal: {literal}")]
pub struct InvalidNumber {
    pub literal: String,
}

/// Parse a JSON numeric literal into an unbounded [`BigDecimal`], keeping
/// every digit and the literal's scale.
pub fn parse_decimal(literal: &str) -> Result<BigDecimal, InvalidNumber> {
    BigDecimal::from_str(literal).map_err(|_| InvalidNumber {
        literal: literal.to_string(),
    })
}

/// A single value inside a normalized record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(BigDecimal),
    String(String),
    Array(Vec<FieldValue>),
    Object(Vec<(String, FieldValue)>),
}

impl FieldValue {
    /// Convert a decoded JSON value. Integer literals that fit `i64` stay
    /// integers; every other number becomes a [`BigDecimal`].
    pub fn from_json(value: Value) -> Result<Self, InvalidNumber> {
        Ok(match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Decimal(parse_decimal(&n.to_string())?),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(
                items
                    .into_iter()
                    .map(FieldValue::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(k, v)| FieldValue::from_json(v).map(|v| (k, v)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Widen an integer to a decimal; other values are returned unchanged.
    pub fn into_decimal(self) -> Self {
        match self {
            FieldValue::Integer(i) => FieldValue::Decimal(BigDecimal::from(i)),
            other => other,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            FieldValue::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Whether the value counts as present: null, `false`, zero, and empty
    /// strings or containers do not.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Integer(i) => *i != 0,
            FieldValue::Decimal(d) => !d.is_zero(),
            FieldValue::String(s) => !s.is_empty(),
            FieldValue::Array(items) => !items.is_empty(),
            FieldValue::Object(fields) => !fields.is_empty(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Decimal(d) => {
                // Plain notation keeps the scale: 100.50 stays 100.50.
                let number =
                    serde_json::Number::from_str(&d.to_plain_string()).map_err(S::Error::custom)?;
                number.serialize(serializer)
            }
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FieldValue::Object(fields) => serialize_fields(fields, serializer),
        }
    }
}

fn serialize_fields<S: Serializer>(
    fields: &[(String, FieldValue)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (key, value) in fields {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// One normalized record, fields in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Field names in emission order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as a JSON value, keeping field order and decimal precision.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fields(&self.fields, serializer)
    }
}
