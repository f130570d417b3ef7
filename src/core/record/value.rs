// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed field values.
//!
//! A `Value` is the payload of one record field: a scalar, or a nested
//! array/map for JSON input. Readers of line-oriented formats infer `Int`
//! and `Float` from the raw text only when the rendering round-trips
//! losslessly; anything else stays a `String`, so `007` and `1.0` keep
//! their original spelling through the pipeline.

use std::cmp::Ordering;
use std::fmt;

use crate::core::record::Record;

/// One field value: scalar, or nested for JSON-shaped records.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<Value>),
    Map(Record),
}

impl Value {
    /// Infer a typed value from raw input text.
    ///
    /// Inference is applied only when lossless: the parsed number must
    /// render back to the exact input text. Everything else, including
    /// the empty string, stays a `String`.
    pub fn from_inferred(text: &str) -> Value {
        if let Ok(i) = text.parse::<i64>() {
            if i.to_string() == text {
                return Value::Int(i);
            }
        }
        if let Ok(f) = text.parse::<f64>() {
            if f.is_finite() && f.to_string() == text {
                return Value::Float(f);
            }
        }
        Value::String(text.to_string())
    }

    /// Lexical comparison of rendered values, used for sort-merge join
    /// keys: both sides are compared as strings even when numeric.
    pub fn lexical_cmp(&self, other: &Value) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }

    /// Convert from a parsed JSON value. Nested-object field order is
    /// preserved (serde_json is built with `preserve_order`).
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::String(String::new()),
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => {
                let mut record = Record::new();
                for (key, value) in fields {
                    record.put(key.clone(), Value::from_json(value));
                }
                Value::Map(record)
            }
        }
    }

    /// Convert to a JSON value for the JSON writer.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(record) => {
                let mut fields = serde_json::Map::new();
                for (key, value) in record.iter() {
                    fields.insert(key.clone(), value.to_json());
                }
                serde_json::Value::Object(fields)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            // Nested values render as JSON text in line-oriented formats.
            Value::Array(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Lexical comparison of two key tuples, field by field.
///
/// Both tuples are guaranteed same-length by construction-time validation
/// of the join-field lists.
pub fn compare_lexically(left: &[Value], right: &[Value]) -> Ordering {
    debug_assert_eq!(left.len(), right.len());
    for (l, r) in left.iter().zip(right.iter()) {
        let cmp = l.lexical_cmp(r);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}
