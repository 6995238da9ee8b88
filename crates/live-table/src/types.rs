//! Core data model: keys, scalar field values, records and collections.
//!
//! Records travel over the channel as JSON objects (the shape push-based
//! document stores deliver), so every type here converts to and from
//! `serde_json::Value`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// ============================================================================
// Key
// ============================================================================

/// Opaque record key assigned by the store on creation. Never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// FieldValue
// ============================================================================

/// A scalar field value. Enumerated statuses are `Text` values constrained by
/// the entity schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Text used for substring search and display.
    ///
    /// Whole numbers render without a fractional part (`50`, not `50.0`).
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            // Whole numbers go out as JSON integers.
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Value::from(*n as i64),
            Self::Number(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

// ============================================================================
// Record
// ============================================================================

/// A mapping from field name to scalar value.
///
/// Equality is full structural equality over every field, which is what
/// edit-session dirtiness is defined against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, FieldValue>);

impl Record {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Shallow merge: every field of `partial` overwrites the same field here.
    pub fn merge(&mut self, partial: &Record) {
        for (k, v) in partial.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Decode a record from a JSON object.
    ///
    /// `null` fields are treated as absent. Booleans, arrays and nested
    /// objects are not scalar field values and are rejected.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("expected object, received {}", json_type_name(value)))?;
        let mut fields = BTreeMap::new();
        for (name, v) in obj {
            match v {
                Value::Null => {}
                Value::String(s) => {
                    fields.insert(name.clone(), FieldValue::Text(s.clone()));
                }
                Value::Number(n) => {
                    let n = n
                        .as_f64()
                        .ok_or_else(|| format!("field \"{name}\": number out of range"))?;
                    fields.insert(name.clone(), FieldValue::Number(n));
                }
                other => {
                    return Err(format!(
                        "field \"{name}\": expected text or number, received {}",
                        json_type_name(other)
                    ));
                }
            }
        }
        Ok(Self(fields))
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Collection
// ============================================================================

/// A whole collection: key → record.
pub type Collection = BTreeMap<Key, Record>;

/// Decode a whole-collection snapshot.
///
/// `null` is the empty collection (a store with no children reports no
/// value at all). Otherwise the value must be an object of record objects.
pub fn collection_from_json(value: &Value) -> Result<Collection, String> {
    match value {
        Value::Null => Ok(Collection::new()),
        Value::Object(obj) => {
            let mut out = Collection::new();
            for (key, record) in obj {
                let record = Record::from_json(record).map_err(|e| format!("record {key}: {e}"))?;
                out.insert(Key::new(key.clone()), record);
            }
            Ok(out)
        }
        other => Err(format!(
            "expected object of records, received {}",
            json_type_name(other)
        )),
    }
}

pub fn collection_to_json(collection: &Collection) -> Value {
    let map: Map<String, Value> = collection
        .iter()
        .map(|(k, r)| (k.as_str().to_string(), r.to_json()))
        .collect();
    Value::Object(map)
}

/// A keyed record as shown in an ordered view.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: Key,
    pub record: Record,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
