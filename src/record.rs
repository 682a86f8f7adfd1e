//! Structured records handed to the converter.
//!
//! A [`Record`] is an ordered mapping from field name to [`Value`]. Field order is insertion
//! order and survives removals, so the JSON written for a record lists its fields in the order
//! they were added.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Type of a [`Value`], used when reporting mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Null,
    Boolean,
    Int64,
    Double,
    String,
    Timestamp,
    Array,
    Row,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Null => "NULL",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Int64 => "INT64",
            FieldType::Double => "DOUBLE",
            FieldType::String => "STRING",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Array => "ARRAY",
            FieldType::Row => "ROW",
        };
        f.write_str(name)
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int64(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Row(Record),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Null => FieldType::Null,
            Value::Boolean(_) => FieldType::Boolean,
            Value::Int64(_) => FieldType::Int64,
            Value::Double(_) => FieldType::Double,
            Value::String(_) => FieldType::String,
            Value::Timestamp(_) => FieldType::Timestamp,
            Value::Array(_) => FieldType::Array,
            Value::Row(_) => FieldType::Row,
        }
    }

    /// Returns the instant held by a timestamp value.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int64(i) => serializer.serialize_i64(*i),
            // serde_json writes non-finite floats as null
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(t) => {
                serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Row(record) => record.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int64(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Row(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Ordered field-name to value mapping representing one logical row.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

// Two records are equal only when their fields also appear in the same order.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields.iter().eq(other.fields.iter())
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field and returns the record, for building records inline.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field. A new name goes to the end; an existing name keeps its position and
    /// the previous value is returned.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Removes a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Record {
    fn from(fields: Vec<(K, V)>) -> Self {
        fields.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_insert_keeps_position_of_existing_field() {
        let mut record = Record::new().with_field("a", 1).with_field("b", "x");
        let previous = record.insert("a", 2);
        assert_eq!(previous, Some(Value::Int64(1)));
        assert_eq!(record.field_names(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Int64(2)));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut record = Record::from(vec![
            ("a", Value::from(1)),
            ("event_timestamp", Value::Null),
            ("b", Value::from("x")),
            ("c", Value::from(true)),
        ]);
        assert_eq!(record.remove("event_timestamp"), Some(Value::Null));
        assert_eq!(record.field_names(), vec!["a", "b", "c"]);
        assert_eq!(record.remove("missing"), None);
        assert_eq!(record.len(), 3);
        let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_serialize_in_field_order() {
        let record = Record::new()
            .with_field("zeta", 1)
            .with_field("alpha", "two")
            .with_field("mid", Value::Null);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":"two","mid":null}"#);
    }

    #[test]
    fn test_serialize_nested_values() {
        let inner = Record::new().with_field("x", 1.5).with_field("y", false);
        let record = Record::new()
            .with_field("tags", vec![Value::from("a"), Value::from("b")])
            .with_field("point", inner)
            .with_field("note", "say \"hi\"\n");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"tags":["a","b"],"point":{"x":1.5,"y":false},"note":"say \"hi\"\n"}"#
        );
    }

    #[test]
    fn test_serialize_timestamp_and_non_finite_double() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = Record::new()
            .with_field("at", t)
            .with_field("at_nanos", t + chrono::Duration::nanoseconds(1_500))
            .with_field("ratio", f64::NAN);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"at":"2024-01-01T00:00:00Z","at_nanos":"2024-01-01T00:00:00.000001500Z","ratio":null}"#
        );
    }

    #[test]
    fn test_equality_depends_on_order() {
        let ab = Record::new().with_field("a", 1).with_field("b", 2);
        let ba = Record::new().with_field("b", 2).with_field("a", 1);
        assert_ne!(ab, ba);
        assert_eq!(ab, Record::from(vec![("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_field_types() {
        assert_eq!(Value::from(Option::<i64>::None).field_type(), FieldType::Null);
        assert_eq!(Value::from(7i64).field_type(), FieldType::Int64);
        assert_eq!(Value::from("s").field_type(), FieldType::String);
        assert_eq!(FieldType::Timestamp.to_string(), "TIMESTAMP");
        assert!(Value::from("2024-01-01T00:00:00Z").as_timestamp().is_none());
    }
}
