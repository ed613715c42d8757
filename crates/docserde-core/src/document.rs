//! Hierarchical, self-describing document values.
//!
//! This is the in-memory tree the document reader produces and the writer
//! consumes. Physical encodings (text/binary) are owned by the reader/writer;
//! this module only models values and their types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Decimal;

/// Document value types. A null may be tagged with any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Timestamp,
    Symbol,
    String,
    Clob,
    Blob,
    List,
    Sexp,
    Struct,
}

impl DocType {
    pub const ALL: [DocType; 13] = [
        DocType::Null,
        DocType::Bool,
        DocType::Int,
        DocType::Float,
        DocType::Decimal,
        DocType::Timestamp,
        DocType::Symbol,
        DocType::String,
        DocType::Clob,
        DocType::Blob,
        DocType::List,
        DocType::Sexp,
        DocType::Struct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Null => "null",
            DocType::Bool => "bool",
            DocType::Int => "int",
            DocType::Float => "float",
            DocType::Decimal => "decimal",
            DocType::Timestamp => "timestamp",
            DocType::Symbol => "symbol",
            DocType::String => "string",
            DocType::Clob => "clob",
            DocType::Blob => "blob",
            DocType::List => "list",
            DocType::Sexp => "sexp",
            DocType::Struct => "struct",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, DocType::List | DocType::Sexp | DocType::Struct)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    /// Case-insensitive; `boolean` is accepted as an alias for `bool`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "boolean" {
            return Ok(DocType::Bool);
        }
        DocType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("unknown document type '{}'", s))
    }
}

/// Point in time. `offset_minutes == None` is the unknown-offset form: the
/// instant was written without zone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Milliseconds since the Unix epoch, UTC.
    pub epoch_millis: i64,
    pub offset_minutes: Option<i32>,
}

impl Timestamp {
    pub fn new(epoch_millis: i64, offset_minutes: Option<i32>) -> Self {
        Self {
            epoch_millis,
            offset_minutes,
        }
    }

    pub fn has_offset(&self) -> bool {
        self.offset_minutes.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocValue {
    /// Null tagged with a type; `DocType::Null` is the untyped null.
    Null(DocType),
    Bool(bool),
    Int(i128),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    Symbol(String),
    String(String),
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    List(Vec<DocValue>),
    Sexp(Vec<DocValue>),
    /// Ordered fields; names may repeat.
    Struct(Vec<(String, DocValue)>),
}

impl DocValue {
    pub fn untyped_null() -> Self {
        DocValue::Null(DocType::Null)
    }

    pub fn empty_struct() -> Self {
        DocValue::Struct(Vec::new())
    }

    /// Build a struct from `(name, value)` pairs.
    pub fn structure<K: Into<String>>(fields: impl IntoIterator<Item = (K, DocValue)>) -> Self {
        DocValue::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Type of the value; for nulls, the type the null is tagged with.
    pub fn doc_type(&self) -> DocType {
        match self {
            DocValue::Null(t) => *t,
            DocValue::Bool(_) => DocType::Bool,
            DocValue::Int(_) => DocType::Int,
            DocValue::Float(_) => DocType::Float,
            DocValue::Decimal(_) => DocType::Decimal,
            DocValue::Timestamp(_) => DocType::Timestamp,
            DocValue::Symbol(_) => DocType::Symbol,
            DocValue::String(_) => DocType::String,
            DocValue::Clob(_) => DocType::Clob,
            DocValue::Blob(_) => DocType::Blob,
            DocValue::List(_) => DocType::List,
            DocValue::Sexp(_) => DocType::Sexp,
            DocValue::Struct(_) => DocType::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null(_))
    }

    /// First field named `name` (exact match) when this is a struct.
    pub fn get(&self, name: &str) -> Option<&DocValue> {
        match self {
            DocValue::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Elements of a list or sexp.
    pub fn elements(&self) -> Option<&[DocValue]> {
        match self {
            DocValue::List(items) | DocValue::Sexp(items) => Some(items),
            _ => None,
        }
    }

    /// Convert a JSON value: numbers become ints when integral, objects become structs.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value as J;
        match value {
            J::Null => DocValue::untyped_null(),
            J::Bool(b) => DocValue::Bool(*b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DocValue::Int(i as i128)
                } else if let Some(u) = n.as_u64() {
                    DocValue::Int(u as i128)
                } else {
                    DocValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            J::String(s) => DocValue::String(s.clone()),
            J::Array(items) => DocValue::List(items.iter().map(DocValue::from_json).collect()),
            J::Object(map) => DocValue::Struct(
                map.iter()
                    .map(|(k, v)| (k.clone(), DocValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Lossy JSON view for inspection. Typed nulls become `null`, symbols
    /// become strings, lobs become byte arrays, timestamps become epoch millis.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            DocValue::Null(_) => J::Null,
            DocValue::Bool(b) => J::Bool(*b),
            DocValue::Int(i) => i64::try_from(*i)
                .map(J::from)
                .unwrap_or_else(|_| J::String(i.to_string())),
            DocValue::Float(f) => J::from(*f),
            DocValue::Decimal(d) => J::String(d.to_string()),
            DocValue::Timestamp(ts) => J::from(ts.epoch_millis),
            DocValue::Symbol(s) | DocValue::String(s) => J::String(s.clone()),
            DocValue::Clob(b) | DocValue::Blob(b) => {
                J::Array(b.iter().map(|x| J::from(*x)).collect())
            }
            DocValue::List(items) | DocValue::Sexp(items) => {
                J::Array(items.iter().map(DocValue::to_json).collect())
            }
            DocValue::Struct(fields) => J::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}
