//! Per-axis policy resolvers.
//!
//! Every resolver has the same shape: it reads the option bag (and the schema
//! when the axis is per-column), pushes each problem it finds onto a shared
//! error list, and still returns a usable value so the remaining axes can be
//! checked. The facade discards everything if any error was recorded.
//!
//! Precedence is the same on every axis: explicit per-column key, then list
//! membership (overflow only), then the global default.

mod encoding;
mod null;
mod overflow;
mod path;
mod serialize_as;
mod timestamp;

pub use encoding::Encoding;
pub use null::NullStrategy;
pub use overflow::OverflowPolicy;
pub use path::PathBindingPolicy;
pub use serialize_as::{legal_overrides, SerializeAsPolicy};
pub use timestamp::TimestampOffset;

use docserde_core::config::ConfigurationSource;
use docserde_core::error::ConfigError;
use docserde_core::schema::Schema;

use crate::keys::{self, ColumnRef};

/// Parse a `true`/`false` option (case-insensitive), recording bad values.
pub(crate) fn resolve_bool(
    source: &dyn ConfigurationSource,
    key: &str,
    default: bool,
    errors: &mut Vec<ConfigError>,
) -> bool {
    match source.get(key) {
        None => default,
        Some(raw) => parse_bool(key, raw, errors).unwrap_or(default),
    }
}

pub(crate) fn parse_bool(key: &str, raw: &str, errors: &mut Vec<ConfigError>) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => {
            errors.push(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                reason: "expected 'true' or 'false'".into(),
            });
            None
        }
    }
}

/// Exact-match an enum literal against `(literal, value)` pairs.
pub(crate) fn resolve_literal<T: Copy>(
    source: &dyn ConfigurationSource,
    key: &str,
    table: &[(&str, T)],
    default: T,
    errors: &mut Vec<ConfigError>,
) -> T {
    let Some(raw) = source.get(key) else {
        return default;
    };
    match table.iter().find(|(lit, _)| *lit == raw) {
        Some((_, v)) => *v,
        None => {
            errors.push(ConfigError::InvalidEnumValue {
                key: key.to_string(),
                value: raw.to_string(),
                expected: table.iter().map(|(lit, _)| lit.to_string()).collect(),
            });
            default
        }
    }
}

/// Every per-column option with the given suffix, resolved to a column index,
/// in key order. Keys naming unknown columns are reported and skipped.
pub(crate) fn column_options<'s>(
    source: &'s dyn ConfigurationSource,
    schema: &Schema,
    suffix: &str,
    errors: &mut Vec<ConfigError>,
) -> Vec<(usize, &'s str, &'s str)> {
    let mut found: Vec<&str> = source
        .keys()
        .filter(|k| keys::parse_column_key(k, suffix).is_some())
        .collect();
    found.sort_unstable();

    let mut out = Vec::with_capacity(found.len());
    for key in found {
        let Some(value) = source.get(key) else {
            continue;
        };
        let Some(column) = keys::parse_column_key(key, suffix) else {
            continue;
        };
        match column_index(schema, key, column) {
            Ok(idx) => out.push((idx, key, value)),
            Err(e) => errors.push(e),
        }
    }
    out
}

pub(crate) fn column_index(
    schema: &Schema,
    key: &str,
    column: ColumnRef<'_>,
) -> Result<usize, ConfigError> {
    match column {
        ColumnRef::Name(name) => schema.index_of(name).ok_or_else(|| ConfigError::UnknownColumn {
            key: key.to_string(),
            column: name.to_string(),
        }),
        ColumnRef::Index(i) if i < schema.len() => Ok(i),
        ColumnRef::Index(i) => Err(ConfigError::ColumnIndexOutOfRange {
            key: key.to_string(),
            index: i,
            column_count: schema.len(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use docserde_core::schema::{DataType, Field, Schema};

    pub fn schema(cols: &[(&str, DataType)]) -> Schema {
        Schema::new(
            cols.iter()
                .map(|(n, t)| Field::new(*n, t.clone(), true))
                .collect(),
        )
    }
}
