use std::collections::BTreeMap;

use docserde_core::config::ConfigurationSource;
use docserde_core::error::ConfigError;
use docserde_core::schema::Schema;
use serde::Serialize;

use super::{column_options, parse_bool, resolve_bool};
use crate::keys;

/// Per-column overflow strictness: `true` fails the value, `false` keeps a
/// best-effort truncated/clamped value.
///
/// Resolution order per column: `ion.<column>.fail_on_overflow`, then
/// membership in `ion.fail_on_overflow.exceptions` (inverts the default),
/// then `ion.fail_on_overflow` (default `true`). The name and index forms of
/// the per-column key must agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverflowPolicy {
    default: bool,
    by_column: Vec<bool>,
}

impl OverflowPolicy {
    pub fn resolve(
        source: &dyn ConfigurationSource,
        schema: &Schema,
        errors: &mut Vec<ConfigError>,
    ) -> Self {
        let default = resolve_bool(source, keys::FAIL_ON_OVERFLOW, true, errors);
        let mut by_column = vec![default; schema.len()];

        for name in source.get_list(keys::FAIL_ON_OVERFLOW_EXCEPTIONS, ',') {
            match schema.index_of(&name) {
                Some(idx) => by_column[idx] = !default,
                None => errors.push(ConfigError::UnknownColumn {
                    key: keys::FAIL_ON_OVERFLOW_EXCEPTIONS.to_string(),
                    column: name,
                }),
            }
        }

        let mut explicit: BTreeMap<usize, (bool, &str)> = BTreeMap::new();
        for (idx, key, raw) in
            column_options(source, schema, keys::FAIL_ON_OVERFLOW_SUFFIX, errors)
        {
            let Some(v) = parse_bool(key, raw, errors) else {
                continue;
            };
            match explicit.get(&idx).copied() {
                Some((prev, prev_raw)) if prev != v => {
                    errors.push(ConfigError::ConflictingOverride {
                        column: schema.fields[idx].name.clone(),
                        option: keys::FAIL_ON_OVERFLOW_SUFFIX.to_string(),
                        first: prev_raw.trim().to_string(),
                        second: raw.trim().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    explicit.insert(idx, (v, raw));
                    by_column[idx] = v;
                }
            }
        }

        Self { default, by_column }
    }

    pub fn default_policy(&self) -> bool {
        self.default
    }

    /// # Panics
    ///
    /// If `index` is not a declared column.
    pub fn for_index(&self, index: usize) -> bool {
        self.by_column[index]
    }
}
