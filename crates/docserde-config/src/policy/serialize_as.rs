use std::collections::BTreeMap;

use docserde_core::config::ConfigurationSource;
use docserde_core::document::DocType;
use docserde_core::error::ConfigError;
use docserde_core::schema::{DataType, Schema};
use serde::Serialize;

use super::column_options;
use crate::keys;

/// Document types a table type may be written as when it maps ambiguously.
/// Empty for types with a single legal mapping.
pub fn legal_overrides(data_type: &DataType) -> &'static [DocType] {
    match data_type {
        DataType::String | DataType::Char(_) | DataType::Varchar(_) => {
            &[DocType::String, DocType::Symbol]
        }
        DataType::Binary => &[DocType::Blob, DocType::Clob],
        DataType::Array(_) => &[DocType::List, DocType::Sexp],
        _ => &[],
    }
}

/// Serialization document type per column: the `serialize_as` override when
/// one is configured, else the declared type's canonical mapping.
///
/// Overrides come from `ion.<column>.serialize_as` or
/// `ion.column[<index>].serialize_as`; both forms naming the same column must
/// agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializeAsPolicy {
    by_column: Vec<DocType>,
}

impl SerializeAsPolicy {
    pub fn resolve(
        source: &dyn ConfigurationSource,
        schema: &Schema,
        errors: &mut Vec<ConfigError>,
    ) -> Self {
        let mut by_column: Vec<DocType> = schema
            .fields
            .iter()
            .map(|f| f.data_type.canonical_doc_type())
            .collect();

        let mut requested: BTreeMap<usize, &str> = BTreeMap::new();
        for (idx, _key, raw) in column_options(source, schema, keys::SERIALIZE_AS_SUFFIX, errors) {
            let raw = raw.trim();
            match requested.get(&idx).copied() {
                Some(prev) if !same_literal(prev, raw) => {
                    errors.push(ConfigError::ConflictingOverride {
                        column: schema.fields[idx].name.clone(),
                        option: keys::SERIALIZE_AS_SUFFIX.to_string(),
                        first: prev.to_string(),
                        second: raw.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    requested.insert(idx, raw);
                }
            }
        }

        for (idx, raw) in requested {
            let field = &schema.fields[idx];
            let legal = legal_overrides(&field.data_type);
            if legal.is_empty() {
                errors.push(ConfigError::OverrideNotSupported {
                    column: field.name.clone(),
                    data_type: field.data_type.to_string(),
                    requested: raw.to_string(),
                });
                continue;
            }
            match raw.parse::<DocType>() {
                Ok(t) if legal.contains(&t) => by_column[idx] = t,
                _ => errors.push(ConfigError::IllegalOverride {
                    column: field.name.clone(),
                    requested: raw.to_string(),
                    legal: legal.to_vec(),
                }),
            }
        }

        Self { by_column }
    }

    /// # Panics
    ///
    /// If `index` is not a declared column.
    pub fn for_index(&self, index: usize) -> DocType {
        self.by_column[index]
    }
}

fn same_literal(a: &str, b: &str) -> bool {
    match (a.parse::<DocType>(), b.parse::<DocType>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}
