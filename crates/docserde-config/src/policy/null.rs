use std::fmt;

use docserde_core::config::ConfigurationSource;
use docserde_core::document::{DocType, DocValue};
use docserde_core::error::ConfigError;
use serde::Serialize;

use super::resolve_literal;
use crate::keys;

/// How a table-null is written. Applies uniformly to every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NullStrategy {
    /// Emit no field for the column.
    Omit,
    /// Emit an untyped null.
    #[default]
    Untyped,
    /// Emit a null tagged with the column's serialization type.
    Typed,
}

impl NullStrategy {
    const LITERALS: [(&'static str, NullStrategy); 3] = [
        ("OMIT", NullStrategy::Omit),
        ("UNTYPED", NullStrategy::Untyped),
        ("TYPED", NullStrategy::Typed),
    ];

    pub fn resolve(source: &dyn ConfigurationSource, errors: &mut Vec<ConfigError>) -> Self {
        resolve_literal(
            source,
            keys::SERIALIZE_NULL,
            &Self::LITERALS,
            Self::default(),
            errors,
        )
    }

    /// The document value for a null of `doc_type`, or `None` to omit it.
    pub fn null_value(&self, doc_type: DocType) -> Option<DocValue> {
        match self {
            NullStrategy::Omit => None,
            NullStrategy::Untyped => Some(DocValue::untyped_null()),
            NullStrategy::Typed => Some(DocValue::Null(doc_type)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NullStrategy::Omit => "OMIT",
            NullStrategy::Untyped => "UNTYPED",
            NullStrategy::Typed => "TYPED",
        }
    }
}

impl fmt::Display for NullStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
