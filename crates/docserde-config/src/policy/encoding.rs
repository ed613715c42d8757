use std::fmt;

use docserde_core::config::ConfigurationSource;
use docserde_core::error::ConfigError;
use serde::Serialize;

use super::resolve_literal;
use crate::keys;

/// Physical form the document writer emits. Only consulted when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Encoding {
    #[default]
    Binary,
    Text,
}

impl Encoding {
    const LITERALS: [(&'static str, Encoding); 2] =
        [("BINARY", Encoding::Binary), ("TEXT", Encoding::Text)];

    pub fn resolve(source: &dyn ConfigurationSource, errors: &mut Vec<ConfigError>) -> Self {
        resolve_literal(
            source,
            keys::ENCODING,
            &Self::LITERALS,
            Self::default(),
            errors,
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Binary => "BINARY",
            Encoding::Text => "TEXT",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
