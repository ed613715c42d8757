use std::fmt;

use thiserror::Error;

use crate::document::DocType;

/// Canonical result for core and every layer built on it.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Construction-time misconfiguration. Never raised while processing rows.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigErrors),

    /// A conversion would lose information and the column's policy is strict.
    #[error("Overflow in column '{column}': {value} does not fit {target}")]
    Overflow {
        column: String,
        value: String,
        target: String,
    },

    /// A matched value cannot be coerced into the column's declared type.
    #[error("Structural mismatch in column '{column}': expected {expected}, found {found}")]
    StructuralMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl Error {
    /// Name of the column a per-row failure is scoped to, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Error::Overflow { column, .. } | Error::StructuralMismatch { column, .. } => {
                Some(column)
            }
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(ConfigErrors(vec![e]))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}

/// One misconfiguration discovered while resolving options against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("option '{key}' references unknown column '{column}'")]
    UnknownColumn { key: String, column: String },

    #[error("option '{key}' references column index {index}, but the table has {column_count} columns")]
    ColumnIndexOutOfRange {
        key: String,
        index: usize,
        column_count: usize,
    },

    #[error("option '{key}' has unrecognized value '{value}'; expected one of {}", .expected.join(", "))]
    InvalidEnumValue {
        key: String,
        value: String,
        expected: Vec<String>,
    },

    #[error("option '{key}' has invalid value '{value}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("column '{column}' cannot be serialized as '{requested}'; legal types are {}", join_types(.legal))]
    IllegalOverride {
        column: String,
        requested: String,
        legal: Vec<DocType>,
    },

    #[error("column '{column}' of type {data_type} has a single document mapping and accepts no serialize_as override (requested '{requested}')")]
    OverrideNotSupported {
        column: String,
        data_type: String,
        requested: String,
    },

    /// The name form and the index form of a per-column key disagree.
    #[error("column '{column}' has conflicting {option} values '{first}' and '{second}'")]
    ConflictingOverride {
        column: String,
        option: String,
        first: String,
        second: String,
    },

    #[error("column '{column}' has malformed path expression '{path}': {reason}")]
    MalformedPath {
        column: String,
        path: String,
        reason: String,
    },

    #[error("columns '{first}' and '{second}' are both bound to path {path} and aliasing is disabled")]
    DuplicatePath {
        first: String,
        second: String,
        path: String,
    },

    #[error("columns '{first}' and '{second}' would both be written to top-level field '{field}'")]
    WriteConflict {
        first: String,
        second: String,
        field: String,
    },

    #[error("schema has {names} column names but {types} column types")]
    SchemaArity { names: usize, types: usize },

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("invalid type '{type_name}' for column '{column}': {reason}")]
    InvalidColumnType {
        column: String,
        type_name: String,
        reason: String,
    },

    #[error("missing required option '{0}'")]
    MissingOption(String),
}

fn join_types(types: &[DocType]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every error found while constructing a configuration, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no errors"),
            [only] => write!(f, "{}", only),
            all => {
                write!(f, "{} errors: ", all.len())?;
                for (i, e) in all.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigErrors {}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
