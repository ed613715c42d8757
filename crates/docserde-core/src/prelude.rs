//! Convenient re-exports for downstream crates.

pub use crate::config::{ConfigurationSource, Properties};
pub use crate::document::{DocType, DocValue};
pub use crate::error::{ConfigError, ConfigErrors, Error, Result};
pub use crate::hash::Hash256;
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Decimal, Row, RowBatch, Scalar};
