#![forbid(unsafe_code)]
//! docserde-core: shared data model for the document <-> table SerDe.
//!
//! This crate holds pure data types only:
//! - the table model (`schema::{DataType, Field, Schema}`) and table values
//!   (`types::{Scalar, Row, RowBatch}`),
//! - the hierarchical document model (`document::{DocType, DocValue}`),
//! - the flat option bag contract (`config::ConfigurationSource`),
//! - the error taxonomy shared by every layer above.
//!
//! No path matching or policy resolution lives here; see `docserde-path` and
//! `docserde-config`.

pub mod config;
pub mod document;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod schema;
pub mod types;

/// Crate version, surfaced in configuration fingerprints.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
