#![forbid(unsafe_code)]
//! docserde: configuration resolution and path binding for a document <-> table SerDe.
//!
//! The pieces live in member crates; this crate re-exports them under one name.
//!
//! ```no_run
//! use docserde::prelude::*;
//!
//! let props = Properties::new()
//!     .with("ion.serialize_null", "TYPED")
//!     .with("ion.name.path_extractor", "(meta name)");
//! let names = vec!["id".to_string(), "name".to_string()];
//! let table = SerDeProperties::new(&props, &names, &[DataType::BigInt, DataType::String])?;
//!
//! let doc = DocValue::from_json(&serde_json::json!({"id": 1, "meta": {"name": "x"}}));
//! let rows = table.extract_rows(&doc)?;
//! let _written = table.compose_row(&rows[0])?;
//! # Ok::<(), docserde::model::error::Error>(())
//! ```

pub use docserde_config as config;
pub use docserde_core as model;
pub use docserde_path as path;

pub use docserde_config::SerDeProperties;

pub mod prelude {
    pub use docserde_config::{
        CompositionPlan, Encoding, ExtractionPlan, NullStrategy, SerDeProperties,
    };
    pub use docserde_core::prelude::*;
    pub use docserde_path::{PathMatcher, PathSpec, PathStep, StructuralMatcher};
}
