#![forbid(unsafe_code)]
//! docserde-config: resolves a flat option bag plus a table schema into one
//! immutable, validated SerDe configuration.
//!
//! Layout:
//! - `keys`: option key names and per-column key parsing.
//! - `policy`: one resolver per configuration axis (encoding, null strategy,
//!   timestamp offset, overflow, serialize-as override, path binding).
//! - `plan`: the extraction plan (document -> rows) and its builder.
//! - `compose`: the inverse composition plan (row -> document).
//! - `convert`: value coercion in both directions under the overflow policy.
//! - `properties`: the `SerDeProperties` facade consulted per row.
//!
//! Resolution is synchronous and runs once per table session; every type
//! produced here is immutable and `Send + Sync`.

pub mod compose;
pub mod convert;
pub mod keys;
pub mod plan;
pub mod policy;
pub mod properties;

pub use compose::CompositionPlan;
pub use convert::Conversion;
pub use plan::{ExtractionPlan, ExtractionPlanBuilder, MatchRow};
pub use policy::{
    Encoding, NullStrategy, OverflowPolicy, PathBindingPolicy, SerializeAsPolicy,
    TimestampOffset,
};
pub use properties::SerDeProperties;
