#![forbid(unsafe_code)]
//! docserde-path: structural path expressions over document values.
//!
//! - `spec` parses `( step* )` expressions into `PathSpec`.
//! - `matcher` is the path-matching capability: given a step and a value it
//!   reports every matched sub-value through a callback. Extraction plans in
//!   `docserde-config` drive it step by step; they never walk documents
//!   themselves.

pub mod matcher;
pub mod spec;

pub use matcher::{PathMatcher, StructuralMatcher};
pub use spec::{field_names_eq, fold_field_name, PathError, PathSpec, PathStep};
