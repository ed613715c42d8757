//! Option keys understood by the resolvers.
//!
//! Global keys are constants. Per-column keys take either form
//! `ion.<column>.<suffix>` or `ion.column[<index>].<suffix>`.

pub const ENCODING: &str = "ion.encoding";
pub const SERIALIZE_NULL: &str = "ion.serialize_null";
pub const TIMESTAMP_OFFSET: &str = "ion.timestamp.serialization_offset";
pub const FAIL_ON_OVERFLOW: &str = "ion.fail_on_overflow";
pub const FAIL_ON_OVERFLOW_EXCEPTIONS: &str = "ion.fail_on_overflow.exceptions";
pub const PATH_CASE_SENSITIVE: &str = "ion.path_extractor.case_sensitive";
pub const PATH_ALLOW_ALIASING: &str = "ion.path_extractor.allow_aliasing";
pub const IGNORE_MALFORMED: &str = "ion.ignore_malformed";

/// Host schema handoff: comma-separated column names.
pub const COLUMNS: &str = "columns";
/// Host schema handoff: type list, `:` separated at nesting depth zero.
pub const COLUMN_TYPES: &str = "columns.types";

pub const FAIL_ON_OVERFLOW_SUFFIX: &str = "fail_on_overflow";
pub const PATH_EXTRACTOR_SUFFIX: &str = "path_extractor";
pub const SERIALIZE_AS_SUFFIX: &str = "serialize_as";

const PREFIX: &str = "ion.";

/// Column addressed by a per-column key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef<'a> {
    Name(&'a str),
    Index(usize),
}

pub fn column_key(column: &str, suffix: &str) -> String {
    format!("{}{}.{}", PREFIX, column, suffix)
}

pub fn column_index_key(index: usize, suffix: &str) -> String {
    format!("{}column[{}].{}", PREFIX, index, suffix)
}

/// Recognize a per-column key ending in `suffix`.
pub fn parse_column_key<'a>(key: &'a str, suffix: &str) -> Option<ColumnRef<'a>> {
    let middle = key
        .strip_prefix(PREFIX)?
        .strip_suffix(suffix)?
        .strip_suffix('.')?;
    let index = middle
        .strip_prefix("column[")
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|digits| digits.parse().ok());
    Some(match index {
        Some(i) => ColumnRef::Index(i),
        None => ColumnRef::Name(middle),
    })
}
