//! Composition plan: the inverse of extraction, one struct document per row.
//!
//! A column whose path is a non-empty run of field steps is written at that
//! path, creating nested structs as needed. Every other column (wildcards,
//! indices, the root path, or a path that would collide with another column's
//! leaf) is written at a top-level field named after the column. A column
//! aliasing an earlier column's path is read-only and never written.
//!
//! If such a fallback field is already taken by another column, the written
//! document could not be read back, so the plan records a `WriteConflict`.

use docserde_core::document::DocValue;
use docserde_core::error::{ConfigError, Result};
use docserde_core::schema::Schema;
use docserde_path::field_names_eq;
use serde::Serialize;

use crate::policy::PathBindingPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
enum Slot {
    Column(usize),
    Nested(ComposeNode),
}

impl Slot {
    /// Lowest-indexed column written somewhere under this slot.
    fn first_column(&self) -> Option<usize> {
        match self {
            Slot::Column(idx) => Some(*idx),
            Slot::Nested(node) => node
                .children
                .iter()
                .filter_map(|(_, slot)| slot.first_column())
                .min(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct ComposeNode {
    children: Vec<(String, Slot)>,
}

impl ComposeNode {
    fn position(&self, name: &str, case_sensitive: bool) -> Option<usize> {
        self.children
            .iter()
            .position(|(n, _)| field_names_eq(n, name, case_sensitive))
    }

    /// Whether `names` can be placed without landing on or under an
    /// existing leaf, or on an existing branch.
    fn accepts(&self, names: &[&str], case_sensitive: bool) -> bool {
        let Some((first, rest)) = names.split_first() else {
            return false;
        };
        match self.position(first, case_sensitive) {
            None => true,
            Some(pos) => match &self.children[pos].1 {
                Slot::Column(_) => false,
                Slot::Nested(child) => !rest.is_empty() && child.accepts(rest, case_sensitive),
            },
        }
    }

    fn insert(&mut self, names: &[&str], column: usize, case_sensitive: bool) {
        let Some((first, rest)) = names.split_first() else {
            return;
        };
        if rest.is_empty() {
            self.children.push((first.to_string(), Slot::Column(column)));
            return;
        }
        let pos = match self.position(first, case_sensitive) {
            Some(pos) => pos,
            None => {
                self.children
                    .push((first.to_string(), Slot::Nested(ComposeNode::default())));
                self.children.len() - 1
            }
        };
        if let Slot::Nested(child) = &mut self.children[pos].1 {
            child.insert(rest, column, case_sensitive);
        }
    }

    fn compose(
        &self,
        write: &mut dyn FnMut(usize) -> Result<Option<DocValue>>,
    ) -> Result<Vec<(String, DocValue)>> {
        let mut fields = Vec::with_capacity(self.children.len());
        for (name, slot) in &self.children {
            match slot {
                Slot::Column(column) => {
                    if let Some(value) = write(*column)? {
                        fields.push((name.clone(), value));
                    }
                }
                Slot::Nested(child) => {
                    let nested = child.compose(write)?;
                    if !nested.is_empty() {
                        fields.push((name.clone(), DocValue::Struct(nested)));
                    }
                }
            }
        }
        Ok(fields)
    }
}

/// Where each column lands in the written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionPlan {
    root: ComposeNode,
    written: Vec<bool>,
}

impl CompositionPlan {
    /// Lay out every written column. Fallback fields that collide with an
    /// earlier placement are reported in `errors`.
    pub fn build(paths: &PathBindingPolicy, schema: &Schema, errors: &mut Vec<ConfigError>) -> Self {
        let case_sensitive = paths.case_sensitive();
        let mut root = ComposeNode::default();
        let mut written = vec![true; schema.len()];

        for (idx, field) in schema.fields.iter().enumerate() {
            let path = paths.path_for(idx);
            let key = path.normalized(case_sensitive);
            let aliased = (0..idx).any(|prev| {
                written[prev] && paths.path_for(prev).normalized(case_sensitive) == key
            });
            if aliased {
                written[idx] = false;
                continue;
            }

            let names = path.field_names().filter(|n| !n.is_empty());
            match names {
                Some(names) if root.accepts(&names, case_sensitive) => {
                    root.insert(&names, idx, case_sensitive);
                }
                _ => match root.position(&field.name, case_sensitive) {
                    Some(pos) => {
                        let (taken, slot) = &root.children[pos];
                        let first = slot
                            .first_column()
                            .map_or_else(|| taken.clone(), |c| schema.fields[c].name.clone());
                        errors.push(ConfigError::WriteConflict {
                            first,
                            second: field.name.clone(),
                            field: taken.clone(),
                        });
                    }
                    None => root.children.push((field.name.clone(), Slot::Column(idx))),
                },
            }
        }

        Self { root, written }
    }

    /// Whether the column is emitted at all (aliases are not).
    pub fn is_written(&self, column: usize) -> bool {
        self.written.get(column).copied().unwrap_or(false)
    }

    /// Compose one document; `write(column)` returns the column's document
    /// value, or `None` to omit it. Nested structs left empty are omitted; the
    /// top-level struct is always returned.
    pub fn compose(
        &self,
        mut write: impl FnMut(usize) -> Result<Option<DocValue>>,
    ) -> Result<DocValue> {
        Ok(DocValue::Struct(self.root.compose(&mut write)?))
    }
}
