//! Path-matching capability.
//!
//! A matcher only knows how to apply one step to one value. Callers compose
//! steps (see `for_each_match`, or the extraction plan's step trie).

use docserde_core::document::DocValue;

use crate::spec::{field_names_eq, PathSpec, PathStep};

/// Applies path steps to document values.
///
/// Implementations must be pure: the same step and value always yield the
/// same matches in the same (document) order.
pub trait PathMatcher: Send + Sync {
    /// Invoke `on_match` once per location `step` selects within `value`.
    fn match_step<'a>(
        &self,
        step: &PathStep,
        value: &'a DocValue,
        on_match: &mut dyn FnMut(&'a DocValue),
    );

    /// Invoke `on_match` once per location the whole `path` selects under `root`.
    fn for_each_match<'a>(
        &self,
        path: &PathSpec,
        root: &'a DocValue,
        on_match: &mut dyn FnMut(&'a DocValue),
    ) {
        walk(self, &path.steps, root, on_match);
    }

    /// Collect every match of `path` under `root`.
    fn matches<'a>(&self, path: &PathSpec, root: &'a DocValue) -> Vec<&'a DocValue> {
        let mut out = Vec::new();
        self.for_each_match(path, root, &mut |v| out.push(v));
        out
    }
}

fn walk<'a, M: PathMatcher + ?Sized>(
    matcher: &M,
    steps: &[PathStep],
    value: &'a DocValue,
    on_match: &mut dyn FnMut(&'a DocValue),
) {
    match steps.split_first() {
        None => on_match(value),
        Some((step, rest)) => {
            matcher.match_step(step, value, &mut |child| walk(matcher, rest, child, on_match));
        }
    }
}

/// Default matcher over in-memory document trees.
///
/// Field steps match every struct field with that name (struct names may
/// repeat), case-insensitively unless configured otherwise. Wildcards select
/// list/sexp elements and struct field values. Indices select list/sexp
/// elements. Nothing matches inside scalars or nulls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuralMatcher {
    pub case_sensitive: bool,
}

impl StructuralMatcher {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    fn field_eq(&self, actual: &str, wanted: &str) -> bool {
        field_names_eq(actual, wanted, self.case_sensitive)
    }
}

impl PathMatcher for StructuralMatcher {
    fn match_step<'a>(
        &self,
        step: &PathStep,
        value: &'a DocValue,
        on_match: &mut dyn FnMut(&'a DocValue),
    ) {
        match (step, value) {
            (PathStep::Field(name), DocValue::Struct(fields)) => {
                for (field, child) in fields {
                    if self.field_eq(field, name) {
                        on_match(child);
                    }
                }
            }
            (PathStep::Wildcard, DocValue::Struct(fields)) => {
                for (_, child) in fields {
                    on_match(child);
                }
            }
            (PathStep::Wildcard, DocValue::List(items) | DocValue::Sexp(items)) => {
                for child in items {
                    on_match(child);
                }
            }
            (PathStep::Index(i), DocValue::List(items) | DocValue::Sexp(items)) => {
                if let Some(child) = items.get(*i) {
                    on_match(child);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> DocValue {
        DocValue::from_json(&serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_field_and_index_steps() {
        let root = doc(r#"{"a": {"b": [10, 20, 30]}}"#);
        let m = StructuralMatcher::default();
        let found = m.matches(&PathSpec::parse("(a b 1)").unwrap(), &root);
        assert_eq!(found, vec![&DocValue::Int(20)]);
        assert!(m
            .matches(&PathSpec::parse("(a b 7)").unwrap(), &root)
            .is_empty());
    }

    #[test]
    fn test_wildcard_over_list_and_struct() {
        let root = doc(r#"{"xs": [{"v": 1}, {"v": 2}], "s": {"p": 1, "q": 2}}"#);
        let m = StructuralMatcher::default();
        let vs = m.matches(&PathSpec::parse("(xs * v)").unwrap(), &root);
        assert_eq!(vs, vec![&DocValue::Int(1), &DocValue::Int(2)]);
        assert_eq!(m.matches(&PathSpec::parse("(s *)").unwrap(), &root).len(), 2);
    }

    #[test]
    fn test_case_sensitivity() {
        let root = doc(r#"{"Name": "x"}"#);
        let path = PathSpec::field("name");
        assert_eq!(StructuralMatcher::new(false).matches(&path, &root).len(), 1);
        assert!(StructuralMatcher::new(true).matches(&path, &root).is_empty());

        let root = doc(r#"{"Ärger": 1}"#);
        let path = PathSpec::field("ärger");
        assert_eq!(StructuralMatcher::new(false).matches(&path, &root).len(), 1);
        assert!(StructuralMatcher::new(true).matches(&path, &root).is_empty());
    }

    #[test]
    fn test_duplicate_field_names_all_match() {
        let root = DocValue::structure([("k", DocValue::Int(1)), ("k", DocValue::Int(2))]);
        let found = StructuralMatcher::default().matches(&PathSpec::field("k"), &root);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_scalars_and_nulls_have_no_children() {
        let m = StructuralMatcher::default();
        assert!(m
            .matches(&PathSpec::parse("(*)").unwrap(), &DocValue::Int(3))
            .is_empty());
        assert!(m
            .matches(
                &PathSpec::field("a"),
                &DocValue::Null(docserde_core::document::DocType::Struct)
            )
            .is_empty());
        assert_eq!(
            m.matches(&PathSpec::root(), &DocValue::Int(3)),
            vec![&DocValue::Int(3)]
        );
    }
}
