//! Extraction plan: column paths compiled into a step trie.
//!
//! Evaluating a node yields *partial rows* (column -> matched value):
//! - the columns whose path ends at this node bind the node's value,
//! - each child step is applied through the `PathMatcher`; the partial rows of
//!   every match are concatenated, and a step with no match contributes one
//!   empty partial row (its columns stay null),
//! - the node's own binding is cross-producted with every child's result.
//!
//! Columns below the same multi-match step are therefore correlated (one row
//! per matched element) while independent multi-match steps multiply. A
//! document with no multi-match yields exactly one row.

use docserde_core::document::DocValue;
use docserde_path::{PathMatcher, PathSpec, PathStep};

/// Matched value per column for one output row; `None` becomes a table-null.
pub type MatchRow<'a> = Vec<Option<&'a DocValue>>;

type Partial<'a> = Vec<(usize, &'a DocValue)>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PlanNode {
    columns: Vec<usize>,
    children: Vec<(PathStep, PlanNode)>,
}

impl PlanNode {
    fn insert(&mut self, steps: &[PathStep], column: usize) {
        match steps.split_first() {
            None => self.columns.push(column),
            Some((step, rest)) => {
                let pos = match self.children.iter().position(|(s, _)| s == step) {
                    Some(pos) => pos,
                    None => {
                        self.children.push((step.clone(), PlanNode::default()));
                        self.children.len() - 1
                    }
                };
                self.children[pos].1.insert(rest, column);
            }
        }
    }

    fn evaluate<'a>(&self, value: &'a DocValue, matcher: &dyn PathMatcher) -> Vec<Partial<'a>> {
        let own: Partial<'a> = self.columns.iter().map(|&c| (c, value)).collect();
        let mut acc = vec![own];
        for (step, child) in &self.children {
            let mut branch = Vec::new();
            matcher.match_step(step, value, &mut |m| branch.extend(child.evaluate(m, matcher)));
            if !branch.is_empty() {
                acc = cross(&acc, &branch);
            }
        }
        acc
    }
}

fn cross<'a>(left: &[Partial<'a>], right: &[Partial<'a>]) -> Vec<Partial<'a>> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            let mut row = Vec::with_capacity(l.len() + r.len());
            row.extend_from_slice(l);
            row.extend_from_slice(r);
            out.push(row);
        }
    }
    out
}

/// Immutable binding of column index to path, compiled for evaluation.
/// Owns only path metadata; evaluation holds no state across documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPlan {
    root: PlanNode,
    bindings: Vec<PathSpec>,
}

impl ExtractionPlan {
    pub fn builder(column_count: usize) -> ExtractionPlanBuilder {
        ExtractionPlanBuilder::new(column_count)
    }

    pub fn column_count(&self) -> usize {
        self.bindings.len()
    }

    /// Path bound to `column`.
    pub fn path_for(&self, column: usize) -> Option<&PathSpec> {
        self.bindings.get(column)
    }

    /// Evaluate against one root value, producing at least one row.
    pub fn evaluate<'a>(&self, root: &'a DocValue, matcher: &dyn PathMatcher) -> Vec<MatchRow<'a>> {
        self.root
            .evaluate(root, matcher)
            .into_iter()
            .map(|partial| {
                let mut row = vec![None; self.bindings.len()];
                for (column, value) in partial {
                    row[column] = Some(value);
                }
                row
            })
            .collect()
    }
}

/// Binds paths to column indices, then compiles the trie.
#[derive(Debug, Clone)]
pub struct ExtractionPlanBuilder {
    bindings: Vec<Option<PathSpec>>,
    case_sensitive: bool,
}

impl ExtractionPlanBuilder {
    pub fn new(column_count: usize) -> Self {
        Self {
            bindings: vec![None; column_count],
            case_sensitive: false,
        }
    }

    /// Field steps differing only in case share a trie node unless matching
    /// is case-sensitive, so their columns stay correlated.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// # Panics
    ///
    /// If `column` is outside the declared column count.
    pub fn bind(mut self, column: usize, path: PathSpec) -> Self {
        self.bindings[column] = Some(path);
        self
    }

    /// Columns never bound read the root value's field named by `default_name`.
    pub fn build_with_defaults<'n>(self, mut default_name: impl FnMut(usize) -> &'n str) -> ExtractionPlan {
        let bindings: Vec<PathSpec> = self
            .bindings
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.unwrap_or_else(|| PathSpec::field(default_name(i))))
            .collect();
        let mut root = PlanNode::default();
        for (column, path) in bindings.iter().enumerate() {
            root.insert(&path.normalized(self.case_sensitive).steps, column);
        }
        ExtractionPlan { root, bindings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docserde_path::StructuralMatcher;

    fn doc(json: &str) -> DocValue {
        DocValue::from_json(&serde_json::from_str(json).unwrap())
    }

    fn plan(paths: &[&str]) -> ExtractionPlan {
        let mut b = ExtractionPlan::builder(paths.len());
        for (i, p) in paths.iter().enumerate() {
            b = b.bind(i, PathSpec::parse(p).unwrap());
        }
        b.build_with_defaults(|_| "unused")
    }

    fn ints(rows: &[MatchRow<'_>]) -> Vec<Vec<Option<i128>>> {
        rows.iter()
            .map(|r| {
                r.iter()
                    .map(|v| match v {
                        Some(DocValue::Int(i)) => Some(*i),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_single_match_single_row() {
        let d = doc(r#"{"a": 1, "b": {"c": 2}}"#);
        let rows = plan(&["(a)", "(b c)"]).evaluate(&d, &StructuralMatcher::default());
        assert_eq!(ints(&rows), vec![vec![Some(1), Some(2)]]);
    }

    #[test]
    fn test_zero_matches_yield_null_not_error() {
        let d = doc(r#"{"a": 1}"#);
        let rows = plan(&["(a)", "(missing *)"]).evaluate(&d, &StructuralMatcher::default());
        assert_eq!(ints(&rows), vec![vec![Some(1), None]]);

        let empty = doc("{}");
        let rows = plan(&["(a)", "(b)"]).evaluate(&empty, &StructuralMatcher::default());
        assert_eq!(ints(&rows), vec![vec![None, None]]);
    }

    #[test]
    fn test_multi_match_duplicates_single_match_columns() {
        let d = doc(r#"{"id": 7, "xs": [1, 2, 3]}"#);
        let rows = plan(&["(id)", "(xs *)"]).evaluate(&d, &StructuralMatcher::default());
        assert_eq!(
            ints(&rows),
            vec![
                vec![Some(7), Some(1)],
                vec![Some(7), Some(2)],
                vec![Some(7), Some(3)],
            ]
        );
    }

    #[test]
    fn test_shared_wildcard_correlates_columns() {
        let d = doc(r#"{"items": [{"id": 1, "qty": 10}, {"id": 2}]}"#);
        let rows = plan(&["(items * id)", "(items * qty)"])
            .evaluate(&d, &StructuralMatcher::default());
        assert_eq!(
            ints(&rows),
            vec![vec![Some(1), Some(10)], vec![Some(2), None]]
        );
    }

    #[test]
    fn test_independent_wildcards_multiply() {
        let d = doc(r#"{"xs": [1, 2], "ys": [3, 4]}"#);
        let rows = plan(&["(xs *)", "(ys *)"]).evaluate(&d, &StructuralMatcher::default());
        assert_eq!(rows.len(), 4);
        assert_eq!(ints(&rows)[1], vec![Some(1), Some(4)]);
    }

    #[test]
    fn test_aliased_columns_read_same_value() {
        let d = doc(r#"{"a": 5}"#);
        let rows = plan(&["(a)", "(a)"]).evaluate(&d, &StructuralMatcher::default());
        assert_eq!(ints(&rows), vec![vec![Some(5), Some(5)]]);
    }

    #[test]
    fn test_defaults_use_column_names() {
        let names = ["x", "y"];
        let plan = ExtractionPlan::builder(2)
            .bind(1, PathSpec::parse("(z)").unwrap())
            .build_with_defaults(|i| names[i]);
        assert_eq!(plan.path_for(0), Some(&PathSpec::field("x")));
        assert_eq!(plan.path_for(1).map(|p| p.to_string()), Some("(z)".into()));
        assert_eq!(plan.column_count(), 2);
    }

    #[test]
    fn test_case_insensitive_paths_share_nodes() {
        let d = doc(r#"{"Items": [{"a": 1, "b": 2}, {"a": 3, "b": 4}]}"#);
        let plan = ExtractionPlan::builder(2)
            .bind(0, PathSpec::parse("(items * a)").unwrap())
            .bind(1, PathSpec::parse("(ITEMS * b)").unwrap())
            .build_with_defaults(|_| "unused");
        let rows = plan.evaluate(&d, &StructuralMatcher::default());
        assert_eq!(
            ints(&rows),
            vec![vec![Some(1), Some(2)], vec![Some(3), Some(4)]]
        );
    }
}
