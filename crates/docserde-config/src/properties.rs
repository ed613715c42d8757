//! `SerDeProperties`: the resolved, immutable configuration of one table.
//!
//! Built once per table session from an option bag and the column schema.
//! Construction runs every resolver, collects every error, and either returns
//! a fully valid configuration or `Error::Config` listing all problems.
//! Afterwards it is read-only and shared freely across row-processing threads.

use std::collections::HashMap;

use docserde_core::config::ConfigurationSource;
use docserde_core::document::{DocType, DocValue};
use docserde_core::error::{ConfigError, ConfigErrors, Error, Result};
use docserde_core::hash::{hash_serde, Hash256};
use docserde_core::schema::{DataType, Schema};
use docserde_core::types::{Row, RowBatch, Scalar};
use docserde_path::{PathMatcher, PathSpec, StructuralMatcher};
use serde::Serialize;

use crate::compose::CompositionPlan;
use crate::convert::Conversion;
use crate::keys;
use crate::plan::{ExtractionPlan, MatchRow};
use crate::policy::{
    resolve_bool, Encoding, NullStrategy, OverflowPolicy, PathBindingPolicy, SerializeAsPolicy,
    TimestampOffset,
};

#[derive(Debug, Clone)]
pub struct SerDeProperties {
    schema: Schema,
    encoding: Encoding,
    null_strategy: NullStrategy,
    timestamp_offset: TimestampOffset,
    overflow: OverflowPolicy,
    serialize_as: SerializeAsPolicy,
    paths: PathBindingPolicy,
    ignore_malformed: bool,
    column_index: HashMap<String, usize>,
    extraction: ExtractionPlan,
    composition: CompositionPlan,
    matcher: StructuralMatcher,
}

/// Everything that determines behavior, in a stable serialized form.
#[derive(Serialize)]
struct Fingerprint<'a> {
    version: &'a str,
    schema: &'a Schema,
    encoding: Encoding,
    null_strategy: NullStrategy,
    timestamp_offset: TimestampOffset,
    overflow: &'a OverflowPolicy,
    serialize_as: &'a SerializeAsPolicy,
    paths: &'a PathBindingPolicy,
    ignore_malformed: bool,
}

impl SerDeProperties {
    /// Resolve `source` against parallel column name/type lists.
    pub fn new(
        source: &dyn ConfigurationSource,
        names: &[String],
        types: &[DataType],
    ) -> Result<Self> {
        let schema = Schema::from_columns(names, types)?;
        Self::from_schema(source, &schema)
    }

    /// Resolve with the schema taken from the `columns` / `columns.types`
    /// options, the way a host engine hands table metadata to a SerDe.
    pub fn from_source(source: &dyn ConfigurationSource) -> Result<Self> {
        let mut errors = Vec::new();
        let names = source.get_list(keys::COLUMNS, ',');
        if names.is_empty() {
            errors.push(ConfigError::MissingOption(keys::COLUMNS.to_string()));
        }

        let mut types = Vec::new();
        match source.get(keys::COLUMN_TYPES) {
            None => errors.push(ConfigError::MissingOption(keys::COLUMN_TYPES.to_string())),
            Some(raw) => {
                for (i, type_name) in DataType::split_list(raw).into_iter().enumerate() {
                    match type_name.parse::<DataType>() {
                        Ok(t) => types.push(t),
                        Err(reason) => errors.push(ConfigError::InvalidColumnType {
                            column: names
                                .get(i)
                                .cloned()
                                .unwrap_or_else(|| format!("#{}", i)),
                            type_name: type_name.to_string(),
                            reason,
                        }),
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(Error::Config(ConfigErrors(errors)));
        }
        Self::new(source, &names, &types)
    }

    pub fn from_schema(source: &dyn ConfigurationSource, schema: &Schema) -> Result<Self> {
        let mut errors = Vec::new();

        let encoding = Encoding::resolve(source, &mut errors);
        let null_strategy = NullStrategy::resolve(source, &mut errors);
        let timestamp_offset = TimestampOffset::resolve(source, &mut errors);
        let overflow = OverflowPolicy::resolve(source, schema, &mut errors);
        let serialize_as = SerializeAsPolicy::resolve(source, schema, &mut errors);
        let paths = PathBindingPolicy::resolve(source, schema, &mut errors);
        let ignore_malformed = resolve_bool(source, keys::IGNORE_MALFORMED, false, &mut errors);

        let mut composition = None;
        if errors.is_empty() {
            // Layout conflicts are only meaningful once every path resolved.
            composition = Some(CompositionPlan::build(&paths, schema, &mut errors));
        }
        let Some(composition) = composition.filter(|_| errors.is_empty()) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(errors = errors.len(), "SerDe configuration rejected");
            return Err(Error::Config(ConfigErrors(errors)));
        };

        let mut builder =
            ExtractionPlan::builder(schema.len()).case_sensitive(paths.case_sensitive());
        for idx in 0..schema.len() {
            builder = builder.bind(idx, paths.path_for(idx).clone());
        }
        let extraction = builder.build_with_defaults(|i| schema.fields[i].name.as_str());
        let matcher = StructuralMatcher::new(paths.case_sensitive());

        let column_index = schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(
                columns = schema.len(),
                %encoding,
                %null_strategy,
                %timestamp_offset,
                ignore_malformed,
                "resolved SerDe configuration"
            );
            for (idx, field) in schema.fields.iter().enumerate() {
                tracing::trace!(
                    column = %field.name,
                    data_type = %field.data_type,
                    path = %paths.path_for(idx),
                    serialize_as = %serialize_as.for_index(idx),
                    fail_on_overflow = overflow.for_index(idx),
                    written = composition.is_written(idx),
                    "column policy"
                );
            }
        }

        Ok(Self {
            schema: schema.clone(),
            encoding,
            null_strategy,
            timestamp_offset,
            overflow,
            serialize_as,
            paths,
            ignore_malformed,
            column_index,
            extraction,
            composition,
            matcher,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn timestamp_offset_minutes(&self) -> i32 {
        self.timestamp_offset.minutes
    }

    pub fn serialize_null(&self) -> NullStrategy {
        self.null_strategy
    }

    pub fn ignore_malformed(&self) -> bool {
        self.ignore_malformed
    }

    /// # Panics
    ///
    /// If `column` is not a declared column name.
    pub fn fail_on_overflow_for(&self, column: &str) -> bool {
        match self.column_index.get(column) {
            Some(&idx) => self.overflow.for_index(idx),
            None => panic!("fail_on_overflow_for: undeclared column '{}'", column),
        }
    }

    /// # Panics
    ///
    /// If `index` is not a declared column.
    pub fn serialization_type_for(&self, index: usize) -> DocType {
        self.serialize_as.for_index(index)
    }

    /// # Panics
    ///
    /// If `index` is not a declared column.
    pub fn path_for(&self, index: usize) -> &PathSpec {
        self.paths.path_for(index)
    }

    pub fn extraction_plan(&self) -> &ExtractionPlan {
        &self.extraction
    }

    pub fn composition_plan(&self) -> &CompositionPlan {
        &self.composition
    }

    fn conversion(&self, index: usize) -> Conversion<'_> {
        Conversion::new(
            &self.schema.fields[index].name,
            self.overflow.for_index(index),
            self.timestamp_offset,
        )
    }

    /// Rows extracted from one document with the built-in matcher.
    pub fn extract_rows(&self, root: &DocValue) -> Result<Vec<Row>> {
        self.extract_rows_with(root, &self.matcher)
    }

    /// Rows extracted from one document, delegating step matching to `matcher`.
    pub fn extract_rows_with(&self, root: &DocValue, matcher: &dyn PathMatcher) -> Result<Vec<Row>> {
        self.extraction
            .evaluate(root, matcher)
            .into_iter()
            .map(|matched| self.materialize(matched))
            .collect()
    }

    fn materialize(&self, matched: MatchRow<'_>) -> Result<Row> {
        let mut row = Vec::with_capacity(matched.len());
        for (idx, value) in matched.into_iter().enumerate() {
            let Some(value) = value else {
                row.push(Scalar::Null);
                continue;
            };
            let ty = &self.schema.fields[idx].data_type;
            match self.conversion(idx).read(value, ty) {
                Ok(v) => row.push(v),
                Err(Error::StructuralMismatch { .. }) if self.ignore_malformed => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        column = %self.schema.fields[idx].name,
                        found = %value.doc_type(),
                        expected = %ty,
                        "malformed value replaced with null"
                    );
                    row.push(Scalar::Null);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(row)
    }

    /// Rows of every document, in document order, as one columnar batch.
    pub fn extract_batch(&self, documents: &[DocValue]) -> Result<RowBatch> {
        let mut batch = RowBatch::empty(&self.schema);
        for doc in documents {
            for row in self.extract_rows(doc)? {
                batch.push_row(row);
            }
        }
        Ok(batch)
    }

    /// Compose the document written for one table row.
    pub fn compose_row(&self, row: &[Scalar]) -> Result<DocValue> {
        if row.len() != self.schema.len() {
            return Err(Error::Schema(format!(
                "row has {} values but the table has {} columns",
                row.len(),
                self.schema.len()
            )));
        }
        self.composition.compose(|idx| {
            self.conversion(idx).write(
                &row[idx],
                &self.schema.fields[idx].data_type,
                self.serialize_as.for_index(idx),
                self.null_strategy,
            )
        })
    }

    /// Stable digest of the resolved configuration. Equal for any two
    /// option bags that resolve to the same behavior.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(&Fingerprint {
            version: docserde_core::VERSION,
            schema: &self.schema,
            encoding: self.encoding,
            null_strategy: self.null_strategy,
            timestamp_offset: self.timestamp_offset,
            overflow: &self.overflow,
            serialize_as: &self.serialize_as,
            paths: &self.paths,
            ignore_malformed: self.ignore_malformed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docserde_core::config::Properties;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn doc(json: serde_json::Value) -> DocValue {
        DocValue::from_json(&json)
    }

    fn ab(props: &Properties) -> Result<SerDeProperties> {
        SerDeProperties::new(props, &names(&["a", "b"]), &[DataType::Int, DataType::String])
    }

    #[test]
    fn test_defaults() {
        let p = ab(&Properties::new()).unwrap();
        assert_eq!(p.encoding(), Encoding::Binary);
        assert_eq!(p.serialize_null(), NullStrategy::Untyped);
        assert_eq!(p.timestamp_offset_minutes(), 0);
        assert!(p.fail_on_overflow_for("a"));
        assert_eq!(p.serialization_type_for(0), DocType::Int);
        assert_eq!(p.serialization_type_for(1), DocType::String);
        assert!(!p.ignore_malformed());
    }

    #[test]
    fn test_all_errors_are_reported_together() {
        let props = Properties::new()
            .with(keys::SERIALIZE_NULL, "omit")
            .with(keys::ENCODING, "XML")
            .with("ion.nope.path_extractor", "(x)")
            .with("ion.a.serialize_as", "string");
        let err = ab(&props).unwrap_err();
        let Error::Config(errors) = err else {
            panic!("expected config error");
        };
        assert_eq!(errors.len(), 4, "{errors}");
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::UnknownColumn { column, .. } if column == "nope")
        ));
    }

    #[test]
    fn test_schema_errors() {
        let err = SerDeProperties::new(
            &Properties::new(),
            &names(&["a", "a"]),
            &[DataType::Int],
        )
        .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("duplicate column name 'a'"));
    }

    #[test]
    fn test_from_source_reads_host_schema() {
        let props = Properties::new()
            .with(keys::COLUMNS, "id,price,tags")
            .with(keys::COLUMN_TYPES, "bigint:decimal(10,2):array<string>")
            .with("ion.tags.serialize_as", "sexp");
        let p = SerDeProperties::from_source(&props).unwrap();
        assert_eq!(p.schema().len(), 3);
        assert_eq!(
            p.schema().fields[1].data_type,
            DataType::Decimal {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(p.serialization_type_for(2), DocType::Sexp);

        let err = SerDeProperties::from_source(
            &Properties::new()
                .with(keys::COLUMNS, "a")
                .with(keys::COLUMN_TYPES, "decimal(10"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("column 'a'"), "{err}");

        let err = SerDeProperties::from_source(&Properties::new()).unwrap_err();
        let Error::Config(errors) = err else {
            panic!("expected config error");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_extract_applies_paths_and_types() {
        let props = Properties::new().with("ion.b.path_extractor", "(meta name)");
        let p = ab(&props).unwrap();
        let rows = p
            .extract_rows(&doc(serde_json::json!({"A": 3, "meta": {"name": "x"}})))
            .unwrap();
        assert_eq!(rows, vec![vec![Scalar::I32(3), Scalar::Str("x".into())]]);
    }

    #[test]
    fn test_structural_mismatch_and_ignore_malformed() {
        let d = doc(serde_json::json!({"a": [1, 2], "b": "ok"}));
        let err = ab(&Properties::new()).unwrap().extract_rows(&d).unwrap_err();
        assert_eq!(err.column(), Some("a"));

        let lenient = ab(&Properties::new().with(keys::IGNORE_MALFORMED, "true")).unwrap();
        assert_eq!(
            lenient.extract_rows(&d).unwrap(),
            vec![vec![Scalar::Null, Scalar::Str("ok".into())]]
        );
    }

    #[test]
    fn test_overflow_is_not_masked_by_ignore_malformed() {
        let p = ab(&Properties::new().with(keys::IGNORE_MALFORMED, "true")).unwrap();
        let err = p
            .extract_rows(&doc(serde_json::json!({"a": 1u64 << 40})))
            .unwrap_err();
        assert!(matches!(err, Error::Overflow { .. }));
    }

    #[test]
    fn test_extract_batch() {
        let props = Properties::new().with("ion.a.path_extractor", "(xs *)");
        let p = ab(&props).unwrap();
        let docs = vec![
            doc(serde_json::json!({"xs": [1, 2], "b": "p"})),
            doc(serde_json::json!({"b": "q"})),
        ];
        let batch = p.extract_batch(&docs).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(
            batch.column("b").unwrap().values,
            vec![
                Scalar::Str("p".into()),
                Scalar::Str("p".into()),
                Scalar::Str("q".into())
            ]
        );
        assert_eq!(batch.row(2).unwrap()[0], Scalar::Null);
    }

    #[test]
    fn test_compose_row_shape_and_arity() {
        let props = Properties::new()
            .with("ion.b.path_extractor", "(meta b)")
            .with("ion.b.serialize_as", "symbol");
        let p = ab(&props).unwrap();
        let out = p
            .compose_row(&[Scalar::I32(1), Scalar::Str("s".into())])
            .unwrap();
        assert_eq!(
            out,
            DocValue::structure([
                ("a", DocValue::Int(1)),
                ("meta", DocValue::structure([("b", DocValue::Symbol("s".into()))])),
            ])
        );
        assert!(matches!(p.compose_row(&[Scalar::Null]), Err(Error::Schema(_))));
    }

    #[test]
    fn test_fingerprint_tracks_resolved_behavior() {
        let base = ab(&Properties::new()).unwrap().fingerprint().unwrap();
        let explicit_defaults = ab(&Properties::new()
            .with(keys::SERIALIZE_NULL, "UNTYPED")
            .with(keys::FAIL_ON_OVERFLOW, "TRUE"))
        .unwrap()
        .fingerprint()
        .unwrap();
        assert_eq!(base, explicit_defaults);

        let text = ab(&Properties::new().with(keys::ENCODING, "TEXT"))
            .unwrap()
            .fingerprint()
            .unwrap();
        assert_ne!(base, text);
    }

    #[test]
    #[should_panic(expected = "undeclared column")]
    fn test_undeclared_column_query_panics() {
        ab(&Properties::new()).unwrap().fail_on_overflow_for("zz");
    }
}
