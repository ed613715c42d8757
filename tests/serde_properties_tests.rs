//! Construction-time resolution and the write path of `SerDeProperties`.

mod test_data_gen;

use docserde::config::keys;
use docserde::model::document::Timestamp;
use docserde::prelude::*;
use test_data_gen::{ab_table, doc, names};

#[test]
fn test_empty_option_bag_resolves_defaults() {
    let types = vec![
        DataType::Boolean,
        DataType::TinyInt,
        DataType::Decimal {
            precision: 12,
            scale: 3,
        },
        DataType::Varchar(16),
        DataType::Binary,
        DataType::Date,
        DataType::Array(Box::new(DataType::Int)),
        DataType::Map(Box::new(DataType::String), Box::new(DataType::Int)),
    ];
    let cols = names(&["b", "t", "d", "v", "bin", "day", "arr", "m"]);
    let table = SerDeProperties::new(&Properties::new(), &cols, &types).unwrap();

    assert_eq!(table.serialize_null(), NullStrategy::Untyped);
    assert_eq!(table.encoding(), Encoding::Binary);
    assert_eq!(table.timestamp_offset_minutes(), 0);
    for (i, (name, ty)) in cols.iter().zip(&types).enumerate() {
        assert!(table.fail_on_overflow_for(name));
        assert_eq!(table.serialization_type_for(i), ty.canonical_doc_type());
        assert_eq!(table.path_for(i), &PathSpec::field(name.as_str()));
    }
}

#[test]
fn test_global_options() {
    let props = Properties::new()
        .with(keys::ENCODING, "TEXT")
        .with(keys::TIMESTAMP_OFFSET, "-05:30")
        .with(keys::FAIL_ON_OVERFLOW, "false");
    let table = ab_table(&props).unwrap();
    assert_eq!(table.encoding(), Encoding::Text);
    assert_eq!(table.timestamp_offset_minutes(), -330);
    assert!(!table.fail_on_overflow_for("a"));
    assert!(!table.fail_on_overflow_for("b"));
}

#[test]
fn test_unknown_column_fails_construction() {
    let bags = [
        Properties::new().with("ion.zz.path_extractor", "(x)"),
        Properties::new().with("ion.zz.serialize_as", "symbol"),
        Properties::new().with("ion.zz.fail_on_overflow", "false"),
        Properties::new().with(keys::FAIL_ON_OVERFLOW_EXCEPTIONS, "a,zz"),
    ];
    for props in &bags {
        let err = ab_table(props).unwrap_err();
        let Error::Config(errors) = &err else {
            panic!("expected a configuration error, got {err}");
        };
        assert!(
            errors.iter().any(
                |e| matches!(e, ConfigError::UnknownColumn { column, .. } if column == "zz")
            ),
            "{err}"
        );
    }

    let err = ab_table(&Properties::new().with("ion.column[5].serialize_as", "symbol")).unwrap_err();
    assert!(err.to_string().contains("index 5"), "{err}");
}

#[test]
fn test_invalid_literals_name_value_and_valid_set() {
    let err = ab_table(&Properties::new().with(keys::SERIALIZE_NULL, "NONE")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("NONE"), "{msg}");
    assert!(msg.contains("OMIT, UNTYPED, TYPED"), "{msg}");

    let err = ab_table(&Properties::new().with("ion.b.serialize_as", "blob")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("'b'") && msg.contains("blob"), "{msg}");
    assert!(msg.contains("string, symbol"), "{msg}");
}

#[test]
fn test_omit_strategy_writes_empty_struct() {
    let table = ab_table(&Properties::new().with(keys::SERIALIZE_NULL, "OMIT")).unwrap();
    let out = table.compose_row(&[Scalar::Null, Scalar::Null]).unwrap();
    assert_eq!(out, DocValue::empty_struct());
}

#[test]
fn test_typed_strategy_writes_typed_nulls() {
    let table = ab_table(&Properties::new().with(keys::SERIALIZE_NULL, "TYPED")).unwrap();
    let out = table.compose_row(&[Scalar::Null, Scalar::Null]).unwrap();
    assert_eq!(
        out,
        DocValue::structure([
            ("a", DocValue::Null(DocType::Int)),
            ("b", DocValue::Null(DocType::String)),
        ])
    );
}

#[test]
fn test_typed_null_follows_override() {
    let props = Properties::new()
        .with(keys::SERIALIZE_NULL, "TYPED")
        .with("ion.b.serialize_as", "symbol");
    let out = ab_table(&props)
        .unwrap()
        .compose_row(&[Scalar::I32(4), Scalar::Null])
        .unwrap();
    assert_eq!(out.get("b"), Some(&DocValue::Null(DocType::Symbol)));
    assert_eq!(out.get("a"), Some(&DocValue::Int(4)));
}

#[test]
fn test_untyped_strategy_writes_untyped_nulls() {
    let out = ab_table(&Properties::new())
        .unwrap()
        .compose_row(&[Scalar::Null, Scalar::Str("x".into())])
        .unwrap();
    assert_eq!(out.get("a"), Some(&DocValue::untyped_null()));
}

#[test]
fn test_round_trip_through_typed_null_then_value() {
    let table = ab_table(&Properties::new().with(keys::SERIALIZE_NULL, "TYPED")).unwrap();
    let original = doc(serde_json::json!({"a": 42, "b": "hello"}));
    let rows = table.extract_rows(&original).unwrap();
    assert_eq!(rows.len(), 1);

    let null_doc = table.compose_row(&[Scalar::Null, Scalar::Null]).unwrap();
    assert_eq!(
        table.extract_rows(&null_doc).unwrap(),
        vec![vec![Scalar::Null, Scalar::Null]]
    );

    let written = table.compose_row(&rows[0]).unwrap();
    assert_eq!(written, original);
    assert_eq!(table.extract_rows(&written).unwrap(), rows);
}

#[test]
fn test_round_trip_nested_paths_and_overrides() {
    let props = Properties::new()
        .with("ion.id.path_extractor", "(header id)")
        .with("ion.tags.path_extractor", "(header tags)")
        .with("ion.tags.serialize_as", "sexp")
        .with("ion.blob.serialize_as", "clob");
    let table = SerDeProperties::new(
        &props,
        &names(&["id", "tags", "blob", "at"]),
        &[
            DataType::BigInt,
            DataType::Array(Box::new(DataType::String)),
            DataType::Binary,
            DataType::Timestamp,
        ],
    )
    .unwrap();

    let row = vec![
        Scalar::I64(9),
        Scalar::List(vec![Scalar::Str("x".into()), Scalar::Str("y".into())]),
        Scalar::Bin(vec![104, 105]),
        Scalar::Timestamp(1_700_000_000_000),
    ];
    let written = table.compose_row(&row).unwrap();
    let header = written.get("header").unwrap();
    assert!(matches!(header.get("tags"), Some(DocValue::Sexp(items)) if items.len() == 2));
    assert!(matches!(written.get("blob"), Some(DocValue::Clob(_))));
    assert_eq!(table.extract_rows(&written).unwrap(), vec![row]);
}

#[test]
fn test_timestamps_carry_configured_offset() {
    let table = SerDeProperties::new(
        &Properties::new().with(keys::TIMESTAMP_OFFSET, "60"),
        &names(&["at"]),
        &[DataType::Timestamp],
    )
    .unwrap();
    let written = table.compose_row(&[Scalar::Timestamp(0)]).unwrap();
    assert_eq!(
        written.get("at"),
        Some(&DocValue::Timestamp(Timestamp::new(0, Some(60))))
    );

    let zoneless = DocValue::structure([("at", DocValue::Timestamp(Timestamp::new(3_600_000, None)))]);
    assert_eq!(
        table.extract_rows(&zoneless).unwrap(),
        vec![vec![Scalar::Timestamp(0)]]
    );
}

#[test]
fn test_aliasing_permitted_and_forbidden() {
    let aliased = Properties::new().with("ion.b.path_extractor", "(a)");
    let table = SerDeProperties::new(
        &aliased,
        &names(&["a", "b"]),
        &[DataType::Int, DataType::BigInt],
    )
    .unwrap();
    let rows = table.extract_rows(&doc(serde_json::json!({"a": 5}))).unwrap();
    assert_eq!(rows, vec![vec![Scalar::I32(5), Scalar::I64(5)]]);
    assert!(!table.composition_plan().is_written(1));
    assert_eq!(
        table.compose_row(&rows[0]).unwrap(),
        doc(serde_json::json!({"a": 5}))
    );

    let forbidden = aliased.with(keys::PATH_ALLOW_ALIASING, "false");
    let err = SerDeProperties::new(
        &forbidden,
        &names(&["a", "b"]),
        &[DataType::Int, DataType::BigInt],
    )
    .unwrap_err();
    assert!(matches!(
        &err,
        Error::Config(errors) if errors.iter().any(|e| matches!(e, ConfigError::DuplicatePath { .. }))
    ));
}

#[test]
fn test_write_overflow_both_policies() {
    let strict = ab_table(&Properties::new()).unwrap();
    let err = strict
        .compose_row(&[Scalar::I64(1 << 40), Scalar::Null])
        .unwrap_err();
    assert_eq!(err.column(), Some("a"));

    let relaxed = ab_table(&Properties::new().with(keys::FAIL_ON_OVERFLOW_EXCEPTIONS, "a")).unwrap();
    let out = relaxed
        .compose_row(&[Scalar::I64(1 << 40), Scalar::Null])
        .unwrap();
    assert_eq!(out.get("a"), Some(&DocValue::Int(0)));
}

#[test]
fn test_from_source_matches_explicit_schema() {
    let props = Properties::new()
        .with(keys::COLUMNS, "a,b")
        .with(keys::COLUMN_TYPES, "int:string")
        .with(keys::SERIALIZE_NULL, "OMIT");
    let from_source = SerDeProperties::from_source(&props).unwrap();
    let explicit = ab_table(&props).unwrap();
    assert_eq!(from_source.schema(), explicit.schema());
    assert_eq!(
        from_source.fingerprint().unwrap(),
        explicit.fingerprint().unwrap()
    );
}

#[test]
fn test_hash_map_source() {
    let mut bag = std::collections::HashMap::new();
    bag.insert(keys::SERIALIZE_NULL.to_string(), "OMIT".to_string());
    let table = SerDeProperties::new(&bag, &names(&["a"]), &[DataType::Int]).unwrap();
    assert_eq!(table.serialize_null(), NullStrategy::Omit);
}

#[test]
fn test_fallback_write_collision_fails_construction() {
    let props = Properties::new().with("ion.a.path_extractor", "(b c)");
    let err = ab_table(&props).unwrap_err();
    let Error::Config(errors) = &err else {
        panic!("expected a configuration error, got {err}");
    };
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::WriteConflict { first, second, field }
                if first == "a" && second == "b" && field == "b"
        )),
        "{err}"
    );

    let props = Properties::new().with("ion.a.path_extractor", "(d c)");
    let table = ab_table(&props).unwrap();
    let row = vec![Scalar::I32(1), Scalar::Str("two".into())];
    let written = table.compose_row(&row).unwrap();
    assert_eq!(
        written.get("d").and_then(|d| d.get("c")),
        Some(&DocValue::Int(1))
    );
    assert_eq!(written.get("b"), Some(&DocValue::String("two".into())));
    assert_eq!(table.extract_rows(&written).unwrap(), vec![row]);
}

#[test]
fn test_conflicting_name_and_index_keys_fail_construction() {
    let props = Properties::new()
        .with("ion.a.fail_on_overflow", "false")
        .with("ion.column[0].fail_on_overflow", "true");
    let err = ab_table(&props).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("'a'") && msg.contains("fail_on_overflow"), "{msg}");

    let agreeing = Properties::new()
        .with("ion.a.fail_on_overflow", "false")
        .with("ion.column[0].fail_on_overflow", "False");
    assert!(!ab_table(&agreeing).unwrap().fail_on_overflow_for("a"));
}

#[test]
fn test_integer_keyed_map_round_trip() {
    let table = SerDeProperties::new(
        &Properties::new(),
        &names(&["m"]),
        &[DataType::Map(Box::new(DataType::Int), Box::new(DataType::String))],
    )
    .unwrap();
    let row = vec![Scalar::Map(vec![
        (Scalar::I32(1), Scalar::Str("one".into())),
        (Scalar::I32(20), Scalar::Str("twenty".into())),
    ])];
    let written = table.compose_row(&row).unwrap();
    assert_eq!(
        written,
        doc(serde_json::json!({"m": {"1": "one", "20": "twenty"}}))
    );
    assert_eq!(table.extract_rows(&written).unwrap(), vec![row]);
}
