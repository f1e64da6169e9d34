use super::*;
use crate::value::FieldValue;

fn annotation(fields: Vec<(&str, FieldValue)>) -> FieldValue {
    FieldValue::Struct(fields.into_iter().collect())
}

#[test]
fn test_scalar_column_types() {
    let mut row = Row::new();
    row.insert("CAM_FRONT-is_key_frame", FieldValue::Bool(true));
    row.insert("CAM_FRONT-width", FieldValue::Int(1600));
    row.insert(
        "CAM_FRONT-ego_pose-translation",
        FieldValue::List(vec![
            FieldValue::Float(411.3),
            FieldValue::Int(1180),
            FieldValue::Float(0.0),
        ]),
    );
    row.insert("CAM_FRONT-fileformat", FieldValue::Str("jpg".into()));
    row.insert("CAM_FRONT-file", FieldValue::Bytes(vec![0xff, 0xd8]));

    let schema = infer_schema(&row, &CompressionDirective::default()).unwrap();

    let types: Vec<&DataType> = schema.fields().iter().map(|f| f.data_type()).collect();
    assert_eq!(types[0], &DataType::Boolean);
    assert_eq!(types[1], &DataType::Int64);
    assert_eq!(types[2], &DataType::List(list_item(DataType::Float64)));
    assert_eq!(types[3], &DataType::Utf8);
    assert_eq!(types[4], &DataType::Binary);
    assert!(schema.fields().iter().all(|f| f.is_nullable()));
}

#[test]
fn test_binary_columns_carry_compression_metadata() {
    let mut row = Row::new();
    row.insert("LIDAR_TOP-file", FieldValue::Bytes(vec![1, 2, 3]));
    row.insert("LIDAR_TOP-timestamp", FieldValue::Int(1));
    row.insert("CAM_FRONT-file", FieldValue::Bytes(vec![4]));

    let directive = CompressionDirective::new("zstd", "9");
    let schema = infer_schema(&row, &directive).unwrap();

    let lidar = schema.field_with_name("LIDAR_TOP-file").unwrap();
    assert_eq!(lidar.metadata().get(KEY_COMPRESSION).unwrap(), "zstd");
    assert_eq!(lidar.metadata().get(KEY_COMPRESSION_LEVEL).unwrap(), "9");
    assert_eq!(binary_compression(lidar), Some(directive.clone()));

    let camera = schema.field_with_name("CAM_FRONT-file").unwrap();
    assert_eq!(binary_compression(camera), Some(directive));

    let timestamp = schema.field_with_name("LIDAR_TOP-timestamp").unwrap();
    assert!(timestamp.metadata().is_empty());
    assert_eq!(binary_compression(timestamp), None);
}

#[test]
fn test_annotation_structs_merge_fields() {
    let first = annotation(vec![
        ("ann-visibility_token", FieldValue::Null),
        ("ann-num_lidar_pts", FieldValue::Int(5)),
        ("attributes", FieldValue::List(vec![])),
    ]);
    let second = annotation(vec![
        ("ann-num_lidar_pts", FieldValue::Float(2.5)),
        (
            "attributes",
            FieldValue::List(vec![annotation(vec![(
                "name",
                FieldValue::Str("vehicle.moving".into()),
            )])]),
        ),
        ("category", annotation(vec![("name", FieldValue::Str("vehicle.car".into()))])),
    ]);

    let mut row = Row::new();
    row.insert("sample_annotations", FieldValue::List(vec![first, second]));

    let schema = infer_schema(&row, &CompressionDirective::default()).unwrap();
    let DataType::List(item) = schema.field(0).data_type() else {
        panic!("expected list column");
    };
    let DataType::Struct(fields) = item.data_type() else {
        panic!("expected struct elements");
    };

    let names: Vec<&str> = fields.iter().map(|f| f.name().as_str()).collect();
    assert_eq!(
        names,
        vec!["ann-visibility_token", "ann-num_lidar_pts", "attributes", "category"]
    );
    assert_eq!(fields[0].data_type(), &DataType::Null);
    assert_eq!(fields[1].data_type(), &DataType::Float64);

    let DataType::List(attr_item) = fields[2].data_type() else {
        panic!("expected attribute list");
    };
    assert!(matches!(attr_item.data_type(), DataType::Struct(f) if f.len() == 1));
}

#[test]
fn test_empty_list_infers_null_elements() {
    let mut row = Row::new();
    row.insert("sample_annotations", FieldValue::List(vec![]));

    let schema = infer_schema(&row, &CompressionDirective::default()).unwrap();
    assert_eq!(
        schema.field(0).data_type(),
        &DataType::List(list_item(DataType::Null))
    );
}

#[test]
fn test_conflicting_list_elements() {
    let mut row = Row::new();
    row.insert(
        "mixed",
        FieldValue::List(vec![FieldValue::Str("a".into()), FieldValue::Int(1)]),
    );

    let err = infer_schema(&row, &CompressionDirective::default()).unwrap_err();
    match err {
        SchemaError::ConflictingTypes { column, .. } => assert_eq!(column, "mixed[]"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_row_is_rejected() {
    let result = infer_schema(&Row::new(), &CompressionDirective::default());
    assert!(matches!(result, Err(SchemaError::EmptyRow)));
}

#[test]
fn test_refine_fills_empty_annotation_list() {
    let mut row = Row::new();
    row.insert("LIDAR_TOP-file", FieldValue::Bytes(vec![1]));
    row.insert("sample_annotations", FieldValue::List(vec![]));
    let directive = CompressionDirective::new("zstd", "3");
    let schema = infer_schema(&row, &directive).unwrap();
    assert!(has_unresolved_type(schema.field(1).data_type()));

    let later = FieldValue::List(vec![annotation(vec![
        ("ann-num_lidar_pts", FieldValue::Int(12)),
        ("attributes", FieldValue::List(vec![])),
    ])]);
    let refined = refine_column(&schema, "sample_annotations", &later).unwrap();

    let DataType::List(item) = refined.field(1).data_type() else {
        panic!("expected list column");
    };
    let DataType::Struct(fields) = item.data_type() else {
        panic!("expected struct elements");
    };
    assert_eq!(fields[0].data_type(), &DataType::Int64);
    assert!(has_unresolved_type(refined.field(1).data_type()));

    let with_attributes = FieldValue::List(vec![annotation(vec![(
        "attributes",
        FieldValue::List(vec![annotation(vec![(
            "name",
            FieldValue::Str("vehicle.parked".into()),
        )])]),
    )])]);
    let refined = refine_column(&refined, "sample_annotations", &with_attributes).unwrap();
    assert!(!has_unresolved_type(refined.field(1).data_type()));

    // Untouched columns keep their metadata
    assert_eq!(binary_compression(refined.field(0)), Some(directive));
}

#[test]
fn test_refine_unknown_column_is_noop() {
    let mut row = Row::new();
    row.insert("LIDAR_TOP-timestamp", FieldValue::Int(1));
    let schema = infer_schema(&row, &CompressionDirective::default()).unwrap();

    let refined = refine_column(&schema, "sample_annotations", &FieldValue::Int(2)).unwrap();
    assert_eq!(refined, schema);
}

#[test]
fn test_refine_rejects_conflicting_shape() {
    let mut row = Row::new();
    row.insert("sample_annotations", FieldValue::List(vec![]));
    let schema = infer_schema(&row, &CompressionDirective::default()).unwrap();

    let result = refine_column(&schema, "sample_annotations", &FieldValue::Str("x".into()));
    assert!(matches!(result, Err(SchemaError::ConflictingTypes { .. })));
}
