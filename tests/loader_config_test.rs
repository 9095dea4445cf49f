mod common;

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use mall_insight::config::{AppConfig, ColumnMapping};
use mall_insight::data::loader::load_file;
use mall_insight::data::schema::ColumnKind;
use mall_insight::{run, CellValue, InsightQuery, Metric, Session};
use parquet::arrow::ArrowWriter;

const CSV: &str = "\
invoice_no,gender,age,category,quantity,price
I138884,Female,28,Clothing,5,1500.40
I317333,Male,21,Shoes,3,1800.51
I127801,Male,,Clothing,1,300.08
I173702,Female,66,Books,2,30.30
";

#[test]
fn csv_file_loads_with_derived_spend() {
    let file = common::temp_file(".csv", CSV);
    let table = load_file(file.path(), &ColumnMapping::default()).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.columns().last().map(String::as_str), Some("total_spend"));
    assert_eq!(table.kind_of("age"), Some(ColumnKind::Numeric));
    assert_eq!(table.kind_of("gender"), Some(ColumnKind::Categorical));
    assert_eq!(table.rows()[2].get("age"), Some(&CellValue::Null));

    let rows = run(&table, &InsightQuery::new("category", "total_spend")).unwrap();
    let clothing = &rows[0];
    assert_eq!(clothing.group, CellValue::from("Clothing"));
    assert_eq!(clothing.count, 2);
    assert!((clothing.sum - (1500.40 * 5.0 + 300.08)).abs() < 1e-6);
}

#[test]
fn json_records_load_like_csv() {
    let json = r#"[
        {"gender": "Female", "category": "Books", "price": 15, "quantity": 2},
        {"gender": "Male", "category": "Toys", "price": 35.84, "quantity": 1},
        {"gender": null, "category": "Books", "price": 15.15, "quantity": 1}
    ]"#;
    let file = common::temp_file(".json", json);
    let table = load_file(file.path(), &ColumnMapping::default()).unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.has_column("total_spend"));
    // 15 and 15.15 share a column, so both are floats.
    assert_eq!(table.rows()[0].get("price"), Some(&CellValue::Float(15.0)));

    let mut query = InsightQuery::new("gender", "total_spend");
    query.metric = Metric::Count;
    let groups: Vec<String> = run(&table, &query)
        .unwrap()
        .iter()
        .map(|r| r.group.label())
        .collect();
    assert_eq!(groups, vec!["Female", "Male", "<null>"]);
}

#[test]
fn parquet_columns_keep_their_types() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("category", DataType::Utf8, true),
        Field::new("age", DataType::Int64, true),
        Field::new("total_spend", DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![Some("Books"), Some("Toys"), None])),
        Arc::new(Int64Array::from(vec![Some(30), None, Some(52)])),
        Arc::new(Float64Array::from(vec![Some(45.45), Some(35.84), Some(5.23)])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = load_file(file.path(), &ColumnMapping::default()).unwrap();
    assert_eq!(table.columns(), &["category", "age", "total_spend"]);
    assert_eq!(table.rows()[0].get("age"), Some(&CellValue::Integer(30)));
    assert_eq!(table.rows()[1].get("age"), Some(&CellValue::Null));
    assert_eq!(table.rows()[2].get("category"), Some(&CellValue::Null));
    assert_eq!(table.kind_of("total_spend"), Some(ColumnKind::Numeric));
}

#[test]
fn unknown_extension_and_missing_file_fail() {
    let file = common::temp_file(".xlsx", "");
    assert!(load_file(file.path(), &ColumnMapping::default()).is_err());
    assert!(load_file(
        std::path::Path::new("/nonexistent/transactions.csv"),
        &ColumnMapping::default()
    )
    .is_err());
}

#[test]
fn config_file_drives_column_mapping_and_query() {
    let config_file = common::temp_file(
        ".toml",
        r#"
        [columns]
        spend = "amount"

        [query]
        group_column = "gender"
        measure_column = "amount"
        classify = true

        [query.filters.age_class]
        allowed = ["2", "6"]
        "#,
    );
    let config = AppConfig::load(Some(config_file.path())).unwrap();
    assert_eq!(config.columns.spend, "amount");

    let data = common::temp_file(".csv", CSV);
    let table = load_file(data.path(), &config.columns).unwrap();
    assert!(table.has_column("amount"));
    assert!(!table.has_column("total_spend"));

    let rows = run(&table, &config.query).unwrap();
    let groups: Vec<(String, usize)> = rows.iter().map(|r| (r.group.label(), r.count)).collect();
    // Ages 21 and 28 fall in class 2, 66 in class 6; the missing age has none.
    assert_eq!(
        groups,
        vec![("Female".to_string(), 2), ("Male".to_string(), 1)]
    );
}

#[test]
fn session_merges_configured_filters() {
    let data = common::temp_file(".csv", CSV);
    let table = load_file(data.path(), &ColumnMapping::default()).unwrap();
    let config = AppConfig::from_toml_str(
        r#"
        [query.filters.category]
        allowed = ["Clothing"]
        "#,
    )
    .unwrap();

    let mut session = Session::new(table);
    session.merge(&config.query.filters).unwrap();
    assert_eq!(session.visible_indices, vec![0, 2]);

    session.select_values("gender", ["Male"]).unwrap();
    let rows = session.query(&InsightQuery::new("category", "total_spend")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].count, rows[0].sum), (1, 300.08));
}

#[test]
fn renamed_age_column_is_classified_by_the_library_query() {
    let csv = "gender,umur,category,price,quantity\nFemale,28,Books,15.15,1\nMale,66,Toys,35.84,1\n";
    let data = common::temp_file(".csv", csv);
    let config = AppConfig::from_toml_str(
        r#"
        [columns]
        age = "umur"

        [query]
        group_column = "age_class"
        classify = true
        "#,
    )
    .unwrap();
    let table = load_file(data.path(), &config.columns).unwrap();

    let rows = run(&table, &config.query).unwrap();
    let mut classes: Vec<String> = rows.iter().map(|r| r.group.label()).collect();
    classes.sort();
    assert_eq!(classes, vec!["2", "6"]);
}
