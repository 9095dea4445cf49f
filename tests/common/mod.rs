#![allow(dead_code)]

use std::io::Write;

use mall_insight::{CellValue, Row, Table};
use tempfile::NamedTempFile;

/// Build a table from `(column, value)` pairs per row, keeping column order.
pub fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|values| {
            columns
                .iter()
                .map(|c| c.to_string())
                .zip(values)
                .collect()
        })
        .collect();
    Table::new(columns.iter().map(|c| c.to_string()).collect(), rows)
}

/// The three-row table used throughout the end-to-end checks.
pub fn spend_by_category() -> Table {
    table(
        &["cat", "spend"],
        vec![
            vec!["A".into(), 10.0f64.into()],
            vec!["B".into(), 5.0f64.into()],
            vec!["A".into(), 30.0f64.into()],
        ],
    )
}

/// A small mall-transaction table with ages, prices, a cluster id and one
/// missing age.
pub fn transactions() -> Table {
    let rows = [
        ("Female", Some(19), "Clothing", 3, 900.24, 0),
        ("Male", Some(34), "Shoes", 1, 600.17, 1),
        ("Female", Some(71), "Books", 2, 30.30, 2),
        ("Male", None, "Books", 1, 15.15, 2),
        ("Female", Some(45), "Technology", 2, 2100.0, 1),
        ("Male", Some(28), "Clothing", 1, 300.08, 0),
    ];
    table(
        &["gender", "age", "category", "quantity", "price", "cluster"],
        rows.into_iter()
            .map(|(gender, age, category, quantity, price, cluster)| {
                vec![
                    CellValue::from(gender),
                    age.map_or(CellValue::Null, CellValue::Integer),
                    CellValue::from(category),
                    CellValue::Integer(quantity),
                    CellValue::Float(price),
                    CellValue::Integer(cluster),
                ]
            })
            .collect(),
    )
}

/// Write `contents` to a temp file whose name ends in `suffix`.
pub fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
