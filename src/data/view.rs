use std::cmp::Ordering;

use super::model::{cell, Row, Table};
use super::schema::ColumnKind;
use crate::error::{InsightError, Result};

/// Stable sort of the rows by `column`.
///
/// Numeric columns compare by value, categorical ones by string form.
/// Missing or unparsable values go last in both directions.
pub fn sort_rows(table: &Table, column: &str, ascending: bool) -> Result<Table> {
    let kind = table
        .kind_of(column)
        .ok_or_else(|| InsightError::ColumnNotFound(column.to_string()))?;

    let directed = |o: Ordering| if ascending { o } else { o.reverse() };
    let mut rows: Vec<Row> = table.rows().to_vec();
    match kind {
        ColumnKind::Numeric => rows.sort_by(|a, b| {
            match (cell(a, column).as_f64(), cell(b, column).as_f64()) {
                (Some(x), Some(y)) => directed(x.total_cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
        ColumnKind::Categorical => rows.sort_by(|a, b| {
            let (x, y) = (cell(a, column), cell(b, column));
            match (x.is_null(), y.is_null()) {
                (false, false) => directed(x.label().cmp(&y.label())),
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                (true, true) => Ordering::Equal,
            }
        }),
    }
    Ok(table.with_rows(rows))
}

/// The first `n` rows.
pub fn head(table: &Table, n: usize) -> Table {
    table.with_rows(table.rows().iter().take(n).cloned().collect())
}
