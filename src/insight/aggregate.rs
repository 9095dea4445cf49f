use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{cell, CellValue, Table};
use crate::error::{InsightError, Result};

/// Count, sum and mean of the measure for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub group: CellValue,
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    sum: f64,
}

/// Group `table` by `group_column` and total `measure_column` per group.
///
/// Null group values form their own group. Measure values that are not
/// numbers add nothing to the sum but the row still counts, so
/// `sum == count * mean` holds for every row of the result. Groups come back
/// in ascending key order.
pub fn aggregate(
    table: &Table,
    group_column: &str,
    measure_column: &str,
) -> Result<Vec<AggregateRow>> {
    if !table.has_column(group_column) {
        return Err(InsightError::GroupColumnNotFound(group_column.to_string()));
    }
    if !table.has_column(measure_column) {
        return Err(InsightError::MeasureColumnNotFound(
            measure_column.to_string(),
        ));
    }

    let mut groups: BTreeMap<&CellValue, Accumulator> = BTreeMap::new();
    for row in table.rows() {
        let acc = groups.entry(cell(row, group_column)).or_default();
        acc.count += 1;
        if let Some(v) = cell(row, measure_column).as_f64() {
            acc.sum += v;
        }
    }

    Ok(groups
        .into_iter()
        .map(|(group, acc)| AggregateRow {
            group: group.clone(),
            count: acc.count,
            sum: acc.sum,
            mean: if acc.count > 0 {
                acc.sum / acc.count as f64
            } else {
                0.0
            },
        })
        .collect())
}
