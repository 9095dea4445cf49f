use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde::Serialize;

use mall_insight::data::model::Table;
use mall_insight::insight::profile::{CompositionCell, MeanProfile, Spread};
use mall_insight::AggregateRow;

// ---------------------------------------------------------------------------
// Record batches for terminal tables
// ---------------------------------------------------------------------------

fn batch(columns: Vec<(&str, ArrayRef)>) -> Result<RecordBatch> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, a)| a).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building result table")
}

fn text_array(values: impl IntoIterator<Item = Option<String>>) -> ArrayRef {
    Arc::new(values.into_iter().collect::<StringArray>())
}

fn float_array(values: impl IntoIterator<Item = Option<f64>>) -> ArrayRef {
    Arc::new(values.into_iter().collect::<Float64Array>())
}

fn count_array(values: impl IntoIterator<Item = usize>) -> ArrayRef {
    Arc::new(
        values
            .into_iter()
            .map(|v| Some(v as u64))
            .collect::<UInt64Array>(),
    )
}

pub fn aggregates_batch(rows: &[AggregateRow]) -> Result<RecordBatch> {
    batch(vec![
        ("group", text_array(rows.iter().map(|r| Some(r.group.label())))),
        ("count", count_array(rows.iter().map(|r| r.count))),
        ("sum", float_array(rows.iter().map(|r| Some(r.sum)))),
        ("mean", float_array(rows.iter().map(|r| Some(r.mean)))),
    ])
}

/// Every column as text; nulls stay null.
pub fn table_batch(table: &Table) -> Result<RecordBatch> {
    if table.columns().is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }
    batch(
        table
            .columns()
            .iter()
            .map(|name| {
                let values = table
                    .column_values(name)
                    .map(|v| (!v.is_null()).then(|| v.label()));
                (name.as_str(), text_array(values))
            })
            .collect(),
    )
}

pub fn value_counts_batch(column: &str, counts: &[(String, usize)]) -> Result<RecordBatch> {
    batch(vec![
        (column, text_array(counts.iter().map(|(l, _)| Some(l.clone())))),
        ("count", count_array(counts.iter().map(|(_, n)| *n))),
    ])
}

pub fn profile_batch(group: &str, profile: &MeanProfile) -> Result<RecordBatch> {
    let mut columns = vec![(
        group,
        text_array(profile.groups.iter().map(|g| Some(g.label()))),
    )];
    for (c, name) in profile.columns.iter().enumerate() {
        columns.push((
            name.as_str(),
            float_array(profile.means.iter().map(|row| row[c])),
        ));
    }
    batch(columns)
}

pub fn spread_batch(group: &str, spread: &[Spread]) -> Result<RecordBatch> {
    batch(vec![
        (group, text_array(spread.iter().map(|s| Some(s.group.label())))),
        ("n", count_array(spread.iter().map(|s| s.n))),
        ("min", float_array(spread.iter().map(|s| Some(s.min)))),
        ("q1", float_array(spread.iter().map(|s| Some(s.q1)))),
        ("median", float_array(spread.iter().map(|s| Some(s.median)))),
        ("q3", float_array(spread.iter().map(|s| Some(s.q3)))),
        ("max", float_array(spread.iter().map(|s| Some(s.max)))),
    ])
}

pub fn composition_batch(group: &str, category: &str, cells: &[CompositionCell]) -> Result<RecordBatch> {
    batch(vec![
        (group, text_array(cells.iter().map(|c| Some(c.group.label())))),
        (category, text_array(cells.iter().map(|c| Some(c.category.clone())))),
        ("count", count_array(cells.iter().map(|c| c.count))),
    ])
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

pub fn print_batch(title: &str, batch: &RecordBatch) -> Result<()> {
    if !title.is_empty() {
        println!("{title}");
    }
    println!("{}", pretty_format_batches(std::slice::from_ref(batch))?);
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
