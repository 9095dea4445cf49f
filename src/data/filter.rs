use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{cell, Row, Table};
use super::schema::ColumnKind;
use crate::error::{InsightError, Result};

// ---------------------------------------------------------------------------
// Filter predicates: per-column range or set of allowed values
// ---------------------------------------------------------------------------

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        NumericRange { min, max }
    }

    /// The range spanning every numeric value of `column`, if it has any.
    pub fn covering(table: &Table, column: &str) -> Option<Self> {
        table
            .column_values(column)
            .filter_map(|v| v.as_f64())
            .fold(None, |acc: Option<NumericRange>, v| {
                Some(match acc {
                    Some(r) => NumericRange::new(r.min.min(v), r.max.max(v)),
                    None => NumericRange::new(v, v),
                })
            })
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }
}

/// Allowed string forms for a categorical column.
///
/// `allowed: None` is the unset state and lets every row through.
/// `Some(empty)` is an explicit "select none" and rejects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoricalSet {
    #[serde(default)]
    pub allowed: Option<BTreeSet<String>>,
}

impl CategoricalSet {
    /// Unset: no filtering.
    pub fn unset() -> Self {
        CategoricalSet { allowed: None }
    }

    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoricalSet {
            allowed: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Explicit empty selection: nothing passes.
    pub fn none() -> Self {
        CategoricalSet {
            allowed: Some(BTreeSet::new()),
        }
    }

    pub fn allows(&self, label: &str) -> bool {
        match &self.allowed {
            None => true,
            Some(set) => set.contains(label),
        }
    }
}

/// One column's predicate: `{ min, max }` or `{ allowed = [...] }`.
///
/// Both shapes reject unknown keys, so a table that is neither (a misspelt
/// bound, a string bound) fails to parse instead of becoming an unset set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnFilter {
    Range(NumericRange),
    Set(CategoricalSet),
}

/// All active predicates, keyed by column. A column absent from the map is
/// not filtered. Predicates combine with logical AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    pub columns: BTreeMap<String, ColumnFilter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec with every categorical column set to all of its observed values,
    /// the "show everything" default a selection widget starts from.
    pub fn select_all(table: &Table) -> Self {
        let columns = table
            .schema()
            .iter()
            .filter(|d| d.kind == ColumnKind::Categorical)
            .map(|d| {
                let labels = table.unique_labels(&d.name);
                (d.name.clone(), ColumnFilter::Set(CategoricalSet::only(labels)))
            })
            .collect();
        FilterSpec { columns }
    }

    pub fn with_range(mut self, column: &str, min: f64, max: f64) -> Self {
        self.set(column, ColumnFilter::Range(NumericRange::new(min, max)));
        self
    }

    pub fn with_values<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(column, ColumnFilter::Set(CategoricalSet::only(values)));
        self
    }

    pub fn set(&mut self, column: &str, filter: ColumnFilter) {
        self.columns.insert(column.to_string(), filter);
    }

    /// Drop the predicate on `column`, returning it to "no filtering".
    pub fn unset(&mut self, column: &str) -> Option<ColumnFilter> {
        self.columns.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.columns.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Reject predicates that would silently produce a misleading result.
fn validate(table: &Table, spec: &FilterSpec) -> Result<()> {
    for (column, filter) in &spec.columns {
        let kind = table
            .kind_of(column)
            .ok_or_else(|| InsightError::ColumnNotFound(column.clone()))?;
        if let ColumnFilter::Range(range) = filter {
            if kind == ColumnKind::Categorical {
                return Err(InsightError::RangeOnCategorical(column.clone()));
            }
            if range.min.is_nan() || range.max.is_nan() || range.min > range.max {
                return Err(InsightError::InvalidRange {
                    column: column.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }
    }
    Ok(())
}

fn row_passes(row: &Row, spec: &FilterSpec) -> bool {
    spec.columns.iter().all(|(column, filter)| {
        let value = cell(row, column);
        match filter {
            // Unparsable values never satisfy a range.
            ColumnFilter::Range(range) => value.as_f64().is_some_and(|v| range.contains(v)),
            ColumnFilter::Set(set) => set.allows(&value.label()),
        }
    })
}

/// Return indices of rows that pass all active filters, in table order.
pub fn filtered_indices(table: &Table, spec: &FilterSpec) -> Result<Vec<usize>> {
    validate(table, spec)?;
    Ok(table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row_passes(row, spec))
        .map(|(i, _)| i)
        .collect())
}

/// Return a new table holding the rows that pass all active filters.
///
/// Order is preserved. An empty result is a valid table, not an error.
pub fn apply_filters(table: &Table, spec: &FilterSpec) -> Result<Table> {
    validate(table, spec)?;
    let rows: Vec<Row> = table
        .rows()
        .iter()
        .filter(|row| row_passes(row, spec))
        .cloned()
        .collect();
    log::debug!(
        "filters on {:?} kept {} of {} rows",
        spec.columns.keys().collect::<Vec<_>>(),
        rows.len(),
        table.len()
    );
    Ok(table.with_rows(rows))
}
