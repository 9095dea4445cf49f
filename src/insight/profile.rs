//! Descriptive analytics over a (usually filtered) table: headline figures,
//! value counts, per-group profiles and a table overview.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::ProfileConfig;
use crate::data::model::{cell, CellValue, Table};
use crate::data::schema::ColumnKind;
use crate::error::{InsightError, Result};

fn require(table: &Table, column: &str) -> Result<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(InsightError::ColumnNotFound(column.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Headline figures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    /// Sum of the numeric measure values.
    pub total: f64,
    /// Mean over numeric measure values only; `None` when there are none.
    pub mean: Option<f64>,
}

pub fn summarize(table: &Table, measure: &str) -> Result<Summary> {
    if !table.has_column(measure) {
        return Err(InsightError::MeasureColumnNotFound(measure.to_string()));
    }
    let (n, total) = table
        .column_values(measure)
        .filter_map(CellValue::as_f64)
        .fold((0usize, 0.0), |(n, sum), v| (n + 1, sum + v));
    Ok(Summary {
        rows: table.len(),
        total,
        mean: (n > 0).then(|| total / n as f64),
    })
}

/// Occurrences of each string form, most frequent first, ties by label.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>> {
    require(table, column)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for v in table.column_values(column) {
        *counts.entry(v.label()).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    // Stable sort keeps label order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

// ---------------------------------------------------------------------------
// Per-group profiles
// ---------------------------------------------------------------------------

/// Mean of several numeric columns per group (heatmap data).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanProfile {
    pub columns: Vec<String>,
    pub groups: Vec<CellValue>,
    /// `means[g][c]` is the mean of `columns[c]` within `groups[g]`.
    pub means: Vec<Vec<Option<f64>>>,
}

/// Numeric source columns eligible for a mean profile.
pub fn profile_columns(table: &Table, group: &str, config: &ProfileConfig) -> Vec<String> {
    table
        .schema()
        .iter()
        .filter(|d| d.kind == ColumnKind::Numeric && !d.derived)
        .filter(|d| d.name != group && !config.exclude.contains(&d.name))
        .map(|d| d.name.clone())
        .take(config.max_columns)
        .collect()
}

pub fn mean_profile(table: &Table, group: &str, columns: &[String]) -> Result<MeanProfile> {
    require(table, group)?;
    for column in columns {
        require(table, column)?;
    }

    // group → per-column (count, sum)
    let mut acc: BTreeMap<&CellValue, Vec<(usize, f64)>> = BTreeMap::new();
    for row in table.rows() {
        let sums = acc
            .entry(cell(row, group))
            .or_insert_with(|| vec![(0, 0.0); columns.len()]);
        for (slot, column) in sums.iter_mut().zip(columns) {
            if let Some(v) = cell(row, column).as_f64() {
                slot.0 += 1;
                slot.1 += v;
            }
        }
    }

    let mut groups = Vec::with_capacity(acc.len());
    let mut means = Vec::with_capacity(acc.len());
    for (key, sums) in acc {
        groups.push(key.clone());
        means.push(
            sums.into_iter()
                .map(|(n, sum)| (n > 0).then(|| sum / n as f64))
                .collect(),
        );
    }
    Ok(MeanProfile {
        columns: columns.to_vec(),
        groups,
        means,
    })
}

/// Five-number summary of a measure within one group (box-plot data).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spread {
    pub group: CellValue,
    pub n: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linear-interpolated quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Per-group spread of the numeric `measure` values. Groups without any
/// numeric value are left out.
pub fn spread(table: &Table, group: &str, measure: &str) -> Result<Vec<Spread>> {
    if !table.has_column(group) {
        return Err(InsightError::GroupColumnNotFound(group.to_string()));
    }
    if !table.has_column(measure) {
        return Err(InsightError::MeasureColumnNotFound(measure.to_string()));
    }
    let mut values: BTreeMap<&CellValue, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        if let Some(v) = cell(row, measure).as_f64() {
            values.entry(cell(row, group)).or_default().push(v);
        }
    }
    Ok(values
        .into_iter()
        .map(|(key, mut vs)| {
            vs.sort_by(f64::total_cmp);
            Spread {
                group: key.clone(),
                n: vs.len(),
                min: vs[0],
                q1: quantile(&vs, 0.25),
                median: quantile(&vs, 0.5),
                q3: quantile(&vs, 0.75),
                max: vs[vs.len() - 1],
            }
        })
        .collect())
}

/// Row count for one (group, category) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionCell {
    pub group: CellValue,
    pub category: String,
    pub count: usize,
}

/// Category mix per group, restricted to the `top_k` most frequent
/// categories overall. Ordered by group, then category.
pub fn composition(
    table: &Table,
    group: &str,
    category: &str,
    top_k: usize,
) -> Result<Vec<CompositionCell>> {
    require(table, group)?;
    let top: BTreeSet<String> = value_counts(table, category)?
        .into_iter()
        .take(top_k)
        .map(|(label, _)| label)
        .collect();

    let mut counts: BTreeMap<(&CellValue, String), usize> = BTreeMap::new();
    for row in table.rows() {
        let label = cell(row, category).label();
        if top.contains(&label) {
            *counts.entry((cell(row, group), label)).or_default() += 1;
        }
    }
    Ok(counts
        .into_iter()
        .map(|((g, category), count)| CompositionCell {
            group: g.clone(),
            category,
            count,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Table overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Pearson coefficients; `None` where a column has no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub correlation: Option<CorrelationMatrix>,
}

/// Pearson correlation over rows where both columns are numeric.
fn pearson(table: &Table, a: &str, b: &str) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = table
        .rows()
        .iter()
        .filter_map(|row| Some((cell(row, a).as_f64()?, cell(row, b).as_f64()?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

pub fn correlation_matrix(table: &Table) -> Option<CorrelationMatrix> {
    let columns: Vec<String> = table
        .schema()
        .iter()
        .filter(|d| d.kind == ColumnKind::Numeric)
        .map(|d| d.name.clone())
        .collect();
    if columns.is_empty() {
        return None;
    }
    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(table, a, b)).collect())
        .collect();
    Some(CorrelationMatrix { columns, values })
}

pub fn overview(table: &Table) -> Overview {
    let missing_cells = table
        .columns()
        .iter()
        .map(|c| table.column_values(c).filter(|v| v.is_null()).count())
        .sum();
    Overview {
        rows: table.len(),
        columns: table.columns().len(),
        missing_cells,
        correlation: correlation_matrix(table),
    }
}
