use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::aggregate::AggregateRow;
use crate::error::InsightError;

/// Aggregate field used as the sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Count,
    #[default]
    Sum,
    Mean,
}

impl Metric {
    pub fn value(&self, row: &AggregateRow) -> f64 {
        match self {
            Metric::Count => row.count as f64,
            Metric::Sum => row.sum,
            Metric::Mean => row.mean,
        }
    }
}

impl FromStr for Metric {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Metric::Count),
            "sum" => Ok(Metric::Sum),
            "mean" | "avg" => Ok(Metric::Mean),
            _ => Err(InsightError::InvalidMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Count => "count",
            Metric::Sum => "sum",
            Metric::Mean => "mean",
        })
    }
}

/// Sort aggregate rows by `metric` and keep the first `top_n`.
///
/// Ties fall back to the group key in ascending order whatever the
/// direction. `None` or `Some(0)` keeps every row.
pub fn rank(
    mut rows: Vec<AggregateRow>,
    metric: Metric,
    descending: bool,
    top_n: Option<usize>,
) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| {
        let by_metric = metric.value(a).total_cmp(&metric.value(b));
        let by_metric = if descending {
            by_metric.reverse()
        } else {
            by_metric
        };
        by_metric.then_with(|| a.group.cmp(&b.group))
    });
    if let Some(n) = top_n.filter(|&n| n > 0) {
        rows.truncate(n);
    }
    rows
}
