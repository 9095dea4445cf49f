use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate, AggregateRow};
use super::classify::{derive_classes, ClassSources};
use super::rank::{rank, Metric};
use crate::data::filter::{apply_filters, FilterSpec};
use crate::data::model::Table;
use crate::error::Result;

/// Everything one insight query needs. Built fresh by the caller for every
/// request; the pipeline keeps no state between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightQuery {
    /// Derive `age_class` / `price_class` before filtering.
    pub classify: bool,
    /// Not read from the `[query]` table; [`AppConfig`](crate::config::AppConfig)
    /// fills it from `[columns]` so the age/price names live in one place.
    #[serde(skip)]
    pub class_sources: ClassSources,
    pub filters: FilterSpec,
    pub group_column: String,
    pub measure_column: String,
    pub metric: Metric,
    pub descending: bool,
    pub top_n: Option<usize>,
}

impl Default for InsightQuery {
    fn default() -> Self {
        Self {
            classify: false,
            class_sources: ClassSources::default(),
            filters: FilterSpec::default(),
            group_column: "category".to_string(),
            measure_column: "total_spend".to_string(),
            metric: Metric::Sum,
            descending: true,
            top_n: None,
        }
    }
}

impl InsightQuery {
    pub fn new(group_column: &str, measure_column: &str) -> Self {
        Self {
            group_column: group_column.to_string(),
            measure_column: measure_column.to_string(),
            ..Self::default()
        }
    }
}

/// Classify, filter, aggregate and rank in that fixed order.
///
/// Classification runs first so filters may reference the derived columns;
/// aggregation runs on the filtered rows only. `table` is never modified.
pub fn run(table: &Table, query: &InsightQuery) -> Result<Vec<AggregateRow>> {
    let classified;
    let source = if query.classify {
        classified = derive_classes(table, &query.class_sources);
        &classified
    } else {
        table
    };

    let filtered = apply_filters(source, &query.filters)?;
    let groups = aggregate(&filtered, &query.group_column, &query.measure_column)?;
    log::debug!(
        "{} rows -> {} filtered -> {} groups by '{}'",
        table.len(),
        filtered.len(),
        groups.len(),
        query.group_column
    );
    Ok(rank(groups, query.metric, query.descending, query.top_n))
}
