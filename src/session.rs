use std::collections::BTreeSet;

use crate::data::filter::{filtered_indices, CategoricalSet, ColumnFilter, FilterSpec, NumericRange};
use crate::data::model::Table;
use crate::data::schema::ColumnDescriptor;
use crate::error::{InsightError, Result};
use crate::insight::aggregate::AggregateRow;
use crate::insight::classify::{derive_classes, ClassSources};
use crate::insight::pipeline::{self, InsightQuery};

// ---------------------------------------------------------------------------
// Analysis session
// ---------------------------------------------------------------------------

/// One user's analysis state: the loaded table and the current filter
/// selections. The pipeline itself stays stateless; this is what a front end
/// mutates between queries.
#[derive(Debug, Clone)]
pub struct Session {
    /// Loaded table (with derived class columns when built via [`Session::classified`]).
    table: Table,

    /// Per-column filter selections.
    pub filters: FilterSpec,

    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,
}

impl Session {
    /// Ingest a newly loaded table with every categorical value selected.
    pub fn new(table: Table) -> Self {
        let filters = FilterSpec::select_all(&table);
        let visible_indices = (0..table.len()).collect();
        Session {
            table,
            filters,
            visible_indices,
        }
    }

    /// Like [`Session::new`] but with `age_class` / `price_class` derived up
    /// front, so they can be filtered like any other column.
    pub fn classified(table: &Table, sources: &ClassSources) -> Self {
        Self::new(derive_classes(table, sources))
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        self.table.schema()
    }

    fn require(&self, column: &str) -> Result<()> {
        if self.table.has_column(column) {
            Ok(())
        } else {
            Err(InsightError::ColumnNotFound(column.to_string()))
        }
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) -> Result<()> {
        self.visible_indices = filtered_indices(&self.table, &self.filters)?;
        Ok(())
    }

    /// Toggle a single value in a column's selection. An unset column starts
    /// from "everything selected".
    pub fn toggle_value(&mut self, column: &str, label: &str) -> Result<()> {
        self.require(column)?;
        let mut selected: BTreeSet<String> = match self.filters.get(column) {
            Some(ColumnFilter::Set(CategoricalSet {
                allowed: Some(set),
            })) => set.clone(),
            _ => self.table.unique_labels(column),
        };
        if !selected.remove(label) {
            selected.insert(label.to_string());
        }
        self.filters.set(
            column,
            ColumnFilter::Set(CategoricalSet {
                allowed: Some(selected),
            }),
        );
        self.refilter()
    }

    /// Select only the given values in a column.
    pub fn select_values<I, S>(&mut self, column: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require(column)?;
        self.filters
            .set(column, ColumnFilter::Set(CategoricalSet::only(values)));
        self.refilter()
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) -> Result<()> {
        self.require(column)?;
        let all = self.table.unique_labels(column);
        self.select_values(column, all)
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) -> Result<()> {
        self.require(column)?;
        self.filters
            .set(column, ColumnFilter::Set(CategoricalSet::none()));
        self.refilter()
    }

    /// Restrict a numeric column to `[min, max]`.
    pub fn set_range(&mut self, column: &str, min: f64, max: f64) -> Result<()> {
        self.require(column)?;
        let previous = self
            .filters
            .columns
            .insert(column.to_string(), ColumnFilter::Range(NumericRange::new(min, max)));
        if let Err(e) = self.refilter() {
            // Keep the last valid state.
            match previous {
                Some(f) => self.filters.set(column, f),
                None => {
                    self.filters.unset(column);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Replace the selections for every column named in `spec`.
    pub fn merge(&mut self, spec: &FilterSpec) -> Result<()> {
        let previous = self.filters.clone();
        for (column, filter) in &spec.columns {
            self.filters.set(column, filter.clone());
        }
        if let Err(e) = self.refilter() {
            self.filters = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Stop filtering on `column`.
    pub fn unset(&mut self, column: &str) -> Result<()> {
        self.filters.unset(column);
        self.refilter()
    }

    /// Rows passing the current filters, in table order.
    pub fn filtered(&self) -> Table {
        let rows = self
            .visible_indices
            .iter()
            .map(|&i| self.table.rows()[i].clone())
            .collect();
        self.table.with_rows(rows)
    }

    /// Run `template` against the session table with the session's filters
    /// layered over the template's own.
    pub fn query(&self, template: &InsightQuery) -> Result<Vec<AggregateRow>> {
        let mut query = template.clone();
        for (column, filter) in &self.filters.columns {
            query.filters.set(column, filter.clone());
        }
        pipeline::run(&self.table, &query)
    }
}
