//! Error types for the insight pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Configuration errors that make a query meaningless.
///
/// Malformed individual cells never surface here; they are excluded from the
/// computation that could not use them.
#[derive(Debug, Error, PartialEq)]
pub enum InsightError {
    /// The group-by column is absent from the table.
    #[error("group column not found: {0}")]
    GroupColumnNotFound(String),

    /// The measure column is absent from the table.
    #[error("measure column not found: {0}")]
    MeasureColumnNotFound(String),

    /// A filter, sort or profile column is absent from the table.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Metric name other than `count`, `sum` or `mean`.
    #[error("invalid metric '{0}' (expected count, sum or mean)")]
    InvalidMetric(String),

    /// Numeric range with `min > max` or a NaN bound.
    #[error("invalid range for column {column}: [{min}, {max}]")]
    InvalidRange { column: String, min: f64, max: f64 },

    /// Numeric range requested on a column typed as categorical.
    #[error("column {0} is categorical and cannot take a numeric range")]
    RangeOnCategorical(String),
}
