//! Filter, aggregate and classify retail transaction tables.
//!
//! A [`Table`] is loaded once per session; every query re-runs the
//! [`pipeline`](insight::pipeline) against it from scratch.

pub mod config;
pub mod data;
pub mod error;
pub mod insight;
pub mod session;

pub use data::filter::{CategoricalSet, ColumnFilter, FilterSpec, NumericRange};
pub use data::model::{CellValue, Row, Table};
pub use error::{InsightError, Result};
pub use insight::aggregate::AggregateRow;
pub use insight::pipeline::{run, InsightQuery};
pub use insight::rank::Metric;
pub use session::Session;
