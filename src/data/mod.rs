//! Data layer: cell values, tables, column typing, loading, filtering and
//! row views.
//!
//! ```text
//!  .csv / .json / .parquet
//!        │  loader: parse, unify int/float, derive spend
//!        ▼
//!      Table ── schema: Numeric | Categorical per column
//!        │
//!        ├── filter: range / set predicates → filtered Table
//!        └── view:   stable sort, head
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod view;
