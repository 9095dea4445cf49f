//! Insight layer: classification, aggregation, ranking and profiles.
//!
//! [`pipeline::run`] chains classify → filter → aggregate → rank for one
//! query; [`profile`] holds the descriptive views built on the same table.

pub mod aggregate;
pub mod classify;
pub mod pipeline;
pub mod profile;
pub mod rank;
