//! Value/risk aggregation pipeline.
//!
//! Three stages, each a pure function of the record set and assumptions:
//! row derivation, group-by rollups (portfolio, pods, quarters), and the
//! cumulative cash-flow projection.

pub mod aggregator;
pub mod derive;
pub mod filter;
pub mod pods;

pub use aggregator::*;
pub use filter::{filter_rows, highest_value_pod, sort_rows, RowFilter, SortOrder};
