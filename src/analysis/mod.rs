//! Aggregation over stored analyses.
//!
//! Everything here is recomputed from report text on every call; nothing
//! derived from a report is cached.

pub mod aggregator;

pub use aggregator::*;
