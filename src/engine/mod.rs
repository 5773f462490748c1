//! Core engine: market aggregation and the slate pipeline.

pub mod aggregator;
pub mod runner;
