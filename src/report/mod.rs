//! Aggregation and export of converted ledgers

pub mod aggregator;
pub mod export;

pub use aggregator::*;
pub use export::*;
