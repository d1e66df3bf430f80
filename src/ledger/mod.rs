//! Ledger module containing row ingestion, normalization and batch orchestration

pub mod core;
pub mod normalizer;
pub mod row;

pub use self::core::*;
pub use normalizer::*;
pub use row::*;
