//! Historical TTM rates: lookup table and bank quote sheet ingestion

pub mod sheet;
pub mod table;

pub use sheet::*;
pub use table::*;
