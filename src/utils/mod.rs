//! Utility modules

pub mod memory_storage;
pub mod serde_format;
pub mod validation;

pub use memory_storage::*;
pub use validation::*;
