//! # TTM Ledger
//!
//! Converts a chronological ledger of USD cash movements into JPY using the
//! bank's historical TTM (Telegraphic Transfer Middle) rates, and computes the
//! realized exchange profit of USD receipts when they are withdrawn.
//!
//! ## Features
//!
//! - **Rate lookup**: date-keyed TTM table with nearest-past, then nearest-future fallback
//! - **Normalization**: strict validation of ledger rows into typed movements
//! - **Reconciliation**: pending credits are settled against the next debit's rate
//! - **Reporting**: monthly buckets with per-vendor breakdown and an overall summary
//! - **Storage abstraction**: rates live behind the async [`RateRepository`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use ttm_ledger::{process_batch, ConversionConfig, RateEntry, RateTable, RawRow};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let table = RateTable::from_entries(vec![RateEntry::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     BigDecimal::from(140),
//! )])
//! .unwrap();
//!
//! let rows = vec![RawRow::new("01-01-2024").credit("100").description("Payment from Acme")];
//! let result = process_batch(&table, &rows, &ConversionConfig::default()).unwrap();
//!
//! assert_eq!(result.transactions[0].amount_jpy, 14000);
//! assert_eq!(result.transactions[0].vendor, "Acme");
//! ```

pub mod config;
pub mod ledger;
pub mod rates;
pub mod reconciliation;
pub mod report;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use rates::*;
pub use reconciliation::ReconciliationEngine;
pub use report::*;
pub use traits::*;
pub use types::*;
