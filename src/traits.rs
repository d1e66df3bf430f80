//! Traits for rate storage abstraction

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::rates::RateTable;
use crate::types::*;

/// Storage abstraction for historical TTM rates
///
/// This trait allows the conversion engine to work with any storage backend
/// (SQLite, PostgreSQL, in-memory, etc.). Implementations must make bulk writes
/// atomic with respect to reads, since the refresh job may run while batches
/// are being processed.
#[async_trait]
pub trait RateRepository: Send + Sync {
    /// Get the rate for a date, using the nearest-date fallback of [`RateTable::get_rate`]
    async fn get_rate(&self, date: NaiveDate) -> ConversionResult<BigDecimal>;

    /// Replace or insert rates in bulk, returning the number written
    async fn upsert_rates(&mut self, entries: &[RateEntry]) -> ConversionResult<usize>;

    /// Immutable copy of every stored rate, used for one batch run
    async fn snapshot(&self) -> ConversionResult<RateTable>;

    /// Number of stored rates
    async fn rate_count(&self) -> ConversionResult<usize>;

    /// Status of the most recent refresh
    async fn refresh_status(&self) -> ConversionResult<RefreshStatus>;

    /// Record the outcome of a refresh
    async fn record_refresh(&mut self, status: RefreshStatus) -> ConversionResult<()>;
}
