//! In-memory rate storage implementation for testing

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::sync::{Arc, RwLock};

use crate::rates::RateTable;
use crate::traits::*;
use crate::types::*;

fn poisoned<T>(_: T) -> ConversionError {
    ConversionError::Storage("rate storage lock poisoned".to_string())
}

/// In-memory rate storage for testing and development
///
/// Clones share the same underlying table, so a refresher and any number of
/// converters can hold their own handle.
#[derive(Debug, Clone)]
pub struct MemoryRateStorage {
    rates: Arc<RwLock<RateTable>>,
    status: Arc<RwLock<RefreshStatus>>,
}

impl MemoryRateStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            rates: Arc::new(RwLock::new(RateTable::new())),
            status: Arc::new(RwLock::new(RefreshStatus::default())),
        }
    }

    /// Create a storage pre-loaded with rates
    pub fn with_rates(table: RateTable) -> Self {
        Self {
            rates: Arc::new(RwLock::new(table)),
            status: Arc::new(RwLock::new(RefreshStatus::default())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ConversionResult<()> {
        *self.rates.write().map_err(poisoned)? = RateTable::new();
        *self.status.write().map_err(poisoned)? = RefreshStatus::default();
        Ok(())
    }
}

impl Default for MemoryRateStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateRepository for MemoryRateStorage {
    async fn get_rate(&self, date: NaiveDate) -> ConversionResult<BigDecimal> {
        self.rates.read().map_err(poisoned)?.get_rate(date)
    }

    async fn upsert_rates(&mut self, entries: &[RateEntry]) -> ConversionResult<usize> {
        self.rates
            .write()
            .map_err(poisoned)?
            .extend(entries.iter().cloned())
    }

    async fn snapshot(&self) -> ConversionResult<RateTable> {
        Ok(self.rates.read().map_err(poisoned)?.clone())
    }

    async fn rate_count(&self) -> ConversionResult<usize> {
        Ok(self.rates.read().map_err(poisoned)?.len())
    }

    async fn refresh_status(&self) -> ConversionResult<RefreshStatus> {
        Ok(self.status.read().map_err(poisoned)?.clone())
    }

    async fn record_refresh(&mut self, status: RefreshStatus) -> ConversionResult<()> {
        *self.status.write().map_err(poisoned)? = status;
        Ok(())
    }
}
