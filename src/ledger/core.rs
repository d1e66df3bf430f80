//! Main converter that orchestrates rate lookup, reconciliation and reporting

use chrono::NaiveDateTime;
use log::info;
use std::io::Read;
use uuid::Uuid;

use crate::config::ConversionConfig;
use crate::ledger::normalizer::TransactionNormalizer;
use crate::ledger::row::{read_rows, RawRow};
use crate::rates::{refresh_from_sheet, RateTable, USD_COLUMN_LABEL};
use crate::reconciliation::ReconciliationEngine;
use crate::report::Aggregator;
use crate::traits::*;
use crate::types::*;

/// Converts uploaded USD ledgers into JPY reports using a shared rate repository
///
/// Each batch takes its own snapshot of the rate table, so a refresh running
/// concurrently never changes the rates seen halfway through a ledger.
pub struct Converter<R: RateRepository> {
    repository: R,
    config: ConversionConfig,
}

impl<R: RateRepository> Converter<R> {
    /// Create a new converter with default settings
    pub fn new(repository: R) -> Self {
        Self::with_config(repository, ConversionConfig::default())
    }

    /// Create a new converter with custom settings
    pub fn with_config(repository: R, config: ConversionConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    /// Process already-parsed ledger rows
    pub async fn process_rows(&self, rows: &[RawRow]) -> ConversionResult<ProcessResult> {
        let run_id = Uuid::new_v4();
        let table = self.repository.snapshot().await?;
        info!(
            "Run {}: processing {} rows against {} rates",
            run_id,
            rows.len(),
            table.len()
        );

        let result = process_batch(&table, rows, &self.config)?;
        info!(
            "Run {}: {} transactions in {} months, exchange profit {}",
            run_id,
            result.summary.total_transactions,
            result.monthly.len(),
            result.summary.total_exchange_profit
        );
        Ok(result)
    }

    /// Read a ledger CSV and process it
    ///
    /// Missing columns are reported before any row is processed.
    pub async fn process_csv<Rd: Read>(&self, reader: Rd) -> ConversionResult<ProcessResult> {
        let rows = read_rows(reader)?;
        self.process_rows(&rows).await
    }

    /// Load the USD column of a downloaded quote sheet into the repository
    pub async fn refresh_rates(
        &mut self,
        sheet: &str,
        now: NaiveDateTime,
    ) -> ConversionResult<usize> {
        refresh_from_sheet(&mut self.repository, sheet, USD_COLUMN_LABEL, now).await
    }

    /// Status of the most recent rate refresh
    pub async fn refresh_status(&self) -> ConversionResult<RefreshStatus> {
        self.repository.refresh_status().await
    }
}

/// Run one batch against a rate snapshot
///
/// Rows are normalized in input order, then sorted by (date, time) when the
/// configuration asks for it, reconciled, and aggregated. Nothing is returned
/// alongside an error.
pub fn process_batch(
    table: &RateTable,
    rows: &[RawRow],
    config: &ConversionConfig,
) -> ConversionResult<ProcessResult> {
    let normalizer = TransactionNormalizer::new(table, config);
    let mut movements = normalizer.normalize_all(rows)?;

    if config.sort_chronologically {
        movements.sort_by_key(|m| m.datetime);
    }

    let transactions = ReconciliationEngine::new().reconcile(movements);

    let mut aggregator = Aggregator::new();
    for transaction in &transactions {
        aggregator.add(transaction)?;
    }
    let (monthly, summary) = aggregator.finish();

    Ok(ProcessResult {
        transactions,
        monthly,
        summary,
    })
}
