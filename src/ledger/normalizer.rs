//! Row validation and conversion into typed movements

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};

use crate::config::{ConversionConfig, ErrorPolicy};
use crate::ledger::row::RawRow;
use crate::rates::RateTable;
use crate::types::*;
use crate::utils::validation::parse_amount;

/// Turns raw ledger rows into [`Movement`]s priced against a rate snapshot
///
/// Normalization is a pure function of the row, the configuration and the
/// rate table; it never mutates either.
pub struct TransactionNormalizer<'a> {
    table: &'a RateTable,
    config: &'a ConversionConfig,
}

impl<'a> TransactionNormalizer<'a> {
    pub fn new(table: &'a RateTable, config: &'a ConversionConfig) -> Self {
        Self { table, config }
    }

    /// Parse the date and optional time of a row
    ///
    /// A missing or blank time means midnight.
    pub fn parse_datetime(&self, row: &RawRow) -> ConversionResult<NaiveDateTime> {
        let raw_date = row.date.trim();
        let date = self
            .config
            .date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw_date, format).ok())
            .ok_or_else(|| {
                ConversionError::InvalidDateFormat(format!(
                    "date '{}' does not match any of {}",
                    raw_date,
                    self.config.date_formats.join(", ")
                ))
            })?;

        let time = match row.time.as_deref().map(str::trim) {
            None | Some("") => NaiveTime::MIN,
            Some(raw_time) => NaiveTime::parse_from_str(raw_time, &self.config.time_format)
                .map_err(|_| {
                    ConversionError::InvalidDateFormat(format!(
                        "time '{}' does not match {}",
                        raw_time, self.config.time_format
                    ))
                })?,
        };

        Ok(date.and_time(time))
    }

    /// Derive the vendor label from a free-text description
    pub fn vendor_label(&self, description: Option<&str>) -> String {
        let description = description.unwrap_or_default().trim_start();
        let label = match &self.config.vendor_prefix {
            Some(prefix) => description
                .strip_prefix(prefix.as_str())
                .unwrap_or(description),
            None => description,
        }
        .trim();

        if label.is_empty() {
            self.config.default_vendor.clone()
        } else {
            label.to_string()
        }
    }

    /// Validate one row and convert it to a movement
    pub fn normalize(&self, row: &RawRow) -> ConversionResult<Movement> {
        let datetime = self.parse_datetime(row)?;

        let raw_credit = row.credit.as_deref().unwrap_or_default();
        let raw_debit = row.debit.as_deref().unwrap_or_default();
        let credit = parse_amount(raw_credit)?;
        let debit = parse_amount(raw_debit)?;

        let zero = BigDecimal::from(0);
        let (direction, amount_usd) = match (credit > zero, debit > zero) {
            (true, false) => (Direction::Credit, credit),
            (false, true) => (Direction::Debit, debit),
            _ => {
                return Err(ConversionError::AmbiguousTransaction {
                    credit: raw_credit.trim().to_string(),
                    debit: raw_debit.trim().to_string(),
                })
            }
        };

        let resolved = self.table.resolve(datetime.date())?;
        debug!(
            "{} {} USD on {} at rate {} (from {})",
            direction.as_str(),
            amount_usd,
            datetime,
            resolved.rate,
            resolved.source_date
        );

        Movement::new(
            datetime,
            self.vendor_label(row.description.as_deref()),
            direction,
            amount_usd,
            resolved.rate,
        )
    }

    /// Normalize every row, honoring the configured error policy
    ///
    /// Errors carry the 1-based data row number. No movements are returned
    /// when any row fails.
    pub fn normalize_all(&self, rows: &[RawRow]) -> ConversionResult<Vec<Movement>> {
        let mut movements = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match self.normalize(row) {
                Ok(movement) => movements.push(movement),
                Err(err) => {
                    let err = err.at_row(index + 1);
                    warn!("{}", err);
                    match self.config.error_policy {
                        ErrorPolicy::FailFast => return Err(err),
                        ErrorPolicy::CollectAll => errors.push(err),
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(movements)
        } else {
            Err(ConversionError::Batch(errors))
        }
    }
}
