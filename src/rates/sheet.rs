//! Parsing of the bank's published quote sheet and rate refresh

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use log::{error, info, warn};
use std::str::FromStr;

use crate::traits::*;
use crate::types::*;

/// Header cell marking the USD column of the quote sheet
pub const USD_COLUMN_LABEL: &str = "米ドル";

/// Date format used in the first column of the quote sheet, e.g. `2024/1/4`
pub const SHEET_DATE_FORMAT: &str = "%Y/%m/%d";

/// Extract dated TTM rates from an already decoded quote sheet
///
/// The header row is the first row containing `currency_label`; the column
/// holding the label is the rate column. Data rows follow it, with the date in
/// the first column. Rows with an unreadable date or rate are skipped.
pub fn parse_rate_sheet(content: &str, currency_label: &str) -> ConversionResult<Vec<RateEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rate_column: Option<usize> = None;
    let mut entries = Vec::new();

    for record in rdr.records() {
        let record = record?;

        let column = match rate_column {
            Some(column) => column,
            None => {
                rate_column = record.iter().position(|cell| cell.contains(currency_label));
                if let Some(column) = rate_column {
                    info!("Found '{}' in column {}", currency_label, column);
                }
                continue;
            }
        };

        let raw_date = record.get(0).map(str::trim).unwrap_or_default();
        if raw_date.is_empty() {
            continue;
        }
        let date = match NaiveDate::parse_from_str(raw_date, SHEET_DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                warn!("Skipping row with unreadable date '{}': {}", raw_date, e);
                continue;
            }
        };

        let raw_rate: String = record
            .get(column)
            .unwrap_or_default()
            .chars()
            .filter(|c| *c != ',')
            .collect();
        match BigDecimal::from_str(raw_rate.trim()) {
            Ok(rate) if rate > BigDecimal::from(0) => entries.push(RateEntry::new(date, rate)),
            _ => warn!("No TTM rate found for {} in '{}'", date, raw_rate.trim()),
        }
    }

    if rate_column.is_none() {
        return Err(ConversionError::RateSheet(format!(
            "'{}' column not found",
            currency_label
        )));
    }
    if entries.is_empty() {
        return Err(ConversionError::RateSheet(
            "no valid TTM data found".to_string(),
        ));
    }
    Ok(entries)
}

/// Parse a quote sheet and store its rates, recording the refresh outcome
///
/// Returns the number of rates written. On failure the repository's refresh
/// status is set to failed and the error is returned.
pub async fn refresh_from_sheet<R>(
    repository: &mut R,
    content: &str,
    currency_label: &str,
    now: NaiveDateTime,
) -> ConversionResult<usize>
where
    R: RateRepository + ?Sized,
{
    let outcome = match parse_rate_sheet(content, currency_label) {
        Ok(entries) => repository.upsert_rates(&entries).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(count) => {
            repository
                .record_refresh(RefreshStatus::success(now, count))
                .await?;
            info!("TTM data updated successfully with {} entries", count);
            Ok(count)
        }
        Err(e) => {
            error!("Error refreshing TTM data: {}", e);
            repository
                .record_refresh(RefreshStatus::failed(now, e.to_string()))
                .await?;
            Err(e)
        }
    }
}
