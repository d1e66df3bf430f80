//! Raw ledger rows and CSV ingestion

use csv::{ReaderBuilder, StringRecord, Trim};
use log::info;
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::types::*;
use crate::utils::validation::validate_required_columns;

pub const DATE_COLUMN: &str = "Transaction date";
pub const TIME_COLUMN: &str = "Transaction time";
pub const CREDIT_COLUMN: &str = "Credit amount";
pub const DEBIT_COLUMN: &str = "Debit amount";
pub const DESCRIPTION_COLUMN: &str = "Description";

/// Columns that must be present in every uploaded ledger
pub const REQUIRED_COLUMNS: [&str; 2] = [DATE_COLUMN, CREDIT_COLUMN];

/// One untyped ledger row as exported by the bank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: String,
    pub time: Option<String>,
    pub credit: Option<String>,
    pub debit: Option<String>,
    pub description: Option<String>,
}

impl RawRow {
    /// Create a row with only a date set
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn credit(mut self, amount: impl Into<String>) -> Self {
        self.credit = Some(amount.into());
        self
    }

    pub fn debit(mut self, amount: impl Into<String>) -> Self {
        self.debit = Some(amount.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Column positions resolved from a header row
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    date: usize,
    time: Option<usize>,
    credit: usize,
    debit: Option<usize>,
    description: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> ConversionResult<Self> {
        let names: Vec<&str> = headers.iter().collect();
        validate_required_columns(&names, &REQUIRED_COLUMNS)?;

        let position = |name: &str| names.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| ConversionError::MissingColumns(vec![name.to_string()]))
        };

        Ok(Self {
            date: required(DATE_COLUMN)?,
            time: position(TIME_COLUMN),
            credit: required(CREDIT_COLUMN)?,
            debit: position(DEBIT_COLUMN),
            description: position(DESCRIPTION_COLUMN),
        })
    }

    fn row(&self, record: &StringRecord) -> RawRow {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .map(|value| value.to_string())
        };

        RawRow {
            date: record.get(self.date).unwrap_or_default().to_string(),
            time: cell(self.time),
            credit: cell(Some(self.credit)),
            debit: cell(self.debit),
            description: cell(self.description),
        }
    }
}

/// Read ledger rows from CSV with a header line
///
/// Column presence is checked before any row is read.
pub fn read_rows<R: Read>(reader: R) -> ConversionResult<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    info!(
        "CSV columns found: {}",
        headers.iter().collect::<Vec<_>>().join(", ")
    );
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(columns.row(&record?));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows_maps_columns_by_name() {
        let data = "\
Description,Debit amount,Credit amount,Transaction time,Transaction date
Payment from Acme,,\"1,000.00\",09:15:00,01-02-2024
Card purchase,25.00,,18:00:00,01-03-2024
";
        let rows = read_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            RawRow::new("01-02-2024")
                .time("09:15:00")
                .credit("1,000.00")
                .debit("")
                .description("Payment from Acme")
        );
        assert_eq!(rows[1].debit.as_deref(), Some("25.00"));
        assert_eq!(rows[1].credit.as_deref(), Some(""));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let data = "Transaction date,Credit amount\n01-02-2024,10\n";
        let rows = read_rows(data.as_bytes()).unwrap();

        assert_eq!(rows, vec![RawRow::new("01-02-2024").credit("10")]);
    }

    #[test]
    fn test_missing_required_columns() {
        let data = "Date,Amount\n01-02-2024,10\n";
        let err = read_rows(data.as_bytes()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingColumns);
        assert_eq!(
            err.to_string(),
            "Missing required columns: Transaction date, Credit amount"
        );
    }
}
