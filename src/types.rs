//! Core types and data structures for the conversion engine

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::serde_format;
use crate::utils::validation::validate_positive_amount;

/// Direction of a cash movement on the USD account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Credit - USD received into the account
    Credit,
    /// Debit - USD withdrawn from the account
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }
}

/// TTM rate published for a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Day the rate applies to
    pub date: NaiveDate,
    /// JPY per USD, always positive
    pub rate: BigDecimal,
}

impl RateEntry {
    pub fn new(date: NaiveDate, rate: BigDecimal) -> Self {
        Self { date, rate }
    }

    /// Validate the rate entry
    pub fn validate(&self) -> ConversionResult<()> {
        if self.rate <= BigDecimal::from(0) {
            return Err(ConversionError::InvalidRate(format!(
                "rate for {} must be positive, got {}",
                self.date, self.rate
            )));
        }
        Ok(())
    }
}

/// Realized exchange profit attached to a credit once a later debit settles it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeProfit {
    pub next_debit_date: NaiveDate,
    #[serde(serialize_with = "serde_format::time")]
    pub next_debit_time: NaiveTime,
    #[serde(rename = "next_debit_ttm", serialize_with = "serde_format::decimal")]
    pub next_debit_rate: BigDecimal,
    /// `amount_usd * (debit rate - credit rate)`, unrounded
    #[serde(serialize_with = "serde_format::decimal")]
    pub profit_jpy: BigDecimal,
}

/// A validated ledger movement converted to JPY
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movement {
    pub date: NaiveDate,
    #[serde(serialize_with = "serde_format::time")]
    pub time: NaiveTime,
    #[serde(serialize_with = "serde_format::datetime")]
    pub datetime: NaiveDateTime,
    /// Counterparty label derived from the row description
    pub vendor: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    #[serde(serialize_with = "serde_format::decimal")]
    pub amount_usd: BigDecimal,
    /// TTM rate resolved for `date`
    #[serde(rename = "ttm_rate", serialize_with = "serde_format::decimal")]
    pub resolved_rate: BigDecimal,
    pub amount_jpy: i64,
    /// Filled in by the reconciliation engine for settled credits
    pub exchange_profit: Option<ExchangeProfit>,
}

impl Movement {
    /// Create a new movement, computing its JPY amount
    ///
    /// Both the USD amount and the rate must be positive. The JPY amount is
    /// rounded half-to-even to whole yen.
    pub fn new(
        datetime: NaiveDateTime,
        vendor: String,
        direction: Direction,
        amount_usd: BigDecimal,
        resolved_rate: BigDecimal,
    ) -> ConversionResult<Self> {
        validate_positive_amount(&amount_usd)?;
        if resolved_rate <= BigDecimal::from(0) {
            return Err(ConversionError::InvalidRate(format!(
                "rate must be positive, got {}",
                resolved_rate
            )));
        }

        let amount_jpy = yen_amount(&amount_usd, &resolved_rate)?;

        Ok(Self {
            date: datetime.date(),
            time: datetime.time(),
            datetime,
            vendor,
            direction,
            amount_usd,
            resolved_rate,
            amount_jpy,
            exchange_profit: None,
        })
    }

    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }

    /// "YYYY-MM" key of the month this movement falls in
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Convert a USD amount to whole yen, rounding half-to-even
pub fn yen_amount(amount_usd: &BigDecimal, rate: &BigDecimal) -> ConversionResult<i64> {
    let exact = amount_usd * rate;
    exact
        .with_scale_round(0, RoundingMode::HalfEven)
        .to_i64()
        .ok_or_else(|| {
            ConversionError::Arithmetic(format!("JPY amount {} does not fit in i64", exact))
        })
}

/// Credit waiting for the next debit to realize its exchange profit
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCredit {
    /// Index of the originating movement in the output list
    pub position: usize,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub amount_usd: BigDecimal,
    pub resolved_rate: BigDecimal,
    pub amount_jpy: i64,
}

impl PendingCredit {
    pub fn from_movement(position: usize, movement: &Movement) -> Self {
        Self {
            position,
            date: movement.date,
            time: movement.time,
            amount_usd: movement.amount_usd.clone(),
            resolved_rate: movement.resolved_rate.clone(),
            amount_jpy: movement.amount_jpy,
        }
    }
}

/// Per-vendor totals inside a monthly bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorTotals {
    #[serde(serialize_with = "serde_format::decimal")]
    pub usd: BigDecimal,
    pub jpy: i64,
    pub count: usize,
    #[serde(serialize_with = "serde_format::decimal")]
    pub exchange_profit: BigDecimal,
}

impl Default for VendorTotals {
    fn default() -> Self {
        Self {
            usd: BigDecimal::from(0),
            jpy: 0,
            count: 0,
            exchange_profit: BigDecimal::from(0),
        }
    }
}

/// Totals for one calendar month of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    /// "YYYY-MM"
    pub month: String,
    #[serde(serialize_with = "serde_format::decimal")]
    pub total_usd: BigDecimal,
    pub total_jpy: i64,
    pub transaction_count: usize,
    pub vendor_transactions: BTreeMap<String, VendorTotals>,
    #[serde(serialize_with = "serde_format::decimal")]
    pub total_exchange_profit: BigDecimal,
}

impl MonthlyBucket {
    pub fn new(month: String) -> Self {
        Self {
            month,
            total_usd: BigDecimal::from(0),
            total_jpy: 0,
            transaction_count: 0,
            vendor_transactions: BTreeMap::new(),
            total_exchange_profit: BigDecimal::from(0),
        }
    }
}

/// Overall batch summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_transactions: usize,
    pub credit_transactions: usize,
    pub debit_transactions: usize,
    #[serde(serialize_with = "serde_format::decimal")]
    pub total_credit_usd: BigDecimal,
    pub total_credit_jpy: i64,
    #[serde(serialize_with = "serde_format::decimal")]
    pub total_debit_usd: BigDecimal,
    pub total_debit_jpy: i64,
    #[serde(serialize_with = "serde_format::decimal")]
    pub net_usd: BigDecimal,
    pub net_jpy: i64,
    /// Unweighted mean of every resolved rate, zero for an empty batch
    #[serde(serialize_with = "serde_format::decimal")]
    pub average_ttm_rate: BigDecimal,
    #[serde(serialize_with = "serde_format::decimal")]
    pub total_exchange_profit: BigDecimal,
}

/// Complete output of one batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResult {
    pub transactions: Vec<Movement>,
    pub monthly: Vec<MonthlyBucket>,
    pub summary: Summary,
}

/// Outcome of the most recent rate refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    /// No refresh has run yet
    Initial,
    Success,
    Failed(String),
}

/// Refresh bookkeeping kept alongside the rate table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub last_updated: Option<NaiveDateTime>,
    pub state: RefreshState,
    /// Entries written by the last successful refresh
    pub count: usize,
}

impl RefreshStatus {
    pub fn success(at: NaiveDateTime, count: usize) -> Self {
        Self {
            last_updated: Some(at),
            state: RefreshState::Success,
            count,
        }
    }

    pub fn failed(at: NaiveDateTime, message: String) -> Self {
        Self {
            last_updated: Some(at),
            state: RefreshState::Failed(message),
            count: 0,
        }
    }
}

impl Default for RefreshStatus {
    fn default() -> Self {
        Self {
            last_updated: None,
            state: RefreshState::Initial,
            count: 0,
        }
    }
}

/// Classification of a [`ConversionError`], independent of row context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDateFormat,
    MissingColumns,
    AmbiguousTransaction,
    InvalidAmount,
    InvalidRate,
    NoRateAvailable,
    ArithmeticError,
    RateSheet,
    Storage,
    Csv,
    Batch,
}

/// Errors that can occur while converting a ledger
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Ambiguous transaction: credit amount '{credit}', debit amount '{debit}' (exactly one must be positive)")]
    AmbiguousTransaction { credit: String, debit: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
    #[error("No TTM rate available for date {0} or nearby dates")]
    NoRateAvailable(NaiveDate),
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    #[error("Rate sheet error: {0}")]
    RateSheet(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Error in row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<ConversionError>,
    },
    #[error("Error processing CSV: {}", join_messages(.0))]
    Batch(Vec<ConversionError>),
}

fn join_messages(errors: &[ConversionError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConversionError {
    /// Attach a 1-based data row number to this error
    pub fn at_row(self, row: usize) -> Self {
        ConversionError::Row {
            row,
            source: Box::new(self),
        }
    }

    /// Row the error was raised for, if any
    pub fn row(&self) -> Option<usize> {
        match self {
            ConversionError::Row { row, .. } => Some(*row),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::InvalidDateFormat(_) => ErrorKind::InvalidDateFormat,
            ConversionError::MissingColumns(_) => ErrorKind::MissingColumns,
            ConversionError::AmbiguousTransaction { .. } => ErrorKind::AmbiguousTransaction,
            ConversionError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            ConversionError::InvalidRate(_) => ErrorKind::InvalidRate,
            ConversionError::NoRateAvailable(_) => ErrorKind::NoRateAvailable,
            ConversionError::Arithmetic(_) => ErrorKind::ArithmeticError,
            ConversionError::RateSheet(_) => ErrorKind::RateSheet,
            ConversionError::Storage(_) => ErrorKind::Storage,
            ConversionError::Csv(_) => ErrorKind::Csv,
            ConversionError::Row { source, .. } => source.kind(),
            ConversionError::Batch(_) => ErrorKind::Batch,
        }
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_movement_computes_yen_amount() {
        let movement = Movement::new(
            at("2024-01-01"),
            "Acme".to_string(),
            Direction::Credit,
            BigDecimal::from(100),
            BigDecimal::from_str("140.00").unwrap(),
        )
        .unwrap();

        assert_eq!(movement.amount_jpy, 14000);
        assert_eq!(movement.month(), "2024-01");
        assert!(movement.is_credit());
        assert!(movement.exchange_profit.is_none());
    }

    #[test]
    fn test_yen_rounding_is_half_even() {
        let rate = BigDecimal::from(1);
        assert_eq!(yen_amount(&BigDecimal::from_str("0.5").unwrap(), &rate).unwrap(), 0);
        assert_eq!(yen_amount(&BigDecimal::from_str("1.5").unwrap(), &rate).unwrap(), 2);
        assert_eq!(yen_amount(&BigDecimal::from_str("2.5").unwrap(), &rate).unwrap(), 2);
        assert_eq!(yen_amount(&BigDecimal::from_str("2.51").unwrap(), &rate).unwrap(), 3);
    }

    #[test]
    fn test_movement_rejects_non_positive_amount() {
        let result = Movement::new(
            at("2024-01-01"),
            "Acme".to_string(),
            Direction::Debit,
            BigDecimal::from(0),
            BigDecimal::from(140),
        );
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidAmount);
    }

    #[test]
    fn test_rate_entry_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(RateEntry::new(date, BigDecimal::from(140)).validate().is_ok());
        assert!(RateEntry::new(date, BigDecimal::from(0)).validate().is_err());
        assert!(RateEntry::new(date, BigDecimal::from(-1)).validate().is_err());
    }

    #[test]
    fn test_row_context_preserves_kind() {
        let err = ConversionError::AmbiguousTransaction {
            credit: "10".to_string(),
            debit: "5".to_string(),
        }
        .at_row(4);

        assert_eq!(err.row(), Some(4));
        assert_eq!(err.kind(), ErrorKind::AmbiguousTransaction);
        assert!(err.to_string().starts_with("Error in row 4: Ambiguous transaction"));
    }
}
