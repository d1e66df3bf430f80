//! CSV export of processed results

use csv::{Writer, WriterBuilder};
use std::io::Write;

use crate::types::*;

const TRANSACTION_HEADERS: [&str; 5] = ["Date", "Month", "USD Amount", "TTM Rate", "JPY Amount"];
const MONTHLY_HEADERS: [&str; 5] = [
    "Month",
    "Total USD",
    "Total JPY",
    "Transaction Count",
    "Exchange Profit",
];
const SUMMARY_HEADERS: [&str; 5] = [
    "Total Transactions",
    "Net USD",
    "Net JPY",
    "Average TTM Rate",
    "Exchange Profit",
];

/// Write one line per transaction: Date, Month, USD Amount, TTM Rate, JPY Amount
pub fn write_transactions_csv<W: Write>(writer: W, result: &ProcessResult) -> ConversionResult<()> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    transaction_rows(&mut wrt, result)?;
    wrt.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write one line per month: Month, Total USD, Total JPY, Transaction Count, Exchange Profit
pub fn write_monthly_csv<W: Write>(writer: W, result: &ProcessResult) -> ConversionResult<()> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    monthly_rows(&mut wrt, result)?;
    wrt.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the overall summary as a header line and a single data line
pub fn write_summary_csv<W: Write>(writer: W, result: &ProcessResult) -> ConversionResult<()> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    summary_rows(&mut wrt, result)?;
    wrt.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the full download: transactions, then a "Monthly Summary" and an
/// "Overall Summary" section, separated by blank lines
pub fn write_export_csv<W: Write>(writer: W, result: &ProcessResult) -> ConversionResult<()> {
    let mut wrt = WriterBuilder::new().flexible(true).from_writer(writer);

    transaction_rows(&mut wrt, result)?;

    section(&mut wrt, "Monthly Summary")?;
    monthly_rows(&mut wrt, result)?;

    section(&mut wrt, "Overall Summary")?;
    summary_rows(&mut wrt, result)?;

    wrt.flush().map_err(csv::Error::from)?;
    Ok(())
}

// An empty csv record is written as `""`, so the separator goes straight to the sink.
fn section<W: Write>(wrt: &mut Writer<W>, title: &str) -> ConversionResult<()> {
    wrt.flush().map_err(csv::Error::from)?;
    wrt.get_mut().write_all(b"\n").map_err(csv::Error::from)?;
    wrt.write_record([title])?;
    Ok(())
}

fn transaction_rows<W: Write>(wrt: &mut Writer<W>, result: &ProcessResult) -> ConversionResult<()> {
    wrt.write_record(TRANSACTION_HEADERS)?;
    for transaction in &result.transactions {
        wrt.write_record([
            transaction.date.format("%Y-%m-%d").to_string(),
            transaction.month(),
            transaction.amount_usd.to_string(),
            transaction.resolved_rate.to_string(),
            transaction.amount_jpy.to_string(),
        ])?;
    }
    Ok(())
}

fn monthly_rows<W: Write>(wrt: &mut Writer<W>, result: &ProcessResult) -> ConversionResult<()> {
    wrt.write_record(MONTHLY_HEADERS)?;
    for bucket in &result.monthly {
        wrt.write_record([
            bucket.month.clone(),
            bucket.total_usd.to_string(),
            bucket.total_jpy.to_string(),
            bucket.transaction_count.to_string(),
            bucket.total_exchange_profit.to_string(),
        ])?;
    }
    Ok(())
}

fn summary_rows<W: Write>(wrt: &mut Writer<W>, result: &ProcessResult) -> ConversionResult<()> {
    let summary = &result.summary;
    wrt.write_record(SUMMARY_HEADERS)?;
    wrt.write_record([
        summary.total_transactions.to_string(),
        summary.net_usd.to_string(),
        summary.net_jpy.to_string(),
        summary.average_ttm_rate.to_string(),
        summary.total_exchange_profit.to_string(),
    ])?;
    Ok(())
}
