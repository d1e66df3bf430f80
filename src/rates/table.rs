//! Historical TTM rate table with nearest-date fallback

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;

use crate::types::*;

/// How a rate lookup was answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMatch {
    /// The requested date is in the table
    Exact,
    /// Closest earlier date was used
    PastFallback,
    /// The query predates all data; closest later date was used
    FutureFallback,
}

/// Result of a rate lookup, including which stored date answered it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub requested: NaiveDate,
    pub source_date: NaiveDate,
    pub rate: BigDecimal,
    pub match_kind: RateMatch,
}

/// Date-keyed table of TTM rates
///
/// Dates are unique; inserting an existing date replaces its rate. Every
/// stored rate is positive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<NaiveDate, BigDecimal>,
}

impl RateTable {
    /// Create an empty rate table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from entries, rejecting any non-positive rate
    pub fn from_entries<I>(entries: I) -> ConversionResult<Self>
    where
        I: IntoIterator<Item = RateEntry>,
    {
        let mut table = Self::new();
        table.extend(entries)?;
        Ok(table)
    }

    /// Replace or insert a single rate
    pub fn upsert(&mut self, entry: RateEntry) -> ConversionResult<()> {
        entry.validate()?;
        self.rates.insert(entry.date, entry.rate);
        Ok(())
    }

    /// Replace or insert many rates at once
    ///
    /// All entries are validated before any is applied, so a bad entry leaves
    /// the table untouched. Returns the number of entries written.
    pub fn extend<I>(&mut self, entries: I) -> ConversionResult<usize>
    where
        I: IntoIterator<Item = RateEntry>,
    {
        let entries: Vec<RateEntry> = entries.into_iter().collect();
        for entry in &entries {
            entry.validate()?;
        }

        let count = entries.len();
        for entry in entries {
            self.rates.insert(entry.date, entry.rate);
        }
        Ok(count)
    }

    /// Rate stored for exactly this date
    pub fn get(&self, date: NaiveDate) -> Option<&BigDecimal> {
        self.rates.get(&date)
    }

    /// Look up the rate for a date, falling back to the nearest past date,
    /// then to the nearest future date
    pub fn resolve(&self, date: NaiveDate) -> ConversionResult<ResolvedRate> {
        if let Some(rate) = self.rates.get(&date) {
            debug!("Found exact TTM rate {} for {}", rate, date);
            return Ok(ResolvedRate {
                requested: date,
                source_date: date,
                rate: rate.clone(),
                match_kind: RateMatch::Exact,
            });
        }

        if let Some((found, rate)) = self.rates.range(..date).next_back() {
            info!("Using fallback TTM rate {} from {} for {}", rate, found, date);
            return Ok(ResolvedRate {
                requested: date,
                source_date: *found,
                rate: rate.clone(),
                match_kind: RateMatch::PastFallback,
            });
        }

        if let Some((found, rate)) = self.rates.range(date..).next() {
            info!("Using fallback TTM rate {} from {} for {}", rate, found, date);
            return Ok(ResolvedRate {
                requested: date,
                source_date: *found,
                rate: rate.clone(),
                match_kind: RateMatch::FutureFallback,
            });
        }

        Err(ConversionError::NoRateAvailable(date))
    }

    /// Rate for a date with fallback; fails only when the table is empty
    pub fn get_rate(&self, date: NaiveDate) -> ConversionResult<BigDecimal> {
        self.resolve(date).map(|resolved| resolved.rate)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Earliest stored entry
    pub fn first(&self) -> Option<RateEntry> {
        self.rates
            .iter()
            .next()
            .map(|(date, rate)| RateEntry::new(*date, rate.clone()))
    }

    /// Latest stored entry
    pub fn last(&self) -> Option<RateEntry> {
        self.rates
            .iter()
            .next_back()
            .map(|(date, rate)| RateEntry::new(*date, rate.clone()))
    }

    /// Entries in ascending date order
    pub fn entries(&self) -> impl Iterator<Item = RateEntry> + '_ {
        self.rates
            .iter()
            .map(|(date, rate)| RateEntry::new(*date, rate.clone()))
    }
}
