//! Monthly and overall aggregation of reconciled movements

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;

use crate::types::*;

/// Accumulates movements into monthly buckets and batch totals
#[derive(Debug)]
pub struct Aggregator {
    buckets: BTreeMap<String, MonthlyBucket>,
    credit_count: usize,
    debit_count: usize,
    credit_usd: BigDecimal,
    credit_jpy: i64,
    debit_usd: BigDecimal,
    debit_jpy: i64,
    rate_sum: BigDecimal,
    exchange_profit: BigDecimal,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            credit_count: 0,
            debit_count: 0,
            credit_usd: BigDecimal::from(0),
            credit_jpy: 0,
            debit_usd: BigDecimal::from(0),
            debit_jpy: 0,
            rate_sum: BigDecimal::from(0),
            exchange_profit: BigDecimal::from(0),
        }
    }

    /// Add one movement to its month and to the batch totals
    ///
    /// Fails with an arithmetic error if a yen total leaves the `i64` range;
    /// the aggregator is left unchanged in that case.
    pub fn add(&mut self, movement: &Movement) -> ConversionResult<()> {
        let month = movement.month();
        let (bucket_jpy, vendor_jpy) = match self.buckets.get(&month) {
            Some(bucket) => (
                bucket.total_jpy,
                bucket
                    .vendor_transactions
                    .get(&movement.vendor)
                    .map_or(0, |v| v.jpy),
            ),
            None => (0, 0),
        };
        let bucket_jpy = add_yen(bucket_jpy, movement.amount_jpy)?;
        let vendor_jpy = add_yen(vendor_jpy, movement.amount_jpy)?;
        let (credit_jpy, debit_jpy) = match movement.direction {
            Direction::Credit => (add_yen(self.credit_jpy, movement.amount_jpy)?, self.debit_jpy),
            Direction::Debit => (self.credit_jpy, add_yen(self.debit_jpy, movement.amount_jpy)?),
        };

        let bucket = self
            .buckets
            .entry(month.clone())
            .or_insert_with(|| MonthlyBucket::new(month));

        bucket.total_usd += &movement.amount_usd;
        bucket.total_jpy = bucket_jpy;
        bucket.transaction_count += 1;

        let vendor = bucket
            .vendor_transactions
            .entry(movement.vendor.clone())
            .or_default();
        vendor.usd += &movement.amount_usd;
        vendor.jpy = vendor_jpy;
        vendor.count += 1;

        if let Some(profit) = &movement.exchange_profit {
            bucket.total_exchange_profit += &profit.profit_jpy;
            vendor.exchange_profit += &profit.profit_jpy;
            self.exchange_profit += &profit.profit_jpy;
        }

        match movement.direction {
            Direction::Credit => {
                self.credit_count += 1;
                self.credit_usd += &movement.amount_usd;
            }
            Direction::Debit => {
                self.debit_count += 1;
                self.debit_usd += &movement.amount_usd;
            }
        }
        self.credit_jpy = credit_jpy;
        self.debit_jpy = debit_jpy;
        self.rate_sum += &movement.resolved_rate;
        Ok(())
    }

    /// Current overall summary
    pub fn summary(&self) -> Summary {
        let total_transactions = self.credit_count + self.debit_count;
        let average_ttm_rate = if total_transactions == 0 {
            BigDecimal::from(0)
        } else {
            &self.rate_sum / BigDecimal::from(total_transactions as u64)
        };

        Summary {
            total_transactions,
            credit_transactions: self.credit_count,
            debit_transactions: self.debit_count,
            total_credit_usd: self.credit_usd.clone(),
            total_credit_jpy: self.credit_jpy,
            total_debit_usd: self.debit_usd.clone(),
            total_debit_jpy: self.debit_jpy,
            net_usd: &self.credit_usd - &self.debit_usd,
            net_jpy: self.credit_jpy - self.debit_jpy,
            average_ttm_rate,
            total_exchange_profit: self.exchange_profit.clone(),
        }
    }

    /// Consume the aggregator, returning buckets in month order and the summary
    pub fn finish(self) -> (Vec<MonthlyBucket>, Summary) {
        let summary = self.summary();
        (self.buckets.into_values().collect(), summary)
    }
}

fn add_yen(total: i64, amount: i64) -> ConversionResult<i64> {
    total.checked_add(amount).ok_or_else(|| {
        ConversionError::Arithmetic(format!("JPY total {} + {} does not fit in i64", total, amount))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn movement(date: &str, vendor: &str, direction: Direction, usd: &str, rate: &str) -> Movement {
        Movement::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            vendor.to_string(),
            direction,
            BigDecimal::from_str(usd).unwrap(),
            BigDecimal::from_str(rate).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_batch_has_zero_average() {
        let (monthly, summary) = Aggregator::new().finish();

        assert!(monthly.is_empty());
        assert_eq!(summary.total_transactions, 0);
        assert_eq!(summary.average_ttm_rate, BigDecimal::from(0));
        assert_eq!(summary.total_exchange_profit, BigDecimal::from(0));
    }

    #[test]
    fn test_buckets_split_by_month_and_vendor() {
        let mut aggregator = Aggregator::new();
        aggregator.add(&movement("2024-02-03", "Acme", Direction::Credit, "10", "150")).unwrap();
        aggregator.add(&movement("2024-01-31", "Acme", Direction::Credit, "20", "148")).unwrap();
        aggregator.add(&movement("2024-01-15", "Globex", Direction::Debit, "5", "147")).unwrap();
        aggregator.add(&movement("2024-01-20", "Acme", Direction::Credit, "1.5", "148")).unwrap();

        let (monthly, summary) = aggregator.finish();

        assert_eq!(
            monthly.iter().map(|b| b.month.as_str()).collect::<Vec<_>>(),
            vec!["2024-01", "2024-02"]
        );
        let january = &monthly[0];
        assert_eq!(january.transaction_count, 3);
        assert_eq!(january.total_usd, BigDecimal::from_str("26.5").unwrap());
        assert_eq!(january.total_jpy, 2960 + 735 + 222);
        assert_eq!(january.vendor_transactions["Acme"].count, 2);
        assert_eq!(january.vendor_transactions["Globex"].jpy, 735);

        assert_eq!(summary.credit_transactions, 3);
        assert_eq!(summary.debit_transactions, 1);
        assert_eq!(summary.net_usd, BigDecimal::from_str("26.5").unwrap());
        assert_eq!(summary.net_jpy, 1500 + 2960 + 222 - 735);
        assert_eq!(summary.average_ttm_rate, BigDecimal::from_str("148.25").unwrap());
    }

    #[test]
    fn test_monthly_totals_match_transaction_totals() {
        let movements = vec![
            movement("2024-03-01", "A", Direction::Credit, "12.34", "149.87"),
            movement("2024-03-09", "B", Direction::Debit, "7.01", "150.02"),
            movement("2024-04-02", "A", Direction::Credit, "999.99", "151.33"),
            movement("2024-05-30", "C", Direction::Debit, "0.01", "152.5"),
        ];
        let mut aggregator = Aggregator::new();
        for m in &movements {
            aggregator.add(m).unwrap();
        }
        let (monthly, _) = aggregator.finish();

        let bucket_usd: BigDecimal = monthly.iter().map(|b| &b.total_usd).sum();
        let bucket_jpy: i64 = monthly.iter().map(|b| b.total_jpy).sum();
        let txn_usd: BigDecimal = movements.iter().map(|m| &m.amount_usd).sum();
        let txn_jpy: i64 = movements.iter().map(|m| m.amount_jpy).sum();

        assert_eq!(bucket_usd, txn_usd);
        assert_eq!(bucket_jpy, txn_jpy);
    }

    #[test]
    fn test_exchange_profit_rolls_up() {
        let mut settled = movement("2024-01-01", "Acme", Direction::Credit, "100", "140");
        settled.exchange_profit = Some(ExchangeProfit {
            next_debit_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            next_debit_time: chrono::NaiveTime::MIN,
            next_debit_rate: BigDecimal::from(138),
            profit_jpy: BigDecimal::from(-200),
        });

        let mut aggregator = Aggregator::new();
        aggregator.add(&settled).unwrap();
        aggregator.add(&movement("2024-01-05", "Acme", Direction::Credit, "1", "141")).unwrap();
        let (monthly, summary) = aggregator.finish();

        assert_eq!(monthly[0].total_exchange_profit, BigDecimal::from(-200));
        assert_eq!(
            monthly[0].vendor_transactions["Acme"].exchange_profit,
            BigDecimal::from(-200)
        );
        assert_eq!(summary.total_exchange_profit, BigDecimal::from(-200));
    }

    #[test]
    fn test_yen_total_overflow_is_an_arithmetic_error() {
        let mut aggregator = Aggregator::new();
        let large = movement("2024-01-01", "Acme", Direction::Credit, "50000000000000000", "150");
        assert_eq!(large.amount_jpy, 7_500_000_000_000_000_000);

        aggregator.add(&large).unwrap();
        let err = aggregator.add(&large).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArithmeticError);

        // The rejected movement left no partial totals behind
        let (monthly, summary) = aggregator.finish();
        assert_eq!(monthly[0].transaction_count, 1);
        assert_eq!(monthly[0].total_jpy, 7_500_000_000_000_000_000);
        assert_eq!(summary.total_credit_jpy, 7_500_000_000_000_000_000);
    }
}
