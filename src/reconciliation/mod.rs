//! Reconciliation of pending USD credits against withdrawals
//!
//! Credits queue up until the next debit. A debit settles every queued credit
//! at its own rate, whatever its amount, and empties the queue. Credits left
//! in the queue at the end of a batch stay unsettled.

use chrono::NaiveDate;
use log::debug;

use crate::types::*;

/// Sequential state machine pairing pending credits with the next debit
///
/// Movements must be fed in ascending (date, time) order; the engine does not
/// sort them.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    pending: Vec<PendingCredit>,
    since: Option<NaiveDate>,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits waiting for the next debit
    pub fn pending(&self) -> &[PendingCredit] {
        &self.pending
    }

    /// Start of the current accumulation period
    ///
    /// One day before the first movement until a debit is seen, then the date
    /// of the latest debit. Informational only.
    pub fn since(&self) -> Option<NaiveDate> {
        self.since
    }

    /// Apply one movement and append it to `transactions`
    ///
    /// `transactions` must be the same list for every call, since settlement
    /// writes back into the credits previously appended to it.
    fn apply(&mut self, movement: Movement, transactions: &mut Vec<Movement>) {
        if self.since.is_none() {
            self.since = movement.date.pred_opt();
        }

        match movement.direction {
            Direction::Credit => {
                self.pending
                    .push(PendingCredit::from_movement(transactions.len(), &movement));
            }
            Direction::Debit => {
                self.settle(&movement, transactions);
                self.since = Some(movement.date);
            }
        }

        transactions.push(movement);
    }

    /// Run a whole ordered batch through the engine
    pub fn reconcile(&mut self, movements: Vec<Movement>) -> Vec<Movement> {
        let mut transactions = Vec::with_capacity(movements.len());
        for movement in movements {
            self.apply(movement, &mut transactions);
        }

        if !self.pending.is_empty() {
            debug!(
                "{} credits remain unsettled since {:?}",
                self.pending.len(),
                self.since
            );
        }
        transactions
    }

    fn settle(&mut self, debit: &Movement, transactions: &mut [Movement]) {
        if !self.pending.is_empty() {
            debug!(
                "Debit on {} at {} settles {} pending credits since {:?}",
                debit.datetime,
                debit.resolved_rate,
                self.pending.len(),
                self.since
            );
        }

        for entry in self.pending.drain(..) {
            debug_assert!(
                transactions
                    .get(entry.position)
                    .is_some_and(|credit| credit.is_credit()
                        && credit.date == entry.date
                        && credit.time == entry.time),
                "pending credit at {} is missing from the transaction list",
                entry.position
            );
            let profit_jpy = &entry.amount_usd * (&debit.resolved_rate - &entry.resolved_rate);
            if let Some(credit) = transactions.get_mut(entry.position) {
                credit.exchange_profit = Some(ExchangeProfit {
                    next_debit_date: debit.date,
                    next_debit_time: debit.time,
                    next_debit_rate: debit.resolved_rate.clone(),
                    profit_jpy,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn movement(date: &str, direction: Direction, usd: &str, rate: &str) -> Movement {
        Movement::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            "Acme".to_string(),
            direction,
            BigDecimal::from_str(usd).unwrap(),
            BigDecimal::from_str(rate).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_debit_settles_every_pending_credit() {
        let mut engine = ReconciliationEngine::new();
        let transactions = engine.reconcile(vec![
            movement("2024-01-01", Direction::Credit, "100", "140.00"),
            movement("2024-01-02", Direction::Credit, "50", "141.00"),
            movement("2024-01-05", Direction::Debit, "30", "142.00"),
        ]);

        let first = transactions[0].exchange_profit.as_ref().unwrap();
        let second = transactions[1].exchange_profit.as_ref().unwrap();

        assert_eq!(first.profit_jpy, BigDecimal::from(200));
        assert_eq!(second.profit_jpy, BigDecimal::from(50));
        assert_eq!(first.next_debit_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(first.next_debit_rate, BigDecimal::from(142));
        assert!(transactions[2].exchange_profit.is_none());
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn test_queue_is_empty_after_any_debit() {
        let mut engine = ReconciliationEngine::new();
        let mut transactions = Vec::new();

        for _ in 0..5 {
            engine.apply(
                movement("2024-02-01", Direction::Credit, "1000", "150"),
                &mut transactions,
            );
        }
        assert_eq!(engine.pending().len(), 5);

        engine.apply(
            movement("2024-02-02", Direction::Debit, "1", "149"),
            &mut transactions,
        );

        assert!(engine.pending().is_empty());
        assert!(transactions[..5]
            .iter()
            .all(|t| t.exchange_profit.as_ref().unwrap().profit_jpy == BigDecimal::from(-1000)));
    }

    #[test]
    fn test_trailing_credits_stay_unsettled() {
        let mut engine = ReconciliationEngine::new();
        let transactions = engine.reconcile(vec![
            movement("2024-01-01", Direction::Credit, "100", "140"),
            movement("2024-01-02", Direction::Debit, "10", "141"),
            movement("2024-01-03", Direction::Credit, "20", "142"),
        ]);

        assert!(transactions[0].exchange_profit.is_some());
        assert!(transactions[2].exchange_profit.is_none());
        assert_eq!(engine.pending().len(), 1);
        assert_eq!(engine.pending()[0].position, 2);
    }

    #[test]
    fn test_debit_with_empty_queue_settles_nothing() {
        let mut engine = ReconciliationEngine::new();
        let transactions = engine.reconcile(vec![
            movement("2024-01-01", Direction::Debit, "10", "140"),
            movement("2024-01-02", Direction::Debit, "10", "141"),
        ]);

        assert!(transactions.iter().all(|t| t.exchange_profit.is_none()));
    }

    #[test]
    fn test_since_marker() {
        let mut engine = ReconciliationEngine::new();
        let mut transactions = Vec::new();
        assert_eq!(engine.since(), None);

        engine.apply(
            movement("2024-01-10", Direction::Credit, "10", "140"),
            &mut transactions,
        );
        assert_eq!(engine.since(), NaiveDate::from_ymd_opt(2024, 1, 9));

        engine.apply(
            movement("2024-01-12", Direction::Debit, "10", "141"),
            &mut transactions,
        );
        assert_eq!(engine.since(), NaiveDate::from_ymd_opt(2024, 1, 12));
    }
}
