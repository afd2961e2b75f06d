use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, Transaction};

/// Inclusive range of calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range only exists when both bounds are given; a single bound is
    /// treated as no filter at all.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Some(Self::new(start, end)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        self.start <= day && day <= self.end
    }

    /// Half-open instant bounds `[start 00:00, day after end 00:00)`.
    pub fn instant_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let to = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        (from, to)
    }
}

/// Which transactions feed the balance summary of a date-ranged report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryScope {
    /// Sum amounts of every account's transactions in the range.
    #[default]
    AllAccounts,
    /// Sum only the requesting account's transactions.
    Account,
}

impl SummaryScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryScope::AllAccounts => "all_accounts",
            SummaryScope::Account => "account",
        }
    }
}

/// Drop repeated transactions (by id), keep first occurrences and order by
/// timestamp, then sequence.
pub fn distinct_ordered(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let mut distinct: Vec<Transaction> = transactions
        .into_iter()
        .filter(|t| seen.insert(t.id))
        .collect();
    distinct.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.sequence.cmp(&b.sequence))
    });
    distinct
}

/// Plain sum of amounts regardless of type. `None` when it does not fit in
/// `Cents`, which can happen even while every balance stays in range.
pub fn sum_amounts(transactions: &[Transaction]) -> Option<Cents> {
    transactions
        .iter()
        .try_fold(0, |total: Cents, t| total.checked_add(t.amount_cents))
}
