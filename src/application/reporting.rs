use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, Cents, DateRange, SummaryScope, Transaction, net_movement};

/// Result of a transaction report request.
///
/// Built fresh for every request; nothing in it is shared between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReport {
    pub account: Account,
    pub generated_at: DateTime<Utc>,
    /// `None` when the full history was requested
    pub range: Option<DateRange>,
    /// Distinct transactions ordered by timestamp, then sequence
    pub transactions: Vec<Transaction>,
    /// Current balance without a range; sum of amounts over the range otherwise
    pub balance_summary: Cents,
    /// Scope the summary was computed over; `None` when it is the balance
    pub summary_scope: Option<SummaryScope>,
}

impl TransactionReport {
    /// Net effect on the account of the listed transactions.
    pub fn net_movement(&self) -> Cents {
        net_movement(&self.transactions)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
