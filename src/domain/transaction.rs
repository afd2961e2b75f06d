use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    /// A requested or approved loan that has not been paid back yet
    Loan,
    /// A loan that has been paid back; only reachable from `Loan`
    LoanPaid,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Loan => "loan",
            TransactionType::LoanPaid => "loan_paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(TransactionType::Deposit),
            "withdrawal" => Some(TransactionType::Withdrawal),
            "loan" => Some(TransactionType::Loan),
            "loan_paid" => Some(TransactionType::LoanPaid),
            _ => None,
        }
    }

    pub fn is_loan(&self) -> bool {
        matches!(self, TransactionType::Loan | TransactionType::LoanPaid)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record of a balance-affecting event on one account.
///
/// Only loans change after creation: `loan_approve` is flipped by an
/// administrator and payoff moves the type to `LoanPaid` and refreshes the
/// balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Monotonically increasing sequence number for ordering
    pub sequence: i64,
    pub account_id: AccountId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub transaction_type: TransactionType,
    pub timestamp: DateTime<Utc>,
    pub loan_approve: bool,
    /// Account balance at the moment this transaction was finalized
    pub balance_after_cents: Cents,
}

impl Transaction {
    /// Create a new transaction. Sequence number must be assigned by the repository.
    /// The timestamp is kept to microsecond precision, the resolution it is stored at.
    ///
    /// # Panics
    ///
    /// Panics if `amount_cents` is not positive; callers validate amounts first.
    pub fn new(
        account_id: AccountId,
        transaction_type: TransactionType,
        amount_cents: Cents,
        balance_after_cents: Cents,
        timestamp: DateTime<Utc>,
    ) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            account_id,
            amount_cents,
            transaction_type,
            timestamp: timestamp.trunc_subsecs(6),
            loan_approve: false,
            balance_after_cents,
        }
    }

    /// An approved loan that still counts against the loan limit.
    pub fn is_outstanding_loan(&self) -> bool {
        self.transaction_type == TransactionType::Loan && self.loan_approve
    }
}
