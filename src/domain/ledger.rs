use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, Transaction, TransactionType};

/// The balance-affecting operations a customer can start.
///
/// Each kind decides which transaction type it records and how it moves the
/// balance; everything else (locking, persistence, notification) is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    LoanRequest,
}

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Deposit => TransactionType::Deposit,
            TransactionKind::Withdrawal => TransactionType::Withdrawal,
            TransactionKind::LoanRequest => TransactionType::Loan,
        }
    }

    /// Signed change applied to the balance for `amount_cents`.
    /// A loan request leaves the balance alone until it is paid back.
    pub fn balance_delta(&self, amount_cents: Cents) -> Cents {
        match self {
            TransactionKind::Deposit => amount_cents,
            TransactionKind::Withdrawal => -amount_cents,
            TransactionKind::LoanRequest => 0,
        }
    }

    /// Compute the balance after applying this kind to `balance`.
    pub fn apply(
        &self,
        balance: Cents,
        amount_cents: Cents,
        allow_overdraft: bool,
    ) -> Result<Cents, LedgerError> {
        validate_amount(amount_cents)?;

        let new_balance = balance
            .checked_add(self.balance_delta(amount_cents))
            .ok_or(LedgerError::Overflow)?;

        if *self == TransactionKind::Withdrawal && !allow_overdraft && new_balance < 0 {
            return Err(LedgerError::InsufficientFunds {
                balance,
                required: amount_cents,
            });
        }

        Ok(new_balance)
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::LoanRequest => "loan request",
        };
        write!(f, "{}", s)
    }
}

pub fn validate_amount(amount_cents: Cents) -> Result<(), LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::NonPositiveAmount(amount_cents));
    }
    Ok(())
}

/// Net movement of a set of transactions as seen by their account.
/// Loan requests do not move money; a paid loan is money going out.
pub fn net_movement(transactions: &[Transaction]) -> Cents {
    transactions.iter().fold(0, |net, tx| match tx.transaction_type {
        TransactionType::Deposit => net + tx.amount_cents,
        TransactionType::Withdrawal | TransactionType::LoanPaid => net - tx.amount_cents,
        TransactionType::Loan => net,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Amount must be positive, got {0} cents")]
    NonPositiveAmount(Cents),

    #[error("Insufficient funds: balance {balance} cents, required {required} cents")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Balance would overflow")]
    Overflow,
}
