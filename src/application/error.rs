use thiserror::Error;

use crate::domain::{Cents, LedgerError, LoanError, TransactionType};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("You have crossed your limits: {approved} approved loans (limit {limit})")]
    LoanLimitExceeded { limit: usize, approved: usize },

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Transaction {id} is a {transaction_type}, not a loan")]
    NotALoan {
        id: String,
        transaction_type: TransactionType,
    },

    #[error("Loan has already been paid: {0}")]
    LoanAlreadyPaid(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveAmount(_) => AppError::InvalidAmount(err.to_string()),
            LedgerError::Overflow => AppError::InvalidAmount(err.to_string()),
            LedgerError::InsufficientFunds { balance, required } => {
                AppError::InsufficientFunds { balance, required }
            }
        }
    }
}

impl AppError {
    /// Map a loan rule failure for the loan `id`.
    pub(crate) fn from_loan(id: impl ToString, err: LoanError) -> Self {
        match err {
            LoanError::LimitExceeded { limit, approved } => {
                AppError::LoanLimitExceeded { limit, approved }
            }
            LoanError::InsufficientFunds { balance, required } => {
                AppError::InsufficientFunds { balance, required }
            }
            LoanError::NotALoan(transaction_type) => AppError::NotALoan {
                id: id.to_string(),
                transaction_type,
            },
            LoanError::AlreadyPaid => AppError::LoanAlreadyPaid(id.to_string()),
        }
    }
}
