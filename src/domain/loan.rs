//! Loan lifecycle rules: `Loan` (requested) → approved → `LoanPaid`.
//!
//! Approval happens outside the customer flow; these functions only decide
//! what a request or a payoff is allowed to do given the current state.

use thiserror::Error;

use super::{Cents, Transaction, TransactionType};

/// Default number of approved, unpaid loans an account may hold.
pub const DEFAULT_LOAN_LIMIT: usize = 3;

/// Count the loans that hold a slot against the limit.
pub fn count_outstanding_loans(transactions: &[Transaction]) -> usize {
    transactions.iter().filter(|t| t.is_outstanding_loan()).count()
}

/// A new request is refused once `approved` reaches `limit`.
pub fn check_loan_limit(approved: usize, limit: usize) -> Result<(), LoanError> {
    if approved >= limit {
        return Err(LoanError::LimitExceeded { limit, approved });
    }
    Ok(())
}

/// What paying back a loan does to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Debit the loan amount, leaving `new_balance`.
    Paid { new_balance: Cents },
    /// The loan has not been approved yet; nothing changes.
    NotApproved,
}

/// Decide the payoff of `loan` against the current account balance.
///
/// The loan amount must be strictly less than the balance; paying a loan
/// that would empty the account exactly is refused.
pub fn settle_loan(loan: &Transaction, balance: Cents) -> Result<Settlement, LoanError> {
    match loan.transaction_type {
        TransactionType::Loan => {}
        TransactionType::LoanPaid => return Err(LoanError::AlreadyPaid),
        _ => return Err(LoanError::NotALoan(loan.transaction_type)),
    }

    if !loan.loan_approve {
        return Ok(Settlement::NotApproved);
    }

    if loan.amount_cents < balance {
        Ok(Settlement::Paid {
            new_balance: balance - loan.amount_cents,
        })
    } else {
        Err(LoanError::InsufficientFunds {
            balance,
            required: loan.amount_cents,
        })
    }
}

/// Check that `loan` can be approved. Returns false when it already is.
pub fn check_approvable(loan: &Transaction) -> Result<bool, LoanError> {
    match loan.transaction_type {
        TransactionType::Loan => Ok(!loan.loan_approve),
        TransactionType::LoanPaid => Err(LoanError::AlreadyPaid),
        other => Err(LoanError::NotALoan(other)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    #[error("Loan limit reached: {approved} approved loans (limit {limit})")]
    LimitExceeded { limit: usize, approved: usize },

    #[error("Loan amount {required} cents is not below the available balance {balance} cents")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Transaction is a {0}, not a loan")]
    NotALoan(TransactionType),

    #[error("Loan has already been paid")]
    AlreadyPaid,
}
