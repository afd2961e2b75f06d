use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument};

use crate::config::LedgerConfig;
use crate::domain::{
    Account, AccountId, Cents, DateRange, Settlement, SummaryScope, Transaction, TransactionId,
    TransactionKind, TransactionType, check_approvable, check_loan_limit, distinct_ordered,
    settle_loan, sum_amounts, validate_amount,
};
use crate::notify::{Notification, Notifier};
use crate::storage::Repository;

use super::{AccountLocks, AppError, TransactionReport};

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, API, tests).
pub struct LedgerService {
    repo: Repository,
    config: LedgerConfig,
    notifier: Notifier,
    locks: AccountLocks,
}

/// Result of a deposit, withdrawal or loan request
#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    pub transaction: Transaction,
    pub new_balance: Cents,
}

/// Result of paying back a loan
#[derive(Debug, Clone)]
pub enum LoanPayment {
    Paid { loan: Transaction, new_balance: Cents },
    /// The loan is still waiting for approval; nothing was changed.
    NotApproved { loan: Transaction },
}

impl LedgerService {
    /// Create a new ledger service with the default policy and a logging notifier.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            config: LedgerConfig::default(),
            notifier: Notifier::default(),
            locks: AccountLocks::new(),
        }
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account operations
    // ========================

    /// Open an account with a starting balance.
    pub async fn open_account(
        &self,
        owner: impl Into<String>,
        initial_balance_cents: Cents,
    ) -> Result<Account, AppError> {
        if initial_balance_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Initial balance must not be negative".to_string(),
            ));
        }

        let account = Account::new(owner, initial_balance_cents);
        self.repo.save_account(&account).await?;
        info!(
            account = %account.id,
            owner = %account.owner,
            balance = initial_balance_cents,
            "account opened"
        );
        Ok(account)
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    // ========================
    // Ledger operations
    // ========================

    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<TransactionReceipt, AppError> {
        self.record(account_id, TransactionKind::Deposit, amount_cents, Utc::now())
            .await
    }

    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<TransactionReceipt, AppError> {
        self.record(account_id, TransactionKind::Withdrawal, amount_cents, Utc::now())
            .await
    }

    /// Ask for a loan. The request is recorded unapproved and leaves the
    /// balance untouched; it is refused once the account holds as many
    /// approved, unpaid loans as the configured limit.
    pub async fn request_loan(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<TransactionReceipt, AppError> {
        self.record(account_id, TransactionKind::LoanRequest, amount_cents, Utc::now())
            .await
    }

    /// Apply one balance-affecting operation and record it.
    ///
    /// The account is locked and the balance read, loan-limit check, balance
    /// write and transaction insert form one database transaction. The
    /// notification goes out only after commit and never affects the result.
    #[instrument(name = "ledger.record", skip(self))]
    pub async fn record(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount_cents: Cents,
        timestamp: DateTime<Utc>,
    ) -> Result<TransactionReceipt, AppError> {
        validate_amount(amount_cents)?;

        let _guard = self.locks.lock(account_id).await;
        let mut tx = self.repo.begin_write().await?;

        let account = tx
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

        if kind == TransactionKind::LoanRequest {
            let approved = tx.count_outstanding_loans(account_id).await?;
            check_loan_limit(approved, self.config.loan_limit)
                .map_err(|e| AppError::from_loan(account_id, e))?;
        }

        let new_balance =
            kind.apply(account.balance_cents, amount_cents, self.config.allow_overdraft)?;
        if new_balance != account.balance_cents {
            tx.set_balance(account_id, new_balance).await?;
        }

        let mut transaction = Transaction::new(
            account_id,
            kind.transaction_type(),
            amount_cents,
            new_balance,
            timestamp,
        );
        tx.save_transaction(&mut transaction).await?;
        tx.commit().await?;

        info!(
            transaction = %transaction.id,
            sequence = transaction.sequence,
            balance = new_balance,
            "{} recorded",
            kind
        );

        self.notifier
            .dispatch(Notification::new(account.owner, amount_cents, kind.into()));

        Ok(TransactionReceipt {
            transaction,
            new_balance,
        })
    }

    // ========================
    // Loan lifecycle
    // ========================

    /// Administrative approval of a requested loan. Approving an already
    /// approved loan changes nothing; approving past the loan limit fails
    /// with `LoanLimitExceeded`, same as a request would.
    #[instrument(name = "ledger.approve_loan", skip(self))]
    pub async fn approve_loan(&self, loan_id: TransactionId) -> Result<Transaction, AppError> {
        let account_id = self.get_transaction(loan_id).await?.account_id;

        let _guard = self.locks.lock(account_id).await;
        let mut tx = self.repo.begin_write().await?;

        let mut loan = tx
            .get_transaction(loan_id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(loan_id.to_string()))?;

        if !check_approvable(&loan).map_err(|e| AppError::from_loan(loan_id, e))? {
            debug!("loan already approved");
            return Ok(loan);
        }

        let approved = tx.count_outstanding_loans(account_id).await?;
        check_loan_limit(approved, self.config.loan_limit)
            .map_err(|e| AppError::from_loan(loan_id, e))?;

        tx.approve_loan(loan_id).await?;
        tx.commit().await?;
        loan.loan_approve = true;

        info!(account = %account_id, amount = loan.amount_cents, "loan approved");
        Ok(loan)
    }

    /// Pay back an approved loan out of the account balance.
    ///
    /// The loan amount must be strictly below the balance. An unapproved
    /// loan is left alone and reported as `LoanPayment::NotApproved`.
    #[instrument(name = "ledger.pay_loan", skip(self))]
    pub async fn pay_loan(&self, loan_id: TransactionId) -> Result<LoanPayment, AppError> {
        let account_id = self.get_transaction(loan_id).await?.account_id;

        let _guard = self.locks.lock(account_id).await;
        let mut tx = self.repo.begin_write().await?;

        // Re-read under the lock: approval or payoff may have happened meanwhile
        let mut loan = tx
            .get_transaction(loan_id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(loan_id.to_string()))?;
        let account = tx
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

        let settlement = settle_loan(&loan, account.balance_cents)
            .map_err(|e| AppError::from_loan(loan_id, e))?;

        match settlement {
            Settlement::NotApproved => {
                debug!("loan not approved yet, nothing to pay");
                Ok(LoanPayment::NotApproved { loan })
            }
            Settlement::Paid { new_balance } => {
                tx.set_balance(account_id, new_balance).await?;
                tx.mark_loan_paid(loan_id, new_balance).await?;
                tx.commit().await?;

                loan.transaction_type = TransactionType::LoanPaid;
                loan.balance_after_cents = new_balance;

                info!(
                    account = %account_id,
                    amount = loan.amount_cents,
                    balance = new_balance,
                    "loan paid"
                );
                Ok(LoanPayment::Paid { loan, new_balance })
            }
        }
    }

    /// Loans of an account that have not been paid back, approved or not.
    pub async fn get_loans(&self, account_id: AccountId) -> Result<Vec<Transaction>, AppError> {
        self.get_account(account_id).await?;
        Ok(self
            .repo
            .list_transactions_by_type(account_id, TransactionType::Loan)
            .await?)
    }

    // ========================
    // Queries and reports
    // ========================

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))
    }

    /// Full history of an account, oldest first.
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, AppError> {
        self.get_account(account_id).await?;
        Ok(self
            .repo
            .list_transactions_for_account(account_id, None)
            .await?)
    }

    /// Build a transaction report for an account.
    ///
    /// Only when both dates are given is the history restricted to
    /// `[start, end]` (inclusive, UTC days) and the summary computed as a sum
    /// of amounts in that range, over the configured `SummaryScope`.
    /// Otherwise the report holds the full history and the current balance.
    pub async fn get_report(
        &self,
        account_id: AccountId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<TransactionReport, AppError> {
        let account = self.get_account(account_id).await?;
        let range = DateRange::from_bounds(start, end);

        let (transactions, balance_summary, summary_scope) = match range {
            None => {
                let transactions = self
                    .repo
                    .list_transactions_for_account(account_id, None)
                    .await?;
                (transactions, account.balance_cents, None)
            }
            Some(range) if range.is_empty() => {
                (Vec::new(), 0, Some(self.config.summary_scope))
            }
            Some(range) => {
                let (from, to) = range.instant_bounds();
                let transactions = self
                    .repo
                    .list_transactions_for_account(account_id, Some((from, to)))
                    .await?;
                debug_assert!(transactions.iter().all(|t| range.contains(t.timestamp)));
                let summary = match self.config.summary_scope {
                    SummaryScope::AllAccounts => self.repo.sum_amounts_between(from, to).await?,
                    SummaryScope::Account => sum_amounts(&transactions),
                }
                .ok_or_else(|| AppError::InvalidAmount("report summary overflows".to_string()))?;
                (transactions, summary, Some(self.config.summary_scope))
            }
        };

        Ok(TransactionReport {
            account,
            generated_at: Utc::now(),
            range,
            transactions: distinct_ordered(transactions),
            balance_summary,
            summary_scope,
        })
    }
}
