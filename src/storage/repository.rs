use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::domain::{Account, AccountId, Cents, Transaction, TransactionId, TransactionType};

use super::MIGRATION_001_INITIAL;

const TRANSACTION_COLUMNS: &str =
    "id, sequence, account_id, amount_cents, transaction_type, timestamp, loan_approve, balance_after_cents";

/// Timestamps are stored as fixed-width UTC RFC 3339 strings so that
/// lexicographic order in SQL matches chronological order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

/// Repository for persisting and querying accounts and transactions.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Begin a unit of work that holds SQLite's write lock.
    ///
    /// The first statement is a write, so the lock is taken before any
    /// balance or loan-count read inside the unit; concurrent writers wait on
    /// the busy timeout instead of failing on a lock upgrade.
    pub async fn begin_write(&self) -> Result<LedgerTx> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("UPDATE sequence_counter SET value = value WHERE name = 'transaction_sequence'")
            .execute(&mut *tx)
            .await
            .context("Failed to acquire write lock")?;

        Ok(LedgerTx { tx })
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account to the database.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner, balance_cents, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.owner)
        .bind(account.balance_cents)
        .bind(encode_timestamp(account.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, owner, balance_cents, created_at FROM accounts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    /// List all accounts, oldest first.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT id, owner, balance_cents, created_at FROM accounts ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    // ========================
    // Transaction queries
    // ========================

    /// Get a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// List an account's transactions, optionally restricted to
    /// `[from, to)`, ordered by timestamp then sequence.
    pub async fn list_transactions_for_account(
        &self,
        account_id: AccountId,
        between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Transaction>> {
        let mut query = format!(
            "SELECT {} FROM transactions WHERE account_id = ?",
            TRANSACTION_COLUMNS
        );
        if between.is_some() {
            query.push_str(" AND timestamp >= ? AND timestamp < ?");
        }
        query.push_str(" ORDER BY timestamp, sequence");

        let mut sql_query = sqlx::query(&query).bind(account_id.to_string());
        if let Some((from, to)) = between {
            sql_query = sql_query
                .bind(encode_timestamp(from))
                .bind(encode_timestamp(to));
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions for account")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List an account's transactions of one type, ordered by timestamp then sequence.
    pub async fn list_transactions_by_type(
        &self,
        account_id: AccountId,
        transaction_type: TransactionType,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE account_id = ? AND transaction_type = ? ORDER BY timestamp, sequence",
            TRANSACTION_COLUMNS
        ))
        .bind(account_id.to_string())
        .bind(transaction_type.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions by type")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Sum amounts of every account's transactions in `[from, to)`.
    /// `None` when SQLite reports the sum overflowing a 64-bit integer.
    pub async fn sum_amounts_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Cents>> {
        let result = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) as total
            FROM transactions
            WHERE timestamp >= ? AND timestamp < ?
            "#,
        )
        .bind(encode_timestamp(from))
        .bind(encode_timestamp(to))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(Some(row.get("total"))),
            Err(sqlx::Error::Database(err)) if err.message().contains("integer overflow") => {
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to sum transaction amounts"),
        }
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            owner: row.get("owner"),
            balance_cents: row.get("balance_cents"),
            created_at: decode_timestamp(&created_at_str)?,
        })
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let account_id_str: String = row.get("account_id");
        let type_str: String = row.get("transaction_type");
        let timestamp_str: String = row.get("timestamp");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            sequence: row.get("sequence"),
            account_id: Uuid::parse_str(&account_id_str).context("Invalid account ID")?,
            amount_cents: row.get("amount_cents"),
            transaction_type: TransactionType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", type_str))?,
            timestamp: decode_timestamp(&timestamp_str)?,
            loan_approve: row.get::<i32, _>("loan_approve") != 0,
            balance_after_cents: row.get("balance_after_cents"),
        })
    }
}

/// A write unit of work. Dropping it without `commit` rolls everything back.
pub struct LedgerTx {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl LedgerTx {
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.context("Failed to commit transaction")
    }

    pub async fn get_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            "SELECT id, owner, balance_cents, created_at FROM accounts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(Repository::row_to_account).transpose()
    }

    pub async fn set_balance(&mut self, id: AccountId, balance_cents: Cents) -> Result<()> {
        sqlx::query("UPDATE accounts SET balance_cents = ? WHERE id = ?")
            .bind(balance_cents)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .context("Failed to update balance")?;
        Ok(())
    }

    pub async fn get_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Repository::row_to_transaction).transpose()
    }

    /// Approved loans of an account that have not been paid back.
    pub async fn count_outstanding_loans(&mut self, account_id: AccountId) -> Result<usize> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM transactions
            WHERE account_id = ? AND transaction_type = 'loan' AND loan_approve = 1
            "#,
        )
        .bind(account_id.to_string())
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to count approved loans")?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    /// Save a new transaction, assigning the next sequence number.
    pub async fn save_transaction(&mut self, transaction: &mut Transaction) -> Result<()> {
        transaction.sequence = self.next_sequence().await?;

        sqlx::query(&format!(
            "INSERT INTO transactions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction.id.to_string())
        .bind(transaction.sequence)
        .bind(transaction.account_id.to_string())
        .bind(transaction.amount_cents)
        .bind(transaction.transaction_type.as_str())
        .bind(encode_timestamp(transaction.timestamp))
        .bind(transaction.loan_approve)
        .bind(transaction.balance_after_cents)
        .execute(&mut *self.tx)
        .await
        .context("Failed to save transaction")?;

        Ok(())
    }

    /// Move a loan to `loan_paid` and refresh its balance snapshot.
    pub async fn mark_loan_paid(
        &mut self,
        id: TransactionId,
        balance_after_cents: Cents,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET transaction_type = 'loan_paid', balance_after_cents = ?
            WHERE id = ? AND transaction_type = 'loan'
            "#,
        )
        .bind(balance_after_cents)
        .bind(id.to_string())
        .execute(&mut *self.tx)
        .await
        .context("Failed to mark loan as paid")?;
        Ok(())
    }

    pub async fn approve_loan(&mut self, id: TransactionId) -> Result<()> {
        sqlx::query(
            "UPDATE transactions SET loan_approve = 1 WHERE id = ? AND transaction_type = 'loan'",
        )
        .bind(id.to_string())
        .execute(&mut *self.tx)
        .await
        .context("Failed to approve loan")?;
        Ok(())
    }

    async fn next_sequence(&mut self) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'transaction_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }
}
