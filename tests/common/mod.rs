// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bank_ledger::application::LedgerService;
use bank_ledger::config::LedgerConfig;
use bank_ledger::domain::{AccountId, Cents, Transaction};
use bank_ledger::notify::{Notification, NotificationSink, Notifier};
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    test_service_with(LedgerConfig::default()).await
}

/// Helper to create a test service with a custom policy
pub async fn test_service_with(config: LedgerConfig) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap())
        .await?
        .with_config(config);
    Ok((service, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Noon (UTC) of the given day, for backdated transactions
pub fn at_noon(date_str: &str) -> DateTime<Utc> {
    parse_date(date_str).and_hms_opt(12, 0, 0).unwrap().and_utc()
}

/// Request a loan and approve it straight away
pub async fn approved_loan(
    service: &LedgerService,
    account_id: AccountId,
    amount: Cents,
) -> Result<Transaction> {
    let receipt = service.request_loan(account_id, amount).await?;
    Ok(service.approve_loan(receipt.transaction.id).await?)
}

/// Sink that forwards every notification to a channel
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<Notification>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.tx
            .send(notification.clone())
            .map_err(|_| anyhow!("receiver dropped"))
    }
}

pub fn recording_notifier() -> (Notifier, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier::new(Arc::new(RecordingSink { tx })), rx)
}

/// Sink whose deliveries always fail
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn send(&self, _notification: &Notification) -> Result<()> {
        Err(anyhow!("smtp server unreachable"))
    }
}

/// Wait for the next notification, failing the test after a second
pub async fn next_notification(
    rx: &mut mpsc::UnboundedReceiver<Notification>,
) -> Result<Notification> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await?
        .ok_or_else(|| anyhow!("notification channel closed"))
}
