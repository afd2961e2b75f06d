//! Customer notifications for balance-affecting operations.
//!
//! Delivery is somebody else's problem: the ledger hands a `Notification`
//! to a `NotificationSink` on a spawned task after the operation commits and
//! never waits for, or fails because of, the result.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Cents, TransactionKind, format_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Deposit,
    Withdrawal,
    LoanRequest,
}

impl NotificationKind {
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationKind::Deposit => "Deposit Message",
            NotificationKind::Withdrawal => "Withdrawal Message",
            NotificationKind::LoanRequest => "Loan Request Message",
        }
    }
}

impl From<TransactionKind> for NotificationKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Deposit => NotificationKind::Deposit,
            TransactionKind::Withdrawal => NotificationKind::Withdrawal,
            TransactionKind::LoanRequest => NotificationKind::LoanRequest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub amount_cents: Cents,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(recipient: impl Into<String>, amount_cents: Cents, kind: NotificationKind) -> Self {
        Self {
            recipient: recipient.into(),
            amount_cents,
            kind,
        }
    }

    pub fn subject(&self) -> &'static str {
        self.kind.subject()
    }

    pub fn body(&self) -> String {
        let amount = format_cents(self.amount_cents);
        match self.kind {
            NotificationKind::Deposit => {
                format!("{}$ was deposited to your account successfully", amount)
            }
            NotificationKind::Withdrawal => {
                format!("{}$ was withdrawn from your account successfully", amount)
            }
            NotificationKind::LoanRequest => {
                format!("Loan request for amount {}$ has been successfully sent to admin", amount)
            }
        }
    }
}

/// Anything that can deliver a notification (mail, queue, webhook...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Default sink: records the notification as a log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        info!(
            recipient = %notification.recipient,
            subject = notification.subject(),
            "{}",
            notification.body()
        );
        Ok(())
    }
}

/// Fire-and-forget dispatcher in front of a sink.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Hand the notification to the sink on a background task.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, notification: Notification) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.send(&notification).await {
                warn!(
                    recipient = %notification.recipient,
                    kind = ?notification.kind,
                    error = %e,
                    "notification delivery failed"
                );
            }
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
