use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type AccountId = Uuid;

/// A customer account holding a running balance.
///
/// The balance is stored, not derived: every balance-affecting operation
/// rewrites it inside the same unit of work that appends the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Identity of the owner; also where notifications are addressed.
    pub owner: String,
    pub balance_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(owner: impl Into<String>, balance_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            balance_cents,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn is_overdrawn(&self) -> bool {
        self.balance_cents < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new("alice", 50000);
        assert_eq!(account.owner, "alice");
        assert_eq!(account.balance_cents, 50000);
        assert!(!account.is_overdrawn());
    }

    #[test]
    fn test_overdrawn() {
        let account = Account::new("bob", -1);
        assert!(account.is_overdrawn());
    }
}
