//! Ledger policy configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) gives the
//! stock policy: three approved loans per account, overdraft allowed and
//! date-ranged report sums taken over all accounts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{DEFAULT_LOAN_LIMIT, SummaryScope};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Approved, unpaid loans an account may hold before new requests are refused.
    pub loan_limit: usize,
    /// Whether withdrawals may take the balance below zero.
    pub allow_overdraft: bool,
    /// Which transactions feed a date-ranged report's balance summary.
    pub summary_scope: SummaryScope,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            loan_limit: DEFAULT_LOAN_LIMIT,
            allow_overdraft: true,
            summary_scope: SummaryScope::AllAccounts,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, LedgerConfig::default());
        assert_eq!(cfg.loan_limit, 3);
        assert!(cfg.allow_overdraft);
        assert_eq!(cfg.summary_scope, SummaryScope::AllAccounts);
    }

    #[test]
    fn test_full_config() {
        let cfg = LedgerConfig::from_toml_str(
            r#"
            loan_limit = 5
            allow_overdraft = false
            summary_scope = "account"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.loan_limit, 5);
        assert!(!cfg.allow_overdraft);
        assert_eq!(cfg.summary_scope, SummaryScope::Account);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(LedgerConfig::from_toml_str("loan_limt = 5").is_err());
    }

    #[test]
    fn test_bad_scope_rejected() {
        assert!(LedgerConfig::from_toml_str(r#"summary_scope = "bank""#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.toml");
        fs::write(&path, "loan_limit = 1\n").unwrap();

        let cfg = LedgerConfig::load(&path).unwrap();
        assert_eq!(cfg.loan_limit, 1);
        assert!(cfg.allow_overdraft);

        assert!(LedgerConfig::load(dir.path().join("missing.toml")).is_err());
        assert_eq!(LedgerConfig::load_or_default(None).unwrap(), LedgerConfig::default());
    }
}
