mod common;

use anyhow::Result;
use bank_ledger::application::AppError;
use bank_ledger::config::LedgerConfig;
use bank_ledger::domain::{SummaryScope, TransactionKind, TransactionType};
use common::{at_noon, parse_date, test_service, test_service_with};

#[tokio::test]
async fn test_report_without_range_uses_current_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.open_account("alice", 50000).await?;
    service.deposit(account.id, 20000).await?;
    service.withdraw(account.id, 30000).await?;
    service.request_loan(account.id, 100000).await?;

    let report = service.get_report(account.id, None, None).await?;

    assert_eq!(report.balance_summary, 40000);
    assert!(report.range.is_none());
    assert!(report.summary_scope.is_none());
    assert_eq!(report.transactions.len(), 3);
    assert_eq!(report.account.id, account.id);

    let types: Vec<_> = report
        .transactions
        .iter()
        .map(|t| t.transaction_type)
        .collect();
    assert_eq!(
        types,
        vec![
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::Loan
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_single_bound_is_ignored() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.open_account("alice", 1000).await?;
    service
        .record(account.id, TransactionKind::Deposit, 500, at_noon("2024-01-05"))
        .await?;

    let report = service
        .get_report(account.id, Some(parse_date("2024-02-01")), None)
        .await?;

    assert!(report.range.is_none());
    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.balance_summary, 1500);

    Ok(())
}

#[tokio::test]
async fn test_range_is_inclusive_on_both_days() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.open_account("alice", 0).await?;

    for (day, amount) in [
        ("2024-01-31", 100),
        ("2024-02-01", 200),
        ("2024-02-15", 300),
        ("2024-02-29", 400),
        ("2024-03-01", 500),
    ] {
        service
            .record(account.id, TransactionKind::Deposit, amount, at_noon(day))
            .await?;
    }

    let report = service
        .get_report(
            account.id,
            Some(parse_date("2024-02-01")),
            Some(parse_date("2024-02-29")),
        )
        .await?;

    let amounts: Vec<_> = report.transactions.iter().map(|t| t.amount_cents).collect();
    assert_eq!(amounts, vec![200, 300, 400]);
    assert_eq!(report.balance_summary, 900);
    assert_eq!(report.summary_scope, Some(SummaryScope::AllAccounts));

    Ok(())
}

#[tokio::test]
async fn test_range_orders_by_timestamp_not_insertion() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.open_account("alice", 0).await?;

    service
        .record(account.id, TransactionKind::Deposit, 300, at_noon("2024-05-03"))
        .await?;
    service
        .record(account.id, TransactionKind::Deposit, 100, at_noon("2024-05-01"))
        .await?;
    service
        .record(account.id, TransactionKind::Withdrawal, 200, at_noon("2024-05-02"))
        .await?;

    let report = service
        .get_report(
            account.id,
            Some(parse_date("2024-05-01")),
            Some(parse_date("2024-05-31")),
        )
        .await?;

    let amounts: Vec<_> = report.transactions.iter().map(|t| t.amount_cents).collect();
    assert_eq!(amounts, vec![100, 200, 300]);
    // Amounts are summed regardless of direction
    assert_eq!(report.balance_summary, 600);

    Ok(())
}

#[tokio::test]
async fn test_default_summary_covers_all_accounts() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = service.open_account("alice", 0).await?;
    let bob = service.open_account("bob", 0).await?;

    service
        .record(alice.id, TransactionKind::Deposit, 1000, at_noon("2024-03-10"))
        .await?;
    service
        .record(bob.id, TransactionKind::Deposit, 2500, at_noon("2024-03-11"))
        .await?;
    service
        .record(bob.id, TransactionKind::Deposit, 9999, at_noon("2024-04-01"))
        .await?;

    let report = service
        .get_report(
            alice.id,
            Some(parse_date("2024-03-01")),
            Some(parse_date("2024-03-31")),
        )
        .await?;

    // Only alice's transactions are listed, but the sum spans every account
    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.transactions[0].account_id, alice.id);
    assert_eq!(report.balance_summary, 3500);

    Ok(())
}

#[tokio::test]
async fn test_account_summary_scope() -> Result<()> {
    let config = LedgerConfig {
        summary_scope: SummaryScope::Account,
        ..LedgerConfig::default()
    };
    let (service, _temp) = test_service_with(config).await?;
    let alice = service.open_account("alice", 0).await?;
    let bob = service.open_account("bob", 0).await?;

    service
        .record(alice.id, TransactionKind::Deposit, 1000, at_noon("2024-03-10"))
        .await?;
    service
        .record(alice.id, TransactionKind::Withdrawal, 400, at_noon("2024-03-12"))
        .await?;
    service
        .record(bob.id, TransactionKind::Deposit, 2500, at_noon("2024-03-11"))
        .await?;

    let report = service
        .get_report(
            alice.id,
            Some(parse_date("2024-03-01")),
            Some(parse_date("2024-03-31")),
        )
        .await?;

    assert_eq!(report.transactions.len(), 2);
    assert_eq!(report.balance_summary, 1400);
    assert_eq!(report.summary_scope, Some(SummaryScope::Account));

    Ok(())
}

#[tokio::test]
async fn test_inverted_range_is_empty() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.open_account("alice", 0).await?;
    service
        .record(account.id, TransactionKind::Deposit, 1000, at_noon("2024-03-10"))
        .await?;

    let report = service
        .get_report(
            account.id,
            Some(parse_date("2024-03-31")),
            Some(parse_date("2024-03-01")),
        )
        .await?;

    assert!(report.transactions.is_empty());
    assert_eq!(report.balance_summary, 0);
    assert!(report.range.is_some());

    Ok(())
}

#[tokio::test]
async fn test_reports_are_independent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.open_account("alice", 0).await?;
    service
        .record(account.id, TransactionKind::Deposit, 1000, at_noon("2024-03-10"))
        .await?;
    service
        .record(account.id, TransactionKind::Deposit, 2000, at_noon("2024-06-10"))
        .await?;

    let march = service
        .get_report(
            account.id,
            Some(parse_date("2024-03-01")),
            Some(parse_date("2024-03-31")),
        )
        .await?;
    let june = service
        .get_report(
            account.id,
            Some(parse_date("2024-06-01")),
            Some(parse_date("2024-06-30")),
        )
        .await?;
    let march_again = service
        .get_report(
            account.id,
            Some(parse_date("2024-03-01")),
            Some(parse_date("2024-03-31")),
        )
        .await?;

    assert_eq!(march.balance_summary, 1000);
    assert_eq!(june.balance_summary, 2000);
    assert_eq!(march_again.transactions, march.transactions);
    assert_eq!(march_again.balance_summary, march.balance_summary);

    Ok(())
}

#[tokio::test]
async fn test_report_reflects_paid_loans() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let account = service.open_account("alice", 50000).await?;
    let loan = common::approved_loan(&service, account.id, 10000).await?;
    service.pay_loan(loan.id).await?;

    let report = service.get_report(account.id, None, None).await?;

    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.transactions[0].transaction_type, TransactionType::LoanPaid);
    assert_eq!(report.balance_summary, 40000);

    Ok(())
}

#[tokio::test]
async fn test_summary_overflow_is_a_typed_error() -> Result<()> {
    let half = i64::MAX / 2;

    for summary_scope in [SummaryScope::AllAccounts, SummaryScope::Account] {
        let config = LedgerConfig {
            summary_scope,
            ..LedgerConfig::default()
        };
        let (service, _temp) = test_service_with(config).await?;
        let account = service.open_account("alice", 0).await?;
        let day = at_noon("2024-01-10");

        // Balance stays in range; the sum of amounts does not
        service.record(account.id, TransactionKind::Deposit, half, day).await?;
        service.record(account.id, TransactionKind::Withdrawal, half, day).await?;
        service.record(account.id, TransactionKind::Deposit, half, day).await?;
        assert_eq!(service.get_account(account.id).await?.balance_cents, half);

        let result = service
            .get_report(
                account.id,
                Some(parse_date("2024-01-01")),
                Some(parse_date("2024-01-31")),
            )
            .await;
        assert!(
            matches!(result, Err(AppError::InvalidAmount(_))),
            "{:?} scope should report an overflowing summary",
            summary_scope
        );

        // The unranged report is unaffected
        let report = service.get_report(account.id, None, None).await?;
        assert_eq!(report.balance_summary, half);
    }

    Ok(())
}
