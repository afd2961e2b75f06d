use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{LedgerService, LoanPayment, TransactionReport};
use crate::config::LedgerConfig;
use crate::domain::{Transaction, count_outstanding_loans, format_cents, parse_amount};
use crate::io::{ExportFormat, ReportExporter};

/// Bank ledger - deposits, withdrawals, loans and reports
#[derive(Parser)]
#[command(name = "bank-ledger")]
#[command(about = "A bank-account transaction ledger with loans and date-ranged reports")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "bank-ledger.db")]
    pub database: String,

    /// Ledger policy file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit money into an account
    Deposit {
        /// Account ID
        account: String,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Account ID
        account: String,

        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,
    },

    /// Loan commands
    #[command(subcommand)]
    Loan(LoanCommands),

    /// Show an account's transactions, optionally for a date range
    Report {
        /// Account ID
        account: String,

        /// First day of the range (YYYY-MM-DD); needs --end
        #[arg(long)]
        start: Option<String>,

        /// Last day of the range, inclusive (YYYY-MM-DD); needs --start
        #[arg(long)]
        end: Option<String>,

        /// Output format: table, csv, json
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write csv/json output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Open {
        /// Owner identity (also receives notifications)
        owner: String,

        /// Opening balance
        #[arg(short, long, default_value = "0")]
        balance: String,
    },

    /// Show an account
    Show {
        /// Account ID
        id: String,
    },

    /// List all accounts
    List,
}

#[derive(Subcommand)]
pub enum LoanCommands {
    /// Request a loan
    Request {
        /// Account ID
        account: String,

        /// Loan amount
        amount: String,
    },

    /// Approve a requested loan (administrative)
    Approve {
        /// Loan transaction ID
        id: String,
    },

    /// Pay back an approved loan from the account balance
    Pay {
        /// Loan transaction ID
        id: String,
    },

    /// List loans that have not been paid back
    List {
        /// Account ID
        account: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = LedgerConfig::load_or_default(self.config.as_deref())?;

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(cmd) => {
                let service = connect(&self.database, config).await?;
                run_account_command(&service, cmd).await?;
            }

            Commands::Deposit { account, amount } => {
                let service = connect(&self.database, config).await?;
                let receipt = service
                    .deposit(parse_id(&account)?, parse_money(&amount)?)
                    .await?;
                println!(
                    "{}$ was deposited to your account successfully",
                    format_cents(receipt.transaction.amount_cents)
                );
                println!(
                    "New balance: {} ({})",
                    format_cents(receipt.new_balance),
                    receipt.transaction.id
                );
            }

            Commands::Withdraw { account, amount } => {
                let service = connect(&self.database, config).await?;
                let receipt = service
                    .withdraw(parse_id(&account)?, parse_money(&amount)?)
                    .await?;
                println!(
                    "{}$ was withdrawn from your account successfully",
                    format_cents(receipt.transaction.amount_cents)
                );
                println!(
                    "New balance: {} ({})",
                    format_cents(receipt.new_balance),
                    receipt.transaction.id
                );
            }

            Commands::Loan(cmd) => {
                let service = connect(&self.database, config).await?;
                run_loan_command(&service, cmd).await?;
            }

            Commands::Report {
                account,
                start,
                end,
                format,
                output,
            } => {
                let service = connect(&self.database, config).await?;
                let start = start.map(|s| parse_date(&s)).transpose()?;
                let end = end.map(|s| parse_date(&s)).transpose()?;
                if start.is_some() != end.is_some() {
                    eprintln!("Note: both --start and --end are needed for a date range; showing full history.");
                }

                let report = service.get_report(parse_id(&account)?, start, end).await?;
                run_report_output(&report, &format, output)?;
            }
        }

        Ok(())
    }
}

async fn connect(database: &str, config: LedgerConfig) -> Result<LedgerService> {
    Ok(LedgerService::connect(database).await?.with_config(config))
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Open { owner, balance } => {
            let account = service.open_account(owner, parse_money(&balance)?).await?;
            println!(
                "Opened account for {}: {} (balance {})",
                account.owner,
                account.id,
                format_cents(account.balance_cents)
            );
        }

        AccountCommands::Show { id } => {
            let account = service.get_account(parse_id(&id)?).await?;
            let loans = service.get_loans(account.id).await?;
            println!("Account:  {}", account.id);
            println!("Owner:    {}", account.owner);
            println!(
                "Balance:  {}{}",
                format_cents(account.balance_cents),
                if account.is_overdrawn() { " (overdrawn)" } else { "" }
            );
            println!("Opened:   {}", account.created_at.format("%Y-%m-%d %H:%M"));
            println!(
                "Loans:    {} open, {}/{} approved",
                loans.len(),
                count_outstanding_loans(&loans),
                service.config().loan_limit
            );
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<38} {:<20} {:>12}", "ID", "OWNER", "BALANCE");
                println!("{}", "-".repeat(72));
                for account in accounts {
                    println!(
                        "{:<38} {:<20} {:>12}",
                        account.id,
                        truncate(&account.owner, 20),
                        format_cents(account.balance_cents)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_loan_command(service: &LedgerService, cmd: LoanCommands) -> Result<()> {
    match cmd {
        LoanCommands::Request { account, amount } => {
            let receipt = service
                .request_loan(parse_id(&account)?, parse_money(&amount)?)
                .await?;
            println!(
                "Loan request for amount {}$ has been successfully sent to admin",
                format_cents(receipt.transaction.amount_cents)
            );
            println!("Loan ID: {}", receipt.transaction.id);
        }

        LoanCommands::Approve { id } => {
            let loan = service.approve_loan(parse_id(&id)?).await?;
            println!(
                "Loan {} approved ({})",
                loan.id,
                format_cents(loan.amount_cents)
            );
        }

        LoanCommands::Pay { id } => match service.pay_loan(parse_id(&id)?).await? {
            LoanPayment::Paid { loan, new_balance } => {
                println!(
                    "Loan of {} paid. New balance: {}",
                    format_cents(loan.amount_cents),
                    format_cents(new_balance)
                );
            }
            LoanPayment::NotApproved { loan } => {
                println!(
                    "Loan {} has not been approved yet; nothing was paid.",
                    loan.id
                );
            }
        },

        LoanCommands::List { account } => {
            let loans = service.get_loans(parse_id(&account)?).await?;
            if loans.is_empty() {
                println!("No open loans.");
            } else {
                println!("{:<38} {:<12} {:>12} {:<9}", "ID", "DATE", "AMOUNT", "APPROVED");
                println!("{}", "-".repeat(74));
                for loan in &loans {
                    println!(
                        "{:<38} {:<12} {:>12} {:<9}",
                        loan.id,
                        loan.timestamp.format("%Y-%m-%d"),
                        format_cents(loan.amount_cents),
                        if loan.loan_approve { "yes" } else { "no" }
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_report_output(
    report: &TransactionReport,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    if format.eq_ignore_ascii_case("table") {
        print_report_table(report);
        return Ok(());
    }

    let format = ExportFormat::from_str(format)
        .with_context(|| format!("Unknown format '{}'. Use table, csv or json", format))?;
    let exporter = ReportExporter::new(report);

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let count = exporter.write(format, BufWriter::new(file))?;
            println!("Exported {} transactions to {}", count, path.display());
        }
        None => {
            exporter.write(format, io::stdout().lock())?;
        }
    }
    Ok(())
}

fn print_report_table(report: &TransactionReport) {
    match &report.range {
        Some(range) => println!(
            "Report for {} from {} to {}",
            report.account.owner, range.start, range.end
        ),
        None => println!("Report for {} (all time)", report.account.owner),
    }
    println!();

    if report.is_empty() {
        println!("No transactions found.");
    } else {
        println!(
            "{:<17} {:<11} {:>12} {:>12} {:<8}",
            "DATE", "TYPE", "AMOUNT", "BALANCE", "APPROVED"
        );
        println!("{}", "-".repeat(64));
        for tx in &report.transactions {
            print_transaction_row(tx);
        }
    }

    println!();
    match report.summary_scope {
        Some(scope) => println!(
            "Total amount in range ({}): {}",
            scope.as_str(),
            format_cents(report.balance_summary)
        ),
        None => println!("Current balance: {}", format_cents(report.balance_summary)),
    }
    println!("Net movement: {}", format_cents(report.net_movement()));
}

fn print_transaction_row(tx: &Transaction) {
    let approved = if tx.transaction_type.is_loan() {
        if tx.loan_approve { "yes" } else { "no" }
    } else {
        ""
    };
    println!(
        "{:<17} {:<11} {:>12} {:>12} {:<8}",
        tx.timestamp.format("%Y-%m-%d %H:%M"),
        tx.transaction_type.as_str(),
        format_cents(tx.amount_cents),
        format_cents(tx.balance_after_cents),
        approved
    );
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("Invalid ID '{}' (expected UUID)", id))
}

fn parse_money(amount: &str) -> Result<i64> {
    parse_amount(amount).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", amount))
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}
