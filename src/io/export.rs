use anyhow::Result;
use std::io::Write;

use crate::application::TransactionReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Writes a transaction report in machine-readable formats.
pub struct ReportExporter<'a> {
    report: &'a TransactionReport,
}

impl<'a> ReportExporter<'a> {
    pub fn new(report: &'a TransactionReport) -> Self {
        Self { report }
    }

    /// Write in `format`, returning the number of transactions written.
    pub fn write<W: Write>(&self, format: ExportFormat, writer: W) -> Result<usize> {
        match format {
            ExportFormat::Csv => self.write_csv(writer),
            ExportFormat::Json => self.write_json(writer),
        }
    }

    /// One row per transaction; amounts stay in cents.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "sequence",
            "timestamp",
            "type",
            "amount_cents",
            "loan_approve",
            "balance_after_cents",
        ])?;

        for tx in &self.report.transactions {
            csv_writer.write_record(&[
                tx.id.to_string(),
                tx.sequence.to_string(),
                tx.timestamp.to_rfc3339(),
                tx.transaction_type.as_str().to_string(),
                tx.amount_cents.to_string(),
                tx.loan_approve.to_string(),
                tx.balance_after_cents.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.report.transactions.len())
    }

    /// The whole report, including range and balance summary.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let json = serde_json::to_string_pretty(self.report)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(self.report.transactions.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::domain::{Account, DateRange, SummaryScope, Transaction, TransactionType};

    fn sample_report() -> TransactionReport {
        let account = Account::new("alice", 40000);
        let mut deposit =
            Transaction::new(account.id, TransactionType::Deposit, 20000, 70000, Utc::now());
        deposit.sequence = 1;
        let mut withdrawal =
            Transaction::new(account.id, TransactionType::Withdrawal, 30000, 40000, Utc::now());
        withdrawal.sequence = 2;

        TransactionReport {
            account,
            generated_at: Utc::now(),
            range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )),
            transactions: vec![deposit, withdrawal],
            balance_summary: 50000,
            summary_scope: Some(SummaryScope::AllAccounts),
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(ExportFormat::from_str("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_str("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_str("xml"), None);
    }

    #[test]
    fn test_write_csv() {
        let report = sample_report();
        let mut out = Vec::new();
        let count = ReportExporter::new(&report).write_csv(&mut out).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,sequence,timestamp,type"));
        assert!(lines[1].contains(",deposit,20000,false,70000"));
        assert!(lines[2].contains(",withdrawal,30000,false,40000"));
    }

    #[test]
    fn test_write_json() {
        let report = sample_report();
        let mut out = Vec::new();
        ReportExporter::new(&report)
            .write(ExportFormat::Json, &mut out)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["balance_summary"], 50000);
        assert_eq!(value["summary_scope"], "all_accounts");
        assert_eq!(value["transactions"][1]["transaction_type"], "withdrawal");
        assert_eq!(value["range"]["start"], "2024-01-01");
    }
}
