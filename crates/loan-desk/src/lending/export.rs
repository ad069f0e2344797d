//! CSV renderings of schedules and report tables.

use std::io::Write;

use serde::Serialize;

use super::emi::AmortizationRow;
use super::reports::{AgentPerformance, ApplicationByProduct, MonthlyFinancial, PortfolioReport};

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Header row is emitted with the first record, so an empty schedule writes nothing.
pub fn export_schedule<W: Write>(writer: W, rows: &[AmortizationRow]) -> Result<(), csv::Error> {
    write_rows(writer, rows)
}

pub fn export_agent_performance<W: Write>(
    writer: W,
    agents: &[AgentPerformance],
) -> Result<(), csv::Error> {
    write_rows(writer, agents)
}

pub fn export_monthly_financials<W: Write>(
    writer: W,
    months: &[MonthlyFinancial],
) -> Result<(), csv::Error> {
    write_rows(writer, months)
}

pub fn export_application_products<W: Write>(
    writer: W,
    products: &[ApplicationByProduct],
) -> Result<(), csv::Error> {
    write_rows(writer, products)
}

#[derive(Serialize)]
struct Metric<'a> {
    metric: &'a str,
    value: String,
}

/// Two-column `metric,value` sheet.
pub fn export_portfolio<W: Write>(writer: W, report: &PortfolioReport) -> Result<(), csv::Error> {
    let counts = [
        ("total_loans", report.total_loans),
        ("active_loans", report.active_loans),
        ("closed_loans", report.closed_loans),
        ("defaulted_loans", report.defaulted_loans),
        ("overdue_loans", report.overdue_loans),
    ];
    let amounts = [
        ("total_disbursed", report.total_disbursed),
        ("total_outstanding", report.total_outstanding),
        ("total_collected", report.total_collected),
        ("overdue_amount", report.overdue_amount),
    ];
    let ratios = [
        ("average_loan_size", report.average_loan_size),
        ("average_interest_rate", report.average_interest_rate),
        ("collection_efficiency", report.collection_efficiency),
    ];

    let rows: Vec<Metric<'_>> = counts
        .iter()
        .map(|&(metric, value)| Metric {
            metric,
            value: value.to_string(),
        })
        .chain(amounts.iter().map(|&(metric, value)| Metric {
            metric,
            value: value.to_string(),
        }))
        .chain(ratios.iter().map(|&(metric, value)| Metric {
            metric,
            value: format!("{value:.2}"),
        }))
        .collect();
    write_rows(writer, &rows)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::lending::emi::generate_amortization_schedule;
    use crate::lending::reports::{generate_portfolio_report, ReportFilter};
    use crate::lending::store::Dataset;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), csv::Error>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).expect("export succeeds");
        String::from_utf8(buffer).expect("utf-8 output")
    }

    #[test]
    fn schedule_has_a_header_and_one_line_per_installment() {
        let disbursed = NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date");
        let rows = generate_amortization_schedule(100_000, 12.0, 12, disbursed);
        let text = render(|out| export_schedule(out, &rows));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(
            lines[0],
            "installment_number,due_date,emi,principal,interest,outstanding_balance,cumulative_interest"
        );
        assert_eq!(lines[1], "1,2025-02-01,8885,7885,1000,92115,1000");
        assert_eq!(lines[12].split(',').nth(5), Some("0"));
    }

    #[test]
    fn portfolio_sheet_lists_metrics() {
        let data = Dataset::demo();
        let report = generate_portfolio_report(
            &data.loans,
            &data.repayments,
            &data.customers,
            &ReportFilter::default(),
        );
        let text = render(|out| export_portfolio(out, &report));

        assert!(text.starts_with("metric,value\n"));
        assert!(text.contains("total_loans,4\n"));
        assert!(text.contains("total_disbursed,765000\n"));
    }

    #[test]
    fn empty_tables_write_nothing() {
        let text = render(|out| export_agent_performance(out, &[]));
        assert!(text.is_empty());
    }
}
