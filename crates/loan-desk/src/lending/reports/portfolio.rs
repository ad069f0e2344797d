use std::collections::HashSet;

use serde::Serialize;

use super::{average, percentage, ReportFilter};
use crate::lending::domain::{Amount, Customer, Loan, LoanId, LoanStatus, Repayment, RepaymentStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioReport {
    pub total_loans: usize,
    pub active_loans: usize,
    pub closed_loans: usize,
    pub defaulted_loans: usize,
    pub total_disbursed: Amount,
    pub total_outstanding: Amount,
    pub total_collected: Amount,
    pub average_loan_size: f64,
    pub average_interest_rate: f64,
    pub collection_efficiency: f64,
    pub overdue_amount: Amount,
    pub overdue_loans: usize,
}

/// Loans are narrowed by the primary customer's partner, then by disbursement date.
pub fn generate_portfolio_report(
    loans: &[Loan],
    repayments: &[Repayment],
    customers: &[Customer],
    filter: &ReportFilter,
) -> PortfolioReport {
    let selected: Vec<&Loan> = loans
        .iter()
        .filter(|loan| match filter.partner_id {
            Some(partner_id) => customers
                .iter()
                .find(|customer| customer.id == loan.customer_id)
                .is_some_and(|customer| customer.partner_id == Some(partner_id)),
            None => true,
        })
        .filter(|loan| filter.admits(loan.disbursement_date))
        .collect();
    let selected_ids: HashSet<LoanId> = selected.iter().map(|loan| loan.id).collect();

    let with_status = |status: LoanStatus| selected.iter().filter(move |loan| loan.status == status);
    let repayments_of = |loan_id: LoanId, status: RepaymentStatus| {
        repayments
            .iter()
            .filter(move |r| r.loan_id == loan_id && r.status == status)
    };

    let total_disbursed: Amount = selected.iter().map(|loan| loan.amount).sum();
    let total_outstanding: Amount = with_status(LoanStatus::Active)
        .map(|loan| {
            let repaid: Amount = repayments_of(loan.id, RepaymentStatus::Paid)
                .map(|r| r.principal_amount)
                .sum();
            loan.amount - repaid
        })
        .sum();
    let total_collected: Amount = repayments
        .iter()
        .filter(|r| r.status == RepaymentStatus::Paid && selected_ids.contains(&r.loan_id))
        .map(|r| r.paid_amount)
        .sum();
    let overdue_amount: Amount = with_status(LoanStatus::Active)
        .flat_map(|loan| repayments_of(loan.id, RepaymentStatus::Overdue))
        .map(|r| r.expected_amount)
        .sum();
    let overdue_loans = with_status(LoanStatus::Active)
        .filter(|loan| repayments_of(loan.id, RepaymentStatus::Overdue).next().is_some())
        .count();

    PortfolioReport {
        total_loans: selected.len(),
        active_loans: with_status(LoanStatus::Active).count(),
        closed_loans: with_status(LoanStatus::Closed).count(),
        defaulted_loans: with_status(LoanStatus::Defaulted).count(),
        total_disbursed,
        total_outstanding,
        total_collected,
        average_loan_size: average(total_disbursed as f64, selected.len()),
        average_interest_rate: average(
            selected.iter().map(|loan| loan.interest_rate).sum(),
            selected.len(),
        ),
        collection_efficiency: percentage(total_collected as f64, total_disbursed as f64),
        overdue_amount,
        overdue_loans,
    }
}
