use std::cmp::Reverse;

use serde::Serialize;

use super::percentage;
use crate::lending::domain::{
    Amount, Customer, CustomerId, KycStatus, Loan, LoanStatus, Repayment, RepaymentStatus,
};

pub const LOW_RISK_CEILING: Amount = 5_000;
pub const MEDIUM_RISK_CEILING: Amount = 20_000;
const HEAVY_BORROWER_THRESHOLD: Amount = 50_000;
const MAX_RISK_SCORE: u32 = 100;

/// Loan counts by size band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskBands {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRisk {
    pub customer_id: CustomerId,
    pub name: String,
    pub risk_score: u32,
    pub total_borrowed: Amount,
    pub loan_count: usize,
    pub overdue_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub total_portfolio: Amount,
    pub overdue_amount: Amount,
    pub defaulted_amount: Amount,
    pub portfolio_at_risk: f64,
    pub default_rate: f64,
    pub total_risk_exposure: f64,
    pub bands: RiskBands,
    /// Riskiest first.
    pub customers: Vec<CustomerRisk>,
}

fn customer_risk(customer: &Customer, loans: &[Loan], repayments: &[Repayment]) -> CustomerRisk {
    let own: Vec<&Loan> = loans.iter().filter(|l| l.customer_id == customer.id).collect();
    let total_borrowed: Amount = own.iter().map(|l| l.amount).sum();
    let overdue_count = own
        .iter()
        .filter(|loan| {
            repayments
                .iter()
                .any(|r| r.loan_id == loan.id && r.status == RepaymentStatus::Overdue)
        })
        .count();

    let mut score = 0;
    if total_borrowed > HEAVY_BORROWER_THRESHOLD {
        score += 30;
    }
    if overdue_count > 0 {
        score += 40;
    }
    if own.len() > 3 {
        score += 20;
    }
    if customer.kyc_status == KycStatus::Pending {
        score += 10;
    }

    CustomerRisk {
        customer_id: customer.id,
        name: customer.name.clone(),
        risk_score: score.min(MAX_RISK_SCORE),
        total_borrowed,
        loan_count: own.len(),
        overdue_count,
    }
}

pub fn generate_risk_metrics(
    loans: &[Loan],
    customers: &[Customer],
    repayments: &[Repayment],
) -> RiskMetrics {
    let total_portfolio: Amount = loans.iter().map(|l| l.amount).sum();
    let overdue_amount: Amount = repayments
        .iter()
        .filter(|r| r.status == RepaymentStatus::Overdue)
        .map(|r| r.expected_amount)
        .sum();
    let defaulted_amount: Amount = loans
        .iter()
        .filter(|l| l.status == LoanStatus::Defaulted)
        .map(|l| l.amount)
        .sum();

    let mut bands = RiskBands::default();
    for loan in loans {
        match loan.amount {
            amount if amount <= LOW_RISK_CEILING => bands.low += 1,
            amount if amount <= MEDIUM_RISK_CEILING => bands.medium += 1,
            _ => bands.high += 1,
        }
    }

    let mut scored: Vec<CustomerRisk> = customers
        .iter()
        .map(|customer| customer_risk(customer, loans, repayments))
        .collect();
    scored.sort_by_key(|risk| Reverse(risk.risk_score));

    let portfolio_at_risk = percentage(overdue_amount as f64, total_portfolio as f64);
    let default_rate = percentage(defaulted_amount as f64, total_portfolio as f64);
    RiskMetrics {
        total_portfolio,
        overdue_amount,
        defaulted_amount,
        portfolio_at_risk,
        default_rate,
        total_risk_exposure: portfolio_at_risk + default_rate,
        bands,
        customers: scored,
    }
}
