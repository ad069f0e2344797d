use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::{percentage, scope_dataset};
use crate::lending::domain::{Amount, KycStatus, LoanId, LoanStatus, RepaymentStatus, User};
use crate::lending::notifications::{critical_count, generate_notifications};
use crate::lending::store::Dataset;

/// Headline numbers for the landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_customers: usize,
    pub total_applications: usize,
    pub active_loans: usize,
    pub total_disbursed: Amount,
    pub total_collected: Amount,
    pub collection_efficiency: f64,
    pub overdue_amount: Amount,
    pub overdue_loans: usize,
    pub pending_applications: usize,
    pub kyc_pending: usize,
    pub due_today: usize,
    pub critical_alerts: usize,
}

pub fn generate_dashboard_summary(data: &Dataset, user: &User, today: NaiveDate) -> DashboardSummary {
    let scoped = scope_dataset(data, user);
    let repayments_with = |status: RepaymentStatus| {
        scoped
            .repayments
            .iter()
            .filter(move |repayment| repayment.status == status)
    };

    let total_disbursed: Amount = scoped.loans.iter().map(|loan| loan.amount).sum();
    let total_collected: Amount = repayments_with(RepaymentStatus::Paid)
        .map(|repayment| repayment.paid_amount)
        .sum();
    let overdue_loans: HashSet<LoanId> = repayments_with(RepaymentStatus::Overdue)
        .map(|repayment| repayment.loan_id)
        .collect();

    DashboardSummary {
        total_customers: scoped.customers.len(),
        total_applications: scoped.applications.len(),
        active_loans: scoped
            .loans
            .iter()
            .filter(|loan| loan.status == LoanStatus::Active)
            .count(),
        total_disbursed,
        total_collected,
        collection_efficiency: percentage(total_collected as f64, total_disbursed as f64),
        overdue_amount: repayments_with(RepaymentStatus::Overdue)
            .map(|repayment| repayment.expected_amount)
            .sum(),
        overdue_loans: overdue_loans.len(),
        pending_applications: scoped
            .applications
            .iter()
            .filter(|application| application.status.is_pending())
            .count(),
        kyc_pending: scoped
            .customers
            .iter()
            .filter(|customer| customer.kyc_status == KycStatus::Pending)
            .count(),
        due_today: repayments_with(RepaymentStatus::Pending)
            .filter(|repayment| repayment.due_date == today)
            .count(),
        critical_alerts: critical_count(&generate_notifications(data, user, today)),
    }
}
