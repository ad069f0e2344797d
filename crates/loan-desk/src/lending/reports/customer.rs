use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::ReportFilter;
use crate::lending::domain::{Amount, Customer, CustomerId, KycStatus, Loan, LoanStatus, Partner};

/// Customers created within this many days count as new.
pub const NEW_CUSTOMER_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerByPartner {
    pub partner_name: String,
    pub total_customers: usize,
    pub active_loans: usize,
    pub total_disbursed: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerReport {
    pub total_customers: usize,
    pub new_customers: usize,
    pub active_customers: usize,
    pub kyc_pending: usize,
    pub kyc_verified: usize,
    pub kyc_rejected: usize,
    pub customers_by_partner: Vec<CustomerByPartner>,
}

pub fn generate_customer_report(
    customers: &[Customer],
    loans: &[Loan],
    partners: &[Partner],
    filter: &ReportFilter,
    today: NaiveDate,
) -> CustomerReport {
    let selected: Vec<&Customer> = customers
        .iter()
        .filter(|c| filter.partner_id.map_or(true, |id| c.partner_id == Some(id)))
        .filter(|c| filter.admits(c.created_at.date_naive()))
        .collect();

    let window_start = today
        .checked_sub_days(Days::new(NEW_CUSTOMER_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);
    let borrowing: HashSet<CustomerId> = loans
        .iter()
        .filter(|loan| loan.status == LoanStatus::Active)
        .map(|loan| loan.customer_id)
        .collect();
    let kyc = |status: KycStatus| selected.iter().filter(|c| c.kyc_status == status).count();

    // Partner rows always span the whole book, not the filtered slice.
    let customers_by_partner = partners
        .iter()
        .map(|partner| {
            let members: HashSet<CustomerId> = customers
                .iter()
                .filter(|c| c.partner_id == Some(partner.id))
                .map(|c| c.id)
                .collect();
            let partner_loans = loans.iter().filter(|loan| members.contains(&loan.customer_id));
            CustomerByPartner {
                partner_name: partner.name.clone(),
                total_customers: members.len(),
                active_loans: partner_loans
                    .clone()
                    .filter(|loan| loan.status == LoanStatus::Active)
                    .count(),
                total_disbursed: partner_loans.map(|loan| loan.amount).sum(),
            }
        })
        .collect();

    CustomerReport {
        total_customers: selected.len(),
        new_customers: selected
            .iter()
            .filter(|c| c.created_at.date_naive() >= window_start)
            .count(),
        active_customers: selected.iter().filter(|c| borrowing.contains(&c.id)).count(),
        kyc_pending: kyc(KycStatus::Pending),
        kyc_verified: kyc(KycStatus::Verified),
        kyc_rejected: kyc(KycStatus::Rejected),
        customers_by_partner,
    }
}
