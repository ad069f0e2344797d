use std::collections::BTreeMap;

use serde::Serialize;

use super::{average, percentage, ReportFilter};
use crate::lending::domain::{ApplicationStatus, Customer, LoanApplication};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationByProduct {
    pub product: String,
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub approval_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationReport {
    pub total_applications: usize,
    pub approved_applications: usize,
    pub rejected_applications: usize,
    pub pending_applications: usize,
    pub approval_rate: f64,
    /// Mean days from creation to the last update, over approved and rejected applications.
    pub average_processing_days: f64,
    /// Sorted by product name.
    pub applications_by_product: Vec<ApplicationByProduct>,
}

fn tally(row: &mut ApplicationByProduct, status: ApplicationStatus) {
    row.total += 1;
    match status {
        ApplicationStatus::Approved => row.approved += 1,
        ApplicationStatus::Rejected => row.rejected += 1,
        status if status.is_pending() => row.pending += 1,
        _ => {}
    }
}

/// Partner, creation date, status label and product filters all compose.
pub fn generate_application_report(
    applications: &[LoanApplication],
    customers: &[Customer],
    filter: &ReportFilter,
) -> ApplicationReport {
    let selected: Vec<&LoanApplication> = applications
        .iter()
        .filter(|app| match filter.partner_id {
            Some(partner_id) => customers
                .iter()
                .find(|c| c.id == app.customer_id)
                .is_some_and(|c| c.partner_id == Some(partner_id)),
            None => true,
        })
        .filter(|app| filter.admits(app.created_at.date_naive()))
        .filter(|app| {
            filter
                .status
                .as_deref()
                .map_or(true, |label| app.status.label().eq_ignore_ascii_case(label.trim()))
        })
        .filter(|app| {
            filter
                .product
                .as_deref()
                .map_or(true, |product| app.product.eq_ignore_ascii_case(product.trim()))
        })
        .collect();

    let mut overall = ApplicationByProduct::default();
    let mut products: BTreeMap<&str, ApplicationByProduct> = BTreeMap::new();
    for app in &selected {
        tally(&mut overall, app.status);
        tally(
            products
                .entry(app.product.as_str())
                .or_insert_with(|| ApplicationByProduct {
                    product: app.product.clone(),
                    ..ApplicationByProduct::default()
                }),
            app.status,
        );
    }

    let processed: Vec<f64> = selected
        .iter()
        .filter(|app| app.status.is_processed())
        .map(|app| (app.updated_at - app.created_at).num_seconds() as f64 / 86_400.0)
        .collect();

    ApplicationReport {
        total_applications: overall.total,
        approved_applications: overall.approved,
        rejected_applications: overall.rejected,
        pending_applications: overall.pending,
        approval_rate: percentage(overall.approved as f64, overall.total as f64),
        average_processing_days: average(processed.iter().sum(), processed.len()),
        applications_by_product: products
            .into_values()
            .map(|mut row| {
                row.approval_rate = percentage(row.approved as f64, row.total as f64);
                row
            })
            .collect(),
    }
}
