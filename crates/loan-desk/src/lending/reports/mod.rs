//! Portfolio, collection, financial, customer, application and risk reporting.
//!
//! Every report is a pure fold over dataset slices. Ratios are percentages in
//! `[0, 100]` and are zero when their denominator is zero.

mod application;
mod collection;
mod customer;
mod dashboard;
mod financial;
mod portfolio;
mod risk;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use application::{generate_application_report, ApplicationByProduct, ApplicationReport};
pub use collection::{generate_collection_report, AgentPerformance, CollectionReport};
pub use customer::{generate_customer_report, CustomerByPartner, CustomerReport};
pub use dashboard::{generate_dashboard_summary, DashboardSummary};
pub use financial::{generate_financial_report, FinancialReport, MonthlyFinancial};
pub use portfolio::{generate_portfolio_report, PortfolioReport};
pub use risk::{generate_risk_metrics, CustomerRisk, RiskBands, RiskMetrics};

use super::access::{accessible_customer_ids, filter_loans_by_user};
use super::domain::{LoanId, PartnerId, User};
use super::store::Dataset;

/// Optional narrowing applied before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub partner_id: Option<PartnerId>,
    /// Application status label, e.g. `Under Review`.
    #[serde(default)]
    pub status: Option<String>,
    /// Product name.
    #[serde(default)]
    pub product: Option<String>,
}

impl ReportFilter {
    /// A range only applies when both ends are set; bounds are inclusive.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start_date.zip(self.end_date)
    }

    pub fn admits(&self, date: NaiveDate) -> bool {
        self.date_range()
            .map_or(true, |(start, end)| date >= start && date <= end)
    }
}

pub(crate) fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

pub(crate) fn average(total: f64, count: usize) -> f64 {
    if count > 0 {
        total / count as f64
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Portfolio,
    Collection,
    Financial,
    Customer,
    Application,
    Risk,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Portfolio,
        ReportKind::Collection,
        ReportKind::Financial,
        ReportKind::Customer,
        ReportKind::Application,
        ReportKind::Risk,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ReportKind::Portfolio => "portfolio",
            ReportKind::Collection => "collection",
            ReportKind::Financial => "financial",
            ReportKind::Customer => "customer",
            ReportKind::Application => "application",
            ReportKind::Risk => "risk",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report `{0}`")]
pub struct UnknownReport(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReport;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.label() == wanted)
            .ok_or_else(|| UnknownReport(value.to_string()))
    }
}

/// Any generated report, serialized without a wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Portfolio(PortfolioReport),
    Collection(CollectionReport),
    Financial(FinancialReport),
    Customer(CustomerReport),
    Application(ApplicationReport),
    Risk(RiskMetrics),
}

/// Builds a report over the part of the dataset `user` may see.
pub fn generate_report(
    kind: ReportKind,
    data: &Dataset,
    user: &User,
    filter: &ReportFilter,
    today: NaiveDate,
) -> Report {
    let scoped = scope_dataset(data, user);
    let data = &scoped;
    match kind {
        ReportKind::Portfolio => Report::Portfolio(generate_portfolio_report(
            &data.loans,
            &data.repayments,
            &data.customers,
            filter,
        )),
        ReportKind::Collection => Report::Collection(generate_collection_report(
            &data.collection_schedules,
            filter,
            today,
        )),
        ReportKind::Financial => Report::Financial(generate_financial_report(
            &data.vouchers,
            &data.journals,
            filter,
        )),
        ReportKind::Customer => Report::Customer(generate_customer_report(
            &data.customers,
            &data.loans,
            &data.partners,
            filter,
            today,
        )),
        ReportKind::Application => Report::Application(generate_application_report(
            &data.applications,
            &data.customers,
            filter,
        )),
        ReportKind::Risk => Report::Risk(generate_risk_metrics(
            &data.loans,
            &data.customers,
            &data.repayments,
        )),
    }
}

/// Copy of the dataset restricted to the user's partner. Admins get everything.
pub fn scope_dataset(data: &Dataset, user: &User) -> Dataset {
    let Some(customers) = accessible_customer_ids(&data.customers, user) else {
        return data.clone();
    };
    let loans: HashSet<_> = filter_loans_by_user(&data.loans, &data.customers, user)
        .into_iter()
        .map(|loan| loan.id)
        .collect();
    let visible_loan = |loan_id: Option<LoanId>| loan_id.is_some_and(|id| loans.contains(&id));

    Dataset {
        partners: data
            .partners
            .iter()
            .filter(|partner| user.partner_id == Some(partner.id))
            .cloned()
            .collect(),
        users: data.users.clone(),
        customers: data
            .customers
            .iter()
            .filter(|c| customers.contains(&c.id))
            .cloned()
            .collect(),
        addresses: data
            .addresses
            .iter()
            .filter(|a| customers.contains(&a.customer_id))
            .cloned()
            .collect(),
        products: data.products.clone(),
        applications: data
            .applications
            .iter()
            .filter(|a| customers.contains(&a.customer_id))
            .cloned()
            .collect(),
        loans: data
            .loans
            .iter()
            .filter(|l| loans.contains(&l.id))
            .cloned()
            .collect(),
        repayments: data
            .repayments
            .iter()
            .filter(|r| loans.contains(&r.loan_id))
            .cloned()
            .collect(),
        collection_schedules: data
            .collection_schedules
            .iter()
            .filter(|s| loans.contains(&s.loan_id))
            .cloned()
            .collect(),
        penalties: data
            .penalties
            .iter()
            .filter(|p| loans.contains(&p.loan_id))
            .cloned()
            .collect(),
        top_ups: data
            .top_ups
            .iter()
            .filter(|t| loans.contains(&t.loan_id))
            .cloned()
            .collect(),
        closures: data
            .closures
            .iter()
            .filter(|c| loans.contains(&c.loan_id))
            .cloned()
            .collect(),
        vouchers: data
            .vouchers
            .iter()
            .filter(|v| {
                visible_loan(v.loan_id) || v.customer_id.is_some_and(|id| customers.contains(&id))
            })
            .cloned()
            .collect(),
        journals: data
            .journals
            .iter()
            .filter(|j| visible_loan(j.loan_id))
            .cloned()
            .collect(),
        transactions: data
            .transactions
            .iter()
            .filter(|t| {
                visible_loan(t.loan_id) || t.customer_id.is_some_and(|id| customers.contains(&id))
            })
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests;
