//! Loan back office: EMI arithmetic, partner-scoped visibility, lifecycle
//! workflows and portfolio reporting over a shared dataset.

pub mod access;
pub mod domain;
pub mod emi;
pub mod events;
pub mod export;
pub mod format;
pub(crate) mod ledger;
pub mod notifications;
pub mod products;
pub mod reports;
pub mod router;
pub mod search;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use emi::{
    calculate_emi, calculate_prepayment_savings, calculate_total_amount, calculate_total_interest,
    generate_amortization_schedule, level_installment, validate_terms, AmortizationRow, EmiQuote,
    PrepaymentSavings, TermsError, MAX_PRINCIPAL, MAX_TENURE_MONTHS,
};
pub use events::{EventError, EventPublisher, LifecycleEvent, TracingEventPublisher};
pub use reports::{generate_report, Report, ReportFilter, ReportKind};
pub use router::{lending_router, lending_router_with_clock, USER_HEADER};
pub use service::{LendingConfig, LendingError, LendingService};
pub use store::{Dataset, InMemoryLendingRepository, LendingRepository, RepositoryError};
