//! Lifecycle workflows over the shared dataset.
//!
//! Each mutating operation runs inside one repository `write` and validates
//! before it touches the dataset, so a rejected request leaves no partial records.
//! Events are published after the write commits.

mod accounting;
mod collections;
mod drafts;
mod onboarding;
mod origination;
mod servicing;

use std::sync::Arc;

use super::access::{filter_applications_by_user, filter_customers_by_user, filter_loans_by_user};
use super::domain::{
    ApplicationId, ApplicationStatus, ClosureId, Customer, CustomerId, Loan, LoanApplication,
    LoanId, LoanProduct, LoanStatus, ProductId, RepaymentId, TopUpId, User, UserId,
};
use super::emi::{generate_amortization_schedule, AmortizationRow};
use super::events::{EventError, EventPublisher, LifecycleEvent};
use super::products::{BoundViolation, Eligibility};
use super::store::{Dataset, LendingRepository, RepositoryError};

pub use drafts::{
    AddressDraft, ApplicationDraft, CustomerDraft, JournalDraft, PartnerDraft, PaymentDraft,
    ProductDraft, TopUpDraft, VoucherDraft,
};
pub use collections::CollectionRefresh;
pub use origination::ApplicationOutcome;
pub use servicing::EmiReceipt;

/// Tunables for workflows that fall back to house defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LendingConfig {
    pub top_up_tenure_months: u32,
    pub top_up_interest_rate: f64,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            top_up_tenure_months: 6,
            top_up_interest_rate: 15.0,
        }
    }
}

/// Workflows for onboarding, origination, servicing, collections and accounting.
pub struct LendingService<R, P> {
    repository: Arc<R>,
    events: Arc<P>,
    config: LendingConfig,
}

impl<R, P> LendingService<R, P>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(repository: Arc<R>, events: Arc<P>, config: LendingConfig) -> Self {
        Self {
            repository,
            events,
            config,
        }
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    /// Runs a read-only projection over the dataset.
    pub fn with_dataset<T>(&self, f: impl FnOnce(&Dataset) -> T) -> Result<T, LendingError> {
        Ok(self.repository.read(f)?)
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Dataset) -> Result<T, LendingError>,
    ) -> Result<T, LendingError> {
        self.repository.write(f)?
    }

    fn publish(&self, event: LifecycleEvent) -> Result<(), LendingError> {
        self.events.publish(event)?;
        Ok(())
    }

    pub fn user(&self, id: UserId) -> Result<User, LendingError> {
        self.repository
            .read(|data| data.user(id).cloned())?
            .ok_or_else(|| LendingError::not_found("user", id.0))
    }

    pub fn customers_for(&self, user: &User) -> Result<Vec<Customer>, LendingError> {
        self.with_dataset(|data| {
            filter_customers_by_user(&data.customers, user)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn applications_for(&self, user: &User) -> Result<Vec<LoanApplication>, LendingError> {
        self.with_dataset(|data| {
            filter_applications_by_user(&data.applications, &data.customers, user)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn loans_for(&self, user: &User) -> Result<Vec<Loan>, LendingError> {
        self.with_dataset(|data| {
            filter_loans_by_user(&data.loans, &data.customers, user)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// Amortization schedule of a booked loan from its own terms.
    pub fn loan_schedule(&self, loan_id: LoanId) -> Result<Vec<AmortizationRow>, LendingError> {
        let loan = self
            .repository
            .read(|data| data.loan(loan_id).cloned())?
            .ok_or_else(|| LendingError::not_found("loan", loan_id.0))?;
        Ok(generate_amortization_schedule(
            loan.amount,
            loan.interest_rate,
            loan.tenure_months,
            loan.disbursement_date,
        ))
    }
}

pub(crate) fn find_loan(data: &Dataset, loan_id: LoanId) -> Result<&Loan, LendingError> {
    data.loan(loan_id)
        .ok_or_else(|| LendingError::not_found("loan", loan_id.0))
}

pub(crate) fn find_loan_mut(data: &mut Dataset, loan_id: LoanId) -> Result<&mut Loan, LendingError> {
    data.loans
        .iter_mut()
        .find(|loan| loan.id == loan_id)
        .ok_or_else(|| LendingError::not_found("loan", loan_id.0))
}

pub(crate) fn find_customer(data: &Dataset, id: CustomerId) -> Result<&Customer, LendingError> {
    data.customer(id)
        .ok_or_else(|| LendingError::not_found("customer", id.0))
}

pub(crate) fn find_product(data: &Dataset, id: ProductId) -> Result<&LoanProduct, LendingError> {
    data.products
        .iter()
        .find(|product| product.id == id)
        .ok_or_else(|| LendingError::not_found("product", id.0))
}

/// Product a loan was originated under, through its application.
pub(crate) fn product_for_loan<'a>(
    data: &'a Dataset,
    loan: &Loan,
) -> Result<&'a LoanProduct, LendingError> {
    let application = data
        .applications
        .iter()
        .find(|application| application.id == loan.application_id)
        .ok_or_else(|| LendingError::not_found("application", loan.application_id.0))?;
    find_product(data, application.product_id)
}

/// Rate overrides must be usable percentages.
pub(crate) fn ensure_rate(rate: f64) -> Result<f64, LendingError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(rate)
    } else {
        Err(LendingError::invalid(format!(
            "interest rate {rate} is not a non-negative percentage"
        )))
    }
}

pub(crate) fn ensure_active(loan: &Loan) -> Result<(), LendingError> {
    if loan.status == LoanStatus::Active {
        Ok(())
    } else {
        Err(LendingError::LoanNotActive {
            id: loan.id,
            status: loan.status,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LendingError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u32 },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    OutOfBounds(#[from] BoundViolation),
    #[error("customer is not eligible: {}", .0.summary())]
    Ineligible(Eligibility),
    #[error("application {id} cannot move from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("loan {id} is {}", .status.label())]
    LoanNotActive { id: LoanId, status: LoanStatus },
    #[error("top-up {0} has already been decided")]
    TopUpDecided(TopUpId),
    #[error("closure {0} is already closed")]
    ClosureFinalized(ClosureId),
    #[error("repayment {0} is not overdue")]
    NotOverdue(RepaymentId),
}

impl LendingError {
    pub(crate) fn not_found(entity: &'static str, id: u32) -> Self {
        LendingError::NotFound { entity, id }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LendingError::Invalid(message.into())
    }

    /// True when the request itself was malformed or breaks a product rule.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LendingError::Invalid(_) | LendingError::OutOfBounds(_) | LendingError::Ineligible(_)
        )
    }

    /// True when the target exists but is in the wrong state for the request.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            LendingError::InvalidTransition { .. }
                | LendingError::LoanNotActive { .. }
                | LendingError::TopUpDecided(_)
                | LendingError::ClosureFinalized(_)
                | LendingError::NotOverdue(_)
        )
    }
}
