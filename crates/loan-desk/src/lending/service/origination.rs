use chrono::{DateTime, Utc};
use serde::Serialize;

use super::drafts::ApplicationDraft;
use super::{ensure_rate, find_customer, find_product, LendingError, LendingService};
use crate::lending::domain::{
    AmortizationType, ApplicationId, ApplicationStatus, CollectionPriority, CollectionSchedule,
    Loan, LoanApplication, LoanId, LoanStatus, RecordStatus, ScheduleId, ScheduleStatus,
};
use crate::lending::emi::{generate_amortization_schedule, level_installment};
use crate::lending::events::{EventPublisher, LifecycleEvent, LOAN_DISBURSED};
use crate::lending::ledger::post_disbursement;
use crate::lending::products::{
    check_customer_eligibility, processing_fee, validate_loan_amount, validate_loan_tenure,
};
use crate::lending::store::{Dataset, LendingRepository};

/// Result of a status change; approval also books the loan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationOutcome {
    pub application: LoanApplication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan: Option<Loan>,
}

impl<R, P> LendingService<R, P>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    /// Captures a new application as a draft after product and eligibility checks.
    pub fn create_application(
        &self,
        draft: ApplicationDraft,
        now: DateTime<Utc>,
    ) -> Result<LoanApplication, LendingError> {
        if draft.purpose.trim().is_empty() {
            return Err(LendingError::invalid("purpose is required"));
        }
        if draft.amount <= 0 {
            return Err(LendingError::invalid("amount must be positive"));
        }
        if draft.tenure_months == 0 {
            return Err(LendingError::invalid("tenure must be at least one month"));
        }
        let rate_override = draft.interest_rate.map(ensure_rate).transpose()?;

        let application = self.mutate(|data| {
            let customer = find_customer(data, draft.customer_id)?;
            let product = find_product(data, draft.product_id)?;
            if product.status != RecordStatus::Active {
                return Err(LendingError::invalid(format!(
                    "product {} is not active",
                    product.code
                )));
            }
            for related in draft.co_applicant_ids.iter().chain(&draft.guarantor_ids) {
                if *related == draft.customer_id {
                    return Err(LendingError::invalid(
                        "the applicant cannot also be a co-applicant or guarantor",
                    ));
                }
                find_customer(data, *related)?;
            }

            validate_loan_amount(product, draft.amount)?;
            validate_loan_tenure(product, draft.tenure_months)?;
            let eligibility = check_customer_eligibility(product, customer, now.date_naive());
            if !eligibility.is_eligible() {
                return Err(LendingError::Ineligible(eligibility));
            }

            let mut application = LoanApplication {
                id: ApplicationId(0),
                customer_id: draft.customer_id,
                co_applicant_ids: draft.co_applicant_ids,
                guarantor_ids: draft.guarantor_ids,
                amount: draft.amount,
                product_id: product.id,
                product: product.name.clone(),
                purpose: draft.purpose.trim().to_string(),
                interest_rate: rate_override.unwrap_or(product.interest_rate),
                tenure_months: draft.tenure_months,
                repayment_frequency: draft.repayment_frequency,
                status: ApplicationStatus::Draft,
                remarks: None,
                documents: draft.documents,
                created_at: now,
                updated_at: now,
            };
            application.id = data.insert_application(application.clone());
            Ok(application)
        })?;

        tracing::info!(
            application_id = %application.id,
            customer_id = %application.customer_id,
            amount = application.amount,
            "application created"
        );
        Ok(application)
    }

    /// Moves an application one step along its lifecycle. Approval disburses the
    /// loan and lays out its collection schedule.
    pub fn transition_application(
        &self,
        application_id: ApplicationId,
        next: ApplicationStatus,
        remarks: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationOutcome, LendingError> {
        let outcome = self.mutate(|data| {
            let current = data
                .applications
                .iter()
                .find(|application| application.id == application_id)
                .cloned()
                .ok_or_else(|| LendingError::not_found("application", application_id.0))?;
            if !current.status.can_transition_to(next) {
                tracing::warn!(
                    application_id = %application_id,
                    from = current.status.label(),
                    to = next.label(),
                    "rejected application transition"
                );
                return Err(LendingError::InvalidTransition {
                    id: application_id,
                    from: current.status,
                    to: next,
                });
            }

            let loan = if next == ApplicationStatus::Approved {
                Some(book_loan(data, current, now)?)
            } else {
                None
            };

            let application = data
                .applications
                .iter_mut()
                .find(|application| application.id == application_id)
                .ok_or_else(|| LendingError::not_found("application", application_id.0))?;
            application.status = next;
            application.updated_at = now;
            if remarks.is_some() {
                application.remarks = remarks;
            }

            Ok(ApplicationOutcome {
                application: application.clone(),
                loan,
            })
        })?;

        tracing::info!(
            application_id = %application_id,
            status = next.label(),
            "application status updated"
        );

        if let Some(loan) = &outcome.loan {
            tracing::info!(
                loan_id = %loan.id,
                amount = loan.amount,
                emi = loan.emi,
                "loan disbursed"
            );
            self.publish(
                LifecycleEvent::new(LOAN_DISBURSED, loan.id.0)
                    .with("application_id", application_id)
                    .with("amount", loan.amount)
                    .with("emi", loan.emi),
            )?;
        }

        Ok(outcome)
    }
}

/// Creates the loan for an approved application together with its disbursement
/// postings and one upcoming collection entry per installment.
fn book_loan(
    data: &mut Dataset,
    application: LoanApplication,
    now: DateTime<Utc>,
) -> Result<Loan, LendingError> {
    let fee = processing_fee(find_product(data, application.product_id)?, application.amount);
    let today = now.date_naive();

    let mut loan = Loan {
        id: LoanId(0),
        customer_id: application.customer_id,
        application_id: application.id,
        amount: application.amount,
        interest_rate: application.interest_rate,
        tenure_months: application.tenure_months,
        emi: level_installment(
            application.amount,
            application.interest_rate,
            application.tenure_months,
        ),
        disbursement_date: today,
        grace_period_days: 0,
        repayment_frequency: application.repayment_frequency,
        amortization_type: AmortizationType::Emi,
        overdue_days: None,
        status: LoanStatus::Active,
        co_applicant_ids: application.co_applicant_ids,
        guarantor_ids: application.guarantor_ids,
        created_at: now,
        updated_at: now,
    };
    loan.id = data.insert_loan(loan.clone());
    post_disbursement(data, &loan, fee);

    let rows =
        generate_amortization_schedule(loan.amount, loan.interest_rate, loan.tenure_months, today);
    for row in rows {
        data.insert_schedule(CollectionSchedule {
            id: ScheduleId(0),
            loan_id: loan.id,
            customer_id: loan.customer_id,
            due_date: row.due_date,
            emi_amount: row.emi,
            status: ScheduleStatus::Upcoming,
            overdue_days: 0,
            collection_agent: None,
            last_reminder_date: None,
            next_reminder_date: Some(row.due_date),
            priority: CollectionPriority::Low,
        });
    }

    Ok(loan)
}
