use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::servicing::refresh_loan_overdue_days;
use super::{find_loan, product_for_loan, LendingError, LendingService};
use crate::lending::domain::{
    CalculationMethod, CollectionPriority, LoanId, Penalty, PenaltyId, PenaltyType, RepaymentId,
    RepaymentStatus, ScheduleStatus,
};
use crate::lending::events::EventPublisher;
use crate::lending::products::late_payment_penalty;
use crate::lending::store::{Dataset, LendingRepository};

/// Counts of records whose status moved during a refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionRefresh {
    pub schedules_due: usize,
    pub schedules_overdue: usize,
    pub repayments_overdue: usize,
}

fn days_between(earlier: NaiveDate, later: NaiveDate) -> u32 {
    (later - earlier).num_days().max(0) as u32
}

/// Re-derives collection and repayment statuses as of `today`.
pub(crate) fn refresh_statuses(data: &mut Dataset, today: NaiveDate) -> CollectionRefresh {
    let mut refresh = CollectionRefresh::default();
    let mut touched = BTreeSet::new();

    for entry in data
        .collection_schedules
        .iter_mut()
        .filter(|entry| !matches!(entry.status, ScheduleStatus::Paid | ScheduleStatus::Partial))
    {
        if entry.due_date == today {
            entry.status = ScheduleStatus::Due;
            entry.overdue_days = 0;
            refresh.schedules_due += 1;
        } else if entry.due_date < today {
            entry.status = ScheduleStatus::Overdue;
            entry.overdue_days = days_between(entry.due_date, today);
            entry.priority = CollectionPriority::for_overdue_days(entry.overdue_days);
            refresh.schedules_overdue += 1;
        }
    }

    for repayment in data.repayments.iter_mut().filter(|repayment| {
        matches!(
            repayment.status,
            RepaymentStatus::Pending | RepaymentStatus::Overdue
        ) && repayment.due_date < today
    }) {
        if repayment.status == RepaymentStatus::Pending {
            refresh.repayments_overdue += 1;
        }
        repayment.status = RepaymentStatus::Overdue;
        repayment.overdue_days = days_between(repayment.due_date, today);
        touched.insert(repayment.loan_id);
    }

    for loan_id in touched {
        refresh_loan_overdue_days(data, loan_id);
    }
    refresh
}

impl<R, P> LendingService<R, P>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    /// Puts every collection entry of a loan with one agent at one priority.
    pub fn assign_collection_agent(
        &self,
        loan_id: LoanId,
        agent: &str,
        priority: CollectionPriority,
    ) -> Result<usize, LendingError> {
        let agent = agent.trim();
        if agent.is_empty() {
            return Err(LendingError::invalid("collection agent is required"));
        }
        let assigned = self.mutate(|data| {
            find_loan(data, loan_id)?;
            let mut assigned = 0;
            for entry in data
                .collection_schedules
                .iter_mut()
                .filter(|entry| entry.loan_id == loan_id)
            {
                entry.collection_agent = Some(agent.to_string());
                entry.priority = priority;
                assigned += 1;
            }
            Ok(assigned)
        })?;
        tracing::info!(loan_id = %loan_id, agent, assigned, "collection agent assigned");
        Ok(assigned)
    }

    pub fn refresh_collection_statuses(
        &self,
        today: NaiveDate,
    ) -> Result<CollectionRefresh, LendingError> {
        let refresh = self.mutate(|data| Ok(refresh_statuses(data, today)))?;
        tracing::info!(
            as_of = %today,
            due = refresh.schedules_due,
            overdue = refresh.schedules_overdue,
            newly_overdue_repayments = refresh.repayments_overdue,
            "collection statuses refreshed"
        );
        Ok(refresh)
    }

    /// Charges the product's late-payment percentage on an overdue installment.
    pub fn assess_late_penalty(
        &self,
        repayment_id: RepaymentId,
        today: NaiveDate,
    ) -> Result<Penalty, LendingError> {
        let penalty = self.mutate(|data| {
            let repayment = data
                .repayments
                .iter()
                .find(|repayment| repayment.id == repayment_id)
                .ok_or_else(|| LendingError::not_found("repayment", repayment_id.0))?;
            if repayment.status != RepaymentStatus::Overdue {
                return Err(LendingError::NotOverdue(repayment_id));
            }
            let loan = find_loan(data, repayment.loan_id)?;
            let product = product_for_loan(data, loan)?;

            let mut penalty = Penalty {
                id: PenaltyId(0),
                loan_id: loan.id,
                repayment_id: Some(repayment_id),
                date: today,
                amount: late_payment_penalty(product, repayment.expected_amount),
                reason: format!(
                    "Late payment on installment {} ({} days overdue)",
                    repayment.installment_number, repayment.overdue_days
                ),
                penalty_type: PenaltyType::LatePayment,
                calculation_method: CalculationMethod::Percentage,
            };
            penalty.id = data.insert_penalty(penalty.clone());
            Ok(penalty)
        })?;
        tracing::info!(
            penalty_id = %penalty.id,
            loan_id = %penalty.loan_id,
            amount = penalty.amount,
            "late payment penalty assessed"
        );
        Ok(penalty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::store::demo_as_of;

    #[test]
    fn refresh_is_idempotent_for_the_same_day() {
        let mut data = Dataset::demo();
        let first = refresh_statuses(&mut data, demo_as_of());
        let snapshot = data.clone();
        let second = refresh_statuses(&mut data, demo_as_of());
        assert_eq!(data, snapshot);
        assert_eq!(second.repayments_overdue, 0);
        assert_eq!(first.schedules_due, second.schedules_due);
    }

    #[test]
    fn later_refresh_ages_pending_installments() {
        let mut data = Dataset::demo();
        let later = demo_as_of() + chrono::Days::new(20);
        let refresh = refresh_statuses(&mut data, later);
        assert!(refresh.repayments_overdue >= 1);
        let loan_one_overdue = data
            .repayments
            .iter()
            .find(|r| r.loan_id == LoanId(1) && r.status == RepaymentStatus::Overdue)
            .expect("pending installment became overdue");
        assert_eq!(loan_one_overdue.overdue_days, 20);
        assert_eq!(data.loan(LoanId(1)).and_then(|l| l.overdue_days), Some(20));
    }
}
