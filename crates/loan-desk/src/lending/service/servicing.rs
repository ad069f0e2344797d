use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::drafts::{PaymentDraft, TopUpDraft};
use super::{ensure_active, ensure_rate, find_loan, find_loan_mut, LendingError, LendingService};
use crate::lending::domain::{
    Amount, ClosureId, ClosureStatus, EntrySide, Loan, LoanClosure, LoanId, LoanStatus,
    PaymentMode, Repayment, RepaymentId, RepaymentStatus, ScheduleStatus, TopUp, TopUpId,
    TopUpStatus, Voucher, VoucherId, VoucherKind,
};
use crate::lending::emi::{due_date_for, MAX_TENURE_MONTHS};
use crate::lending::events::{
    EventPublisher, LifecycleEvent, LOAN_CLOSED, PAYMENT_RECEIVED, TOP_UP_APPROVED,
};
use crate::lending::ledger::{
    post_installment, record_journal, record_transaction, InstallmentPayment, BALANCE_SETTLEMENT,
    FINAL_PRINCIPAL_PAYMENT, FINAL_SETTLEMENT,
};
use crate::lending::store::{Dataset, LendingRepository};

/// What a posted EMI payment did to the loan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmiReceipt {
    pub loan_id: LoanId,
    pub repayment_id: RepaymentId,
    pub voucher_id: VoucherId,
    pub installment_number: u32,
    pub principal: Amount,
    pub interest: Amount,
    pub outstanding: Amount,
}

fn paid_installments(data: &Dataset, loan_id: LoanId) -> u32 {
    data.repayments_for(loan_id)
        .filter(|repayment| repayment.status == RepaymentStatus::Paid)
        .count() as u32
}

/// Oldest overdue streak still open on the loan.
pub(crate) fn refresh_loan_overdue_days(data: &mut Dataset, loan_id: LoanId) {
    let worst = data
        .repayments_for(loan_id)
        .filter(|repayment| repayment.status == RepaymentStatus::Overdue)
        .map(|repayment| repayment.overdue_days)
        .max();
    if let Some(loan) = data.loans.iter_mut().find(|loan| loan.id == loan_id) {
        loan.overdue_days = worst;
    }
}

impl<R, P> LendingService<R, P>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    /// Collects the next installment on a reducing balance.
    ///
    /// Interest accrues on the principal still outstanding; the principal portion
    /// is whatever is left of the EMI, capped at the outstanding amount.
    pub fn pay_emi(
        &self,
        loan_id: LoanId,
        payment: PaymentDraft,
        now: DateTime<Utc>,
    ) -> Result<EmiReceipt, LendingError> {
        let today = now.date_naive();
        let receipt = self.mutate(|data| {
            let loan = find_loan(data, loan_id)?.clone();
            ensure_active(&loan)?;

            let outstanding = data.outstanding_principal(&loan);
            if outstanding <= 0 {
                return Err(LendingError::invalid(format!(
                    "loan {loan_id} has no outstanding principal"
                )));
            }
            let interest = (outstanding as f64 * loan.monthly_rate()).round() as Amount;
            let principal = (loan.emi - interest).clamp(0, outstanding);
            let installment_number = paid_installments(data, loan_id) + 1;

            let posted = post_installment(
                data,
                &loan,
                &InstallmentPayment {
                    installment_number,
                    due_date: due_date_for(loan.disbursement_date, installment_number),
                    paid_date: today,
                    principal,
                    interest,
                    payment_mode: payment.payment_mode,
                    collection_agent: payment.collection_agent,
                    remarks: payment.remarks,
                },
            );

            if let Some(entry) = data
                .collection_schedules
                .iter_mut()
                .filter(|entry| entry.loan_id == loan_id && entry.status != ScheduleStatus::Paid)
                .min_by_key(|entry| entry.due_date)
            {
                entry.status = ScheduleStatus::Paid;
                entry.overdue_days = 0;
            }

            refresh_loan_overdue_days(data, loan_id);
            if let Ok(stored) = find_loan_mut(data, loan_id) {
                stored.updated_at = now;
            }

            Ok(EmiReceipt {
                loan_id,
                repayment_id: posted.repayment_id,
                voucher_id: posted.voucher_id,
                installment_number,
                principal,
                interest,
                outstanding: outstanding - principal,
            })
        })?;

        tracing::info!(
            loan_id = %loan_id,
            installment = receipt.installment_number,
            principal = receipt.principal,
            interest = receipt.interest,
            outstanding = receipt.outstanding,
            "emi payment posted"
        );
        self.publish(
            LifecycleEvent::new(PAYMENT_RECEIVED, loan_id.0)
                .with("installment", receipt.installment_number)
                .with("amount", receipt.principal + receipt.interest),
        )?;
        Ok(receipt)
    }

    /// Opens a pending closure settling the outstanding principal.
    pub fn request_closure(
        &self,
        loan_id: LoanId,
        remarks: Option<String>,
        today: NaiveDate,
    ) -> Result<LoanClosure, LendingError> {
        self.mutate(|data| {
            let loan = find_loan(data, loan_id)?;
            if matches!(loan.status, LoanStatus::Closed | LoanStatus::PreClosed) {
                return Err(LendingError::LoanNotActive {
                    id: loan_id,
                    status: loan.status,
                });
            }
            let already_pending = data.closures.iter().any(|closure| {
                closure.loan_id == loan_id && closure.status == ClosureStatus::Pending
            });
            if already_pending {
                return Err(LendingError::invalid(format!(
                    "loan {loan_id} already has a pending closure"
                )));
            }

            let mut closure = LoanClosure {
                id: ClosureId(0),
                loan_id,
                closure_date: None,
                status: ClosureStatus::Pending,
                settlement_amount: data.outstanding_principal(loan).max(0),
                remarks,
                closed_by: None,
                request_date: today,
            };
            closure.id = data.insert_closure(closure.clone());
            Ok(closure)
        })
    }

    /// Settles whatever principal is left, squares the customer's ledger and
    /// closes the loan.
    pub fn finalize_closure(
        &self,
        closure_id: ClosureId,
        closed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<LoanClosure, LendingError> {
        let today = now.date_naive();
        let closure = self.mutate(|data| {
            let closure = data
                .closures
                .iter()
                .find(|closure| closure.id == closure_id)
                .cloned()
                .ok_or_else(|| LendingError::not_found("closure", closure_id.0))?;
            if closure.status == ClosureStatus::Closed {
                return Err(LendingError::ClosureFinalized(closure_id));
            }
            let loan = find_loan(data, closure.loan_id)?.clone();

            let outstanding = data.outstanding_principal(&loan);
            if outstanding > 0 {
                settle_outstanding(data, &loan, outstanding, today);
                square_ledger(data, &loan, today);
            }

            let stored_loan = find_loan_mut(data, loan.id)?;
            stored_loan.status = LoanStatus::Closed;
            stored_loan.overdue_days = None;
            stored_loan.updated_at = now;

            let stored = data
                .closures
                .iter_mut()
                .find(|closure| closure.id == closure_id)
                .ok_or_else(|| LendingError::not_found("closure", closure_id.0))?;
            stored.status = ClosureStatus::Closed;
            stored.closure_date = Some(today);
            stored.closed_by = Some(closed_by.to_string());
            Ok(stored.clone())
        })?;

        tracing::info!(
            closure_id = %closure_id,
            loan_id = %closure.loan_id,
            settlement = closure.settlement_amount,
            "loan closed"
        );
        self.publish(
            LifecycleEvent::new(LOAN_CLOSED, closure.loan_id.0)
                .with("closure_id", closure_id)
                .with("closed_by", closed_by),
        )?;
        Ok(closure)
    }

    pub fn request_top_up(
        &self,
        loan_id: LoanId,
        draft: TopUpDraft,
        today: NaiveDate,
    ) -> Result<TopUp, LendingError> {
        if draft.requested_amount <= 0 {
            return Err(LendingError::invalid("top-up amount must be positive"));
        }
        let tenure_months = draft
            .tenure_months
            .unwrap_or(self.config.top_up_tenure_months);
        if !(1..=MAX_TENURE_MONTHS).contains(&tenure_months) {
            return Err(LendingError::invalid(format!(
                "tenure must be between 1 and {MAX_TENURE_MONTHS} months"
            )));
        }
        let interest_rate = ensure_rate(
            draft
                .interest_rate
                .unwrap_or(self.config.top_up_interest_rate),
        )?;

        self.mutate(|data| {
            ensure_active(find_loan(data, loan_id)?)?;
            let mut top_up = TopUp {
                id: TopUpId(0),
                loan_id,
                requested_amount: draft.requested_amount,
                tenure_months,
                interest_rate,
                status: TopUpStatus::Requested,
                request_date: today,
                approved_date: None,
            };
            top_up.id = data.insert_top_up(top_up.clone());
            Ok(top_up)
        })
    }

    pub fn approve_top_up(
        &self,
        top_up_id: TopUpId,
        today: NaiveDate,
    ) -> Result<TopUp, LendingError> {
        let top_up = self.decide_top_up(top_up_id, TopUpStatus::Approved, today)?;
        self.publish(
            LifecycleEvent::new(TOP_UP_APPROVED, top_up.loan_id.0)
                .with("top_up_id", top_up_id)
                .with("amount", top_up.requested_amount),
        )?;
        Ok(top_up)
    }

    pub fn reject_top_up(
        &self,
        top_up_id: TopUpId,
        today: NaiveDate,
    ) -> Result<TopUp, LendingError> {
        self.decide_top_up(top_up_id, TopUpStatus::Rejected, today)
    }

    fn decide_top_up(
        &self,
        top_up_id: TopUpId,
        decision: TopUpStatus,
        today: NaiveDate,
    ) -> Result<TopUp, LendingError> {
        let top_up = self.mutate(|data| {
            let top_up = data
                .top_ups
                .iter_mut()
                .find(|top_up| top_up.id == top_up_id)
                .ok_or_else(|| LendingError::not_found("top-up", top_up_id.0))?;
            if top_up.status != TopUpStatus::Requested {
                return Err(LendingError::TopUpDecided(top_up_id));
            }
            top_up.status = decision;
            if decision == TopUpStatus::Approved {
                top_up.approved_date = Some(today);
            }
            Ok(top_up.clone())
        })?;
        tracing::info!(top_up_id = %top_up_id, decision = ?decision, "top-up decided");
        Ok(top_up)
    }
}

/// Final bank-transfer payment covering the remaining principal.
///
/// The earliest open installment takes the settlement. Later open installments
/// stay on file as paid with nothing collected against them.
fn settle_outstanding(data: &mut Dataset, loan: &Loan, outstanding: Amount, today: NaiveDate) {
    let reference = format!("LOAN-{}-CLOSURE", loan.id);
    let voucher_id = data.insert_voucher(Voucher {
        id: VoucherId(0),
        kind: VoucherKind::Receipt,
        amount: outstanding,
        note: FINAL_SETTLEMENT.to_string(),
        loan_id: Some(loan.id),
        customer_id: Some(loan.customer_id),
        reference_id: Some(reference.clone()),
        category: Some("Closure".to_string()),
        date: today,
    });

    let settlement = Repayment {
        id: RepaymentId(0),
        loan_id: loan.id,
        installment_number: paid_installments(data, loan.id) + 1,
        due_date: today,
        paid_date: Some(today),
        paid_amount: outstanding,
        expected_amount: outstanding,
        principal_amount: outstanding,
        interest_amount: 0,
        payment_mode: PaymentMode::BankTransfer,
        is_advance_payment: false,
        status: RepaymentStatus::Paid,
        overdue_days: 0,
        collection_agent: None,
        remarks: Some(FINAL_SETTLEMENT.to_string()),
    };
    let mut open: Vec<(u32, RepaymentId)> = data
        .repayments_for(loan.id)
        .filter(|repayment| repayment.status != RepaymentStatus::Paid)
        .map(|repayment| (repayment.installment_number, repayment.id))
        .collect();
    open.sort_unstable();
    match open.split_first() {
        Some((&(_, first_id), later)) => {
            if let Some(first) = data.repayments.iter_mut().find(|r| r.id == first_id) {
                *first = Repayment {
                    id: first.id,
                    installment_number: first.installment_number,
                    due_date: first.due_date,
                    ..settlement
                };
            }
            for repayment in data
                .repayments
                .iter_mut()
                .filter(|r| later.iter().any(|&(_, id)| id == r.id))
            {
                repayment.status = RepaymentStatus::Paid;
                repayment.paid_date = Some(today);
                repayment.paid_amount = 0;
                repayment.principal_amount = 0;
                repayment.interest_amount = 0;
                repayment.overdue_days = 0;
                repayment.remarks = Some(FINAL_SETTLEMENT.to_string());
            }
        }
        None => {
            data.insert_repayment(settlement);
        }
    }

    for entry in data
        .collection_schedules
        .iter_mut()
        .filter(|entry| entry.loan_id == loan.id && entry.status != ScheduleStatus::Paid)
    {
        entry.status = ScheduleStatus::Paid;
        entry.overdue_days = 0;
    }

    record_transaction(
        data,
        loan,
        FINAL_SETTLEMENT,
        outstanding,
        EntrySide::Credit,
        today,
        &voucher_id.to_string(),
    );
    record_journal(
        data,
        FINAL_PRINCIPAL_PAYMENT,
        Some(loan.id),
        outstanding,
        EntrySide::Debit,
        &reference,
        today,
    );
}

/// Debits whatever credit the customer's ledger still carries after settlement.
fn square_ledger(data: &mut Dataset, loan: &Loan, today: NaiveDate) {
    let balance = data.customer_ledger_balance(loan.customer_id);
    if balance <= 0 {
        return;
    }
    let reference = format!("LOAN-{}-CLOSURE", loan.id);
    record_transaction(
        data,
        loan,
        BALANCE_SETTLEMENT,
        balance,
        EntrySide::Debit,
        today,
        &reference,
    );
    record_journal(
        data,
        BALANCE_SETTLEMENT,
        Some(loan.id),
        balance,
        EntrySide::Debit,
        &reference,
        today,
    );
}
