//! Double-entry postings shared by the workflows and the demo seed.

use chrono::NaiveDate;

use super::domain::{
    Amount, CustomerId, EntrySide, Journal, JournalId, Loan, LoanId, PaymentMode, Repayment,
    RepaymentId, RepaymentStatus, Transaction, TransactionId, Voucher, VoucherId, VoucherKind,
};
use super::store::Dataset;

pub const EMI_PAYMENT: &str = "EMI Payment";
pub const EMI_PRINCIPAL_PAYMENT: &str = "EMI Principal Payment";
pub const INTEREST_ACCRUED: &str = "Interest Accrued";
pub const PRINCIPAL_REDUCTION: &str = "Principal Reduction";
pub const FINAL_SETTLEMENT: &str = "Final Settlement Payment - Loan Closure";
pub const FINAL_PRINCIPAL_PAYMENT: &str = "Final Principal Payment - Loan Closure";
pub const BALANCE_SETTLEMENT: &str = "Balance Settlement - Loan Closure";
pub const LOAN_DISBURSEMENT: &str = "Loan Disbursement";

/// An installment collected against a loan.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentPayment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub paid_date: NaiveDate,
    pub principal: Amount,
    pub interest: Amount,
    pub payment_mode: PaymentMode,
    pub collection_agent: Option<String>,
    pub remarks: Option<String>,
}

impl InstallmentPayment {
    pub fn total(&self) -> Amount {
        self.principal + self.interest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedInstallment {
    pub repayment_id: RepaymentId,
    pub voucher_id: VoucherId,
}

/// Books a collected installment: receipt voucher, paid repayment, the principal
/// and interest credits on the customer's ledger, and the matching journals.
///
/// An open (pending or overdue) row for the same installment is settled in place
/// and keeps its id, so penalties raised against it still resolve.
pub fn post_installment(
    data: &mut Dataset,
    loan: &Loan,
    payment: &InstallmentPayment,
) -> PostedInstallment {
    let reference = installment_reference(loan.id, payment.installment_number);

    let voucher_id = data.insert_voucher(Voucher {
        id: VoucherId(0),
        kind: VoucherKind::Receipt,
        amount: payment.total(),
        note: EMI_PAYMENT.to_string(),
        loan_id: Some(loan.id),
        customer_id: Some(loan.customer_id),
        reference_id: Some(reference.clone()),
        category: Some("EMI".to_string()),
        date: payment.paid_date,
    });

    let settled = Repayment {
        id: RepaymentId(0),
        loan_id: loan.id,
        installment_number: payment.installment_number,
        due_date: payment.due_date,
        paid_date: Some(payment.paid_date),
        paid_amount: payment.total(),
        expected_amount: loan.emi,
        principal_amount: payment.principal,
        interest_amount: payment.interest,
        payment_mode: payment.payment_mode,
        is_advance_payment: payment.paid_date < payment.due_date,
        status: RepaymentStatus::Paid,
        overdue_days: 0,
        collection_agent: payment.collection_agent.clone(),
        remarks: payment.remarks.clone(),
    };
    let repayment_id = match open_repayment(data, loan.id, payment.installment_number) {
        Some(open) => {
            let id = open.id;
            *open = Repayment { id, ..settled };
            id
        }
        None => data.insert_repayment(settled),
    };

    let voucher_ref = voucher_id.to_string();
    record_transaction(
        data,
        loan,
        EMI_PRINCIPAL_PAYMENT,
        payment.principal,
        EntrySide::Credit,
        payment.paid_date,
        &voucher_ref,
    );
    record_transaction(
        data,
        loan,
        INTEREST_ACCRUED,
        payment.interest,
        EntrySide::Credit,
        payment.paid_date,
        &voucher_ref,
    );
    record_journal(
        data,
        INTEREST_ACCRUED,
        Some(loan.id),
        payment.interest,
        EntrySide::Credit,
        &reference,
        payment.paid_date,
    );
    record_journal(
        data,
        PRINCIPAL_REDUCTION,
        Some(loan.id),
        payment.principal,
        EntrySide::Debit,
        &reference,
        payment.paid_date,
    );

    PostedInstallment {
        repayment_id,
        voucher_id,
    }
}

fn open_repayment(
    data: &mut Dataset,
    loan_id: LoanId,
    installment_number: u32,
) -> Option<&mut Repayment> {
    data.repayments.iter_mut().find(|repayment| {
        repayment.loan_id == loan_id
            && repayment.installment_number == installment_number
            && repayment.status != RepaymentStatus::Paid
    })
}

/// Pays out a freshly approved loan and books it on the customer's ledger.
pub fn post_disbursement(data: &mut Dataset, loan: &Loan, processing_fee: Amount) -> VoucherId {
    let reference = format!("LOAN-{}-DISB", loan.id);
    let voucher_id = data.insert_voucher(Voucher {
        id: VoucherId(0),
        kind: VoucherKind::Payment,
        amount: loan.amount,
        note: LOAN_DISBURSEMENT.to_string(),
        loan_id: Some(loan.id),
        customer_id: Some(loan.customer_id),
        reference_id: Some(reference.clone()),
        category: Some("Disbursement".to_string()),
        date: loan.disbursement_date,
    });
    record_transaction(
        data,
        loan,
        LOAN_DISBURSEMENT,
        loan.amount,
        EntrySide::Debit,
        loan.disbursement_date,
        &voucher_id.to_string(),
    );

    if processing_fee > 0 {
        data.insert_voucher(Voucher {
            id: VoucherId(0),
            kind: VoucherKind::Receipt,
            amount: processing_fee,
            note: "Processing Fee".to_string(),
            loan_id: Some(loan.id),
            customer_id: Some(loan.customer_id),
            reference_id: Some(reference),
            category: Some("Processing Fee".to_string()),
            date: loan.disbursement_date,
        });
    }

    voucher_id
}

pub(crate) fn record_transaction(
    data: &mut Dataset,
    loan: &Loan,
    description: &str,
    amount: Amount,
    side: EntrySide,
    date: NaiveDate,
    reference: &str,
) -> TransactionId {
    data.insert_transaction(Transaction {
        id: TransactionId(0),
        customer_id: Some(loan.customer_id),
        loan_id: Some(loan.id),
        description: description.to_string(),
        amount,
        side,
        date,
        reference_id: Some(reference.to_string()),
    })
}

pub(crate) fn record_journal(
    data: &mut Dataset,
    entry: &str,
    loan_id: Option<LoanId>,
    amount: Amount,
    side: EntrySide,
    reference: &str,
    date: NaiveDate,
) -> JournalId {
    data.insert_journal(Journal {
        id: JournalId(0),
        entry: entry.to_string(),
        loan_id,
        amount,
        side,
        reference_id: Some(reference.to_string()),
        category: Some("Loan".to_string()),
        date,
    })
}

/// Side a voucher lands on in the customer's ledger.
pub fn mirror_side(kind: VoucherKind) -> EntrySide {
    match kind {
        VoucherKind::Receipt => EntrySide::Credit,
        VoucherKind::Payment => EntrySide::Debit,
    }
}

/// Mirrors a standalone voucher onto the ledger of the customer it names.
pub(crate) fn mirror_voucher(data: &mut Dataset, voucher: &Voucher) -> TransactionId {
    let customer_id: Option<CustomerId> = voucher.customer_id.or_else(|| {
        voucher
            .loan_id
            .and_then(|loan_id| data.loan(loan_id))
            .map(|loan| loan.customer_id)
    });
    data.insert_transaction(Transaction {
        id: TransactionId(0),
        customer_id,
        loan_id: voucher.loan_id,
        description: voucher.note.clone(),
        amount: voucher.amount,
        side: mirror_side(voucher.kind),
        date: voucher.date,
        reference_id: Some(voucher.id.to_string()),
    })
}

pub fn installment_reference(loan_id: LoanId, installment_number: u32) -> String {
    format!("LOAN-{loan_id}-EMI-{installment_number}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan_without_history() -> (Dataset, Loan) {
        let mut data = Dataset::demo();
        let loan = data.loans[0].clone();
        data.repayments.clear();
        data.vouchers.clear();
        data.journals.clear();
        data.transactions.clear();
        (data, loan)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).expect("valid")
    }

    #[test]
    fn installment_posting_writes_every_satellite_record() {
        let (mut data, loan) = loan_without_history();
        let payment = InstallmentPayment {
            installment_number: 1,
            due_date: date(1),
            paid_date: date(1),
            principal: 7_885,
            interest: 1_000,
            payment_mode: PaymentMode::Upi,
            collection_agent: None,
            remarks: None,
        };

        let posted = post_installment(&mut data, &loan, &payment);

        assert_eq!(data.vouchers.len(), 1);
        assert_eq!(data.vouchers[0].id, posted.voucher_id);
        assert_eq!(data.vouchers[0].amount, 8_885);
        assert_eq!(data.repayments.len(), 1);
        assert_eq!(data.repayments[0].status, RepaymentStatus::Paid);
        assert!(!data.repayments[0].is_advance_payment);
        assert_eq!(data.transactions.len(), 2);
        assert!(data
            .transactions
            .iter()
            .all(|t| t.side == EntrySide::Credit && t.customer_id == Some(loan.customer_id)));
        let entries: Vec<_> = data.journals.iter().map(|j| (j.entry.as_str(), j.side)).collect();
        assert_eq!(
            entries,
            vec![
                (INTEREST_ACCRUED, EntrySide::Credit),
                (PRINCIPAL_REDUCTION, EntrySide::Debit)
            ]
        );
    }

    #[test]
    fn early_payment_is_flagged_as_advance() {
        let (mut data, loan) = loan_without_history();
        let payment = InstallmentPayment {
            installment_number: 1,
            due_date: date(15),
            paid_date: date(2),
            principal: 100,
            interest: 10,
            payment_mode: PaymentMode::Cash,
            collection_agent: Some("Kiran Desai".to_string()),
            remarks: None,
        };
        post_installment(&mut data, &loan, &payment);
        assert!(data.repayments[0].is_advance_payment);
    }

    #[test]
    fn overdue_row_is_settled_in_place() {
        let (mut data, loan) = loan_without_history();
        let overdue_id = data.insert_repayment(Repayment {
            id: RepaymentId(0),
            loan_id: loan.id,
            installment_number: 1,
            due_date: date(1),
            paid_date: None,
            paid_amount: 0,
            expected_amount: loan.emi,
            principal_amount: 0,
            interest_amount: 0,
            payment_mode: PaymentMode::Cash,
            is_advance_payment: false,
            status: RepaymentStatus::Overdue,
            overdue_days: 20,
            collection_agent: None,
            remarks: None,
        });

        let posted = post_installment(
            &mut data,
            &loan,
            &InstallmentPayment {
                installment_number: 1,
                due_date: date(1),
                paid_date: date(21),
                principal: 7_885,
                interest: 1_000,
                payment_mode: PaymentMode::Upi,
                collection_agent: None,
                remarks: None,
            },
        );

        assert_eq!(posted.repayment_id, overdue_id);
        assert_eq!(data.repayments.len(), 1);
        let settled = &data.repayments[0];
        assert_eq!(settled.status, RepaymentStatus::Paid);
        assert_eq!(settled.overdue_days, 0);
        assert_eq!(settled.paid_amount, 8_885);
        assert_eq!(settled.paid_date, Some(date(21)));
    }

    #[test]
    fn voucher_mirror_follows_kind() {
        assert_eq!(mirror_side(VoucherKind::Receipt), EntrySide::Credit);
        assert_eq!(mirror_side(VoucherKind::Payment), EntrySide::Debit);
    }
}
