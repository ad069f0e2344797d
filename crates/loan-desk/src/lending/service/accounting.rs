use super::drafts::{JournalDraft, VoucherDraft};
use super::{find_customer, find_loan, LendingError, LendingService};
use crate::lending::domain::{Amount, CustomerId, Journal, JournalId, Voucher, VoucherId};
use crate::lending::events::EventPublisher;
use crate::lending::ledger::mirror_voucher;
use crate::lending::store::LendingRepository;

impl<R, P> LendingService<R, P>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    /// Records a voucher and mirrors it onto the customer ledger.
    pub fn create_voucher(&self, draft: VoucherDraft) -> Result<Voucher, LendingError> {
        if draft.amount <= 0 {
            return Err(LendingError::invalid("voucher amount must be positive"));
        }
        if draft.note.trim().is_empty() {
            return Err(LendingError::invalid("voucher note is required"));
        }
        let voucher = self.mutate(|data| {
            if let Some(loan_id) = draft.loan_id {
                find_loan(data, loan_id)?;
            }
            if let Some(customer_id) = draft.customer_id {
                find_customer(data, customer_id)?;
            }
            let mut voucher = Voucher {
                id: VoucherId(0),
                kind: draft.kind,
                amount: draft.amount,
                note: draft.note,
                loan_id: draft.loan_id,
                customer_id: draft.customer_id,
                reference_id: draft.reference_id,
                category: draft.category,
                date: draft.date,
            };
            voucher.id = data.insert_voucher(voucher.clone());
            mirror_voucher(data, &voucher);
            Ok(voucher)
        })?;
        tracing::info!(
            voucher_id = %voucher.id,
            kind = ?voucher.kind,
            amount = voucher.amount,
            "voucher recorded"
        );
        Ok(voucher)
    }

    pub fn create_journal(&self, draft: JournalDraft) -> Result<Journal, LendingError> {
        if draft.amount <= 0 {
            return Err(LendingError::invalid("journal amount must be positive"));
        }
        if draft.entry.trim().is_empty() {
            return Err(LendingError::invalid("journal entry is required"));
        }
        self.mutate(|data| {
            if let Some(loan_id) = draft.loan_id {
                find_loan(data, loan_id)?;
            }
            let mut journal = Journal {
                id: JournalId(0),
                entry: draft.entry,
                loan_id: draft.loan_id,
                amount: draft.amount,
                side: draft.side,
                reference_id: draft.reference_id,
                category: draft.category,
                date: draft.date,
            };
            journal.id = data.insert_journal(journal.clone());
            Ok(journal)
        })
    }

    /// Credits minus debits on the customer's ledger.
    pub fn customer_ledger_balance(&self, customer_id: CustomerId) -> Result<Amount, LendingError> {
        self.repository.read(|data| -> Result<Amount, LendingError> {
            find_customer(data, customer_id)?;
            Ok(data.customer_ledger_balance(customer_id))
        })?
    }
}
