//! The shared lending dataset and the repository seam in front of it.

mod seed;

pub use seed::demo_as_of;

use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::domain::{
    Address, AddressId, ApplicationId, ClosureId, CollectionSchedule, Customer, CustomerId,
    Journal, JournalId, Loan, LoanApplication, LoanClosure, LoanId, LoanProduct, Partner,
    PartnerId, Penalty, PenaltyId, ProductId, Repayment, RepaymentId, RepaymentStatus,
    ScheduleId, TopUp, TopUpId, Transaction, TransactionId, User, UserId, Voucher, VoucherId,
};
use super::domain::{Amount, EntrySide};

/// Every collection the back office works with. Relations are plain ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub partners: Vec<Partner>,
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    pub addresses: Vec<Address>,
    pub products: Vec<LoanProduct>,
    pub applications: Vec<LoanApplication>,
    pub loans: Vec<Loan>,
    pub repayments: Vec<Repayment>,
    pub collection_schedules: Vec<CollectionSchedule>,
    pub penalties: Vec<Penalty>,
    pub top_ups: Vec<TopUp>,
    pub closures: Vec<LoanClosure>,
    pub vouchers: Vec<Voucher>,
    pub journals: Vec<Journal>,
    pub transactions: Vec<Transaction>,
}

/// `max(existing) + 1`, starting from 1.
pub(crate) fn next_id<T>(items: &[T], id_of: impl Fn(&T) -> u32) -> u32 {
    items.iter().map(id_of).max().unwrap_or(0) + 1
}

/// Generates `Dataset::insert_*` methods that assign the next id and append.
macro_rules! inserter {
    ($($method:ident => $field:ident: $record:ty, $id:ident;)+) => {
        impl Dataset {
            $(
                pub fn $method(&mut self, mut record: $record) -> $id {
                    record.id = $id(next_id(&self.$field, |existing| existing.id.0));
                    let id = record.id;
                    self.$field.push(record);
                    id
                }
            )+
        }
    };
}

inserter! {
    insert_partner => partners: Partner, PartnerId;
    insert_customer => customers: Customer, CustomerId;
    insert_address => addresses: Address, AddressId;
    insert_product => products: LoanProduct, ProductId;
    insert_application => applications: LoanApplication, ApplicationId;
    insert_loan => loans: Loan, LoanId;
    insert_repayment => repayments: Repayment, RepaymentId;
    insert_schedule => collection_schedules: CollectionSchedule, ScheduleId;
    insert_penalty => penalties: Penalty, PenaltyId;
    insert_top_up => top_ups: TopUp, TopUpId;
    insert_closure => closures: LoanClosure, ClosureId;
    insert_voucher => vouchers: Voucher, VoucherId;
    insert_journal => journals: Journal, JournalId;
    insert_transaction => transactions: Transaction, TransactionId;
}

impl Dataset {
    /// Small multi-partner portfolio used by the demo command and tests.
    pub fn demo() -> Self {
        seed::demo_dataset()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|customer| customer.id == id)
    }

    pub fn loan(&self, id: LoanId) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == id)
    }

    pub fn repayments_for(&self, loan_id: LoanId) -> impl Iterator<Item = &Repayment> {
        self.repayments
            .iter()
            .filter(move |repayment| repayment.loan_id == loan_id)
    }

    /// Principal not yet covered by paid installments.
    pub fn outstanding_principal(&self, loan: &Loan) -> Amount {
        let repaid: Amount = self
            .repayments_for(loan.id)
            .filter(|repayment| repayment.status == RepaymentStatus::Paid)
            .map(|repayment| repayment.principal_amount)
            .sum();
        loan.amount - repaid
    }

    /// Credits minus debits across the customer's ledger transactions.
    pub fn customer_ledger_balance(&self, customer_id: CustomerId) -> Amount {
        self.transactions
            .iter()
            .filter(|transaction| transaction.customer_id == Some(customer_id))
            .map(|transaction| match transaction.side {
                EntrySide::Credit => transaction.amount,
                EntrySide::Debit => -transaction.amount,
            })
            .sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed dataset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage abstraction so workflows can run against any backing store.
///
/// Closures run while the store is held exclusively; callers validate before
/// they mutate inside `write`.
pub trait LendingRepository: Send + Sync {
    fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> Result<T, RepositoryError>;
    fn write<T>(&self, f: impl FnOnce(&mut Dataset) -> T) -> Result<T, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryLendingRepository {
    dataset: Arc<Mutex<Dataset>>,
}

impl InMemoryLendingRepository {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(Mutex::new(dataset)),
        }
    }

    pub fn snapshot(&self) -> Result<Dataset, RepositoryError> {
        self.read(Dataset::clone)
    }
}

impl LendingRepository for InMemoryLendingRepository {
    fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> Result<T, RepositoryError> {
        let guard = self
            .dataset
            .lock()
            .map_err(|_| RepositoryError::Unavailable("dataset lock poisoned".to_string()))?;
        Ok(f(&guard))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Dataset) -> T) -> Result<T, RepositoryError> {
        let mut guard = self
            .dataset
            .lock()
            .map_err(|_| RepositoryError::Unavailable("dataset lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}
