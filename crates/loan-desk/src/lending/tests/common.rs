use std::sync::{Arc, Mutex};

use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::lending::domain::{Amount, CustomerId, Gender, LoanId, ProductId};
use crate::lending::events::{EventError, EventPublisher, LifecycleEvent};
use crate::lending::router::lending_router_with_clock;
use crate::lending::service::{ApplicationDraft, CustomerDraft, LendingConfig, LendingService};
use crate::lending::store::{
    demo_as_of, Dataset, InMemoryLendingRepository, LendingRepository, RepositoryError,
};

pub(super) type DemoService = LendingService<InMemoryLendingRepository, MemoryEvents>;

/// Noon on the demo business date.
pub(super) fn demo_now() -> DateTime<Utc> {
    demo_as_of()
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
        .and_utc()
}

pub(super) fn build_service() -> (
    Arc<DemoService>,
    Arc<InMemoryLendingRepository>,
    Arc<MemoryEvents>,
) {
    let repository = Arc::new(InMemoryLendingRepository::new(Dataset::demo()));
    let events = Arc::new(MemoryEvents::default());
    let service = Arc::new(LendingService::new(
        repository.clone(),
        events.clone(),
        LendingConfig::default(),
    ));
    (service, repository, events)
}

pub(super) fn snapshot(repository: &InMemoryLendingRepository) -> Dataset {
    repository.snapshot().expect("dataset readable")
}

pub(super) fn router_with_service(service: Arc<DemoService>) -> Router {
    lending_router_with_clock(service, demo_now)
}

pub(super) fn application_draft(customer: u32, amount: Amount, tenure_months: u32) -> ApplicationDraft {
    ApplicationDraft {
        customer_id: CustomerId(customer),
        co_applicant_ids: Vec::new(),
        guarantor_ids: Vec::new(),
        amount,
        product_id: ProductId(1),
        purpose: "Working capital".to_string(),
        interest_rate: None,
        tenure_months,
        repayment_frequency: crate::lending::domain::RepaymentFrequency::Monthly,
        documents: vec!["pan.pdf".to_string()],
    }
}

pub(super) fn customer_draft(pincode: &str) -> CustomerDraft {
    CustomerDraft {
        name: "Lakshmi Iyer".to_string(),
        phone: "9845012345".to_string(),
        email: "lakshmi.iyer@example.in".to_string(),
        dob: chrono::NaiveDate::from_ymd_opt(1990, 3, 14).expect("valid date"),
        gender: Gender::Female,
        guardian_name: None,
        occupation: Some("Tailor".to_string()),
        income_source: Some("Self-employed".to_string()),
        monthly_income: Some(30_000),
        pincode: pincode.to_string(),
    }
}

pub(super) fn outstanding(repository: &InMemoryLendingRepository, loan_id: u32) -> Amount {
    let data = snapshot(repository);
    let loan = data.loan(LoanId(loan_id)).expect("loan exists");
    data.outstanding_principal(loan)
}

#[derive(Default)]
pub(super) struct MemoryEvents {
    published: Mutex<Vec<LifecycleEvent>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<LifecycleEvent> {
        self.published.lock().expect("events lock").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.template).collect()
    }
}

impl EventPublisher for MemoryEvents {
    fn publish(&self, event: LifecycleEvent) -> Result<(), EventError> {
        self.published.lock().expect("events lock").push(event);
        Ok(())
    }
}

pub(super) struct UnreachableEvents;

impl EventPublisher for UnreachableEvents {
    fn publish(&self, _event: LifecycleEvent) -> Result<(), EventError> {
        Err(EventError::Transport("broker offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl LendingRepository for UnavailableRepository {
    fn read<T>(&self, _f: impl FnOnce(&Dataset) -> T) -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance window".to_string()))
    }

    fn write<T>(&self, _f: impl FnOnce(&mut Dataset) -> T) -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance window".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
