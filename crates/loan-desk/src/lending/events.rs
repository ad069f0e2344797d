use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outbound hook for lifecycle notifications (SMS gateways, CRM webhooks, audit sinks).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: LifecycleEvent) -> Result<(), EventError>;
}

/// Payload published when a loan changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub template: String,
    pub loan_id: u32,
    pub details: BTreeMap<String, String>,
}

impl LifecycleEvent {
    pub fn new(template: &str, loan_id: u32) -> Self {
        Self {
            template: template.to_string(),
            loan_id,
            details: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

pub const LOAN_DISBURSED: &str = "loan_disbursed";
pub const PAYMENT_RECEIVED: &str = "payment_received";
pub const LOAN_CLOSED: &str = "loan_closed";
pub const TOP_UP_APPROVED: &str = "top_up_approved";

/// Publisher that only writes the event to the trace log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: LifecycleEvent) -> Result<(), EventError> {
        tracing::info!(
            template = %event.template,
            loan_id = event.loan_id,
            details = ?event.details,
            "lifecycle event"
        );
        Ok(())
    }
}
