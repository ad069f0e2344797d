//! Work-queue alerts derived from the user's slice of the book.

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{KycStatus, RepaymentStatus, User};
use super::format::format_currency;
use super::reports::scope_dataset;
use super::store::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Overdue,
    DueToday,
    KycPending,
    ApplicationPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl NotificationPriority {
    pub fn for_overdue_days(days: u32) -> Self {
        match days {
            d if d > 30 => NotificationPriority::Critical,
            d if d > 15 => NotificationPriority::High,
            _ => NotificationPriority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "related_type", content = "related_id", rename_all = "snake_case")]
pub enum RelatedRecord {
    Loan(u32),
    Customer(u32),
    Application(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u32,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub created_on: NaiveDate,
    pub is_read: bool,
    #[serde(flatten)]
    pub related: RelatedRecord,
}

struct Feed {
    items: Vec<Notification>,
    today: NaiveDate,
}

impl Feed {
    fn push(
        &mut self,
        kind: NotificationKind,
        title: &str,
        message: String,
        priority: NotificationPriority,
        related: RelatedRecord,
    ) {
        let id = self.items.len() as u32 + 1;
        self.items.push(Notification {
            id,
            kind,
            title: title.to_string(),
            message,
            priority,
            created_on: self.today,
            is_read: false,
            related,
        });
    }
}

/// Overdue payments, payments due today, pending KYC and pending applications,
/// highest priority first. Ties keep generation order.
pub fn generate_notifications(data: &Dataset, user: &User, today: NaiveDate) -> Vec<Notification> {
    let data = scope_dataset(data, user);
    let mut feed = Feed {
        items: Vec::new(),
        today,
    };
    let borrower = |loan_id| {
        data.loan(loan_id)
            .and_then(|loan| data.customer(loan.customer_id).map(|customer| (loan, customer)))
    };

    for repayment in data
        .repayments
        .iter()
        .filter(|r| r.status == RepaymentStatus::Overdue)
    {
        if let Some((loan, customer)) = borrower(repayment.loan_id) {
            feed.push(
                NotificationKind::Overdue,
                "Overdue Payment",
                format!(
                    "{} has an overdue payment of {} for Loan #{}",
                    customer.name,
                    format_currency(repayment.expected_amount),
                    loan.id
                ),
                NotificationPriority::for_overdue_days(repayment.overdue_days),
                RelatedRecord::Loan(loan.id.0),
            );
        }
    }

    for repayment in data
        .repayments
        .iter()
        .filter(|r| r.status == RepaymentStatus::Pending && r.due_date == today)
    {
        if let Some((loan, customer)) = borrower(repayment.loan_id) {
            feed.push(
                NotificationKind::DueToday,
                "Payment Due Today",
                format!(
                    "{} has a payment due today of {} for Loan #{}",
                    customer.name,
                    format_currency(repayment.expected_amount),
                    loan.id
                ),
                NotificationPriority::Medium,
                RelatedRecord::Loan(loan.id.0),
            );
        }
    }

    for customer in data
        .customers
        .iter()
        .filter(|c| c.kyc_status == KycStatus::Pending)
    {
        feed.push(
            NotificationKind::KycPending,
            "KYC Pending",
            format!("KYC verification is pending for {}", customer.name),
            NotificationPriority::Medium,
            RelatedRecord::Customer(customer.id.0),
        );
    }

    for application in data.applications.iter().filter(|a| a.status.is_pending()) {
        if let Some(customer) = data.customer(application.customer_id) {
            feed.push(
                NotificationKind::ApplicationPending,
                "Application Pending",
                format!(
                    "Application #{} from {} is pending review",
                    application.id, customer.name
                ),
                NotificationPriority::Low,
                RelatedRecord::Application(application.id.0),
            );
        }
    }

    let mut items = feed.items;
    items.sort_by(|a, b| b.priority.cmp(&a.priority));
    items
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

pub fn critical_count(notifications: &[Notification]) -> usize {
    notifications
        .iter()
        .filter(|n| !n.is_read && n.priority == NotificationPriority::Critical)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::domain::UserId;
    use crate::lending::store::demo_as_of;

    fn user(data: &Dataset, id: u32) -> User {
        data.user(UserId(id)).cloned().expect("seeded user")
    }

    #[test]
    fn priority_thresholds_follow_days_overdue() {
        assert_eq!(NotificationPriority::for_overdue_days(31), NotificationPriority::Critical);
        assert_eq!(NotificationPriority::for_overdue_days(30), NotificationPriority::High);
        assert_eq!(NotificationPriority::for_overdue_days(16), NotificationPriority::High);
        assert_eq!(NotificationPriority::for_overdue_days(15), NotificationPriority::Medium);
    }

    #[test]
    fn admin_feed_is_sorted_and_numbered() {
        let data = Dataset::demo();
        let feed = generate_notifications(&data, &user(&data, 1), demo_as_of());

        assert!(feed.windows(2).all(|pair| pair[0].priority >= pair[1].priority));
        let mut ids: Vec<u32> = feed.iter().map(|n| n.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=feed.len() as u32).collect::<Vec<_>>());
        assert_eq!(unread_count(&feed), feed.len());
        assert_eq!(feed[0].priority, NotificationPriority::Critical);
    }

    #[test]
    fn due_today_and_kyc_alerts_are_raised() {
        let data = Dataset::demo();
        let feed = generate_notifications(&data, &user(&data, 1), demo_as_of());

        assert!(feed.iter().any(|n| n.kind == NotificationKind::DueToday
            && n.related == RelatedRecord::Loan(1)));
        assert!(feed
            .iter()
            .any(|n| n.message == "KYC verification is pending for Farah Khan"));
    }

    #[test]
    fn staff_only_see_their_partner() {
        let data = Dataset::demo();
        let feed = generate_notifications(&data, &user(&data, 2), demo_as_of());

        assert!(feed
            .iter()
            .all(|n| !n.message.contains("Joseph Mathew") && !n.message.contains("Vikram Patel")));
        assert_eq!(critical_count(&feed), 0);
    }
}
