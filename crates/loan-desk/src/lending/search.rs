//! Global search over the records a user can see.

use std::cmp::Reverse;

use serde::Serialize;

use super::domain::User;
use super::format::format_currency;
use super::reports::scope_dataset;
use super::store::Dataset;

pub const MIN_QUERY_LEN: usize = 2;
pub const MAX_RESULTS: usize = 10;
pub const MAX_SUGGESTIONS: usize = 20;

const STRONG_MATCH: u8 = 3;
const WEAK_MATCH: u8 = 1;
const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
const COMMON_STATUSES: [&str; 5] = ["Active", "Pending", "Approved", "Rejected", "Overdue"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Customer,
    Loan,
    Application,
}

impl SearchKind {
    /// Listing page the hit links to.
    pub const fn url(self) -> &'static str {
        match self {
            SearchKind::Customer => "/customers",
            SearchKind::Loan => "/loans",
            SearchKind::Application => "/applications",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub kind: SearchKind,
    pub id: u32,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub url: &'static str,
    pub priority: u8,
}

impl SearchResult {
    fn new(kind: SearchKind, id: u32, title: String, subtitle: String, description: String) -> Self {
        Self {
            kind,
            id,
            title,
            subtitle,
            description,
            url: kind.url(),
            priority: WEAK_MATCH,
        }
    }

    fn strong_if(mut self, strong: bool) -> Self {
        if strong {
            self.priority = STRONG_MATCH;
        }
        self
    }
}

fn any_contains<'a>(fields: impl IntoIterator<Item = &'a str>, term: &str) -> bool {
    fields.into_iter().any(|field| field.contains(term))
}

/// Case-insensitive substring search. Queries shorter than [`MIN_QUERY_LEN`]
/// return nothing; results are ranked by priority, then title.
pub fn search_all(query: &str, data: &Dataset, user: &User) -> Vec<SearchResult> {
    let term = query.trim().to_lowercase();
    if term.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }
    let data = scope_dataset(data, user);
    let customer_name = |id| {
        data.customer(id)
            .map_or_else(|| UNKNOWN_CUSTOMER.to_string(), |c| c.name.clone())
    };
    let mut results = Vec::new();

    for customer in &data.customers {
        let name = customer.name.to_lowercase();
        let email = customer.email.to_lowercase();
        if any_contains(
            [
                name.as_str(),
                customer.phone.as_str(),
                email.as_str(),
                customer.pincode.as_str(),
            ],
            &term,
        ) {
            results.push(
                SearchResult::new(
                    SearchKind::Customer,
                    customer.id.0,
                    customer.name.clone(),
                    customer.phone.clone(),
                    format!(
                        "{} • {} • {}",
                        customer.email,
                        customer.kyc_status.label(),
                        customer.pincode
                    ),
                )
                .strong_if(name.starts_with(&term)),
            );
        }
    }

    for loan in &data.loans {
        let id = loan.id.to_string();
        let owner = data.customer(loan.customer_id).map(|c| c.name.to_lowercase());
        let status = loan.status.label().to_lowercase();
        let amount = format_currency(loan.amount);
        if any_contains(
            [
                id.as_str(),
                owner.as_deref().unwrap_or_default(),
                status.as_str(),
                amount.as_str(),
            ],
            &term,
        ) {
            results.push(
                SearchResult::new(
                    SearchKind::Loan,
                    loan.id.0,
                    format!("Loan #{id}"),
                    customer_name(loan.customer_id),
                    format!(
                        "{} • {} • {}% • {} months",
                        amount,
                        loan.status.label(),
                        loan.interest_rate,
                        loan.tenure_months
                    ),
                )
                .strong_if(id.contains(&term)),
            );
        }
    }

    for application in &data.applications {
        let id = application.id.to_string();
        let owner = data
            .customer(application.customer_id)
            .map(|c| c.name.to_lowercase());
        let product = application.product.to_lowercase();
        let status = application.status.label().to_lowercase();
        let amount = format_currency(application.amount);
        if any_contains(
            [
                id.as_str(),
                owner.as_deref().unwrap_or_default(),
                product.as_str(),
                status.as_str(),
                amount.as_str(),
            ],
            &term,
        ) {
            results.push(
                SearchResult::new(
                    SearchKind::Application,
                    application.id.0,
                    format!("Application #{id}"),
                    customer_name(application.customer_id),
                    format!(
                        "{} • {} • {}",
                        application.product,
                        amount,
                        application.status.label()
                    ),
                )
                .strong_if(id.contains(&term)),
            );
        }
    }

    results.sort_by(|a, b| {
        Reverse(a.priority)
            .cmp(&Reverse(b.priority))
            .then_with(|| a.title.cmp(&b.title))
    });
    results.truncate(MAX_RESULTS);
    results
}

/// Customer names, record handles and common statuses for type-ahead.
pub fn search_suggestions(data: &Dataset, user: &User) -> Vec<String> {
    let data = scope_dataset(data, user);
    data.customers
        .iter()
        .map(|c| c.name.clone())
        .chain(data.loans.iter().map(|l| format!("Loan #{}", l.id)))
        .chain(data.applications.iter().map(|a| format!("Application #{}", a.id)))
        .chain(COMMON_STATUSES.iter().map(|status| status.to_string()))
        .take(MAX_SUGGESTIONS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::domain::UserId;

    fn admin(data: &Dataset) -> User {
        data.user(UserId(1)).cloned().expect("admin")
    }

    #[test]
    fn short_queries_return_nothing() {
        let data = Dataset::demo();
        assert!(search_all(" a ", &data, &admin(&data)).is_empty());
        assert!(search_all("", &data, &admin(&data)).is_empty());
    }

    #[test]
    fn name_prefix_ranks_the_customer_first() {
        let data = Dataset::demo();
        let results = search_all("ANITA", &data, &admin(&data));

        assert_eq!(results[0].kind, SearchKind::Customer);
        assert_eq!(results[0].title, "Anita Sharma");
        assert_eq!(results[0].priority, 3);
        assert_eq!(results[0].url, "/customers");
        assert!(results[1..].iter().all(|r| r.priority == 1));
        assert!(results
            .iter()
            .any(|r| r.title == "Loan #1" && r.subtitle == "Anita Sharma"));
    }

    #[test]
    fn status_words_match_loans_and_applications() {
        let data = Dataset::demo();
        let results = search_all("defaulted", &data, &admin(&data));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Loan #4");
        assert!(results[0].description.starts_with("₹25,000 • Defaulted"));
    }

    #[test]
    fn results_are_capped() {
        let data = Dataset::demo();
        let results = search_all("loan", &data, &admin(&data));
        assert!(results.len() <= MAX_RESULTS);
        assert!(results
            .windows(2)
            .all(|pair| pair[0].priority > pair[1].priority
                || (pair[0].priority == pair[1].priority && pair[0].title <= pair[1].title)));
    }

    #[test]
    fn staff_cannot_find_other_partners_customers() {
        let data = Dataset::demo();
        let staff = data.user(UserId(2)).cloned().expect("staff");
        assert!(search_all("vikram", &data, &staff).is_empty());
    }

    #[test]
    fn suggestions_are_capped_after_record_handles() {
        let data = Dataset::demo();
        let suggestions = search_suggestions(&data, &admin(&data));
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(suggestions.first().map(String::as_str), Some("Anita Sharma"));
        assert_eq!(suggestions.last().map(String::as_str), Some("Approved"));
        assert!(suggestions.contains(&"Loan #3".to_string()));
    }
}
