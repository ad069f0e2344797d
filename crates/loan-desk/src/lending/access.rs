//! Partner assignment and partner-scoped visibility.

use std::collections::HashSet;

use super::domain::{Customer, CustomerId, Loan, LoanApplication, Partner, PartnerId, User, UserRole};

pub const UNKNOWN_PARTNER: &str = "Unknown Partner";

/// Records that carry the partner they were originated through.
pub trait PartnerScoped {
    fn partner_id(&self) -> Option<PartnerId>;
}

impl PartnerScoped for Customer {
    fn partner_id(&self) -> Option<PartnerId> {
        self.partner_id
    }
}

/// Postal pincodes are exactly six ASCII digits.
pub fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.bytes().all(|byte| byte.is_ascii_digit())
}

/// First active partner servicing `pincode`, if any.
pub fn assign_partner_by_pincode<'a>(pincode: &str, partners: &'a [Partner]) -> Option<&'a Partner> {
    partners.iter().find(|partner| partner.services(pincode))
}

pub fn partner_name(partner_id: PartnerId, partners: &[Partner]) -> &str {
    partners
        .iter()
        .find(|partner| partner.id == partner_id)
        .map(|partner| partner.name.as_str())
        .unwrap_or(UNKNOWN_PARTNER)
}

/// Partner the user is confined to, or `None` when the user sees everything.
/// Staff without a partner see nothing and are reported as `Some(None)`.
fn staff_scope(user: &User) -> Option<Option<PartnerId>> {
    match user.role {
        UserRole::Admin => None,
        UserRole::Staff => Some(user.partner_id),
    }
}

pub fn filter_by_user_access<'a, T: PartnerScoped>(items: &'a [T], user: &User) -> Vec<&'a T> {
    match staff_scope(user) {
        None => items.iter().collect(),
        Some(Some(partner_id)) => items
            .iter()
            .filter(|item| item.partner_id() == Some(partner_id))
            .collect(),
        Some(None) => Vec::new(),
    }
}

pub fn filter_customers_by_user<'a>(customers: &'a [Customer], user: &User) -> Vec<&'a Customer> {
    filter_by_user_access(customers, user)
}

/// Customer ids visible to the user, `None` meaning unrestricted.
pub(crate) fn accessible_customer_ids(
    customers: &[Customer],
    user: &User,
) -> Option<HashSet<CustomerId>> {
    match staff_scope(user) {
        None => None,
        Some(scope) => Some(
            customers
                .iter()
                .filter(|customer| scope.is_some() && customer.partner_id == scope)
                .map(|customer| customer.id)
                .collect(),
        ),
    }
}

fn filter_by_customer<'a, T>(
    items: &'a [T],
    customers: &[Customer],
    user: &User,
    customer_of: impl Fn(&T) -> CustomerId,
) -> Vec<&'a T> {
    match accessible_customer_ids(customers, user) {
        None => items.iter().collect(),
        Some(visible) => items
            .iter()
            .filter(|item| visible.contains(&customer_of(*item)))
            .collect(),
    }
}

pub fn filter_applications_by_user<'a>(
    applications: &'a [LoanApplication],
    customers: &[Customer],
    user: &User,
) -> Vec<&'a LoanApplication> {
    filter_by_customer(applications, customers, user, |application| {
        application.customer_id
    })
}

pub fn filter_loans_by_user<'a>(loans: &'a [Loan], customers: &[Customer], user: &User) -> Vec<&'a Loan> {
    filter_by_customer(loans, customers, user, |loan| loan.customer_id)
}
