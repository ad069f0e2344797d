//! Loan product rules: amount and tenure bounds, eligibility, fees and penalties.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::domain::{Amount, Customer, KycStatus, LoanProduct, ProductId, RecordStatus};
use super::format::format_currency;

/// Amount or tenure outside the product envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundViolation {
    #[error("Minimum loan amount is {}", format_currency(*.0))]
    AmountBelowMinimum(Amount),
    #[error("Maximum loan amount is {}", format_currency(*.0))]
    AmountAboveMaximum(Amount),
    #[error("Minimum tenure is {0} months")]
    TenureBelowMinimum(u32),
    #[error("Maximum tenure is {0} months")]
    TenureAboveMaximum(u32),
}

pub fn validate_loan_amount(product: &LoanProduct, amount: Amount) -> Result<(), BoundViolation> {
    if amount < product.min_amount {
        return Err(BoundViolation::AmountBelowMinimum(product.min_amount));
    }
    if amount > product.max_amount {
        return Err(BoundViolation::AmountAboveMaximum(product.max_amount));
    }
    Ok(())
}

pub fn validate_loan_tenure(product: &LoanProduct, tenure_months: u32) -> Result<(), BoundViolation> {
    if tenure_months < product.min_tenure_months {
        return Err(BoundViolation::TenureBelowMinimum(product.min_tenure_months));
    }
    if tenure_months > product.max_tenure_months {
        return Err(BoundViolation::TenureAboveMaximum(product.max_tenure_months));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibilityReason {
    TooYoung { min_age: u32 },
    TooOld { max_age: u32 },
    InsufficientIncome { min_income: Amount },
    KycNotVerified,
}

impl IneligibilityReason {
    pub fn summary(&self) -> String {
        match self {
            IneligibilityReason::TooYoung { min_age } => {
                format!("Customer must be at least {min_age} years old")
            }
            IneligibilityReason::TooOld { max_age } => {
                format!("Customer must be under {max_age} years old")
            }
            IneligibilityReason::InsufficientIncome { min_income } => format!(
                "Minimum monthly income required is {}",
                format_currency(*min_income)
            ),
            IneligibilityReason::KycNotVerified => "KYC must be verified".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub reasons: Vec<IneligibilityReason>,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn summary(&self) -> String {
        self.reasons
            .iter()
            .map(IneligibilityReason::summary)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Age is measured in calendar years (`today.year - dob.year`). An undeclared
/// income is not held against the customer.
pub fn check_customer_eligibility(
    product: &LoanProduct,
    customer: &Customer,
    today: NaiveDate,
) -> Eligibility {
    let criteria = &product.eligibility;
    let mut reasons = Vec::new();

    let age = today.year() - customer.dob.year();
    if age < criteria.min_age as i32 {
        reasons.push(IneligibilityReason::TooYoung {
            min_age: criteria.min_age,
        });
    }
    if age > criteria.max_age as i32 {
        reasons.push(IneligibilityReason::TooOld {
            max_age: criteria.max_age,
        });
    }

    if let Some(income) = customer.monthly_income {
        if income < criteria.min_income {
            reasons.push(IneligibilityReason::InsufficientIncome {
                min_income: criteria.min_income,
            });
        }
    }

    if customer.kyc_status != KycStatus::Verified {
        reasons.push(IneligibilityReason::KycNotVerified);
    }

    Eligibility { reasons }
}

pub fn active_products(products: &[LoanProduct]) -> Vec<&LoanProduct> {
    products
        .iter()
        .filter(|product| product.status == RecordStatus::Active)
        .collect()
}

pub fn product_by_code<'a>(products: &'a [LoanProduct], code: &str) -> Option<&'a LoanProduct> {
    products.iter().find(|product| product.code == code)
}

pub fn product_by_id(products: &[LoanProduct], id: ProductId) -> Option<&LoanProduct> {
    products.iter().find(|product| product.id == id)
}

/// Flat fee; the amount does not change it.
pub fn processing_fee(product: &LoanProduct, _amount: Amount) -> Amount {
    product.processing_fee
}

pub fn prepayment_penalty(product: &LoanProduct, outstanding: Amount) -> Amount {
    percentage_of(outstanding, product.prepayment_penalty)
}

pub fn late_payment_penalty(product: &LoanProduct, overdue: Amount) -> Amount {
    percentage_of(overdue, product.late_payment_penalty)
}

fn percentage_of(amount: Amount, percent: f64) -> Amount {
    (amount as f64 * percent / 100.0).round() as Amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::store::Dataset;

    fn personal_loan() -> LoanProduct {
        Dataset::demo()
            .products
            .into_iter()
            .find(|product| product.code == "PL-STD")
            .expect("personal loan product seeded")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid")
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        let product = personal_loan();
        assert!(validate_loan_amount(&product, product.min_amount).is_ok());
        assert!(validate_loan_amount(&product, product.max_amount).is_ok());

        let below = validate_loan_amount(&product, product.min_amount - 1).unwrap_err();
        assert_eq!(below, BoundViolation::AmountBelowMinimum(product.min_amount));
        assert!(below.to_string().starts_with("Minimum loan amount is ₹"));

        let above = validate_loan_amount(&product, product.max_amount + 1).unwrap_err();
        assert!(above.to_string().starts_with("Maximum loan amount is ₹"));
    }

    #[test]
    fn tenure_bounds_report_months() {
        let product = personal_loan();
        let err = validate_loan_tenure(&product, product.max_tenure_months + 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Maximum tenure is {} months", product.max_tenure_months)
        );
        assert!(validate_loan_tenure(&product, product.min_tenure_months).is_ok());
    }

    #[test]
    fn eligibility_collects_every_failing_rule() {
        let product = personal_loan();
        let mut customer = Dataset::demo().customers.remove(0);
        customer.kyc_status = KycStatus::Pending;
        customer.monthly_income = Some(product.eligibility.min_income - 1);
        customer.dob = NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid");

        let eligibility = check_customer_eligibility(&product, &customer, today());
        assert!(!eligibility.is_eligible());
        assert_eq!(eligibility.reasons.len(), 3);
        assert!(eligibility.summary().contains("KYC must be verified"));
    }

    #[test]
    fn undeclared_income_is_not_a_disqualifier() {
        let product = personal_loan();
        let mut customer = Dataset::demo().customers.remove(0);
        customer.kyc_status = KycStatus::Verified;
        customer.monthly_income = None;
        customer.dob = NaiveDate::from_ymd_opt(1990, 5, 5).expect("valid");

        assert!(check_customer_eligibility(&product, &customer, today()).is_eligible());
    }

    #[test]
    fn penalties_are_percentages_of_the_base() {
        let mut product = personal_loan();
        product.prepayment_penalty = 2.0;
        product.late_payment_penalty = 1.5;
        assert_eq!(prepayment_penalty(&product, 50_000), 1_000);
        assert_eq!(late_payment_penalty(&product, 8_885), 133);
        assert_eq!(processing_fee(&product, 1_000_000), product.processing_fee);
    }
}
