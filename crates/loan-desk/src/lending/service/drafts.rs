use chrono::NaiveDate;
use serde::Deserialize;

use crate::lending::domain::{
    AddressKind, Amount, CustomerId, EligibilityCriteria, EntrySide, Gender, LoanId, PaymentMode,
    ProductCategory, ProductId, RepaymentFrequency, VoucherKind,
};

#[derive(Debug, Clone, Deserialize)]
pub struct PartnerDraft {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub servicing_pincodes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub category: ProductCategory,
    pub min_amount: Amount,
    pub max_amount: Amount,
    pub min_tenure_months: u32,
    pub max_tenure_months: u32,
    pub interest_rate: f64,
    pub processing_fee: Amount,
    pub prepayment_penalty: f64,
    pub late_payment_penalty: f64,
    pub eligibility: EligibilityCriteria,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub income_source: Option<String>,
    #[serde(default)]
    pub monthly_income: Option<Amount>,
    pub pincode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressDraft {
    pub kind: AddressKind,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub pincode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationDraft {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub co_applicant_ids: Vec<CustomerId>,
    #[serde(default)]
    pub guarantor_ids: Vec<CustomerId>,
    pub amount: Amount,
    pub product_id: ProductId,
    pub purpose: String,
    /// Falls back to the product rate.
    #[serde(default)]
    pub interest_rate: Option<f64>,
    pub tenure_months: u32,
    #[serde(default = "monthly")]
    pub repayment_frequency: RepaymentFrequency,
    #[serde(default)]
    pub documents: Vec<String>,
}

fn monthly() -> RepaymentFrequency {
    RepaymentFrequency::Monthly
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDraft {
    #[serde(default = "cash")]
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub collection_agent: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl Default for PaymentDraft {
    fn default() -> Self {
        Self {
            payment_mode: PaymentMode::Cash,
            collection_agent: None,
            remarks: None,
        }
    }
}

fn cash() -> PaymentMode {
    PaymentMode::Cash
}

/// Tenure and rate fall back to [`super::LendingConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct TopUpDraft {
    pub requested_amount: Amount,
    #[serde(default)]
    pub tenure_months: Option<u32>,
    #[serde(default)]
    pub interest_rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoucherDraft {
    pub kind: VoucherKind,
    pub amount: Amount,
    pub note: String,
    #[serde(default)]
    pub loan_id: Option<LoanId>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalDraft {
    pub entry: String,
    #[serde(default)]
    pub loan_id: Option<LoanId>,
    pub amount: Amount,
    pub side: EntrySide,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub date: NaiveDate,
}
