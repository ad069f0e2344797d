use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Origination channel identifier.
    PartnerId
);
entity_id!(UserId);
entity_id!(CustomerId);
entity_id!(AddressId);
entity_id!(ApplicationId);
entity_id!(LoanId);
entity_id!(RepaymentId);
entity_id!(ScheduleId);
entity_id!(PenaltyId);
entity_id!(TopUpId);
entity_id!(ClosureId);
entity_id!(VoucherId);
entity_id!(JournalId);
entity_id!(TransactionId);
entity_id!(ProductId);

/// Whole currency units (INR). Fractional paise are never tracked.
pub type Amount = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RecordStatus::Active => "Active",
            RecordStatus::Inactive => "Inactive",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            RecordStatus::Active => RecordStatus::Inactive,
            RecordStatus::Inactive => RecordStatus::Active,
        }
    }
}

/// Origination channel that services a fixed set of postal pincodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub code: String,
    pub status: RecordStatus,
    pub servicing_pincodes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Partner {
    pub fn services(&self, pincode: &str) -> bool {
        self.status == RecordStatus::Active
            && self.servicing_pincodes.iter().any(|code| code == pincode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Staff,
}

/// Back-office operator. Staff visibility is scoped by `partner_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub partner_id: Option<PartnerId>,
    pub status: RecordStatus,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KycStatus {
    NotStarted,
    Pending,
    Verified,
    Rejected,
}

impl KycStatus {
    pub const fn label(self) -> &'static str {
        match self {
            KycStatus::NotStarted => "NotStarted",
            KycStatus::Pending => "Pending",
            KycStatus::Verified => "Verified",
            KycStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
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
    pub kyc_status: KycStatus,
    pub pincode: String,
    /// Resolved from `pincode` when the customer is onboarded.
    #[serde(default)]
    pub partner_id: Option<PartnerId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    Permanent,
    Residence,
    Office,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub kind: AddressKind,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub pincode: String,
    pub is_verified: bool,
    #[serde(default)]
    pub verification_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentFrequency {
    Monthly,
    Weekly,
    Daily,
    Quarterly,
}

/// Application lifecycle: Draft → Submitted → UnderReview → Approved | Rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Draft",
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Draft | ApplicationStatus::Submitted | ApplicationStatus::UnderReview
        )
    }

    pub const fn is_processed(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Draft, ApplicationStatus::Submitted)
                | (ApplicationStatus::Submitted, ApplicationStatus::UnderReview)
                | (ApplicationStatus::UnderReview, ApplicationStatus::Approved)
                | (ApplicationStatus::UnderReview, ApplicationStatus::Rejected)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: ApplicationId,
    /// Primary applicant.
    pub customer_id: CustomerId,
    #[serde(default)]
    pub co_applicant_ids: Vec<CustomerId>,
    #[serde(default)]
    pub guarantor_ids: Vec<CustomerId>,
    pub amount: Amount,
    pub product_id: ProductId,
    pub product: String,
    pub purpose: String,
    pub interest_rate: f64,
    pub tenure_months: u32,
    pub repayment_frequency: RepaymentFrequency,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationType {
    Emi,
    Flat,
    Reducing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Closed,
    Defaulted,
    PreClosed,
}

impl LoanStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LoanStatus::Active => "Active",
            LoanStatus::Closed => "Closed",
            LoanStatus::Defaulted => "Defaulted",
            LoanStatus::PreClosed => "PreClosed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub customer_id: CustomerId,
    pub application_id: ApplicationId,
    pub amount: Amount,
    pub interest_rate: f64,
    pub tenure_months: u32,
    pub emi: Amount,
    pub disbursement_date: NaiveDate,
    pub grace_period_days: u32,
    pub repayment_frequency: RepaymentFrequency,
    pub amortization_type: AmortizationType,
    #[serde(default)]
    pub overdue_days: Option<u32>,
    pub status: LoanStatus,
    #[serde(default)]
    pub co_applicant_ids: Vec<CustomerId>,
    #[serde(default)]
    pub guarantor_ids: Vec<CustomerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn monthly_rate(&self) -> f64 {
        self.interest_rate / 100.0 / 12.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    Upi,
    BankTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentStatus {
    Pending,
    Paid,
    Overdue,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    pub id: RepaymentId,
    pub loan_id: LoanId,
    pub installment_number: u32,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Amount,
    pub expected_amount: Amount,
    pub principal_amount: Amount,
    pub interest_amount: Amount,
    pub payment_mode: PaymentMode,
    pub is_advance_payment: bool,
    pub status: RepaymentStatus,
    pub overdue_days: u32,
    #[serde(default)]
    pub collection_agent: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Upcoming,
    Due,
    Overdue,
    Paid,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollectionPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl CollectionPriority {
    /// Escalation ladder used when an installment slips past its due date.
    pub fn for_overdue_days(days: u32) -> Self {
        match days {
            0 => CollectionPriority::Low,
            1..=15 => CollectionPriority::Medium,
            16..=30 => CollectionPriority::High,
            _ => CollectionPriority::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchedule {
    pub id: ScheduleId,
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    pub due_date: NaiveDate,
    pub emi_amount: Amount,
    pub status: ScheduleStatus,
    pub overdue_days: u32,
    #[serde(default)]
    pub collection_agent: Option<String>,
    #[serde(default)]
    pub last_reminder_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_reminder_date: Option<NaiveDate>,
    pub priority: CollectionPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyType {
    LatePayment,
    PreClosure,
    BounceCharge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMethod {
    Fixed,
    Percentage,
    PerDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub id: PenaltyId,
    pub loan_id: LoanId,
    #[serde(default)]
    pub repayment_id: Option<RepaymentId>,
    pub date: NaiveDate,
    pub amount: Amount,
    pub reason: String,
    pub penalty_type: PenaltyType,
    pub calculation_method: CalculationMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopUpStatus {
    Requested,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUp {
    pub id: TopUpId,
    pub loan_id: LoanId,
    pub requested_amount: Amount,
    pub tenure_months: u32,
    pub interest_rate: f64,
    pub status: TopUpStatus,
    pub request_date: NaiveDate,
    #[serde(default)]
    pub approved_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosureStatus {
    Pending,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanClosure {
    pub id: ClosureId,
    pub loan_id: LoanId,
    #[serde(default)]
    pub closure_date: Option<NaiveDate>,
    pub status: ClosureStatus,
    pub settlement_amount: Amount,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub closed_by: Option<String>,
    pub request_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoucherKind {
    Receipt,
    Payment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrySide {
    Debit,
    Credit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub id: JournalId,
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub loan_id: Option<LoanId>,
    pub description: String,
    pub amount: Amount,
    pub side: EntrySide,
    pub date: NaiveDate,
    #[serde(default)]
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCategory {
    Personal,
    Business,
    Home,
    Vehicle,
    Education,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    pub min_age: u32,
    pub max_age: u32,
    pub min_income: Amount,
    #[serde(default)]
    pub required_documents: Vec<String>,
    pub credit_score_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub id: ProductId,
    pub name: String,
    pub code: String,
    pub description: String,
    pub category: ProductCategory,
    pub min_amount: Amount,
    pub max_amount: Amount,
    pub min_tenure_months: u32,
    pub max_tenure_months: u32,
    pub interest_rate: f64,
    pub processing_fee: Amount,
    /// Percentage of the outstanding principal.
    pub prepayment_penalty: f64,
    /// Percentage of the overdue amount.
    pub late_payment_penalty: f64,
    pub eligibility: EligibilityCriteria,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
