use chrono::{DateTime, NaiveDate, Utc};

use super::Dataset;
use crate::lending::domain::{
    Address, AddressId, AddressKind, AmortizationType, ApplicationId, ApplicationStatus,
    CalculationMethod, ClosureId, ClosureStatus, CollectionPriority, CollectionSchedule, Customer,
    CustomerId, EligibilityCriteria, Gender, KycStatus, Loan, LoanApplication, LoanClosure, LoanId,
    LoanProduct, LoanStatus, Partner, PartnerId, PaymentMode, Penalty, PenaltyId, PenaltyType,
    ProductCategory, ProductId, RecordStatus, Repayment, RepaymentFrequency, RepaymentId,
    RepaymentStatus, ScheduleId, ScheduleStatus, TopUp, TopUpId, TopUpStatus, User, UserId,
    UserRole, Voucher, VoucherId, VoucherKind,
};
use crate::lending::emi::{generate_amortization_schedule, level_installment, AmortizationRow};
use crate::lending::ledger::{post_disbursement, post_installment, InstallmentPayment};
use crate::lending::products::late_payment_penalty;

/// Business date the demo portfolio is consistent with.
pub fn demo_as_of() -> NaiveDate {
    day(2025, 6, 1)
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn stamp(year: i32, month: u32, date: u32) -> DateTime<Utc> {
    day(year, month, date)
        .and_hms_opt(10, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn demo_dataset() -> Dataset {
    let mut data = Dataset {
        partners: partners(),
        users: users(),
        customers: customers(),
        addresses: addresses(),
        products: products(),
        applications: applications(),
        ..Dataset::default()
    };

    for seed in loan_seeds() {
        seed.book(&mut data);
    }

    data.top_ups.push(TopUp {
        id: TopUpId(1),
        loan_id: LoanId(1),
        requested_amount: 50_000,
        tenure_months: 6,
        interest_rate: 15.0,
        status: TopUpStatus::Requested,
        request_date: day(2025, 5, 25),
        approved_date: None,
    });

    data.closures.push(LoanClosure {
        id: ClosureId(1),
        loan_id: LoanId(3),
        closure_date: Some(day(2025, 5, 3)),
        status: ClosureStatus::Closed,
        settlement_amount: 0,
        remarks: Some("Closed on schedule".to_string()),
        closed_by: Some("Asha Rao".to_string()),
        request_date: day(2025, 5, 3),
    });

    assess_demo_penalties(&mut data);
    data
}

fn partners() -> Vec<Partner> {
    vec![
        Partner {
            id: PartnerId(1),
            name: "Deccan Rural Finance".to_string(),
            code: "DRF".to_string(),
            status: RecordStatus::Active,
            servicing_pincodes: strings(&["560001", "560002", "560003"]),
            created_at: stamp(2024, 1, 10),
            updated_at: stamp(2024, 1, 10),
        },
        Partner {
            id: PartnerId(2),
            name: "Coastal Credit Partners".to_string(),
            code: "CCP".to_string(),
            status: RecordStatus::Active,
            servicing_pincodes: strings(&["400001", "400002"]),
            created_at: stamp(2024, 2, 1),
            updated_at: stamp(2024, 6, 18),
        },
        Partner {
            id: PartnerId(3),
            name: "Northern Plains Lending".to_string(),
            code: "NPL".to_string(),
            status: RecordStatus::Inactive,
            servicing_pincodes: strings(&["110001"]),
            created_at: stamp(2024, 3, 5),
            updated_at: stamp(2025, 1, 2),
        },
    ]
}

fn users() -> Vec<User> {
    vec![
        User {
            id: UserId(1),
            name: "Asha Rao".to_string(),
            email: "asha.rao@loandesk.in".to_string(),
            role: UserRole::Admin,
            partner_id: None,
            status: RecordStatus::Active,
        },
        User {
            id: UserId(2),
            name: "Ravi Kumar".to_string(),
            email: "ravi.kumar@loandesk.in".to_string(),
            role: UserRole::Staff,
            partner_id: Some(PartnerId(1)),
            status: RecordStatus::Active,
        },
        User {
            id: UserId(3),
            name: "Meera Nair".to_string(),
            email: "meera.nair@loandesk.in".to_string(),
            role: UserRole::Staff,
            partner_id: Some(PartnerId(2)),
            status: RecordStatus::Active,
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn customer(
    id: u32,
    name: &str,
    phone: &str,
    dob: NaiveDate,
    gender: Gender,
    occupation: Option<&str>,
    monthly_income: Option<i64>,
    kyc_status: KycStatus,
    pincode: &str,
    partner_id: Option<u32>,
    created_at: DateTime<Utc>,
) -> Customer {
    Customer {
        id: CustomerId(id),
        name: name.to_string(),
        phone: phone.to_string(),
        email: format!("{}@example.in", name.to_lowercase().replace(' ', ".")),
        dob,
        gender,
        guardian_name: None,
        occupation: occupation.map(str::to_string),
        income_source: occupation.map(|_| "Salary".to_string()),
        monthly_income,
        kyc_status,
        pincode: pincode.to_string(),
        partner_id: partner_id.map(PartnerId),
        created_at,
    }
}

fn customers() -> Vec<Customer> {
    vec![
        customer(
            1,
            "Anita Sharma",
            "9876543210",
            day(1988, 4, 12),
            Gender::Female,
            Some("Teacher"),
            Some(45_000),
            KycStatus::Verified,
            "560001",
            Some(1),
            stamp(2024, 12, 10),
        ),
        customer(
            2,
            "Vikram Patel",
            "9823456710",
            day(1979, 9, 30),
            Gender::Male,
            Some("Shop Owner"),
            Some(80_000),
            KycStatus::Verified,
            "400001",
            Some(2),
            stamp(2024, 4, 20),
        ),
        customer(
            3,
            "Farah Khan",
            "9812345670",
            day(1995, 12, 1),
            Gender::Female,
            Some("Nurse"),
            Some(32_000),
            KycStatus::Pending,
            "560002",
            Some(1),
            stamp(2025, 5, 20),
        ),
        customer(
            4,
            "Joseph Mathew",
            "9898989898",
            day(1984, 7, 21),
            Gender::Male,
            Some("Driver"),
            Some(28_000),
            KycStatus::Verified,
            "400002",
            Some(2),
            stamp(2024, 12, 28),
        ),
        customer(
            5,
            "Sunil Verma",
            "9800011122",
            day(2000, 2, 2),
            Gender::Male,
            None,
            None,
            KycStatus::NotStarted,
            "110001",
            None,
            stamp(2025, 5, 28),
        ),
    ]
}

fn addresses() -> Vec<Address> {
    vec![
        Address {
            id: AddressId(1),
            customer_id: CustomerId(1),
            kind: AddressKind::Residence,
            line1: "14 MG Road".to_string(),
            line2: Some("Near Trinity Circle".to_string()),
            city: "Bengaluru".to_string(),
            state: Some("Karnataka".to_string()),
            pincode: "560001".to_string(),
            is_verified: true,
            verification_date: Some(day(2024, 12, 12)),
        },
        Address {
            id: AddressId(2),
            customer_id: CustomerId(2),
            kind: AddressKind::Office,
            line1: "Shop 7, Crawford Market".to_string(),
            line2: None,
            city: "Mumbai".to_string(),
            state: Some("Maharashtra".to_string()),
            pincode: "400001".to_string(),
            is_verified: true,
            verification_date: Some(day(2024, 4, 25)),
        },
        Address {
            id: AddressId(3),
            customer_id: CustomerId(3),
            kind: AddressKind::Residence,
            line1: "22 Residency Road".to_string(),
            line2: None,
            city: "Bengaluru".to_string(),
            state: Some("Karnataka".to_string()),
            pincode: "560002".to_string(),
            is_verified: false,
            verification_date: None,
        },
    ]
}

fn products() -> Vec<LoanProduct> {
    vec![
        LoanProduct {
            id: ProductId(1),
            name: "Personal Loan".to_string(),
            code: "PL-STD".to_string(),
            description: "Unsecured personal loan for salaried customers".to_string(),
            category: ProductCategory::Personal,
            min_amount: 10_000,
            max_amount: 500_000,
            min_tenure_months: 6,
            max_tenure_months: 60,
            interest_rate: 14.0,
            processing_fee: 1_500,
            prepayment_penalty: 2.0,
            late_payment_penalty: 1.5,
            eligibility: EligibilityCriteria {
                min_age: 21,
                max_age: 60,
                min_income: 25_000,
                required_documents: strings(&["PAN", "Aadhaar", "Salary Slip"]),
                credit_score_required: true,
            },
            status: RecordStatus::Active,
            created_at: stamp(2024, 1, 15),
            updated_at: stamp(2024, 1, 15),
        },
        LoanProduct {
            id: ProductId(2),
            name: "Business Growth Loan".to_string(),
            code: "BL-GROW".to_string(),
            description: "Working capital for small traders".to_string(),
            category: ProductCategory::Business,
            min_amount: 50_000,
            max_amount: 2_000_000,
            min_tenure_months: 12,
            max_tenure_months: 84,
            interest_rate: 16.5,
            processing_fee: 5_000,
            prepayment_penalty: 3.0,
            late_payment_penalty: 2.0,
            eligibility: EligibilityCriteria {
                min_age: 25,
                max_age: 65,
                min_income: 50_000,
                required_documents: strings(&["PAN", "GST Certificate", "Bank Statement"]),
                credit_score_required: true,
            },
            status: RecordStatus::Active,
            created_at: stamp(2024, 1, 15),
            updated_at: stamp(2024, 9, 1),
        },
        LoanProduct {
            id: ProductId(3),
            name: "Education Loan".to_string(),
            code: "EDU-01".to_string(),
            description: "Tuition financing for higher studies".to_string(),
            category: ProductCategory::Education,
            min_amount: 20_000,
            max_amount: 1_000_000,
            min_tenure_months: 12,
            max_tenure_months: 120,
            interest_rate: 10.5,
            processing_fee: 1_000,
            prepayment_penalty: 0.0,
            late_payment_penalty: 1.0,
            eligibility: EligibilityCriteria {
                min_age: 18,
                max_age: 35,
                min_income: 0,
                required_documents: strings(&["Admission Letter", "Aadhaar"]),
                credit_score_required: false,
            },
            status: RecordStatus::Inactive,
            created_at: stamp(2024, 2, 1),
            updated_at: stamp(2025, 2, 1),
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn application(
    id: u32,
    customer_id: u32,
    product: (u32, &str),
    amount: i64,
    interest_rate: f64,
    tenure_months: u32,
    purpose: &str,
    status: ApplicationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> LoanApplication {
    LoanApplication {
        id: ApplicationId(id),
        customer_id: CustomerId(customer_id),
        co_applicant_ids: Vec::new(),
        guarantor_ids: Vec::new(),
        amount,
        product_id: ProductId(product.0),
        product: product.1.to_string(),
        purpose: purpose.to_string(),
        interest_rate,
        tenure_months,
        repayment_frequency: RepaymentFrequency::Monthly,
        status,
        remarks: None,
        documents: strings(&["PAN", "Aadhaar"]),
        created_at,
        updated_at,
    }
}

fn applications() -> Vec<LoanApplication> {
    let personal = (1, "Personal Loan");
    let business = (2, "Business Growth Loan");
    let mut list = vec![
        application(
            1,
            1,
            personal,
            100_000,
            12.0,
            12,
            "Home renovation",
            ApplicationStatus::Approved,
            stamp(2024, 12, 20),
            stamp(2024, 12, 28),
        ),
        application(
            2,
            2,
            business,
            600_000,
            16.5,
            36,
            "Inventory expansion",
            ApplicationStatus::Approved,
            stamp(2025, 2, 6),
            stamp(2025, 2, 16),
        ),
        application(
            3,
            2,
            personal,
            40_000,
            14.0,
            12,
            "Medical expenses",
            ApplicationStatus::Approved,
            stamp(2024, 4, 28),
            stamp(2024, 5, 3),
        ),
        application(
            4,
            4,
            personal,
            25_000,
            14.0,
            12,
            "Vehicle repair",
            ApplicationStatus::Approved,
            stamp(2025, 1, 10),
            stamp(2025, 1, 20),
        ),
        application(
            5,
            4,
            personal,
            150_000,
            14.0,
            24,
            "Debt consolidation",
            ApplicationStatus::UnderReview,
            stamp(2025, 5, 10),
            stamp(2025, 5, 12),
        ),
        application(
            6,
            3,
            personal,
            50_000,
            14.0,
            12,
            "Wedding expenses",
            ApplicationStatus::Submitted,
            stamp(2025, 5, 25),
            stamp(2025, 5, 25),
        ),
        application(
            7,
            4,
            personal,
            80_000,
            14.0,
            18,
            "Travel",
            ApplicationStatus::Rejected,
            stamp(2025, 3, 20),
            stamp(2025, 3, 25),
        ),
        application(
            8,
            1,
            business,
            250_000,
            16.5,
            24,
            "Tuition centre fit-out",
            ApplicationStatus::Draft,
            stamp(2025, 5, 30),
            stamp(2025, 5, 30),
        ),
    ];
    list[6].remarks = Some("Income below product threshold".to_string());
    list
}

/// A loan with its history up to [`demo_as_of`].
struct LoanSeed {
    id: u32,
    application_id: u32,
    customer_id: u32,
    amount: i64,
    interest_rate: f64,
    tenure_months: u32,
    disbursed: NaiveDate,
    processing_fee: i64,
    status: LoanStatus,
    installments_paid: u32,
    installments_overdue: u32,
    agent: &'static str,
    payment_mode: PaymentMode,
}

fn loan_seeds() -> Vec<LoanSeed> {
    vec![
        LoanSeed {
            id: 1,
            application_id: 1,
            customer_id: 1,
            amount: 100_000,
            interest_rate: 12.0,
            tenure_months: 12,
            disbursed: day(2025, 1, 1),
            processing_fee: 1_500,
            status: LoanStatus::Active,
            installments_paid: 4,
            installments_overdue: 0,
            agent: "Kiran Desai",
            payment_mode: PaymentMode::Upi,
        },
        LoanSeed {
            id: 2,
            application_id: 2,
            customer_id: 2,
            amount: 600_000,
            interest_rate: 16.5,
            tenure_months: 36,
            disbursed: day(2025, 2, 16),
            processing_fee: 5_000,
            status: LoanStatus::Active,
            installments_paid: 2,
            installments_overdue: 1,
            agent: "Deepak Shetty",
            payment_mode: PaymentMode::BankTransfer,
        },
        LoanSeed {
            id: 3,
            application_id: 3,
            customer_id: 2,
            amount: 40_000,
            interest_rate: 14.0,
            tenure_months: 12,
            disbursed: day(2024, 5, 3),
            processing_fee: 1_500,
            status: LoanStatus::Closed,
            installments_paid: 12,
            installments_overdue: 0,
            agent: "Deepak Shetty",
            payment_mode: PaymentMode::Cash,
        },
        LoanSeed {
            id: 4,
            application_id: 4,
            customer_id: 4,
            amount: 25_000,
            interest_rate: 14.0,
            tenure_months: 12,
            disbursed: day(2025, 1, 20),
            processing_fee: 1_500,
            status: LoanStatus::Defaulted,
            installments_paid: 1,
            installments_overdue: 3,
            agent: "Deepak Shetty",
            payment_mode: PaymentMode::Cash,
        },
    ]
}

impl LoanSeed {
    fn book(self, data: &mut Dataset) {
        let as_of = demo_as_of();
        let emi = level_installment(self.amount, self.interest_rate, self.tenure_months);
        let rows = generate_amortization_schedule(
            self.amount,
            self.interest_rate,
            self.tenure_months,
            self.disbursed,
        );
        let overdue_days = |due: NaiveDate| (as_of - due).num_days().max(0) as u32;

        let first_overdue = self.installments_paid + 1;
        let last_overdue = self.installments_paid + self.installments_overdue;
        let oldest_overdue = rows
            .iter()
            .find(|row| row.installment_number == first_overdue && self.installments_overdue > 0)
            .map(|row| overdue_days(row.due_date));

        let loan = Loan {
            id: LoanId(self.id),
            customer_id: CustomerId(self.customer_id),
            application_id: ApplicationId(self.application_id),
            amount: self.amount,
            interest_rate: self.interest_rate,
            tenure_months: self.tenure_months,
            emi,
            disbursement_date: self.disbursed,
            grace_period_days: 0,
            repayment_frequency: RepaymentFrequency::Monthly,
            amortization_type: AmortizationType::Emi,
            overdue_days: oldest_overdue,
            status: self.status,
            co_applicant_ids: Vec::new(),
            guarantor_ids: Vec::new(),
            created_at: self.disbursed.and_hms_opt(10, 0, 0).unwrap_or_default().and_utc(),
            updated_at: as_of.and_hms_opt(10, 0, 0).unwrap_or_default().and_utc(),
        };
        data.loans.push(loan.clone());
        post_disbursement(data, &loan, self.processing_fee);

        let mut pending_booked = false;
        for row in &rows {
            let number = row.installment_number;
            let (status, days) = if number <= self.installments_paid {
                post_installment(
                    data,
                    &loan,
                    &InstallmentPayment {
                        installment_number: number,
                        due_date: row.due_date,
                        paid_date: row.due_date,
                        principal: row.principal,
                        interest: row.interest,
                        payment_mode: self.payment_mode,
                        collection_agent: Some(self.agent.to_string()),
                        remarks: None,
                    },
                );
                (ScheduleStatus::Paid, 0)
            } else if number <= last_overdue {
                let days = overdue_days(row.due_date);
                data.insert_repayment(unpaid(
                    &loan,
                    row,
                    RepaymentStatus::Overdue,
                    days,
                    self.agent,
                ));
                (ScheduleStatus::Overdue, days)
            } else {
                if !pending_booked && self.status != LoanStatus::Closed {
                    data.insert_repayment(unpaid(
                        &loan,
                        row,
                        RepaymentStatus::Pending,
                        0,
                        self.agent,
                    ));
                    pending_booked = true;
                }
                let status = if row.due_date == as_of {
                    ScheduleStatus::Due
                } else {
                    ScheduleStatus::Upcoming
                };
                (status, 0)
            };

            data.insert_schedule(CollectionSchedule {
                id: ScheduleId(0),
                loan_id: loan.id,
                customer_id: loan.customer_id,
                due_date: row.due_date,
                emi_amount: row.emi,
                status,
                overdue_days: days,
                collection_agent: Some(self.agent.to_string()),
                last_reminder_date: (days > 0).then_some(as_of),
                next_reminder_date: (status != ScheduleStatus::Paid).then_some(row.due_date),
                priority: CollectionPriority::for_overdue_days(days),
            });
        }
    }
}

fn unpaid(
    loan: &Loan,
    row: &AmortizationRow,
    status: RepaymentStatus,
    overdue_days: u32,
    agent: &str,
) -> Repayment {
    Repayment {
        id: RepaymentId(0),
        loan_id: loan.id,
        installment_number: row.installment_number,
        due_date: row.due_date,
        paid_date: None,
        paid_amount: 0,
        expected_amount: row.emi,
        principal_amount: row.principal,
        interest_amount: row.interest,
        payment_mode: PaymentMode::Cash,
        is_advance_payment: false,
        status,
        overdue_days,
        collection_agent: Some(agent.to_string()),
        remarks: None,
    }
}

/// One uncollected late fee on the defaulted loan and one collected on loan 2.
fn assess_demo_penalties(data: &mut Dataset) {
    let as_of = demo_as_of();
    let Some(product) = data.products.first().cloned() else {
        return;
    };

    let overdue = data
        .repayments
        .iter()
        .find(|r| r.loan_id == LoanId(4) && r.status == RepaymentStatus::Overdue)
        .map(|r| (r.id, r.expected_amount));
    if let Some((repayment_id, expected)) = overdue {
        data.insert_penalty(Penalty {
            id: PenaltyId(0),
            loan_id: LoanId(4),
            repayment_id: Some(repayment_id),
            date: as_of,
            amount: late_payment_penalty(&product, expected),
            reason: "Late payment".to_string(),
            penalty_type: PenaltyType::LatePayment,
            calculation_method: CalculationMethod::Percentage,
        });
    }

    data.insert_penalty(Penalty {
        id: PenaltyId(0),
        loan_id: LoanId(2),
        repayment_id: None,
        date: day(2025, 4, 20),
        amount: 500,
        reason: "Cheque bounce".to_string(),
        penalty_type: PenaltyType::BounceCharge,
        calculation_method: CalculationMethod::Fixed,
    });
    data.insert_voucher(Voucher {
        id: VoucherId(0),
        kind: VoucherKind::Receipt,
        amount: 500,
        note: "Bounce charge collected".to_string(),
        loan_id: Some(LoanId(2)),
        customer_id: Some(CustomerId(2)),
        reference_id: Some("LOAN-2-PENALTY-1".to_string()),
        category: Some("Penalty".to_string()),
        date: day(2025, 4, 22),
    });
}
