use chrono::NaiveDate;

use super::*;
use crate::lending::domain::{CustomerId, UserId};
use crate::lending::store::demo_as_of;

fn demo() -> Dataset {
    Dataset::demo()
}

fn user(data: &Dataset, id: u32) -> User {
    data.user(UserId(id)).cloned().expect("seeded user")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn filter_needs_both_ends_for_a_date_range() {
    let open = ReportFilter {
        start_date: Some(day(2025, 1, 1)),
        ..ReportFilter::default()
    };
    assert!(open.admits(day(2020, 1, 1)));

    let closed = ReportFilter {
        start_date: Some(day(2025, 1, 1)),
        end_date: Some(day(2025, 1, 31)),
        ..ReportFilter::default()
    };
    assert!(closed.admits(day(2025, 1, 1)));
    assert!(closed.admits(day(2025, 1, 31)));
    assert!(!closed.admits(day(2025, 2, 1)));
}

#[test]
fn report_kinds_parse_from_labels() {
    assert_eq!("Risk".parse::<ReportKind>(), Ok(ReportKind::Risk));
    assert_eq!(" portfolio ".parse::<ReportKind>(), Ok(ReportKind::Portfolio));
    assert!("ledger".parse::<ReportKind>().is_err());
}

#[test]
fn portfolio_counts_the_whole_book_for_admins() {
    let data = demo();
    let report = generate_portfolio_report(
        &data.loans,
        &data.repayments,
        &data.customers,
        &ReportFilter::default(),
    );

    assert_eq!(report.total_loans, 4);
    assert_eq!(report.active_loans, 2);
    assert_eq!(report.closed_loans, 1);
    assert_eq!(report.defaulted_loans, 1);
    assert_eq!(report.total_disbursed, 765_000);
    assert_eq!(report.overdue_loans, 1);
    let loan_two = data.loan(LoanId(2)).expect("loan 2");
    assert_eq!(report.overdue_amount, loan_two.emi);
    assert!(report.collection_efficiency > 0.0 && report.collection_efficiency < 100.0);
}

#[test]
fn portfolio_partner_filter_goes_through_the_customer() {
    let data = demo();
    let filter = ReportFilter {
        partner_id: Some(PartnerId(1)),
        ..ReportFilter::default()
    };
    let report = generate_portfolio_report(&data.loans, &data.repayments, &data.customers, &filter);

    let loan_one = data.loan(LoanId(1)).expect("loan 1");
    assert_eq!(report.total_loans, 1);
    assert_eq!(report.total_disbursed, 100_000);
    assert_eq!(report.total_outstanding, data.outstanding_principal(loan_one));
    assert_eq!(report.average_interest_rate, 12.0);
}

#[test]
fn portfolio_date_filter_uses_disbursement_date() {
    let data = demo();
    let filter = ReportFilter {
        start_date: Some(day(2025, 1, 1)),
        end_date: Some(day(2025, 1, 31)),
        ..ReportFilter::default()
    };
    let report = generate_portfolio_report(&data.loans, &data.repayments, &data.customers, &filter);
    assert_eq!(report.total_loans, 2);
    assert_eq!(report.total_disbursed, 125_000);
}

#[test]
fn empty_portfolio_has_zero_ratios() {
    let report = generate_portfolio_report(&[], &[], &[], &ReportFilter::default());
    assert_eq!(report.total_loans, 0);
    assert_eq!(report.average_loan_size, 0.0);
    assert_eq!(report.collection_efficiency, 0.0);
}

#[test]
fn collection_windows_start_today() {
    let data = demo();
    let report =
        generate_collection_report(&data.collection_schedules, &ReportFilter::default(), demo_as_of());

    assert_eq!(report.due_today, 1);
    assert_eq!(report.due_this_week, 1);
    assert_eq!(report.due_this_month, 4);
    assert_eq!(report.overdue_loans, 4);
}

#[test]
fn agents_are_listed_by_name() {
    let data = demo();
    let report =
        generate_collection_report(&data.collection_schedules, &ReportFilter::default(), demo_as_of());

    let names: Vec<&str> = report
        .agent_performance
        .iter()
        .map(|agent| agent.agent_name.as_str())
        .collect();
    assert_eq!(names, ["Deepak Shetty", "Kiran Desai"]);

    let kiran = &report.agent_performance[1];
    assert_eq!(kiran.total_assigned, 12);
    assert_eq!(kiran.collected, 4);
    assert_eq!(kiran.overdue, 0);
    assert!((kiran.efficiency - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn financial_report_splits_fees_and_penalties() {
    let data = demo();
    let report =
        generate_financial_report(&data.vouchers, &data.journals, &ReportFilter::default());

    assert_eq!(report.fees_collected, 9_500);
    assert_eq!(report.penalties_collected, 500);
    assert_eq!(report.net_balance, report.total_receipts - report.total_payments);
    assert!(report.interest_earned > 0);

    let months: Vec<&str> = report
        .monthly_breakdown
        .iter()
        .map(|month| month.month.as_str())
        .collect();
    let mut sorted = months.clone();
    sorted.sort_unstable();
    assert_eq!(months, sorted);
    assert_eq!(months.first(), Some(&"2024-05"));
    let interest: i64 = report.monthly_breakdown.iter().map(|m| m.interest_earned).sum();
    assert_eq!(interest, report.interest_earned);
}

#[test]
fn customer_report_counts_new_and_active_borrowers() {
    let data = demo();
    let report = generate_customer_report(
        &data.customers,
        &data.loans,
        &data.partners,
        &ReportFilter::default(),
        demo_as_of(),
    );

    assert_eq!(report.total_customers, 5);
    assert_eq!(report.new_customers, 2);
    assert_eq!(report.active_customers, 2);
    assert_eq!(report.kyc_pending, 1);
    assert_eq!(report.kyc_verified, 3);
    assert_eq!(report.kyc_rejected, 0);

    let deccan = &report.customers_by_partner[0];
    assert_eq!(deccan.partner_name, "Deccan Rural Finance");
    assert_eq!(deccan.total_customers, 2);
    assert_eq!(deccan.active_loans, 1);
    assert_eq!(deccan.total_disbursed, 100_000);
}

#[test]
fn application_report_rates_and_processing_time() {
    let data = demo();
    let report =
        generate_application_report(&data.applications, &data.customers, &ReportFilter::default());

    assert_eq!(report.total_applications, 8);
    assert_eq!(report.approved_applications, 4);
    assert_eq!(report.rejected_applications, 1);
    assert_eq!(report.pending_applications, 3);
    assert_eq!(report.approval_rate, 50.0);
    assert!((report.average_processing_days - 7.6).abs() < 1e-9);

    let products: Vec<&str> = report
        .applications_by_product
        .iter()
        .map(|row| row.product.as_str())
        .collect();
    assert_eq!(products, ["Business Growth Loan", "Personal Loan"]);
}

#[test]
fn application_filters_compose() {
    let data = demo();
    let by_partner = ReportFilter {
        partner_id: Some(PartnerId(1)),
        ..ReportFilter::default()
    };
    let report = generate_application_report(&data.applications, &data.customers, &by_partner);
    assert_eq!(report.total_applications, 3);

    let narrowed = ReportFilter {
        status: Some("under review".to_string()),
        product: Some("Personal Loan".to_string()),
        ..ReportFilter::default()
    };
    let report = generate_application_report(&data.applications, &data.customers, &narrowed);
    assert_eq!(report.total_applications, 1);
    assert_eq!(report.pending_applications, 1);
}

#[test]
fn risk_scores_rank_customers() {
    let data = demo();
    let risk = generate_risk_metrics(&data.loans, &data.customers, &data.repayments);

    assert_eq!(risk.total_portfolio, 765_000);
    assert_eq!(risk.defaulted_amount, 25_000);
    assert_eq!(risk.bands, RiskBands { low: 0, medium: 0, high: 4 });
    assert!(
        (risk.total_risk_exposure - (risk.portfolio_at_risk + risk.default_rate)).abs() < 1e-9
    );

    let ranked: Vec<(CustomerId, u32)> = risk
        .customers
        .iter()
        .map(|c| (c.customer_id, c.risk_score))
        .collect();
    assert_eq!(
        ranked,
        [
            (CustomerId(2), 70),
            (CustomerId(4), 40),
            (CustomerId(1), 30),
            (CustomerId(3), 10),
            (CustomerId(5), 0),
        ]
    );
}

#[test]
fn staff_reports_are_scoped_to_their_partner() {
    let data = demo();
    let staff = user(&data, 2);
    let Report::Portfolio(report) = generate_report(
        ReportKind::Portfolio,
        &data,
        &staff,
        &ReportFilter::default(),
        demo_as_of(),
    ) else {
        panic!("expected a portfolio report");
    };
    assert_eq!(report.total_loans, 1);

    let scoped = scope_dataset(&data, &staff);
    assert_eq!(scoped.partners.len(), 1);
    assert!(scoped.repayments.iter().all(|r| r.loan_id == LoanId(1)));
    assert!(scoped
        .vouchers
        .iter()
        .all(|v| v.loan_id == Some(LoanId(1)) || v.customer_id == Some(CustomerId(1))));
}

#[test]
fn admin_scope_is_the_whole_dataset() {
    let data = demo();
    assert_eq!(scope_dataset(&data, &user(&data, 1)), data);
}

#[test]
fn dashboard_summarises_the_users_slice() {
    let data = demo();
    let admin = generate_dashboard_summary(&data, &user(&data, 1), demo_as_of());
    assert_eq!(admin.total_customers, 5);
    assert_eq!(admin.total_applications, 8);
    assert_eq!(admin.active_loans, 2);
    assert_eq!(admin.total_disbursed, 765_000);
    assert_eq!(admin.overdue_loans, 2);
    assert_eq!(admin.pending_applications, 3);
    assert_eq!(admin.kyc_pending, 1);
    assert_eq!(admin.due_today, 1);
    assert_eq!(admin.critical_alerts, 2);

    let staff = generate_dashboard_summary(&data, &user(&data, 3), demo_as_of());
    assert_eq!(staff.total_customers, 2);
    assert_eq!(staff.due_today, 0);
    assert_eq!(staff.critical_alerts, 2);
}
