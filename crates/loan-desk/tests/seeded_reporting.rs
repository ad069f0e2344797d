use loan_desk::lending::domain::UserId;
use loan_desk::lending::export::export_portfolio;
use loan_desk::lending::store::demo_as_of;
use loan_desk::lending::{generate_report, Dataset, Report, ReportFilter, ReportKind};

fn seeded() -> Dataset {
    let json = serde_json::to_string(&Dataset::demo()).expect("demo serializes");
    Dataset::from_reader(json.as_bytes()).expect("seed parses")
}

#[test]
fn seed_file_reproduces_the_demo_book() {
    assert_eq!(seeded(), Dataset::demo());
}

#[test]
fn partial_seed_defaults_missing_collections() {
    let data = Dataset::from_reader(r#"{ "partners": [] }"#.as_bytes()).expect("seed parses");
    assert!(data.loans.is_empty());
    assert!(data.users.is_empty());
}

#[test]
fn malformed_seed_is_rejected() {
    assert!(Dataset::from_reader("{ not json".as_bytes()).is_err());
}

#[test]
fn partner_staff_portfolio_exports_their_book_only() {
    let data = seeded();
    let staff = data.user(UserId(3)).expect("partner staff").clone();
    let report = generate_report(
        ReportKind::Portfolio,
        &data,
        &staff,
        &ReportFilter::default(),
        demo_as_of(),
    );
    let Report::Portfolio(portfolio) = report else {
        panic!("portfolio report expected");
    };
    assert_eq!(portfolio.total_loans, 3);
    assert_eq!(portfolio.total_disbursed, 665_000);

    let mut sheet = Vec::new();
    export_portfolio(&mut sheet, &portfolio).expect("csv written");
    let sheet = String::from_utf8(sheet).expect("utf-8 csv");
    assert!(sheet.starts_with("metric,value\n"));
    assert!(sheet.contains("total_loans,3\n"));
    assert!(sheet.contains("total_disbursed,665000\n"));
}
