use crate::infra::build_service;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::Args;
use loan_desk::config::{AppConfig, LendingSettings};
use loan_desk::error::AppError;
use loan_desk::lending::domain::{LoanStatus, PartnerId, PaymentMode, UserId};
use loan_desk::lending::export::{
    export_agent_performance, export_application_products, export_monthly_financials,
    export_portfolio, export_schedule,
};
use loan_desk::lending::format::{format_currency, format_percentage};
use loan_desk::lending::notifications::{critical_count, generate_notifications};
use loan_desk::lending::reports::generate_dashboard_summary;
use loan_desk::lending::search::search_all;
use loan_desk::lending::service::PaymentDraft;
use loan_desk::lending::store::demo_as_of;
use loan_desk::lending::{
    calculate_prepayment_savings, generate_report, validate_terms, EmiQuote, LendingConfig, Report,
    ReportFilter, ReportKind,
};
use std::fs::File;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EmiQuoteArgs {
    /// Principal in whole rupees
    #[arg(long)]
    pub(crate) principal: i64,
    /// Annual interest rate in percent
    #[arg(long)]
    pub(crate) rate: f64,
    /// Tenure in months
    #[arg(long)]
    pub(crate) tenure: u32,
    /// Disbursement date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) disbursed: Option<NaiveDate>,
    /// Write the schedule as CSV instead of printing it
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PrepaymentArgs {
    #[arg(long)]
    pub(crate) principal: i64,
    #[arg(long)]
    pub(crate) rate: f64,
    #[arg(long)]
    pub(crate) tenure: u32,
    /// Lump sum paid towards principal
    #[arg(long)]
    pub(crate) amount: i64,
    /// Installments already paid
    #[arg(long, default_value_t = 0)]
    pub(crate) months_paid: u32,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// portfolio, collection, financial, customer, application or risk
    pub(crate) kind: ReportKind,
    /// User whose partner scope applies
    #[arg(long, default_value_t = 1)]
    pub(crate) user: u32,
    /// Reporting date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: Option<NaiveDate>,
    #[arg(long)]
    pub(crate) partner: Option<u32>,
    /// Application status label
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Product name
    #[arg(long)]
    pub(crate) product: Option<String>,
    /// Write the report's table as CSV instead of printing JSON
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// User to act as; partner staff only see their own book
    #[arg(long, default_value_t = 1)]
    pub(crate) user: u32,
    /// Override the demo date
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn io_error(err: impl Into<std::io::Error>) -> AppError {
    AppError::Io(err.into())
}

fn invalid_input(message: impl ToString) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}

pub(crate) fn run_emi_quote(args: EmiQuoteArgs) -> Result<(), AppError> {
    validate_terms(args.principal, args.rate, args.tenure).map_err(invalid_input)?;
    let disbursed = args.disbursed.unwrap_or_else(|| Utc::now().date_naive());
    let quote = EmiQuote::new(args.principal, args.rate, args.tenure, disbursed);

    println!(
        "EMI {} for {} months at {} on {}",
        format_currency(quote.emi),
        quote.tenure_months,
        format_percentage(quote.annual_rate),
        format_currency(quote.principal)
    );
    println!(
        "- Total interest {} | total payable {}",
        format_currency(quote.total_interest),
        format_currency(quote.total_amount)
    );

    if let Some(path) = args.csv {
        let file = File::create(&path)?;
        export_schedule(file, &quote.schedule).map_err(io_error)?;
        println!("- Schedule written to {}", path.display());
        return Ok(());
    }

    println!("\n  #  due date     principal    interest  outstanding");
    for row in &quote.schedule {
        println!(
            "{:>3}  {}  {:>10}  {:>10}  {:>11}",
            row.installment_number,
            row.due_date,
            format_currency(row.principal),
            format_currency(row.interest),
            format_currency(row.outstanding_balance)
        );
    }
    Ok(())
}

pub(crate) fn run_prepayment(args: PrepaymentArgs) -> Result<(), AppError> {
    validate_terms(args.principal, args.rate, args.tenure).map_err(invalid_input)?;
    if args.amount < 0 {
        return Err(invalid_input("prepayment amount must not be negative"));
    }
    let savings = calculate_prepayment_savings(
        args.principal,
        args.rate,
        args.tenure,
        args.amount,
        args.months_paid,
    );
    println!(
        "Prepaying {} after {} installments",
        format_currency(args.amount),
        args.months_paid
    );
    println!(
        "- New EMI {} over {} months",
        format_currency(savings.new_emi),
        savings.new_tenure
    );
    println!("- Interest saved {}", format_currency(savings.interest_saved));
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config.lending)?;
    let user = service.user(UserId(args.user))?;
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let filter = ReportFilter {
        start_date: args.start,
        end_date: args.end,
        partner_id: args.partner.map(PartnerId),
        status: args.status,
        product: args.product,
    };

    let report = service.with_dataset(|data| generate_report(args.kind, data, &user, &filter, today))?;

    match args.csv {
        Some(path) => {
            let file = File::create(&path)?;
            let written = match &report {
                Report::Portfolio(report) => export_portfolio(file, report),
                Report::Collection(report) => export_agent_performance(file, &report.agent_performance),
                Report::Financial(report) => export_monthly_financials(file, &report.monthly_breakdown),
                Report::Application(report) => {
                    export_application_products(file, &report.applications_by_product)
                }
                Report::Customer(_) | Report::Risk(_) => {
                    println!("The {} report has no tabular export", args.kind);
                    return Ok(());
                }
            };
            written.map_err(io_error)?;
            println!("{} report written to {}", args.kind, path.display());
        }
        None => {
            let body = serde_json::to_string_pretty(&report).map_err(io_error)?;
            println!("{body}");
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let settings = LendingSettings {
        seed_path: None,
        workflow: LendingConfig::default(),
    };
    let service = build_service(&settings)?;
    let user = service.user(UserId(args.user))?;
    let today = args.today.unwrap_or_else(demo_as_of);

    println!("Loan desk demo as {} ({:?}) on {}", user.name, user.role, today);

    let (summary, notifications) = service.with_dataset(|data| {
        (
            generate_dashboard_summary(data, &user, today),
            generate_notifications(data, &user, today),
        )
    })?;
    println!("\nDashboard");
    println!(
        "- {} customers | {} applications ({} pending) | {} active loans",
        summary.total_customers,
        summary.total_applications,
        summary.pending_applications,
        summary.active_loans
    );
    println!(
        "- Disbursed {} | collected {} | efficiency {}",
        format_currency(summary.total_disbursed),
        format_currency(summary.total_collected),
        format_percentage(summary.collection_efficiency)
    );
    println!(
        "- {} overdue loans worth {} | {} due today | {} KYC pending",
        summary.overdue_loans,
        format_currency(summary.overdue_amount),
        summary.due_today,
        summary.kyc_pending
    );

    println!(
        "\nAlerts ({} critical of {})",
        critical_count(&notifications),
        notifications.len()
    );
    for notification in notifications.iter().take(5) {
        println!(
            "  - [{:?}] {}: {}",
            notification.priority, notification.title, notification.message
        );
    }

    let visible = service.loans_for(&user)?;
    if let Some(loan) = visible.iter().find(|loan| loan.status == LoanStatus::Active) {
        let now = today.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
        let payment = PaymentDraft {
            payment_mode: PaymentMode::Upi,
            collection_agent: None,
            remarks: Some("demo collection".to_string()),
        };
        match service.pay_emi(loan.id, payment, now.and_utc()) {
            Ok(receipt) => println!(
                "\nCollected installment {} on loan {}: principal {} + interest {}, {} outstanding",
                receipt.installment_number,
                receipt.loan_id,
                format_currency(receipt.principal),
                format_currency(receipt.interest),
                format_currency(receipt.outstanding)
            ),
            Err(err) => println!("\nPayment on loan {} refused: {}", loan.id, err),
        }
    }

    let results = service.with_dataset(|data| search_all("an", data, &user))?;
    println!("\nSearch \"an\" ({} hits)", results.len());
    for result in results.iter().take(5) {
        println!("  - {:?} {}: {}", result.kind, result.title, result.subtitle);
    }

    Ok(())
}
