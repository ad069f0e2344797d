use crate::demo::{
    run_demo, run_emi_quote, run_prepayment, run_report, DemoArgs, EmiQuoteArgs, PrepaymentArgs,
    ReportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_desk::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Desk",
    about = "Run the loan back office service or its calculators and reports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// EMI and prepayment calculators
    Emi {
        #[command(subcommand)]
        command: EmiCommand,
    },
    /// Print a portfolio, collection, financial, customer, application or risk report
    Report(ReportArgs),
    /// Walk through the demo book: dashboard, alerts, a payment and search
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum EmiCommand {
    /// Quote the EMI and amortization schedule for a loan
    Quote(EmiQuoteArgs),
    /// Show the effect of a lump-sum prepayment
    Prepayment(PrepaymentArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON dataset to serve instead of the configured one
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Emi {
            command: EmiCommand::Quote(args),
        } => run_emi_quote(args),
        Command::Emi {
            command: EmiCommand::Prepayment(args),
        } => run_prepayment(args),
        Command::Report(args) => run_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
