//! Reducing-balance EMI math.
//!
//! Every function here is pure. Amounts are whole currency units; rates are annual
//! percentages. Rounding follows the nearest-unit rule at each installment so a
//! schedule can be reconciled against posted repayments line by line.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::Amount;

/// Largest principal the calculators accept.
pub const MAX_PRINCIPAL: Amount = 1_000_000_000_000;
/// Fifty years of monthly installments.
pub const MAX_TENURE_MONTHS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TermsError {
    #[error("principal must be between 1 and {}", MAX_PRINCIPAL)]
    Principal,
    #[error("annual rate must be a finite, non-negative percentage")]
    Rate,
    #[error("tenure must be between 1 and {} months", MAX_TENURE_MONTHS)]
    Tenure,
}

/// Checks calculator inputs before any schedule is laid out.
pub fn validate_terms(
    principal: Amount,
    annual_rate_percent: f64,
    tenure_months: u32,
) -> Result<(), TermsError> {
    if !(1..=MAX_PRINCIPAL).contains(&principal) {
        return Err(TermsError::Principal);
    }
    if !annual_rate_percent.is_finite() || annual_rate_percent < 0.0 {
        return Err(TermsError::Rate);
    }
    if !(1..=MAX_TENURE_MONTHS).contains(&tenure_months) {
        return Err(TermsError::Tenure);
    }
    Ok(())
}

/// Converts an annual percentage into the per-month decimal rate.
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

/// Equated monthly installment, rounded to the nearest unit.
///
/// A zero tenure or zero rate is degenerate and returns the principal unchanged.
pub fn calculate_emi(principal: Amount, annual_rate_percent: f64, tenure_months: u32) -> Amount {
    if tenure_months == 0 || annual_rate_percent == 0.0 {
        return principal;
    }

    let rate = monthly_rate(annual_rate_percent);
    let growth = (1.0 + rate).powf(f64::from(tenure_months));
    let emi = principal as f64 * rate * growth / (growth - 1.0);
    emi.round() as Amount
}

pub fn calculate_total_interest(principal: Amount, emi: Amount, tenure_months: u32) -> Amount {
    calculate_total_amount(principal, emi, tenure_months).saturating_sub(principal)
}

/// Saturates at `Amount::MAX` rather than wrapping.
pub fn calculate_total_amount(_principal: Amount, emi: Amount, tenure_months: u32) -> Amount {
    emi.saturating_mul(Amount::from(tenure_months))
}

/// One line of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub emi: Amount,
    pub principal: Amount,
    pub interest: Amount,
    pub outstanding_balance: Amount,
    pub cumulative_interest: Amount,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    installment: Amount,
    principal: Amount,
    interest: Amount,
    outstanding: Amount,
    cumulative_interest: Amount,
}

/// Installment actually collected each month. Interest-free loans are split
/// evenly instead of using the degenerate EMI.
pub fn level_installment(
    principal: Amount,
    annual_rate_percent: f64,
    tenure_months: u32,
) -> Amount {
    if annual_rate_percent == 0.0 && tenure_months > 0 {
        (principal as f64 / f64::from(tenure_months)).round() as Amount
    } else {
        calculate_emi(principal, annual_rate_percent, tenure_months)
    }
}

fn amortize(principal: Amount, annual_rate_percent: f64, tenure_months: u32) -> Vec<Split> {
    let rate = monthly_rate(annual_rate_percent);
    let installment = level_installment(principal, annual_rate_percent, tenure_months);

    let mut splits = Vec::with_capacity(tenure_months.min(MAX_TENURE_MONTHS) as usize);
    let mut outstanding = principal.max(0);
    let mut cumulative_interest: Amount = 0;

    for number in 1..=tenure_months {
        let interest = (outstanding as f64 * rate).round() as Amount;
        // The final installment absorbs accumulated rounding drift.
        let principal_paid = if number == tenure_months {
            outstanding
        } else {
            installment.saturating_sub(interest).clamp(0, outstanding)
        };

        outstanding -= principal_paid;
        cumulative_interest = cumulative_interest.saturating_add(interest);

        splits.push(Split {
            installment: if number == tenure_months {
                principal_paid.saturating_add(interest)
            } else {
                installment
            },
            principal: principal_paid,
            interest,
            outstanding,
            cumulative_interest,
        });
    }

    splits
}

/// Month-by-month breakdown of a loan. Due dates fall on the same day of each
/// following month, clamped to the month end where that day does not exist.
pub fn generate_amortization_schedule(
    principal: Amount,
    annual_rate_percent: f64,
    tenure_months: u32,
    disbursement_date: NaiveDate,
) -> Vec<AmortizationRow> {
    amortize(principal, annual_rate_percent, tenure_months)
        .into_iter()
        .zip(1..)
        .map(|(split, number)| AmortizationRow {
            installment_number: number,
            due_date: due_date_for(disbursement_date, number),
            emi: split.installment,
            principal: split.principal,
            interest: split.interest,
            outstanding_balance: split.outstanding,
            cumulative_interest: split.cumulative_interest,
        })
        .collect()
}

pub fn due_date_for(disbursement_date: NaiveDate, installment_number: u32) -> NaiveDate {
    disbursement_date
        .checked_add_months(Months::new(installment_number))
        .unwrap_or(NaiveDate::MAX)
}

/// Principal still owed after `installments_paid` scheduled payments.
pub fn outstanding_after(
    principal: Amount,
    annual_rate_percent: f64,
    tenure_months: u32,
    installments_paid: u32,
) -> Amount {
    if installments_paid == 0 {
        return principal;
    }
    amortize(principal, annual_rate_percent, tenure_months)
        .get(installments_paid as usize - 1)
        .map(|split| split.outstanding)
        .unwrap_or(0)
}

/// Effect of a lump-sum prepayment on the remaining term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaymentSavings {
    pub new_emi: Amount,
    pub new_tenure: u32,
    pub interest_saved: Amount,
    pub total_savings: Amount,
}

pub fn calculate_prepayment_savings(
    original_principal: Amount,
    annual_rate_percent: f64,
    original_tenure: u32,
    prepayment_amount: Amount,
    months_paid: u32,
) -> PrepaymentSavings {
    if months_paid >= original_tenure {
        return PrepaymentSavings::default();
    }

    let remaining_principal = outstanding_after(
        original_principal,
        annual_rate_percent,
        original_tenure,
        months_paid,
    );
    let remaining_tenure = original_tenure - months_paid;
    let new_principal = remaining_principal
        .saturating_sub(prepayment_amount.max(0))
        .max(0);

    if annual_rate_percent == 0.0 {
        let new_emi = level_installment(new_principal, 0.0, remaining_tenure);
        return PrepaymentSavings {
            new_emi,
            new_tenure: if new_principal > 0 { remaining_tenure } else { 0 },
            interest_saved: 0,
            total_savings: 0,
        };
    }

    let original_emi = calculate_emi(original_principal, annual_rate_percent, original_tenure);
    let original_interest =
        calculate_total_interest(remaining_principal, original_emi, remaining_tenure);

    if new_principal == 0 {
        return PrepaymentSavings {
            new_emi: 0,
            new_tenure: 0,
            interest_saved: original_interest,
            total_savings: original_interest,
        };
    }

    let new_emi = calculate_emi(new_principal, annual_rate_percent, remaining_tenure);
    let new_interest = calculate_total_interest(new_principal, new_emi, remaining_tenure);
    let interest_saved = original_interest.saturating_sub(new_interest);

    PrepaymentSavings {
        new_emi,
        new_tenure: remaining_tenure,
        interest_saved,
        total_savings: interest_saved,
    }
}

/// Calculator output combining the headline figures and the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmiQuote {
    pub principal: Amount,
    pub annual_rate: f64,
    pub tenure_months: u32,
    pub emi: Amount,
    pub total_interest: Amount,
    pub total_amount: Amount,
    pub schedule: Vec<AmortizationRow>,
}

impl EmiQuote {
    pub fn new(
        principal: Amount,
        annual_rate_percent: f64,
        tenure_months: u32,
        disbursement_date: NaiveDate,
    ) -> Self {
        let emi = calculate_emi(principal, annual_rate_percent, tenure_months);
        Self {
            principal,
            annual_rate: annual_rate_percent,
            tenure_months,
            emi,
            total_interest: calculate_total_interest(principal, emi, tenure_months),
            total_amount: calculate_total_amount(principal, emi, tenure_months),
            schedule: generate_amortization_schedule(
                principal,
                annual_rate_percent,
                tenure_months,
                disbursement_date,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disbursed() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date")
    }

    #[test]
    fn reference_loan_matches_known_figures() {
        let emi = calculate_emi(100_000, 12.0, 12);
        assert_eq!(emi, 8885);
        assert_eq!(calculate_total_interest(100_000, emi, 12), 6620);
        assert_eq!(calculate_total_amount(100_000, emi, 12), 106_620);

        let schedule = generate_amortization_schedule(100_000, 12.0, 12, disbursed());
        assert_eq!(schedule.len(), 12);
        assert_eq!(schedule[0].interest, 1000);
        assert_eq!(schedule[0].principal, 7885);
        assert_eq!(schedule[0].outstanding_balance, 92_115);
        assert_eq!(schedule[11].outstanding_balance, 0);
    }

    #[test]
    fn degenerate_inputs_return_principal() {
        assert_eq!(calculate_emi(50_000, 0.0, 24), 50_000);
        assert_eq!(calculate_emi(50_000, 14.5, 0), 50_000);
        assert!(generate_amortization_schedule(50_000, 14.5, 0, disbursed()).is_empty());
    }

    #[test]
    fn schedule_principal_always_sums_to_loan_amount() {
        let cases: [(Amount, f64, u32); 7] = [
            (100_000, 12.0, 12),
            (250_000, 10.5, 36),
            (75_000, 18.0, 7),
            (1_000, 24.0, 60),
            (5, 0.0, 8),
            (90_000, 0.0, 12),
            (3_333_333, 9.99, 240),
        ];

        for (principal, rate, tenure) in cases {
            let schedule = generate_amortization_schedule(principal, rate, tenure, disbursed());
            let total: Amount = schedule.iter().map(|row| row.principal).sum();
            assert_eq!(total, principal, "principal drift for {principal} @ {rate}% x {tenure}");

            let last = schedule.last().expect("non-empty schedule");
            assert_eq!(last.outstanding_balance, 0);
            assert!(schedule.iter().all(|row| row.outstanding_balance >= 0));
            assert!(schedule.iter().all(|row| row.principal >= 0));
        }
    }

    #[test]
    fn cumulative_interest_is_running_total() {
        let schedule = generate_amortization_schedule(250_000, 10.5, 36, disbursed());
        let mut running = 0;
        for row in &schedule {
            running += row.interest;
            assert_eq!(row.cumulative_interest, running);
        }
        let last = schedule.last().expect("rows");
        assert_eq!(last.emi, last.principal + last.interest);
    }

    #[test]
    fn due_dates_step_by_calendar_month() {
        let schedule = generate_amortization_schedule(60_000, 12.0, 3, disbursed());
        let dates: Vec<_> = schedule.iter().map(|row| row.due_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 2, 15).expect("valid"),
                NaiveDate::from_ymd_opt(2025, 3, 15).expect("valid"),
                NaiveDate::from_ymd_opt(2025, 4, 15).expect("valid"),
            ]
        );

        let month_end = NaiveDate::from_ymd_opt(2025, 1, 31).expect("valid");
        assert_eq!(
            due_date_for(month_end, 1),
            NaiveDate::from_ymd_opt(2025, 2, 28).expect("valid")
        );
    }

    #[test]
    fn interest_free_schedule_splits_evenly() {
        let schedule = generate_amortization_schedule(90_000, 0.0, 12, disbursed());
        assert!(schedule.iter().all(|row| row.interest == 0));
        assert!(schedule.iter().all(|row| row.principal == 7_500));
    }

    #[test]
    fn prepayment_after_full_tenure_saves_nothing() {
        let savings = calculate_prepayment_savings(100_000, 12.0, 12, 10_000, 12);
        assert_eq!(savings, PrepaymentSavings::default());
    }

    #[test]
    fn prepayment_recomputes_emi_over_remaining_term() {
        let savings = calculate_prepayment_savings(100_000, 12.0, 12, 20_000, 6);
        let remaining = outstanding_after(100_000, 12.0, 12, 6);
        assert_eq!(savings.new_tenure, 6);
        assert_eq!(savings.new_emi, calculate_emi(remaining - 20_000, 12.0, 6));
        assert!(savings.new_emi < 8885);
        assert!(savings.interest_saved > 0);
        assert_eq!(savings.interest_saved, savings.total_savings);
    }

    #[test]
    fn prepayment_covering_balance_saves_all_remaining_interest() {
        let savings = calculate_prepayment_savings(100_000, 12.0, 12, 500_000, 3);
        let remaining = outstanding_after(100_000, 12.0, 12, 3);
        assert_eq!(savings.new_emi, 0);
        assert_eq!(savings.new_tenure, 0);
        assert_eq!(savings.interest_saved, 8885 * 9 - remaining);
    }

    #[test]
    fn interest_free_installment_is_the_even_split() {
        assert_eq!(level_installment(60_000, 0.0, 12), 5_000);
        assert_eq!(level_installment(100_000, 12.0, 12), calculate_emi(100_000, 12.0, 12));
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let principal = Amount::MAX / 4;
        let emi = calculate_emi(principal, 12.0, 1_000);
        assert_eq!(calculate_total_amount(principal, emi, 1_000), Amount::MAX);
        assert_eq!(
            calculate_total_interest(principal, emi, 1_000),
            Amount::MAX - principal
        );
    }

    #[test]
    fn terms_outside_the_calculator_range_are_refused() {
        assert_eq!(validate_terms(100_000, 12.0, 12), Ok(()));
        assert_eq!(validate_terms(MAX_PRINCIPAL, 0.0, MAX_TENURE_MONTHS), Ok(()));
        assert_eq!(validate_terms(0, 12.0, 12), Err(TermsError::Principal));
        assert_eq!(
            validate_terms(MAX_PRINCIPAL + 1, 12.0, 12),
            Err(TermsError::Principal)
        );
        assert_eq!(validate_terms(100_000, f64::NAN, 12), Err(TermsError::Rate));
        assert_eq!(validate_terms(100_000, -1.0, 12), Err(TermsError::Rate));
        assert_eq!(validate_terms(100_000, 12.0, 0), Err(TermsError::Tenure));
        assert_eq!(
            validate_terms(100_000, 12.0, u32::MAX),
            Err(TermsError::Tenure)
        );
    }

    #[test]
    fn quote_bundles_headline_figures() {
        let quote = EmiQuote::new(100_000, 12.0, 12, disbursed());
        assert_eq!(quote.emi, 8885);
        assert_eq!(quote.total_amount, quote.emi * 12);
        assert_eq!(quote.schedule.len(), 12);
    }
}
