use std::collections::BTreeMap;

use serde::Serialize;

use super::ReportFilter;
use crate::lending::domain::{Amount, Journal, Voucher, VoucherKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyFinancial {
    /// `YYYY-MM`.
    pub month: String,
    pub receipts: Amount,
    pub payments: Amount,
    pub net_amount: Amount,
    pub interest_earned: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialReport {
    pub total_receipts: Amount,
    pub total_payments: Amount,
    pub net_balance: Amount,
    pub interest_earned: Amount,
    pub fees_collected: Amount,
    pub penalties_collected: Amount,
    /// Ascending by month.
    pub monthly_breakdown: Vec<MonthlyFinancial>,
}

fn category_mentions(voucher: &Voucher, needle: &str) -> bool {
    voucher
        .category
        .as_deref()
        .is_some_and(|category| category.to_lowercase().contains(needle))
}

fn is_interest(journal: &Journal) -> bool {
    journal.entry.to_lowercase().contains("interest")
}

pub fn generate_financial_report(
    vouchers: &[Voucher],
    journals: &[Journal],
    filter: &ReportFilter,
) -> FinancialReport {
    let vouchers: Vec<&Voucher> = vouchers.iter().filter(|v| filter.admits(v.date)).collect();
    let journals: Vec<&Journal> = journals.iter().filter(|j| filter.admits(j.date)).collect();

    let total_of = |kind: VoucherKind| -> Amount {
        vouchers
            .iter()
            .filter(|voucher| voucher.kind == kind)
            .map(|voucher| voucher.amount)
            .sum()
    };
    let total_receipts = total_of(VoucherKind::Receipt);
    let total_payments = total_of(VoucherKind::Payment);

    let mut months: BTreeMap<String, MonthlyFinancial> = BTreeMap::new();
    for voucher in &vouchers {
        let month = voucher.date.format("%Y-%m").to_string();
        let entry = months.entry(month.clone()).or_insert_with(|| MonthlyFinancial {
            month,
            ..MonthlyFinancial::default()
        });
        match voucher.kind {
            VoucherKind::Receipt => entry.receipts += voucher.amount,
            VoucherKind::Payment => entry.payments += voucher.amount,
        }
        entry.net_amount = entry.receipts - entry.payments;
    }
    for journal in journals.iter().filter(|journal| is_interest(journal)) {
        let month = journal.date.format("%Y-%m").to_string();
        months
            .entry(month.clone())
            .or_insert_with(|| MonthlyFinancial {
                month,
                ..MonthlyFinancial::default()
            })
            .interest_earned += journal.amount;
    }

    FinancialReport {
        total_receipts,
        total_payments,
        net_balance: total_receipts - total_payments,
        interest_earned: journals
            .iter()
            .filter(|journal| is_interest(journal))
            .map(|journal| journal.amount)
            .sum(),
        fees_collected: vouchers
            .iter()
            .filter(|voucher| category_mentions(voucher, "fee"))
            .map(|voucher| voucher.amount)
            .sum(),
        penalties_collected: vouchers
            .iter()
            .filter(|voucher| category_mentions(voucher, "penalty"))
            .map(|voucher| voucher.amount)
            .sum(),
        monthly_breakdown: months.into_values().collect(),
    }
}
