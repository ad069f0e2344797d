use std::collections::BTreeMap;

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

use super::{percentage, ReportFilter};
use crate::lending::domain::{Amount, CollectionSchedule, ScheduleStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPerformance {
    pub agent_name: String,
    pub total_assigned: usize,
    pub collected: usize,
    pub overdue: usize,
    pub efficiency: f64,
    pub total_amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionReport {
    pub total_due: Amount,
    pub collected_amount: Amount,
    pub overdue_amount: Amount,
    pub collection_efficiency: f64,
    pub overdue_loans: usize,
    pub due_today: usize,
    pub due_this_week: usize,
    pub due_this_month: usize,
    /// Sorted by agent name.
    pub agent_performance: Vec<AgentPerformance>,
}

/// Windows ("this week", "this month") start at `today` and are inclusive.
pub fn generate_collection_report(
    schedules: &[CollectionSchedule],
    filter: &ReportFilter,
    today: NaiveDate,
) -> CollectionReport {
    let selected: Vec<&CollectionSchedule> = schedules
        .iter()
        .filter(|entry| filter.admits(entry.due_date))
        .collect();

    let amount_where = |status: ScheduleStatus| -> Amount {
        selected
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.emi_amount)
            .sum()
    };
    let total_due: Amount = selected.iter().map(|entry| entry.emi_amount).sum();
    let collected_amount = amount_where(ScheduleStatus::Paid);
    let overdue_amount = amount_where(ScheduleStatus::Overdue);

    let week_end = today.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX);
    let month_end = today.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);
    let open_between = |end: NaiveDate| {
        selected
            .iter()
            .filter(|entry| entry.status != ScheduleStatus::Paid)
            .filter(|entry| entry.due_date >= today && entry.due_date <= end)
            .count()
    };

    let mut agents: BTreeMap<&str, AgentPerformance> = BTreeMap::new();
    for entry in &selected {
        let Some(agent) = entry.collection_agent.as_deref() else {
            continue;
        };
        let performance = agents.entry(agent).or_insert_with(|| AgentPerformance {
            agent_name: agent.to_string(),
            total_assigned: 0,
            collected: 0,
            overdue: 0,
            efficiency: 0.0,
            total_amount: 0,
        });
        performance.total_assigned += 1;
        performance.total_amount += entry.emi_amount;
        match entry.status {
            ScheduleStatus::Paid => performance.collected += 1,
            ScheduleStatus::Overdue => performance.overdue += 1,
            _ => {}
        }
    }
    let agent_performance = agents
        .into_values()
        .map(|mut performance| {
            performance.efficiency =
                percentage(performance.collected as f64, performance.total_assigned as f64);
            performance
        })
        .collect();

    CollectionReport {
        total_due,
        collected_amount,
        overdue_amount,
        collection_efficiency: percentage(collected_amount as f64, total_due as f64),
        overdue_loans: selected
            .iter()
            .filter(|entry| entry.status == ScheduleStatus::Overdue)
            .count(),
        due_today: open_between(today),
        due_this_week: open_between(week_end),
        due_this_month: open_between(month_end),
        agent_performance,
    }
}
