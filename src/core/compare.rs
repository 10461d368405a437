use serde::Serialize;

use super::types::{PlanResult, Strategy};

#[derive(Debug, Clone, Copy)]
pub struct LabeledPlan<'a> {
    pub label: &'a str,
    pub plan: &'a PlanResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub label: String,
    pub strategy: Strategy,
    pub total_debt: f64,
    pub total_interest: f64,
    pub interest_saved: f64,
    pub payoff_months: u32,
    pub average_monthly_payment: f64,
    pub total_payments: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanComparison {
    pub rows: Vec<ComparisonRow>,
    pub best_interest_savings: String,
    pub fastest_payoff: String,
    pub lowest_payment: String,
}

/// Ranks plans by interest saved, payoff time and average monthly payment.
///
/// Ties go to the earliest plan. Returns `None` for an empty slice.
pub fn compare_plans(plans: &[LabeledPlan<'_>]) -> Option<PlanComparison> {
    if plans.is_empty() {
        return None;
    }

    let rows = plans
        .iter()
        .map(|entry| ComparisonRow {
            label: entry.label.to_string(),
            strategy: entry.plan.strategy,
            total_debt: entry.plan.total_debt,
            total_interest: entry.plan.total_interest,
            interest_saved: entry.plan.interest_saved(),
            payoff_months: entry.plan.payoff_months,
            average_monthly_payment: entry.plan.average_monthly_payment(),
            total_payments: entry.plan.total_payments,
            converged: entry.plan.converged,
        })
        .collect::<Vec<_>>();

    let best_interest = first_best(&rows, |row| -row.interest_saved);
    let fastest = first_best(&rows, |row| row.payoff_months as f64);
    let lowest = first_best(&rows, |row| row.average_monthly_payment);

    Some(PlanComparison {
        best_interest_savings: rows[best_interest].label.clone(),
        fastest_payoff: rows[fastest].label.clone(),
        lowest_payment: rows[lowest].label.clone(),
        rows,
    })
}

/// Index of the smallest key, keeping the first on ties.
fn first_best(rows: &[ComparisonRow], key: impl Fn(&ComparisonRow) -> f64) -> usize {
    let mut best = 0;
    for (idx, row) in rows.iter().enumerate().skip(1) {
        if key(row).total_cmp(&key(&rows[best])).is_lt() {
            best = idx;
        }
    }
    best
}
