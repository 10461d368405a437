use tracing::{debug, warn};

use super::types::{
    DEFAULT_SAFETY_HORIZON_MONTHS, Debt, MonthEntry, PAID_OFF_EPSILON, PlanResult, PlanSummary,
    Strategy, round_cents,
};

/// Cap on the standalone payoff estimate used for the pre-consolidation baseline (30 years).
pub const BASELINE_MAX_MONTHS: f64 = 360.0;

/// Level installment that clears `principal` over `term_months` at `monthly_rate`.
pub fn amortized_installment(principal: f64, monthly_rate: f64, term_months: u32) -> f64 {
    let months = term_months.max(1);
    if monthly_rate <= 0.0 {
        return principal / months as f64;
    }

    let factor = (1.0 + monthly_rate).powf(months as f64);
    if !factor.is_finite() {
        // Very long terms converge on an interest-only payment.
        return principal * monthly_rate;
    }
    principal * monthly_rate * factor / (factor - 1.0)
}

/// Closed-form months to repay `balance` at a fixed `payment`.
///
/// `n = -ln(1 - r·B/P) / ln(1 + r)`, or `B / P` at zero rate. Returns `None` when the
/// payment does not exceed the first month's interest.
pub fn estimated_payoff_months(balance: f64, monthly_rate: f64, payment: f64) -> Option<f64> {
    if balance <= 0.0 {
        return Some(0.0);
    }
    if payment <= 0.0 {
        return None;
    }
    if monthly_rate <= 0.0 {
        return Some(balance / payment);
    }

    let coverage = monthly_rate * balance / payment;
    if coverage >= 1.0 {
        return None;
    }
    Some(-(1.0 - coverage).ln() / monthly_rate.ln_1p())
}

/// Approximate interest the debts would cost if each were paid alone on its minimum.
///
/// First-order estimate: `rate × balance × months` per debt, with the month count from
/// [`estimated_payoff_months`] capped at [`BASELINE_MAX_MONTHS`]. It overstates interest
/// on amortizing debts and is not a month-by-month simulation.
pub fn baseline_interest_estimate(debts: &[Debt]) -> f64 {
    debts
        .iter()
        .filter(|debt| debt.balance > 0.0)
        .map(|debt| {
            let months = debt
                .estimated_payoff_months()
                .unwrap_or(BASELINE_MAX_MONTHS)
                .min(BASELINE_MAX_MONTHS);
            debt.balance * debt.monthly_rate.max(0.0) * months
        })
        .sum()
}

/// Merges all debts into one loan at `monthly_rate` over `term_months`.
///
/// `extra_payment` goes on top of the amortizing installment, so the merged balance may
/// clear before the stated term. The schedule carries no per-debt lines and stops at
/// [`DEFAULT_SAFETY_HORIZON_MONTHS`] for terms longer than that.
pub fn consolidate(
    debts: &[Debt],
    monthly_rate: f64,
    term_months: u32,
    extra_payment: f64,
) -> PlanResult {
    consolidate_within(
        debts,
        monthly_rate,
        term_months,
        extra_payment,
        DEFAULT_SAFETY_HORIZON_MONTHS,
    )
}

/// [`consolidate`] with an explicit cap on simulated months. A term beyond the cap yields
/// a plan flagged as not converged.
pub fn consolidate_within(
    debts: &[Debt],
    monthly_rate: f64,
    term_months: u32,
    extra_payment: f64,
    safety_horizon_months: u32,
) -> PlanResult {
    let open = debts
        .iter()
        .filter(|debt| debt.balance > 0.0)
        .cloned()
        .collect::<Vec<_>>();
    if open.is_empty() {
        return PlanResult::empty(Strategy::Consolidation, Some(monthly_rate));
    }

    let total_debt = open.iter().map(|d| d.balance).sum::<f64>();
    let installment =
        amortized_installment(total_debt, monthly_rate, term_months) + extra_payment.max(0.0);

    debug!(
        debts = open.len(),
        total_debt,
        installment,
        term_months,
        "starting consolidation schedule"
    );

    let last_month = term_months.min(safety_horizon_months);
    let mut schedule = Vec::with_capacity(last_month as usize);
    let mut balance = total_debt;
    let mut total_interest = 0.0;
    let mut total_paid = 0.0;

    for month in 1..=last_month {
        let interest = balance * monthly_rate;
        let mut principal = installment - interest;
        let mut payment = installment;
        if principal > balance {
            principal = balance;
            payment = principal + interest;
        }

        balance -= principal;
        total_interest += interest;
        total_paid += payment;

        schedule.push(MonthEntry {
            month,
            debts: Vec::new(),
            payment: round_cents(payment),
            principal: round_cents(principal),
            interest: round_cents(interest),
            remaining_balance: round_cents(if balance <= PAID_OFF_EPSILON {
                0.0
            } else {
                balance
            }),
        });

        if balance <= PAID_OFF_EPSILON {
            break;
        }
    }

    let converged = balance <= PAID_OFF_EPSILON;
    if !converged {
        warn!(
            term_months,
            horizon = safety_horizon_months,
            "consolidated loan still open at the end of the schedule"
        );
    }

    let baseline_interest = baseline_interest_estimate(&open);
    let interest_saved = (baseline_interest - total_interest).max(0.0);

    PlanResult {
        strategy: Strategy::Consolidation,
        total_debt: round_cents(total_debt),
        total_interest: round_cents(total_interest),
        total_payments: round_cents(total_paid),
        payoff_months: schedule.len() as u32,
        monthly_payment: round_cents(installment),
        converged,
        schedule,
        summary: PlanSummary::Consolidation {
            monthly_rate,
            debts_consolidated: open.len(),
            baseline_interest: round_cents(baseline_interest),
            interest_saved: round_cents(interest_saved),
        },
    }
}
