use tracing::{debug, warn};

use super::consolidation::consolidate_within;
use super::types::{
    Debt, DebtMonth, DebtTerms, MonthEntry, PAID_OFF_EPSILON, PlanConfig, PlanError, PlanResult,
    PlanSummary, Strategy, round_cents,
};

/// Working copy of a debt that is still open during a simulation.
#[derive(Debug, Clone)]
struct OpenDebt {
    index: usize,
    balance: f64,
    monthly_rate: f64,
    minimum_payment: f64,
}

impl DebtTerms for OpenDebt {
    fn balance(&self) -> f64 {
        self.balance
    }

    fn monthly_rate(&self) -> f64 {
        self.monthly_rate
    }

    fn minimum_payment(&self) -> f64 {
        self.minimum_payment
    }
}

/// Payments decided for one month, aligned with the priority order passed to [`allocate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub payments: Vec<f64>,
    pub unspent: f64,
}

pub fn compute(debts: &[Debt], config: &PlanConfig) -> Result<PlanResult, PlanError> {
    config.validate()?;

    if config.strategy == Strategy::Consolidation {
        let (rate, term) = config.consolidation_terms()?;
        return Ok(consolidate_within(
            debts,
            rate,
            term,
            config.extra_payment,
            config.safety_horizon_months,
        ));
    }

    let mut plan = simulate(
        debts,
        config.strategy,
        config.extra_payment,
        config.safety_horizon_months,
    );

    if config.extra_payment > 0.0 && !plan.schedule.is_empty() {
        let baseline = simulate(debts, config.strategy, 0.0, config.safety_horizon_months);
        if let PlanSummary::Payoff { interest_saved, .. } = &mut plan.summary {
            *interest_saved = round_cents((baseline.total_interest - plan.total_interest).max(0.0));
        }
    }

    Ok(plan)
}

/// Priority order for a strategy, as positions into `debts`.
///
/// Snowball sorts by ascending balance, avalanche by descending rate. The sort is
/// stable so ties keep input order. Consolidation keeps input order.
pub fn priority_order<T: DebtTerms>(debts: &[T], strategy: Strategy) -> Vec<usize> {
    let mut order = (0..debts.len()).collect::<Vec<_>>();
    match strategy {
        Strategy::Snowball => {
            order.sort_by(|&a, &b| debts[a].balance().total_cmp(&debts[b].balance()));
        }
        Strategy::Avalanche => {
            order.sort_by(|&a, &b| {
                debts[b]
                    .monthly_rate()
                    .total_cmp(&debts[a].monthly_rate())
            });
        }
        Strategy::Consolidation => {}
    }
    order
}

pub fn order_debts(debts: &[Debt], strategy: Strategy) -> Vec<&Debt> {
    priority_order(debts, strategy)
        .into_iter()
        .map(|idx| &debts[idx])
        .collect()
}

/// Splits one month's pool across debts already sorted by priority.
///
/// Each debt first gets its minimum (capped at its balance), then as much extra
/// principal as the pool allows. Once the pool cannot cover a debt's minimum, that
/// debt takes whatever is left and every later debt gets nothing this month.
pub fn allocate<T: DebtTerms>(ordered: &[&T], pool: f64) -> Allocation {
    let mut payments = vec![0.0; ordered.len()];
    let mut remaining = pool.max(0.0);

    for (slot, debt) in payments.iter_mut().zip(ordered) {
        let balance = debt.balance();
        if balance <= 0.0 {
            continue;
        }

        let target = debt.minimum_payment().min(balance);
        if remaining >= target {
            let additional = (remaining - target).min(balance - target);
            let paid = target + additional;
            *slot = paid;
            remaining -= paid;
        } else {
            *slot = remaining;
            remaining = 0.0;
            break;
        }
    }

    Allocation {
        payments,
        unspent: remaining,
    }
}

/// Month-by-month payoff under snowball or avalanche ordering.
///
/// The monthly pool is fixed at the summed minimums of every debt open at the start
/// plus `extra_payment`, so a cleared debt's minimum rolls over to the rest. Runs
/// until every debt is cleared or `safety_horizon_months` is reached.
pub fn simulate(
    debts: &[Debt],
    strategy: Strategy,
    extra_payment: f64,
    safety_horizon_months: u32,
) -> PlanResult {
    let mut open = debts
        .iter()
        .enumerate()
        .filter(|(_, debt)| debt.balance > 0.0)
        .map(|(index, debt)| OpenDebt {
            index,
            balance: debt.balance,
            monthly_rate: debt.monthly_rate.max(0.0),
            minimum_payment: debt.minimum_payment.max(0.0),
        })
        .collect::<Vec<_>>();

    if open.is_empty() {
        return PlanResult::empty(strategy, None);
    }

    let starting_count = open.len();
    let total_debt = open.iter().map(|d| d.balance).sum::<f64>();
    let pool = open.iter().map(|d| d.minimum_payment).sum::<f64>() + extra_payment.max(0.0);

    debug!(
        strategy = strategy.as_str(),
        debts = starting_count,
        pool,
        "starting payoff simulation"
    );

    let mut schedule = Vec::new();
    let mut total_interest = 0.0;
    let mut total_paid = 0.0;
    let mut month = 0_u32;

    while !open.is_empty() && month < safety_horizon_months {
        month += 1;

        let order = priority_order(&open, strategy);
        let ordered = order.iter().map(|&pos| &open[pos]).collect::<Vec<_>>();
        let allocation = allocate(&ordered, pool);

        let mut payments = vec![0.0; open.len()];
        for (&pos, &paid) in order.iter().zip(&allocation.payments) {
            payments[pos] = paid;
        }

        let mut lines = Vec::with_capacity(open.len());
        let mut month_payment = 0.0;
        let mut month_interest = 0.0;
        for (debt, &paid) in open.iter_mut().zip(&payments) {
            let interest = debt.balance * debt.monthly_rate;
            debt.balance = (debt.balance + interest - paid).max(0.0);
            month_payment += paid;
            month_interest += interest;

            let reported_balance = if debt.balance <= PAID_OFF_EPSILON {
                0.0
            } else {
                debt.balance
            };
            lines.push(DebtMonth {
                debt_id: debts[debt.index].id.clone(),
                payment: round_cents(paid),
                interest: round_cents(interest),
                balance: round_cents(reported_balance),
            });
        }
        total_interest += month_interest;
        total_paid += month_payment;

        open.retain(|debt| debt.balance > PAID_OFF_EPSILON);
        let remaining_balance = open.iter().map(|d| d.balance).sum::<f64>();

        schedule.push(MonthEntry {
            month,
            debts: lines,
            payment: round_cents(month_payment),
            principal: round_cents(month_payment - month_interest),
            interest: round_cents(month_interest),
            remaining_balance: round_cents(remaining_balance),
        });
    }

    let converged = open.is_empty();
    if converged {
        debug!(strategy = strategy.as_str(), months = month, "payoff simulation converged");
    } else {
        warn!(
            strategy = strategy.as_str(),
            horizon = safety_horizon_months,
            open_debts = open.len(),
            "safety horizon reached before all debts were paid off"
        );
    }

    PlanResult {
        strategy,
        total_debt: round_cents(total_debt),
        total_interest: round_cents(total_interest),
        total_payments: round_cents(total_paid),
        payoff_months: month,
        monthly_payment: round_cents(pool),
        converged,
        schedule,
        summary: PlanSummary::Payoff {
            debts_paid_off: starting_count - open.len(),
            debts_remaining: open.len(),
            interest_saved: 0.0,
        },
    }
}
