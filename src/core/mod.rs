mod compare;
mod consolidation;
mod engine;
mod types;

pub use compare::{ComparisonRow, LabeledPlan, PlanComparison, compare_plans};
pub use consolidation::{
    BASELINE_MAX_MONTHS, amortized_installment, baseline_interest_estimate, consolidate,
    consolidate_within, estimated_payoff_months,
};
pub use engine::{Allocation, allocate, compute, order_debts, priority_order, simulate};
pub use types::{
    DEFAULT_SAFETY_HORIZON_MONTHS, Debt, DebtMonth, DebtTerms, MonthEntry, PAID_OFF_EPSILON,
    PlanConfig, PlanError, PlanResult, PlanSummary, Strategy, monthly_rate_from_apr, round_cents,
};
