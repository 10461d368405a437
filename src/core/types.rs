use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard cap on simulated months for the ordered strategies (50 years).
pub const DEFAULT_SAFETY_HORIZON_MONTHS: u32 = 600;

/// Balances at or below this many currency units count as paid off.
pub const PAID_OFF_EPSILON: f64 = 0.01;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Snowball,
    Avalanche,
    Consolidation,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Snowball => "snowball",
            Strategy::Avalanche => "avalanche",
            Strategy::Consolidation => "consolidation",
        }
    }
}

/// Read-only view the orderer and allocator need from a debt.
pub trait DebtTerms {
    fn balance(&self) -> f64;
    fn monthly_rate(&self) -> f64;
    fn minimum_payment(&self) -> f64;
}

/// One outstanding debt as handed to the engine.
///
/// The engine never mutates a `Debt`; every simulation works on its own copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub monthly_rate: f64,
    pub minimum_payment: f64,
}

impl Debt {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: f64,
        monthly_rate: f64,
        minimum_payment: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            balance,
            monthly_rate,
            minimum_payment,
        }
    }

    /// Builds a debt from an annual percentage rate, e.g. `18.0` for 18% APR.
    pub fn from_apr(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: f64,
        apr_percent: f64,
        minimum_payment: f64,
    ) -> Self {
        Self::new(
            id,
            name,
            balance,
            monthly_rate_from_apr(apr_percent),
            minimum_payment,
        )
    }

    /// Months to clear this debt on its own minimum payment, from the closed-form
    /// amortization formula. `None` when the payment never outruns interest.
    pub fn estimated_payoff_months(&self) -> Option<f64> {
        super::consolidation::estimated_payoff_months(
            self.balance,
            self.monthly_rate,
            self.minimum_payment,
        )
    }
}

impl DebtTerms for Debt {
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

pub fn monthly_rate_from_apr(apr_percent: f64) -> f64 {
    apr_percent / 100.0 / 12.0
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("consolidation requires a blended monthly rate")]
    MissingConsolidationRate,

    #[error("consolidation rate must be finite and >= 0, got {0}")]
    InvalidConsolidationRate(f64),

    #[error("consolidation requires a term in months")]
    MissingConsolidationTerm,

    #[error("consolidation term must be >= 1 month, got {0}")]
    InvalidConsolidationTerm(u32),

    #[error("extra payment must be finite and >= 0, got {0}")]
    InvalidExtraPayment(f64),

    #[error("safety horizon must be at least one month")]
    InvalidSafetyHorizon,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanConfig {
    pub strategy: Strategy,
    pub extra_payment: f64,
    /// Blended monthly rate of the merged loan; consolidation only.
    pub consolidation_rate: Option<f64>,
    /// Term of the merged loan in months; consolidation only.
    pub consolidation_term: Option<u32>,
    pub safety_horizon_months: u32,
}

impl PlanConfig {
    pub fn snowball(extra_payment: f64) -> Self {
        Self::ordered(Strategy::Snowball, extra_payment)
    }

    pub fn avalanche(extra_payment: f64) -> Self {
        Self::ordered(Strategy::Avalanche, extra_payment)
    }

    pub fn consolidation(extra_payment: f64, monthly_rate: f64, term_months: u32) -> Self {
        Self {
            strategy: Strategy::Consolidation,
            extra_payment,
            consolidation_rate: Some(monthly_rate),
            consolidation_term: Some(term_months),
            safety_horizon_months: DEFAULT_SAFETY_HORIZON_MONTHS,
        }
    }

    fn ordered(strategy: Strategy, extra_payment: f64) -> Self {
        Self {
            strategy,
            extra_payment,
            consolidation_rate: None,
            consolidation_term: None,
            safety_horizon_months: DEFAULT_SAFETY_HORIZON_MONTHS,
        }
    }

    pub fn with_safety_horizon(mut self, months: u32) -> Self {
        self.safety_horizon_months = months;
        self
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.extra_payment.is_finite() || self.extra_payment < 0.0 {
            return Err(PlanError::InvalidExtraPayment(self.extra_payment));
        }
        if self.safety_horizon_months == 0 {
            return Err(PlanError::InvalidSafetyHorizon);
        }
        if self.strategy == Strategy::Consolidation {
            self.consolidation_terms()?;
        }
        Ok(())
    }

    /// The `(monthly_rate, term_months)` pair a consolidation run needs.
    pub fn consolidation_terms(&self) -> Result<(f64, u32), PlanError> {
        let rate = self
            .consolidation_rate
            .ok_or(PlanError::MissingConsolidationRate)?;
        if !rate.is_finite() || rate < 0.0 {
            return Err(PlanError::InvalidConsolidationRate(rate));
        }
        let term = self
            .consolidation_term
            .ok_or(PlanError::MissingConsolidationTerm)?;
        if term < 1 {
            return Err(PlanError::InvalidConsolidationTerm(term));
        }
        Ok((rate, term))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtMonth {
    pub debt_id: String,
    pub payment: f64,
    pub interest: f64,
    pub balance: f64,
}

/// One simulated month. Currency fields are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthEntry {
    pub month: u32,
    /// Per-debt lines in input order; empty for consolidation.
    pub debts: Vec<DebtMonth>,
    pub payment: f64,
    /// Payment net of interest. Negative when interest outruns the payments.
    pub principal: f64,
    pub interest: f64,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "kind",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum PlanSummary {
    Payoff {
        debts_paid_off: usize,
        debts_remaining: usize,
        /// Interest avoided versus the same strategy on minimum payments only.
        interest_saved: f64,
    },
    Consolidation {
        monthly_rate: f64,
        debts_consolidated: usize,
        /// First-order estimate of the interest the original debts would cost.
        baseline_interest: f64,
        interest_saved: f64,
    },
}

impl PlanSummary {
    pub fn empty(strategy: Strategy, consolidation_rate: Option<f64>) -> Self {
        match strategy {
            Strategy::Consolidation => PlanSummary::Consolidation {
                monthly_rate: consolidation_rate.unwrap_or(0.0),
                debts_consolidated: 0,
                baseline_interest: 0.0,
                interest_saved: 0.0,
            },
            Strategy::Snowball | Strategy::Avalanche => PlanSummary::Payoff {
                debts_paid_off: 0,
                debts_remaining: 0,
                interest_saved: 0.0,
            },
        }
    }

    pub fn interest_saved(&self) -> f64 {
        match self {
            PlanSummary::Payoff { interest_saved, .. }
            | PlanSummary::Consolidation { interest_saved, .. } => *interest_saved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub strategy: Strategy,
    pub total_debt: f64,
    pub total_interest: f64,
    /// Sum of the payments actually made; matches debt plus interest once converged.
    pub total_payments: f64,
    pub payoff_months: u32,
    /// Nominal monthly outlay: summed minimums plus extra, or the consolidation installment.
    pub monthly_payment: f64,
    /// False when the safety horizon was reached with debts still open.
    pub converged: bool,
    pub schedule: Vec<MonthEntry>,
    pub summary: PlanSummary,
}

impl PlanResult {
    pub fn empty(strategy: Strategy, consolidation_rate: Option<f64>) -> Self {
        Self {
            strategy,
            total_debt: 0.0,
            total_interest: 0.0,
            total_payments: 0.0,
            payoff_months: 0,
            monthly_payment: 0.0,
            converged: true,
            schedule: Vec::new(),
            summary: PlanSummary::empty(strategy, consolidation_rate),
        }
    }

    pub fn interest_saved(&self) -> f64 {
        self.summary.interest_saved()
    }

    /// Total payments spread over the payoff horizon; zero for an empty plan.
    pub fn average_monthly_payment(&self) -> f64 {
        if self.payoff_months == 0 {
            return 0.0;
        }
        round_cents(self.total_payments / self.payoff_months as f64)
    }

    pub fn preview(&self, months: usize) -> &[MonthEntry] {
        &self.schedule[..months.min(self.schedule.len())]
    }
}
