use serde::{Deserialize, Serialize};

/// Annual ceiling on the state tax deduction for plan contributions.
pub const ANNUAL_DEDUCTION_CAP: f64 = 2_500.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlanRates {
    pub expense_ratio: f64,
    pub tax_benefit_ratio: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rollover {
    /// Last year (0-based) that still uses the initial rates.
    pub year: u32,
    pub rates: PlanRates,
}

/// Plan rates before and, optionally, after a one-time rollover.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RatePhases {
    pub initial: PlanRates,
    pub rollover: Option<Rollover>,
}

impl RatePhases {
    pub fn fixed(rates: PlanRates) -> Self {
        Self {
            initial: rates,
            rollover: None,
        }
    }

    pub fn rates_for_year(&self, year: u32) -> PlanRates {
        match self.rollover {
            Some(rollover) if year > rollover.year => rollover.rates,
            _ => self.initial,
        }
    }
}

/// Starting value of the carried-over deductible amount.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialCarryover {
    /// The opening balance counts as not-yet-deducted contribution.
    #[default]
    StartingInvestment,
    Zero,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub starting_investment: f64,
    pub annual_investment: f64,
    pub num_of_years: u32,
    pub index: String,
    pub rates: RatePhases,
    pub initial_carryover: InitialCarryover,
}

impl Scenario {
    pub fn initial_carryover_amount(&self) -> f64 {
        match self.initial_carryover {
            InitialCarryover::StartingInvestment => self.starting_investment,
            InitialCarryover::Zero => 0.0,
        }
    }
}

/// Empirical median and 95% interval of a set of simulated outcomes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub median: f64,
    pub hpd_low: f64,
    pub hpd_high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub baseline: String,
    pub challenger: String,
    pub differences: Summary,
    pub mean_difference: f64,
    /// Share of paired simulations where the challenger ends strictly ahead.
    pub likelihood_challenger_wins: f64,
}

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub simulations: usize,
    pub summary: Summary,
    /// Final balances in simulation order, so they can be paired.
    pub final_balances: Vec<f64>,
}
