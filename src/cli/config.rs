use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::{
    Batch, ComparisonSpec, ConfigError, Error, Filing, InitialCarryover, PlanPreset, PlanRates,
    RatePhases, Result, ReturnConvention, Rollover, Scenario, maryland_tax_benefit,
};

const DEFAULT_SIMULATIONS: usize = 100_000;

/// Longest savings horizon a scenario may simulate.
pub const MAX_NUM_OF_YEARS: u32 = 50;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// A validated run: where the history lives and what to simulate.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub historical_data: PathBuf,
    pub return_convention: ReturnConvention,
    pub report_format: ReportFormat,
    pub batch: Batch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct RunPayload {
    historical_data: Option<PathBuf>,
    return_convention: Option<ReturnConvention>,
    report_format: Option<ReportFormat>,
    simulations: Option<usize>,
    seed: Option<u64>,
    scenarios: Vec<ScenarioPayload>,
    comparisons: Vec<ComparisonPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct ScenarioPayload {
    name: Option<String>,
    starting_investment: Option<f64>,
    annual_investment: Option<f64>,
    num_of_years: Option<u32>,
    index: Option<String>,
    expense_ratio: Option<ExpenseRatioSpec>,
    tax_benefit_ratio: Option<TaxBenefitSpec>,
    rollover: Option<RolloverPayload>,
    initial_carryover: Option<InitialCarryover>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct RolloverPayload {
    year: Option<u32>,
    expense_ratio: Option<ExpenseRatioSpec>,
    tax_benefit_ratio: Option<TaxBenefitSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ComparisonPayload {
    baseline: String,
    challenger: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ExpenseRatioSpec {
    Rate(f64),
    Plan { plan: PlanPreset },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TaxBenefitSpec {
    Rate(f64),
    Maryland {
        filing: Filing,
        bracket: String,
        #[serde(default)]
        county: Option<String>,
    },
}

impl ExpenseRatioSpec {
    fn resolve(&self, field: &str) -> std::result::Result<f64, ConfigError> {
        let rate = match self {
            ExpenseRatioSpec::Rate(rate) => *rate,
            ExpenseRatioSpec::Plan { plan } => plan.expense_ratio(),
        };
        if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
            return Err(invalid(field, "must be a fraction in [0, 1)"));
        }
        Ok(rate)
    }
}

impl TaxBenefitSpec {
    fn resolve(&self, field: &str) -> std::result::Result<f64, ConfigError> {
        let rate = match self {
            TaxBenefitSpec::Rate(rate) => *rate,
            TaxBenefitSpec::Maryland {
                filing,
                bracket,
                county,
            } => maryland_tax_benefit(*filing, bracket, county.as_deref())?,
        };
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(invalid(field, "must be a fraction in [0, 1]"));
        }
        Ok(rate)
    }
}

pub fn load_config(path: &Path) -> Result<RunConfig> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config_from_json(&text, base_dir).map_err(|err| match err {
        Error::Json { source, .. } => Error::Json {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parse and validate a configuration. Relative data paths resolve
/// against `base_dir`.
pub fn config_from_json(json: &str, base_dir: &Path) -> Result<RunConfig> {
    let payload: RunPayload = serde_json::from_str(json).map_err(|source| Error::Json {
        path: PathBuf::from("<input>"),
        source,
    })?;
    Ok(build_run_config(payload, base_dir)?)
}

fn build_run_config(
    payload: RunPayload,
    base_dir: &Path,
) -> std::result::Result<RunConfig, ConfigError> {
    let run_scope = || "run configuration".to_string();

    let historical_data = payload.historical_data.ok_or(ConfigError::MissingField {
        scope: run_scope(),
        field: "historicalData",
    })?;
    let historical_data = if historical_data.is_relative() {
        base_dir.join(historical_data)
    } else {
        historical_data
    };

    let simulations = payload.simulations.unwrap_or(DEFAULT_SIMULATIONS);
    if simulations == 0 {
        return Err(invalid("simulations", "must be > 0"));
    }

    if payload.scenarios.is_empty() {
        return Err(invalid("scenarios", "at least one scenario is required"));
    }

    let mut seen = HashSet::new();
    let mut scenarios = Vec::with_capacity(payload.scenarios.len());
    for (position, scenario) in payload.scenarios.into_iter().enumerate() {
        let scenario = build_scenario(scenario, position)?;
        if !seen.insert(scenario.name.clone()) {
            return Err(ConfigError::DuplicateScenario {
                name: scenario.name,
            });
        }
        scenarios.push(scenario);
    }

    let comparisons = payload
        .comparisons
        .into_iter()
        .map(|c| {
            for name in [&c.baseline, &c.challenger] {
                if !seen.contains(name) {
                    return Err(ConfigError::UnknownScenario { name: name.clone() });
                }
            }
            Ok(ComparisonSpec {
                baseline: c.baseline,
                challenger: c.challenger,
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let seed = payload.seed.unwrap_or_else(|| {
        let seed: u64 = rand::random();
        log::info!("no seed configured; using {seed}");
        seed
    });

    Ok(RunConfig {
        historical_data,
        return_convention: payload.return_convention.unwrap_or_default(),
        report_format: payload.report_format.unwrap_or_default(),
        batch: Batch {
            simulations,
            seed,
            scenarios,
            comparisons,
        },
    })
}

fn build_scenario(
    payload: ScenarioPayload,
    position: usize,
) -> std::result::Result<Scenario, ConfigError> {
    let label = payload
        .name
        .clone()
        .unwrap_or_else(|| format!("#{}", position + 1));
    let scope = format!("scenario '{label}'");
    let missing = |field: &'static str| ConfigError::MissingField {
        scope: scope.clone(),
        field,
    };

    let name = payload.name.ok_or_else(|| missing("name"))?;
    let starting_investment = payload
        .starting_investment
        .ok_or_else(|| missing("startingInvestment"))?;
    let annual_investment = payload
        .annual_investment
        .ok_or_else(|| missing("annualInvestment"))?;
    let num_of_years = payload.num_of_years.ok_or_else(|| missing("numOfYears"))?;
    let index = payload.index.ok_or_else(|| missing("index"))?;

    let field = |name: &str| format!("{label}.{name}");

    if name.trim().is_empty() {
        return Err(invalid(&field("name"), "must not be empty"));
    }
    if !starting_investment.is_finite() || starting_investment < 0.0 {
        return Err(invalid(&field("startingInvestment"), "must be >= 0"));
    }
    if !annual_investment.is_finite() || annual_investment < 0.0 {
        return Err(invalid(&field("annualInvestment"), "must be >= 0"));
    }
    if num_of_years == 0 || num_of_years > MAX_NUM_OF_YEARS {
        return Err(invalid(
            &field("numOfYears"),
            &format!("must be between 1 and {MAX_NUM_OF_YEARS}"),
        ));
    }
    if index.trim().is_empty() {
        return Err(invalid(&field("index"), "must not be empty"));
    }

    let initial = PlanRates {
        expense_ratio: resolve_expense(payload.expense_ratio.as_ref(), &field("expenseRatio"))?,
        tax_benefit_ratio: resolve_tax_benefit(
            payload.tax_benefit_ratio.as_ref(),
            &field("taxBenefitRatio"),
        )?,
    };

    let rollover = match payload.rollover {
        None => None,
        Some(rollover) => {
            let year = rollover.year.ok_or_else(|| missing("rollover.year"))?;
            let expense = rollover
                .expense_ratio
                .as_ref()
                .ok_or_else(|| missing("rollover.expenseRatio"))?;
            if year >= num_of_years {
                log::warn!(
                    "{scope}: rollover year {year} is past the {num_of_years}-year horizon and never applies"
                );
            }
            Some(Rollover {
                year,
                rates: PlanRates {
                    expense_ratio: expense.resolve(&field("rollover.expenseRatio"))?,
                    tax_benefit_ratio: resolve_tax_benefit(
                        rollover.tax_benefit_ratio.as_ref(),
                        &field("rollover.taxBenefitRatio"),
                    )?,
                },
            })
        }
    };

    Ok(Scenario {
        name,
        starting_investment,
        annual_investment,
        num_of_years,
        index,
        rates: RatePhases { initial, rollover },
        initial_carryover: payload.initial_carryover.unwrap_or_default(),
    })
}

fn resolve_expense(
    spec: Option<&ExpenseRatioSpec>,
    field: &str,
) -> std::result::Result<f64, ConfigError> {
    spec.map_or(Ok(0.0), |spec| spec.resolve(field))
}

fn resolve_tax_benefit(
    spec: Option<&TaxBenefitSpec>,
    field: &str,
) -> std::result::Result<f64, ConfigError> {
    spec.map_or(Ok(0.0), |spec| spec.resolve(field))
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
