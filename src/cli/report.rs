use serde::Serialize;

use crate::core::{
    BatchResult, Comparison, ScenarioOutcome, Summary, deductible_schedule,
};

const LABEL_WIDTH: usize = 38;

/// `$1,234` with no decimals; negatives as `-$1,234`.
pub fn format_currency(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let sign = if value < 0.0 && digits != "0" { "-" } else { "" };
    format!("{sign}${}", group_thousands(&digits))
}

/// A fraction as a percentage with two decimals.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_count(n: usize) -> String {
    group_thousands(&n.to_string())
}

fn format_interval(summary: &Summary) -> String {
    format!(
        "{} (95% HPD: {} to {})",
        format_currency(summary.median),
        format_currency(summary.hpd_low),
        format_currency(summary.hpd_high)
    )
}

fn line(out: &mut String, label: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("{label:>LABEL_WIDTH$}: {value}\n"));
}

pub fn render_text(result: &BatchResult) -> String {
    let mut out = String::new();
    line(
        &mut out,
        "Calculating...",
        format!(
            "{} simulations (seed {})",
            format_count(result.simulations),
            result.seed
        ),
    );
    out.push('\n');

    for (i, outcome) in result.outcomes.iter().enumerate() {
        render_scenario(&mut out, i, outcome);
        out.push('\n');
    }
    for comparison in &result.comparisons {
        render_comparison(&mut out, comparison);
        out.push('\n');
    }
    out
}

fn render_scenario(out: &mut String, position: usize, outcome: &ScenarioOutcome) {
    let scenario = &outcome.scenario;
    let rates = scenario.rates.initial;

    line(out, &format!("Scenario {position}"), &scenario.name);
    line(out, "Expense Ratio", format_percent(rates.expense_ratio));
    line(out, "State Tax Benefit", format_percent(rates.tax_benefit_ratio));
    line(
        out,
        "Starting Investment",
        format_currency(scenario.starting_investment),
    );
    line(
        out,
        "Annual Investment into Plan",
        format_currency(scenario.annual_investment),
    );
    line(
        out,
        "Number of Years",
        format!("{} years", scenario.num_of_years),
    );
    line(out, "Using Historical Data", &scenario.index);
    line(out, "Simulations", format_count(outcome.simulations));
    if let Some(rollover) = scenario.rates.rollover {
        line(out, "Rollover Year", rollover.year);
        line(
            out,
            "Rollover Expense Ratio",
            format_percent(rollover.rates.expense_ratio),
        );
        line(
            out,
            "Rollover State Tax Benefit",
            format_percent(rollover.rates.tax_benefit_ratio),
        );
    }
    let deducted: f64 = deductible_schedule(scenario).iter().sum();
    line(out, "Contributions Deducted", format_currency(deducted));
    line(out, "Median Final Amount", format_interval(&outcome.summary));
}

fn render_comparison(out: &mut String, comparison: &Comparison) {
    line(
        out,
        "Comparison",
        format!("{} vs {}", comparison.challenger, comparison.baseline),
    );
    line(
        out,
        "Median Difference",
        format_interval(&comparison.differences),
    );
    line(
        out,
        "Mean Difference",
        format_currency(comparison.mean_difference),
    );
    line(
        out,
        "Challenger Outperforms Baseline",
        format_percent(comparison.likelihood_challenger_wins),
    );
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    simulations: usize,
    seed: u64,
    scenarios: Vec<JsonScenario<'a>>,
    comparisons: &'a [Comparison],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonScenario<'a> {
    name: &'a str,
    index: &'a str,
    starting_investment: f64,
    annual_investment: f64,
    num_of_years: u32,
    simulations: usize,
    expense_ratio: f64,
    tax_benefit_ratio: f64,
    rollover: Option<JsonRollover>,
    contributions_deducted: f64,
    final_amount: Summary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRollover {
    year: u32,
    expense_ratio: f64,
    tax_benefit_ratio: f64,
}

pub fn render_json(result: &BatchResult) -> serde_json::Result<String> {
    let report = JsonReport {
        simulations: result.simulations,
        seed: result.seed,
        scenarios: result
            .outcomes
            .iter()
            .map(json_scenario)
            .collect(),
        comparisons: &result.comparisons,
    };
    serde_json::to_string_pretty(&report)
}

fn json_scenario(outcome: &ScenarioOutcome) -> JsonScenario<'_> {
    let scenario = &outcome.scenario;
    JsonScenario {
        name: &scenario.name,
        index: &scenario.index,
        starting_investment: scenario.starting_investment,
        annual_investment: scenario.annual_investment,
        num_of_years: scenario.num_of_years,
        simulations: outcome.simulations,
        expense_ratio: scenario.rates.initial.expense_ratio,
        tax_benefit_ratio: scenario.rates.initial.tax_benefit_ratio,
        rollover: scenario.rates.rollover.map(|rollover| JsonRollover {
            year: rollover.year,
            expense_ratio: rollover.rates.expense_ratio,
            tax_benefit_ratio: rollover.rates.tax_benefit_ratio,
        }),
        contributions_deducted: deductible_schedule(scenario).iter().sum(),
        final_amount: outcome.summary,
    }
}
