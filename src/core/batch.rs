use std::collections::BTreeMap;

use super::engine::simulate;
use super::error::{ConfigError, Result};
use super::history::HistoricalReturns;
use super::paths::{PathMatrix, PathRng, stream_for_index};
use super::stats::{compare, summarize};
use super::types::{Comparison, Scenario, ScenarioOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonSpec {
    pub baseline: String,
    pub challenger: String,
}

/// One run: every scenario is simulated over the same draws as every other
/// scenario using the same historical index.
#[derive(Debug, Clone)]
pub struct Batch {
    pub simulations: usize,
    pub seed: u64,
    pub scenarios: Vec<Scenario>,
    pub comparisons: Vec<ComparisonSpec>,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub simulations: usize,
    pub seed: u64,
    pub outcomes: Vec<ScenarioOutcome>,
    pub comparisons: Vec<Comparison>,
}

pub fn run_batch(history: &HistoricalReturns, batch: &Batch) -> Result<BatchResult> {
    let pairs = resolve_comparisons(batch)?;

    let mut horizon_by_index: BTreeMap<&str, usize> = BTreeMap::new();
    for scenario in &batch.scenarios {
        history.returns(&scenario.index)?;
        let horizon = horizon_by_index.entry(scenario.index.as_str()).or_default();
        *horizon = (*horizon).max(scenario.num_of_years as usize);
    }

    let mut paths_by_index: BTreeMap<&str, PathMatrix> = BTreeMap::new();
    for (&index, &years) in &horizon_by_index {
        let returns = history.returns(index)?;
        let mut rng = PathRng::new(batch.seed, stream_for_index(index));
        log::debug!(
            "drawing {years} x {} paths from {} years of '{index}'",
            batch.simulations,
            returns.len()
        );
        paths_by_index.insert(
            index,
            PathMatrix::generate(years, batch.simulations, returns.len(), &mut rng)?,
        );
    }

    let mut outcomes = Vec::with_capacity(batch.scenarios.len());
    for scenario in &batch.scenarios {
        log::info!(
            "simulating '{}': {} year(s) x {} simulation(s) on {}",
            scenario.name,
            scenario.num_of_years,
            batch.simulations,
            scenario.index
        );
        let returns = history.returns(&scenario.index)?;
        let paths = &paths_by_index[scenario.index.as_str()];
        let final_balances = simulate(scenario, returns, paths)?;

        let mut sorted = final_balances.clone();
        let summary = summarize(&mut sorted, &scenario.name)?;
        outcomes.push(ScenarioOutcome {
            scenario: scenario.clone(),
            simulations: batch.simulations,
            summary,
            final_balances,
        });
    }

    let mut comparisons = Vec::with_capacity(pairs.len());
    for (baseline, challenger) in pairs {
        let (a, b) = (&outcomes[baseline], &outcomes[challenger]);
        comparisons.push(compare(
            &a.scenario.name,
            &a.final_balances,
            &b.scenario.name,
            &b.final_balances,
        )?);
    }

    Ok(BatchResult {
        simulations: batch.simulations,
        seed: batch.seed,
        outcomes,
        comparisons,
    })
}

fn resolve_comparisons(batch: &Batch) -> std::result::Result<Vec<(usize, usize)>, ConfigError> {
    let position = |name: &str| {
        batch
            .scenarios
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownScenario {
                name: name.to_string(),
            })
    };

    batch
        .comparisons
        .iter()
        .map(|spec| {
            let baseline = position(&spec.baseline)?;
            let challenger = position(&spec.challenger)?;
            let (a, b) = (&batch.scenarios[baseline], &batch.scenarios[challenger]);
            if a.index != b.index {
                return Err(ConfigError::MismatchedIndex {
                    baseline: a.name.clone(),
                    baseline_index: a.index.clone(),
                    challenger: b.name.clone(),
                    challenger_index: b.index.clone(),
                });
            }
            Ok((baseline, challenger))
        })
        .collect()
}
