use super::error::DataError;
use super::types::{Comparison, Summary};

/// Sort `values` and read the median and 95% interval at truncated ranks
/// `floor(p * n)`. No interpolation between neighbours.
pub fn summarize(values: &mut [f64], context: &str) -> Result<Summary, DataError> {
    if values.is_empty() {
        return Err(DataError::EmptyResults {
            context: context.to_string(),
        });
    }
    let non_finite = values.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        return Err(DataError::NonFinite {
            context: context.to_string(),
            count: non_finite,
        });
    }

    values.sort_by(f64::total_cmp);

    Ok(Summary {
        median: values[rank(0.5, values.len())],
        hpd_low: values[rank(0.025, values.len())],
        hpd_high: values[rank(0.975, values.len())],
    })
}

/// Pair two result sets drawn from the same paths and summarise
/// `challenger - baseline`.
pub fn compare(
    baseline_name: &str,
    baseline: &[f64],
    challenger_name: &str,
    challenger: &[f64],
) -> Result<Comparison, DataError> {
    if baseline.len() != challenger.len() {
        return Err(DataError::LengthMismatch {
            baseline: baseline.len(),
            challenger: challenger.len(),
        });
    }

    let mut differences = paired_differences(baseline, challenger);
    let context = format!("{challenger_name} vs {baseline_name}");
    let summary = summarize(&mut differences, &context)?;
    let mean_difference = differences.iter().sum::<f64>() / differences.len() as f64;

    Ok(Comparison {
        baseline: baseline_name.to_string(),
        challenger: challenger_name.to_string(),
        differences: summary,
        mean_difference,
        likelihood_challenger_wins: likelihood_positive(&differences),
    })
}

pub fn paired_differences(baseline: &[f64], challenger: &[f64]) -> Vec<f64> {
    baseline
        .iter()
        .zip(challenger)
        .map(|(a, b)| b - a)
        .collect()
}

/// `1 - i / n` for the rank `i` of the first strictly positive value in
/// ascending `sorted`, or `0` when nothing is positive.
fn likelihood_positive(sorted: &[f64]) -> f64 {
    let first_positive = sorted.partition_point(|&d| d <= 0.0);
    if first_positive == sorted.len() {
        return 0.0;
    }
    1.0 - first_positive as f64 / sorted.len() as f64
}

fn rank(p: f64, n: usize) -> usize {
    ((p * n as f64) as usize).min(n - 1)
}
