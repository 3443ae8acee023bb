use super::error::DataError;
use super::paths::PathMatrix;
use super::types::{ANNUAL_DEDUCTION_CAP, Scenario};

/// Run `scenario` over every simulated path and return the final balances,
/// one per simulation, in path order.
///
/// Each year the contribution is added first and then grows with the drawn
/// return net of the expense ratio. The year's deductible share of
/// contributions, capped at [`ANNUAL_DEDUCTION_CAP`], earns the tax benefit,
/// which is added back to the balance. All shape checks happen before the
/// loop so the loop itself cannot fail.
pub fn simulate(
    scenario: &Scenario,
    returns: &[f64],
    paths: &PathMatrix,
) -> Result<Vec<f64>, DataError> {
    if returns.is_empty() {
        return Err(DataError::EmptySeries);
    }
    let years = scenario.num_of_years as usize;
    if paths.years() < years {
        return Err(DataError::PathShape {
            years: paths.years(),
            simulations: paths.simulations(),
            required_years: years,
            required_simulations: paths.simulations(),
        });
    }
    if paths.sequence_length() > returns.len() {
        return Err(DataError::SequenceMismatch {
            drawn_from: paths.sequence_length(),
            available: returns.len(),
        });
    }

    let mut balances = vec![scenario.starting_investment; paths.simulations()];
    let mut carryover = scenario.initial_carryover_amount();

    for year in 0..scenario.num_of_years {
        let rates = scenario.rates.rates_for_year(year);
        let deductible = take_deductible(&mut carryover, scenario.annual_investment);
        let tax_benefit = deductible * rates.tax_benefit_ratio;

        for (balance, &row) in balances.iter_mut().zip(paths.year(year as usize)) {
            *balance += scenario.annual_investment;
            *balance *= 1.0 + returns[row] - rates.expense_ratio;
            *balance += tax_benefit;
        }
    }

    Ok(balances)
}

/// Deductible amount claimed in each simulated year. Identical for every
/// path since it depends only on contributions.
pub fn deductible_schedule(scenario: &Scenario) -> Vec<f64> {
    let mut carryover = scenario.initial_carryover_amount();
    (0..scenario.num_of_years)
        .map(|_| take_deductible(&mut carryover, scenario.annual_investment))
        .collect()
}

fn take_deductible(carryover: &mut f64, contribution: f64) -> f64 {
    *carryover += contribution;
    let deductible = carryover.min(ANNUAL_DEDUCTION_CAP);
    *carryover -= deductible;
    deductible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::PathRng;
    use crate::core::types::{InitialCarryover, PlanRates, RatePhases, Rollover};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn rates(expense_ratio: f64, tax_benefit_ratio: f64) -> PlanRates {
        PlanRates {
            expense_ratio,
            tax_benefit_ratio,
        }
    }

    fn sample_scenario() -> Scenario {
        Scenario {
            name: "Maryland College Investment Plan".to_string(),
            starting_investment: 0.0,
            annual_investment: 2_500.0,
            num_of_years: 18,
            index: "Wilshire_5000".to_string(),
            rates: RatePhases::fixed(rates(0.005, 0.0795)),
            initial_carryover: InitialCarryover::StartingInvestment,
        }
    }

    fn constant_paths(years: usize, sims: usize) -> PathMatrix {
        PathMatrix::from_rows(vec![vec![0; sims]; years], 1)
    }

    #[test]
    fn single_historical_return_example_matches_hand_calculation() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 1;
        scenario.rates = RatePhases::fixed(rates(0.0, 0.0));

        let paths = PathMatrix::generate(1, 250, 1, &mut PathRng::new(99, 0)).unwrap();
        let balances = simulate(&scenario, &[0.10], &paths).unwrap();

        assert_eq!(balances.len(), 250);
        for balance in balances {
            assert_approx(balance, 2_750.0);
        }
    }

    #[test]
    fn zero_contribution_zero_return_conserves_starting_investment() {
        let mut scenario = sample_scenario();
        scenario.starting_investment = 12_345.0;
        scenario.annual_investment = 0.0;
        scenario.rates = RatePhases::fixed(rates(0.0, 0.0));

        let balances = simulate(&scenario, &[0.0], &constant_paths(18, 32)).unwrap();
        assert!(balances.iter().all(|&b| b == 12_345.0));
    }

    #[test]
    fn deduction_is_capped_and_excess_carries_forward() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 3;
        scenario.annual_investment = 3_000.0;
        scenario.initial_carryover = InitialCarryover::Zero;

        // Carryover: 3000 -> claim 2500 (500 left), 3500 -> 2500 (1000 left),
        // 4000 -> 2500 (1500 left).
        assert_eq!(deductible_schedule(&scenario), vec![2_500.0; 3]);

        scenario.annual_investment = 1_000.0;
        scenario.starting_investment = 6_000.0;
        scenario.num_of_years = 5;
        scenario.initial_carryover = InitialCarryover::StartingInvestment;
        assert_eq!(
            deductible_schedule(&scenario),
            vec![2_500.0, 2_500.0, 2_500.0, 2_500.0, 1_000.0]
        );

        scenario.initial_carryover = InitialCarryover::Zero;
        assert_eq!(deductible_schedule(&scenario), vec![1_000.0; 5]);
    }

    #[test]
    fn tax_benefit_is_reinvested_after_growth() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 2;
        scenario.rates = RatePhases::fixed(rates(0.0, 0.10));

        // Year 0: 2500 * 1.2 + 250 = 3250
        // Year 1: (3250 + 2500) * 1.2 + 250 = 7150
        let balances = simulate(&scenario, &[0.20], &constant_paths(2, 3)).unwrap();
        for balance in balances {
            assert_approx(balance, 7_150.0);
        }
    }

    #[test]
    fn contribution_above_cap_only_earns_benefit_on_the_cap() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 1;
        scenario.annual_investment = 10_000.0;
        scenario.initial_carryover = InitialCarryover::Zero;
        scenario.rates = RatePhases::fixed(rates(0.0, 0.10));

        let balances = simulate(&scenario, &[0.0], &constant_paths(1, 1)).unwrap();
        assert_approx(balances[0], 10_250.0);
    }

    #[test]
    fn expense_ratio_drags_growth() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 2;
        scenario.starting_investment = 1_000.0;
        scenario.annual_investment = 0.0;
        scenario.rates = RatePhases::fixed(rates(0.01, 0.0));

        // 1000 * 1.09 * 1.09
        let balances = simulate(&scenario, &[0.10], &constant_paths(2, 1)).unwrap();
        assert_approx(balances[0], 1_188.1);
    }

    #[test]
    fn rollover_switches_rates_after_the_rollover_year() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 3;
        scenario.annual_investment = 1_000.0;
        scenario.initial_carryover = InitialCarryover::Zero;
        scenario.rates = RatePhases {
            initial: rates(0.0, 0.05),
            rollover: Some(Rollover {
                year: 1,
                rates: rates(0.0, 0.0),
            }),
        };

        // Years 0 and 1 still earn the 5% benefit, year 2 does not:
        // 1000 + 50 = 1050; 2050 + 50 = 2100; 3100.
        let balances = simulate(&scenario, &[0.0], &constant_paths(3, 1)).unwrap();
        assert_approx(balances[0], 3_100.0);

        scenario.rates = RatePhases {
            initial: rates(0.01, 0.0),
            rollover: Some(Rollover {
                year: 0,
                rates: rates(0.0, 0.0),
            }),
        };
        scenario.starting_investment = 100.0;
        scenario.annual_investment = 0.0;
        scenario.num_of_years = 2;
        let balances = simulate(&scenario, &[0.0], &constant_paths(2, 1)).unwrap();
        assert_approx(balances[0], 99.0);
    }

    #[test]
    fn rollover_beyond_horizon_never_applies() {
        let mut with_rollover = sample_scenario();
        with_rollover.rates.rollover = Some(Rollover {
            year: 40,
            rates: rates(0.0019, 0.0),
        });
        let without = sample_scenario();

        let paths = PathMatrix::generate(18, 64, 5, &mut PathRng::new(5, 0)).unwrap();
        let returns = [0.12, -0.2, 0.05, 0.3, 0.0];
        assert_eq!(
            simulate(&with_rollover, &returns, &paths).unwrap(),
            simulate(&without, &returns, &paths).unwrap()
        );
    }

    #[test]
    fn each_simulation_follows_its_own_column_of_draws() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 2;
        scenario.starting_investment = 100.0;
        scenario.annual_investment = 0.0;
        scenario.rates = RatePhases::fixed(rates(0.0, 0.0));

        let paths = PathMatrix::from_rows(vec![vec![0, 1, 1], vec![1, 1, 0]], 2);
        let balances = simulate(&scenario, &[0.0, 0.5], &paths).unwrap();
        assert_approx(balances[0], 150.0);
        assert_approx(balances[1], 225.0);
        assert_approx(balances[2], 150.0);
    }

    #[test]
    fn shorter_scenarios_use_leading_years_of_a_longer_matrix() {
        let mut scenario = sample_scenario();
        scenario.num_of_years = 1;
        scenario.starting_investment = 100.0;
        scenario.annual_investment = 0.0;
        scenario.rates = RatePhases::fixed(rates(0.0, 0.0));

        let paths = PathMatrix::from_rows(vec![vec![1], vec![0]], 2);
        let balances = simulate(&scenario, &[0.0, 0.5], &paths).unwrap();
        assert_approx(balances[0], 150.0);
    }

    #[test]
    fn too_few_path_years_is_rejected_before_simulating() {
        let scenario = sample_scenario();
        let err = simulate(&scenario, &[0.1], &constant_paths(17, 4)).unwrap_err();
        assert!(matches!(
            err,
            DataError::PathShape {
                years: 17,
                required_years: 18,
                ..
            }
        ));
    }

    #[test]
    fn empty_return_series_is_rejected() {
        let scenario = sample_scenario();
        let err = simulate(&scenario, &[], &constant_paths(18, 4)).unwrap_err();
        assert!(matches!(err, DataError::EmptySeries));
    }

    #[test]
    fn paths_drawn_for_a_longer_series_are_rejected() {
        let scenario = sample_scenario();
        let paths = PathMatrix::generate(18, 4, 10, &mut PathRng::new(1, 1)).unwrap();
        let err = simulate(&scenario, &[0.1, 0.2], &paths).unwrap_err();
        assert!(matches!(
            err,
            DataError::SequenceMismatch {
                drawn_from: 10,
                available: 2
            }
        ));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_fixed_paths_give_bit_identical_reruns(
            seed in proptest::num::u64::ANY,
            start in 0.0f64..50_000.0,
            annual in 0.0f64..10_000.0,
            expense in 0.0f64..0.02,
            tax in 0.0f64..0.10,
            years in 1u32..30,
        ) {
            let mut scenario = sample_scenario();
            scenario.starting_investment = start;
            scenario.annual_investment = annual;
            scenario.num_of_years = years;
            scenario.rates = RatePhases::fixed(rates(expense, tax));

            let returns = [0.21, -0.37, 0.05, 0.11, -0.09, 0.33, 0.0];
            let paths = PathMatrix::generate(years as usize, 40, returns.len(), &mut PathRng::new(seed, 0)).unwrap();
            let first = simulate(&scenario, &returns, &paths).unwrap();
            let second = simulate(&scenario, &returns, &paths).unwrap();
            prop_assert_eq!(
                first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
                second.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
            );
        }

        #[test]
        fn prop_rates_switch_exactly_after_rollover_year(
            k in 0u32..40,
            year in 0u32..60,
        ) {
            let phases = RatePhases {
                initial: rates(0.005, 0.0795),
                rollover: Some(Rollover { year: k, rates: rates(0.0019, 0.0) }),
            };
            let expected = if year <= k { phases.initial } else { rates(0.0019, 0.0) };
            prop_assert_eq!(phases.rates_for_year(year), expected);
        }

        #[test]
        fn prop_deductions_never_exceed_cap_or_contributions(
            start in 0.0f64..20_000.0,
            annual in 0.0f64..8_000.0,
            years in 1u32..40,
        ) {
            let mut scenario = sample_scenario();
            scenario.starting_investment = start;
            scenario.annual_investment = annual;
            scenario.num_of_years = years;

            let schedule = deductible_schedule(&scenario);
            prop_assert_eq!(schedule.len(), years as usize);
            prop_assert!(schedule.iter().all(|&d| (0.0..=ANNUAL_DEDUCTION_CAP).contains(&d)));
            let claimed: f64 = schedule.iter().sum();
            let contributed = start + annual * f64::from(years);
            prop_assert!(claimed <= contributed + 1e-6);
        }
    }
}
