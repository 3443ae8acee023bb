mod batch;
mod engine;
mod error;
mod history;
mod paths;
mod stats;
mod tax;
mod types;

pub use batch::{Batch, BatchResult, ComparisonSpec, run_batch};
pub use engine::{deductible_schedule, simulate};
pub use error::{ConfigError, DataError, Error, Result};
pub use history::{HistoricalReturns, ReturnConvention};
pub use paths::{PathMatrix, PathRng, stream_for_index};
pub use stats::{compare, paired_differences, summarize};
pub use tax::{Filing, PlanPreset, maryland_county_rate, maryland_state_rate, maryland_tax_benefit};
pub use types::{
    ANNUAL_DEDUCTION_CAP, Comparison, InitialCarryover, PlanRates, RatePhases, Rollover, Scenario,
    ScenarioOutcome, Summary,
};
