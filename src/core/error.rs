use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{scope} is missing required field '{field}'")]
    MissingField { scope: String, field: &'static str },

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    #[error("comparison refers to unknown scenario '{name}'")]
    UnknownScenario { name: String },

    #[error("scenario name '{name}' is used more than once")]
    DuplicateScenario { name: String },

    #[error("no {filing} tax bracket labelled '{bracket}'")]
    UnknownTaxBracket { filing: String, bracket: String },

    #[error("no county tax rate for '{county}'")]
    UnknownCounty { county: String },

    #[error(
        "cannot pair '{baseline}' ({baseline_index}) with '{challenger}' ({challenger_index}): \
         paired comparisons need the same historical index"
    )]
    MismatchedIndex {
        baseline: String,
        baseline_index: String,
        challenger: String,
        challenger_index: String,
    },
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("historical data table is empty")]
    EmptyTable,

    #[error("cannot draw simulated years from an empty return series")]
    EmptySeries,

    #[error("historical index '{name}' not found (available: {available})")]
    UnknownIndex { name: String, available: String },

    #[error("index '{index}', data row {row}: cannot parse '{value}' as a number")]
    UnparseableValue {
        index: String,
        row: usize,
        value: String,
    },

    #[error("{context}: {count} non-finite value(s) in results")]
    NonFinite { context: String, count: usize },

    #[error("{context}: no results to aggregate")]
    EmptyResults { context: String },

    #[error("paired results differ in length: {baseline} vs {challenger}")]
    LengthMismatch { baseline: usize, challenger: usize },

    #[error(
        "path matrix of {years} year(s) x {simulations} simulation(s) cannot drive \
         {required_years} year(s) x {required_simulations} simulation(s)"
    )]
    PathShape {
        years: usize,
        simulations: usize,
        required_years: usize,
        required_simulations: usize,
    },

    #[error("path matrix draws rows below {drawn_from} but the return series has only {available}")]
    SequenceMismatch { drawn_from: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize report: {0}")]
    Report(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
