pub mod config;
pub mod report;

use std::path::PathBuf;

use clap::Parser;

use crate::core::{Error, HistoricalReturns, Result, run_batch};
use config::{ReportFormat, RunConfig, load_config};
use report::{render_json, render_text};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    version,
    about = "Monte Carlo comparison of 529 college savings plans over historical index returns"
)]
pub struct Cli {
    /// JSON run configuration (scenarios, comparisons, data source)
    pub config: PathBuf,
}

pub fn run(cli: &Cli) -> Result<String> {
    let config = load_config(&cli.config)?;
    let history = HistoricalReturns::load(&config.historical_data, config.return_convention)?;
    render(&config, &history)
}

/// Simulate a validated configuration against loaded history and format it.
pub fn render(config: &RunConfig, history: &HistoricalReturns) -> Result<String> {
    let result = run_batch(history, &config.batch)?;
    match config.report_format {
        ReportFormat::Text => Ok(render_text(&result)),
        ReportFormat::Json => render_json(&result).map_err(Error::Report),
    }
}
