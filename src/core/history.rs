use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{DataError, Error, Result};

/// How the numbers in the historical data file are written.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnConvention {
    /// `0.0734` means +7.34%.
    #[default]
    Fraction,
    /// `7.34` means +7.34%; divided by 100 on load.
    Percent,
}

impl ReturnConvention {
    fn normalize(self, value: f64) -> f64 {
        match self {
            ReturnConvention::Fraction => value,
            ReturnConvention::Percent => value / 100.0,
        }
    }
}

/// Annual returns per market index, stored as fractions.
///
/// Each column of the source table is one index; each row one historical
/// year. Blank cells mean the index has no observation for that year, so
/// sequences can have different lengths. Only indices with at least one
/// observation are kept.
#[derive(Debug, Clone)]
pub struct HistoricalReturns {
    series: BTreeMap<String, Vec<f64>>,
}

impl HistoricalReturns {
    pub fn load(path: &Path, convention: ReturnConvention) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = parse_table(file, convention, path)?;
        log::info!(
            "loaded {} historical index series from {}",
            table.series.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, convention: ReturnConvention) -> Result<Self> {
        parse_table(reader, convention, Path::new("<input>"))
    }

    pub fn from_series<I, S>(series: I) -> std::result::Result<Self, DataError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let series: BTreeMap<String, Vec<f64>> = series
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        if series.is_empty() {
            return Err(DataError::EmptyTable);
        }
        Ok(Self { series })
    }

    pub fn returns(&self, index: &str) -> std::result::Result<&[f64], DataError> {
        self.series
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::UnknownIndex {
                name: index.to_string(),
                available: self.index_names().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

fn parse_table<R: Read>(
    reader: R,
    convention: ReturnConvention,
    path: &Path,
) -> Result<HistoricalReturns> {
    let csv_error = |source: csv::Error| Error::Csv {
        path: PathBuf::from(path),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let names: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    if names.iter().all(String::is_empty) {
        return Err(DataError::EmptyTable.into());
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        for (col, cell) in record.iter().enumerate().take(names.len()) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| DataError::UnparseableValue {
                index: names[col].clone(),
                row: row_idx + 1,
                value: cell.to_string(),
            })?;
            columns[col].push(convention.normalize(value));
        }
    }

    for (name, column) in names.iter().zip(&columns) {
        if column.is_empty() {
            log::warn!("historical index '{name}' has no observations; skipping");
        }
    }

    Ok(HistoricalReturns::from_series(
        names.into_iter().zip(columns).filter(|(name, _)| !name.is_empty()),
    )?)
}
