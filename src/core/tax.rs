//! 2014 Maryland income tax rates and 529 plan expense ratios, so a run
//! configuration can name a bracket, county or plan instead of a raw rate.

use serde::Deserialize;

use super::error::ConfigError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filing {
    Single,
    #[serde(alias = "joint", alias = "married")]
    Couple,
}

impl Filing {
    fn label(self) -> &'static str {
        match self {
            Filing::Single => "single",
            Filing::Couple => "couple",
        }
    }
}

const MD_STATE_2014_SINGLE: &[(&str, f64)] = &[
    ("$0+", 0.0200),
    ("$1,000", 0.0300),
    ("$2,000", 0.0400),
    ("$3,000", 0.0475),
    ("$100,000+", 0.0500),
    ("$125,000+", 0.0525),
    ("$150,000+", 0.0550),
    ("$200,000+", 0.0575),
];

const MD_STATE_2014_COUPLE: &[(&str, f64)] = &[
    ("$0+", 0.0200),
    ("$1,000", 0.0300),
    ("$2,000", 0.0400),
    ("$3,000", 0.0475),
    ("$150,000+", 0.0500),
    ("$175,000+", 0.0525),
    ("$225,000+", 0.0550),
    ("$300,000+", 0.0575),
];

const MD_COUNTY_2014: &[(&str, f64)] = &[
    ("Allegany County", 0.0305),
    ("Anne Arundel County", 0.0256),
    ("Baltimore", 0.0305),
    ("Baltimore County", 0.0283),
    ("Calvert County", 0.0280),
    ("Caroline County", 0.0263),
    ("Carroll County", 0.0305),
    ("Cecil County", 0.0280),
    ("Charles County", 0.0290),
    ("Dorchester County", 0.0262),
    ("Frederick County", 0.0296),
    ("Garrett County", 0.0265),
    ("Harford County", 0.0306),
    ("Howard County", 0.0320),
    ("Kent County", 0.0285),
    ("Montgomery County", 0.0320),
    ("Prince Georges County", 0.0320),
    ("Queen Annes County", 0.0285),
    ("Somerset County", 0.0315),
    ("St. Marys County", 0.0300),
    ("Talbot County", 0.0225),
    ("Washington County", 0.0280),
    ("Wicomico County", 0.0310),
    ("Worcester County", 0.0125),
];

/// Marginal 2014 Maryland state rate for the bracket labelled `bracket`
/// (e.g. `"$3,000"`, `"$150,000+"`).
pub fn maryland_state_rate(filing: Filing, bracket: &str) -> Result<f64, ConfigError> {
    let table = match filing {
        Filing::Single => MD_STATE_2014_SINGLE,
        Filing::Couple => MD_STATE_2014_COUPLE,
    };
    lookup(table, bracket).ok_or_else(|| ConfigError::UnknownTaxBracket {
        filing: filing.label().to_string(),
        bracket: bracket.to_string(),
    })
}

pub fn maryland_county_rate(county: &str) -> Result<f64, ConfigError> {
    lookup(MD_COUNTY_2014, county).ok_or_else(|| ConfigError::UnknownCounty {
        county: county.to_string(),
    })
}

/// State plus (optional) county piggyback rate: the share of a deductible
/// contribution returned as tax savings.
pub fn maryland_tax_benefit(
    filing: Filing,
    bracket: &str,
    county: Option<&str>,
) -> Result<f64, ConfigError> {
    let state = maryland_state_rate(filing, bracket)?;
    let county = county.map(maryland_county_rate).transpose()?.unwrap_or(0.0);
    Ok(state + county)
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    let key = key.trim();
    table
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(key))
        .map(|&(_, rate)| rate)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanPreset {
    /// Global equity index portfolio, the only passive equity fund in the
    /// Maryland plan (2015).
    #[serde(alias = "maryland")]
    MarylandCollegeInvestment,
    #[serde(alias = "vanguard", alias = "nevada")]
    NevadaVanguard,
}

impl PlanPreset {
    pub fn expense_ratio(self) -> f64 {
        match self {
            PlanPreset::MarylandCollegeInvestment => 0.0050,
            PlanPreset::NevadaVanguard => 0.0019,
        }
    }
}
