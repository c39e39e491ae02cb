use geojson::JsonObject;
use serde::Deserialize;

use crate::error::ConfigError;

/// Years accepted in configuration and when inferring the slider domain
pub const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Explicit slider domain from configuration: either `{ first, last }` or a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum YearSpec {
    Range { first: i32, last: i32 },
    List(Vec<i32>),
}

impl YearSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            YearSpec::Range { first, last } if first > last => Err(ConfigError::InvalidYears(
                format!("first year {first} is after last year {last}"),
            )),
            YearSpec::List(years) if years.is_empty() => {
                Err(ConfigError::InvalidYears("year list is empty".to_string()))
            }
            YearSpec::Range { first, last } => check_plausible(&[*first, *last]),
            YearSpec::List(years) => check_plausible(years),
        }
    }

    /// Sorted, deduplicated years
    pub fn years(&self) -> Vec<i32> {
        match self {
            YearSpec::Range { first, last } => (*first..=*last).collect(),
            YearSpec::List(years) => {
                let mut years = years.clone();
                years.sort_unstable();
                years.dedup();
                years
            }
        }
    }
}

fn check_plausible(years: &[i32]) -> Result<(), ConfigError> {
    match years.iter().find(|y| !PLAUSIBLE_YEARS.contains(y)) {
        Some(year) => Err(ConfigError::InvalidYears(format!(
            "year {year} is outside {}..={}",
            PLAUSIBLE_YEARS.start(),
            PLAUSIBLE_YEARS.end()
        ))),
        None => Ok(()),
    }
}

/// Property keys of a feature that name a year, sorted ascending.
///
/// A key qualifies only if it is the canonical spelling of a year in
/// [`PLAUSIBLE_YEARS`], the same key used to look values up. Keys like
/// `"state"`, `"2011_note"` or `"02011"` are ignored.
pub fn discover_years(properties: &JsonObject) -> Vec<i32> {
    let mut years: Vec<i32> = properties
        .keys()
        .filter_map(|key| key.parse::<i32>().ok().filter(|year| year.to_string() == *key))
        .filter(|year| PLAUSIBLE_YEARS.contains(year))
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}
