//! Year-keyed tables and the year-indexing convention

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A sparse table of values keyed by calendar year
pub type YearTable = BTreeMap<i32, f64>;

/// How a calendar year is turned into the index fed to the defect model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearIndexing {
    /// `year - start_year` (first scenario year is 0)
    #[default]
    Relative,
    /// `year - start_year + 1` (first scenario year is 1)
    RelativePlusOne,
    /// The calendar year itself
    Calendar,
}

impl YearIndexing {
    /// Index of `year` within a scenario starting at `start_year`
    pub fn index(&self, year: i32, start_year: i32) -> f64 {
        match self {
            YearIndexing::Relative => f64::from(year - start_year),
            YearIndexing::RelativePlusOne => f64::from(year - start_year + 1),
            YearIndexing::Calendar => f64::from(year),
        }
    }
}

impl std::fmt::Display for YearIndexing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YearIndexing::Relative => write!(f, "relative"),
            YearIndexing::RelativePlusOne => write!(f, "relative_plus_one"),
            YearIndexing::Calendar => write!(f, "calendar"),
        }
    }
}

impl std::str::FromStr for YearIndexing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "relative" | "zero" => Ok(YearIndexing::Relative),
            "relative_plus_one" | "one" => Ok(YearIndexing::RelativePlusOne),
            "calendar" | "absolute" => Ok(YearIndexing::Calendar),
            _ => Err(format!("Unknown year indexing: {}", s)),
        }
    }
}

/// Look up `year` in a table, carrying the closest earlier entry forward
///
/// Returns `None` when the table has nothing at or before `year`.
pub fn forward_fill(table: &YearTable, year: i32) -> Option<f64> {
    table.range(..=year).next_back().map(|(_, v)| *v)
}

/// Serde adapter for [`YearTable`] that accepts integer or string keys
///
/// JSON objects only have string keys, and buffered (internally tagged)
/// content loses serde_json's numeric key handling.
pub mod year_keys {
    use super::*;

    pub fn serialize<S>(table: &YearTable, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        table.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<YearTable, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<YearKey, f64> = BTreeMap::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| {
                key.year()
                    .map(|year| (year, value))
                    .map_err(<D::Error as serde::de::Error>::custom)
            })
            .collect()
    }

    /// A year written as a number (YAML) or a string (JSON object key)
    #[derive(Deserialize, PartialEq, Eq, PartialOrd, Ord)]
    #[serde(untagged)]
    enum YearKey {
        Number(i32),
        Text(String),
    }

    impl YearKey {
        fn year(self) -> Result<i32, String> {
            match self {
                YearKey::Number(year) => Ok(year),
                YearKey::Text(text) => text
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid year '{}'", text)),
            }
        }
    }
}
