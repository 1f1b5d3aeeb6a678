//! Technology entity - a process improvement that adjusts one stage's yield
//!
//! The adjustment is an extra-yield value in percentage points (`1.0` means
//! "+1%"). It is either fixed, or a sparse table of yearly overrides that is
//! carried forward from the closest earlier year.

use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Stage};
use crate::core::years::{self, YearTable};

/// Extra-yield definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtraYield {
    /// Same adjustment every year
    Static { value: f64 },

    /// Year-by-year overrides
    Dynamic {
        /// Catalog value shown to users; never applied by the resolver
        #[serde(default)]
        nominal: f64,

        /// Calendar year -> extra-yield percentage
        #[serde(default, with = "years::year_keys")]
        overrides: YearTable,
    },
}

impl Default for ExtraYield {
    fn default() -> Self {
        ExtraYield::Static { value: 0.0 }
    }
}

impl ExtraYield {
    /// Effective extra-yield percentage for calendar year `year`
    ///
    /// A dynamic table with no entry at or before `year` yields `0`, not the
    /// nominal value.
    pub fn resolve(&self, year: i32) -> f64 {
        match self {
            ExtraYield::Static { value } => *value,
            ExtraYield::Dynamic { overrides, .. } => {
                years::forward_fill(overrides, year).unwrap_or(0.0)
            }
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ExtraYield::Dynamic { .. })
    }

    /// The value a user sees in catalog listings
    pub fn nominal(&self) -> f64 {
        match self {
            ExtraYield::Static { value } => *value,
            ExtraYield::Dynamic { nominal, .. } => *nominal,
        }
    }
}

/// Technology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
    /// Unique identifier
    pub id: String,

    /// Technology name
    pub name: String,

    /// Stage whose yield this technology adjusts
    pub stage: Stage,

    /// Extra-yield definition
    #[serde(default)]
    pub extra_yield: ExtraYield,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Technology {
    const PREFIX: &'static str = "TECH";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Technology {
    /// Create a technology with a fixed adjustment
    pub fn fixed(id: impl Into<String>, name: impl Into<String>, stage: Stage, value: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stage,
            extra_yield: ExtraYield::Static { value },
            description: None,
        }
    }

    /// Create a technology driven by yearly overrides
    pub fn yearly(
        id: impl Into<String>,
        name: impl Into<String>,
        stage: Stage,
        nominal: f64,
        overrides: impl IntoIterator<Item = (i32, f64)>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stage,
            extra_yield: ExtraYield::Dynamic {
                nominal,
                overrides: overrides.into_iter().collect(),
            },
            description: None,
        }
    }

    /// Effective extra-yield percentage for `year`
    pub fn resolve(&self, year: i32) -> f64 {
        self.extra_yield.resolve(year)
    }

    pub fn is_dynamic(&self) -> bool {
        self.extra_yield.is_dynamic()
    }
}
