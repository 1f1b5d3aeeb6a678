//! Chip entity - a die variant (part number) produced in one family

use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;

/// Chip type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipType {
    /// Part number
    pub id: String,

    /// Display name
    pub name: String,

    /// Family this chip belongs to
    pub family: String,

    /// Package designation
    #[serde(default)]
    pub package: String,

    /// Die area in mm²
    pub die_area_mm2: f64,

    /// First calendar year the chip is produced (absent or 0 = scenario start)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_start_year: Option<i32>,

    /// Technologies applied to this chip, in the order they were attached
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
}

impl Entity for ChipType {
    const PREFIX: &'static str = "CHIP";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ChipType {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        family: impl Into<String>,
        die_area_mm2: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            family: family.into(),
            package: String::new(),
            die_area_mm2,
            special_start_year: None,
            technologies: Vec::new(),
        }
    }

    /// Whether the chip is in production in calendar year `year`
    pub fn is_active_in(&self, year: i32) -> bool {
        match self.special_start_year {
            Some(start) if start != 0 => year >= start,
            _ => true,
        }
    }

    /// Technology ids with repeats removed, first occurrence wins
    pub fn unique_technologies(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.technologies
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}
