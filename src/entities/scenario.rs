//! Scenario entity - a projection window with its yield model and stage baselines

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::entity::{Entity, Stage};
use crate::core::years::{self, YearTable};

/// Plant-level constant yields for stages not modeled from defect density
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantBaselines {
    /// Stage -> baseline probability
    #[serde(default)]
    pub stages: BTreeMap<Stage, f64>,
}

impl PlantBaselines {
    pub fn get(&self, stage: Stage) -> Option<f64> {
        self.stages.get(&stage).copied()
    }
}

/// Projection scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// First projected calendar year (inclusive)
    pub start_year: i32,

    /// Last projected calendar year (inclusive)
    pub end_year: i32,

    /// Selected yield model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Replaces every family's decay constant for this scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_override: Option<f64>,

    /// Per-stage, per-year baseline yields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub baselines: BTreeMap<Stage, YearTable>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Scenario {
    const PREFIX: &'static str = "SCN";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Scenario {
    pub fn new(id: impl Into<String>, name: impl Into<String>, start_year: i32, end_year: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_year,
            end_year,
            model: None,
            decay_override: None,
            baselines: BTreeMap::new(),
            description: None,
        }
    }

    /// A scenario is valid when its window is non-empty
    pub fn is_valid(&self) -> bool {
        self.start_year <= self.end_year
    }

    /// Calendar years in the window (empty when invalid)
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Number of projected years
    pub fn year_count(&self) -> usize {
        if self.is_valid() {
            (self.end_year - self.start_year) as usize + 1
        } else {
            0
        }
    }

    /// Baseline yield for a non-fab stage in `year`
    ///
    /// Scenario tables are carried forward; before their first entry the
    /// plant constant applies, and a stage nobody configured loses nothing.
    pub fn baseline(&self, stage: Stage, year: i32, plant: &PlantBaselines) -> f64 {
        self.baselines
            .get(&stage)
            .and_then(|table| years::forward_fill(table, year))
            .or_else(|| plant.get(stage))
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(Scenario::new("SCN-1", "Base", 2026, 2026).is_valid());
        assert!(!Scenario::new("SCN-2", "Backwards", 2030, 2020).is_valid());
        assert_eq!(Scenario::new("SCN-2", "Backwards", 2030, 2020).year_count(), 0);
        assert_eq!(Scenario::new("SCN-3", "Five", 2026, 2030).year_count(), 5);
    }

    #[test]
    fn test_baseline_resolution_order() {
        let mut plant = PlantBaselines::default();
        plant.stages.insert(Stage::Saw, 0.99);
        plant.stages.insert(Stage::Epi, 0.95);

        let mut scn = Scenario::new("SCN-1", "Base", 2026, 2030);
        scn.baselines
            .insert(Stage::Epi, [(2028, 0.97), (2030, 0.98)].into_iter().collect());

        // Before the scenario table starts -> plant constant
        assert_eq!(scn.baseline(Stage::Epi, 2027, &plant), 0.95);
        // Exact and carried forward
        assert_eq!(scn.baseline(Stage::Epi, 2028, &plant), 0.97);
        assert_eq!(scn.baseline(Stage::Epi, 2029, &plant), 0.97);
        assert_eq!(scn.baseline(Stage::Epi, 2030, &plant), 0.98);
        // Plant only
        assert_eq!(scn.baseline(Stage::Saw, 2026, &plant), 0.99);
        // Unconfigured
        assert_eq!(scn.baseline(Stage::Osat, 2026, &plant), 1.0);
    }

    #[test]
    fn test_scenario_yaml() {
        let yaml = r#"
id: SCN-BASE
name: Base case
start_year: 2026
end_year: 2030
model: YM-NB
baselines:
  kgd:
    2026: 0.9
"#;
        let scn: Scenario = serde_yml::from_str(yaml).unwrap();
        assert_eq!(scn.model.as_deref(), Some("YM-NB"));
        assert_eq!(scn.baseline(Stage::Kgd, 2027, &PlantBaselines::default()), 0.9);
    }
}
