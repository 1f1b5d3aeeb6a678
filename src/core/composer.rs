//! Stage yield composer - applies technology adjustments to a stage's base yield

use serde::{Deserialize, Serialize};

use crate::core::entity::{clamp01, Stage};
use crate::entities::technology::Technology;

/// How several technologies on the same stage combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionPolicy {
    /// Sum the extras, then apply one correction: `base * (1 + sum / 100)`
    #[default]
    Additive,
    /// Apply each technology in turn: `base * Π(1 + extra / 100)`
    Sequential,
}

impl std::fmt::Display for CompositionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositionPolicy::Additive => write!(f, "additive"),
            CompositionPolicy::Sequential => write!(f, "sequential"),
        }
    }
}

impl std::str::FromStr for CompositionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "additive" => Ok(CompositionPolicy::Additive),
            "sequential" | "multiplicative" => Ok(CompositionPolicy::Sequential),
            _ => Err(format!("Unknown composition policy: {}", s)),
        }
    }
}

/// One technology's share of a stage adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub technology_id: String,
    pub technology_name: String,
    /// Resolved extra-yield percentage for the row's year
    pub extra: f64,
    pub dynamic: bool,
}

/// Adjusted yield for one stage, with its audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageYield {
    pub stage: Stage,
    /// Yield before technology adjustments (`None` = not computable)
    pub base: Option<f64>,
    /// Yield after adjustments (`None` = not computable)
    pub value: Option<f64>,
    /// Sum of all contributions, in percentage points
    pub total_extra: f64,
    pub contributions: Vec<Contribution>,
}

impl StageYield {
    /// Recompute the adjusted value from the audit trail under `policy`
    pub fn replay(&self, policy: CompositionPolicy) -> Option<f64> {
        let extras: Vec<f64> = self.contributions.iter().map(|c| c.extra).collect();
        self.base.map(|base| apply(base, &extras, policy))
    }
}

fn apply(base: f64, extras: &[f64], policy: CompositionPolicy) -> f64 {
    match policy {
        CompositionPolicy::Additive => {
            let total: f64 = extras.iter().sum();
            clamp01(base * (1.0 + total / 100.0))
        }
        CompositionPolicy::Sequential => {
            let adjusted = extras
                .iter()
                .fold(base, |acc, extra| acc * (1.0 + extra / 100.0));
            clamp01(adjusted)
        }
    }
}

/// Compose a stage's adjusted yield for `year`
///
/// Technologies targeting other stages are ignored. An absent base yields an
/// absent value; the audit trail is still recorded.
pub fn compose<'t>(
    stage: Stage,
    base: Option<f64>,
    technologies: impl IntoIterator<Item = &'t Technology>,
    year: i32,
    policy: CompositionPolicy,
) -> StageYield {
    let contributions: Vec<Contribution> = technologies
        .into_iter()
        .filter(|t| t.stage == stage)
        .map(|t| Contribution {
            technology_id: t.id.clone(),
            technology_name: t.name.clone(),
            extra: t.resolve(year),
            dynamic: t.is_dynamic(),
        })
        .collect();

    let extras: Vec<f64> = contributions.iter().map(|c| c.extra).collect();
    let total_extra = extras.iter().sum();

    StageYield {
        stage,
        base,
        value: base.map(|b| apply(b, &extras, policy)),
        total_extra,
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn techs() -> Vec<Technology> {
        vec![
            Technology::fixed("TECH-A", "Anneal", Stage::Fab, 10.0),
            Technology::fixed("TECH-B", "Bake", Stage::Fab, 20.0),
            Technology::fixed("TECH-C", "Cut", Stage::Saw, 50.0),
        ]
    }

    #[test]
    fn test_additive_sums_then_multiplies() {
        let techs = techs();
        let sy = compose(Stage::Fab, Some(0.5), &techs, 2026, CompositionPolicy::Additive);
        assert!((sy.value.unwrap() - 0.65).abs() < 1e-12);
        assert_eq!(sy.total_extra, 30.0);
        assert_eq!(sy.contributions.len(), 2);
        assert_eq!(sy.contributions[0].technology_name, "Anneal");
    }

    #[test]
    fn test_sequential_multiplies_each() {
        let techs = techs();
        let sy = compose(Stage::Fab, Some(0.5), &techs, 2026, CompositionPolicy::Sequential);
        assert!((sy.value.unwrap() - 0.66).abs() < 1e-12);
    }

    #[test]
    fn test_no_matching_technology_keeps_base() {
        let techs = techs();
        let sy = compose(Stage::Kgd, Some(0.8), &techs, 2026, CompositionPolicy::Additive);
        assert_eq!(sy.value, Some(0.8));
        assert!(sy.contributions.is_empty());
    }

    #[test]
    fn test_result_is_clamped() {
        let techs = techs();
        let sy = compose(Stage::Saw, Some(0.9), &techs, 2026, CompositionPolicy::Additive);
        assert_eq!(sy.value, Some(1.0));

        let harsh = [Technology::fixed("TECH-X", "Harsh", Stage::Saw, -250.0)];
        let sy = compose(Stage::Saw, Some(0.9), &harsh, 2026, CompositionPolicy::Additive);
        assert_eq!(sy.value, Some(0.0));
    }

    #[test]
    fn test_absent_base_stays_absent_with_audit() {
        let techs = techs();
        let sy = compose(Stage::Fab, None, &techs, 2026, CompositionPolicy::Additive);
        assert_eq!(sy.value, None);
        assert_eq!(sy.contributions.len(), 2);
    }

    #[test]
    fn test_dynamic_contribution_flag_and_year() {
        let techs = [Technology::yearly("TECH-D", "Litho", Stage::Epi, 5.0, [(2028, 4.0)])];
        let early = compose(Stage::Epi, Some(0.5), &techs, 2027, CompositionPolicy::Additive);
        assert_eq!(early.contributions[0].extra, 0.0);
        assert!(early.contributions[0].dynamic);
        assert_eq!(early.value, Some(0.5));

        let late = compose(Stage::Epi, Some(0.5), &techs, 2028, CompositionPolicy::Additive);
        assert!((late.value.unwrap() - 0.52).abs() < 1e-12);
    }

    #[test]
    fn test_replay_matches_value() {
        let techs = techs();
        for policy in [CompositionPolicy::Additive, CompositionPolicy::Sequential] {
            let sy = compose(Stage::Fab, Some(0.42), &techs, 2026, policy);
            assert!((sy.replay(policy).unwrap() - sy.value.unwrap()).abs() < 1e-12);
        }
    }
}
