//! Entity trait - common interface for all entity types

use serde::{de::DeserializeOwned, Serialize};

/// Common trait for all yield-projection entities
pub trait Entity: Serialize + DeserializeOwned {
    /// The entity type prefix (e.g., "FAM", "TECH")
    const PREFIX: &'static str;

    /// Get the entity's identity string
    fn id(&self) -> &str;

    /// Get the entity's display name
    fn name(&self) -> &str;
}

/// Production stages, in line order
///
/// Every stage contributes an independent yield probability to a die's total.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Wafer fabrication (modeled from defect density)
    Fab,
    /// Epitaxy
    Epi,
    /// Wafer sawing / dicing
    Saw,
    /// Known-good-die screening
    Kgd,
    /// Outsourced assembly and test
    Osat,
}

impl Stage {
    /// All stages in line order
    pub fn all() -> &'static [Stage] {
        &[Stage::Fab, Stage::Epi, Stage::Saw, Stage::Kgd, Stage::Osat]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fab => "fab",
            Stage::Epi => "epi",
            Stage::Saw => "saw",
            Stage::Kgd => "kgd",
            Stage::Osat => "osat",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fab" | "fabrication" => Ok(Stage::Fab),
            "epi" | "epitaxy" => Ok(Stage::Epi),
            "saw" | "sawing" => Ok(Stage::Saw),
            "kgd" => Ok(Stage::Kgd),
            "osat" => Ok(Stage::Osat),
            _ => Err(format!("Unknown stage: {}", s)),
        }
    }
}

/// Clamp a value into the probability range `[0, 1]`
///
/// NaN is passed through so callers can detect it.
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parse_and_display() {
        for stage in Stage::all() {
            let parsed: Stage = stage.to_string().parse().unwrap();
            assert_eq!(parsed, *stage);
        }
        assert_eq!("Fabrication".parse::<Stage>().unwrap(), Stage::Fab);
        assert!("packaging".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_order_is_line_order() {
        let mut stages = vec![Stage::Osat, Stage::Fab, Stage::Kgd];
        stages.sort();
        assert_eq!(stages, vec![Stage::Fab, Stage::Kgd, Stage::Osat]);
    }

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(1.3), 1.0);
        assert_eq!(clamp01(-0.2), 0.0);
        assert_eq!(clamp01(0.42), 0.42);
        assert!(clamp01(f64::NAN).is_nan());
    }
}
