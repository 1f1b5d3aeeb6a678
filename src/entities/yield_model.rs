//! Yield model entity - the statistical formula mapping defects to good-die probability
//!
//! All formulas work on `x = D * A`, the expected defect count per die, with
//! the die area converted from mm² to cm².

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::entity::{clamp01, Entity};

/// Default shape parameter for the negative binomial model
pub const DEFAULT_ALPHA: f64 = 3.0;

/// Calibration factor of the fixed-loss Seeds variant
pub const SEEDS_FIXED_LOSS_FACTOR: f64 = 0.92;

/// Members of the yield model library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldFormula {
    /// `exp(-x)`
    Poisson,
    /// `(1 - exp(-x)) / x`
    Murphy,
    /// `exp(-sqrt(x))`
    Seeds,
    /// `exp(-0.92 x)`
    SeedsFixedLoss,
    /// `(1 / (1 + x))^n`
    Bose,
    /// `(1 + x / alpha)^(-alpha)`
    NegativeBinomial,
}

impl YieldFormula {
    pub fn all() -> &'static [YieldFormula] {
        &[
            YieldFormula::Poisson,
            YieldFormula::Murphy,
            YieldFormula::Seeds,
            YieldFormula::SeedsFixedLoss,
            YieldFormula::Bose,
            YieldFormula::NegativeBinomial,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            YieldFormula::Poisson => "poisson",
            YieldFormula::Murphy => "murphy",
            YieldFormula::Seeds => "seeds",
            YieldFormula::SeedsFixedLoss => "seeds_fixed_loss",
            YieldFormula::Bose => "bose",
            YieldFormula::NegativeBinomial => "negative_binomial",
        }
    }

    /// Human-readable expression in terms of `x`
    pub fn expression(&self) -> &'static str {
        match self {
            YieldFormula::Poisson => "exp(-x)",
            YieldFormula::Murphy => "(1 - exp(-x)) / x",
            YieldFormula::Seeds => "exp(-sqrt(x))",
            YieldFormula::SeedsFixedLoss => "exp(-0.92 * x)",
            YieldFormula::Bose => "(1 / (1 + x))^n",
            YieldFormula::NegativeBinomial => "(1 + x / alpha)^(-alpha)",
        }
    }
}

impl std::fmt::Display for YieldFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for YieldFormula {
    type Err = UnknownFormula;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_lowercase().replace('-', "_");
        YieldFormula::all()
            .iter()
            .find(|f| f.as_str() == key)
            .copied()
            .ok_or_else(|| UnknownFormula(s.to_string()))
    }
}

/// A formula tag that is not part of the library
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown yield formula '{0}' (valid: poisson, murphy, seeds, seeds_fixed_loss, bose, negative_binomial)")]
pub struct UnknownFormula(pub String);

/// Yield model definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldModel {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Formula from the library
    pub formula: YieldFormula,

    /// Negative binomial clustering parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,

    /// Bose exponent (number of critical layers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<f64>,
}

impl Entity for YieldModel {
    const PREFIX: &'static str = "YM";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl YieldModel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, formula: YieldFormula) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            formula,
            alpha: None,
            n: None,
        }
    }

    /// Ad hoc model wrapping a bare library formula with default parameters
    pub fn from_formula(formula: YieldFormula) -> Self {
        Self::new(formula.as_str(), formula.as_str(), formula)
    }

    /// Effective negative binomial alpha
    pub fn alpha(&self) -> f64 {
        match self.alpha {
            Some(a) if a > 0.0 => a,
            _ => DEFAULT_ALPHA,
        }
    }

    /// Effective Bose exponent
    pub fn n(&self) -> f64 {
        self.n.unwrap_or(1.0)
    }

    /// Expected defects per die for density `d` (per cm²) and area in mm²
    pub fn defects_per_die(defect_density: f64, die_area_mm2: f64) -> f64 {
        defect_density * (die_area_mm2 / 100.0)
    }

    /// Probability of a good die, clamped to `[0, 1]`
    pub fn probability(&self, defect_density: f64, die_area_mm2: f64) -> f64 {
        let x = Self::defects_per_die(defect_density, die_area_mm2);
        clamp01(self.evaluate(x))
    }

    /// Raw formula value at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        match self.formula {
            YieldFormula::Poisson => (-x).exp(),
            YieldFormula::Murphy => {
                if x == 0.0 {
                    1.0
                } else {
                    (1.0 - (-x).exp()) / x
                }
            }
            YieldFormula::Seeds => (-x.max(0.0).sqrt()).exp(),
            YieldFormula::SeedsFixedLoss => (-x * SEEDS_FIXED_LOSS_FACTOR).exp(),
            YieldFormula::Bose => (1.0 / (1.0 + x)).powf(self.n()),
            YieldFormula::NegativeBinomial => {
                let alpha = self.alpha();
                (1.0 + x / alpha).powf(-alpha)
            }
        }
    }

    /// One-line formula preview with the numbers plugged in
    pub fn preview(&self, defect_density: f64, die_area_mm2: f64) -> String {
        let x = Self::defects_per_die(defect_density, die_area_mm2);
        let params = match self.formula {
            YieldFormula::Bose => format!(", n = {}", self.n()),
            YieldFormula::NegativeBinomial => format!(", alpha = {}", self.alpha()),
            _ => String::new(),
        };
        format!(
            "{} = {:.4}, x = D * A / 100 = {:.4} * {:.4} / 100 = {:.4}{}",
            self.formula.expression(),
            self.probability(defect_density, die_area_mm2),
            defect_density,
            die_area_mm2,
            x,
            params
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(formula: YieldFormula) -> YieldModel {
        YieldModel::from_formula(formula)
    }

    #[test]
    fn test_poisson_reference_point() {
        // D = 1 /cm², A = 100 mm² -> x = 1
        let y = model(YieldFormula::Poisson).probability(1.0, 100.0);
        assert!((y - (-1.0_f64).exp()).abs() < 1e-12);
        assert!((y - 0.3679).abs() < 1e-4);
    }

    #[test]
    fn test_murphy_limit_at_zero() {
        let murphy = model(YieldFormula::Murphy);
        assert_eq!(murphy.probability(0.0, 50.0), 1.0);
        assert_eq!(murphy.probability(0.7, 0.0), 1.0);
    }

    #[test]
    fn test_murphy_value() {
        let y = model(YieldFormula::Murphy).probability(1.0, 100.0);
        let expected = 1.0 - (-1.0_f64).exp();
        assert!((y - expected).abs() < 1e-12);
    }

    #[test]
    fn test_seeds_variants_are_distinct() {
        let sqrt = model(YieldFormula::Seeds).probability(4.0, 100.0);
        let fixed = model(YieldFormula::SeedsFixedLoss).probability(4.0, 100.0);
        assert!((sqrt - (-2.0_f64).exp()).abs() < 1e-12);
        assert!((fixed - (-3.68_f64).exp()).abs() < 1e-12);
        assert_ne!(sqrt, fixed);
    }

    #[test]
    fn test_bose_default_and_custom_n() {
        let mut bose = model(YieldFormula::Bose);
        assert!((bose.probability(1.0, 100.0) - 0.5).abs() < 1e-12);
        bose.n = Some(2.0);
        assert!((bose.probability(1.0, 100.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_negative_binomial_alpha_defaults() {
        let mut nb = model(YieldFormula::NegativeBinomial);
        let expected = (1.0_f64 + 1.0 / 3.0).powf(-3.0);
        assert!((nb.probability(1.0, 100.0) - expected).abs() < 1e-12);

        nb.alpha = Some(-1.0);
        assert!((nb.probability(1.0, 100.0) - expected).abs() < 1e-12);

        nb.alpha = Some(1.0);
        assert!((nb.probability(1.0, 100.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_output_clamped() {
        // Negative density would push Poisson above 1
        for formula in YieldFormula::all() {
            let y = model(*formula).probability(-0.5, 100.0);
            assert!((0.0..=1.0).contains(&y), "{} gave {}", formula, y);
        }
    }

    #[test]
    fn test_formula_parse() {
        assert_eq!("negative-binomial".parse::<YieldFormula>().unwrap(), YieldFormula::NegativeBinomial);
        assert_eq!("Seeds_Fixed_Loss".parse::<YieldFormula>().unwrap(), YieldFormula::SeedsFixedLoss);
        assert_eq!(
            "gamma".parse::<YieldFormula>().unwrap_err(),
            UnknownFormula("gamma".to_string())
        );
    }

    #[test]
    fn test_unknown_formula_in_yaml_is_rejected() {
        let yaml = "id: YM-1\nname: Bad\nformula: gamma\n";
        assert!(serde_yml::from_str::<YieldModel>(yaml).is_err());
    }

    #[test]
    fn test_preview() {
        let preview = model(YieldFormula::Poisson).preview(1.0, 100.0);
        insta::assert_snapshot!(preview, @"exp(-x) = 0.3679, x = D * A / 100 = 1.0000 * 100.0000 / 100 = 1.0000");
    }
}
