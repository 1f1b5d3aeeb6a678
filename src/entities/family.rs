//! Family entity - defect-density parameters shared by a product family
//!
//! A family owns the defect-density curve every chip in it follows. Two
//! policies are supported, selected by the presence of an interpolation
//! window (`t_end > t_start`):
//!
//! - exponential decay: `D0 + D_in * exp(-t * max(0, y - t_start))`
//! - linear interpolation from `D0` to `D_in` across `[t_start, t_end]`

use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;

/// Which defect-density curve a family follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectPolicy {
    /// Exponential decay toward `D0`
    Exponential,
    /// Linear ramp between `D0` and `D_in`
    Linear,
}

impl std::fmt::Display for DefectPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefectPolicy::Exponential => write!(f, "exponential"),
            DefectPolicy::Linear => write!(f, "linear"),
        }
    }
}

/// Product family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    /// Unique identifier
    pub id: String,

    /// Family name
    pub name: String,

    /// Baseline defect density (defects / cm²)
    pub d0: f64,

    /// Incoming defect density
    pub d_in: f64,

    /// Decay rate constant
    #[serde(default)]
    pub t: f64,

    /// Year index where decay (or interpolation) begins
    #[serde(default)]
    pub t_start: f64,

    /// Year index where interpolation ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_end: Option<f64>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Family {
    const PREFIX: &'static str = "FAM";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Family {
    /// Create a family following the exponential-decay policy
    pub fn new(id: impl Into<String>, name: impl Into<String>, d0: f64, d_in: f64, t: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            d0,
            d_in,
            t,
            t_start: 0.0,
            t_end: None,
            description: None,
        }
    }

    /// The policy selected by this family's parameters
    pub fn policy(&self) -> DefectPolicy {
        match self.t_end {
            Some(t_end) if t_end > self.t_start => DefectPolicy::Linear,
            _ => DefectPolicy::Exponential,
        }
    }

    /// Defect density at relative year index `y_idx`
    pub fn defect_density(&self, y_idx: f64) -> f64 {
        self.defect_density_with(y_idx, None)
    }

    /// Defect density at `y_idx`, optionally replacing the decay constant
    ///
    /// The result is not clamped; a density is not a probability.
    pub fn defect_density_with(&self, y_idx: f64, decay_override: Option<f64>) -> f64 {
        match (self.policy(), self.t_end) {
            (DefectPolicy::Linear, Some(t_end)) => {
                let clamped = y_idx.clamp(self.t_start, t_end);
                let fraction = (clamped - self.t_start) / (t_end - self.t_start);
                self.d0 + (self.d_in - self.d0) * fraction
            }
            _ => {
                let t = decay_override.unwrap_or(self.t);
                let elapsed = (y_idx - self.t_start).max(0.0);
                self.d0 + self.d_in * (-t * elapsed).exp()
            }
        }
    }

    /// Check that every parameter is a finite number
    pub fn has_finite_parameters(&self) -> bool {
        [self.d0, self.d_in, self.t, self.t_start]
            .iter()
            .chain(self.t_end.iter())
            .all(|v| v.is_finite())
    }
}
