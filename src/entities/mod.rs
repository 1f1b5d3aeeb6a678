//! Entity type definitions
//!
//! - [`Scenario`] - projection window, yield model choice and stage baselines
//! - [`Family`] - defect-density parameters shared by a product family
//! - [`ChipType`] - a die variant with its area and applied technologies
//! - [`Technology`] - static or year-varying extra yield on one stage
//! - [`YieldModel`] - a formula from the yield model library

pub mod chip;
pub mod family;
pub mod scenario;
pub mod technology;
pub mod yield_model;

pub use chip::ChipType;
pub use family::Family;
pub use scenario::{PlantBaselines, Scenario};
pub use technology::{ExtraYield, Technology};
pub use yield_model::{YieldFormula, YieldModel};
