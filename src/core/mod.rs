//! Core module - projection engine, project plumbing and shared types

pub mod composer;
pub mod config;
pub mod document;
pub mod engine;
pub mod entity;
pub mod identity;
pub mod integrity;
pub mod loader;
pub mod project;
pub mod years;

pub use composer::{compose, CompositionPolicy, Contribution, StageYield};
pub use config::Config;
pub use document::{Document, DocumentIndex, TechnologyOverride};
pub use engine::{project_scenario, Projection, ProjectionOptions, ResultRow, RowError, ScenarioError};
pub use entity::{Entity, Stage};
pub use identity::{EntityId, EntityPrefix};
pub use project::{Project, ProjectError};
pub use years::{YearIndexing, YearTable};
