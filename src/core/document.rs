//! Input document - an immutable snapshot of everything a projection reads
//!
//! The engine never touches the filesystem. Callers build a [`Document`]
//! (from a single YAML/JSON file, a project directory, or in memory) and the
//! engine builds one read-only [`DocumentIndex`] over it per call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::entities::chip::ChipType;
use crate::entities::family::Family;
use crate::entities::scenario::{PlantBaselines, Scenario};
use crate::entities::technology::{ExtraYield, Technology};
use crate::entities::yield_model::YieldModel;
use crate::yaml::{parse_yaml, YamlError};

/// A flat technology-year override row
///
/// Rows are folded into dynamic technologies when the index is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyOverride {
    /// Technology identity
    pub technology: String,

    /// Calendar year
    pub year: i32,

    /// Extra-yield percentage for that year
    pub extra_yield: f64,
}

/// Everything a projection reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub scenarios: Vec<Scenario>,

    #[serde(default)]
    pub families: Vec<Family>,

    #[serde(default)]
    pub chips: Vec<ChipType>,

    #[serde(default)]
    pub technologies: Vec<Technology>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technology_overrides: Vec<TechnologyOverride>,

    #[serde(default)]
    pub models: Vec<YieldModel>,

    #[serde(default)]
    pub plant: PlantBaselines,
}

/// Errors reading a document file
#[derive(Debug, Error, miette::Diagnostic)]
pub enum DocumentError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("invalid JSON in {path}: {message}")]
    #[diagnostic(code(yld::document::json))]
    Json { path: String, message: String },

    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(yld::document::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Document {
    /// Read a document from a `.json` or YAML file
    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let filename = path.display().to_string();

        if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content).map_err(|e| DocumentError::Json {
                path: filename,
                message: e.to_string(),
            })
        } else {
            Ok(parse_yaml(&content, &filename)?)
        }
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Total number of entities of every kind
    pub fn entity_count(&self) -> usize {
        self.scenarios.len()
            + self.families.len()
            + self.chips.len()
            + self.technologies.len()
            + self.models.len()
    }
}

/// Read-only lookup structure over a [`Document`]
///
/// When an identity appears more than once, the first entity wins.
pub struct DocumentIndex<'a> {
    families: HashMap<&'a str, &'a Family>,
    technologies: HashMap<&'a str, Technology>,
    models: HashMap<&'a str, &'a YieldModel>,
    first_model: Option<&'a YieldModel>,
}

impl<'a> DocumentIndex<'a> {
    pub fn build(doc: &'a Document) -> Self {
        let mut families = HashMap::new();
        for fam in &doc.families {
            families.entry(fam.id.as_str()).or_insert(fam);
        }

        let mut technologies: HashMap<&'a str, Technology> = HashMap::new();
        for tech in &doc.technologies {
            technologies
                .entry(tech.id.as_str())
                .or_insert_with(|| tech.clone());
        }
        for row in &doc.technology_overrides {
            if let Some(tech) = technologies.get_mut(row.technology.as_str()) {
                if let ExtraYield::Dynamic { overrides, .. } = &mut tech.extra_yield {
                    // Rows embedded in the technology take precedence
                    overrides.entry(row.year).or_insert(row.extra_yield);
                }
            }
        }

        let mut models = HashMap::new();
        for model in &doc.models {
            models.entry(model.id.as_str()).or_insert(model);
        }

        Self {
            families,
            technologies,
            models,
            first_model: doc.models.first(),
        }
    }

    pub fn family(&self, id: &str) -> Option<&'a Family> {
        self.families.get(id).copied()
    }

    pub fn technology(&self, id: &str) -> Option<&Technology> {
        self.technologies.get(id)
    }

    pub fn model(&self, id: &str) -> Option<&'a YieldModel> {
        self.models.get(id).copied()
    }

    /// The model used when a scenario's reference does not resolve
    pub fn fallback_model(&self) -> Option<&'a YieldModel> {
        self.first_model
    }
}
