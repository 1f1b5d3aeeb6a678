//! Project discovery and structure

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::document::Document;
use crate::core::identity::EntityPrefix;
use crate::core::loader::{self, PLANT_FILE};
use crate::yaml::YamlError;

/// Marker directory at the project root
pub const PROJECT_DIR: &str = ".yld";

/// A yield projection project on disk
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .yld/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(ProjectError::io)?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start.canonicalize().map_err(ProjectError::io)?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create the project structure at `path`
    ///
    /// Fails when `.yld/` already exists unless `force` is set; forcing
    /// rewrites the config and keeps every entity file.
    pub fn init(path: &Path, force: bool) -> Result<Self, ProjectError> {
        std::fs::create_dir_all(path).map_err(ProjectError::io)?;
        let root = path.canonicalize().map_err(ProjectError::io)?;

        let yld_dir = root.join(PROJECT_DIR);
        if yld_dir.exists() && !force {
            return Err(ProjectError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&yld_dir).map_err(ProjectError::io)?;
        std::fs::write(yld_dir.join("config.yaml"), DEFAULT_CONFIG).map_err(ProjectError::io)?;

        for prefix in EntityPrefix::all() {
            std::fs::create_dir_all(root.join(prefix.dir_name())).map_err(ProjectError::io)?;
        }

        let plant = root.join(PLANT_FILE);
        if !plant.exists() {
            std::fs::write(&plant, DEFAULT_PLANT).map_err(ProjectError::io)?;
        }

        Ok(Self { root })
    }

    /// Write the worked example entities, returning the files created
    ///
    /// Existing files are left alone, except an untouched default plant file.
    pub fn write_seed(&self) -> Result<Vec<PathBuf>, ProjectError> {
        let mut written = Vec::new();
        for (relative, content) in SEED_FILES {
            let path = self.root.join(relative);
            let replaceable = *relative == PLANT_FILE
                && std::fs::read_to_string(&path).is_ok_and(|c| c == DEFAULT_PLANT);
            if path.exists() && !replaceable {
                continue;
            }
            std::fs::write(&path, content).map_err(ProjectError::io)?;
            written.push(path);
        }
        Ok(written)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn yld_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.yld_dir().join("config.yaml")
    }

    /// Directory holding entities of a given kind
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(prefix.dir_name())
    }

    /// Path for an entity file named after its identity
    pub fn entity_path(&self, prefix: EntityPrefix, id: &str) -> PathBuf {
        self.entity_dir(prefix).join(format!("{}.yaml", id))
    }

    /// Entity files of one kind, in document order
    pub fn entity_files(&self, prefix: EntityPrefix) -> Vec<PathBuf> {
        loader::entity_files(&self.entity_dir(prefix))
    }

    /// Read every entity in the project into one snapshot
    pub fn load_document(&self) -> Result<Document, ProjectError> {
        Ok(loader::load_document(&self.root)?)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a yld project (searched from {searched_from:?})")]
    #[diagnostic(code(yld::project::not_found), help("run 'yld init' or pass --document FILE"))]
    NotFound { searched_from: PathBuf },

    #[error("yld project already exists at {0:?}")]
    #[diagnostic(code(yld::project::exists), help("use --force to rewrite the configuration"))]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] YamlError),

    #[error("IO error: {0}")]
    #[diagnostic(code(yld::project::io))]
    Io(#[from] std::io::Error),
}

impl ProjectError {
    fn io(err: std::io::Error) -> Self {
        ProjectError::Io(err)
    }
}

const DEFAULT_CONFIG: &str = r#"# yld project configuration

# Default author for new entities (falls back to git user.name)
# author: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Year index fed to the defect model: relative (first year = 0),
# relative_plus_one (first year = 1) or calendar
# year_indexing: relative

# How technologies on one stage combine: additive or sequential
# composition: additive
"#;

const DEFAULT_PLANT: &str = r#"# Plant-level baseline yields for stages not derived from defect density.
# Scenarios may override these per year under `baselines`.
stages: {}
"#;

const SEED_FILES: &[(&str, &str)] = &[
    (
        "plant.yaml",
        "stages:\n  epi: 0.98\n  saw: 0.995\n  kgd: 0.97\n  osat: 0.99\n",
    ),
    (
        "models/YM-POISSON.yaml",
        "id: YM-POISSON\nname: Poisson\nformula: poisson\n",
    ),
    (
        "models/YM-NEGBIN.yaml",
        "id: YM-NEGBIN\nname: Negative binomial (clustered)\nformula: negative_binomial\nalpha: 2.0\n",
    ),
    (
        "families/FAM-BCD.yaml",
        r#"id: FAM-BCD
name: BCD power
d0: 0.08
d_in: 0.6
t: 0.45
t_start: 0
"#,
    ),
    (
        "technologies/TECH-CU.yaml",
        r#"id: TECH-CU
name: Copper clip
stage: osat
extra_yield:
  kind: static
  value: 0.5
"#,
    ),
    (
        "technologies/TECH-EUV.yaml",
        r#"id: TECH-EUV
name: Litho upgrade
stage: fab
extra_yield:
  kind: dynamic
  nominal: 3.0
  overrides:
    2027: 1.0
    2029: 3.0
"#,
    ),
    (
        "chips/BCR-401.yaml",
        r#"id: BCR-401
name: LED driver
family: FAM-BCD
package: SOT-23
die_area_mm2: 1.8
technologies: [TECH-CU]
"#,
    ),
    (
        "chips/PMIC-88.yaml",
        r#"id: PMIC-88
name: Power management IC
family: FAM-BCD
package: QFN-48
die_area_mm2: 24.0
special_start_year: 2027
technologies: [TECH-EUV, TECH-CU]
"#,
    ),
    (
        "scenarios/SCN-BASE.yaml",
        r#"id: SCN-BASE
name: Base case
start_year: 2026
end_year: 2030
model: YM-POISSON
baselines:
  kgd:
    2028: 0.98
"#,
    ),
];
