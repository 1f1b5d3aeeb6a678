//! Entity loading from a project directory
//!
//! Each entity kind lives in its own directory with one `*.yaml` file per
//! entity. Files are read in file-name order, which becomes document order.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::document::{Document, TechnologyOverride};
use crate::core::identity::EntityPrefix;
use crate::yaml::{parse_yaml_file, YamlError};

/// Plant baseline file at the project root
pub const PLANT_FILE: &str = "plant.yaml";

/// Flat technology-year override rows at the project root
pub const OVERRIDES_FILE: &str = "technology_overrides.yaml";

/// `*.yaml` files directly inside `dir`, sorted by file name
pub fn entity_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "yaml" || ext == "yml"))
        .collect();
    files.sort();
    files
}

/// Load every entity of type T from a directory
///
/// A missing directory is empty. The first file that fails to parse aborts
/// the load with a located diagnostic.
pub fn load_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, YamlError> {
    entity_files(dir)
        .iter()
        .map(|path| parse_yaml_file(path))
        .collect()
}

/// Load an optional single-file value, defaulting when the file is absent
pub fn load_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, YamlError> {
    if path.is_file() {
        parse_yaml_file(path)
    } else {
        Ok(T::default())
    }
}

/// Assemble a [`Document`] from a project root
pub fn load_document(root: &Path) -> Result<Document, YamlError> {
    let dir = |prefix: EntityPrefix| root.join(prefix.dir_name());

    let doc = Document {
        scenarios: load_all(&dir(EntityPrefix::Scn))?,
        families: load_all(&dir(EntityPrefix::Fam))?,
        chips: load_all(&dir(EntityPrefix::Chip))?,
        technologies: load_all(&dir(EntityPrefix::Tech))?,
        technology_overrides: load_optional::<Vec<TechnologyOverride>>(&root.join(OVERRIDES_FILE))?,
        models: load_all(&dir(EntityPrefix::Ym))?,
        plant: load_optional(&root.join(PLANT_FILE))?,
    };

    debug!(
        root = %root.display(),
        entities = doc.entity_count(),
        "loaded project document"
    );
    Ok(doc)
}
