//! Entity identity system using type-prefixed ULIDs
//!
//! Entities reference each other by plain identity strings. Chip types are
//! usually keyed by their part number; everything created through `yld new`
//! gets a generated `PREFIX-ULID` identifier from [`EntityId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Projection scenario (time window + yield model)
    Scn,
    /// Product family (defect-density parameters)
    Fam,
    /// Chip type / part number
    Chip,
    /// Process technology (extra-yield adjustment)
    Tech,
    /// Yield model definition
    Ym,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Scn => "SCN",
            EntityPrefix::Fam => "FAM",
            EntityPrefix::Chip => "CHIP",
            EntityPrefix::Tech => "TECH",
            EntityPrefix::Ym => "YM",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Scn,
            EntityPrefix::Fam,
            EntityPrefix::Chip,
            EntityPrefix::Tech,
            EntityPrefix::Ym,
        ]
    }

    /// Project directory holding entities of this type
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityPrefix::Scn => "scenarios",
            EntityPrefix::Fam => "families",
            EntityPrefix::Chip => "chips",
            EntityPrefix::Tech => "technologies",
            EntityPrefix::Ym => "models",
        }
    }

    /// Try to determine entity prefix from a filename
    /// Looks for patterns like "FAM-xxx.yaml" or "fam.schema.json"
    pub fn from_filename(filename: &str) -> Option<Self> {
        let upper = filename.to_uppercase();
        for prefix in Self::all() {
            let prefix_str = prefix.as_str();
            if upper.starts_with(&format!("{}-", prefix_str)) {
                return Some(*prefix);
            }
            if upper.starts_with(&format!("{}.", prefix_str)) {
                return Some(*prefix);
            }
        }
        None
    }

    /// Try to determine entity prefix from a file path by examining parent directories
    ///
    /// Chip files are named after their part number, so the directory is the
    /// only reliable signal for them.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        for component in path.components().rev() {
            if let std::path::Component::Normal(os_str) = component {
                let dir_name = os_str.to_string_lossy().to_lowercase();
                if let Some(prefix) = Self::all().iter().find(|p| p.dir_name() == dir_name) {
                    return Some(*prefix);
                }
            }
        }

        path.file_name()
            .and_then(|name| Self::from_filename(&name.to_string_lossy()))
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generated entity identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}
