//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::composer::CompositionPolicy;
use crate::core::project::Project;
use crate::core::years::YearIndexing;

/// yld configuration
///
/// Sources, lowest priority first: built-in defaults, the global user file,
/// the project's `.yld/config.yaml`, then `YLD_*` environment variables.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author written into new entity files
    pub author: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// How calendar years map to the defect model's year index
    pub year_indexing: Option<YearIndexing>,

    /// How technologies on one stage combine
    pub composition: Option<CompositionPolicy>,
}

impl Config {
    /// Load configuration for the project discovered from the current directory
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    /// Load configuration for a specific project (or none)
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        if let Some(global) = Self::global_config_path().and_then(|p| Self::read_file(&p)) {
            config.merge(global);
        }

        if let Some(local) = project.and_then(|p| Self::read_file(&p.config_path())) {
            config.merge(local);
        }

        config.merge(Self::from_env());
        config
    }

    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "yld")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Read one config file; unreadable or malformed files are skipped with a warning
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| warn!(path = %path.display(), error = %e, "cannot read config"))
            .ok()?;
        // The generated config is all comments
        if contents
            .lines()
            .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'))
        {
            return Some(Config::default());
        }
        serde_yml::from_str(&contents)
            .map_err(|e| warn!(path = %path.display(), error = %e, "ignoring malformed config"))
            .ok()
    }

    fn from_env() -> Config {
        let parsed = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Config {
            author: parsed("YLD_AUTHOR"),
            default_format: parsed("YLD_FORMAT"),
            year_indexing: parsed("YLD_YEAR_INDEXING").and_then(|v| {
                v.parse()
                    .map_err(|e| warn!(error = %e, "ignoring YLD_YEAR_INDEXING"))
                    .ok()
            }),
            composition: parsed("YLD_COMPOSITION").and_then(|v| {
                v.parse()
                    .map_err(|e| warn!(error = %e, "ignoring YLD_COMPOSITION"))
                    .ok()
            }),
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.year_indexing.is_some() {
            self.year_indexing = other.year_indexing;
        }
        if other.composition.is_some() {
            self.composition = other.composition;
        }
    }

    /// Author name, falling back to git config, then the login name
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn year_indexing(&self) -> YearIndexing {
        self.year_indexing.unwrap_or_default()
    }

    pub fn composition(&self) -> CompositionPolicy {
        self.composition.unwrap_or_default()
    }
}
