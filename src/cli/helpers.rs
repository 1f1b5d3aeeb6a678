//! Shared helper functions for CLI commands

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::composer::CompositionPolicy;
use crate::core::config::Config;
use crate::core::document::Document;
use crate::core::engine::ProjectionOptions;
use crate::core::project::Project;
use crate::core::years::YearIndexing;

/// Inputs resolved from the global options
pub struct Workspace {
    pub document: Document,
    pub config: Config,
    /// Absent when reading a single `--document` file
    pub project: Option<Project>,
}

/// Locate the project from `--project` or the current directory
pub fn require_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path)?,
        None => Project::discover()?,
    };
    Ok(project)
}

/// Load the input document from `--document` or the project tree
pub fn load_workspace(global: &GlobalOpts) -> Result<Workspace> {
    if let Some(path) = &global.document {
        let document = Document::from_file(path)?;
        tracing::debug!(path = %path.display(), entities = document.entity_count(), "loaded document file");
        // A surrounding project may still contribute configuration
        let project = Project::discover().ok();
        return Ok(Workspace {
            document,
            config: Config::load_for(project.as_ref()),
            project: None,
        });
    }

    let project = require_project(global)?;
    let document = project.load_document()?;
    Ok(Workspace {
        document,
        config: Config::load_for(Some(&project)),
        project: Some(project),
    })
}

/// Projection options from command flags, falling back to configuration
pub fn projection_options(
    config: &Config,
    model: Option<&str>,
    indexing: Option<YearIndexing>,
    composition: Option<CompositionPolicy>,
) -> ProjectionOptions {
    ProjectionOptions {
        model_override: model.map(str::to_string),
        year_indexing: indexing.unwrap_or_else(|| config.year_indexing()),
        composition: composition.unwrap_or_else(|| config.composition()),
    }
}

/// Format a probability with four decimals, `-` when absent
pub fn format_prob(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prob() {
        assert_eq!(format_prob(Some(0.367879)), "0.3679");
        assert_eq!(format_prob(None), "-");
    }

    #[test]
    fn test_projection_options_flags_beat_config() {
        let config = Config {
            year_indexing: Some(YearIndexing::Calendar),
            composition: Some(CompositionPolicy::Sequential),
            ..Default::default()
        };

        let opts = projection_options(&config, None, None, None);
        assert_eq!(opts.year_indexing, YearIndexing::Calendar);
        assert_eq!(opts.composition, CompositionPolicy::Sequential);
        assert!(opts.model_override.is_none());

        let opts = projection_options(
            &config,
            Some("murphy"),
            Some(YearIndexing::Relative),
            Some(CompositionPolicy::Additive),
        );
        assert_eq!(opts.model_override.as_deref(), Some("murphy"));
        assert_eq!(opts.year_indexing, YearIndexing::Relative);
        assert_eq!(opts.composition, CompositionPolicy::Additive);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }
}
