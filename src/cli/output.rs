//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::config::Config;

/// Resolve `auto` (and the configured default) into a concrete format
pub fn effective_format(format: OutputFormat, config: &Config, is_list: bool) -> OutputFormat {
    let requested = match format {
        OutputFormat::Auto => config
            .default_format
            .as_deref()
            .and_then(|f| <OutputFormat as clap::ValueEnum>::from_str(f, true).ok())
            .unwrap_or(OutputFormat::Auto),
        other => other,
    };

    match requested {
        OutputFormat::Auto if is_list => OutputFormat::Tsv,
        OutputFormat::Auto => OutputFormat::Yaml,
        other => other,
    }
}

/// Print a serializable value as JSON or YAML
///
/// Returns `false` when `format` is not a structured format.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolution() {
        let config = Config::default();
        assert_eq!(effective_format(OutputFormat::Auto, &config, true), OutputFormat::Tsv);
        assert_eq!(effective_format(OutputFormat::Auto, &config, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Csv, &config, false), OutputFormat::Csv);
    }

    #[test]
    fn test_configured_default() {
        let config = Config {
            default_format: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(effective_format(OutputFormat::Auto, &config, true), OutputFormat::Json);
        assert_eq!(effective_format(OutputFormat::Md, &config, true), OutputFormat::Md);
    }
}
