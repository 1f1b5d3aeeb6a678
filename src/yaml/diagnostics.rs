//! YAML error diagnostics pointing at the offending line of an input file

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid YAML in {filename}: {message}")]
#[diagnostic(code(yld::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    filename: String,

    message: String,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let message = err.to_string();
        Self::at_location(&message, source, filename, line, column, hint_for(&message))
    }

    pub fn at_location(
        message: &str,
        source: &str,
        filename: &str,
        line: usize,
        column: usize,
        help: Option<String>,
    ) -> Self {
        let offset = offset_of(source, line, column);
        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            filename: filename.to_string(),
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors reading a YAML file
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(yld::yaml::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Byte offset of a 1-based line/column, clamped to the source length
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let rest = &source[line_start.min(source.len())..];
    let line_text = rest.split('\n').next().unwrap_or("");
    let within = line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line_text.len());
    (line_start + within).min(source.len().saturating_sub(1))
}

fn hint_for(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    let hint = if msg.contains("tab") {
        "indent with spaces, YAML does not allow tabs"
    } else if msg.contains("duplicate key") {
        "each key may appear once; a year table lists every year a single time"
    } else if msg.contains("unknown variant") && msg.contains("poisson") {
        "formula must be one of: poisson, murphy, seeds, seeds_fixed_loss, bose, negative_binomial"
    } else if msg.contains("unknown variant") && msg.contains("fab") {
        "stage must be one of: fab, epi, saw, kgd, osat"
    } else if msg.contains("unknown variant") && msg.contains("static") {
        "extra_yield.kind must be 'static' (with value) or 'dynamic' (with overrides)"
    } else if msg.contains("missing field") {
        "add the missing field; `yld new` generates a complete skeleton"
    } else if msg.contains("expected block end") {
        "indentation looks inconsistent"
    } else if msg.contains("mapping values are not allowed") {
        "a space may be missing after ':'"
    } else {
        return None;
    };
    Some(hint.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_of() {
        let source = "a: 1\nbb: 2\nc: 3";
        assert_eq!(offset_of(source, 1, 1), 0);
        assert_eq!(offset_of(source, 2, 1), 5);
        assert_eq!(offset_of(source, 2, 3), 7);
        assert_eq!(offset_of(source, 3, 1), 11);
        // Past the end clamps to the last byte
        assert_eq!(offset_of(source, 9, 9), source.len() - 1);
    }

    #[test]
    fn test_hints() {
        assert!(hint_for("found character that cannot start any token (tab)").is_some());
        assert!(hint_for("formula: unknown variant `gamma`, expected one of `poisson`, `murphy`")
            .unwrap()
            .contains("negative_binomial"));
        assert!(hint_for("missing field `die_area_mm2`").is_some());
        assert!(hint_for("something else").is_none());
    }
}
