//! Schema validation with located error reporting

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::identity::EntityPrefix;
use crate::schema::registry::SchemaRegistry;

/// All schema violations found in one file
#[derive(Debug, Error, Diagnostic)]
#[error("schema validation failed: {summary}")]
#[diagnostic(code(yld::schema::validation))]
pub struct ValidationError {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn new(message: String, hint: String, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
            help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ValidationError {
    pub fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let summary = match violations.len() {
            1 => "1 error".to_string(),
            n => format!("{} errors", n),
        };
        Self {
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

/// Schema validator with compiled schemas
pub struct Validator {
    compiled: HashMap<EntityPrefix, JsonValidator>,
}

impl Validator {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for prefix in EntityPrefix::all() {
            let Some(schema_str) = registry.get(*prefix) else {
                continue;
            };
            if let Ok(schema_json) = serde_json::from_str::<JsonValue>(schema_str) {
                if let Ok(compiled_schema) = validator_for(&schema_json) {
                    compiled.insert(*prefix, compiled_schema);
                }
            }
        }

        Self { compiled }
    }

    /// Check YAML content against the schema for `prefix`, collecting every violation
    pub fn iter_errors(&self, content: &str, filename: &str, prefix: EntityPrefix) -> Result<(), ValidationError> {
        let yaml_value: serde_yml::Value = serde_yml::from_str(content).map_err(|e| {
            let violation = SchemaViolation::new(
                format!("YAML parse error: {}", e),
                "invalid YAML".to_string(),
                find_error_span(content, e.location()),
                Some("check indentation, colons and quoting".to_string()),
            );
            ValidationError::new(filename, content, vec![violation])
        })?;

        let json_value = yaml_to_json(yaml_value).map_err(|message| {
            let violation = SchemaViolation::new(
                message,
                "not representable as JSON".to_string(),
                first_line_span(content),
                None,
            );
            ValidationError::new(filename, content, vec![violation])
        })?;

        let Some(schema) = self.compiled.get(&prefix) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(&json_value)
            .map(|e| error_to_violation(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(filename, content, violations))
        }
    }

    /// Validate a file whose kind is inferred from its directory or name
    ///
    /// Returns `Ok(None)` for files of unknown kind.
    pub fn validate_file(&self, path: &Path) -> std::io::Result<Option<Result<(), ValidationError>>> {
        let Some(prefix) = EntityPrefix::from_path(path) else {
            return Ok(None);
        };
        let content = std::fs::read_to_string(path)?;
        let filename = path.display().to_string();
        Ok(Some(self.iter_errors(&content, &filename, prefix)))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&SchemaRegistry::default())
    }
}

/// Convert YAML to JSON, turning integer mapping keys (years) into strings
fn yaml_to_json(value: serde_yml::Value) -> Result<JsonValue, String> {
    use serde_yml::Value as Y;

    Ok(match value {
        Y::Null => JsonValue::Null,
        Y::Bool(b) => JsonValue::Bool(b),
        Y::Number(n) => serde_json::to_value(&n).map_err(|e| e.to_string())?,
        Y::String(s) => JsonValue::String(s),
        Y::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Y::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map {
                let key = match key {
                    Y::String(s) => s,
                    Y::Number(n) => n.to_string(),
                    Y::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported mapping key: {:?}", other)),
                };
                object.insert(key, yaml_to_json(value)?);
            }
            JsonValue::Object(object)
        }
        Y::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn error_to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    SchemaViolation::new(
        format_schema_error(error),
        format_error_hint(error),
        find_path_span(content, &path),
        generate_help_message(error),
    )
}

fn format_schema_error(error: &JsonSchemaError) -> String {
    let path = if error.instance_path.as_str().is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", error.instance_path)
    };

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            format!("missing required field {} at {}", display_value(property), path)
        }
        ValidationErrorKind::Type { kind } => format!("wrong type at {}: expected {:?}", path, kind),
        ValidationErrorKind::Enum { options } => {
            format!("invalid value at {}: must be one of {}", path, format_enum_options(options))
        }
        ValidationErrorKind::Minimum { limit } => format!("value at {} is below the minimum {}", path, limit),
        ValidationErrorKind::Maximum { limit } => format!("value at {} is above the maximum {}", path, limit),
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("unknown field(s) at {}: {}", path, unexpected.join(", "))
        }
        _ => format!("validation error at {}: {}", path, error),
    }
}

fn display_value(value: &JsonValue) -> String {
    value
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| value.to_string())
}

fn format_enum_options(options: &JsonValue) -> String {
    match options.as_array() {
        Some(arr) => arr.iter().map(display_value).collect::<Vec<_>>().join(", "),
        None => options.to_string(),
    }
}

fn format_error_hint(error: &JsonSchemaError) -> String {
    match &error.kind {
        ValidationErrorKind::Required { .. } => "required field missing",
        ValidationErrorKind::Type { .. } => "wrong type",
        ValidationErrorKind::Enum { .. } => "invalid value",
        ValidationErrorKind::Minimum { .. } | ValidationErrorKind::Maximum { .. } => "out of range",
        ValidationErrorKind::AdditionalProperties { .. } => "unknown field",
        _ => "validation error",
    }
    .to_string()
}

fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            Some(format!("add the '{}' field", display_value(property)))
        }
        ValidationErrorKind::Enum { options } => {
            Some(format!("valid values: {}", format_enum_options(options)))
        }
        ValidationErrorKind::Maximum { .. } => {
            Some("baseline yields are probabilities between 0 and 1".to_string())
        }
        ValidationErrorKind::AdditionalProperties { unexpected } if unexpected.len() == 1 => {
            Some(format!("remove '{}' or check its spelling", unexpected[0]))
        }
        _ => None,
    }
}

fn first_line_span(content: &str) -> SourceSpan {
    (0, content.find('\n').unwrap_or(content.len()).max(1)).into()
}

fn find_error_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    let Some(loc) = location else {
        return first_line_span(content);
    };

    let line = loc.line().saturating_sub(1);
    let offset: usize = content
        .split_inclusive('\n')
        .take(line)
        .map(str::len)
        .sum::<usize>()
        + loc.column().saturating_sub(1);
    let offset = offset.min(content.len());

    let rest = &content[offset..];
    let len = rest.find('\n').unwrap_or(rest.len()).max(1);
    (offset, len).into()
}

/// Span of the last key of a JSON pointer in the YAML text
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    let parts: Vec<&str> = json_path.split('/').filter(|s| !s.is_empty()).collect();

    // Array items have no key of their own; point at the parent
    let key = match parts.as_slice() {
        [.., parent, last] if last.parse::<usize>().is_ok() => Some(*parent),
        [.., last] => Some(*last),
        [] => None,
    };

    key.and_then(|k| find_key_span(content, k))
        .unwrap_or_else(|| first_line_span(content))
}

fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let pattern = format!("{}:", key);
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&pattern) {
            let indent = line.len() - trimmed.len();
            return Some((offset + indent, trimmed.trim_end().len()).into());
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::default()
    }

    #[test]
    fn test_all_schemas_compile() {
        let v = validator();
        for prefix in EntityPrefix::all() {
            assert!(v.compiled.contains_key(prefix), "{} schema did not compile", prefix);
        }
    }

    #[test]
    fn test_valid_technology_with_year_keys() {
        let yaml = r#"
id: TECH-D
name: Litho
stage: fab
extra_yield:
  kind: dynamic
  nominal: 2.0
  overrides:
    2026: 1.0
    2029: 3.0
"#;
        assert!(validator().iter_errors(yaml, "tech.yaml", EntityPrefix::Tech).is_ok());
    }

    #[test]
    fn test_missing_and_unknown_fields() {
        let yaml = "id: FAM-A\nname: A\nd0: 0.1\ncolour: red\n";
        let err = validator()
            .iter_errors(yaml, "fam.yaml", EntityPrefix::Fam)
            .unwrap_err();
        assert_eq!(err.violation_count(), 2);
        let messages: Vec<&str> = err.violations().iter().map(|v| v.message()).collect();
        assert!(messages.iter().any(|m| m.contains("d_in")));
        assert!(messages.iter().any(|m| m.contains("colour")));
    }

    #[test]
    fn test_bad_formula_and_stage() {
        let v = validator();
        assert!(v
            .iter_errors("id: YM-1\nname: G\nformula: gamma\n", "ym.yaml", EntityPrefix::Ym)
            .is_err());
        assert!(v
            .iter_errors("id: T\nname: T\nstage: test\n", "t.yaml", EntityPrefix::Tech)
            .is_err());
    }

    #[test]
    fn test_baseline_out_of_range() {
        let yaml = "id: S\nname: S\nstart_year: 2026\nend_year: 2027\nbaselines:\n  saw:\n    2026: 1.5\n";
        assert!(validator()
            .iter_errors(yaml, "scn.yaml", EntityPrefix::Scn)
            .is_err());
    }

    #[test]
    fn test_yaml_syntax_error() {
        let err = validator()
            .iter_errors("id: [broken\n", "chip.yaml", EntityPrefix::Chip)
            .unwrap_err();
        assert_eq!(err.violation_count(), 1);
    }

    #[test]
    fn test_find_key_span() {
        let content = "id: A\nextra_yield:\n  kind: static\n";
        let span = find_key_span(content, "kind").unwrap();
        assert_eq!(span.offset(), 21);
    }
}
