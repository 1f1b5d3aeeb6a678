//! Typed YAML parsing

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content, reporting failures against `filename`
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename)))
}

pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path).map_err(|source| YamlError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::family::Family;

    #[test]
    fn test_parse_family() {
        let fam: Family = parse_yaml("id: FAM-A\nname: A\nd0: 0.1\nd_in: 0.4\n", "fam.yaml").unwrap();
        assert_eq!(fam.d_in, 0.4);
    }

    #[test]
    fn test_missing_field_is_located() {
        let err = parse_yaml::<Family>("id: FAM-A\nname: A\n", "fam.yaml").unwrap_err();
        let YamlError::Syntax(syntax) = err else {
            panic!("expected syntax error");
        };
        assert!(syntax.message().contains("d0"));
        assert!(syntax.to_string().contains("fam.yaml"));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_yaml_file::<Family>(Path::new("/nonexistent/fam.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io { .. }));
    }
}
