//! Reading configuration and state documents

use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CliError, Result};

/// Load a YAML or JSON document as a JSON value
pub fn load_document(path: &Path) -> Result<JsonValue> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        message: format!("{}: {}", path.display(), e),
    })?;
    parse_document(&content).map_err(|message| CliError::Input {
        message: format!("{}: {}", path.display(), message),
        help: Some("configuration files must be a YAML or JSON object".to_string()),
    })
}

/// Parse YAML (JSON is accepted as a subset); the root must be an object
pub fn parse_document(content: &str) -> std::result::Result<JsonValue, String> {
    let value: JsonValue = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("expected an object at the document root".to_string())
    }
}

/// Print a state value as pretty JSON on stdout
pub fn print_state(state: &JsonValue) -> Result<()> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| CliError::internal(format!("failed to serialize state: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = parse_document("metadata:\n  name: web\n").unwrap();
        let json = parse_document(r#"{"metadata": {"name": "web"}}"#).unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_document("- a\n- b\n").is_err());
        assert!(parse_document("metadata: [").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_document(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
