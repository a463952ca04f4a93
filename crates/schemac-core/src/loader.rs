use std::path::Path;

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{ClassCollection, ModelDocument};
use crate::validation::validate_model;

/// JSON Schema describing class model files.
pub const CLASS_MODEL_SCHEMA: &str = include_str!("../../../schemas/class-model.schema.json");

/// Source format of a model or input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// Guess the format from a file extension, defaulting to YAML
    /// (a superset of JSON for the documents handled here).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => SourceFormat::Json,
            _ => SourceFormat::Yaml,
        }
    }
}

/// Parse JSON or YAML text into a generic value tree.
pub fn parse_value(text: &str, format: SourceFormat) -> Result<Value> {
    match format {
        SourceFormat::Json => Ok(serde_json::from_str(text)?),
        SourceFormat::Yaml => Ok(serde_yaml::from_str(text)?),
    }
}

/// Load, check, and validate a class model file.
pub fn load_class_collection(path: &Path) -> Result<ClassCollection> {
    let text = std::fs::read_to_string(path)?;
    parse_class_collection(&text, SourceFormat::from_path(path))
}

/// Parse, check, and validate class model text.
pub fn parse_class_collection(text: &str, format: SourceFormat) -> Result<ClassCollection> {
    let value = parse_value(text, format)?;
    check_model_value(&value)?;

    let document: ModelDocument = serde_json::from_value(value)?;
    let collection = ClassCollection::from_document(document)?;
    validate_model(&collection)?;
    Ok(collection)
}

/// Check a model value against [`CLASS_MODEL_SCHEMA`], listing every violation.
pub fn check_model_value(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(CLASS_MODEL_SCHEMA)?;
    let compiled =
        JSONSchema::compile(&schema).map_err(|err| Error::InvalidModel(err.to_string()))?;

    if let Err(errors) = compiled.validate(value) {
        let lines: Vec<String> = errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("  {path}: {error}")
            })
            .collect();
        return Err(Error::SchemaViolation(lines.join("\n")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a.JSON")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("a.yaml")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a")), SourceFormat::Yaml);
    }

    #[test]
    fn yaml_model_is_accepted() {
        let text = r#"
name: mini
classes:
  - name: Info
    required: [title]
    properties:
      - name: title
        type: string
"#;
        let collection = parse_class_collection(text, SourceFormat::Yaml).expect("model");
        assert_eq!(collection.name(), "mini");
        assert!(collection.contains("Info"));
    }

    #[test]
    fn structural_violations_are_listed() {
        let text = r#"{"name": "mini", "classes": [{"properties": []}]}"#;
        let err = parse_class_collection(text, SourceFormat::Json).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(_)));
    }
}
