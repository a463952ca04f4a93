use std::fs;
use std::path::Path;

use serde_json::Value;

use schemac_core::{ClassCollection, SourceFormat, load_class_collection, parse_class_collection, parse_value};

use super::DriverResult;

/// Class model for OpenAPI v2 documents, compiled into the binary.
pub const BUNDLED_MODEL: &str = include_str!("../../../../models/openapi-v2.classes.json");

/// Load the model at `path`, or the bundled one.
pub fn load_model(path: Option<&Path>) -> DriverResult<ClassCollection> {
    let collection = match path {
        Some(path) => {
            tracing::info!(event = "model_loading", path = %path.display());
            load_class_collection(path)?
        }
        None => {
            tracing::info!(event = "model_loading", path = "bundled");
            parse_class_collection(BUNDLED_MODEL, SourceFormat::Json)?
        }
    };

    tracing::info!(
        event = "model_loaded",
        model = %collection.name(),
        classes = collection.len()
    );
    Ok(collection)
}

/// Read and parse an input document. Unknown extensions are read as YAML.
pub fn read_input(path: &Path) -> DriverResult<Value> {
    let text = fs::read_to_string(path)?;
    let value = parse_value(&text, SourceFormat::from_path(path))?;
    tracing::info!(event = "input_parsed", path = %path.display());
    Ok(value)
}
