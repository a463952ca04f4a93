use std::path::Path;

use schemac_core::{
    ClassKind, Error, ModelDocument, SourceFormat, load_class_collection, parse_class_collection,
};

fn bundled_model_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models/openapi-v2.classes.json")
}

#[test]
fn bundled_openapi_model_loads() {
    let collection = load_class_collection(&bundled_model_path()).expect("load bundled model");

    assert_eq!(collection.name(), "openapi_v2");
    let document = collection.class("Document").expect("root class");
    assert_eq!(document.kind(), ClassKind::GenericObject);
    assert!(document.required.contains("swagger"));

    assert_eq!(
        collection.class("TypeItem").unwrap().kind(),
        ClassKind::StringArrayTerminal
    );
    assert_eq!(collection.class("Any").unwrap().kind(), ClassKind::BlobTerminal);
    assert_eq!(
        collection.class("StringArray").unwrap().kind(),
        ClassKind::PlainStringArray
    );
    assert_eq!(
        collection.class("Parameter").unwrap().kind(),
        ClassKind::OneOfWrapper
    );
}

#[test]
fn class_names_enumerate_in_lexicographic_order() {
    let collection = load_class_collection(&bundled_model_path()).expect("load bundled model");
    let names = collection.sorted_class_names();

    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert_eq!(names.len(), collection.len());
}

#[test]
fn model_round_trips_through_document_form() {
    let collection = load_class_collection(&bundled_model_path()).expect("load bundled model");
    let json = serde_json::to_string(&collection.to_document()).expect("serialize model");

    let reloaded = parse_class_collection(&json, SourceFormat::Json).expect("reload model");
    assert_eq!(reloaded, collection);
}

#[test]
fn unknown_fields_are_rejected() {
    let text = r#"{"name": "m", "classes": [{"name": "A", "closed": true}]}"#;
    let err = parse_class_collection(text, SourceFormat::Json).unwrap_err();
    assert!(matches!(err, Error::SchemaViolation(_)));
}

#[test]
fn dangling_type_reference_is_an_invalid_model() {
    let document = serde_json::json!({
        "name": "m",
        "classes": [
            {"name": "A", "properties": [{"name": "b", "type": "B"}]}
        ]
    });
    let parsed: ModelDocument = serde_json::from_value(document.clone()).expect("document");
    assert_eq!(parsed.classes.len(), 1);

    let err = parse_class_collection(&document.to_string(), SourceFormat::Json).unwrap_err();
    assert!(matches!(err, Error::InvalidModel(_)));
}
