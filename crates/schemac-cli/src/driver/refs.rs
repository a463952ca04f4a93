use serde_json::Value;

use schemac_build::{Body, FieldValue, NamedValue, Scalar, TypedObject};
use schemac_core::{Diagnostic, DiagnosticSink, FailureKind};

const REF_FIELD: &str = "$ref";

/// Check every `$ref` of a built document.
///
/// Local references (`#...`) must resolve as JSON pointers into `input`;
/// dangling ones are recorded as errors. Other references are only
/// reported. Returns the number of dangling local references.
pub fn check_references(
    document: &TypedObject,
    input: &Value,
    sink: &mut dyn DiagnosticSink,
) -> usize {
    let mut checker = Checker {
        input,
        sink,
        checked: 0,
        unresolved: 0,
    };
    checker.visit(document, "");

    tracing::info!(
        event = "references_checked",
        checked = checker.checked,
        unresolved = checker.unresolved
    );
    checker.unresolved
}

struct Checker<'a> {
    input: &'a Value,
    sink: &'a mut dyn DiagnosticSink,
    checked: usize,
    unresolved: usize,
}

impl Checker<'_> {
    fn visit(&mut self, object: &TypedObject, path: &str) {
        let Body::Fields(fields) = &object.body else {
            return;
        };

        for field in fields {
            let field_path = child(path, &field.name);
            match &field.value {
                FieldValue::Scalar(Scalar::String(target)) if field.name == REF_FIELD => {
                    self.check(object, &field_path, target);
                }
                FieldValue::Scalar(_) | FieldValue::Scalars(_) => {}
                FieldValue::Object(nested) => self.visit(nested, &field_path),
                // The selected alternative was built from the wrapper's own mapping.
                FieldValue::Variant(nested) => self.visit(nested, path),
                FieldValue::Objects(items) => {
                    for (index, item) in items.iter().enumerate() {
                        self.visit(item, &child(&field_path, &index.to_string()));
                    }
                }
                FieldValue::Named(entries) => {
                    for entry in entries {
                        if let NamedValue::Object(nested) = &entry.value {
                            self.visit(nested, &child(path, &entry.name));
                        }
                    }
                }
            }
        }
    }

    fn check(&mut self, owner: &TypedObject, path: &str, target: &str) {
        self.checked += 1;

        let Some(pointer) = target.strip_prefix('#') else {
            tracing::warn!(event = "external_reference", path = %path, target = %target);
            self.sink.record(
                Diagnostic::warning(
                    FailureKind::UnresolvedReference,
                    path,
                    owner.class.clone(),
                    "external reference left unresolved",
                )
                .with_property(REF_FIELD)
                .with_key(target),
            );
            return;
        };

        if self.input.pointer(pointer).is_none() {
            self.unresolved += 1;
            self.sink.record(
                Diagnostic::error(
                    FailureKind::UnresolvedReference,
                    path,
                    owner.class.clone(),
                    "reference does not resolve within the document",
                )
                .with_property(REF_FIELD)
                .with_key(target),
            );
        }
    }
}

fn child(path: &str, segment: &str) -> String {
    format!("{path}/{}", segment.replace('~', "~0").replace('/', "~1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemac_build::Field;
    use schemac_core::{Diagnostics, Severity};
    use serde_json::json;

    fn reference(target: &str) -> TypedObject {
        TypedObject::object(
            "JsonReference",
            vec![Field {
                name: REF_FIELD.to_string(),
                value: FieldValue::Scalar(Scalar::String(target.to_string())),
            }],
        )
    }

    fn document(targets: &[&str]) -> TypedObject {
        TypedObject::object(
            "Document",
            vec![Field {
                name: "items".to_string(),
                value: FieldValue::Objects(targets.iter().map(|target| reference(target)).collect()),
            }],
        )
    }

    #[test]
    fn local_references_resolve_against_input() {
        let input = json!({"definitions": {"Pet": {"type": "object"}}});
        let mut diagnostics = Diagnostics::new();

        let unresolved = check_references(
            &document(&["#/definitions/Pet", "#"]),
            &input,
            &mut diagnostics,
        );
        assert_eq!(unresolved, 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn dangling_reference_is_an_error() {
        let input = json!({"definitions": {}});
        let mut diagnostics = Diagnostics::new();

        let unresolved = check_references(
            &document(&["#/definitions/Missing", "other.yaml#/Pet"]),
            &input,
            &mut diagnostics,
        );
        assert_eq!(unresolved, 1);

        let entries: Vec<_> = diagnostics.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Error);
        assert_eq!(entries[0].path, "/items/0/$ref");
        assert_eq!(entries[0].key.as_deref(), Some("#/definitions/Missing"));
        assert_eq!(entries[1].severity, Severity::Warning);
    }
}
