use std::fmt::Write as _;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use schemac_build::{Body, BuildError, FieldValue, NamedValue, TypedObject};
use schemac_core::{Diagnostics, Severity};

use super::{DriverError, DriverResult};

const INDENT: &str = "  ";

/// Files written for one input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub text: PathBuf,
    pub json: PathBuf,
    pub raw: PathBuf,
    pub errors: PathBuf,
}

impl OutputPaths {
    /// Default names are `<stem>.<ext>` in the working directory.
    pub fn new(
        input: &Path,
        text_out: Option<PathBuf>,
        json_out: Option<PathBuf>,
    ) -> DriverResult<Self> {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| DriverError::InvalidPath(input.display().to_string()))?;

        Ok(Self {
            text: text_out.unwrap_or_else(|| PathBuf::from(format!("{stem}.text"))),
            json: json_out.unwrap_or_else(|| PathBuf::from(format!("{stem}.json"))),
            raw: PathBuf::from(format!("{stem}.raw")),
            errors: PathBuf::from(format!("{stem}.errors")),
        })
    }
}

/// Write `contents` through a sibling temp file and rename it into place.
pub fn write_text(path: &Path, contents: &str) -> DriverResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> DriverResult<()> {
    let mut encoded = serde_json::to_string_pretty(value)?;
    encoded.push('\n');
    write_text(path, &encoded)
}

fn temp_path(path: &Path) -> DriverResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| DriverError::InvalidPath(path.display().to_string()))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

/// Indented `name: value` / `name { ... }` rendering of a typed tree.
pub fn render_text(object: &TypedObject) -> String {
    let mut out = String::new();
    write_body(&mut out, object, 0);
    out
}

fn write_body(out: &mut String, object: &TypedObject, depth: usize) {
    match &object.body {
        Body::Strings(values) => {
            for value in values {
                line(out, depth, &format!("value: {}", quoted(value)));
            }
        }
        Body::Text(text) => line(out, depth, &format!("text: {}", quoted(text))),
        Body::Fields(fields) => {
            for field in fields {
                write_field(out, &field.name, &field.value, depth);
            }
        }
    }
}

fn write_field(out: &mut String, name: &str, value: &FieldValue, depth: usize) {
    match value {
        FieldValue::Scalar(scalar) => line(out, depth, &format!("{name}: {}", scalar.to_json())),
        FieldValue::Scalars(values) => {
            for scalar in values {
                line(out, depth, &format!("{name}: {}", scalar.to_json()));
            }
        }
        FieldValue::Object(object) | FieldValue::Variant(object) => {
            write_block(out, name, object, depth)
        }
        FieldValue::Objects(objects) => {
            for object in objects {
                write_block(out, name, object, depth);
            }
        }
        FieldValue::Named(entries) => {
            for entry in entries {
                line(out, depth, &format!("{name} {{"));
                line(out, depth + 1, &format!("name: {}", quoted(&entry.name)));
                match &entry.value {
                    NamedValue::Scalar(scalar) => {
                        line(out, depth + 1, &format!("value: {}", scalar.to_json()))
                    }
                    NamedValue::Object(object) => write_block(out, "value", object, depth + 1),
                }
                line(out, depth, "}");
            }
        }
    }
}

fn write_block(out: &mut String, name: &str, object: &TypedObject, depth: usize) {
    line(out, depth, &format!("{name} {{"));
    write_body(out, object, depth + 1);
    line(out, depth, "}");
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn quoted(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Indented description of the untyped input tree.
pub fn describe_raw(value: &Value) -> String {
    let mut out = String::new();
    describe(&mut out, value, 0);
    out
}

fn describe(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Object(map) => {
            line(out, depth, &format!("mapping ({} entries)", map.len()));
            for (key, item) in map {
                line(out, depth + 1, &format!("key {}", quoted(key)));
                describe(out, item, depth + 2);
            }
        }
        Value::Array(items) => {
            line(out, depth, &format!("sequence ({} items)", items.len()));
            for item in items {
                describe(out, item, depth + 1);
            }
        }
        Value::String(text) => line(out, depth, &format!("string {}", quoted(text))),
        Value::Number(number) => line(out, depth, &format!("number {number}")),
        Value::Bool(flag) => line(out, depth, &format!("boolean {flag}")),
        Value::Null => line(out, depth, "null"),
    }
}

/// Failure chain followed by every recorded diagnostic, one per line.
pub fn render_errors(failure: Option<&BuildError>, diagnostics: &Diagnostics) -> String {
    let mut out = String::new();

    if let Some(failure) = failure {
        let chain = failure.chain();
        if chain.is_empty() {
            let _ = writeln!(out, "error: {failure}");
        }
        for (index, diagnostic) in chain.into_iter().enumerate() {
            if index == 0 {
                let _ = writeln!(out, "error: {diagnostic}");
            } else {
                let _ = writeln!(out, "  caused by: {diagnostic}");
            }
        }
    }

    for diagnostic in diagnostics.iter() {
        let severity = match diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let _ = writeln!(out, "{severity}: {diagnostic}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemac_build::{Field, NamedEntry, Scalar};
    use schemac_core::{Diagnostic, DiagnosticSink, FailureKind};
    use serde_json::json;

    fn sample() -> TypedObject {
        TypedObject::object(
            "Schema",
            vec![
                Field {
                    name: "title".to_string(),
                    value: FieldValue::Scalar(Scalar::String("Pet".to_string())),
                },
                Field {
                    name: "type".to_string(),
                    value: FieldValue::Object(Box::new(TypedObject::strings(
                        "TypeItem",
                        vec!["object".to_string()],
                    ))),
                },
                Field {
                    name: "vendorExtension".to_string(),
                    value: FieldValue::Named(vec![NamedEntry {
                        name: "x-id".to_string(),
                        value: NamedValue::Scalar(Scalar::Integer(7)),
                    }]),
                },
            ],
        )
    }

    #[test]
    fn text_rendering_nests_blocks() {
        let expected = "\
title: \"Pet\"
type {
  value: \"object\"
}
vendorExtension {
  name: \"x-id\"
  value: 7
}
";
        assert_eq!(render_text(&sample()), expected);
    }

    #[test]
    fn raw_description_lists_kinds() {
        let rendered = describe_raw(&json!({"a": [1, "b"], "c": null}));
        let expected = "\
mapping (2 entries)
  key \"a\"
    sequence (2 items)
      number 1
      string \"b\"
  key \"c\"
    null
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn output_paths_default_to_input_stem() {
        let paths = OutputPaths::new(Path::new("specs/petstore.yaml"), None, None).expect("paths");
        assert_eq!(paths.text, PathBuf::from("petstore.text"));
        assert_eq!(paths.json, PathBuf::from("petstore.json"));
        assert_eq!(paths.raw, PathBuf::from("petstore.raw"));
        assert_eq!(paths.errors, PathBuf::from("petstore.errors"));

        let paths = OutputPaths::new(
            Path::new("petstore.yaml"),
            Some(PathBuf::from("out/doc.txt")),
            None,
        )
        .expect("paths");
        assert_eq!(paths.text, PathBuf::from("out/doc.txt"));
    }

    #[test]
    fn errors_list_diagnostics_by_severity() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(Diagnostic::warning(
            FailureKind::TypeCoercionFailure,
            "/tags/1",
            "Operation",
            "element omitted",
        ));

        let rendered = render_errors(None, &diagnostics);
        assert_eq!(
            rendered,
            "warning: /tags/1 [type_coercion_failure] Operation: element omitted\n"
        );

        let rendered = render_errors(Some(&BuildError::UnknownClass("Nope".to_string())), &Diagnostics::new());
        assert_eq!(rendered, "error: unknown class: Nope\n");
    }
}
