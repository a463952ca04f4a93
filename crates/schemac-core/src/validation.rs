use std::collections::BTreeSet;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{ClassCollection, ClassKind, ClassModel, PrimitiveType};

/// Validate internal consistency of a class model.
///
/// This checks:
/// - class and property names are present and unique
/// - required keys name declared properties
/// - terminal classes carry no properties
/// - one-of wrappers only declare singular class-typed alternatives
/// - no one-of wrapper reaches itself through its alternatives
/// - property and map types resolve to a primitive or a known class
/// - every pattern compiles
pub fn validate_model(collection: &ClassCollection) -> Result<()> {
    for class in collection.iter() {
        validate_class(collection, class)?;
    }
    for class in collection.iter() {
        if !matches!(class.kind(), ClassKind::OneOfWrapper) {
            continue;
        }
        if let Some(cycle) = union_cycle(collection, &class.name) {
            return Err(Error::InvalidModel(format!(
                "one-of wrapper {} reaches itself through its alternatives: {}",
                class.name,
                cycle.join(" -> ")
            )));
        }
    }
    Ok(())
}

/// Path from `start` back to itself through alternatives that are wrappers.
fn union_cycle<'a>(collection: &'a ClassCollection, start: &'a str) -> Option<Vec<&'a str>> {
    let mut visited = BTreeSet::new();
    let mut stack = vec![vec![start]];

    while let Some(path) = stack.pop() {
        let Some(current) = path.last().and_then(|name| collection.get(name)) else {
            continue;
        };
        for property in current.properties.iter().filter(|p| !p.is_extension_map()) {
            let target = property.type_name.as_str();
            if target == start {
                let mut cycle = path.clone();
                cycle.push(target);
                return Some(cycle);
            }
            let wrapper = collection
                .get(target)
                .is_some_and(|class| matches!(class.kind(), ClassKind::OneOfWrapper));
            if wrapper && visited.insert(target) {
                let mut next = path.clone();
                next.push(target);
                stack.push(next);
            }
        }
    }
    None
}

fn validate_class(collection: &ClassCollection, class: &ClassModel) -> Result<()> {
    if class.name.trim().is_empty() {
        return Err(Error::InvalidModel("class with empty name".to_string()));
    }

    if class.is_string_array_terminal && class.is_blob_terminal {
        return Err(Error::InvalidModel(format!(
            "class {} cannot be both a string array terminal and a blob terminal",
            class.name
        )));
    }

    let mut names = BTreeSet::new();
    for property in &class.properties {
        if property.name.is_empty() {
            return Err(Error::InvalidModel(format!(
                "class {} has a property with an empty name",
                class.name
            )));
        }
        if !names.insert(property.name.as_str()) {
            return Err(Error::InvalidModel(format!(
                "duplicate property name: {}.{}",
                class.name, property.name
            )));
        }
    }

    for key in &class.required {
        if !names.contains(key.as_str()) {
            return Err(Error::InvalidModel(format!(
                "required key not declared as a property: {}.{}",
                class.name, key
            )));
        }
    }

    match class.kind() {
        ClassKind::StringArrayTerminal | ClassKind::BlobTerminal | ClassKind::PlainStringArray => {
            if !class.properties.is_empty() {
                return Err(Error::InvalidModel(format!(
                    "terminal class {} must not declare properties",
                    class.name
                )));
            }
        }
        ClassKind::OneOfWrapper => {
            if !class.open {
                return Err(Error::InvalidModel(format!(
                    "one-of wrapper {} must be open",
                    class.name
                )));
            }
            for property in &class.properties {
                if property.is_extension_map() {
                    continue;
                }
                if property.repeated || !collection.contains(&property.type_name) {
                    return Err(Error::InvalidModel(format!(
                        "one-of alternative {}.{} must be a singular class-typed property",
                        class.name, property.name
                    )));
                }
            }
        }
        ClassKind::GenericObject => {}
    }

    for property in &class.properties {
        let context = format!("{}.{}", class.name, property.name);
        if !type_resolves(collection, &property.type_name) {
            return Err(Error::InvalidModel(format!(
                "unknown type '{}' for {context}",
                property.type_name
            )));
        }

        match property.map_type() {
            Some(map_type) => {
                if !type_resolves(collection, map_type) {
                    return Err(Error::InvalidModel(format!(
                        "unknown map type '{map_type}' for {context}"
                    )));
                }
                if let Some(pattern) = property.pattern() {
                    compile_pattern(pattern, &context)?;
                }
            }
            None => {
                let pair_typed = collection
                    .get(&property.type_name)
                    .is_some_and(|target| target.is_pair_marker);
                if pair_typed {
                    return Err(Error::InvalidModel(format!(
                        "{context} uses pair class {} without a map type",
                        property.type_name
                    )));
                }
                if property.pattern().is_some() {
                    return Err(Error::InvalidModel(format!(
                        "{context} declares a pattern but no map type"
                    )));
                }
            }
        }
    }

    for pattern in &class.open_patterns {
        compile_pattern(pattern, &format!("{} open patterns", class.name))?;
    }

    Ok(())
}

fn type_resolves(collection: &ClassCollection, type_name: &str) -> bool {
    PrimitiveType::parse(type_name).is_some() || collection.contains(type_name)
}

/// Compile a model pattern, naming where it came from on failure.
pub fn compile_pattern(pattern: &str, context: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| Error::InvalidPattern {
        pattern: pattern.to_string(),
        context: context.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyModel;

    fn collection(classes: Vec<ClassModel>) -> ClassCollection {
        ClassCollection::from_classes("test", classes).expect("collection")
    }

    #[test]
    fn rejects_required_key_without_property() {
        let mut info = ClassModel::new("Info");
        info.properties = vec![PropertyModel::new("title", "string")];
        info.required = ["title".to_string(), "version".to_string()]
            .into_iter()
            .collect();

        let err = validate_model(&collection(vec![info])).unwrap_err();
        assert!(err.to_string().contains("Info.version"));
    }

    #[test]
    fn rejects_unknown_property_type() {
        let mut info = ClassModel::new("Info");
        info.properties = vec![PropertyModel::new("contact", "Contact")];

        let err = validate_model(&collection(vec![info])).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn rejects_scalar_union_alternative() {
        let mut wrapper = ClassModel::new("Item");
        wrapper.is_one_of_wrapper = true;
        wrapper.open = true;
        wrapper.properties = vec![PropertyModel::new("name", "string")];

        assert!(validate_model(&collection(vec![wrapper])).is_err());
    }

    #[test]
    fn rejects_closed_union() {
        let mut wrapper = ClassModel::new("Item");
        wrapper.is_one_of_wrapper = true;

        let err = validate_model(&collection(vec![wrapper])).unwrap_err();
        assert!(err.to_string().contains("must be open"));
    }

    #[test]
    fn rejects_self_reaching_union() {
        let object = ClassModel::new("Object");
        let mut wrapper = ClassModel::new("W");
        wrapper.is_one_of_wrapper = true;
        wrapper.open = true;
        wrapper.properties = vec![
            PropertyModel::new("first", "W"),
            PropertyModel::new("second", "W"),
        ];

        let err = validate_model(&collection(vec![object.clone(), wrapper])).unwrap_err();
        assert!(err.to_string().contains("W -> W"));

        let mut outer = ClassModel::new("Outer");
        outer.is_one_of_wrapper = true;
        outer.open = true;
        outer.properties = vec![
            PropertyModel::new("inner", "Inner"),
            PropertyModel::new("object", "Object"),
        ];
        let mut inner = outer.clone();
        inner.name = "Inner".to_string();
        inner.properties[0] = PropertyModel::new("outer", "Outer");

        let err = validate_model(&collection(vec![object, outer, inner])).unwrap_err();
        assert!(err.to_string().contains("Inner -> Outer -> Inner"));
    }

    #[test]
    fn accepts_nested_unions_without_cycles() {
        let object = ClassModel::new("Object");
        let mut inner = ClassModel::new("Inner");
        inner.is_one_of_wrapper = true;
        inner.open = true;
        inner.properties = vec![PropertyModel::new("object", "Object")];
        let mut outer = inner.clone();
        outer.name = "Outer".to_string();
        outer.properties = vec![
            PropertyModel::new("inner", "Inner"),
            PropertyModel::new("object", "Object"),
        ];

        validate_model(&collection(vec![object, inner, outer])).expect("valid model");
    }

    #[test]
    fn rejects_bad_pattern() {
        let mut paths = ClassModel::new("Paths");
        paths.open_patterns = vec!["^(x-".to_string()];

        let err = validate_model(&collection(vec![paths])).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn rejects_properties_on_terminals() {
        let mut any = ClassModel::new("Any");
        any.is_blob_terminal = true;
        any.properties = vec![PropertyModel::new("value", "string")];

        assert!(validate_model(&collection(vec![any])).is_err());
    }

    #[test]
    fn accepts_extension_maps_over_pair_classes() {
        let mut any = ClassModel::new("Any");
        any.is_blob_terminal = true;
        let mut named_any = ClassModel::new("NamedAny");
        named_any.is_pair_marker = true;
        named_any.properties = vec![
            PropertyModel::new("name", "string"),
            PropertyModel::new("value", "Any"),
        ];
        let mut info = ClassModel::new("Info");
        info.properties = vec![
            PropertyModel::new("title", "string"),
            PropertyModel::new("vendorExtension", "NamedAny").extension_map("Any", Some("^x-")),
        ];

        validate_model(&collection(vec![any, named_any, info])).expect("valid model");
    }
}
