//! Build-ready form of the class model: kinds resolved and patterns compiled once.

use std::collections::BTreeSet;

use regex::Regex;

use schemac_core::{
    ClassCollection, ClassKind, ClassModel, PrimitiveType, PropertyModel, Result, compile_pattern,
};

#[derive(Debug)]
pub(crate) struct CompiledClass {
    pub name: String,
    pub kind: ClassKind,
    pub open: bool,
    /// Sorted, so the first missing key is reported deterministically.
    pub required: Vec<String>,
    /// Keys a closed class accepts by name.
    pub allowed: BTreeSet<String>,
    /// Fixed field names; extension maps never claim these keys.
    pub explicit: BTreeSet<String>,
    pub open_patterns: Vec<Regex>,
    pub properties: Vec<CompiledProperty>,
}

#[derive(Debug)]
pub(crate) struct CompiledProperty {
    pub name: String,
    pub repeated: bool,
    pub shape: PropertyShape,
}

#[derive(Debug)]
pub(crate) enum PropertyShape {
    Primitive(PrimitiveType),
    Class(String),
    ExtensionMap {
        value: MapValue,
        pattern: Option<Regex>,
    },
}

#[derive(Debug)]
pub(crate) enum MapValue {
    Primitive(PrimitiveType),
    Class(String),
}

impl CompiledClass {
    /// Compile one class of an already validated collection.
    pub fn compile(class: &ClassModel, collection: &ClassCollection) -> Result<Self> {
        let open_patterns = class
            .open_patterns
            .iter()
            .map(|pattern| compile_pattern(pattern, &format!("{} open patterns", class.name)))
            .collect::<Result<Vec<_>>>()?;

        let properties = class
            .properties
            .iter()
            .map(|property| CompiledProperty::compile(class, property, collection))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: class.name.clone(),
            kind: class.kind(),
            open: class.open,
            required: class.required.iter().cloned().collect(),
            allowed: class.allowed_keys().into_iter().map(str::to_string).collect(),
            explicit: class.explicit_keys().into_iter().map(str::to_string).collect(),
            open_patterns,
            properties,
        })
    }
}

impl CompiledProperty {
    fn compile(
        class: &ClassModel,
        property: &PropertyModel,
        collection: &ClassCollection,
    ) -> Result<Self> {
        let shape = match property.map_type() {
            Some(map_type) => {
                let pattern = property
                    .pattern()
                    .map(|pattern| {
                        compile_pattern(pattern, &format!("{}.{}", class.name, property.name))
                    })
                    .transpose()?;
                let value = match PrimitiveType::parse(map_type) {
                    Some(primitive) => MapValue::Primitive(primitive),
                    None => MapValue::Class(collection.class(map_type)?.name.clone()),
                };
                PropertyShape::ExtensionMap { value, pattern }
            }
            None => match property.primitive() {
                Some(primitive) => PropertyShape::Primitive(primitive),
                None => PropertyShape::Class(collection.class(&property.type_name)?.name.clone()),
            },
        };

        Ok(Self {
            name: property.name.clone(),
            repeated: property.repeated,
            shape,
        })
    }
}
