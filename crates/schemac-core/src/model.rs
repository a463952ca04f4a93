use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Conventional name of the class that accepts a literal array of strings.
pub const STRING_ARRAY_CLASS: &str = "StringArray";

/// Serialized form of a class model file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    /// Name of the modelled language (e.g. `openapi_v2`).
    pub name: String,
    /// Every class of the model, in any order.
    pub classes: Vec<ClassModel>,
}

/// Declarative description of one object kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClassModel {
    pub name: String,
    /// Scalar string normalized into a one-element string list.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_string_array_terminal: bool,
    /// Any value, stored as its canonical text rendering.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_blob_terminal: bool,
    /// Name/value pair class used as the element type of extension maps.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_pair_marker: bool,
    /// Tagged union over the class-typed properties.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_one_of_wrapper: bool,
    /// Whether undeclared keys are tolerated.
    #[serde(default, skip_serializing_if = "is_false")]
    pub open: bool,
    /// Key patterns accepted on closed classes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required: BTreeSet<String>,
    /// Declared field order; union alternatives are tried in this order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyModel>,
}

/// Declarative description of one field of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PropertyModel {
    /// Original mapping key, may begin with `$`.
    pub name: String,
    /// Primitive type name or class name.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub repeated: bool,
    /// Derived field, never accepted as an input key.
    #[serde(default, skip_serializing_if = "is_false")]
    pub implicit: bool,
    /// Value type of an extension map property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_type: Option<String>,
    /// Restricts which keys an extension map claims.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Build-time dispatch category of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    StringArrayTerminal,
    BlobTerminal,
    PlainStringArray,
    OneOfWrapper,
    GenericObject,
}

/// Primitive property types understood by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
}

impl PrimitiveType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" | "float" | "double" => Some(Self::Number),
            "integer" | "int" | "int64" => Some(Self::Integer),
            "boolean" | "bool" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

impl ClassModel {
    /// Create an empty, closed generic object class.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_string_array_terminal: false,
            is_blob_terminal: false,
            is_pair_marker: false,
            is_one_of_wrapper: false,
            open: false,
            open_patterns: Vec::new(),
            required: BTreeSet::new(),
            properties: Vec::new(),
        }
    }

    pub fn kind(&self) -> ClassKind {
        if self.is_string_array_terminal {
            ClassKind::StringArrayTerminal
        } else if self.is_blob_terminal {
            ClassKind::BlobTerminal
        } else if self.name == STRING_ARRAY_CLASS {
            ClassKind::PlainStringArray
        } else if self.is_one_of_wrapper {
            ClassKind::OneOfWrapper
        } else {
            ClassKind::GenericObject
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyModel> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// Keys accepted by a closed class without consulting `open_patterns`:
    /// every non-implicit property name.
    pub fn allowed_keys(&self) -> BTreeSet<&str> {
        self.properties
            .iter()
            .filter(|property| !property.implicit)
            .map(|property| property.name.as_str())
            .collect()
    }

    /// Names of the fixed (non extension map) fields.
    pub fn explicit_keys(&self) -> BTreeSet<&str> {
        self.properties
            .iter()
            .filter(|property| !property.is_extension_map())
            .map(|property| property.name.as_str())
            .collect()
    }
}

impl PropertyModel {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            repeated: false,
            implicit: false,
            map_type: None,
            pattern: None,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Turn the property into an implicit extension map over `map_type` values.
    pub fn extension_map(mut self, map_type: impl Into<String>, pattern: Option<&str>) -> Self {
        self.implicit = true;
        self.map_type = Some(map_type.into());
        self.pattern = pattern.map(str::to_string);
        self
    }

    pub fn map_type(&self) -> Option<&str> {
        self.map_type.as_deref().filter(|value| !value.is_empty())
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|value| !value.is_empty())
    }

    pub fn is_extension_map(&self) -> bool {
        self.map_type().is_some()
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        PrimitiveType::parse(&self.type_name)
    }
}

/// Immutable, name-indexed set of class models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCollection {
    name: String,
    classes: BTreeMap<String, ClassModel>,
}

impl ClassCollection {
    /// Index classes by name, rejecting duplicates.
    pub fn from_classes(name: impl Into<String>, classes: Vec<ClassModel>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for class in classes {
            if index.contains_key(&class.name) {
                return Err(Error::InvalidModel(format!(
                    "duplicate class name: {}",
                    class.name
                )));
            }
            index.insert(class.name.clone(), class);
        }

        Ok(Self {
            name: name.into(),
            classes: index,
        })
    }

    pub fn from_document(document: ModelDocument) -> Result<Self> {
        Self::from_classes(document.name, document.classes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&ClassModel> {
        self.classes.get(name)
    }

    pub fn class(&self, name: &str) -> Result<&ClassModel> {
        self.get(name)
            .ok_or_else(|| Error::UnknownClass(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Classes in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.values()
    }

    pub fn sorted_class_names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn to_document(&self) -> ModelDocument {
        ModelDocument {
            name: self.name.clone(),
            classes: self.classes.values().cloned().collect(),
        }
    }
}
