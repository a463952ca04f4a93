//! Validated output tree produced by the builder.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Instance of one model class.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedObject {
    pub class: String,
    pub body: Body,
}

/// Content of a typed instance, by class kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// String array classes (terminal or plain).
    Strings(Vec<String>),
    /// Blob terminals keep the canonical rendering of their input.
    Text(String),
    /// Object classes, fields in declared property order.
    Fields(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Scalars(Vec<Scalar>),
    Object(Box<TypedObject>),
    Objects(Vec<TypedObject>),
    /// Selected alternative of a one-of wrapper.
    Variant(Box<TypedObject>),
    /// Extension map entries in input order.
    Named(Vec<NamedEntry>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedEntry {
    pub name: String,
    pub value: NamedValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamedValue {
    Scalar(Scalar),
    Object(TypedObject),
}

impl TypedObject {
    pub fn strings(class: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            class: class.into(),
            body: Body::Strings(values),
        }
    }

    pub fn text(class: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            body: Body::Text(text.into()),
        }
    }

    pub fn object(class: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            class: class.into(),
            body: Body::Fields(fields),
        }
    }

    /// Look up a set field by its property name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields()
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn fields(&self) -> &[Field] {
        match &self.body {
            Body::Fields(fields) => fields,
            _ => &[],
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.body {
            Body::Strings(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Selected alternative when this object is a one-of wrapper.
    pub fn variant(&self) -> Option<(&str, &TypedObject)> {
        self.fields().iter().find_map(|field| match &field.value {
            FieldValue::Variant(object) => Some((field.name.as_str(), object.as_ref())),
            _ => None,
        })
    }

    /// JSON rendering keyed by the original property names.
    pub fn to_json(&self) -> Value {
        match &self.body {
            Body::Strings(values) => json!(values),
            Body::Text(text) => Value::String(text.clone()),
            Body::Fields(fields) => {
                let mut map = Map::new();
                for field in fields {
                    map.insert(field.name.clone(), field.value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_scalars(&self) -> Option<&[Scalar]> {
        match self {
            FieldValue::Scalars(values) => Some(values),
            _ => None,
        }
    }

    /// Nested object, or the selected variant of a union.
    pub fn as_object(&self) -> Option<&TypedObject> {
        match self {
            FieldValue::Object(object) | FieldValue::Variant(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_objects(&self) -> Option<&[TypedObject]> {
        match self {
            FieldValue::Objects(objects) => Some(objects),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&[NamedEntry]> {
        match self {
            FieldValue::Named(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Scalar(scalar) => scalar.to_json(),
            FieldValue::Scalars(values) => Value::Array(values.iter().map(Scalar::to_json).collect()),
            FieldValue::Object(object) => object.to_json(),
            FieldValue::Objects(objects) => {
                Value::Array(objects.iter().map(TypedObject::to_json).collect())
            }
            FieldValue::Variant(object) => object.to_json(),
            FieldValue::Named(entries) => Value::Array(
                entries
                    .iter()
                    .map(|entry| json!({"name": entry.name, "value": entry.value.to_json()}))
                    .collect(),
            ),
        }
    }
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::String(value) => json!(value),
            Scalar::Number(value) => json!(value),
            Scalar::Integer(value) => json!(value),
            Scalar::Boolean(value) => json!(value),
        }
    }
}

impl NamedValue {
    pub fn to_json(&self) -> Value {
        match self {
            NamedValue::Scalar(scalar) => scalar.to_json(),
            NamedValue::Object(object) => object.to_json(),
        }
    }
}

impl Serialize for TypedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
