use std::collections::HashMap;

use tracing::{debug, trace};

use schemac_core::{
    ClassCollection, ClassKind, Diagnostic, DiagnosticSink, Diagnostics, DiscardDiagnostics,
    FailureKind, PrimitiveType, Severity, ValueAccessor, ValueKind, validate_model,
};

use crate::compiled::{CompiledClass, CompiledProperty, MapValue, PropertyShape};
use crate::errors::BuildError;
use crate::options::{BuildOptions, FailurePolicy};
use crate::typed::{Field, FieldValue, NamedEntry, NamedValue, Scalar, TypedObject};

/// Schema-driven builder turning generic values into typed objects.
///
/// The builder holds only immutable data and can be shared across threads;
/// each call to [`ClassBuilder::build`] brings its own diagnostic sink.
#[derive(Debug)]
pub struct ClassBuilder {
    classes: HashMap<String, CompiledClass>,
    options: BuildOptions,
}

/// Position of the node being built.
#[derive(Debug, Clone)]
struct Location {
    path: String,
    depth: usize,
}

impl Location {
    fn root() -> Self {
        Self {
            path: String::new(),
            depth: 0,
        }
    }

    fn child(&self, segment: &str) -> Self {
        let escaped = segment.replace('~', "~0").replace('/', "~1");
        Self {
            path: format!("{}/{}", self.path, escaped),
            depth: self.depth + 1,
        }
    }

    fn index(&self, index: usize) -> Self {
        self.child(&index.to_string())
    }

    /// Same input node, one level deeper (union alternatives).
    fn nested(&self) -> Self {
        Self {
            path: self.path.clone(),
            depth: self.depth + 1,
        }
    }
}

/// Per-build state of a one-of wrapper.
#[derive(Default)]
struct UnionState {
    selected: Option<String>,
    matched: Vec<String>,
    rejected: Vec<(String, Option<FailureKind>)>,
}

impl ClassBuilder {
    /// Validate the model and compile it for building.
    pub fn new(collection: &ClassCollection, options: BuildOptions) -> schemac_core::Result<Self> {
        validate_model(collection)?;

        let mut classes = HashMap::with_capacity(collection.len());
        for class in collection.iter() {
            classes.insert(class.name.clone(), CompiledClass::compile(class, collection)?);
        }

        Ok(Self { classes, options })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Build `value` as an instance of `class_name`.
    ///
    /// Class-level failures return `Err` without a partial object; element
    /// and extension-map entry failures are recorded in `sink` and the
    /// offending entries are omitted.
    pub fn build<V: ValueAccessor>(
        &self,
        class_name: &str,
        value: &V,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<TypedObject, BuildError> {
        let class = self
            .classes
            .get(class_name)
            .ok_or_else(|| BuildError::UnknownClass(class_name.to_string()))?;

        debug!(event = "build_started", class = %class_name);
        let result = self.build_class(class, value, &Location::root(), sink);
        match &result {
            Ok(_) => debug!(event = "build_finished", class = %class_name, status = "success"),
            Err(err) => debug!(
                event = "build_finished",
                class = %class_name,
                status = "failed",
                error = %err
            ),
        }
        result
    }

    fn class(&self, name: &str) -> Result<&CompiledClass, BuildError> {
        self.classes
            .get(name)
            .ok_or_else(|| BuildError::UnknownClass(name.to_string()))
    }

    fn build_class<V: ValueAccessor>(
        &self,
        class: &CompiledClass,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<TypedObject, BuildError> {
        if at.depth > self.options.max_depth {
            return Err(BuildError::rejected(Diagnostic::error(
                FailureKind::DepthLimitExceeded,
                at.path.clone(),
                class.name.clone(),
                format!("nesting deeper than {} levels", self.options.max_depth),
            )));
        }

        trace!(class = %class.name, path = %at.path, "building class");

        match class.kind {
            ClassKind::StringArrayTerminal => build_string_terminal(class, value, at),
            ClassKind::BlobTerminal => Ok(TypedObject::text(class.name.clone(), value.render())),
            ClassKind::PlainStringArray => build_string_array(class, value, at),
            ClassKind::OneOfWrapper | ClassKind::GenericObject => {
                self.build_object(class, value, at, sink)
            }
        }
    }

    fn build_object<V: ValueAccessor>(
        &self,
        class: &CompiledClass,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<TypedObject, BuildError> {
        if value.kind() != ValueKind::Mapping {
            return Err(BuildError::rejected(
                Diagnostic::error(
                    FailureKind::StructuralMismatch,
                    at.path.clone(),
                    class.name.clone(),
                    "expected a mapping",
                )
                .with_kinds("mapping", value.kind()),
            ));
        }

        let missing = value.missing_keys(class.required.iter().map(String::as_str));
        if let Some(first) = missing.first() {
            return Err(BuildError::rejected(
                Diagnostic::error(
                    FailureKind::MissingRequiredKey,
                    at.path.clone(),
                    class.name.clone(),
                    format!("missing required keys: {}", missing.join(", ")),
                )
                .with_key(*first),
            ));
        }

        if !class.open {
            let unexpected = value.unexpected_keys(&class.allowed, &class.open_patterns);
            if let Some(first) = unexpected.first() {
                return Err(BuildError::rejected(
                    Diagnostic::error(
                        FailureKind::UnrecognizedKey,
                        at.path.clone(),
                        class.name.clone(),
                        format!("unrecognized keys: {}", unexpected.join(", ")),
                    )
                    .with_key(*first),
                ));
            }
        }

        let mut fields = Vec::new();
        let mut union = UnionState::default();

        for property in &class.properties {
            let field = match &property.shape {
                PropertyShape::Primitive(primitive) if property.repeated => {
                    self.build_scalars(class, property, *primitive, value, at, sink)
                }
                PropertyShape::Primitive(primitive) => {
                    build_scalar(class, property, *primitive, value, at)?
                }
                PropertyShape::Class(target) if property.repeated => {
                    self.build_objects(class, property, target, value, at, sink)?
                }
                PropertyShape::Class(target) if class.kind == ClassKind::OneOfWrapper => {
                    self.try_alternative(property, target, value, at, sink, &mut union)?
                }
                PropertyShape::Class(target) => {
                    self.build_nested(class, property, target, value, at, sink)?
                }
                PropertyShape::ExtensionMap { value: map_value, pattern } => self
                    .build_extension_map(class, property, map_value, pattern.as_ref(), value, at, sink)?,
            };

            if let Some(field_value) = field {
                fields.push(Field {
                    name: property.name.clone(),
                    value: field_value,
                });
            }
        }

        if class.kind == ClassKind::OneOfWrapper {
            self.finish_union(class, union, at, sink)?;
        }

        Ok(TypedObject::object(class.name.clone(), fields))
    }

    fn build_scalars<V: ValueAccessor>(
        &self,
        class: &CompiledClass,
        property: &CompiledProperty,
        primitive: PrimitiveType,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<FieldValue> {
        let item = value.value_for_key(&property.name)?;
        let at = at.child(&property.name);
        let expected = primitive.name();

        let converted: Vec<Result<Scalar, ValueKind>> = match primitive {
            PrimitiveType::String => item.to_string_sequence().map(|items| {
                items
                    .into_iter()
                    .map(|entry| entry.map(Scalar::String))
                    .collect()
            }),
            _ => item.elements().map(|elements| {
                elements
                    .into_iter()
                    .map(|element| coerce(element, primitive))
                    .collect()
            }),
        }
        .or_else(|| {
            sink.record(
                Diagnostic::warning(
                    FailureKind::TypeCoercionFailure,
                    at.path.clone(),
                    class.name.clone(),
                    "expected a sequence; field left unset",
                )
                .with_property(property.name.clone())
                .with_kinds(format!("sequence of {expected}"), item.kind()),
            );
            None
        })?;

        let mut values = Vec::with_capacity(converted.len());
        for (index, entry) in converted.into_iter().enumerate() {
            match entry {
                Ok(scalar) => values.push(scalar),
                Err(actual) => sink.record(
                    Diagnostic::warning(
                        FailureKind::TypeCoercionFailure,
                        at.index(index).path,
                        class.name.clone(),
                        "element omitted",
                    )
                    .with_property(property.name.clone())
                    .with_kinds(expected, actual),
                ),
            }
        }

        Some(FieldValue::Scalars(values))
    }

    fn build_objects<V: ValueAccessor>(
        &self,
        class: &CompiledClass,
        property: &CompiledProperty,
        target: &str,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<FieldValue>, BuildError> {
        let Some(item) = value.value_for_key(&property.name) else {
            return Ok(None);
        };
        let at = at.child(&property.name);
        let Some(elements) = item.elements() else {
            sink.record(
                Diagnostic::warning(
                    FailureKind::TypeCoercionFailure,
                    at.path.clone(),
                    class.name.clone(),
                    "expected a sequence; field left unset",
                )
                .with_property(property.name.clone())
                .with_kinds(format!("sequence of {target}"), item.kind()),
            );
            return Ok(None);
        };

        let target_class = self.class(target)?;
        let mut objects = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            match self.build_class(target_class, element, &at.index(index), sink) {
                Ok(object) => objects.push(object),
                Err(err) => degrade(&err, "element omitted", sink),
            }
        }

        Ok(Some(FieldValue::Objects(objects)))
    }

    fn build_nested<V: ValueAccessor>(
        &self,
        class: &CompiledClass,
        property: &CompiledProperty,
        target: &str,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<FieldValue>, BuildError> {
        let Some(item) = value.value_for_key(&property.name) else {
            return Ok(None);
        };
        let at = at.child(&property.name);

        match self.build_class(self.class(target)?, item, &at, sink) {
            Ok(object) => Ok(Some(FieldValue::Object(Box::new(object)))),
            Err(err) => {
                let wrapped = BuildError::caused_by(
                    Diagnostic::error(
                        FailureKind::UnresolvedProperty,
                        at.path.clone(),
                        class.name.clone(),
                        format!("could not build {target}"),
                    )
                    .with_property(property.name.clone())
                    .with_key(property.name.clone()),
                    err,
                );
                match self.options.nested_failure {
                    FailurePolicy::Abort => Err(wrapped),
                    FailurePolicy::LeaveUnset => {
                        degrade(&wrapped, "field left unset", sink);
                        Ok(None)
                    }
                }
            }
        }
    }

    fn try_alternative<V: ValueAccessor>(
        &self,
        property: &CompiledProperty,
        target: &str,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
        union: &mut UnionState,
    ) -> Result<Option<FieldValue>, BuildError> {
        let target_class = self.class(target)?;

        if union.selected.is_some() {
            if self.options.detect_ambiguous_unions
                && self
                    .build_alternative(target_class, value, at, &mut DiscardDiagnostics)
                    .is_ok()
            {
                union.matched.push(property.name.clone());
            }
            return Ok(None);
        }

        let mut attempt = Diagnostics::new();
        match self.build_alternative(target_class, value, at, &mut attempt) {
            Ok(object) => {
                attempt.drain_into(sink);
                union.selected = Some(property.name.clone());
                union.matched.push(property.name.clone());
                Ok(Some(FieldValue::Variant(Box::new(object))))
            }
            Err(err) => {
                trace!(alternative = %property.name, error = %err, "union alternative rejected");
                union.rejected.push((property.name.clone(), err.kind()));
                Ok(None)
            }
        }
    }

    /// Build one union alternative against the wrapper's own mapping.
    ///
    /// A nested wrapper only matches when it selected a variant itself.
    fn build_alternative<V: ValueAccessor>(
        &self,
        target: &CompiledClass,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<TypedObject, BuildError> {
        let at = at.nested();
        let object = self.build_class(target, value, &at, sink)?;
        if target.kind == ClassKind::OneOfWrapper && object.variant().is_none() {
            return Err(BuildError::rejected(Diagnostic::error(
                FailureKind::UnresolvedUnion,
                at.path,
                target.name.clone(),
                "no alternative matched",
            )));
        }
        Ok(object)
    }

    fn finish_union(
        &self,
        class: &CompiledClass,
        union: UnionState,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), BuildError> {
        if union.selected.is_some() {
            if union.matched.len() > 1 {
                sink.record(Diagnostic::warning(
                    FailureKind::AmbiguousUnion,
                    at.path.clone(),
                    class.name.clone(),
                    format!(
                        "alternatives {} all match; selected {}",
                        union.matched.join(", "),
                        union.matched[0]
                    ),
                ));
            }
            return Ok(());
        }

        if union.rejected.is_empty() {
            return Ok(());
        }

        let reasons: Vec<String> = union
            .rejected
            .iter()
            .map(|(name, kind)| match kind {
                Some(kind) => format!("{name}: {kind}"),
                None => name.clone(),
            })
            .collect();
        let diagnostic = Diagnostic::error(
            FailureKind::UnresolvedUnion,
            at.path.clone(),
            class.name.clone(),
            format!("no alternative matched ({})", reasons.join("; ")),
        );

        match self.options.union_failure {
            FailurePolicy::Abort => Err(BuildError::rejected(diagnostic)),
            FailurePolicy::LeaveUnset => {
                sink.record(diagnostic.with_severity(Severity::Warning));
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_extension_map<V: ValueAccessor>(
        &self,
        class: &CompiledClass,
        property: &CompiledProperty,
        map_value: &MapValue,
        pattern: Option<&regex::Regex>,
        value: &V,
        at: &Location,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<FieldValue>, BuildError> {
        let entries = value.entries().unwrap_or_default();
        let mut named = Vec::new();

        for (key, item) in entries {
            if class.explicit.contains(key) {
                continue;
            }
            if let Some(pattern) = pattern {
                if !schemac_core::pattern_matches(pattern, key) {
                    continue;
                }
            }

            let entry_at = at.child(key);
            let entry_value = match map_value {
                MapValue::Primitive(primitive) => match coerce(item, *primitive) {
                    Ok(scalar) => NamedValue::Scalar(scalar),
                    Err(actual) => {
                        sink.record(
                            Diagnostic::warning(
                                FailureKind::TypeCoercionFailure,
                                entry_at.path,
                                class.name.clone(),
                                "entry omitted",
                            )
                            .with_property(property.name.clone())
                            .with_key(key)
                            .with_kinds(primitive.name(), actual),
                        );
                        continue;
                    }
                },
                MapValue::Class(target) => {
                    match self.build_class(self.class(target)?, item, &entry_at, sink) {
                        Ok(object) => NamedValue::Object(object),
                        Err(err) => {
                            degrade(&err, "entry omitted", sink);
                            continue;
                        }
                    }
                }
            };

            named.push(NamedEntry {
                name: key.to_string(),
                value: entry_value,
            });
        }

        if named.is_empty() {
            Ok(None)
        } else {
            Ok(Some(FieldValue::Named(named)))
        }
    }
}

fn build_string_terminal<V: ValueAccessor>(
    class: &CompiledClass,
    value: &V,
    at: &Location,
) -> Result<TypedObject, BuildError> {
    match value.as_str() {
        Some(text) => Ok(TypedObject::strings(
            class.name.clone(),
            vec![text.to_string()],
        )),
        None => {
            debug!(class = %class.name, path = %at.path, found = %value.kind(), "unexpected value shape");
            Err(BuildError::rejected(
                Diagnostic::error(
                    FailureKind::StructuralMismatch,
                    at.path.clone(),
                    class.name.clone(),
                    "expected a single string",
                )
                .with_kinds("string", value.kind()),
            ))
        }
    }
}

fn build_string_array<V: ValueAccessor>(
    class: &CompiledClass,
    value: &V,
    at: &Location,
) -> Result<TypedObject, BuildError> {
    let Some(items) = value.to_string_sequence() else {
        return Err(BuildError::rejected(
            Diagnostic::error(
                FailureKind::StructuralMismatch,
                at.path.clone(),
                class.name.clone(),
                "expected a sequence of strings",
            )
            .with_kinds("sequence", value.kind()),
        ));
    };

    let mut values = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Ok(text) => values.push(text),
            Err(actual) => {
                return Err(BuildError::rejected(
                    Diagnostic::error(
                        FailureKind::TypeCoercionFailure,
                        at.index(index).path,
                        class.name.clone(),
                        "every element must be a string",
                    )
                    .with_kinds("string", actual),
                ));
            }
        }
    }

    Ok(TypedObject::strings(class.name.clone(), values))
}

fn build_scalar<V: ValueAccessor>(
    class: &CompiledClass,
    property: &CompiledProperty,
    primitive: PrimitiveType,
    value: &V,
    at: &Location,
) -> Result<Option<FieldValue>, BuildError> {
    let Some(item) = value.value_for_key(&property.name) else {
        return Ok(None);
    };

    match coerce(item, primitive) {
        Ok(scalar) => Ok(Some(FieldValue::Scalar(scalar))),
        Err(actual) => Err(BuildError::rejected(
            Diagnostic::error(
                FailureKind::TypeCoercionFailure,
                at.child(&property.name).path,
                class.name.clone(),
                "value has the wrong type",
            )
            .with_property(property.name.clone())
            .with_key(property.name.clone())
            .with_kinds(primitive.name(), actual),
        )),
    }
}

fn coerce<V: ValueAccessor>(value: &V, primitive: PrimitiveType) -> Result<Scalar, ValueKind> {
    let scalar = match primitive {
        PrimitiveType::String => value.as_str().map(|text| Scalar::String(text.to_string())),
        PrimitiveType::Number => value.as_f64().map(Scalar::Number),
        PrimitiveType::Integer => value.as_i64().map(Scalar::Integer),
        PrimitiveType::Boolean => value.as_bool().map(Scalar::Boolean),
    };
    scalar.ok_or_else(|| value.kind())
}

/// Record a class failure that only costs its container one entry.
fn degrade(err: &BuildError, outcome: &str, sink: &mut dyn DiagnosticSink) {
    debug!(error = %err, outcome, "degraded build failure");
    for diagnostic in err.chain() {
        sink.record(diagnostic.clone().with_severity(Severity::Warning));
    }
}
