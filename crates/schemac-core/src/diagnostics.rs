use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// Severity level for build findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Classification of build failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Value kind differs from the kind the class expects.
    StructuralMismatch,
    MissingRequiredKey,
    /// Extra key on a closed class.
    UnrecognizedKey,
    /// Value present but its dynamic type is wrong.
    TypeCoercionFailure,
    /// No one-of alternative matched.
    UnresolvedUnion,
    /// More than one one-of alternative matched.
    AmbiguousUnion,
    /// A singular nested property could not be built.
    UnresolvedProperty,
    DepthLimitExceeded,
    /// A `$ref` does not point into the document.
    UnresolvedReference,
}

impl FailureKind {
    pub fn code(self) -> &'static str {
        match self {
            FailureKind::StructuralMismatch => "structural_mismatch",
            FailureKind::MissingRequiredKey => "missing_required_key",
            FailureKind::UnrecognizedKey => "unrecognized_key",
            FailureKind::TypeCoercionFailure => "type_coercion_failure",
            FailureKind::UnresolvedUnion => "unresolved_union",
            FailureKind::AmbiguousUnion => "ambiguous_union",
            FailureKind::UnresolvedProperty => "unresolved_property",
            FailureKind::DepthLimitExceeded => "depth_limit_exceeded",
            FailureKind::UnresolvedReference => "unresolved_reference",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Structured finding with enough context to locate the failing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: FailureKind,
    /// JSON pointer of the node in the input document.
    pub path: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<ValueKind>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: FailureKind,
        path: impl Into<String>,
        class: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            path: path.into(),
            class: class.into(),
            property: None,
            key: None,
            expected: None,
            actual: None,
            message: message.into(),
        }
    }

    pub fn error(
        kind: FailureKind,
        path: impl Into<String>,
        class: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, kind, path, class, message)
    }

    pub fn warning(
        kind: FailureKind,
        path: impl Into<String>,
        class: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, kind, path, class, message)
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_kinds(mut self, expected: impl Into<String>, actual: ValueKind) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual);
        self
    }

    /// Re-tag the finding, e.g. when an element failure is degraded to a warning.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{} [{}] {}", path, self.kind, self.class)?;
        if let Some(property) = &self.property {
            write!(f, ".{property}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(key) = &self.key {
            write!(f, " (key '{key}')")?;
        }
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, " (expected {expected}, found {actual})")?;
        }
        Ok(())
    }
}

/// Receiver of non-fatal findings produced while building.
pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Buffered sink that keeps findings in arrival order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|entry| entry.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn of_kind(&self, kind: FailureKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub fn counts_by_kind(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Forward every buffered finding to `sink`, preserving order.
    pub fn drain_into(self, sink: &mut dyn DiagnosticSink) {
        for entry in self.entries {
            sink.record(entry);
        }
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl DiagnosticSink for Diagnostics {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardDiagnostics;

impl DiagnosticSink for DiscardDiagnostics {
    fn record(&mut self, _diagnostic: Diagnostic) {}
}
