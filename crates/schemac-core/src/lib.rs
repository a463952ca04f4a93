//! Core contracts for schemac.
//!
//! This crate defines the declarative class model, the read-only accessor
//! contract over untyped input trees, and the diagnostic types shared by the
//! builder engine and the CLI.

pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod model;
pub mod validation;
pub mod value;

pub use diagnostics::{
    Diagnostic, DiagnosticSink, Diagnostics, DiscardDiagnostics, FailureKind, Severity,
};
pub use error::{Error, Result};
pub use loader::{
    CLASS_MODEL_SCHEMA, SourceFormat, check_model_value, load_class_collection,
    parse_class_collection, parse_value,
};
pub use model::{
    ClassCollection, ClassKind, ClassModel, ModelDocument, PrimitiveType, PropertyModel,
    STRING_ARRAY_CLASS,
};
pub use validation::{compile_pattern, validate_model};
pub use value::{ValueAccessor, ValueKind, pattern_matches};
