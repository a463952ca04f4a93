//! Class builder engine for schemac.
//!
//! Compiles a validated class model once and then turns untyped value trees
//! into [`TypedObject`] graphs, reporting non-fatal findings through a
//! [`schemac_core::DiagnosticSink`].

mod compiled;
pub mod engine;
pub mod errors;
pub mod options;
pub mod typed;

pub use engine::ClassBuilder;
pub use errors::BuildError;
pub use options::{BuildOptions, DEFAULT_MAX_DEPTH, FailurePolicy};
pub use typed::{Body, Field, FieldValue, NamedEntry, NamedValue, Scalar, TypedObject};
