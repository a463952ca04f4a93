use thiserror::Error;

/// Core error type shared across schemac crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The class model violates internal invariants.
    #[error("invalid model: {0}")]
    InvalidModel(String),
    /// The model file does not match the class model JSON Schema.
    #[error("model does not match schema:\n{0}")]
    SchemaViolation(String),
    /// A pattern in the model could not be compiled.
    #[error("invalid pattern '{pattern}' in {context}: {reason}")]
    InvalidPattern {
        pattern: String,
        context: String,
        reason: String,
    },
    /// A class name is not part of the model.
    #[error("unknown class: {0}")]
    UnknownClass(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results returned by schemac crates.
pub type Result<T> = std::result::Result<T, Error>;
