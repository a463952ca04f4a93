mod input;
mod logging;
mod output;
mod refs;

pub use input::{load_model, read_input};
pub use logging::init_logging;
pub use output::{OutputPaths, describe_raw, render_errors, render_text, write_json, write_text};
pub use refs::check_references;

use thiserror::Error;

/// Driver-level errors around a single compile.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error(transparent)]
    Core(#[from] schemac_core::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;
