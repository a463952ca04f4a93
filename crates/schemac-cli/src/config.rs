use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use schemac_build::BuildOptions;

use crate::driver::DriverResult;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "schemac.toml";

/// Compiler settings read from TOML. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Class model file; the bundled OpenAPI v2 model when unset.
    pub model: Option<PathBuf>,
    pub root_class: String,
    pub build: BuildOptions,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            model: None,
            root_class: "Document".to_string(),
            build: BuildOptions::default(),
        }
    }
}

/// Load `explicit`, else `schemac.toml` if present, else defaults.
pub fn load_config(explicit: Option<&Path>) -> DriverResult<CompilerConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok(CompilerConfig::default());
            }
            fallback
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(event = "config_loaded", path = %path.display());
    Ok(config)
}

pub fn parse_config(content: &str) -> DriverResult<CompilerConfig> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemac_build::{DEFAULT_MAX_DEPTH, FailurePolicy};

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").expect("parse");
        assert_eq!(config, CompilerConfig::default());
        assert_eq!(config.build.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn build_section_overrides_policies() {
        let config = parse_config(
            r#"
model = "models/custom.classes.yaml"
root_class = "Info"

[build]
nested_failure = "leave_unset"
union_failure = "abort"
detect_ambiguous_unions = true
"#,
        )
        .expect("parse");

        assert_eq!(config.model, Some(PathBuf::from("models/custom.classes.yaml")));
        assert_eq!(config.root_class, "Info");
        assert_eq!(config.build.nested_failure, FailurePolicy::LeaveUnset);
        assert_eq!(config.build.union_failure, FailurePolicy::Abort);
        assert!(config.build.detect_ambiguous_unions);
        assert_eq!(config.build.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("rootclass = \"Info\"").is_err());
        assert!(parse_config("[build]\nstrict = true").is_err());
    }
}
