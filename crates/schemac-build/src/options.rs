use serde::{Deserialize, Serialize};

/// What to do when a nested build fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the containing class.
    Abort,
    /// Leave the field unset and record a diagnostic.
    LeaveUnset,
}

/// Nesting depth every build supports on a default 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options for the class builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
    /// Policy for singular, non-union nested properties.
    pub nested_failure: FailurePolicy,
    /// Policy for one-of wrappers where no alternative matches.
    pub union_failure: FailurePolicy,
    /// Keep trying alternatives after the first match and warn when
    /// more than one matches.
    pub detect_ambiguous_unions: bool,
    /// Maximum nesting depth before the build is rejected.
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            nested_failure: FailurePolicy::Abort,
            union_failure: FailurePolicy::LeaveUnset,
            detect_ambiguous_unions: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
