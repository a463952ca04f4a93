use thiserror::Error;

use schemac_core::{Diagnostic, FailureKind};

/// Class-level build failure. No partial object is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("unknown class: {0}")]
    UnknownClass(String),
    #[error("{diagnostic}")]
    Rejected {
        diagnostic: Diagnostic,
        /// Failure of the nested node that caused this one.
        #[source]
        cause: Option<Box<BuildError>>,
    },
}

impl BuildError {
    pub(crate) fn rejected(diagnostic: Diagnostic) -> Self {
        BuildError::Rejected {
            diagnostic,
            cause: None,
        }
    }

    pub(crate) fn caused_by(diagnostic: Diagnostic, cause: BuildError) -> Self {
        BuildError::Rejected {
            diagnostic,
            cause: Some(Box::new(cause)),
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            BuildError::UnknownClass(_) => None,
            BuildError::Rejected { diagnostic, .. } => Some(diagnostic),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.diagnostic().map(|diagnostic| diagnostic.kind)
    }

    pub fn cause(&self) -> Option<&BuildError> {
        match self {
            BuildError::Rejected {
                cause: Some(cause), ..
            } => Some(cause),
            _ => None,
        }
    }

    /// Deepest failure in the chain.
    pub fn root_cause(&self) -> &BuildError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }

    /// Diagnostics from this failure down to the deepest one.
    pub fn chain(&self) -> Vec<&Diagnostic> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(error) = current {
            if let Some(diagnostic) = error.diagnostic() {
                chain.push(diagnostic);
            }
            current = error.cause();
        }
        chain
    }
}
